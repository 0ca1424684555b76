//! Core types for feishu-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote object type as reported by the wiki/drive APIs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjType {
    /// Legacy Feishu Docs document (no longer exportable)
    Doc,
    /// New-style docx document
    Docx,
    /// Spreadsheet
    Sheet,
    /// Bitable (multi-dimensional table)
    Bitable,
    /// Mindnote
    Mindnote,
    /// Slides
    Slides,
    /// Uploaded binary file
    File,
    /// Any type this library does not recognize
    #[serde(other)]
    Unknown,
}

impl ObjType {
    /// Whether this object carries downloadable docx content
    pub fn is_document(&self) -> bool {
        matches!(self, ObjType::Docx)
    }
}

impl std::fmt::Display for ObjType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ObjType::Doc => "doc",
            ObjType::Docx => "docx",
            ObjType::Sheet => "sheet",
            ObjType::Bitable => "bitable",
            ObjType::Mindnote => "mindnote",
            ObjType::Slides => "slides",
            ObjType::File => "file",
            ObjType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// One node of a wiki space's tree
///
/// A node may simultaneously have children (making it a container) and be a
/// docx document in its own right. The traverser handles both independently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WikiNode {
    /// Node title (used for directory and file naming after sanitization)
    pub title: String,
    /// Token addressing the node itself within the wiki tree
    pub node_token: String,
    /// Token of the underlying object (document, sheet, ...)
    pub obj_token: String,
    /// Type of the underlying object
    pub obj_type: ObjType,
    /// Whether the node has child nodes
    pub has_child: bool,
}

/// Entry type of a drive folder listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveEntryType {
    /// Subfolder
    Folder,
    /// New-style docx document
    Docx,
    /// Legacy document
    Doc,
    /// Spreadsheet
    Sheet,
    /// Uploaded binary file
    File,
    /// Shortcut to another drive object
    Shortcut,
    /// Any type this library does not recognize
    #[serde(other)]
    Unknown,
}

/// One immediate child of a drive folder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriveEntry {
    /// Display name (used for subdirectory naming)
    pub name: String,
    /// Opaque drive token
    pub token: String,
    /// Entry type
    #[serde(rename = "type")]
    pub entry_type: DriveEntryType,
    /// Canonical URL of the entry
    pub url: String,
}

/// Result of resolving a wiki node token to its underlying object
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedNode {
    /// Type of the underlying object
    pub obj_type: ObjType,
    /// Token of the underlying object
    pub obj_token: String,
}

/// Docx document metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocxDocument {
    /// Document token
    pub document_id: String,
    /// Document title
    pub title: String,
    /// Revision the content was fetched at
    #[serde(default)]
    pub revision_id: i64,
}

/// Status of a single document-download attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Document was fetched, converted, and written
    Success,
    /// Some step of the per-document pipeline failed
    Error,
}

/// The recorded result of one document-download attempt
///
/// Created exactly once per leaf task, immediately after the attempt
/// concludes, and never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadOutcome {
    /// Source locator the task was dispatched with
    pub url: String,
    /// Output filename (empty on failure)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    /// Success/failure flag
    pub status: OutcomeStatus,
    /// Error detail (empty on success)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    /// When the attempt concluded
    pub time: DateTime<Utc>,
}

impl DownloadOutcome {
    /// Record a successful download
    pub fn success(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            status: OutcomeStatus::Success,
            error: String::new(),
            time: Utc::now(),
        }
    }

    /// Record a failed download
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: String::new(),
            status: OutcomeStatus::Error,
            error: error.into(),
            time: Utc::now(),
        }
    }

    /// Whether the attempt succeeded
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_type_deserializes_known_and_unknown() {
        let docx: ObjType = serde_json::from_str("\"docx\"").unwrap();
        assert_eq!(docx, ObjType::Docx);
        assert!(docx.is_document());

        let mystery: ObjType = serde_json::from_str("\"holodeck\"").unwrap();
        assert_eq!(mystery, ObjType::Unknown);
        assert!(!mystery.is_document());
    }

    #[test]
    fn drive_entry_type_uses_type_key() {
        let entry: DriveEntry = serde_json::from_str(
            r#"{"name":"notes","token":"fldcn1","type":"folder","url":"https://x.feishu.cn/drive/folder/fldcn1"}"#,
        )
        .unwrap();
        assert_eq!(entry.entry_type, DriveEntryType::Folder);
        assert_eq!(entry.name, "notes");
    }

    #[test]
    fn success_outcome_serializes_without_error_field() {
        let outcome = DownloadOutcome::success("https://x.feishu.cn/docx/d1", "Weekly.md");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["filename"], "Weekly.md");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failure_outcome_serializes_without_filename_field() {
        let outcome = DownloadOutcome::failure("https://x.feishu.cn/docx/d2", "fetch failed");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "fetch failed");
        assert!(json.get("filename").is_none());
        assert!(!outcome.is_success());
    }
}
