//! End-to-end batch behavior through the public API.
//!
//! Implements `DocumentSource` outside the crate to exercise the same seam
//! an embedding application would use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

use feishu_dl::client::{DocumentContent, DocumentSource};
use feishu_dl::error::{ApiError, Result};
use feishu_dl::markdown::{DocxBlock, TextBlock, TextElement, TextRun};
use feishu_dl::{
    Config, DocxDocument, DownloadOptions, Downloader, DriveEntry, DriveEntryType, ResolvedNode,
    WikiNode,
};

/// Fixed two-level drive tree:
///
/// ```text
/// root
/// ├── Meeting Notes.docx      (d1)
/// ├── Archive/                (f1)
/// │   └── Postmortem.docx     (d2, fetch fails)
/// └── Roadmap.docx            (d3)
/// ```
struct StaticSource {
    folders: HashMap<&'static str, Vec<DriveEntry>>,
    documents: HashMap<&'static str, (&'static str, &'static str)>,
    failing: &'static str,
}

impl StaticSource {
    fn new() -> Self {
        let mut folders = HashMap::new();
        folders.insert(
            "root",
            vec![
                entry("Meeting Notes", "d1", DriveEntryType::Docx),
                entry("Archive", "f1", DriveEntryType::Folder),
                entry("Roadmap", "d3", DriveEntryType::Docx),
            ],
        );
        folders.insert("f1", vec![entry("Postmortem", "d2", DriveEntryType::Docx)]);

        let mut documents = HashMap::new();
        documents.insert("d1", ("Meeting Notes", "weekly sync notes"));
        documents.insert("d2", ("Postmortem", "never fetched"));
        documents.insert("d3", ("Roadmap", "H2 priorities"));

        Self {
            folders,
            documents,
            failing: "d2",
        }
    }
}

fn entry(name: &str, token: &str, entry_type: DriveEntryType) -> DriveEntry {
    DriveEntry {
        name: name.to_string(),
        token: token.to_string(),
        entry_type,
        url: format!("https://acme.feishu.cn/docx/{}", token),
    }
}

fn paragraph(content: &str) -> DocxBlock {
    DocxBlock {
        block_id: "b1".to_string(),
        block_type: 2,
        text: Some(TextBlock {
            elements: vec![TextElement {
                text_run: Some(TextRun {
                    content: content.to_string(),
                    text_element_style: None,
                }),
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn list_folder(&self, folder_token: &str) -> Result<Vec<DriveEntry>> {
        self.folders
            .get(folder_token)
            .cloned()
            .ok_or_else(|| {
                ApiError::List {
                    token: folder_token.to_string(),
                    code: 404,
                    message: "unknown folder".to_string(),
                }
                .into()
            })
    }

    async fn list_wiki_nodes(
        &self,
        _space_id: &str,
        _parent_node_token: Option<&str>,
    ) -> Result<Vec<WikiNode>> {
        Ok(vec![])
    }

    async fn resolve_wiki_node(&self, node_token: &str) -> Result<ResolvedNode> {
        Err(ApiError::Resolve {
            token: node_token.to_string(),
            code: 404,
            message: "no wiki here".to_string(),
        }
        .into())
    }

    async fn wiki_name(&self, _space_id: &str) -> Result<String> {
        Ok(String::new())
    }

    async fn fetch_document(&self, doc_token: &str) -> Result<DocumentContent> {
        if doc_token == self.failing {
            return Err(ApiError::Fetch {
                token: doc_token.to_string(),
                code: 500,
                message: "backend exploded".to_string(),
            }
            .into());
        }
        let (title, body) = self.documents.get(doc_token).ok_or_else(|| {
            feishu_dl::Error::from(ApiError::Fetch {
                token: doc_token.to_string(),
                code: 404,
                message: "unknown document".to_string(),
            })
        })?;
        Ok(DocumentContent {
            document: DocxDocument {
                document_id: doc_token.to_string(),
                title: title.to_string(),
                revision_id: 1,
            },
            blocks: vec![paragraph(body)],
        })
    }

    async fn download_asset(&self, token: &str, target_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(target_dir).await?;
        let path = target_dir.join(format!("{}.png", token));
        tokio::fs::write(&path, b"bytes").await?;
        Ok(path)
    }
}

#[tokio::test]
async fn folder_batch_reports_partial_failure_and_keeps_siblings() {
    let out = tempdir().unwrap();
    let downloader = Downloader::new(
        Arc::new(StaticSource::new()) as Arc<dyn DocumentSource>,
        Arc::new(Config::default()),
    );

    let report = downloader
        .download_folder(
            "https://acme.feishu.cn/drive/folder/root",
            &DownloadOptions::new(out.path()),
        )
        .await
        .unwrap();

    assert_eq!(report.total_discovered, 3);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 1);

    assert!(out.path().join("Meeting Notes.md").exists());
    assert!(out.path().join("Roadmap.md").exists());
    assert!(out.path().join("Archive").is_dir());
    assert!(!out.path().join("Archive").join("Postmortem.md").exists());

    let summary = report.render_summary();
    assert!(summary.contains("Total documents: 3"));
    assert!(summary.contains("backend exploded"));
    assert!(summary.contains("Meeting Notes.md"));
}

#[tokio::test]
async fn batch_report_file_round_trips_through_json() {
    let out = tempdir().unwrap();
    let downloader = Downloader::new(
        Arc::new(StaticSource::new()) as Arc<dyn DocumentSource>,
        Arc::new(Config::default()),
    );

    downloader
        .download_folder(
            "https://acme.feishu.cn/drive/folder/root",
            &DownloadOptions::new(out.path()),
        )
        .await
        .unwrap();

    let report_path = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .find(|e| e.file_name().to_string_lossy().starts_with("report_"))
        .expect("report file written")
        .path();

    let report: feishu_dl::BatchReport =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report.total_discovered, 3);
    assert_eq!(report.success_count + report.error_count, report.outcomes.len());
}
