//! URL validation for document, folder, and wiki-space links
//!
//! Feishu/Lark share links follow a small set of path shapes:
//! - `https://<tenant>.feishu.cn/docx/<token>` (new-style document)
//! - `https://<tenant>.feishu.cn/wiki/<node-token>` (wiki page)
//! - `https://<tenant>.feishu.cn/docs/<token>` (legacy document)
//! - `https://<tenant>.feishu.cn/drive/folder/<token>` (drive folder)
//! - `https://<tenant>.feishu.cn/wiki/settings/<space-id>` (wiki space)

use url::Url;

use crate::error::{Error, Result};

/// Which kind of document link a URL points to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlKind {
    /// New-style docx document link
    Docx,
    /// Wiki page link (needs node resolution before fetching)
    Wiki,
    /// Legacy Feishu Docs link
    Docs,
}

fn parse(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(Error::InvalidUrl(format!(
            "{raw}: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(Error::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(url)
}

fn segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segs| {
            segs.filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Validate a single-document URL, returning its kind and opaque token
pub fn validate_document_url(raw: &str) -> Result<(UrlKind, String)> {
    let url = parse(raw)?;
    let segs = segments(&url);
    match segs.as_slice() {
        [kind, token, ..] if kind == "docx" => Ok((UrlKind::Docx, token.clone())),
        [kind, settings, ..] if kind == "wiki" && settings == "settings" => Err(Error::InvalidUrl(
            format!("{raw}: wiki space URL, expected a document URL"),
        )),
        [kind, token, ..] if kind == "wiki" => Ok((UrlKind::Wiki, token.clone())),
        [kind, token, ..] if kind == "docs" => Ok((UrlKind::Docs, token.clone())),
        _ => Err(Error::InvalidUrl(format!(
            "{raw}: expected a /docx/, /wiki/, or /docs/ document URL"
        ))),
    }
}

/// Validate a drive folder URL, returning the folder token
pub fn validate_folder_url(raw: &str) -> Result<String> {
    let url = parse(raw)?;
    let segs = segments(&url);
    match segs.as_slice() {
        [drive, folder, token, ..] if drive == "drive" && folder == "folder" => Ok(token.clone()),
        _ => Err(Error::InvalidUrl(format!(
            "{raw}: expected a /drive/folder/ URL"
        ))),
    }
}

/// Validate a wiki space settings URL, returning the origin prefix
/// (`scheme://host`) and the space id
///
/// The prefix is later composed with node tokens to form per-page URLs
/// (`<prefix>/wiki/<node-token>`).
pub fn validate_wiki_url(raw: &str) -> Result<(String, String)> {
    let url = parse(raw)?;
    let segs = segments(&url);
    match segs.as_slice() {
        [wiki, settings, space_id, ..] if wiki == "wiki" && settings == "settings" => {
            let host = url.host_str().unwrap_or_default();
            let prefix = format!("{}://{}", url.scheme(), host);
            Ok((prefix, space_id.clone()))
        }
        _ => Err(Error::InvalidUrl(format!(
            "{raw}: expected a /wiki/settings/ URL"
        ))),
    }
}
