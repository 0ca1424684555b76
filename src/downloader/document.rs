//! Single-document export pipeline
//!
//! One invocation per leaf document: resolve the URL to a docx object, fetch
//! its structured content, convert to Markdown, relocate embedded assets, and
//! write the result. The outcome-producing wrapper guarantees that no failure
//! escapes a dispatched task.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::client::DocumentSource;
use crate::config::OutputConfig;
use crate::error::{Error, Result};
use crate::markdown::MarkdownRenderer;
use crate::types::DownloadOutcome;
use crate::url::{UrlKind, validate_document_url};
use crate::utils::{pretty_json, sanitize_file_name};

/// Parameters for one document export
#[derive(Clone)]
pub(crate) struct ExportParams {
    /// Source URL of the document
    pub(crate) url: String,
    /// Directory the Markdown file lands in
    pub(crate) target_dir: PathBuf,
    /// Output options (asset dir, skip flag)
    pub(crate) output: OutputConfig,
    /// Also write the raw structured response as JSON
    pub(crate) dump: bool,
}

/// Export one document to Markdown, returning the written filename
pub(crate) async fn export_document(
    source: &Arc<dyn DocumentSource>,
    params: &ExportParams,
) -> Result<String> {
    let (kind, mut token) = validate_document_url(&params.url)?;

    if kind == UrlKind::Docs {
        return Err(Error::NotSupported(
            "legacy Feishu Docs documents can no longer be exported".to_string(),
        ));
    }

    // A wiki page URL addresses a tree node; one extra hop resolves it to
    // the underlying document object.
    if kind == UrlKind::Wiki {
        let resolved = source.resolve_wiki_node(&token).await?;
        if !resolved.obj_type.is_document() {
            return Err(Error::NotSupported(format!(
                "wiki node {} holds a {} object, not a document",
                token, resolved.obj_type
            )));
        }
        token = resolved.obj_token;
    }

    let content = source.fetch_document(&token).await?;

    let mut renderer = MarkdownRenderer::new();
    let mut markdown = renderer.render(&content.document, &content.blocks)?;

    if !params.output.skip_image_download {
        let asset_dir = params.target_dir.join(&params.output.image_dir);
        for asset_token in renderer.image_tokens() {
            let written = source.download_asset(asset_token, &asset_dir).await?;
            let local = local_asset_path(&params.output.image_dir, &written);
            // The renderer emits each token once; rewrite that occurrence only
            markdown = markdown.replacen(asset_token.as_str(), &local, 1);
        }
    }

    let title = &content.document.title;
    let full = format!(
        "# {}\n\n> Source: [{}]({})\n\n{}\n",
        title, title, params.url, markdown
    );

    tokio::fs::create_dir_all(&params.target_dir).await?;

    if params.dump {
        let dump_path = params.target_dir.join(format!("{}.json", token));
        let payload = serde_json::json!({
            "document": content.document,
            "blocks": content.blocks,
        });
        tokio::fs::write(&dump_path, pretty_json(&payload)?).await?;
        tracing::debug!(path = %dump_path.display(), "Dumped raw document response");
    }

    let filename = format!("{}.md", sanitize_file_name(title));
    let output_path = params.target_dir.join(&filename);
    tokio::fs::write(&output_path, full).await?;

    tracing::debug!(url = %params.url, path = %output_path.display(), "Document exported");
    Ok(filename)
}

/// Export one document and record the result, whatever happens
///
/// This is the task boundary of the concurrent dispatcher: every failure in
/// the pipeline is converted into a failure outcome so one bad document
/// cannot stop its siblings.
pub(crate) async fn export_with_outcome(
    source: Arc<dyn DocumentSource>,
    params: ExportParams,
) -> DownloadOutcome {
    match export_document(&source, &params).await {
        Ok(filename) => DownloadOutcome::success(&params.url, filename),
        Err(err) => {
            tracing::warn!(url = %params.url, error = %err, "Document download failed");
            DownloadOutcome::failure(&params.url, err.to_string())
        }
    }
}

/// Relative path written into the Markdown for a downloaded asset
fn local_asset_path(image_dir: &str, written: &Path) -> String {
    let name = written
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if image_dir.is_empty() {
        name
    } else {
        format!("{}/{}", image_dir, name)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_asset_path_joins_with_forward_slash() {
        assert_eq!(
            local_asset_path("static", Path::new("/tmp/out/static/boxcn1.png")),
            "static/boxcn1.png"
        );
    }

    #[test]
    fn local_asset_path_handles_empty_image_dir() {
        assert_eq!(
            local_asset_path("", Path::new("/tmp/out/boxcn1.png")),
            "boxcn1.png"
        );
    }
}
