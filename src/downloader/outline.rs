//! Wiki outline rendering
//!
//! A read-only variant of the wiki traversal: instead of downloading
//! documents it emits an indented Markdown tree of the space, one line per
//! node. Fully sequential; the only network effects are the listing calls.

use chrono::Utc;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::DocumentSource;
use crate::error::{Error, Result};
use crate::url::validate_wiki_url;
use crate::utils::sanitize_file_name;

/// Options for an outline run
#[derive(Clone, Debug)]
pub struct OutlineOptions {
    /// Directory the outline file is written into
    pub output_dir: PathBuf,
    /// Render each node as a link to its wiki page
    pub with_links: bool,
}

/// Marker appended to document nodes
const DOC_MARKER: &str = " 📄";
/// Marker appended to container nodes that are not documents
const FOLDER_MARKER: &str = " 📁";

/// Render a wiki space's outline and write it to
/// `<output>/<sanitized-name>_目录结构.md`
///
/// Returns the written path.
pub(crate) async fn render_outline(
    source: &Arc<dyn DocumentSource>,
    url: &str,
    opts: &OutlineOptions,
) -> Result<PathBuf> {
    let (prefix_url, space_id) = validate_wiki_url(url)?;

    let name = source.wiki_name(&space_id).await?;
    if name.is_empty() {
        return Err(Error::Other(format!(
            "wiki space {} has no name",
            space_id
        )));
    }

    let mut out = String::new();
    out.push_str(&format!("# {} 目录结构\n\n", name));
    out.push_str(&format!(
        "> Generated: {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("> Source: [{}]({})\n\n", name, url));

    build_outline(
        source,
        &space_id,
        &prefix_url,
        None,
        0,
        opts.with_links,
        &mut out,
    )
    .await?;

    tokio::fs::create_dir_all(&opts.output_dir).await?;
    let file_name = format!("{}_目录结构.md", sanitize_file_name(&name));
    let path = opts.output_dir.join(file_name);
    tokio::fs::write(&path, out).await?;

    tracing::info!(path = %path.display(), "Wiki outline written");
    Ok(path)
}

/// Append one level of the tree and recurse into children
///
/// Boxed future for recursion.
fn build_outline<'a>(
    source: &'a Arc<dyn DocumentSource>,
    space_id: &'a str,
    prefix_url: &'a str,
    parent_node_token: Option<&'a str>,
    depth: usize,
    with_links: bool,
    out: &'a mut String,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let nodes = source.list_wiki_nodes(space_id, parent_node_token).await?;
        let indent = "  ".repeat(depth);

        for node in nodes {
            if with_links {
                out.push_str(&format!(
                    "{}- [{}]({}/wiki/{})",
                    indent, node.title, prefix_url, node.node_token
                ));
            } else {
                out.push_str(&format!("{}- {}", indent, node.title));
            }

            if node.obj_type.is_document() {
                out.push_str(DOC_MARKER);
            } else if node.has_child {
                out.push_str(FOLDER_MARKER);
            }
            out.push('\n');

            if node.has_child {
                build_outline(
                    source,
                    space_id,
                    prefix_url,
                    Some(&node.node_token),
                    depth + 1,
                    with_links,
                    out,
                )
                .await?;
            }
        }
        Ok(())
    })
}
