//! Hierarchical traversal of drive folders and wiki node trees
//!
//! Traversal is split into a pure planning step and an effectful walk: for
//! each listed level, `plan_*_level` classifies entries into descend/download
//! actions without touching the filesystem, and the walker performs directory
//! creation, discovery counting, and task dispatch in listing order.
//!
//! Structural rules (identical for both variants):
//! - a listing failure propagates immediately and aborts the batch
//! - recursion into a subcontainer completes before the next sibling
//! - leaf tasks dispatch as their level is planned, bound to the level's
//!   directory, and run concurrently while traversal continues

use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;

use crate::client::DocumentSource;
use crate::config::OutputConfig;
use crate::error::Result;
use crate::types::{DownloadOutcome, DriveEntry, DriveEntryType, WikiNode};
use crate::utils::sanitize_file_name;

use super::document::{ExportParams, export_with_outcome};
use super::task_group::TaskGroup;

/// One planned action for a drive folder level, in listing order
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FolderAction {
    /// Create a subdirectory and traverse into the named folder
    Descend {
        /// Folder display name (sanitized for the subdirectory)
        name: String,
        /// Folder token to list next
        token: String,
    },
    /// Dispatch a document download into the current directory
    Download {
        /// Canonical document URL
        url: String,
    },
}

/// Classify a folder listing into traversal actions
///
/// Pure: no filesystem or network access. Entries that are neither folders
/// nor documents (sheets, shortcuts, uploads) are skipped.
pub(crate) fn plan_folder_level(entries: &[DriveEntry]) -> Vec<FolderAction> {
    entries
        .iter()
        .filter_map(|entry| match entry.entry_type {
            DriveEntryType::Folder => Some(FolderAction::Descend {
                name: entry.name.clone(),
                token: entry.token.clone(),
            }),
            DriveEntryType::Docx => Some(FolderAction::Download {
                url: entry.url.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// One planned action for a wiki node, in listing order
///
/// Unlike folder entries, a single wiki node can demand both actions: a
/// container page with body content descends *and* downloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WikiAction {
    /// Node title (sanitized for the subdirectory)
    pub(crate) title: String,
    /// Whether to create a subdirectory and recurse into the node
    pub(crate) descend: bool,
    /// Node token to recurse with (meaningful when `descend` is set)
    pub(crate) node_token: String,
    /// Document URL to dispatch into the current directory, if the node's
    /// object is a document
    pub(crate) download_url: Option<String>,
}

/// Classify a wiki node listing into traversal actions
///
/// Pure: no filesystem or network access.
pub(crate) fn plan_wiki_level(nodes: &[WikiNode], prefix_url: &str) -> Vec<WikiAction> {
    nodes
        .iter()
        .map(|node| WikiAction {
            title: node.title.clone(),
            descend: node.has_child,
            node_token: node.node_token.clone(),
            download_url: node
                .obj_type
                .is_document()
                .then(|| format!("{}/wiki/{}", prefix_url, node.node_token)),
        })
        .collect()
}

/// Shared state threaded through a batch traversal
pub(crate) struct TraversalCtx<'a> {
    /// Remote source to list and download from
    pub(crate) source: &'a Arc<dyn DocumentSource>,
    /// Output options forwarded to each leaf task
    pub(crate) output: &'a OutputConfig,
    /// Forwarded dump flag
    pub(crate) dump: bool,
    /// Dispatcher the discovered leaves are submitted to
    pub(crate) group: &'a mut TaskGroup<DownloadOutcome>,
    /// Leaves discovered so far; incremented strictly before each dispatch
    pub(crate) discovered: &'a mut usize,
}

impl TraversalCtx<'_> {
    /// Count and dispatch one leaf document bound to `dir`
    fn dispatch(&mut self, url: String, dir: &Path) {
        *self.discovered += 1;
        let source = Arc::clone(self.source);
        let params = ExportParams {
            url,
            target_dir: dir.to_path_buf(),
            output: self.output.clone(),
            dump: self.dump,
        };
        self.group
            .submit(async move { export_with_outcome(source, params).await });
    }
}

/// Walk a drive folder depth-first, dispatching document downloads
///
/// Boxed future for recursion.
pub(crate) fn walk_folder<'a, 'b: 'a>(
    ctx: &'a mut TraversalCtx<'b>,
    folder_token: &'a str,
    dir: &'a Path,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let entries = ctx.source.list_folder(folder_token).await?;
        tracing::debug!(
            folder = folder_token,
            entries = entries.len(),
            dir = %dir.display(),
            "Listed folder"
        );

        for action in plan_folder_level(&entries) {
            match action {
                FolderAction::Download { url } => ctx.dispatch(url, dir),
                FolderAction::Descend { name, token } => {
                    let sub_dir = dir.join(sanitize_file_name(&name));
                    std::fs::create_dir_all(&sub_dir)?;
                    walk_folder(ctx, &token, &sub_dir).await?;
                }
            }
        }
        Ok(())
    })
}

/// Walk a wiki space's node tree depth-first, dispatching document downloads
///
/// `parent_node_token = None` walks the space root. Boxed future for
/// recursion.
pub(crate) fn walk_wiki<'a, 'b: 'a>(
    ctx: &'a mut TraversalCtx<'b>,
    space_id: &'a str,
    prefix_url: &'a str,
    parent_node_token: Option<&'a str>,
    dir: &'a Path,
) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let nodes = ctx
            .source
            .list_wiki_nodes(space_id, parent_node_token)
            .await?;
        tracing::debug!(
            space = space_id,
            parent = parent_node_token.unwrap_or("<root>"),
            nodes = nodes.len(),
            "Listed wiki nodes"
        );

        for action in plan_wiki_level(&nodes, prefix_url) {
            if action.descend {
                let sub_dir = dir.join(sanitize_file_name(&action.title));
                std::fs::create_dir_all(&sub_dir)?;
                walk_wiki(ctx, space_id, prefix_url, Some(&action.node_token), &sub_dir).await?;
            }

            // Independent of descent: a container page with body content also
            // downloads, into the level's own directory
            if let Some(url) = action.download_url {
                ctx.dispatch(url, dir);
            }
        }
        Ok(())
    })
}
