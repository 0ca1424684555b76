//! Core download engine split into focused submodules.
//!
//! The `Downloader` struct and its batch machinery are organized by domain:
//! - [`task_group`] - Fan-out/fan-in dispatch primitive
//! - [`traverse`] - Folder and wiki tree traversal
//! - [`document`] - Per-document export pipeline
//! - [`report`] - Batch report aggregation and rendering
//! - [`outline`] - Read-only wiki outline rendering

mod document;
mod outline;
mod report;
mod task_group;
mod traverse;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use outline::OutlineOptions;
pub use report::BatchReport;

use std::path::PathBuf;
use std::sync::Arc;

use crate::client::DocumentSource;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::DownloadOutcome;
use crate::url::{validate_folder_url, validate_wiki_url};
use crate::utils::sanitize_file_name;

use document::ExportParams;
use task_group::TaskGroup;
use traverse::{TraversalCtx, walk_folder, walk_wiki};

/// Options for a download invocation (single or batch)
#[derive(Clone, Debug)]
pub struct DownloadOptions {
    /// Directory the exported files land in
    pub output_dir: PathBuf,
    /// Also write each document's raw structured response as JSON
    pub dump: bool,
    /// Override the configured concurrency cap for this invocation
    /// (`Some(0)` disables the cap)
    pub max_concurrent: Option<usize>,
}

impl DownloadOptions {
    /// Options writing into `output_dir` with configured defaults
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dump: false,
            max_concurrent: None,
        }
    }
}

/// What a batch run traverses
enum BatchTarget {
    Folder {
        token: String,
        root: PathBuf,
    },
    Wiki {
        space_id: String,
        prefix_url: String,
        root: PathBuf,
    },
}

/// Document download engine
///
/// Holds the remote source and configuration; every invocation threads its
/// own [`DownloadOptions`], so concurrent batches stay independent.
pub struct Downloader {
    source: Arc<dyn DocumentSource>,
    config: Arc<Config>,
}

impl Downloader {
    /// Create a downloader over a document source
    pub fn new(source: Arc<dyn DocumentSource>, config: Arc<Config>) -> Self {
        Self { source, config }
    }

    /// Resolve the effective concurrency cap for one invocation
    fn effective_cap(&self, opts: &DownloadOptions) -> Option<usize> {
        let cap = opts
            .max_concurrent
            .unwrap_or(self.config.output.max_concurrent);
        (cap > 0).then_some(cap)
    }

    /// Download a single document to `<output>/<sanitized-title>.md`
    ///
    /// Returns the written filename.
    pub async fn download_document(&self, url: &str, opts: &DownloadOptions) -> Result<String> {
        let params = ExportParams {
            url: url.to_string(),
            target_dir: opts.output_dir.clone(),
            output: self.config.output.clone(),
            dump: opts.dump,
        };
        document::export_document(&self.source, &params).await
    }

    /// Download every document under a drive folder, mirroring its hierarchy
    ///
    /// Leaf failures are isolated into the returned report; a listing failure
    /// aborts the whole batch.
    pub async fn download_folder(&self, url: &str, opts: &DownloadOptions) -> Result<BatchReport> {
        let token = validate_folder_url(url)?;
        tracing::info!(folder = %token, "Starting folder batch");

        std::fs::create_dir_all(&opts.output_dir)?;
        self.run_batch(
            opts,
            BatchTarget::Folder {
                token,
                root: opts.output_dir.clone(),
            },
        )
        .await
    }

    /// Download every document of a wiki space, rooted at
    /// `<output>/<sanitized-wiki-name>/`
    pub async fn download_wiki(&self, url: &str, opts: &DownloadOptions) -> Result<BatchReport> {
        let (prefix_url, space_id) = validate_wiki_url(url)?;

        let name = self.source.wiki_name(&space_id).await?;
        if name.is_empty() {
            return Err(Error::Other(format!("wiki space {} has no name", space_id)));
        }
        tracing::info!(space = %space_id, name = %name, "Starting wiki batch");

        let root = opts.output_dir.join(sanitize_file_name(&name));
        std::fs::create_dir_all(&root)?;

        self.run_batch(
            opts,
            BatchTarget::Wiki {
                space_id,
                prefix_url,
                root,
            },
        )
        .await
    }

    /// Render a wiki space's outline without downloading content
    ///
    /// Returns the path of the written outline file.
    pub async fn wiki_outline(&self, url: &str, opts: &OutlineOptions) -> Result<PathBuf> {
        outline::render_outline(&self.source, url, opts).await
    }

    /// Shared batch lifecycle: traverse, join, aggregate, persist
    ///
    /// On a structural traversal failure the task group is cancelled and
    /// joined before the error propagates; outcomes of already-running tasks
    /// are deliberately discarded.
    async fn run_batch(&self, opts: &DownloadOptions, target: BatchTarget) -> Result<BatchReport> {
        let mut report = BatchReport::begin();
        let mut group: TaskGroup<DownloadOutcome> = TaskGroup::new(self.effective_cap(opts));
        let mut discovered = 0usize;

        let traversal = {
            let mut ctx = TraversalCtx {
                source: &self.source,
                output: &self.config.output,
                dump: opts.dump,
                group: &mut group,
                discovered: &mut discovered,
            };
            match &target {
                BatchTarget::Folder { token, root } => walk_folder(&mut ctx, token, root).await,
                BatchTarget::Wiki {
                    space_id,
                    prefix_url,
                    root,
                } => walk_wiki(&mut ctx, space_id, prefix_url, None, root).await,
            }
        };

        if let Err(err) = traversal {
            tracing::error!(error = %err, "Traversal failed, aborting batch");
            group.cancel();
            let _ = group.join().await;
            return Err(err);
        }

        report.total_discovered = discovered;
        for outcome in group.join().await {
            report.record(outcome);
        }
        report.finalize();

        match report.persist(&opts.output_dir) {
            Ok(path) => tracing::info!(path = %path.display(), "Batch report written"),
            Err(err) => tracing::warn!(error = %err, "Failed to write batch report"),
        }

        Ok(report)
    }
}
