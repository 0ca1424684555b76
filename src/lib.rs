//! # feishu-dl
//!
//! Concurrent Feishu/Lark document exporter: download single documents,
//! whole drive folders, or entire wiki spaces to local Markdown files.
//!
//! ## Design Philosophy
//!
//! - **Partial-failure tolerant** - One bad document never stops its
//!   siblings; every attempt is recorded in a batch report
//! - **Bounded concurrency** - A configurable admission cap applies
//!   uniformly to every batch mode
//! - **Explicit wiring** - No process-global state; configuration and
//!   options are threaded through every call
//! - **Testable seams** - The engine consumes a [`client::DocumentSource`]
//!   trait, not a concrete HTTP client
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use feishu_dl::{Config, Downloader, DownloadOptions, FeishuClient};
//! use feishu_dl::client::DocumentSource;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::load_or_default()?);
//!     let client: Arc<dyn DocumentSource> = Arc::new(FeishuClient::new(
//!         config.feishu.clone(),
//!         config.retry.clone(),
//!     ));
//!
//!     let downloader = Downloader::new(client, config);
//!     let report = downloader
//!         .download_folder(
//!             "https://example.feishu.cn/drive/folder/fldcn123",
//!             &DownloadOptions::new("./output"),
//!         )
//!         .await?;
//!     println!("{}", report.render_summary());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Document source trait and Feishu Open API client
pub mod client;
/// Configuration types
pub mod config;
/// Core download engine (traversal, dispatch, aggregation)
pub mod downloader;
/// Error types
pub mod error;
/// Docx block to Markdown conversion
pub mod markdown;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types (nodes, entries, outcomes)
pub mod types;
/// URL validation
pub mod url;
/// Filename sanitization and pretty-printing helpers
pub mod utils;

// Re-export commonly used types
pub use client::{DocumentContent, FeishuClient};
pub use config::{Config, FeishuConfig, OutputConfig, RetryConfig};
pub use downloader::{BatchReport, DownloadOptions, Downloader, OutlineOptions};
pub use error::{ApiError, Error, Result};
pub use types::{
    DocxDocument, DownloadOutcome, DriveEntry, DriveEntryType, ObjType, OutcomeStatus,
    ResolvedNode, WikiNode,
};
