//! Batch report aggregation, persistence, and summary rendering

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::DownloadOutcome;
use crate::utils::pretty_json;

/// Aggregated result of one batch run
///
/// Owned by the batch call for its whole lifetime; the aggregation loop is
/// the sole writer of the counters. Outcomes are stored in completion order,
/// which is unrelated to discovery order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchReport {
    /// Leaves discovered by traversal (counted before dispatch, so this
    /// always leads or equals the completed count)
    pub total_discovered: usize,
    /// Number of successful downloads
    pub success_count: usize,
    /// Number of failed downloads
    pub error_count: usize,
    /// Per-document outcomes in completion order
    pub outcomes: Vec<DownloadOutcome>,
    /// When the batch started
    pub start_time: DateTime<Utc>,
    /// When the batch finished (stamped by [`finalize`](Self::finalize))
    pub end_time: DateTime<Utc>,
    /// Human-readable elapsed time
    pub duration: String,
}

impl BatchReport {
    /// Start a fresh report stamped with the current time
    pub(crate) fn begin() -> Self {
        let now = Utc::now();
        Self {
            total_discovered: 0,
            success_count: 0,
            error_count: 0,
            outcomes: Vec::new(),
            start_time: now,
            end_time: now,
            duration: String::new(),
        }
    }

    /// Absorb one outcome, updating the aggregate counters
    pub(crate) fn record(&mut self, outcome: DownloadOutcome) {
        if outcome.is_success() {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Stamp the end time and elapsed duration
    pub(crate) fn finalize(&mut self) {
        self.end_time = Utc::now();
        let elapsed = self.end_time - self.start_time;
        self.duration = format_elapsed(elapsed.num_milliseconds().max(0) as u64);
    }

    /// Persist the report as pretty-printed JSON into `dir`
    ///
    /// The filename carries the run's start timestamp:
    /// `report_YYYYmmdd_HHMMSS.json`.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        let name = format!("report_{}.json", self.start_time.format("%Y%m%d_%H%M%S"));
        let path = dir.join(name);
        std::fs::write(&path, pretty_json(self)?)?;
        Ok(path)
    }

    /// Render the human-readable batch summary
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(50);

        out.push_str(&format!("\n{}\n", rule));
        out.push_str("Batch download summary\n");
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("Total documents: {}\n", self.total_discovered));
        out.push_str(&format!("Succeeded:       {}\n", self.success_count));
        out.push_str(&format!("Failed:          {}\n", self.error_count));
        out.push_str(&format!("Elapsed:         {}\n", self.duration));

        if self.error_count > 0 {
            out.push_str("\nFailed documents:\n");
            for outcome in self.outcomes.iter().filter(|o| !o.is_success()) {
                out.push_str(&format!("  - {}: {}\n", outcome.url, outcome.error));
            }
        }

        if self.success_count > 0 {
            out.push_str("\nDownloaded documents:\n");
            for outcome in self.outcomes.iter().filter(|o| o.is_success()) {
                out.push_str(&format!("  - {} -> {}\n", outcome.url, outcome.filename));
            }
        }

        out.push_str(&format!("{}\n", rule));
        out
    }
}

/// Format elapsed milliseconds as `1h2m3.4s` (leading zero units omitted)
fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) as f64 / 1000.0;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes > 0 || hours > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&format!("{:.1}s", seconds));
    out
}
