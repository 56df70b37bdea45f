// src/lib.rs
pub mod archive;
pub mod classify;
pub mod config;
pub mod errors;
pub mod progress;
pub mod report;
pub mod scheme;
pub mod types;

use std::sync::Arc;

use crate::classify::driver::ClassificationDriver;

pub use crate::archive::{FileArchive, MemoryArchive, ReadArchive};
pub use crate::classify::driver::{AnalysisSummary, RunStatus, SchemeSummary};
pub use crate::classify::min_support::ClassCounts;
pub use crate::config::{AnalysisConfig, AssignmentMethod, SchemeConfig};
pub use crate::errors::{AnalysisError, Result};
pub use crate::progress::{CancelToken, LogProgress, NoProgress, ProgressListener};
pub use crate::scheme::ClassificationScheme;
pub use crate::types::{AssignmentRecord, ClassId, LOW_COMPLEXITY_ID, UNASSIGNED_ID};

/// Everything a finished run leaves behind: terminal status, counters, the
/// committed per-read assignment table and the final per-scheme class
/// counts. Report text is generated on demand.
#[derive(Debug)]
pub struct AnalysisResults {
    pub status: RunStatus,
    pub summary: AnalysisSummary,
    pub records: Vec<AssignmentRecord>,
    pub counts: Vec<ClassCounts>,
    schemes: Vec<Arc<ClassificationScheme>>,
}

impl AnalysisResults {
    /// Indented text summary for one scheme, None for unknown names.
    pub fn get_report(&self, scheme_name: &str) -> Option<String> {
        let i = self
            .schemes
            .iter()
            .position(|s| s.name == scheme_name)?;
        let (_, text) = report::build_report(&self.schemes[i], &self.counts[i]);
        Some(text)
    }

    /// One terminal status line per run: success with counts, or cancelled.
    pub fn get_status_text(&self) -> String {
        match self.status {
            RunStatus::Completed => {
                let per_scheme: Vec<String> = self
                    .summary
                    .per_scheme
                    .iter()
                    .map(|s| format!("{}={}", s.name, s.assigned_weight))
                    .collect();
                format!(
                    "completed: {} reads, assigned {}",
                    self.summary.total_reads,
                    per_scheme.join(", ")
                )
            }
            RunStatus::Cancelled => {
                format!("cancelled after {} reads", self.summary.total_reads)
            }
        }
    }
}

/// Unified entry point: classify every read in the archive under the
/// configured schemes, prune under-supported assignments, and commit the
/// table. `schemes` must line up with `config.schemes`.
pub fn analyze(
    config: &AnalysisConfig,
    schemes: Vec<Arc<ClassificationScheme>>,
    archive: &dyn ReadArchive,
    progress: &dyn ProgressListener,
    cancel: &CancelToken,
) -> Result<AnalysisResults> {
    let driver = ClassificationDriver::new(config, schemes.clone(), archive)?;
    let outcome = driver.run(progress, cancel)?;
    Ok(AnalysisResults {
        status: outcome.status,
        summary: outcome.summary,
        records: outcome.records,
        counts: outcome.counts,
        schemes,
    })
}
