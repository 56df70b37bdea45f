// src/classify/driver.rs

use std::sync::Arc;

use ahash::AHashSet;
use rayon::prelude::*;

use crate::archive::ReadArchive;
use crate::config::{AnalysisConfig, SchemeConfig};
use crate::errors::{AnalysisError, Result};
use crate::progress::{CancelToken, ProgressListener};
use crate::scheme::ClassificationScheme;
use crate::types::{
    AssignmentRecord, ClassId, ReadRecord, LOW_COMPLEXITY_ID, UNASSIGNED_ID,
};

use super::active_matches::{self, ActiveSet};
use super::assignment::AssignmentAlgorithm;
use super::mate_pairs;
use super::min_support::{ClassCounts, MinSupportFilter};

/// Terminal status of a run. Cancellation is cooperative and is not an
/// error: the pass stops at the next read boundary, nothing is committed,
/// and previously persisted state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Aggregate counters of one run, all read-weight sums.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    pub total_reads: u64,
    pub total_matches: u64,
    pub low_complexity_reads: u64,
    pub reads_with_hits: u64,
    pub assigned_via_mate: u64,
    /// The absolute min-support threshold that was applied (possibly derived
    /// from a percentage at the end of streaming).
    pub min_support_used: u64,
    pub per_scheme: Vec<SchemeSummary>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemeSummary {
    pub name: String,
    pub assigned_weight: u64,
    pub unassigned_weight: u64,
    pub min_support_changes: u64,
    /// Distinct class ids in the committed table; 0 when nothing committed.
    pub classification_size: u64,
}

/// Everything a finished (or cancelled) run hands back to the caller.
pub struct AnalysisOutcome {
    pub status: RunStatus,
    pub summary: AnalysisSummary,
    /// One row per read, scheme columns in configuration order. Already
    /// rewritten by the min-support pass.
    pub records: Vec<AssignmentRecord>,
    /// Final per-scheme class counts, configuration order.
    pub counts: Vec<ClassCounts>,
}

/// Per-scheme mutable state carried across the streaming pass, indexed by
/// scheme ordinal and owned exclusively by the driver.
struct SchemeState {
    config: SchemeConfig,
    scheme: Arc<ClassificationScheme>,
    /// Column of this scheme in the archive's match records.
    ordinal: usize,
    algorithm: AssignmentAlgorithm,
    disabled_ids: AHashSet<ClassId>,
    active: ActiveSet,
    counts: ClassCounts,
    assigned_weight: u64,
    unassigned_weight: u64,
    min_support_changes: u64,
}

impl SchemeState {
    /// Long-read mode must not pre-filter matches by score distance; the
    /// interval consensus weighs them itself.
    fn top_percent(&self, config: &AnalysisConfig) -> f32 {
        match self.config.method {
            crate::config::AssignmentMethod::LongReadLca => 100.0,
            _ => config.top_percent,
        }
    }
}

/// The streaming orchestrator: one pass over the archive, one id per scheme
/// per read, post-pass support pruning, then the commit.
pub struct ClassificationDriver<'a> {
    config: &'a AnalysisConfig,
    archive: &'a dyn ReadArchive,
    schemes: Vec<SchemeState>,
    taxonomy_index: Option<usize>,
}

impl std::fmt::Debug for ClassificationDriver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationDriver")
            .field("num_schemes", &self.schemes.len())
            .field("taxonomy_index", &self.taxonomy_index)
            .finish_non_exhaustive()
    }
}

impl<'a> ClassificationDriver<'a> {
    /// Resolves schemes against the archive and builds one algorithm
    /// instance per scheme. All configuration problems surface here, before
    /// any read is touched.
    pub fn new(
        config: &'a AnalysisConfig,
        schemes: Vec<Arc<ClassificationScheme>>,
        archive: &'a dyn ReadArchive,
    ) -> Result<Self> {
        if config.schemes.is_empty() {
            return Err(AnalysisError::Config(
                "no classification schemes configured".to_string(),
            ));
        }
        if config.schemes.len() != schemes.len() {
            return Err(AnalysisError::Config(format!(
                "{} scheme configs but {} hierarchies",
                config.schemes.len(),
                schemes.len()
            )));
        }
        if config.use_mate_pairs && !archive.supports_random_access() {
            return Err(AnalysisError::Config(
                "mate-pair mode requires an archive with random access".to_string(),
            ));
        }

        let mut states = Vec::with_capacity(config.schemes.len());
        for (scheme_config, scheme) in config.schemes.iter().zip(schemes) {
            if scheme_config.name != scheme.name {
                return Err(AnalysisError::Config(format!(
                    "scheme config '{}' paired with hierarchy '{}'",
                    scheme_config.name, scheme.name
                )));
            }
            let ordinal = archive
                .scheme_names()
                .iter()
                .position(|n| n == &scheme_config.name)
                .ok_or_else(|| {
                    AnalysisError::Config(format!(
                        "archive carries no targets for scheme '{}'",
                        scheme_config.name
                    ))
                })?;
            states.push(SchemeState {
                algorithm: AssignmentAlgorithm::create(scheme_config.method, scheme.clone()),
                disabled_ids: scheme_config.disabled_ids.iter().copied().collect(),
                config: scheme_config.clone(),
                scheme,
                ordinal,
                active: ActiveSet::new(),
                counts: ClassCounts::new(),
                assigned_weight: 0,
                unassigned_weight: 0,
                min_support_changes: 0,
            });
        }

        Ok(Self {
            config,
            archive,
            schemes: states,
            taxonomy_index: config.taxonomy_index(),
        })
    }

    /// Runs the whole pipeline: stream, prune, commit. The read iterator is
    /// not restartable, so the driver is consumed.
    pub fn run(
        mut self,
        progress: &dyn ProgressListener,
        cancel: &CancelToken,
    ) -> Result<AnalysisOutcome> {
        progress.set_subtask("Analyzing reads & alignments");
        log::info!("Analyzing...");
        if self.config.use_mate_pairs {
            log::info!("Using paired reads in taxonomic assignment...");
        }

        let mut summary = AnalysisSummary::default();
        let mut records: Vec<AssignmentRecord> = Vec::new();
        let mut mate_active = ActiveSet::new();

        progress.set_subtask("Processing alignments");
        progress.set_maximum(self.archive.max_progress());

        let mut status = RunStatus::Completed;
        {
            let archive = self.archive;
            let iter = archive.iterate_reads()?;
            for item in iter {
                // Polled once per read; a half-processed read is never
                // abandoned.
                if cancel.is_cancelled() {
                    status = RunStatus::Cancelled;
                    break;
                }
                let (read, position) = item?;
                let weight = u64::from(read.weight.max(1));

                summary.total_reads += weight;
                summary.total_matches += read.matches.len() as u64;

                let low_complexity = read.has_low_complexity(self.config.min_complexity);
                if low_complexity {
                    summary.low_complexity_reads += weight;
                }

                let tax_id = self.compute_taxonomy_id(
                    &read,
                    weight,
                    &mut mate_active,
                    &mut summary,
                )?;

                let with_hits = match self.taxonomy_index {
                    Some(ti) => !self.schemes[ti].active.is_empty(),
                    None => !read.matches.is_empty(),
                };
                if with_hits {
                    summary.reads_with_hits += weight;
                }

                let mut class_ids = Vec::with_capacity(self.schemes.len());
                for i in 0..self.schemes.len() {
                    let id = if low_complexity {
                        LOW_COMPLEXITY_ID
                    } else if Some(i) == self.taxonomy_index {
                        tax_id
                    } else {
                        let top_percent = self.schemes[i].top_percent(self.config);
                        let st = &mut self.schemes[i];
                        active_matches::compute(
                            &read,
                            st.ordinal,
                            self.config.min_score,
                            top_percent,
                            self.config.max_expected,
                            self.config.min_percent_identity,
                            &mut st.active,
                        );
                        st.algorithm.compute_id(&st.active, &read, st.ordinal)
                    };

                    // Ids the scheme does not know are silently coerced to
                    // the unassigned sentinel and only show up in counters.
                    let st = &mut self.schemes[i];
                    let id = if id > 0 && !st.scheme.is_known(id) {
                        UNASSIGNED_ID
                    } else if id == 0 {
                        UNASSIGNED_ID
                    } else {
                        id
                    };

                    if id > 0 {
                        st.assigned_weight += weight;
                    } else if id == UNASSIGNED_ID {
                        st.unassigned_weight += weight;
                    }
                    *st.counts.entry(id).or_insert(0) += weight;
                    class_ids.push(id);
                }

                records.push(AssignmentRecord {
                    read_uid: read.uid,
                    weight: read.weight.max(1),
                    class_ids,
                });
                progress.set_progress(position);
            }
        }

        if status == RunStatus::Cancelled {
            log::info!("Cancelled after {} reads", summary.total_reads);
            summary.per_scheme = self.scheme_summaries();
            return Ok(AnalysisOutcome {
                status,
                summary,
                records,
                counts: self.schemes.into_iter().map(|s| s.counts).collect(),
            });
        }

        log::info!("Total reads:   {:>15}", summary.total_reads);
        if summary.low_complexity_reads > 0 {
            log::info!("Low complexity:{:>15}", summary.low_complexity_reads);
        }
        log::info!("With hits:     {:>15}", summary.reads_with_hits);
        log::info!("Alignments:    {:>15}", summary.total_matches);
        for st in &self.schemes {
            log::info!(
                "Assig. {:<12}{:>11}",
                format!("{}:", st.config.name),
                st.assigned_weight
            );
        }
        if summary.assigned_via_mate > 0 {
            log::info!("Tax. ass. by mate:{:>12}", summary.assigned_via_mate);
        }

        // A percentage-based minimum support can only be resolved once the
        // streaming counters exist.
        let min_support = if self.config.min_support_percent > 0.0 {
            let derived = (self.config.min_support_percent as f64 / 100.0
                * (summary.reads_with_hits + summary.assigned_via_mate) as f64)
                as u64;
            let derived = derived.max(1);
            log::info!("MinSupport set to: {}", derived);
            derived
        } else {
            self.config.min_support
        };
        summary.min_support_used = min_support;

        self.apply_min_support(min_support, &mut records, progress);

        let scheme_names: Vec<String> = self
            .schemes
            .iter()
            .map(|s| s.config.name.clone())
            .collect();
        self.archive
            .commit_assignments(&scheme_names, &records, progress)?;

        summary.per_scheme = self.scheme_summaries();
        for s in &mut summary.per_scheme {
            s.classification_size = self.archive.classification_size(&s.name)?;
            log::info!("Class. {:<13}{:>10}", format!("{}:", s.name), s.classification_size);
        }

        Ok(AnalysisOutcome {
            status,
            summary,
            records,
            counts: self.schemes.into_iter().map(|s| s.counts).collect(),
        })
    }

    /// Taxonomy id of one read, including mate-pair consensus when enabled.
    /// Mate lookups are not individually recoverable: any I/O failure aborts
    /// the run.
    fn compute_taxonomy_id(
        &mut self,
        read: &ReadRecord,
        weight: u64,
        mate_active: &mut ActiveSet,
        summary: &mut AnalysisSummary,
    ) -> Result<ClassId> {
        let ti = match self.taxonomy_index {
            Some(ti) => ti,
            None => return Ok(0),
        };
        let top_percent = self.schemes[ti].top_percent(self.config);
        let st = &mut self.schemes[ti];
        active_matches::compute(
            read,
            st.ordinal,
            self.config.min_score,
            top_percent,
            self.config.max_expected,
            self.config.min_percent_identity,
            &mut st.active,
        );
        let mut tax_id = st.algorithm.compute_id(&st.active, read, st.ordinal);

        if self.config.use_mate_pairs && read.mate_uid > 0 {
            let mate = self.archive.read_mate(read.mate_uid)?;
            let st = &mut self.schemes[ti];
            active_matches::compute(
                &mate,
                st.ordinal,
                self.config.min_score,
                top_percent,
                self.config.max_expected,
                self.config.min_percent_identity,
                mate_active,
            );
            let mate_id = st.algorithm.compute_id(mate_active, &mate, st.ordinal);
            let resolved = mate_pairs::resolve(&st.algorithm, tax_id, mate_id);
            if resolved.assigned_via_mate {
                summary.assigned_via_mate += weight;
            }
            tax_id = resolved.id;
        }
        Ok(tax_id)
    }

    /// Folds under-supported and disabled ids into their ancestors and
    /// rewrites the assignment table accordingly. Best-hit schemes carry no
    /// hierarchical consensus and are skipped.
    fn apply_min_support(
        &mut self,
        min_support: u64,
        records: &mut [AssignmentRecord],
        progress: &dyn ProgressListener,
    ) {
        let mut remaps: Vec<Option<ahash::AHashMap<ClassId, ClassId>>> =
            vec![None; self.schemes.len()];
        for (i, st) in self.schemes.iter_mut().enumerate() {
            if !st.config.method.is_lca_family() {
                continue;
            }
            if min_support == 0 && st.disabled_ids.is_empty() {
                continue;
            }
            progress.set_subtask(&format!(
                "Applying min-support & disabled filter to {}...",
                st.config.name
            ));
            let filter = MinSupportFilter::new(&st.scheme, min_support, &st.disabled_ids);
            let changes = filter.apply(&mut st.counts);
            st.min_support_changes = changes.len() as u64;
            log::info!("Min-supp. changes:{:>12}", changes.len());
            if !changes.is_empty() {
                remaps[i] = Some(changes);
            }
        }

        if remaps.iter().any(Option::is_some) {
            records.par_iter_mut().for_each(|record| {
                for (i, remap) in remaps.iter().enumerate() {
                    if let Some(remap) = remap {
                        if let Some(&new_id) = remap.get(&record.class_ids[i]) {
                            record.class_ids[i] = new_id;
                        }
                    }
                }
            });
        }
    }

    fn scheme_summaries(&self) -> Vec<SchemeSummary> {
        self.schemes
            .iter()
            .map(|st| SchemeSummary {
                name: st.config.name.clone(),
                assigned_weight: st.assigned_weight,
                unassigned_weight: st.unassigned_weight,
                min_support_changes: st.min_support_changes,
                classification_size: 0,
            })
            .collect()
    }
}
