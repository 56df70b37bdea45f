// src/config.rs

use crate::types::ClassId;

/// Assignment strategy for one classification scheme, chosen at
/// configuration time. The choice does not change mid-run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentMethod {
    /// Target of the single highest-scoring active match.
    BestHit,
    /// Lowest common ancestor of all active-match targets.
    Lca,
    /// LCA over the highest-weight matches covering `percent` of the total
    /// bit-score weight of the active set.
    WeightedLca { percent: f32 },
    /// Interval-aware consensus for fragmented long-read alignments.
    LongReadLca,
}

impl AssignmentMethod {
    /// Whether this method produces hierarchical consensus assignments.
    /// Min-support pruning only applies to such schemes.
    pub fn is_lca_family(&self) -> bool {
        !matches!(self, AssignmentMethod::BestHit)
    }
}

/// One classification scheme activated for a run: the scheme name, the path
/// semantics are owned by the caller (the CLI loads hierarchy files, library
/// embedders construct schemes directly).
#[derive(Debug, Clone)]
pub struct SchemeConfig {
    pub name: String,
    pub method: AssignmentMethod,
    /// Administratively disabled ids, folded away by the min-support pass.
    pub disabled_ids: Vec<ClassId>,
}

/// All tunables of an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Minimum bit score for a match to be considered at all.
    pub min_score: f32,
    /// Accept matches within this percentage of the best bit score.
    /// 100 disables the top-percent clause.
    pub top_percent: f32,
    /// Maximum expected value for a match to be considered.
    pub max_expected: f64,
    /// Minimum percent identity for a match to be considered.
    pub min_percent_identity: f32,
    /// Reads with a complexity score below this are forced to the
    /// low-complexity sentinel under every scheme. 0 disables the filter.
    pub min_complexity: f32,
    /// Absolute min-support count; 0 disables support pruning unless
    /// `min_support_percent` is set.
    pub min_support: u64,
    /// When > 0, the absolute count is derived at the end of streaming as
    /// `max(1, percent/100 * (reads_with_hits + assigned_via_mate))`.
    pub min_support_percent: f32,
    /// Combine mated reads into one consensus taxon.
    pub use_mate_pairs: bool,
    pub schemes: Vec<SchemeConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_score: 50.0,
            top_percent: 10.0,
            max_expected: 0.01,
            min_percent_identity: 0.0,
            min_complexity: 0.0,
            min_support: 1,
            min_support_percent: 0.0,
            use_mate_pairs: false,
            schemes: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Ordinal of the taxonomy scheme, if active. Mate-pair resolution and
    /// the identity filter only ever apply to this scheme.
    pub fn taxonomy_index(&self) -> Option<usize> {
        self.schemes.iter().position(|s| s.name == "Taxonomy")
    }
}
