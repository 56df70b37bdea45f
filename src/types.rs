//src/types.rs

/// Class id within one classification scheme. Valid scheme nodes are `> 0`;
/// non-positive values are sentinels.
pub type ClassId = i32;

/// Sentinel for reads that could not be assigned under a scheme.
pub const UNASSIGNED_ID: ClassId = -1;

/// Sentinel for reads flagged as low-complexity; forced for every scheme.
pub const LOW_COMPLEXITY_ID: ClassId = -2;

/// One alignment of a read against a reference.
///
/// `class_ids[k]` is the target id under scheme ordinal `k` (a match may map
/// to a taxon under "Taxonomy" and an EC number under "EC" at the same time).
/// `read_start`/`read_end` are 0-based half-open coordinates on the read and
/// are only consumed by the long-read algorithm; `0,0` means "no coordinates".
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub bit_score: f32,
    pub percent_identity: f32,
    pub expected: f64,
    pub read_start: u32,
    pub read_end: u32,
    pub class_ids: Vec<ClassId>,
}

impl MatchRecord {
    /// Target id of this match under scheme ordinal `k`, or 0 if the source
    /// carried no target for that scheme.
    pub fn class_id(&self, ordinal: usize) -> ClassId {
        self.class_ids.get(ordinal).copied().unwrap_or(0)
    }

    pub fn has_coordinates(&self) -> bool {
        self.read_end > self.read_start
    }
}

/// One sequencing read together with its reference alignments.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    /// Stable unique id assigned by the archive.
    pub uid: u64,
    pub name: String,
    /// Duplicate/collapsed-read multiplicity, always >= 1.
    pub weight: u32,
    /// Complexity score; 0 when the source reports none.
    pub complexity: f32,
    /// Unique id of the paired read, 0 if unpaired.
    pub mate_uid: u64,
    pub matches: Vec<MatchRecord>,
}

impl ReadRecord {
    /// Low-complexity predicate against the configured minimum complexity.
    pub fn has_low_complexity(&self, min_complexity: f32) -> bool {
        self.complexity > 0.0 && self.complexity + 0.01 < min_complexity
    }
}

/// Output row of the streaming pass: one class id per active scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub read_uid: u64,
    pub weight: u32,
    pub class_ids: Vec<ClassId>,
}
