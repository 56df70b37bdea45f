// src/classify/mate_pairs.rs

use crate::types::ClassId;

use super::assignment::AssignmentAlgorithm;

/// Outcome of combining a read's taxon with its mate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MateResolution {
    pub id: ClassId,
    /// The read itself was unassigned and took the mate's taxon.
    pub assigned_via_mate: bool,
}

/// Combines the independently computed taxa of two mated reads into one
/// consensus taxon:
///
/// - mate unassigned: the read's own id stands;
/// - read unassigned, mate assigned: the mate's id is adopted;
/// - mate below the read in the hierarchy: the mate's more specific id wins;
/// - read below the mate: no change;
/// - disjoint lineages: generalize to the common ancestor.
pub fn resolve(
    algorithm: &AssignmentAlgorithm,
    read_id: ClassId,
    mate_id: ClassId,
) -> MateResolution {
    if mate_id <= 0 {
        return MateResolution {
            id: read_id,
            assigned_via_mate: false,
        };
    }
    if read_id <= 0 {
        return MateResolution {
            id: mate_id,
            assigned_via_mate: true,
        };
    }
    let both = algorithm.lca(read_id, mate_id);
    let id = if both == read_id {
        // The read's taxon is an ancestor of the mate's: take the more
        // specific mate taxon.
        mate_id
    } else if both != mate_id {
        both
    } else {
        read_id
    };
    MateResolution {
        id,
        assigned_via_mate: false,
    }
}
