// src/classify/min_support.rs

use ahash::{AHashMap, AHashSet};

use crate::scheme::ClassificationScheme;
use crate::types::ClassId;

/// Read-weight sums per class id for one scheme. Ids that never received
/// weight have no entry.
pub type ClassCounts = AHashMap<ClassId, u64>;

/// Statistically prunes under-supported assignments for one scheme.
///
/// Every id present in the counts at entry is judged in order of decreasing
/// hierarchy depth, so weight folded up from deeper ids has arrived before a
/// shallower id is judged. An id whose weight is below `min_support`, or
/// that is administratively disabled, hands its whole weight to its parent;
/// the root never folds. The returned remap is complete and path-compressed:
/// rewriting a record is a single lookup.
///
/// Total weight is conserved; the counts map is updated in place.
pub struct MinSupportFilter<'a> {
    scheme: &'a ClassificationScheme,
    min_support: u64,
    disabled_ids: &'a AHashSet<ClassId>,
}

impl<'a> MinSupportFilter<'a> {
    pub fn new(
        scheme: &'a ClassificationScheme,
        min_support: u64,
        disabled_ids: &'a AHashSet<ClassId>,
    ) -> Self {
        Self {
            scheme,
            min_support,
            disabled_ids,
        }
    }

    pub fn apply(&self, counts: &mut ClassCounts) -> AHashMap<ClassId, ClassId> {
        let mut candidates: Vec<ClassId> = counts
            .keys()
            .copied()
            .filter(|&id| id > 0 && self.scheme.is_known(id))
            .collect();
        candidates.sort_unstable_by_key(|&id| std::cmp::Reverse(self.scheme.depth(id)));

        let mut changes: AHashMap<ClassId, ClassId> = AHashMap::new();
        for id in candidates {
            if id == self.scheme.root {
                continue;
            }
            let weight = counts.get(&id).copied().unwrap_or(0);
            if weight == 0 {
                continue;
            }
            if weight >= self.min_support && !self.disabled_ids.contains(&id) {
                continue;
            }
            let parent = match self.scheme.parent(id) {
                Some(p) if p > 0 && p != id => p,
                _ => self.scheme.root,
            };
            *counts.entry(parent).or_insert(0) += weight;
            counts.insert(id, 0);
            changes.insert(id, parent);
        }

        // Compress chains so each old id maps straight to its final target.
        let compressed: AHashMap<ClassId, ClassId> = changes
            .keys()
            .map(|&old| {
                let mut target = changes[&old];
                while let Some(&next) = changes.get(&target) {
                    target = next;
                }
                (old, target)
            })
            .collect();
        compressed
    }
}
