// src/classify/assignment.rs

use std::sync::Arc;

use ahash::AHashMap;

use crate::config::AssignmentMethod;
use crate::scheme::ClassificationScheme;
use crate::types::{ClassId, ReadRecord};

use super::active_matches::ActiveSet;

/// One stateful assignment-algorithm instance, bound to a single scheme for
/// the lifetime of a run. Created by [`AssignmentAlgorithm::create`] before
/// the streaming pass; the variant never changes mid-run.
///
/// Scratch buffers are reused across reads, which is why `compute_id` takes
/// `&mut self`.
pub struct AssignmentAlgorithm {
    method: AssignmentMethod,
    scheme: Arc<ClassificationScheme>,
    order: Vec<usize>,
    coverage: AHashMap<ClassId, u64>,
}

impl AssignmentAlgorithm {
    /// Factory: instantiate the configured variant for one scheme.
    pub fn create(method: AssignmentMethod, scheme: Arc<ClassificationScheme>) -> Self {
        Self {
            method,
            scheme,
            order: Vec::new(),
            coverage: AHashMap::new(),
        }
    }

    pub fn method(&self) -> AssignmentMethod {
        self.method
    }

    /// Lowest common ancestor under this algorithm's scheme.
    pub fn lca(&self, a: ClassId, b: ClassId) -> ClassId {
        self.scheme.lca(a, b)
    }

    /// Turns an active-match set into a single class id; 0 when the set is
    /// empty or no consensus exists. Deterministic given identical active
    /// sets and hierarchy.
    pub fn compute_id(
        &mut self,
        active: &ActiveSet,
        read: &ReadRecord,
        ordinal: usize,
    ) -> ClassId {
        if active.is_empty() {
            return 0;
        }
        match self.method {
            AssignmentMethod::BestHit => self.best_hit(active, read, ordinal),
            AssignmentMethod::Lca => self.lca_over(active.iter().copied(), read, ordinal),
            AssignmentMethod::WeightedLca { percent } => {
                self.weighted_lca(active, read, ordinal, percent)
            }
            AssignmentMethod::LongReadLca => self.long_read_lca(active, read, ordinal),
        }
    }

    /// Target of the single highest-scoring active match; ties broken by
    /// first-encountered order.
    fn best_hit(&self, active: &ActiveSet, read: &ReadRecord, ordinal: usize) -> ClassId {
        let mut best_id = 0;
        let mut best_score = f32::MIN;
        for &i in active {
            let m = &read.matches[i];
            if m.bit_score > best_score {
                best_score = m.bit_score;
                best_id = m.class_id(ordinal);
            }
        }
        best_id
    }

    fn lca_over(
        &self,
        indices: impl Iterator<Item = usize>,
        read: &ReadRecord,
        ordinal: usize,
    ) -> ClassId {
        let mut id = 0;
        for i in indices {
            id = self.scheme.lca(id, read.matches[i].class_id(ordinal));
        }
        id
    }

    /// LCA over the heaviest matches that together cover `percent`% of the
    /// total bit-score weight of the active set; low-weight outliers never
    /// vote.
    fn weighted_lca(
        &mut self,
        active: &ActiveSet,
        read: &ReadRecord,
        ordinal: usize,
        percent: f32,
    ) -> ClassId {
        self.order.clear();
        self.order.extend_from_slice(active);
        // Stable sort keeps first-encountered order among equal weights.
        self.order
            .sort_by(|&a, &b| {
                read.matches[b]
                    .bit_score
                    .partial_cmp(&read.matches[a].bit_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        let total: f64 = self
            .order
            .iter()
            .map(|&i| read.matches[i].bit_score as f64)
            .sum();
        let threshold = total * (percent as f64 / 100.0);

        let mut id = 0;
        let mut cumulative = 0.0f64;
        for &i in &self.order {
            id = self.scheme.lca(id, read.matches[i].class_id(ordinal));
            cumulative += read.matches[i].bit_score as f64;
            if cumulative >= threshold {
                break;
            }
        }
        id
    }

    /// Interval-aware consensus for reads with many fragmented local
    /// alignments. The read is cut at every alignment boundary; each
    /// elementary interval contributes its length to the LCA of the matches
    /// covering it, and the id with the greatest covered length wins (ties:
    /// smaller id). Matches without coordinates span the whole aligned
    /// range, so a read with one uniform alignment degenerates to plain LCA.
    fn long_read_lca(
        &mut self,
        active: &ActiveSet,
        read: &ReadRecord,
        ordinal: usize,
    ) -> ClassId {
        let with_coords = active
            .iter()
            .any(|&i| read.matches[i].has_coordinates());
        if !with_coords {
            return self.lca_over(active.iter().copied(), read, ordinal);
        }

        let mut span_start = u32::MAX;
        let mut span_end = 0u32;
        for &i in active {
            let m = &read.matches[i];
            if m.has_coordinates() {
                span_start = span_start.min(m.read_start);
                span_end = span_end.max(m.read_end);
            }
        }

        let interval = |i: usize| {
            let m = &read.matches[i];
            if m.has_coordinates() {
                (m.read_start, m.read_end)
            } else {
                (span_start, span_end)
            }
        };

        let mut cuts: Vec<u32> = Vec::with_capacity(2 * active.len());
        for &i in active {
            let (s, e) = interval(i);
            cuts.push(s);
            cuts.push(e);
        }
        cuts.sort_unstable();
        cuts.dedup();

        self.coverage.clear();
        for pair in cuts.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let mut id = 0;
            for &i in active {
                let (s, e) = interval(i);
                if s <= lo && e >= hi {
                    id = self.scheme.lca(id, read.matches[i].class_id(ordinal));
                }
            }
            if id > 0 {
                *self.coverage.entry(id).or_insert(0) += (hi - lo) as u64;
            }
        }

        let mut best_id = 0;
        let mut best_covered = 0u64;
        for (&id, &covered) in &self.coverage {
            if covered > best_covered || (covered == best_covered && id < best_id) {
                best_covered = covered;
                best_id = id;
            }
        }
        best_id
    }
}
