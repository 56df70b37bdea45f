// src/classify/active_matches.rs

use crate::types::ReadRecord;

/// Indices of the matches of one read accepted for voting under one scheme's
/// current thresholds. Recomputed per read per scheme, never persisted.
pub type ActiveSet = Vec<usize>;

/// Selects the matches eligible to vote on a read's assignment.
///
/// A match is active iff it passes the three absolute thresholds (bit score,
/// expected value, percent identity) and its bit score lies within
/// `top_percent` of the best bit score among matches that pass those
/// thresholds. `top_percent = 100` disables the relative clause; long-read
/// mode relies on this and lets the assignment algorithm weigh matches
/// itself.
///
/// Pure function of its inputs; returns an empty set when nothing qualifies.
pub fn compute(
    read: &ReadRecord,
    ordinal: usize,
    min_score: f32,
    top_percent: f32,
    max_expected: f64,
    min_percent_identity: f32,
    active: &mut ActiveSet,
) {
    active.clear();

    let passes = |i: usize| {
        let m = &read.matches[i];
        m.class_id(ordinal) > 0
            && m.bit_score >= min_score
            && m.expected <= max_expected
            && m.percent_identity >= min_percent_identity
    };

    let mut best_score = 0.0f32;
    for i in 0..read.matches.len() {
        if passes(i) {
            best_score = best_score.max(read.matches[i].bit_score);
        }
    }
    if best_score == 0.0 {
        return;
    }

    let cutoff = if top_percent >= 100.0 {
        0.0
    } else {
        (1.0 - top_percent / 100.0) * best_score
    };

    for i in 0..read.matches.len() {
        if passes(i) && read.matches[i].bit_score >= cutoff {
            active.push(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchRecord, ReadRecord};

    fn read_with_scores(scores: &[f32]) -> ReadRecord {
        ReadRecord {
            uid: 1,
            name: "r".to_string(),
            weight: 1,
            complexity: 0.0,
            mate_uid: 0,
            matches: scores
                .iter()
                .map(|&s| MatchRecord {
                    bit_score: s,
                    percent_identity: 99.0,
                    expected: 1e-10,
                    read_start: 0,
                    read_end: 0,
                    class_ids: vec![7],
                })
                .collect(),
        }
    }

    fn active(read: &ReadRecord, min_score: f32, top_percent: f32) -> Vec<usize> {
        let mut set = ActiveSet::new();
        compute(read, 0, min_score, top_percent, 0.01, 0.0, &mut set);
        set
    }

    #[test]
    fn empty_for_read_without_matches() {
        let read = read_with_scores(&[]);
        assert!(active(&read, 0.0, 10.0).is_empty());
    }

    #[test]
    fn top_percent_keeps_matches_near_best() {
        let read = read_with_scores(&[100.0, 95.0, 80.0]);
        // within 10% of 100 => cutoff 90
        assert_eq!(active(&read, 0.0, 10.0), vec![0, 1]);
    }

    #[test]
    fn top_percent_100_is_a_no_op() {
        let read = read_with_scores(&[100.0, 95.0, 80.0, 10.0]);
        assert_eq!(active(&read, 0.0, 100.0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn increasing_top_percent_never_shrinks_the_set() {
        let read = read_with_scores(&[100.0, 92.0, 85.0, 60.0]);
        let mut previous = 0;
        for tp in [0.0, 5.0, 10.0, 20.0, 50.0, 100.0] {
            let n = active(&read, 0.0, tp).len();
            assert!(n >= previous, "top_percent {} shrank the set", tp);
            previous = n;
        }
    }

    #[test]
    fn increasing_min_score_never_grows_the_set() {
        let read = read_with_scores(&[100.0, 92.0, 85.0, 60.0]);
        let mut previous = usize::MAX;
        for ms in [0.0, 50.0, 70.0, 90.0, 120.0] {
            let n = active(&read, ms, 100.0).len();
            assert!(n <= previous, "min_score {} grew the set", ms);
            previous = n;
        }
    }

    #[test]
    fn threshold_failures_do_not_anchor_top_percent() {
        // The 200-score match fails the e-value threshold, so the 100-score
        // match anchors the relative cutoff.
        let mut read = read_with_scores(&[200.0, 100.0, 95.0]);
        read.matches[0].expected = 10.0;
        assert_eq!(active(&read, 0.0, 10.0), vec![1, 2]);
    }

    #[test]
    fn matches_without_a_target_are_ignored() {
        let mut read = read_with_scores(&[100.0, 90.0]);
        read.matches[0].class_ids = vec![0];
        assert_eq!(active(&read, 0.0, 100.0), vec![1]);
    }
}
