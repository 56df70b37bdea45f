// src/report.rs

use std::fmt::Write as _;

use ahash::AHashMap;

use crate::classify::min_support::ClassCounts;
use crate::scheme::ClassificationScheme;
use crate::types::ClassId;

/// A structured representation of one row in a scheme summary report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub pct: f32,
    /// Weight in this node plus its descendants.
    pub clade_weight: u64,
    /// Weight directly assigned to this node.
    pub direct_weight: u64,
    pub class_id: ClassId,
    pub rank: String,
    pub name: String,
    pub depth: usize,
}

/// Builds an indented text summary of one scheme's final class counts:
/// percent of total weight, clade weight, direct weight, id, rank, name.
/// Children are sorted by clade weight descending; weightless clades are
/// skipped.
pub fn build_report(
    scheme: &ClassificationScheme,
    counts: &ClassCounts,
) -> (Vec<ReportRow>, String) {
    let children_map = scheme.children_map();

    let mut clade_weights: AHashMap<ClassId, u64> = AHashMap::new();
    accumulate_clade_weight(scheme.root, &children_map, counts, &mut clade_weights);

    let total: u64 = counts
        .iter()
        .filter(|(&id, _)| id > 0)
        .map(|(_, &w)| w)
        .sum();

    let mut rows = Vec::new();
    let mut text = String::new();
    text.push_str("%\tclade\tdirect\tid\trank\tname\n");
    dfs(
        scheme.root,
        0,
        scheme,
        &children_map,
        counts,
        &clade_weights,
        total,
        &mut rows,
        &mut text,
    );
    (rows, text)
}

fn accumulate_clade_weight(
    id: ClassId,
    children_map: &AHashMap<ClassId, Vec<ClassId>>,
    counts: &ClassCounts,
    clade_weights: &mut AHashMap<ClassId, u64>,
) -> u64 {
    let mut total = counts.get(&id).copied().unwrap_or(0);
    if let Some(kids) = children_map.get(&id) {
        for &child in kids {
            total += accumulate_clade_weight(child, children_map, counts, clade_weights);
        }
    }
    clade_weights.insert(id, total);
    total
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    id: ClassId,
    depth: usize,
    scheme: &ClassificationScheme,
    children_map: &AHashMap<ClassId, Vec<ClassId>>,
    counts: &ClassCounts,
    clade_weights: &AHashMap<ClassId, u64>,
    total: u64,
    rows: &mut Vec<ReportRow>,
    text: &mut String,
) {
    let clade_weight = clade_weights.get(&id).copied().unwrap_or(0);
    let direct_weight = counts.get(&id).copied().unwrap_or(0);
    if clade_weight == 0 {
        return;
    }

    let pct = if total > 0 {
        100.0 * clade_weight as f32 / total as f32
    } else {
        0.0
    };
    let rank = scheme.rank_map.get(&id).cloned().unwrap_or_default();
    let name = scheme
        .name_map
        .get(&id)
        .cloned()
        .unwrap_or_else(|| "?".to_string());

    let mut indented = String::new();
    for _ in 0..depth {
        indented.push('\t');
    }
    indented.push_str(&name);

    let _ = writeln!(
        text,
        "{:.4}\t{}\t{}\t{}\t{}\t{}",
        pct, clade_weight, direct_weight, id, rank, indented
    );
    rows.push(ReportRow {
        pct,
        clade_weight,
        direct_weight,
        class_id: id,
        rank,
        name,
        depth,
    });

    let mut kids = children_map.get(&id).cloned().unwrap_or_default();
    kids.sort_by_key(|child| {
        std::cmp::Reverse(clade_weights.get(child).copied().unwrap_or(0))
    });
    for child in kids {
        dfs(
            child,
            depth + 1,
            scheme,
            children_map,
            counts,
            clade_weights,
            total,
            rows,
            text,
        );
    }
}
