use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metabin_rs::archive::read_assignment_table;
use metabin_rs::classify::driver::RunStatus;
use metabin_rs::progress::{NoProgress, ProgressListener};
use metabin_rs::scheme::ParentMap;
use metabin_rs::{
    analyze, AnalysisConfig, AnalysisError, AssignmentMethod, CancelToken,
    ClassificationScheme, FileArchive, ReadArchive, SchemeConfig, UNASSIGNED_ID,
};

/// Taxonomy: root(1) -> A(2) -> A1(3) / A2(4); root(1) -> B(5).
fn taxonomy() -> Arc<ClassificationScheme> {
    let mut parent_map = ParentMap::new();
    parent_map.insert(1, 1);
    parent_map.insert(2, 1);
    parent_map.insert(3, 2);
    parent_map.insert(4, 2);
    parent_map.insert(5, 1);
    let mut s = ClassificationScheme::new("Taxonomy", parent_map);
    s.name_map.insert(1, "root".to_string());
    s.name_map.insert(2, "A".to_string());
    s.name_map.insert(3, "A1".to_string());
    Arc::new(s)
}

/// EC: root(1) -> 10/11.
fn ec() -> Arc<ClassificationScheme> {
    let mut parent_map = ParentMap::new();
    parent_map.insert(1, 1);
    parent_map.insert(10, 1);
    parent_map.insert(11, 1);
    Arc::new(ClassificationScheme::new("EC", parent_map))
}

fn config(schemes: Vec<SchemeConfig>) -> AnalysisConfig {
    AnalysisConfig {
        min_score: 0.0,
        top_percent: 10.0,
        max_expected: 10.0,
        min_percent_identity: 0.0,
        schemes,
        ..AnalysisConfig::default()
    }
}

fn lca_scheme(name: &str) -> SchemeConfig {
    SchemeConfig {
        name: name.to_string(),
        method: AssignmentMethod::Lca,
        disabled_ids: Vec::new(),
    }
}

fn write_archive(dir: &tempfile::TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(text.as_bytes()).unwrap();
    path
}

const TWO_SCHEME_ARCHIVE: &str = "\
#schemes\tTaxonomy\tEC
R\t1\tr1\t1\t0\t0
M\t100\t98.0\t1e-20\t0\t0\t3\t10
M\t95\t97.0\t1e-18\t0\t0\t4\t10
R\t2\tr2\t2\t0\t0
M\t80\t95.0\t1e-10\t0\t0\t5\t0
R\t3\tr3\t1\t0\t0
";

#[test]
fn end_to_end_two_schemes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(&dir, "reads.tsv", TWO_SCHEME_ARCHIVE);
    let archive = FileArchive::open(&path).unwrap();

    let cfg = config(vec![lca_scheme("Taxonomy"), lca_scheme("EC")]);
    let results = analyze(
        &cfg,
        vec![taxonomy(), ec()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(results.status, RunStatus::Completed);
    assert_eq!(results.summary.total_reads, 4);
    assert_eq!(results.summary.total_matches, 3);
    assert_eq!(results.summary.reads_with_hits, 3);

    // r1: siblings 3 and 4 collapse to 2 under Taxonomy, agree on 10 under EC.
    assert_eq!(results.records[0].class_ids, vec![2, 10]);
    // r2: single hit on 5; no EC target.
    assert_eq!(results.records[1].class_ids, vec![5, UNASSIGNED_ID]);
    // r3: no matches at all.
    assert_eq!(results.records[2].class_ids, vec![UNASSIGNED_ID, UNASSIGNED_ID]);

    // Committed table round-trips and sizes match.
    let (names, rows) = read_assignment_table(archive.assignments_path()).unwrap();
    assert_eq!(names, vec!["Taxonomy".to_string(), "EC".to_string()]);
    assert_eq!(rows.len(), 3);
    assert_eq!(results.summary.per_scheme[0].classification_size, 2);
    assert_eq!(results.summary.per_scheme[1].classification_size, 1);
}

#[test]
fn min_support_rewrites_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let text = "\
#schemes\tTaxonomy
R\t1\tr1\t1\t0\t0
M\t100\t98.0\t1e-20\t0\t0\t3
R\t2\tr2\t1\t0\t0
M\t100\t98.0\t1e-20\t0\t0\t3
R\t3\tr3\t1\t0\t0
M\t100\t98.0\t1e-20\t0\t0\t3
";
    let path = write_archive(&dir, "reads.tsv", text);
    let archive = FileArchive::open(&path).unwrap();

    let mut cfg = config(vec![lca_scheme("Taxonomy")]);
    cfg.min_support = 5;
    let results = analyze(
        &cfg,
        vec![taxonomy()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap();

    // All three reads moved from A1 up to A, in memory and on disk.
    assert_eq!(results.counts[0].get(&3), Some(&0));
    assert_eq!(results.counts[0].get(&2), Some(&3));
    assert_eq!(results.summary.per_scheme[0].min_support_changes, 1);
    let (_, rows) = read_assignment_table(archive.assignments_path()).unwrap();
    assert!(rows.iter().all(|r| r.class_ids == vec![2]));
}

#[test]
fn mate_pairs_resolve_through_random_access() {
    let dir = tempfile::tempdir().unwrap();
    let text = "\
#schemes\tTaxonomy
R\t1\tr1\t1\t0\t2
R\t2\tr2\t1\t0\t1
M\t100\t98.0\t1e-20\t0\t0\t3
";
    let path = write_archive(&dir, "reads.tsv", text);
    let archive = FileArchive::open(&path).unwrap();

    let mut cfg = config(vec![lca_scheme("Taxonomy")]);
    cfg.use_mate_pairs = true;
    let results = analyze(
        &cfg,
        vec![taxonomy()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap();

    // r1 has no matches of its own and adopts the mate's taxon.
    assert_eq!(results.records[0].class_ids, vec![3]);
    assert_eq!(results.records[1].class_ids, vec![3]);
    assert_eq!(results.summary.assigned_via_mate, 1);
}

#[test]
fn gz_archive_rejects_mate_pair_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reads.tsv.gz");
    {
        let f = File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(f, flate2::Compression::default());
        gz.write_all(TWO_SCHEME_ARCHIVE.as_bytes()).unwrap();
        gz.finish().unwrap();
    }
    let archive = FileArchive::open(&path).unwrap();
    assert!(!archive.supports_random_access());

    let mut cfg = config(vec![lca_scheme("Taxonomy"), lca_scheme("EC")]);
    cfg.use_mate_pairs = true;
    let err = analyze(
        &cfg,
        vec![taxonomy(), ec()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AnalysisError::Config(_)));

    // Streaming a gz archive without mate pairs still works.
    cfg.use_mate_pairs = false;
    let results = analyze(
        &cfg,
        vec![taxonomy(), ec()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(results.summary.total_reads, 4);
}

/// Fires the cancel token from inside the progress callback after the first
/// read has been fully processed.
struct CancelAfterFirstRead {
    cancel: CancelToken,
    seen: AtomicU64,
}

impl ProgressListener for CancelAfterFirstRead {
    fn set_progress(&self, _progress: u64) {
        if self.seen.fetch_add(1, Ordering::SeqCst) == 0 {
            self.cancel.cancel();
        }
    }
}

#[test]
fn cancellation_mid_stream_commits_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_archive(&dir, "reads.tsv", TWO_SCHEME_ARCHIVE);
    let archive = FileArchive::open(&path).unwrap();

    let cancel = CancelToken::new();
    let progress = CancelAfterFirstRead {
        cancel: cancel.clone(),
        seen: AtomicU64::new(0),
    };
    let cfg = config(vec![lca_scheme("Taxonomy"), lca_scheme("EC")]);
    let results = analyze(
        &cfg,
        vec![taxonomy(), ec()],
        &archive,
        &progress,
        &cancel,
    )
    .unwrap();

    assert_eq!(results.status, RunStatus::Cancelled);
    // Only r1 (weight 1) was processed before the token was observed.
    assert_eq!(results.summary.total_reads, 1);
    assert_eq!(results.records.len(), 1);
    assert!(!archive.assignments_path().exists());
}

#[test]
fn low_complexity_reads_are_binned_for_every_scheme() {
    let dir = tempfile::tempdir().unwrap();
    let text = "\
#schemes\tTaxonomy\tEC
R\t1\tr1\t1\t0.2\t0
M\t100\t98.0\t1e-20\t0\t0\t3\t10
";
    let path = write_archive(&dir, "reads.tsv", text);
    let archive = FileArchive::open(&path).unwrap();

    let mut cfg = config(vec![lca_scheme("Taxonomy"), lca_scheme("EC")]);
    cfg.min_complexity = 0.5;
    let results = analyze(
        &cfg,
        vec![taxonomy(), ec()],
        &archive,
        &NoProgress,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(results.summary.low_complexity_reads, 1);
    assert_eq!(
        results.records[0].class_ids,
        vec![
            metabin_rs::LOW_COMPLEXITY_ID,
            metabin_rs::LOW_COMPLEXITY_ID
        ]
    );
}
