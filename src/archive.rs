//src/archive.rs

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};
use flate2::read::MultiGzDecoder;
use parking_lot::Mutex;

use crate::errors::{AnalysisError, Result};
use crate::progress::ProgressListener;
use crate::types::{AssignmentRecord, ClassId, MatchRecord, ReadRecord};

/// File type code of a committed assignment table.
pub const ASSIGNMENT_FILE_TYPE: &[u8; 8] = b"MBASGN1\0";

/// Forward-only stream of reads; each item carries the archive's monotonic
/// progress position alongside the record.
pub type ReadIter<'a> = Box<dyn Iterator<Item = Result<(ReadRecord, u64)>> + 'a>;

/// Minimal contract the classification pass needs from the read store.
///
/// Iteration is finite, forward-only and not restartable mid-run. Random
/// access is optional; mate-pair mode requires it. Committing must be atomic
/// with respect to a concurrent reader of the table.
pub trait ReadArchive: Send + Sync {
    /// Upper bound for the progress counter, 0 when unknown.
    fn max_progress(&self) -> u64;

    /// Streams the reads with uid in `[min_uid, max_uid]`. With
    /// `want_matches = false` the records come back match-free, for
    /// consumers that only need weights and pairing.
    fn iterate_range(
        &self,
        min_uid: u64,
        max_uid: u64,
        want_matches: bool,
    ) -> Result<ReadIter<'_>>;

    /// Streams every read with its matches.
    fn iterate_reads(&self) -> Result<ReadIter<'_>> {
        self.iterate_range(0, u64::MAX, true)
    }

    fn supports_random_access(&self) -> bool {
        false
    }

    fn read_mate(&self, mate_uid: u64) -> Result<ReadRecord>;

    fn commit_assignments(
        &self,
        scheme_names: &[String],
        records: &[AssignmentRecord],
        progress: &dyn ProgressListener,
    ) -> Result<()>;

    /// Number of distinct class ids > 0 in the committed table, post-commit.
    fn classification_size(&self, scheme_name: &str) -> Result<u64>;

    /// Scheme names the archive's matches carry targets for, in ordinal order.
    fn scheme_names(&self) -> &[String];
}

// ---------------------------------------------------------------------------
//  FileArchive: tab-separated read/match records, optionally gzip
// ---------------------------------------------------------------------------

/// Text archive format:
/// ```text
/// #schemes\tTaxonomy\tEC
/// R\t<uid>\t<name>\t<weight>\t<complexity>\t<mate_uid>
/// M\t<bit_score>\t<pct_identity>\t<e_value>\t<read_start>\t<read_end>\t<id per scheme>...
/// ```
/// Each `R` line is followed by the read's `M` lines. Blank lines and `#`
/// comments are skipped. Files ending in `.gz` are decompressed on the fly;
/// gz input cannot serve mate random access.
pub struct FileArchive {
    path: PathBuf,
    gz: bool,
    scheme_names: Vec<String>,
    file_len: u64,
    /// Second read-only handle for mate lookups, opened on first use and
    /// released when the archive is dropped.
    mate_reader: Mutex<Option<MateReader>>,
    /// Distinct-id sizes per scheme, cached at commit.
    committed_sizes: Mutex<AHashMap<String, u64>>,
}

struct MateReader {
    /// uid -> byte offset of the read's `R` line.
    index: AHashMap<u64, u64>,
    reader: BufReader<File>,
}

impl FileArchive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let gz = path
            .extension()
            .map(|ext| ext == "gz")
            .unwrap_or(false);
        let file_len = fs::metadata(&path)?.len();

        let mut reader = open_text_reader(&path, gz)?;
        let mut line = String::new();
        let scheme_names = loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(invalid_data(format!(
                    "{}: missing #schemes header",
                    path.display()
                )));
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("#schemes\t") {
                break rest.split('\t').map(|s| s.to_string()).collect::<Vec<_>>();
            }
            return Err(invalid_data(format!(
                "{}: first line must be a #schemes header",
                path.display()
            )));
        };

        log::info!(
            "Opened archive {} ({} schemes: {})",
            path.display(),
            scheme_names.len(),
            scheme_names.join(", ")
        );

        Ok(Self {
            path,
            gz,
            scheme_names,
            file_len,
            mate_reader: Mutex::new(None),
            committed_sizes: Mutex::new(AHashMap::new()),
        })
    }

    /// Path of the committed assignment table, next to the input.
    pub fn assignments_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(".assignments");
        self.path.with_file_name(name)
    }

    fn open_mate_reader(&self) -> Result<MateReader> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut index = AHashMap::new();
        let mut offset = 0u64;
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                break;
            }
            if line.starts_with("R\t") {
                let fields: Vec<&str> = line.trim_end().split('\t').collect();
                if let Some(uid) = fields.get(1).and_then(|s| s.parse::<u64>().ok()) {
                    index.insert(uid, offset);
                }
            }
            offset += n as u64;
        }
        log::debug!("Mate index built: {} reads", index.len());
        Ok(MateReader { index, reader })
    }
}

impl ReadArchive for FileArchive {
    fn max_progress(&self) -> u64 {
        // Progress is counted in decompressed bytes, so the compressed file
        // length is not a usable bound.
        if self.gz {
            0
        } else {
            self.file_len
        }
    }

    fn iterate_range(
        &self,
        min_uid: u64,
        max_uid: u64,
        want_matches: bool,
    ) -> Result<ReadIter<'_>> {
        let mut reader = open_text_reader(&self.path, self.gz)?;
        // Skip everything up to and including the #schemes header; those
        // bytes still count toward progress.
        let mut header = String::new();
        let mut pos = 0u64;
        loop {
            header.clear();
            let n = reader.read_line(&mut header)?;
            if n == 0 {
                break;
            }
            pos += n as u64;
            if header.trim_end().starts_with("#schemes\t") {
                break;
            }
        }
        Ok(Box::new(FileReadIter {
            reader,
            n_schemes: self.scheme_names.len(),
            pos,
            carry: None,
            done: false,
            min_uid,
            max_uid,
            want_matches,
        }))
    }

    fn supports_random_access(&self) -> bool {
        !self.gz
    }

    fn read_mate(&self, mate_uid: u64) -> Result<ReadRecord> {
        if self.gz {
            return Err(AnalysisError::Config(format!(
                "{}: gz archives do not support random access",
                self.path.display()
            )));
        }
        let mut guard = self.mate_reader.lock();
        if guard.is_none() {
            *guard = Some(self.open_mate_reader()?);
        }
        let mate = guard.as_mut().unwrap();
        let offset = mate
            .index
            .get(&mate_uid)
            .copied()
            .ok_or_else(|| invalid_data(format!("mate uid {} not in archive", mate_uid)))?;
        mate.reader.seek(SeekFrom::Start(offset))?;

        let mut line = String::new();
        mate.reader.read_line(&mut line)?;
        let mut read = parse_read_line(line.trim_end())?;
        loop {
            line.clear();
            if mate.reader.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end();
            if trimmed.starts_with("M\t") {
                read.matches.push(parse_match_line(trimmed, self.scheme_names.len())?);
            } else if trimmed.starts_with("R\t") {
                break;
            }
        }
        Ok(read)
    }

    fn commit_assignments(
        &self,
        scheme_names: &[String],
        records: &[AssignmentRecord],
        progress: &dyn ProgressListener,
    ) -> Result<()> {
        progress.set_subtask("Writing classification tables");
        progress.set_maximum(records.len() as u64);

        let final_path = self.assignments_path();
        let tmp_path = {
            let mut name = final_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.push_str(".tmp");
            final_path.with_file_name(name)
        };

        let mut distinct: Vec<AHashSet<ClassId>> =
            vec![AHashSet::new(); scheme_names.len()];
        {
            let file = File::create(&tmp_path)?;
            let mut w = BufWriter::new(file);
            w.write_all(ASSIGNMENT_FILE_TYPE)?;
            w.write_all(&(scheme_names.len() as u32).to_le_bytes())?;
            for name in scheme_names {
                w.write_all(&(name.len() as u32).to_le_bytes())?;
                w.write_all(name.as_bytes())?;
            }
            w.write_all(&(records.len() as u64).to_le_bytes())?;
            for (row, rec) in records.iter().enumerate() {
                w.write_all(&rec.read_uid.to_le_bytes())?;
                w.write_all(&rec.weight.to_le_bytes())?;
                for (i, &id) in rec.class_ids.iter().enumerate() {
                    w.write_all(&id.to_le_bytes())?;
                    if id > 0 {
                        distinct[i].insert(id);
                    }
                }
                if row % 65_536 == 0 {
                    progress.set_progress(row as u64);
                }
            }
            w.flush()?;
        }
        // Swap in atomically so a concurrent reader never sees a half table.
        fs::rename(&tmp_path, &final_path)?;
        progress.set_progress(records.len() as u64);

        let mut sizes = self.committed_sizes.lock();
        for (name, ids) in scheme_names.iter().zip(&distinct) {
            sizes.insert(name.clone(), ids.len() as u64);
        }
        log::info!(
            "Committed {} assignment rows to {}",
            records.len(),
            final_path.display()
        );
        Ok(())
    }

    fn classification_size(&self, scheme_name: &str) -> Result<u64> {
        if let Some(&n) = self.committed_sizes.lock().get(scheme_name) {
            return Ok(n);
        }
        let (names, records) = read_assignment_table(&self.assignments_path())?;
        let ordinal = names
            .iter()
            .position(|n| n == scheme_name)
            .ok_or_else(|| invalid_data(format!("scheme {} not in table", scheme_name)))?;
        let distinct: AHashSet<ClassId> = records
            .iter()
            .map(|r| r.class_ids[ordinal])
            .filter(|&id| id > 0)
            .collect();
        Ok(distinct.len() as u64)
    }

    fn scheme_names(&self) -> &[String] {
        &self.scheme_names
    }
}

struct FileReadIter<R: BufRead> {
    reader: R,
    n_schemes: usize,
    pos: u64,
    /// An `R` line that belongs to the next read, seen while collecting the
    /// previous read's matches.
    carry: Option<String>,
    done: bool,
    min_uid: u64,
    max_uid: u64,
    want_matches: bool,
}

impl<R: BufRead> FileReadIter<R> {
    fn next_line(&mut self) -> std::io::Result<Option<String>> {
        if let Some(line) = self.carry.take() {
            return Ok(Some(line));
        }
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line)?;
            if n == 0 {
                return Ok(None);
            }
            self.pos += n as u64;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }
}

impl<R: BufRead> Iterator for FileReadIter<R> {
    type Item = Result<(ReadRecord, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if !line.starts_with("R\t") {
                // Stray match line without a read; skip.
                continue;
            }
            let mut read = match parse_read_line(&line) {
                Ok(read) => read,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let in_range = read.uid >= self.min_uid && read.uid <= self.max_uid;
            loop {
                match self.next_line() {
                    Ok(Some(next)) if next.starts_with("M\t") => {
                        if !(self.want_matches && in_range) {
                            continue;
                        }
                        match parse_match_line(&next, self.n_schemes) {
                            Ok(m) => read.matches.push(m),
                            Err(e) => {
                                self.done = true;
                                return Some(Err(e));
                            }
                        }
                    }
                    Ok(Some(next)) => {
                        self.carry = Some(next);
                        break;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e.into()));
                    }
                }
            }
            if !in_range {
                continue;
            }
            return Some(Ok((read, self.pos)));
        }
    }
}

fn open_text_reader(path: &Path, gz: bool) -> Result<Box<dyn BufRead + Send>> {
    let f = File::open(path)?;
    Ok(if gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    })
}

fn parse_read_line(line: &str) -> Result<ReadRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let uid: u64 = fields
        .get(1)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid_data(format!("bad read line: {}", line)))?;
    let name = fields.get(2).unwrap_or(&"").to_string();
    // Weight 0 means "multiplicity unknown"; treat as a single read.
    let weight: u32 = fields
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
        .max(1);
    let complexity: f32 = fields.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.0);
    let mate_uid: u64 = fields.get(5).and_then(|s| s.parse().ok()).unwrap_or(0);
    Ok(ReadRecord {
        uid,
        name,
        weight,
        complexity,
        mate_uid,
        matches: Vec::new(),
    })
}

fn parse_match_line(line: &str, n_schemes: usize) -> Result<MatchRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 6 + n_schemes {
        return Err(invalid_data(format!("bad match line: {}", line)));
    }
    let bit_score: f32 = fields[1].parse().unwrap_or(0.0);
    let percent_identity: f32 = fields[2].parse().unwrap_or(0.0);
    let expected: f64 = fields[3].parse().unwrap_or(f64::MAX);
    let read_start: u32 = fields[4].parse().unwrap_or(0);
    let read_end: u32 = fields[5].parse().unwrap_or(0);
    let class_ids: Vec<ClassId> = fields[6..6 + n_schemes]
        .iter()
        .map(|s| s.parse().unwrap_or(0))
        .collect();
    Ok(MatchRecord {
        bit_score,
        percent_identity,
        expected,
        read_start,
        read_end,
        class_ids,
    })
}

/// Loads a committed assignment table back into memory.
pub fn read_assignment_table<P: AsRef<Path>>(
    path: P,
) -> Result<(Vec<String>, Vec<AssignmentRecord>)> {
    let mut f = BufReader::new(File::open(path.as_ref())?);

    let mut magic = [0u8; 8];
    f.read_exact(&mut magic)?;
    if &magic != ASSIGNMENT_FILE_TYPE {
        return Err(invalid_data(format!(
            "{}: not an assignment table",
            path.as_ref().display()
        )));
    }

    let n_schemes = read_u32_le(&mut f)? as usize;
    let mut names = Vec::with_capacity(n_schemes);
    for _ in 0..n_schemes {
        let len = read_u32_le(&mut f)? as usize;
        let mut buf = vec![0u8; len];
        f.read_exact(&mut buf)?;
        names.push(String::from_utf8(buf).map_err(|_| {
            invalid_data("scheme name not valid UTF-8".to_string())
        })?);
    }

    let n_rows = read_u64_le(&mut f)? as usize;
    let mut records = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let read_uid = read_u64_le(&mut f)?;
        let weight = read_u32_le(&mut f)?;
        let mut class_ids = Vec::with_capacity(n_schemes);
        for _ in 0..n_schemes {
            class_ids.push(read_i32_le(&mut f)?);
        }
        records.push(AssignmentRecord {
            read_uid,
            weight,
            class_ids,
        });
    }
    Ok((names, records))
}

fn read_u32_le<R: Read>(r: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32_le<R: Read>(r: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u64_le<R: Read>(r: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn invalid_data(message: String) -> AnalysisError {
    AnalysisError::Archive(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    ))
}

// ---------------------------------------------------------------------------
//  MemoryArchive: in-memory store for embedders and tests
// ---------------------------------------------------------------------------

/// Archive over a `Vec<ReadRecord>`. Random access is always available and
/// commits are captured in memory for inspection.
pub struct MemoryArchive {
    scheme_names: Vec<String>,
    reads: Vec<ReadRecord>,
    by_uid: AHashMap<u64, usize>,
    committed: Mutex<Option<(Vec<String>, Vec<AssignmentRecord>)>>,
}

impl MemoryArchive {
    pub fn new(scheme_names: Vec<String>, reads: Vec<ReadRecord>) -> Self {
        let by_uid = reads
            .iter()
            .enumerate()
            .map(|(i, r)| (r.uid, i))
            .collect();
        Self {
            scheme_names,
            reads,
            by_uid,
            committed: Mutex::new(None),
        }
    }

    /// The table captured by the last commit, if any.
    pub fn committed(&self) -> Option<(Vec<String>, Vec<AssignmentRecord>)> {
        self.committed.lock().clone()
    }
}

impl ReadArchive for MemoryArchive {
    fn max_progress(&self) -> u64 {
        self.reads.len() as u64
    }

    fn iterate_range(
        &self,
        min_uid: u64,
        max_uid: u64,
        want_matches: bool,
    ) -> Result<ReadIter<'_>> {
        Ok(Box::new(
            self.reads
                .iter()
                .enumerate()
                .filter(move |(_, r)| r.uid >= min_uid && r.uid <= max_uid)
                .map(move |(i, r)| {
                    let mut read = r.clone();
                    if !want_matches {
                        read.matches.clear();
                    }
                    Ok((read, i as u64 + 1))
                }),
        ))
    }

    fn supports_random_access(&self) -> bool {
        true
    }

    fn read_mate(&self, mate_uid: u64) -> Result<ReadRecord> {
        self.by_uid
            .get(&mate_uid)
            .map(|&i| self.reads[i].clone())
            .ok_or_else(|| invalid_data(format!("mate uid {} not in archive", mate_uid)))
    }

    fn commit_assignments(
        &self,
        scheme_names: &[String],
        records: &[AssignmentRecord],
        _progress: &dyn ProgressListener,
    ) -> Result<()> {
        *self.committed.lock() = Some((scheme_names.to_vec(), records.to_vec()));
        Ok(())
    }

    fn classification_size(&self, scheme_name: &str) -> Result<u64> {
        let guard = self.committed.lock();
        let (names, records) = guard
            .as_ref()
            .ok_or_else(|| invalid_data("nothing committed".to_string()))?;
        let ordinal = names
            .iter()
            .position(|n| n == scheme_name)
            .ok_or_else(|| invalid_data(format!("scheme {} not in table", scheme_name)))?;
        let distinct: AHashSet<ClassId> = records
            .iter()
            .map(|r| r.class_ids[ordinal])
            .filter(|&id| id > 0)
            .collect();
        Ok(distinct.len() as u64)
    }

    fn scheme_names(&self) -> &[String] {
        &self.scheme_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use std::io::Write as IoWrite;

    const SAMPLE: &str = "\
#schemes\tTaxonomy\tEC
R\t1\tr1\t1\t0\t0
M\t100\t98.5\t1e-20\t0\t0\t7\t3
M\t90\t97.0\t1e-18\t0\t0\t8\t0
R\t2\tr2\t2\t0\t0
";

    fn write_sample(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("reads.tsv");
        let mut f = File::create(&path).unwrap();
        f.write_all(SAMPLE.as_bytes()).unwrap();
        path
    }

    #[test]
    fn iterates_reads_and_matches() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::open(write_sample(&dir)).unwrap();
        assert_eq!(archive.scheme_names(), &["Taxonomy", "EC"]);

        let reads: Vec<_> = archive
            .iterate_reads()
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].uid, 1);
        assert_eq!(reads[0].matches.len(), 2);
        assert_eq!(reads[0].matches[0].class_id(0), 7);
        assert_eq!(reads[0].matches[0].class_id(1), 3);
        assert_eq!(reads[1].weight, 2);
        assert!(reads[1].matches.is_empty());
    }

    #[test]
    fn progress_positions_are_monotonic_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::open(write_sample(&dir)).unwrap();
        let max = archive.max_progress();
        let mut last = 0;
        for item in archive.iterate_reads().unwrap() {
            let (_, pos) = item.unwrap();
            assert!(pos >= last);
            assert!(pos <= max);
            last = pos;
        }
        assert_eq!(last, max);
    }

    #[test]
    fn range_iteration_filters_and_strips_matches() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::open(write_sample(&dir)).unwrap();

        let reads: Vec<_> = archive
            .iterate_range(2, u64::MAX, true)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].uid, 2);

        let stripped: Vec<_> = archive
            .iterate_range(0, u64::MAX, false)
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(stripped.len(), 2);
        assert!(stripped.iter().all(|r| r.matches.is_empty()));
    }

    #[test]
    fn mate_lookup_by_uid() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::open(write_sample(&dir)).unwrap();
        assert!(archive.supports_random_access());
        let mate = archive.read_mate(2).unwrap();
        assert_eq!(mate.uid, 2);
        let first = archive.read_mate(1).unwrap();
        assert_eq!(first.matches.len(), 2);
    }

    #[test]
    fn commit_is_durable_and_reloadable() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileArchive::open(write_sample(&dir)).unwrap();
        let names = vec!["Taxonomy".to_string(), "EC".to_string()];
        let records = vec![
            AssignmentRecord {
                read_uid: 1,
                weight: 1,
                class_ids: vec![7, 3],
            },
            AssignmentRecord {
                read_uid: 2,
                weight: 2,
                class_ids: vec![7, -1],
            },
        ];
        archive
            .commit_assignments(&names, &records, &NoProgress)
            .unwrap();

        let (loaded_names, loaded) =
            read_assignment_table(archive.assignments_path()).unwrap();
        assert_eq!(loaded_names, names);
        assert_eq!(loaded, records);
        assert_eq!(archive.classification_size("Taxonomy").unwrap(), 1);
        assert_eq!(archive.classification_size("EC").unwrap(), 1);

        // A fresh handle answers from the committed file, not the cache.
        let reopened = FileArchive::open(archive.path.clone()).unwrap();
        assert_eq!(reopened.classification_size("Taxonomy").unwrap(), 1);
    }

    #[test]
    fn memory_archive_round_trip() {
        let archive = MemoryArchive::new(
            vec!["Taxonomy".to_string()],
            vec![ReadRecord {
                uid: 9,
                name: "r9".to_string(),
                weight: 1,
                complexity: 0.0,
                mate_uid: 0,
                matches: Vec::new(),
            }],
        );
        assert_eq!(archive.read_mate(9).unwrap().name, "r9");
        assert!(archive.committed().is_none());
    }
}
