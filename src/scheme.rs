//src/scheme.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::errors::{AnalysisError, Result};
use crate::types::ClassId;

pub type ParentMap = AHashMap<ClassId, ClassId>;
pub type NameMap = AHashMap<ClassId, String>;
pub type RankMap = AHashMap<ClassId, String>;

/// A named hierarchical classification system (e.g. "Taxonomy", "EC").
///
/// Owns the id -> parent relation used by the LCA-family algorithms and by
/// min-support pruning, plus the set of known valid ids: ids produced by an
/// assignment algorithm that are not in this set get coerced to the
/// unassigned sentinel by the driver.
#[derive(Debug, Clone)]
pub struct ClassificationScheme {
    pub name: String,
    pub parent_map: ParentMap,
    pub name_map: NameMap,
    pub rank_map: RankMap,
    pub root: ClassId,
}

impl ClassificationScheme {
    pub fn new(name: &str, parent_map: ParentMap) -> Self {
        let root = find_root(&parent_map);
        Self {
            name: name.to_string(),
            parent_map,
            name_map: NameMap::new(),
            rank_map: RankMap::new(),
            root,
        }
    }

    /// Parses a hierarchy file in the format:
    /// ```text
    /// <id>\t<parent_id>\t<name>\t<rank>
    /// ```
    /// Malformed lines and id 0 are skipped, like the taxDB readers this
    /// format descends from.
    pub fn from_path<P: AsRef<Path>>(name: &str, filepath: P) -> Result<Self> {
        let file = File::open(&filepath)?;
        let reader = BufReader::new(file);

        let mut parent_map = ParentMap::new();
        let mut name_map = NameMap::new();
        let mut rank_map = RankMap::new();

        for line_result in reader.lines() {
            let line = line_result?;
            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() < 2 {
                continue;
            }

            let id: ClassId = parts[0].trim().parse().unwrap_or(0);
            let parent: ClassId = parts[1].trim().parse().unwrap_or(0);
            if id <= 0 {
                continue;
            }

            parent_map.insert(id, parent);
            if let Some(n) = parts.get(2) {
                name_map.insert(id, n.trim().to_string());
            }
            if let Some(r) = parts.get(3) {
                rank_map.insert(id, r.trim().to_string());
            }
        }

        if parent_map.is_empty() {
            return Err(AnalysisError::Scheme {
                scheme: name.to_string(),
                message: format!("no hierarchy entries in {}", filepath.as_ref().display()),
            });
        }

        let root = find_root(&parent_map);
        log::info!(
            "Scheme {}: {} ids, root {}",
            name,
            parent_map.len(),
            root
        );

        Ok(Self {
            name: name.to_string(),
            parent_map,
            name_map,
            rank_map,
            root,
        })
    }

    pub fn is_known(&self, id: ClassId) -> bool {
        self.parent_map.contains_key(&id)
    }

    pub fn parent(&self, id: ClassId) -> Option<ClassId> {
        self.parent_map.get(&id).copied()
    }

    /// Lowest common ancestor of `a` and `b`. Non-positive ids count as
    /// unassigned and yield the other argument; disjoint lineages collapse
    /// to the root.
    pub fn lca(&self, mut a: ClassId, mut b: ClassId) -> ClassId {
        if a <= 0 || b <= 0 {
            return if a <= 0 { b } else { a };
        }
        if a == b {
            return a;
        }

        let mut a_anc = AHashSet::with_capacity(16);
        while a > 0 && a != self.root {
            a_anc.insert(a);
            match self.parent(a) {
                Some(p) if p != a => a = p,
                _ => break,
            }
        }

        while b > 0 && b != self.root {
            if a_anc.contains(&b) {
                return b;
            }
            match self.parent(b) {
                Some(p) if p != b => b = p,
                _ => break,
            }
        }
        self.root
    }

    /// Depth of `id` below the root (root = 0). Unknown ids report 0.
    pub fn depth(&self, id: ClassId) -> usize {
        let mut depth = 0;
        let mut node = id;
        while node > 0 && node != self.root {
            match self.parent(node) {
                Some(p) if p != node => {
                    depth += 1;
                    node = p;
                }
                _ => break,
            }
        }
        depth
    }

    /// Whether `ancestor` lies on the path from `id` to the root
    /// (a node is its own ancestor).
    pub fn is_ancestor(&self, ancestor: ClassId, id: ClassId) -> bool {
        if ancestor <= 0 || id <= 0 {
            return false;
        }
        let mut node = id;
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(p) if p != node => node = p,
                _ => return false,
            }
        }
    }

    /// Build a map of `parent -> Vec<child>` for traversing the hierarchy.
    pub fn children_map(&self) -> AHashMap<ClassId, Vec<ClassId>> {
        let mut children_map: AHashMap<ClassId, Vec<ClassId>> = AHashMap::new();
        for &id in self.parent_map.keys() {
            children_map.entry(id).or_default();
        }
        for (&child, &parent) in &self.parent_map {
            if parent > 0 && child != parent {
                children_map.entry(parent).or_default().push(child);
            }
        }
        children_map
    }
}

/// The root is the id whose parent is itself or non-positive; falls back to
/// the conventional 1 when the relation has no explicit root entry.
fn find_root(parent_map: &ParentMap) -> ClassId {
    for (&id, &parent) in parent_map {
        if parent == id || parent <= 0 {
            return id;
        }
    }
    1
}
