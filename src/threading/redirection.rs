//! Redirection table: groups incoming edges that share a target path suffix
//! behind one duplicate block.

use crate::cfg::{EdgeIndex, NodeIndex};
use crate::threading::path::{JumpThreadEdge, Path};
use std::collections::HashMap;

/// Key used to group paths: every step from index 1 onward, kind and edge
/// identity both significant. Index 0 is excluded since different incoming
/// edges can share the same suffix.
///
/// A compiler implementing this by hand typically hashes only the final
/// destination block for speed and falls back to full comparison on
/// collision; a `HashMap` keyed on the whole suffix vector gives the same
/// equality contract without needing a separate collision-resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathKey(Vec<JumpThreadEdge>);

impl PathKey {
    pub fn from_path(path: &Path) -> Self {
        Self(path.suffix().to_vec())
    }
}

/// Per unique path suffix during one block's processing.
#[derive(Debug)]
pub struct RedirectionEntry {
    /// The path template used as the hash key, kept for wiring decisions
    /// (mode, final destination).
    pub template: Path,
    /// The duplicate block created for this suffix. `None` until the first
    /// redirection traversal creates it.
    pub duplicate: Option<NodeIndex>,
    /// Incoming edges to redirect to the duplicate, in the order they were
    /// inserted (a singly-linked list in the original; a `Vec` pushed at the
    /// back behaves identically for this table's access pattern).
    pub incoming: Vec<EdgeIndex>,
}

impl RedirectionEntry {
    fn new(template: Path, first_incoming: EdgeIndex) -> Self {
        Self { template, duplicate: None, incoming: vec![first_incoming] }
    }
}

/// Open hash table keyed by path identity, with a lifetime scoped to one
/// block's processing.
#[derive(Debug, Default)]
pub struct RedirectionTable {
    entries: HashMap<PathKey, RedirectionEntry>,
    /// Insertion order, so "first entry visited" is well defined.
    order: Vec<PathKey>,
}

impl RedirectionTable {
    /// Sized to the block's successor count: a plain hint only, since
    /// `HashMap::with_capacity` just pre-reserves.
    pub fn with_capacity(successor_count: usize) -> Self {
        Self { entries: HashMap::with_capacity(successor_count), order: Vec::new() }
    }

    /// Lookup-insert: on a fresh key, `incoming_edge` becomes the head of a
    /// new entry's incoming list (cloning `path` as the template); on a
    /// duplicate key, `incoming_edge` is appended to the existing entry's
    /// list. Returns the key so callers can look the entry back up.
    pub fn insert(&mut self, path: &Path, incoming_edge: EdgeIndex) -> PathKey {
        let key = PathKey::from_path(path);
        match self.entries.get_mut(&key) {
            Some(entry) => entry.incoming.push(incoming_edge),
            None => {
                self.entries.insert(key.clone(), RedirectionEntry::new(path.clone(), incoming_edge));
                self.order.push(key.clone());
            }
        }
        key
    }

    /// Lookup-no-insert.
    pub fn get(&self, key: &PathKey) -> Option<&RedirectionEntry> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &PathKey) -> Option<&mut RedirectionEntry> {
        self.entries.get_mut(key)
    }

    /// Entries in the order their key was first inserted: the first entry
    /// visited is the one that creates the template.
    pub fn entries_in_order(&self) -> impl Iterator<Item = (&PathKey, &RedirectionEntry)> {
        self.order.iter().map(move |k| (k, self.entries.get(k).expect("order tracks a live key")))
    }

    pub fn keys_in_order(&self) -> &[PathKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cleared at end of block.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threading::path::EdgeStepKind;
    use petgraph::stable_graph::EdgeIndex as Idx;

    fn path(id: u64, steps: &[(u32, EdgeStepKind)]) -> Path {
        let mut p = Path::new(id);
        for &(i, k) in steps {
            p.push(JumpThreadEdge::new(Idx::new(i as usize), k));
        }
        p
    }

    #[test]
    fn shared_suffix_groups_behind_one_entry() {
        let mut table = RedirectionTable::with_capacity(2);
        let p1 = path(0, &[(0, EdgeStepKind::StartJumpThread), (9, EdgeStepKind::CopySrcBlock)]);
        let p2 = path(1, &[(1, EdgeStepKind::StartJumpThread), (9, EdgeStepKind::CopySrcBlock)]);
        let p3 = path(2, &[(2, EdgeStepKind::StartJumpThread), (9, EdgeStepKind::CopySrcBlock)]);

        table.insert(&p1, Idx::new(0));
        table.insert(&p2, Idx::new(1));
        table.insert(&p3, Idx::new(2));

        assert_eq!(table.len(), 1);
        let key = &table.keys_in_order()[0];
        assert_eq!(table.get(key).unwrap().incoming.len(), 3);
    }

    #[test]
    fn distinct_suffixes_get_distinct_entries() {
        let mut table = RedirectionTable::with_capacity(2);
        let p1 = path(0, &[(0, EdgeStepKind::StartJumpThread), (9, EdgeStepKind::CopySrcBlock)]);
        let p2 = path(1, &[(1, EdgeStepKind::StartJumpThread), (8, EdgeStepKind::CopySrcBlock)]);
        table.insert(&p1, Idx::new(0));
        table.insert(&p2, Idx::new(1));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn clear_empties_table() {
        let mut table = RedirectionTable::with_capacity(1);
        let p1 = path(0, &[(0, EdgeStepKind::StartJumpThread), (9, EdgeStepKind::CopySrcBlock)]);
        table.insert(&p1, Idx::new(0));
        table.clear();
        assert!(table.is_empty());
        assert!(table.keys_in_order().is_empty());
    }
}
