//! Path data model: `JumpThreadEdge`, `Path`, `PathStore`.

use crate::cfg::EdgeIndex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One step of a jump-thread path.
///
/// A closed set of four kinds, with index 0 always `StartJumpThread` and
/// the last element never a joiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeStepKind {
    /// The incoming edge that triggers threading. Always index 0.
    StartJumpThread,
    /// A block whose statements must be duplicated on this path.
    CopySrcBlock,
    /// A block with multiple predecessors whose control statement must be
    /// kept (joiner).
    CopySrcJoinerBlock,
    /// A block traversed but not duplicated.
    NoCopySrcBlock,
}

impl EdgeStepKind {
    pub fn is_joiner(self) -> bool {
        matches!(self, EdgeStepKind::CopySrcJoinerBlock)
    }
}

/// One step in a [`Path`]: the CFG edge it refers to, and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpThreadEdge {
    pub edge: EdgeIndex,
    pub kind: EdgeStepKind,
}

impl JumpThreadEdge {
    pub fn new(edge: EdgeIndex, kind: EdgeStepKind) -> Self {
        Self { edge, kind }
    }

    /// A "null edge": `petgraph`'s sentinel invalid index, the natural
    /// analogue of a null edge pointer in a C compiler.
    pub fn is_null(&self) -> bool {
        self.edge == EdgeIndex::end()
    }
}

/// Which wiring mode a [`Path`] takes, determined by its index-1 step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadMode {
    Plain,
    Joiner,
}

/// An ordered sequence of [`JumpThreadEdge`], length ≥ 2. Index 0 is always
/// `StartJumpThread`; the last element is never a joiner.
#[derive(Debug, Clone)]
pub struct Path {
    id: u64,
    steps: Vec<JumpThreadEdge>,
}

impl Path {
    /// An empty-but-unvalidated path under construction; callers push steps
    /// with [`Path::push`] and the store validates on [`PathStore::register`].
    pub fn new(id: u64) -> Self {
        Self { id, steps: Vec::new() }
    }

    pub fn with_steps(id: u64, steps: Vec<JumpThreadEdge>) -> Self {
        Self { id, steps }
    }

    pub fn push(&mut self, step: JumpThreadEdge) {
        self.steps.push(step);
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn steps(&self) -> &[JumpThreadEdge] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Well-formed paths have length ≥ 2, start with `StartJumpThread`, and
    /// never end on a joiner.
    pub fn is_well_formed(&self) -> bool {
        self.steps.len() >= 2
            && self.steps[0].kind == EdgeStepKind::StartJumpThread
            && !self.steps.last().unwrap().kind.is_joiner()
    }

    /// Whether any step carries a null edge: the cancel-and-drop trigger.
    pub fn has_null_edge(&self) -> bool {
        self.steps.iter().any(|s| s.is_null())
    }

    /// The edge that triggers threading: always index 0.
    pub fn start_edge(&self) -> EdgeIndex {
        self.steps[0].edge
    }

    /// Mode determined by the index-1 step.
    pub fn mode(&self) -> ThreadMode {
        if self.steps[1].kind.is_joiner() {
            ThreadMode::Joiner
        } else {
            ThreadMode::Plain
        }
    }

    /// The final target edge: the last step.
    pub fn final_edge(&self) -> JumpThreadEdge {
        *self.steps.last().expect("Path::final_edge on empty path")
    }

    /// Truncate the path to `new_len` steps in place, used by multi-loop
    /// trimming.
    pub fn truncate(&mut self, new_len: usize) {
        self.steps.truncate(new_len);
    }

    /// Steps from index 1 onward, the suffix two paths must agree on to
    /// share a [`crate::threading::redirection::RedirectionEntry`]. Index 0
    /// is deliberately excluded: it is the triggering edge, unique to each
    /// path.
    pub fn suffix(&self) -> &[JumpThreadEdge] {
        &self.steps[1..]
    }
}

/// Optional bisection gate letting a caller suppress registrations past a
/// limit. Mirrors GCC's `dbg_cnt`: a cap on how many registrations are
/// allowed before the rest are silently dropped, used to binary-search a
/// miscompile down to a single threading decision.
#[derive(Debug, Clone, Copy)]
pub struct DebugCounter {
    limit: Option<usize>,
    taken: usize,
}

impl DebugCounter {
    pub fn unlimited() -> Self {
        Self { limit: None, taken: 0 }
    }

    pub fn limited(limit: usize) -> Self {
        Self { limit: Some(limit), taken: 0 }
    }

    /// Consume one slot; returns `true` if the caller should proceed.
    fn take(&mut self) -> bool {
        match self.limit {
            None => true,
            Some(limit) => {
                let ok = self.taken < limit;
                self.taken += 1;
                ok
            }
        }
    }
}

/// Holds a sequence of owned paths before they are attached to edges.
#[derive(Debug, Default)]
pub struct PathStore {
    paths: VecDeque<Path>,
    debug_counter: Option<DebugCounter>,
    dump: Vec<String>,
}

impl PathStore {
    pub fn new() -> Self {
        Self { paths: VecDeque::new(), debug_counter: None, dump: Vec::new() }
    }

    pub fn with_debug_counter(counter: DebugCounter) -> Self {
        Self { paths: VecDeque::new(), debug_counter: Some(counter), dump: Vec::new() }
    }

    /// Validate, dump, and take ownership of `path`. Returns `false` if the
    /// path was rejected (null edge, malformed shape, or bisection limit),
    /// in which case `path` is dropped here rather than appended.
    pub fn register(&mut self, path: Path) -> bool {
        if path.has_null_edge() || !path.is_well_formed() {
            self.dump.push(format!("path {}: cancelled (null edge or malformed)", path.id()));
            return false;
        }
        if let Some(counter) = self.debug_counter.as_mut() {
            if !counter.take() {
                self.dump.push(format!("path {}: suppressed by debug counter", path.id()));
                return false;
            }
        }
        self.dump.push(format!(
            "path {}: registered, {} steps, mode={:?}",
            path.id(),
            path.len(),
            path.mode()
        ));
        self.paths.push_back(path);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Drain every stored path. Used by the driver to hand paths off to
    /// [`super::prevalidate::mark_threaded_blocks`].
    pub fn drain(&mut self) -> Vec<Path> {
        self.paths.drain(..).collect()
    }

    /// Empty the store without returning its contents, for callers that
    /// reject a batch of paths up front.
    pub fn release(&mut self) {
        self.paths.clear();
    }

    pub fn dump_lines(&self) -> &[String] {
        &self.dump
    }
}
