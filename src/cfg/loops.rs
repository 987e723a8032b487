//! Natural loop detection and loop-tree bookkeeping.
//!
//! Loops are found the usual way: a back-edge `tail -> header` exists
//! whenever `header` dominates `tail`, and the loop body is every node that
//! can reach `tail` without passing back through `header`. On top of that,
//! [`LoopTree`] adds the bookkeeping the threading engine treats as an
//! external collaborator rather than something it computes itself: nesting
//! (`loop_father`/`loop_outer`), innermost-first iteration order, the
//! loop-copy slot threading uses while peeling headers, and the two sticky
//! state flags a threading pass can set but never clears mid-run.

use crate::cfg::analysis::find_entry;
use crate::cfg::{Cfg, NodeIndex};
use petgraph::algo::dominators::simple_fast;
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

/// Index into [`LoopTree::loops`].
pub type LoopId = usize;

/// Sticky flags a threading pass can raise on a [`LoopTree`] but never
/// clears itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopsStateFlag {
    /// A threading decision nulled a loop's header/latch, or otherwise left
    /// the loop tree in a shape that needs a full recompute before any pass
    /// that depends on it runs again.
    NeedsFixup,
    /// A loop ended up with more than one latch edge. Not itself illegal,
    /// but downstream passes that assume a single latch must re-check.
    MayHaveMultipleLatches,
}

/// A natural loop, one per back-edge at detection time.
///
/// `header`/`latch` are `Option` because the threading engine can
/// deliberately null them (a header/latch-to-exit thread that destroys the
/// loop) to mark a loop structurally invalid without removing it from the
/// tree — other loops' indices must stay stable.
#[derive(Debug, Clone)]
pub struct NaturalLoop {
    pub header: Option<NodeIndex>,
    pub latch: Option<NodeIndex>,
    pub body: HashSet<NodeIndex>,
    /// Immediate enclosing loop, if any.
    pub outer: Option<LoopId>,
    /// Nesting depth; 0 for an outermost loop.
    pub depth: usize,
    copy_target: Option<LoopId>,
}

impl NaturalLoop {
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.body.contains(&node)
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// A loop with no header/latch has been nulled by the threading engine
    /// and is no longer a real loop, just a placeholder slot.
    pub fn is_valid(&self) -> bool {
        self.header.is_some() && self.latch.is_some()
    }
}

/// The loop forest over one CFG, plus the sticky state flags a threading
/// pass raises on it.
#[derive(Debug, Clone)]
pub struct LoopTree {
    loops: Vec<NaturalLoop>,
    needs_fixup: bool,
    may_have_multiple_latches: bool,
}

impl LoopTree {
    /// Detect every natural loop in `cfg` and compute nesting.
    pub fn build(cfg: &Cfg) -> Self {
        let Some(entry) = find_entry(cfg) else {
            return Self { loops: Vec::new(), needs_fixup: false, may_have_multiple_latches: false };
        };
        let dominators = simple_fast(cfg, entry);

        let mut loops: Vec<NaturalLoop> = Vec::new();
        for edge in cfg.edge_references() {
            let tail = edge.source();
            let header = edge.target();
            if let Some(mut tail_doms) = dominators.dominators(tail) {
                if tail_doms.any(|d| d == header) {
                    let body = compute_loop_body(cfg, header, tail);
                    loops.push(NaturalLoop {
                        header: Some(header),
                        latch: Some(tail),
                        body,
                        outer: None,
                        depth: 0,
                        copy_target: None,
                    });
                }
            }
        }

        let n = loops.len();
        let outers: Vec<Option<LoopId>> = (0..n)
            .map(|i| {
                let header = loops[i].header.unwrap();
                (0..n)
                    .filter(|&j| j != i && loops[j].body.contains(&header))
                    .min_by_key(|&j| loops[j].size())
            })
            .collect();
        for (i, outer) in outers.into_iter().enumerate() {
            loops[i].outer = outer;
        }

        let mut depth = vec![0usize; n];
        let mut computed = vec![false; n];
        for i in 0..n {
            compute_depth(i, &loops, &mut depth, &mut computed);
        }
        for (i, d) in depth.into_iter().enumerate() {
            loops[i].depth = d;
        }

        Self { loops, needs_fixup: false, may_have_multiple_latches: false }
    }

    pub fn loops(&self) -> &[NaturalLoop] {
        &self.loops
    }

    pub fn get(&self, id: LoopId) -> Option<&NaturalLoop> {
        self.loops.get(id)
    }

    pub fn header(&self, id: LoopId) -> Option<NodeIndex> {
        self.loops.get(id).and_then(|l| l.header)
    }

    pub fn latch(&self, id: LoopId) -> Option<NodeIndex> {
        self.loops.get(id).and_then(|l| l.latch)
    }

    /// The innermost valid loop containing `node`, or `None` if `node` is in
    /// no loop.
    pub fn loop_father(&self, node: NodeIndex) -> Option<LoopId> {
        self.loops
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_valid() && l.body.contains(&node))
            .min_by_key(|(_, l)| l.size())
            .map(|(i, _)| i)
    }

    /// The immediate enclosing loop.
    pub fn loop_outer(&self, id: LoopId) -> Option<LoopId> {
        self.loops.get(id).and_then(|l| l.outer)
    }

    pub fn is_loop_header(&self, node: NodeIndex) -> bool {
        self.loops.iter().any(|l| l.header == Some(node))
    }

    pub fn loops_containing(&self, node: NodeIndex) -> Vec<LoopId> {
        self.loops
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_valid() && l.body.contains(&node))
            .map(|(i, _)| i)
            .collect()
    }

    /// Null a loop's header and latch: structurally invalidates the loop
    /// without removing its slot, so other `LoopId`s stay valid.
    pub fn null_header_latch(&mut self, id: LoopId) {
        if let Some(l) = self.loops.get_mut(id) {
            l.header = None;
            l.latch = None;
        }
    }

    /// Overwrite the latch of a loop that is still valid (the latch case
    /// re-parents the header, making the copied header the new preheader).
    pub fn set_latch(&mut self, id: LoopId, latch: NodeIndex) {
        if let Some(l) = self.loops.get_mut(id) {
            l.latch = Some(latch);
        }
    }

    pub fn set_header(&mut self, id: LoopId, header: NodeIndex) {
        if let Some(l) = self.loops.get_mut(id) {
            l.header = Some(header);
        }
    }

    /// After a latch-case peel: `old_header` is no longer reached from the
    /// latch, so it drops out of the loop body (it becomes a one-time guard
    /// reached only from outside); the loop's header becomes `new_header`
    /// and its latch becomes `new_latch`, the duplicate the latch edge now
    /// lands on before falling into `new_header`.
    pub fn reparent_header(
        &mut self,
        id: LoopId,
        old_header: NodeIndex,
        new_header: NodeIndex,
        new_latch: NodeIndex,
    ) {
        if let Some(l) = self.loops.get_mut(id) {
            if new_header != old_header {
                l.body.remove(&old_header);
                l.body.insert(new_header);
            }
            l.body.insert(new_latch);
        }
        self.set_header(id, new_header);
        self.set_latch(id, new_latch);
    }

    /// True if `(src, tgt)` leaves the loop (source in the body, target
    /// outside it).
    pub fn loop_exit_edge_p(&self, id: LoopId, src: NodeIndex, tgt: NodeIndex) -> bool {
        self.loops
            .get(id)
            .map_or(false, |l| l.body.contains(&src) && !l.body.contains(&tgt))
    }

    /// Records which loop a peeled copy of this loop's header now belongs
    /// to (`None` means "not gaining an entry").
    pub fn set_loop_copy(&mut self, id: LoopId, target: Option<LoopId>) {
        if let Some(l) = self.loops.get_mut(id) {
            l.copy_target = target;
        }
    }

    pub fn loop_copy(&self, id: LoopId) -> Option<LoopId> {
        self.loops.get(id).and_then(|l| l.copy_target)
    }

    /// Raise a sticky flag. Flags are never cleared by the engine itself; a
    /// fresh [`LoopTree::build`] is the only way to reset them.
    pub fn loops_state_set(&mut self, flag: LoopsStateFlag) {
        match flag {
            LoopsStateFlag::NeedsFixup => self.needs_fixup = true,
            LoopsStateFlag::MayHaveMultipleLatches => self.may_have_multiple_latches = true,
        }
    }

    pub fn needs_fixup(&self) -> bool {
        self.needs_fixup
    }

    pub fn may_have_multiple_latches(&self) -> bool {
        self.may_have_multiple_latches
    }

    /// Innermost-first loop iteration order: outer-loop transformations
    /// never shrink the set of eligible inner headers, so inner loops are
    /// always threaded before the loops that contain them. Invalidated
    /// loops are skipped.
    pub fn innermost_first(&self) -> Vec<LoopId> {
        let mut ids: Vec<LoopId> =
            (0..self.loops.len()).filter(|&i| self.loops[i].is_valid()).collect();
        ids.sort_by_key(|&i| std::cmp::Reverse(self.loops[i].depth));
        ids
    }
}

fn compute_depth(i: usize, loops: &[NaturalLoop], depth: &mut [usize], computed: &mut [bool]) -> usize {
    if computed[i] {
        return depth[i];
    }
    // Mark early to break cycles defensively; well-formed loop nesting is a
    // forest, so this should never actually recurse back into `i`.
    computed[i] = true;
    let d = match loops[i].outer {
        Some(outer) => compute_depth(outer, loops, depth, computed) + 1,
        None => 0,
    };
    depth[i] = d;
    d
}

/// Compute loop body from back edge `tail -> header`: the header plus every
/// node that can reach `tail` without passing through the header.
fn compute_loop_body(cfg: &Cfg, header: NodeIndex, tail: NodeIndex) -> HashSet<NodeIndex> {
    let mut body = HashSet::new();
    let mut worklist = VecDeque::new();
    worklist.push_back(tail);

    while let Some(node) = worklist.pop_front() {
        if node == header || body.contains(&node) {
            continue;
        }
        body.insert(node);
        for pred in cfg.neighbors_directed(node, petgraph::Direction::Incoming) {
            if pred != header && !body.contains(&pred) {
                worklist.push_back(pred);
            }
        }
    }
    body.insert(header);
    body
}
