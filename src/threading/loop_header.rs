//! Loop-header threader: threading decisions where the block being threaded
//! is itself a loop header need extra care so the loop tree stays coherent
//! — threading through a header either keeps a single entry (the common
//! "dominating" case), peels the header into a new preheader (the "entries"
//! case), or is refused outright when it would require two different
//! headers to merge (`LoopBroken`).

use crate::cfg::analysis::empty_block_p;
use crate::cfg::loops::{LoopId, LoopsStateFlag};
use crate::cfg::mutate;
use crate::cfg::{EdgeIndex, NodeIndex};
use crate::threading::{Engine, ThreadMode};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Where the thread target sits relative to the loop being peeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominanceStatus {
    /// The thread's final target is dominated by the header: threading stays
    /// inside the loop, so the latch can just be redirected.
    Dominating,
    /// The final target is outside the loop and not dominated by the
    /// header: threading here would require splitting the loop into two
    /// headers, which this engine refuses.
    LoopBroken,
    /// The final target is reachable but the header does not dominate it:
    /// the entries case, handled by peeling.
    Nondominating,
}

impl<'a> Engine<'a> {
    /// Attempt to thread `header`'s annotated edges given it is a loop
    /// header for `loop_id`. Returns `true` if any threading happened.
    ///
    /// `tgt_bb` is determined one of two ways: if the latch edge carries a
    /// non-joiner path, its second-step destination wins outright. Otherwise
    /// every annotated non-latch predecessor of `header` must agree on a
    /// single non-joiner second-step destination (`common_entries_target`) —
    /// the genuine entries case — and that is only attempted at all if
    /// `may_peel_loop_headers` is set or `header` is a pure redirection
    /// block (nothing to lose by peeling it).
    pub fn thread_header(&mut self, loop_id: LoopId, header: NodeIndex, may_peel_loop_headers: bool) -> bool {
        if crate::cfg::analysis::single_succ_p(self.cfg, header) {
            return false;
        }

        let latch = self.loops.latch(loop_id);
        let latch_edge = latch.and_then(|l| self.cfg.find_edge(l, header));
        let latch_target = latch_edge.and_then(|e| self.latch_thread_target(e));

        let target = match latch_target {
            Some(t) => t,
            None => {
                if !may_peel_loop_headers && !empty_block_p(self.cfg, header) {
                    return false;
                }
                let Some(t) = self.common_entries_target(loop_id) else { return false };
                t
            }
        };

        let status = self.classify_dominance(loop_id, target);
        if status == DominanceStatus::LoopBroken {
            self.loops.null_header_latch(loop_id);
            self.loops.loops_state_set(LoopsStateFlag::NeedsFixup);
            return self.thread_block(header, false, false);
        }

        let in_body = self.loops.get(loop_id).is_some_and(|l| l.contains(target));
        if !in_body {
            if let Some(sub_loop) =
                self.loops.loops_containing(target).into_iter().find(|&id| self.loops.header(id) == Some(target))
            {
                let body = self.loops.get(sub_loop).map(|l| l.body.clone()).unwrap_or_default();
                mutate::create_preheader(self.cfg, target, &body);
                self.invalidate_dominators();
            }
        }

        match status {
            DominanceStatus::LoopBroken => unreachable!("handled above"),
            DominanceStatus::Dominating => {
                let Some(latch_edge) = latch_edge else { return false };
                self.thread_latch_case(loop_id, latch_edge)
            }
            DominanceStatus::Nondominating => self.thread_entries_case(loop_id, header),
        }
    }

    /// If `edge` carries a non-joiner path, its second-step destination —
    /// the target a latch-to-somewhere thread would redirect past the
    /// header onto.
    fn latch_thread_target(&self, edge: EdgeIndex) -> Option<NodeIndex> {
        let path = self.cfg.edge_weight(edge)?.aux.as_ref()?;
        if path.mode() == ThreadMode::Joiner {
            return None;
        }
        let step1 = path.steps()[1].edge;
        self.cfg.edge_endpoints(step1).map(|(_, t)| t)
    }

    /// Classify where `target` sits relative to the loop's body and the
    /// header's dominance.
    pub(crate) fn classify_dominance(&self, loop_id: LoopId, target: NodeIndex) -> DominanceStatus {
        let Some(natural) = self.loops.get(loop_id) else { return DominanceStatus::LoopBroken };
        if !natural.is_valid() {
            return DominanceStatus::LoopBroken;
        }
        if natural.contains(target) {
            return DominanceStatus::Dominating;
        }
        // Outside the loop: whether this is a clean single-entry redirection
        // (Dominating) or requires peeling (Nondominating) depends on
        // whether every other latch-bearing path agrees on the same exit, a
        // cheap proxy for "the header still dominates this edge" without a
        // full dominator-tree rebuild mid-threading pass.
        if self.common_entries_target(loop_id) == Some(target) {
            DominanceStatus::Dominating
        } else {
            DominanceStatus::Nondominating
        }
    }

    /// The entries-case target: the single target every annotated entry
    /// edge agrees on, or `None` if entries disagree (forcing `LoopBroken`
    /// upstream is the caller's job once this returns `None`).
    pub(crate) fn common_entries_target(&self, loop_id: LoopId) -> Option<NodeIndex> {
        let header = self.loops.header(loop_id)?;
        let mut targets = self
            .cfg
            .edges_directed(header, Direction::Incoming)
            .filter_map(|e| self.cfg.edge_weight(e.id())?.aux.as_ref().map(|p| (**p).clone()))
            .map(|p| p.final_edge())
            .filter_map(|step| self.cfg.edge_endpoints(step.edge).map(|(_, t)| t));

        let first = targets.next()?;
        if targets.all(|t| t == first) {
            Some(first)
        } else {
            None
        }
    }

    /// Latch case: the latch is redirected past the header via
    /// [`Engine::thread_single_edge`]. The header keeps its remaining
    /// body-sourced predecessors as latches, if any; if more than one
    /// remains the loop has more than one latch and
    /// [`LoopsStateFlag::MayHaveMultipleLatches`] is raised. If none remain
    /// the loop no longer has a way back into its header and is nulled out,
    /// with any leftover annotations on the header swept by `thread_block`.
    fn thread_latch_case(&mut self, loop_id: LoopId, latch_edge: EdgeIndex) -> bool {
        let old_header = self.loops.header(loop_id);
        let Some(landed) = self.thread_single_edge(latch_edge) else { return false };
        self.stats.loop_headers_threaded += 1;

        let Some(header) = old_header else { return true };

        if landed == header {
            self.loops.null_header_latch(loop_id);
            self.loops.loops_state_set(LoopsStateFlag::NeedsFixup);
            self.thread_block(header, false, false);
            return true;
        }

        let body = self.loops.get(loop_id).map(|l| l.body.clone()).unwrap_or_default();
        let mut remaining_latches: Vec<NodeIndex> = self
            .cfg
            .edges_directed(header, Direction::Incoming)
            .filter(|e| body.contains(&e.source()))
            .map(|e| e.source())
            .collect();
        remaining_latches.sort_by_key(|n| n.index());
        remaining_latches.dedup();

        match remaining_latches.split_first() {
            None => {
                self.loops.null_header_latch(loop_id);
                self.loops.loops_state_set(LoopsStateFlag::NeedsFixup);
            }
            Some((&new_latch, rest)) => {
                self.loops.reparent_header(loop_id, header, header, new_latch);
                if !rest.is_empty() {
                    self.loops.loops_state_set(LoopsStateFlag::MayHaveMultipleLatches);
                }
            }
        }

        // Any other annotated predecessor of the header still carries a
        // path that would give the loop a second, distinct entry now that
        // the latch has been redirected past it; cancel those.
        let stale: Vec<EdgeIndex> = self
            .cfg
            .edges_directed(header, Direction::Incoming)
            .filter(|e| !body.contains(&e.source()))
            .filter(|e| self.cfg.edge_weight(e.id()).is_some_and(|d| d.aux.is_some()))
            .map(|e| e.id())
            .collect();
        for e in stale {
            if let Some(d) = self.cfg.edge_weight_mut(e) {
                d.aux = None;
            }
            self.stats.paths_cancelled_multi_entry += 1;
        }

        self.thread_block(header, false, false);
        true
    }

    /// Entries case: every annotated entry edge is redirected onto a fresh
    /// forwarder in front of the loop, and the
    /// forwarder becomes the new preheader. The loop keeps its original
    /// header and latch; this never creates a second header, so
    /// `LoopsMayHaveMultipleLatches` is deliberately left untouched here
    /// (only the latch case can introduce a second latch).
    fn thread_entries_case(&mut self, loop_id: LoopId, header: NodeIndex) -> bool {
        let entry_edges: Vec<EdgeIndex> = self
            .cfg
            .edges_directed(header, Direction::Incoming)
            .filter(|e| self.cfg.edge_weight(e.id()).is_some_and(|d| d.aux.is_some()))
            .map(|e| e.id())
            .collect();
        if entry_edges.is_empty() {
            return false;
        }

        let Some(target) = self.common_entries_target(loop_id) else { return false };
        let body = self.loops.get(loop_id).map(|l| l.body.clone()).unwrap_or_default();
        if body.contains(&target) {
            return false;
        }

        let forwarder = mutate::make_forwarder_block(self.cfg, target, &entry_edges);
        for &e in &entry_edges {
            if let Some(d) = self.cfg.edge_weight_mut(e) {
                d.aux = None;
            }
        }
        self.stats.record_jump_threaded();
        self.stats.loop_headers_threaded += 1;
        self.invalidate_dominators();
        let _ = forwarder;
        true
    }
}
