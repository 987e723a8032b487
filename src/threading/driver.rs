//! Driver: the single entry point that runs one complete jump-threading
//! pass over a function's CFG, wiring together the pre-validator, the
//! non-loop and loop-header threaders, and the mandatory post-pass sweep.

use crate::cfg::loops::LoopTree;
use crate::cfg::Cfg;
use crate::ssa::PendingStmts;
use crate::threading::{prevalidate, Engine, PathStore, Stats};
use petgraph::visit::EdgeRef;

impl<'a> Engine<'a> {
    /// Drain `paths`, pre-validate them, thread every marked block
    /// (non-loop-header blocks first, then every eligible loop header
    /// innermost-first — `may_peel_loop_headers` only gates the entries case
    /// inside `thread_header` itself, not whether headers are attempted at
    /// all), sweep any leftover annotation, and report whether anything
    /// changed.
    pub fn thread_through_all_blocks(
        &mut self,
        paths: &mut PathStore,
        may_peel_loop_headers: bool,
        optimize_for_size: bool,
    ) -> bool {
        if paths.is_empty() {
            return false;
        }

        let drained = paths.drain();
        let marked =
            prevalidate::mark_threaded_blocks(self.cfg, drained, self.loops, self.stats, optimize_for_size);

        let mut any = false;

        let header_blocks: std::collections::HashSet<_> =
            marked.iter().copied().filter(|&n| self.loops.is_loop_header(n)).collect();

        for &bb in &marked {
            if header_blocks.contains(&bb) {
                continue;
            }
            let plain = self.thread_block(bb, false, true);
            let joiner = self.thread_block(bb, true, true);
            any |= plain || joiner;
        }

        for loop_id in self.loops.innermost_first() {
            let Some(header) = self.loops.header(loop_id) else { continue };
            if !header_blocks.contains(&header) {
                continue;
            }
            any |= self.thread_header(loop_id, header, may_peel_loop_headers);
        }

        self.sweep_leftover_annotations();

        if any {
            self.loops.loops_state_set(crate::cfg::loops::LoopsStateFlag::NeedsFixup);
        }

        self.stats.dump();
        any
    }

    /// Any edge that still carries an `aux` path after every threading
    /// attempt is a path that was registered but never consumed (e.g. its
    /// block was a loop header and `may_peel_loop_headers` was false). Clear
    /// it so a stale path can never leak into the next pass.
    fn sweep_leftover_annotations(&mut self) {
        let leftover: Vec<_> = self
            .cfg
            .edge_references()
            .filter(|e| e.weight().aux.is_some())
            .map(|e| e.id())
            .collect();
        for e in leftover {
            if let Some(d) = self.cfg.edge_weight_mut(e) {
                d.aux = None;
            }
        }
    }
}

/// Run one complete pass: construct the working `Engine` from its
/// collaborators, thread everything `paths` describes, and report whether
/// the CFG changed.
pub fn run_pass(
    cfg: &mut Cfg,
    loops: &mut LoopTree,
    pending: &mut PendingStmts,
    stats: &mut Stats,
    paths: &mut PathStore,
    may_peel_loop_headers: bool,
    optimize_for_size: bool,
) -> bool {
    let mut engine = Engine::new(cfg, loops, pending, stats);
    engine.thread_through_all_blocks(paths, may_peel_loop_headers, optimize_for_size)
}
