//! Edge-redirection engine: per-block state machine for plain vs.
//! joiner-block rewiring, plus the single-edge specialization the
//! loop-header threader uses for latches.
//!
//! Scope note: each redirection entry produces exactly one duplicate of the
//! block being threaded (`bb`). A path's intermediate `CopySrcBlock`/
//! `NoCopySrcBlock` steps beyond the first hop are load-bearing for the
//! pre-validator's loop-crossing checks and for picking the φ source to
//! mirror, not a second physical block to clone.

use crate::cfg::mutate::{self, remove_ctrl_stmt_and_useless_edges};
use crate::cfg::{EdgeData, EdgeIndex, EdgeType, NodeIndex, Terminator};
use crate::threading::duplicator;
use crate::threading::error::{self, ThreadingBug};
use crate::threading::phi;
use crate::threading::profile;
use crate::threading::redirection::RedirectionTable;
use crate::threading::{Engine, Path, ThreadMode};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

impl<'a> Engine<'a> {
    /// After `redirect_edge_and_branch` returns, confirm the edge it claims
    /// to have produced is actually the live `expected_src -> expected_target`
    /// edge, rather than trusting the returned index blindly.
    fn verify_redirect(&self, expected_src: NodeIndex, expected_target: NodeIndex, got: EdgeIndex) {
        match self.cfg.find_edge(expected_src, expected_target) {
            Some(found) if found == got => {}
            found => error::bug(ThreadingBug::RedirectMovedEdge { expected: found.unwrap_or(got), got }),
        }
    }

    /// Called once per (block, mode) pair; the driver calls it twice per
    /// block, `joiners = false` then `true`.
    pub fn thread_block(&mut self, bb: NodeIndex, joiners: bool, noloop_only: bool) -> bool {
        self.invalidate_latch_to_exit(bb);

        let succ_count = self.cfg.edges_directed(bb, Direction::Outgoing).count().max(1);
        let mut table = RedirectionTable::with_capacity(succ_count);

        let prior_loop_copy = self.header_loop_id(bb).map(|id| (id, self.loops.loop_copy(id)));

        let preds: Vec<EdgeIndex> =
            self.cfg.edges_directed(bb, Direction::Incoming).map(|e| e.id()).collect();
        for e in preds {
            let Some(path) =
                self.cfg.edge_weight(e).and_then(|d| d.aux.as_ref()).map(|p| (**p).clone())
            else {
                continue;
            };
            if (path.mode() == ThreadMode::Joiner) != joiners {
                continue;
            }

            if noloop_only && !self.noloop_guard_allows(bb, &path) {
                self.cfg.edge_weight_mut(e).expect("annotated edge still live").aux = None;
                self.stats.paths_cancelled_noloop_guard += 1;
                continue;
            }

            if let Some((step0_src, _)) = self.cfg.edge_endpoints(path.start_edge()) {
                if step0_src == bb {
                    let freq = profile::edge_frequency(
                        self.cfg.edge_weight(e).expect("annotated edge still live"),
                    );
                    profile::update_bb_profile_for_threading(self.cfg, bb, freq);
                }
            }

            table.insert(&path, e);
        }

        self.invalidate_dominators();

        if let Some(loop_id) = self.header_loop_id(bb) {
            let header_to_exit = table.entries_in_order().any(|(_, entry)| {
                let fe = entry.template.final_edge();
                self.cfg
                    .edge_endpoints(fe.edge)
                    .is_some_and(|(s, t)| self.loops.loop_exit_edge_p(loop_id, s, t))
            });
            if header_to_exit {
                let outer = self.loops.loop_outer(loop_id);
                self.loops.set_loop_copy(loop_id, outer);
            }
        }

        let threaded = self.run_traversals(bb, &mut table);

        table.clear();
        if let Some((id, prior)) = prior_loop_copy {
            self.loops.set_loop_copy(id, prior);
        }

        threaded
    }

    /// The three sequential traversals: create duplicates, wire the
    /// template, then redirect incoming edges.
    fn run_traversals(&mut self, bb: NodeIndex, table: &mut RedirectionTable) -> bool {
        let keys = table.keys_in_order().to_vec();
        if keys.is_empty() {
            return false;
        }

        // 1. Create duplicates: first entry becomes (or seeds) the template;
        //    every later entry clones from it and is wired immediately.
        let mut template_key = None;
        for key in &keys {
            if template_key.is_none() {
                let mode = table.get(key).expect("key from this table").template.mode();
                let node = match mode {
                    ThreadMode::Plain => duplicator::create_template(self.cfg, bb),
                    ThreadMode::Joiner => mutate::duplicate_block(self.cfg, bb),
                };
                table.get_mut(key).expect("key from this table").duplicate = Some(node);
                self.stats.record_duplicate();
                template_key = Some(key.clone());
            } else {
                let template_node = table
                    .get(template_key.as_ref().expect("set above"))
                    .expect("template key is live")
                    .duplicate
                    .expect("template already created");
                let mode = table.get(key).expect("key from this table").template.mode();
                let dup = match mode {
                    ThreadMode::Plain => duplicator::clone_from_template(self.cfg, template_node),
                    ThreadMode::Joiner => mutate::duplicate_block(self.cfg, template_node),
                };
                table.get_mut(key).expect("key from this table").duplicate = Some(dup);
                self.stats.record_duplicate();

                let path = table.get(key).expect("key from this table").template.clone();
                self.wire_duplicate_outgoing(bb, dup, &path);
            }
        }

        // 2. Fix up the template last.
        if let Some(tk) = &template_key {
            let entry = table.get(tk).expect("template key is live");
            let template_node = entry.duplicate.expect("template already created");
            let path = entry.template.clone();
            self.wire_duplicate_outgoing(bb, template_node, &path);
        }

        // 3. Redirect incoming edges.
        let mut any = false;
        for key in &keys {
            let entry = table.get(key).expect("key from this table");
            let dup = entry.duplicate.expect("wired above");
            let incoming = entry.incoming.clone();
            for e in incoming {
                any = true;
                self.stats.record_jump_threaded();
                let freq =
                    profile::edge_frequency(self.cfg.edge_weight(e).expect("edge still live"));
                if let Some(d) = self.cfg.node_weight_mut(dup) {
                    d.count += freq;
                }
                let Some((src, _)) = self.cfg.edge_endpoints(e) else { continue };
                if let Some(b) = self.cfg.node_weight_mut(bb) {
                    for phi in b.phis.iter_mut() {
                        phi.remove_arg(e);
                    }
                }
                let new_edge = mutate::redirect_edge_and_branch(self.cfg, e, dup);
                self.verify_redirect(src, dup, new_edge);
                self.pending.flush_pending_stmts(self.cfg, new_edge);
                if let Some(d) = self.cfg.edge_weight_mut(new_edge) {
                    d.aux = None;
                }
            }
        }
        any
    }

    /// Wiring for a single duplicate, dispatched by the path's mode.
    fn wire_duplicate_outgoing(&mut self, bb: NodeIndex, dup: NodeIndex, path: &Path) {
        match path.mode() {
            ThreadMode::Plain => self.wire_plain(dup, path),
            ThreadMode::Joiner => self.wire_joiner(bb, dup, path),
        }
    }

    fn wire_plain(&mut self, dup: NodeIndex, path: &Path) {
        remove_ctrl_stmt_and_useless_edges(self.cfg, dup, None);

        let final_step = path.final_edge();
        let Some((_, target)) = self.cfg.edge_endpoints(final_step.edge) else { return };
        let count = self.cfg.node_weight(dup).map_or(0, |b| b.count);

        let mut data = EdgeData::with_profile(EdgeType::Fallthrough, profile::BB_FREQ_MAX, count);
        if let Some(nested) = self.cfg.edge_weight(final_step.edge).and_then(|d| d.aux.as_ref()) {
            data.aux = Some(Box::new((**nested).clone()));
        }
        let new_edge = self.cfg.add_edge(dup, target, data);
        phi::copy_phi_args(self.cfg, target, final_step.edge, new_edge);

        let target_id = self.cfg[target].id;
        self.cfg[dup].terminator = Terminator::Goto { target: target_id };
    }

    fn wire_joiner(&mut self, bb: NodeIndex, dup: NodeIndex, path: &Path) {
        phi::update_destination_phis(self.cfg, bb, dup);

        let joiner_edge = path.steps()[1].edge;
        let Some((_, joiner_target)) = self.cfg.edge_endpoints(joiner_edge) else { return };
        let Some(parallel) = self.cfg.find_edge(dup, joiner_target) else { return };

        let final_step = path.final_edge();
        let Some((_, final_target)) = self.cfg.edge_endpoints(final_step.edge) else { return };
        let count =
            profile::edge_frequency(self.cfg.edge_weight(final_step.edge).expect("final edge live"));

        if final_target == joiner_target {
            if let Some(d) = self.cfg.edge_weight_mut(parallel) {
                d.count = count;
            }
        } else {
            let stale = parallel;
            let new_edge = mutate::redirect_edge_and_branch(self.cfg, parallel, final_target);
            self.verify_redirect(dup, final_target, new_edge);
            if let Some(d) = self.cfg.edge_weight_mut(new_edge) {
                d.count = count;
            }
            phi::copy_phi_args(self.cfg, final_target, final_step.edge, new_edge);
            if let Some(b) = self.cfg.node_weight_mut(joiner_target) {
                for phi in b.phis.iter_mut() {
                    phi.remove_arg(stale);
                }
            }
        }
    }

    /// NoLoop guard: allow a path under `noloop_only` processing only if it
    /// is a header-to-exit plain threading, or it stays within the same
    /// innermost loop it started in.
    fn noloop_guard_allows(&self, bb: NodeIndex, path: &Path) -> bool {
        let final_step = path.final_edge();
        let Some((e2_src, e2_tgt)) = self.cfg.edge_endpoints(final_step.edge) else {
            return false;
        };

        if let Some(loop_id) = self.header_loop_id(bb) {
            if path.mode() != ThreadMode::Joiner && self.loops.loop_exit_edge_p(loop_id, e2_src, e2_tgt)
            {
                return true;
            }
        }

        self.loops.loop_father(bb) == self.loops.loop_father(e2_tgt)
    }

    /// If `bb` is a loop header and its latch edge carries a path exiting
    /// the loop, the loop is structurally destroyed by this threading — null
    /// it rather than let it silently gain a second entry.
    fn invalidate_latch_to_exit(&mut self, bb: NodeIndex) {
        let Some(loop_id) = self.header_loop_id(bb) else { return };
        let Some(latch) = self.loops.latch(loop_id) else { return };
        let Some(latch_edge) = self.cfg.find_edge(latch, bb) else { return };
        let Some(path) = self.cfg.edge_weight(latch_edge).and_then(|d| d.aux.as_ref()) else {
            return;
        };
        let final_step = path.final_edge();
        let Some((src, tgt)) = self.cfg.edge_endpoints(final_step.edge) else { return };
        if self.loops.loop_exit_edge_p(loop_id, src, tgt) {
            self.loops.null_header_latch(loop_id);
            self.loops.loops_state_set(crate::cfg::loops::LoopsStateFlag::NeedsFixup);
        }
    }

    /// Thread a single edge in isolation, used by the loop-header threader
    /// for latch-threading. Returns the block the edge now lands on — either
    /// `bb` itself (stripped in place, single-predecessor case) or a fresh
    /// duplicate of `bb` — so the caller can re-parent around it, or `None`
    /// if `e` carried no path.
    pub fn thread_single_edge(&mut self, e: EdgeIndex) -> Option<NodeIndex> {
        let path = self.cfg.edge_weight(e).and_then(|d| d.aux.as_ref()).map(|p| (**p).clone())?;
        let (_, bb) = self.cfg.edge_endpoints(e)?;

        if crate::cfg::analysis::single_pred_p(self.cfg, bb) {
            let final_step = path.final_edge();
            let (_, target) = self.cfg.edge_endpoints(final_step.edge)?;
            remove_ctrl_stmt_and_useless_edges(self.cfg, bb, Some(target));
            if let Some(d) = self.cfg.edge_weight_mut(e) {
                d.aux = None;
            }
            self.stats.record_jump_threaded();
            return Some(bb);
        }

        let synthetic = Path::with_steps(
            path.id(),
            vec![
                crate::threading::JumpThreadEdge::new(e, crate::threading::EdgeStepKind::StartJumpThread),
                path.final_edge().into_no_copy(),
            ],
        );

        let dup = mutate::duplicate_block(self.cfg, bb);
        self.wire_duplicate_outgoing(bb, dup, &synthetic);
        let freq = profile::edge_frequency(self.cfg.edge_weight(e).expect("edge still live"));
        if let Some(d) = self.cfg.node_weight_mut(dup) {
            d.count += freq;
        }
        let (src, _) = self.cfg.edge_endpoints(e)?;
        let new_edge = mutate::redirect_edge_and_branch(self.cfg, e, dup);
        self.verify_redirect(src, dup, new_edge);
        self.pending.flush_pending_stmts(self.cfg, new_edge);
        if let Some(d) = self.cfg.edge_weight_mut(new_edge) {
            d.aux = None;
        }
        self.stats.record_duplicate();
        self.stats.record_jump_threaded();
        Some(dup)
    }
}

impl crate::threading::JumpThreadEdge {
    /// Re-kind this step as `CopySrcBlock` for use as the index-1 step of a
    /// synthesized two-step path.
    fn into_no_copy(self) -> Self {
        Self { edge: self.edge, kind: crate::threading::EdgeStepKind::CopySrcBlock }
    }
}
