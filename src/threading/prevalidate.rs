//! Path pre-validator: the gate between path registration and the
//! redirection engine. Every registered path is checked here before it is
//! allowed to annotate an edge; paths that fail are cancelled (dropped
//! outright) or trimmed (shortened to the prefix that still passes) rather
//! than threaded as originally recorded.

use crate::cfg::loops::LoopTree;
use crate::cfg::{Cfg, NodeIndex};
use crate::threading::{Path, Stats, ThreadMode};
use std::collections::HashSet;

/// Validate every path in `paths`, attach the survivors to their start
/// edge's `aux` slot, and return the set of blocks that gained at least one
/// annotated incoming edge — the driver's worklist for
/// [`super::Engine::thread_block`].
pub fn mark_threaded_blocks(
    cfg: &mut Cfg,
    paths: Vec<Path>,
    loops: &LoopTree,
    stats: &mut Stats,
    optimize_for_size: bool,
) -> HashSet<NodeIndex> {
    let mut threaded = HashSet::new();

    for mut path in paths {
        let Some((_, bb)) = cfg.edge_endpoints(path.start_edge()) else { continue };

        if optimize_for_size && path.len() > 2 {
            stats.paths_cancelled_size_opt += 1;
            continue;
        }

        match trim_multi_loop(cfg, loops, &mut path) {
            MultiLoopOutcome::Unchanged => {}
            MultiLoopOutcome::Trimmed => stats.paths_trimmed_multi_loop += 1,
            MultiLoopOutcome::Cancelled => {
                stats.paths_cancelled_multi_loop += 1;
                continue;
            }
        }

        if path.mode() == ThreadMode::Joiner && !phi_args_agree(cfg, &path) {
            stats.paths_cancelled_joiner_phi += 1;
            continue;
        }

        let start_edge = path.start_edge();
        if let Some(d) = cfg.edge_weight_mut(start_edge) {
            d.aux = Some(Box::new(path));
            threaded.insert(bb);
        }
    }

    threaded
}

enum MultiLoopOutcome {
    Unchanged,
    Trimmed,
    Cancelled,
}

/// Multi-loop trimming: a path may legally cross into at most one loop
/// different from the one its start block lives in. A path that
/// would cross into a second *different* loop is truncated to the last step
/// still inside the first new loop (or the loop it started in); if nothing
/// of the path survives that truncation, the whole path is cancelled.
fn trim_multi_loop(cfg: &Cfg, loops: &LoopTree, path: &mut Path) -> MultiLoopOutcome {
    let Some((_, start_block)) = cfg.edge_endpoints(path.start_edge()) else {
        return MultiLoopOutcome::Cancelled;
    };

    let mut seen: Vec<_> = loops.loop_father(start_block).into_iter().collect();
    let mut cut_at = None;

    for (idx, step) in path.steps().iter().enumerate().skip(1) {
        let Some((_, target)) = cfg.edge_endpoints(step.edge) else { continue };
        let Some(father) = loops.loop_father(target) else { continue };
        if seen.contains(&father) {
            continue;
        }
        if seen.len() >= 2 {
            cut_at = Some(idx);
            break;
        }
        seen.push(father);
    }

    match cut_at {
        None => MultiLoopOutcome::Unchanged,
        Some(idx) if idx >= 2 => {
            path.truncate(idx);
            if path.steps().last().is_some_and(|s| s.kind.is_joiner()) {
                MultiLoopOutcome::Cancelled
            } else {
                MultiLoopOutcome::Trimmed
            }
        }
        Some(_) => MultiLoopOutcome::Cancelled,
    }
}

/// For a joiner path, if its joiner block `J` has a direct edge to the
/// path's final destination `S2`, every φ in `S2` must agree on the value
/// flowing in from that direct edge and the value flowing in from the
/// path's final edge — otherwise threading would introduce a wrong value.
fn phi_args_agree(cfg: &Cfg, path: &Path) -> bool {
    let joiner_edge = path.steps()[1].edge;
    let Some((joiner_source, _)) = cfg.edge_endpoints(joiner_edge) else { return false };

    let final_step = path.final_edge();
    let Some((_, s2)) = cfg.edge_endpoints(final_step.edge) else { return false };

    let Some(direct_edge) = cfg.find_edge(joiner_source, s2) else { return true };

    cfg.node_weight(s2).map_or(true, |b| {
        b.phis.iter().all(|phi| match (phi.arg(direct_edge), phi.arg(final_step.edge)) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        })
    })
}
