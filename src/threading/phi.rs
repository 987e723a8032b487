//! φ-argument propagation.

use crate::cfg::{Cfg, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// For every φ in `block`, read the argument on `src_edge` and write it
/// (same value, same source location) onto `tgt_edge`.
pub fn copy_phi_args(cfg: &mut Cfg, block: NodeIndex, src_edge: EdgeIndex, tgt_edge: EdgeIndex) {
    let Some(b) = cfg.node_weight_mut(block) else { return };
    for phi in b.phis.iter_mut() {
        if let Some(arg) = phi.arg(src_edge).cloned() {
            phi.set_arg(tgt_edge, arg);
        }
    }
}

/// For every successor `S` of `orig_block`, find the parallel edge
/// `new_block -> S` and propagate φ-arguments from `orig_block -> S` onto
/// it.
pub fn update_destination_phis(cfg: &mut Cfg, orig_block: NodeIndex, new_block: NodeIndex) {
    let successors: Vec<(NodeIndex, EdgeIndex)> = cfg
        .edges_directed(orig_block, Direction::Outgoing)
        .map(|e| (e.target(), e.id()))
        .collect();

    for (succ, orig_edge) in successors {
        if let Some(new_edge) = cfg.find_edge(new_block, succ) {
            copy_phi_args(cfg, succ, orig_edge, new_edge);
        }
    }
}
