//! CFG mutation primitives: block duplication, edge redirection, edge
//! splitting, and preheader/forwarder synthesis. The threading engine calls
//! these; it never reaches into `petgraph` directly.

use crate::cfg::{BasicBlock, BlockId, Cfg, EdgeData, EdgeType, NodeIndex, Terminator};
use crate::cfg::{EdgeIndex, find_node_by_block_id, fresh_block_id};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// Add a fresh edge `from -> to` of the given kind, with zero profile data.
pub fn make_edge(cfg: &mut Cfg, from: NodeIndex, to: NodeIndex, kind: EdgeType) -> EdgeIndex {
    cfg.add_edge(from, to, EdgeData::new(kind))
}

/// Find the edge `from -> to`, if one exists. CFGs in this engine's domain
/// never have parallel edges between the same pair of blocks, so there is
/// at most one.
pub fn find_edge(cfg: &Cfg, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
    cfg.find_edge(from, to)
}

/// Remove `edge` from the graph, returning its data.
pub fn remove_edge(cfg: &mut Cfg, edge: EdgeIndex) -> Option<EdgeData> {
    cfg.remove_edge(edge)
}

/// Retarget `e` to `new_target`, updating the source block's terminator to
/// branch there instead of the old target. `petgraph` has no in-place
/// retarget, so this removes and re-adds the edge; callers must treat the
/// returned `EdgeIndex` as the edge's new identity — callers that expect
/// redirection not to move the edge to a different slot than they just
/// asked for check that with a fatal assertion of their own.
pub fn redirect_edge_and_branch(cfg: &mut Cfg, edge: EdgeIndex, new_target: NodeIndex) -> EdgeIndex {
    let (src, old_target) = cfg.edge_endpoints(edge).expect("redirect_edge_and_branch: dangling edge");
    let old_id = cfg[old_target].id;
    let new_id = cfg[new_target].id;
    let data = cfg.remove_edge(edge).expect("redirect_edge_and_branch: dangling edge");
    let new_edge = cfg.add_edge(src, new_target, data);
    retarget_terminator(&mut cfg[src], old_id, new_id);
    new_edge
}

fn retarget_terminator(block: &mut BasicBlock, old_id: BlockId, new_id: BlockId) {
    match &mut block.terminator {
        Terminator::Goto { target } => {
            if *target == old_id {
                *target = new_id;
            }
        }
        Terminator::SwitchInt { targets, otherwise } => {
            for t in targets.iter_mut() {
                if *t == old_id {
                    *t = new_id;
                }
            }
            if *otherwise == old_id {
                *otherwise = new_id;
            }
        }
        Terminator::Call { target, unwind } => {
            if *target == Some(old_id) {
                *target = Some(new_id);
            }
            if *unwind == Some(old_id) {
                *unwind = Some(new_id);
            }
        }
        Terminator::Return | Terminator::Unreachable | Terminator::Abort(_) => {}
    }
}

/// Clone `bb`'s statements, terminator and outgoing edges (edge `aux`
/// cleared, frequency/count zeroed — the duplicate is unreachable until the
/// engine wires predecessors into it) onto a fresh node. The duplicate
/// starts with no φ-nodes of its own: it has no predecessors yet, and the
/// engine's φ propagator (`threading::phi`) seeds them once a predecessor
/// edge is actually redirected here.
pub fn duplicate_block(cfg: &mut Cfg, bb: NodeIndex) -> NodeIndex {
    let new_id = fresh_block_id(cfg);
    let src = &cfg[bb];
    let mut copy = BasicBlock::bare(new_id, src.kind);
    copy.statements = src.statements.clone();
    copy.terminator = src.terminator.clone();
    copy.source_location = src.source_location.clone();
    let new_node = cfg.add_node(copy);

    let outgoing: Vec<(NodeIndex, EdgeType, u32)> = cfg
        .edges_directed(bb, Direction::Outgoing)
        .map(|e| (e.target(), e.weight().kind, e.weight().probability))
        .collect();
    for (target, kind, probability) in outgoing {
        cfg.add_edge(new_node, target, EdgeData::with_profile(kind, probability, 0));
    }
    new_node
}

/// Drop the terminating branch/switch and every successor edge except the
/// one targeting `keep`. `keep = None` drops every successor (the block
/// becomes a dead end until the caller wires a new one).
pub fn remove_ctrl_stmt_and_useless_edges(cfg: &mut Cfg, bb: NodeIndex, keep: Option<NodeIndex>) {
    let to_remove: Vec<EdgeIndex> = cfg
        .edges_directed(bb, Direction::Outgoing)
        .filter(|e| Some(e.target()) != keep)
        .map(|e| e.id())
        .collect();
    for edge in to_remove {
        cfg.remove_edge(edge);
    }
    cfg[bb].terminator = match keep {
        Some(target) => Terminator::Goto { target: cfg[target].id },
        None => Terminator::Unreachable,
    };
}

/// Insert a fresh empty block in the middle of `e`, preserving `e`'s
/// kind/profile on the first half and giving the second half a plain
/// fall-through. Returns the new block.
pub fn split_edge(cfg: &mut Cfg, edge: EdgeIndex) -> NodeIndex {
    let (src, dst) = cfg.edge_endpoints(edge).expect("split_edge: dangling edge");
    let data = cfg.remove_edge(edge).expect("split_edge: dangling edge");
    let new_id = fresh_block_id(cfg);
    let mid = cfg.add_node(BasicBlock::new(new_id, crate::cfg::BlockKind::Normal, Terminator::Goto {
        target: cfg[dst].id,
    }));
    let dst_id = cfg[dst].id;
    retarget_terminator(&mut cfg[src], cfg[dst].id, cfg[mid].id);
    cfg.add_edge(src, mid, data);
    cfg.add_edge(mid, dst, EdgeData::new(EdgeType::Fallthrough));
    debug_assert_eq!(cfg[mid].terminator, Terminator::Goto { target: dst_id });
    mid
}

/// Split every edge entering `header` from outside `body` into a single new
/// preheader block, merging them so the loop keeps a unique entry. Panics
/// (an internal-bug assertion) if the header has no out-of-loop predecessor
/// to split.
pub fn create_preheader(
    cfg: &mut Cfg,
    header: NodeIndex,
    body: &std::collections::HashSet<NodeIndex>,
) -> NodeIndex {
    let entry_edges: Vec<EdgeIndex> = cfg
        .edges_directed(header, Direction::Incoming)
        .filter(|e| !body.contains(&e.source()))
        .map(|e| e.id())
        .collect();
    if entry_edges.is_empty() {
        crate::threading::error::bug(crate::threading::error::ThreadingBug::PreheaderMissingEntry);
    }

    // Route the first entry edge through a fresh block, then redirect the
    // rest of the entries onto that same block so there is exactly one.
    let first = entry_edges[0];
    let preheader = split_edge(cfg, first);
    for &edge in &entry_edges[1..] {
        redirect_edge_and_branch(cfg, edge, preheader);
    }
    preheader
}

/// Create an empty block whose only job is to fall through to `dest`, and
/// redirect every current predecessor of `dest` that is in `redirect` onto
/// it. Used to synthesize a fresh single-successor latch when peeling a
/// loop header.
pub fn make_forwarder_block(cfg: &mut Cfg, dest: NodeIndex, redirect: &[EdgeIndex]) -> NodeIndex {
    let new_id = fresh_block_id(cfg);
    let forwarder = cfg.add_node(BasicBlock::new(
        new_id,
        crate::cfg::BlockKind::Normal,
        Terminator::Goto { target: cfg[dest].id },
    ));
    cfg.add_edge(forwarder, dest, EdgeData::new(EdgeType::Fallthrough));
    for &edge in redirect {
        redirect_edge_and_branch(cfg, edge, forwarder);
    }
    forwarder
}

/// Convenience: look up a block by id and duplicate it.
pub fn duplicate_block_by_id(cfg: &mut Cfg, block_id: BlockId) -> Option<NodeIndex> {
    let node = find_node_by_block_id(cfg, block_id)?;
    Some(duplicate_block(cfg, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::BlockKind;

    fn linear_cfg() -> (Cfg, NodeIndex, NodeIndex, NodeIndex) {
        let mut g = Cfg::new();
        let a = g.add_node(BasicBlock::new(0, BlockKind::Entry, Terminator::Goto { target: 1 }));
        let b = g.add_node(BasicBlock::new(1, BlockKind::Normal, Terminator::Return));
        let c = g.add_node(BasicBlock::new(2, BlockKind::Normal, Terminator::Return));
        g.add_edge(a, b, EdgeData::new(EdgeType::Fallthrough));
        (g, a, b, c)
    }

    #[test]
    fn duplicate_block_clears_aux_and_zeroes_profile() {
        let (mut g, _a, b, c) = linear_cfg();
        g[b].terminator = Terminator::Goto { target: g[c].id };
        let bc = g.add_edge(b, c, EdgeData::new(EdgeType::Fallthrough));
        g[bc].aux = Some(Box::new(crate::threading::path::Path::new(0)));
        g[bc].count = 42;

        let dup = duplicate_block(&mut g, b);
        assert_eq!(g[dup].frequency, 0);
        assert_eq!(g[dup].count, 0);
        assert!(g.edges_directed(dup, Direction::Outgoing).all(|e| e.weight().aux.is_none()));
    }

    #[test]
    fn redirect_edge_and_branch_updates_terminator() {
        let (mut g, a, b, c) = linear_cfg();
        let e = find_edge(&g, a, b).unwrap();
        let new_edge = redirect_edge_and_branch(&mut g, e, c);
        assert_eq!(g.edge_endpoints(new_edge).unwrap(), (a, c));
        assert_eq!(g[a].terminator, Terminator::Goto { target: g[c].id });
    }

    #[test]
    fn split_edge_inserts_fallthrough_block() {
        let (mut g, a, b, _c) = linear_cfg();
        let e = find_edge(&g, a, b).unwrap();
        let mid = split_edge(&mut g, e);
        assert!(find_edge(&g, a, mid).is_some());
        assert!(find_edge(&g, mid, b).is_some());
        assert!(find_edge(&g, a, b).is_none());
        assert_eq!(g[a].terminator, Terminator::Goto { target: g[mid].id });
    }

    #[test]
    fn remove_ctrl_stmt_and_useless_edges_keeps_only_selected_target() {
        let mut g = Cfg::new();
        let h = g.add_node(BasicBlock::new(
            0,
            BlockKind::Normal,
            Terminator::SwitchInt { targets: vec![1], otherwise: 2 },
        ));
        let t1 = g.add_node(BasicBlock::new(1, BlockKind::Exit, Terminator::Return));
        let t2 = g.add_node(BasicBlock::new(2, BlockKind::Exit, Terminator::Return));
        g.add_edge(h, t1, EdgeData::new(EdgeType::TrueBranch));
        g.add_edge(h, t2, EdgeData::new(EdgeType::FalseBranch));

        remove_ctrl_stmt_and_useless_edges(&mut g, h, Some(t1));
        assert_eq!(g.edges_directed(h, Direction::Outgoing).count(), 1);
        assert!(find_edge(&g, h, t1).is_some());
        assert!(find_edge(&g, h, t2).is_none());
        assert_eq!(g[h].terminator, Terminator::Goto { target: g[t1].id });
    }

    #[test]
    fn remove_ctrl_stmt_and_useless_edges_with_no_keep_is_unreachable() {
        let mut g = Cfg::new();
        let h = g.add_node(BasicBlock::new(
            0,
            BlockKind::Normal,
            Terminator::SwitchInt { targets: vec![1], otherwise: 2 },
        ));
        let t1 = g.add_node(BasicBlock::new(1, BlockKind::Exit, Terminator::Return));
        g.add_edge(h, t1, EdgeData::new(EdgeType::TrueBranch));

        remove_ctrl_stmt_and_useless_edges(&mut g, h, None);
        assert_eq!(g.edges_directed(h, Direction::Outgoing).count(), 0);
        assert_eq!(g[h].terminator, Terminator::Unreachable);
    }
}
