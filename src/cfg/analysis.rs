//! CFG analysis: entry/exit detection, degree queries

use crate::cfg::{BlockKind, Cfg, NodeIndex, Terminator};

/// Find the entry node of a CFG.
///
/// Prefers the block explicitly marked [`BlockKind::Entry`]; falls back to
/// the lowest live node index (duplication never removes the original entry,
/// so this only matters for hand-built fixtures that skip `BlockKind`).
/// Returns `None` if the CFG is empty.
pub fn find_entry(cfg: &Cfg) -> Option<NodeIndex> {
    cfg.node_indices()
        .find(|&idx| cfg[idx].kind == BlockKind::Entry)
        .or_else(|| cfg.node_indices().next())
}

/// Find all exit nodes in a CFG.
///
/// Exits are blocks that terminate execution:
/// - Return terminators
/// - Unreachable terminators
/// - Abort terminators (panics)
///
/// Functions can have multiple exits due to early returns, panic paths, or
/// different error-handling exit points.
pub fn find_exits(cfg: &Cfg) -> Vec<NodeIndex> {
    cfg.node_indices().filter(|&idx| is_exit_block(cfg, idx)).collect()
}

/// Check if a block is an exit block.
pub fn is_exit_block(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    if let Some(block) = cfg.node_weight(block_idx) {
        return matches!(
            &block.terminator,
            Terminator::Return | Terminator::Unreachable | Terminator::Abort(_)
        );
    }
    false
}

/// Get the [`BlockKind`] of a node.
pub fn get_block_kind(cfg: &Cfg, block_idx: NodeIndex) -> Option<BlockKind> {
    cfg.node_weight(block_idx).map(|b| b.kind)
}

/// Count incoming edges to a node.
pub fn in_degree(cfg: &Cfg, block_idx: NodeIndex) -> usize {
    cfg.edges_directed(block_idx, petgraph::Direction::Incoming).count()
}

/// Count outgoing edges from a node.
pub fn out_degree(cfg: &Cfg, block_idx: NodeIndex) -> usize {
    cfg.edges_directed(block_idx, petgraph::Direction::Outgoing).count()
}

/// Check if a node is a merge point (multiple incoming edges).
pub fn is_merge_point(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    in_degree(cfg, block_idx) > 1
}

/// Check if a node is a branch point (multiple outgoing edges).
pub fn is_branch_point(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    out_degree(cfg, block_idx) > 1
}

/// True if `block_idx` has exactly one predecessor edge.
pub fn single_pred_p(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    in_degree(cfg, block_idx) == 1
}

/// True if `block_idx` has exactly one successor edge.
pub fn single_succ_p(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    out_degree(cfg, block_idx) == 1
}

/// True if the block has no statements and no φs — a "pure redirection
/// block", cheap to thread through because nothing needs duplicating.
pub fn empty_block_p(cfg: &Cfg, block_idx: NodeIndex) -> bool {
    cfg.node_weight(block_idx).map_or(true, |b| b.statements.is_empty() && b.phis.is_empty())
}

/// All nodes reachable from `start`, including `start` itself.
pub fn reachable_from(cfg: &Cfg, start: NodeIndex) -> std::collections::HashSet<NodeIndex> {
    let mut seen = std::collections::HashSet::new();
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        for succ in cfg.neighbors_directed(node, petgraph::Direction::Outgoing) {
            if !seen.contains(&succ) {
                stack.push(succ);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{BasicBlock, EdgeData, EdgeType};

    fn create_test_cfg() -> Cfg {
        let mut g = Cfg::new();

        let b0 = g.add_node(BasicBlock::new(0, BlockKind::Entry, Terminator::Goto { target: 1 }));
        let b1 = g.add_node(BasicBlock::new(
            1,
            BlockKind::Normal,
            Terminator::SwitchInt { targets: vec![2], otherwise: 3 },
        ));
        let b2 = g.add_node(BasicBlock::new(2, BlockKind::Exit, Terminator::Return));
        let b3 = g.add_node(BasicBlock::new(3, BlockKind::Exit, Terminator::Return));

        g.add_edge(b0, b1, EdgeData::new(EdgeType::Fallthrough));
        g.add_edge(b1, b2, EdgeData::new(EdgeType::TrueBranch));
        g.add_edge(b1, b3, EdgeData::new(EdgeType::FalseBranch));

        g
    }

    #[test]
    fn test_find_entry() {
        let cfg = create_test_cfg();
        let entry = find_entry(&cfg);
        assert!(entry.is_some());
        assert_eq!(cfg[entry.unwrap()].id, 0);
    }

    #[test]
    fn test_find_exits() {
        let cfg = create_test_cfg();
        let exits = find_exits(&cfg);
        assert_eq!(exits.len(), 2);
        let exit_ids: Vec<_> = exits.iter().map(|&idx| cfg[idx].id).collect();
        assert!(exit_ids.contains(&2));
        assert!(exit_ids.contains(&3));
    }

    #[test]
    fn test_is_branch_and_merge_point() {
        let mut g = Cfg::new();
        let b0 = g.add_node(BasicBlock::new(
            0,
            BlockKind::Entry,
            Terminator::SwitchInt { targets: vec![1], otherwise: 2 },
        ));
        let b1 = g.add_node(BasicBlock::new(1, BlockKind::Normal, Terminator::Goto { target: 3 }));
        let b2 = g.add_node(BasicBlock::new(2, BlockKind::Normal, Terminator::Goto { target: 3 }));
        let b3 = g.add_node(BasicBlock::new(3, BlockKind::Exit, Terminator::Return));

        g.add_edge(b0, b1, EdgeData::new(EdgeType::TrueBranch));
        g.add_edge(b0, b2, EdgeData::new(EdgeType::FalseBranch));
        g.add_edge(b1, b3, EdgeData::new(EdgeType::Fallthrough));
        g.add_edge(b2, b3, EdgeData::new(EdgeType::Fallthrough));

        assert!(is_branch_point(&g, b0));
        assert!(!is_merge_point(&g, b0));
        assert!(is_merge_point(&g, b3));
        assert!(single_pred_p(&g, b1));
        assert!(!single_pred_p(&g, b3));
        assert!(single_succ_p(&g, b1));
    }

    #[test]
    fn test_empty_cfg() {
        let cfg: Cfg = Cfg::new();
        assert!(find_entry(&cfg).is_none());
        assert!(find_exits(&cfg).is_empty());
    }

    #[test]
    fn test_reachable_from_excludes_unreachable() {
        let mut g = Cfg::new();
        let b0 = g.add_node(BasicBlock::new(0, BlockKind::Entry, Terminator::Goto { target: 1 }));
        let b1 = g.add_node(BasicBlock::new(1, BlockKind::Exit, Terminator::Return));
        let _unreachable = g.add_node(BasicBlock::new(2, BlockKind::Exit, Terminator::Unreachable));
        g.add_edge(b0, b1, EdgeData::new(EdgeType::Fallthrough));

        let reach = reachable_from(&g, b0);
        assert_eq!(reach.len(), 2);
        assert!(reach.contains(&b0));
        assert!(reach.contains(&b1));
    }
}
