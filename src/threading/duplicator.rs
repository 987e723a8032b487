//! Block duplicator: template-based cloning so duplicating `k` paths into a
//! block costs `O(k + successors)` edge operations instead of
//! `O(k * successors)`.

use crate::cfg::mutate::{duplicate_block, remove_ctrl_stmt_and_useless_edges};
use crate::cfg::{Cfg, NodeIndex};

/// Create the template for `bb`: a duplicate with no outgoing edges and no
/// control statement. Exactly one of these is created per block being
/// threaded.
pub fn create_template(cfg: &mut Cfg, bb: NodeIndex) -> NodeIndex {
    let template = duplicate_block(cfg, bb);
    remove_ctrl_stmt_and_useless_edges(cfg, template, None);
    template
}

/// Clone a further duplicate from the (already-stripped) template rather
/// than the original block.
pub fn clone_from_template(cfg: &mut Cfg, template: NodeIndex) -> NodeIndex {
    duplicate_block(cfg, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{BasicBlock, BlockKind, EdgeData, EdgeType, Terminator};
    use petgraph::Direction;

    fn branchy_cfg() -> (Cfg, NodeIndex) {
        let mut g = Cfg::new();
        let mut b = BasicBlock::new(
            0,
            BlockKind::Normal,
            Terminator::SwitchInt { targets: vec![1], otherwise: 2 },
        );
        b.statements = vec!["stmt".into()];
        let bb = g.add_node(b);
        let t1 = g.add_node(BasicBlock::new(1, BlockKind::Exit, Terminator::Return));
        let t2 = g.add_node(BasicBlock::new(2, BlockKind::Exit, Terminator::Return));
        g.add_edge(bb, t1, EdgeData::new(EdgeType::TrueBranch));
        g.add_edge(bb, t2, EdgeData::new(EdgeType::FalseBranch));
        (g, bb)
    }

    #[test]
    fn template_has_no_outgoing_edges_or_control_stmt() {
        let (mut g, bb) = branchy_cfg();
        let template = create_template(&mut g, bb);
        assert_eq!(g.edges_directed(template, Direction::Outgoing).count(), 0);
        assert_eq!(g[template].terminator, Terminator::Unreachable);
        assert_eq!(g[template].statements, vec!["stmt".to_string()]);
    }

    #[test]
    fn clone_from_template_is_cheap_and_edgeless() {
        let (mut g, bb) = branchy_cfg();
        let template = create_template(&mut g, bb);
        let dup = clone_from_template(&mut g, template);
        assert_eq!(g.edges_directed(dup, Direction::Outgoing).count(), 0);
        assert_ne!(dup, template);
    }
}
