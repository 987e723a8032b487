//! SSA φ-node model for the threading engine.
//!
//! A real mid-level IR keeps one φ-argument slot per predecessor edge,
//! indexed positionally and kept in sync whenever a block's predecessor list
//! changes. This engine instead keys each φ's arguments directly by the
//! `EdgeIndex` of the predecessor edge they belong to: the bijection between
//! φ-argument positions and predecessor edges is then a property we can
//! check directly (`PhiNode::arity_matches`) rather than something we have
//! to maintain by keeping a Vec's positions in lockstep with edge insertion
//! order.

use crate::cfg::{EdgeIndex, SourceLocation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One argument of a φ-node: the value flowing in on a specific predecessor
/// edge, plus the source location it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhiArg {
    pub value: String,
    pub source_location: Option<SourceLocation>,
}

impl PhiArg {
    pub fn new(value: impl Into<String>, source_location: Option<SourceLocation>) -> Self {
        Self { value: value.into(), source_location }
    }
}

/// A φ-node: one SSA name merged at a block, with one argument per
/// predecessor edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhiNode {
    pub name: String,
    #[serde(skip)]
    args: HashMap<EdgeIndex, PhiArg>,
}

impl PhiNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: HashMap::new() }
    }

    /// Read the argument on a given predecessor edge.
    pub fn arg(&self, edge: EdgeIndex) -> Option<&PhiArg> {
        self.args.get(&edge)
    }

    /// Write (or overwrite) the argument on a given predecessor edge.
    pub fn set_arg(&mut self, edge: EdgeIndex, arg: PhiArg) {
        self.args.insert(edge, arg);
    }

    /// Remove the argument for a predecessor edge that is no longer a
    /// predecessor (the edge was redirected elsewhere or removed).
    pub fn remove_arg(&mut self, edge: EdgeIndex) -> Option<PhiArg> {
        self.args.remove(&edge)
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.args.keys().copied()
    }

    /// Whether the number of arguments equals the number of predecessor
    /// edges of the block this φ lives in.
    pub fn arity_matches(&self, pred_count: usize) -> bool {
        self.arity() == pred_count
    }
}

/// Statements queued on an edge, to be materialized once the edge's
/// destination exists (e.g. a block created by `split_edge`). This engine's
/// paths never produce new statement text to attach to an edge, so the queue
/// is normally empty; the mechanism exists because the redirection engine
/// calls `flush_pending_stmts` after every `redirect_edge_and_branch`, and a
/// future producer needs somewhere to put statements ahead of that call.
#[derive(Debug, Default)]
pub struct PendingStmts {
    queued: HashMap<EdgeIndex, Vec<String>>,
}

impl PendingStmts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, edge: EdgeIndex, stmt: impl Into<String>) {
        self.queued.entry(edge).or_default().push(stmt.into());
    }

    /// Move any statements queued on `edge` onto `dest`'s statement list and
    /// clear the queue.
    pub fn flush_pending_stmts(&mut self, cfg: &mut crate::cfg::Cfg, edge: EdgeIndex) {
        let Some(stmts) = self.queued.remove(&edge) else { return };
        if stmts.is_empty() {
            return;
        }
        if let Some((_, dest)) = cfg.edge_endpoints(edge) {
            if let Some(block) = cfg.node_weight_mut(dest) {
                block.statements.extend(stmts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::stable_graph::EdgeIndex as Idx;

    #[test]
    fn phi_arity_matches_predecessor_count() {
        let mut phi = PhiNode::new("x");
        assert!(phi.arity_matches(0));
        phi.set_arg(Idx::new(0), PhiArg::new("1", None));
        phi.set_arg(Idx::new(1), PhiArg::new("2", None));
        assert!(phi.arity_matches(2));
        assert!(!phi.arity_matches(1));
    }

    #[test]
    fn remove_arg_drops_exactly_one_entry() {
        let mut phi = PhiNode::new("x");
        phi.set_arg(Idx::new(0), PhiArg::new("1", None));
        phi.set_arg(Idx::new(1), PhiArg::new("2", None));
        assert!(phi.remove_arg(Idx::new(0)).is_some());
        assert!(phi.arity_matches(1));
        assert_eq!(phi.arg(Idx::new(1)).unwrap().value, "2");
    }
}
