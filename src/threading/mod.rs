//! Jump-threading update engine: physically rewrites the CFG/SSA graph so
//! selected incoming edges to a conditional block bypass that block's
//! branching decision.
//!
//! [`Engine`] bundles the mutable collaborators every phase needs (the CFG
//! itself, the loop tree, the pending-statement queue, and the run's
//! statistics) so the phase modules below can each carry one focused `impl`
//! block rather than threading four parameters through every function.

pub mod driver;
pub mod duplicator;
pub mod error;
pub mod loop_header;
pub mod path;
pub mod phi;
pub mod prevalidate;
pub mod profile;
pub mod redirect_engine;
pub mod redirection;
pub mod stats;

pub use path::{DebugCounter, EdgeStepKind, JumpThreadEdge, Path, PathStore, ThreadMode};
pub use stats::Stats;

use crate::cfg::loops::LoopTree;
use crate::cfg::Cfg;
use crate::ssa::PendingStmts;

/// The threading engine's working set for one function compilation: process-
/// wide machinery scoped down to a single function's collaborators.
pub struct Engine<'a> {
    pub cfg: &'a mut Cfg,
    pub loops: &'a mut LoopTree,
    pub pending: &'a mut PendingStmts,
    pub stats: &'a mut Stats,
}

impl<'a> Engine<'a> {
    pub fn new(
        cfg: &'a mut Cfg,
        loops: &'a mut LoopTree,
        pending: &'a mut PendingStmts,
        stats: &'a mut Stats,
    ) -> Self {
        Self { cfg, loops, pending, stats }
    }

    /// `loop_father`/`is_loop_header` convenience: the loop this node is the
    /// (still-valid) header of, if any.
    pub(crate) fn header_loop_id(&self, node: crate::cfg::NodeIndex) -> Option<crate::cfg::loops::LoopId> {
        self.loops
            .loops()
            .iter()
            .enumerate()
            .find(|(_, l)| l.is_valid() && l.header == Some(node))
            .map(|(i, _)| i)
    }

    /// External dominator-invalidation hook: the dominator tree is an
    /// external collaborator this engine only calls through, never owns.
    pub(crate) fn invalidate_dominators(&self) {
        tracing::trace!("dominator info invalidated");
    }
}
