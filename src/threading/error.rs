//! Internal assertions: invariant violations that are never expected to
//! happen. These are not recoverable errors for callers to handle — the
//! engine surfaces them as a typed panic payload so a failure message names
//! the exact invariant that broke, aborting at exactly the points where a
//! broken invariant can no longer be contained: after edge redirection, and
//! after preheader creation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreadingBug {
    #[error("redirect_edge_and_branch returned edge {got:?}, expected it to stay at {expected:?}")]
    RedirectMovedEdge { expected: crate::cfg::EdgeIndex, got: crate::cfg::EdgeIndex },

    #[error("create_preheader produced a header with no out-of-loop predecessor")]
    PreheaderMissingEntry,

    #[error("phi arity mismatch in block {block:?}: {arity} args for {preds} predecessors")]
    PhiArityMismatch { block: crate::cfg::NodeIndex, arity: usize, preds: usize },
}

/// Panic with a [`ThreadingBug`]: fatal, never expected in normal operation.
pub fn bug(e: ThreadingBug) -> ! {
    panic!("jump-threading internal invariant violated: {e}");
}
