//! Profile counters: `edge_frequency`, `BB_FREQ_MAX`,
//! `update_bb_profile_for_threading`.

use crate::cfg::{Cfg, EdgeData, NodeIndex};

/// Ceiling branch probabilities and block frequencies are expressed out of.
pub const BB_FREQ_MAX: u32 = 10_000;

/// The edge's execution count, already profile data rather than something
/// derived from probability * block frequency (this engine keeps counts
/// directly on `EdgeData`).
pub fn edge_frequency(edge: &EdgeData) -> u64 {
    edge.count
}

/// Set a duplicate's probability to the ceiling and its count to `count`,
/// as plain-path wiring does for the duplicate's sole outgoing edge.
pub fn saturate_probability(edge: &mut EdgeData, count: u64) {
    edge.probability = BB_FREQ_MAX;
    edge.count = count;
}

/// When the first thread-step's source is the block itself (a nested thread
/// starting where we're currently threading out from), subtract the
/// frequency that is about to leave along the thread from the block's own
/// counters so its profile doesn't double-count the threaded-out
/// executions.
pub fn update_bb_profile_for_threading(cfg: &mut Cfg, block: NodeIndex, threaded_out_count: u64) {
    if let Some(b) = cfg.node_weight_mut(block) {
        b.count = b.count.saturating_sub(threaded_out_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{BasicBlock, BlockKind, EdgeType, Terminator};

    #[test]
    fn update_bb_profile_subtracts_threaded_frequency() {
        let mut g = Cfg::new();
        let b = g.add_node(BasicBlock::new(0, BlockKind::Normal, Terminator::Return));
        g[b].count = 100;
        update_bb_profile_for_threading(&mut g, b, 40);
        assert_eq!(g[b].count, 60);
    }

    #[test]
    fn update_bb_profile_saturates_at_zero() {
        let mut g = Cfg::new();
        let b = g.add_node(BasicBlock::new(0, BlockKind::Normal, Terminator::Return));
        g[b].count = 10;
        update_bb_profile_for_threading(&mut g, b, 100);
        assert_eq!(g[b].count, 0);
    }

    #[test]
    fn saturate_probability_sets_ceiling() {
        let mut e = EdgeData::new(EdgeType::Fallthrough);
        saturate_probability(&mut e, 7);
        assert_eq!(e.probability, BB_FREQ_MAX);
        assert_eq!(e.count, 7);
    }
}
