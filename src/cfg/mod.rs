// CFG/SSA data structures shared by the threading engine and its CLI.
//
// `Cfg` is a `StableDiGraph` rather than the plain `DiGraph` a read-only CFG
// toolkit would use: the threading engine adds and removes blocks and edges
// continuously, and a plain `DiGraph` swap-removes on delete, silently
// reassigning another edge's index. `StableDiGraph` tombstones instead, so an
// `EdgeIndex`/`NodeIndex` a `Path` captured earlier stays meaningful for as
// long as the thing it names is still alive.

pub mod analysis;
pub mod dominators;
pub mod edge;
pub mod export;
pub mod loops;
pub mod mutate;
pub mod source;

pub use analysis::{find_entry, find_exits};
pub use dominators::DominatorTree;
pub use edge::EdgeType;
pub use export::{export_dot, export_json, CfgExport};
pub use loops::{LoopId, LoopTree, NaturalLoop};
pub use source::SourceLocation;

use crate::ssa::PhiNode;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};

/// Control Flow Graph. Node weights are [`BasicBlock`]s, edge weights are
/// [`EdgeData`] (CFG edge classification plus the profile counters and the
/// jump-thread annotation slot the engine attaches to it).
pub type Cfg = StableDiGraph<BasicBlock, EdgeData>;
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};

/// Block identifier, stable across duplication (unlike [`NodeIndex`], which
/// is only an index into the graph's storage).
pub type BlockId = usize;

/// Basic block in a CFG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Unique identifier within the function.
    pub id: BlockId,
    /// Block kind (entry, normal, exit).
    pub kind: BlockKind,
    /// Statements in this block (simplified to opaque strings: this engine
    /// rewrites control flow, not the statements themselves).
    pub statements: Vec<String>,
    /// Terminator instruction.
    pub terminator: Terminator,
    /// Source location for this block, if known.
    pub source_location: Option<SourceLocation>,
    /// φ-nodes defined at this block, one per merged SSA name.
    pub phis: Vec<PhiNode>,
    /// Profile frequency (out of [`crate::threading::profile::BB_FREQ_MAX`]).
    pub frequency: u32,
    /// Profile execution count.
    pub count: u64,
}

impl BasicBlock {
    /// Convenience constructor for tests and fixtures: a block with a known
    /// terminator but no statements, φs, or profile data.
    pub fn new(id: BlockId, kind: BlockKind, terminator: Terminator) -> Self {
        let mut block = Self::bare(id, kind);
        block.terminator = terminator;
        block
    }

    /// A fresh block with no statements, no terminator wiring, and zeroed
    /// profile — the shape a freshly [`mutate::duplicate_block`]d block has
    /// before the threading engine wires it up.
    pub fn bare(id: BlockId, kind: BlockKind) -> Self {
        Self {
            id,
            kind,
            statements: Vec::new(),
            terminator: Terminator::Unreachable,
            source_location: None,
            phis: Vec::new(),
            frequency: 0,
            count: 0,
        }
    }

    /// Find the φ-node defining `name`, if any.
    pub fn phi_mut(&mut self, name: &str) -> Option<&mut PhiNode> {
        self.phis.iter_mut().find(|p| p.name == name)
    }

    pub fn phi(&self, name: &str) -> Option<&PhiNode> {
        self.phis.iter().find(|p| p.name == name)
    }
}

/// Block classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Entry,
    Normal,
    Exit,
}

/// Terminator instruction (simplified representation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminator {
    Goto { target: BlockId },
    SwitchInt { targets: Vec<BlockId>, otherwise: BlockId },
    Return,
    Unreachable,
    Call { target: Option<BlockId>, unwind: Option<BlockId> },
    Abort(String),
}

/// Per-edge data: CFG classification, profile counters, and the mutable
/// jump-thread annotation slot — a single reference slot per CFG edge that
/// alternately owns a path or is null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub kind: EdgeType,
    /// Branch probability out of [`crate::threading::profile::BB_FREQ_MAX`].
    pub probability: u32,
    /// Profile execution count.
    pub count: u64,
    /// The jump-thread path starting at this edge, if one is registered.
    #[serde(skip)]
    pub aux: Option<Box<crate::threading::path::Path>>,
}

impl EdgeData {
    pub fn new(kind: EdgeType) -> Self {
        Self { kind, probability: 0, count: 0, aux: None }
    }

    pub fn with_profile(kind: EdgeType, probability: u32, count: u64) -> Self {
        Self { kind, probability, count, aux: None }
    }

    pub fn has_path(&self) -> bool {
        self.aux.is_some()
    }
}

/// Find the [`NodeIndex`] for a given [`BlockId`].
pub fn find_node_by_block_id(cfg: &Cfg, block_id: BlockId) -> Option<NodeIndex> {
    cfg.node_indices().find(|&idx| cfg[idx].id == block_id)
}

/// Mint a fresh [`BlockId`] not currently in use by `cfg`.
///
/// CFGs in this engine's domain are small (one function's worth of basic
/// blocks), so a linear scan per call is in line with the rest of the
/// codebase's "simple over premature" choices.
pub fn fresh_block_id(cfg: &Cfg) -> BlockId {
    cfg.node_weights().map(|b| b.id).max().map_or(0, |m| m + 1)
}
