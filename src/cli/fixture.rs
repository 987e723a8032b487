//! JSON fixture format for the CLI: a CFG plus a set of jump-thread paths to
//! register against it. This is the on-disk counterpart of
//! [`crate::cfg::export_json`] — deliberately its own schema rather than a
//! re-parse of `CfgExport`, since `CfgExport`'s terminators/edge kinds are
//! already-formatted display strings, not round-trippable data.

use crate::cfg::loops::LoopTree;
use crate::cfg::{BasicBlock, BlockId, BlockKind, Cfg, EdgeData, EdgeType, Terminator};
use crate::ssa::{PhiArg, PhiNode};
use crate::threading::{EdgeStepKind, JumpThreadEdge, Path, PathStore};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path as FsPath;

#[derive(Debug, Deserialize)]
pub struct ThreadRequest {
    #[serde(default = "default_function_name")]
    pub function_name: String,
    blocks: Vec<BlockFixture>,
    #[serde(default)]
    edges: Vec<EdgeFixture>,
    #[serde(default)]
    paths: Vec<PathFixture>,
}

fn default_function_name() -> String {
    "fn".to_string()
}

#[derive(Debug, Deserialize)]
struct BlockFixture {
    id: BlockId,
    kind: BlockKind,
    #[serde(default)]
    statements: Vec<String>,
    terminator: Terminator,
    #[serde(default)]
    phis: Vec<PhiFixture>,
    #[serde(default)]
    frequency: u32,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct PhiFixture {
    name: String,
    #[serde(default)]
    args: Vec<PhiArgFixture>,
}

#[derive(Debug, Deserialize)]
struct PhiArgFixture {
    from: BlockId,
    value: String,
}

#[derive(Debug, Deserialize)]
struct EdgeFixture {
    from: BlockId,
    to: BlockId,
    kind: EdgeType,
    #[serde(default)]
    probability: u32,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct PathStepFixture {
    from: BlockId,
    to: BlockId,
    kind: EdgeStepKind,
}

#[derive(Debug, Deserialize)]
struct PathFixture {
    #[serde(default)]
    id: u64,
    steps: Vec<PathStepFixture>,
}

impl ThreadRequest {
    pub fn load(path: &FsPath) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing fixture {}", path.display()))
    }

    /// Materialize the live CFG and loop tree, and register every fixture
    /// path into a fresh [`PathStore`].
    pub fn build(&self) -> Result<(Cfg, LoopTree, PathStore)> {
        let mut cfg = Cfg::new();
        let mut node_by_id = HashMap::new();

        for b in &self.blocks {
            let mut block = BasicBlock::bare(b.id, b.kind);
            block.statements = b.statements.clone();
            block.terminator = b.terminator.clone();
            block.frequency = b.frequency;
            block.count = b.count;
            let node = cfg.add_node(block);
            node_by_id.insert(b.id, node);
        }

        let mut edge_by_pair = HashMap::new();
        for e in &self.edges {
            let (Some(&from), Some(&to)) = (node_by_id.get(&e.from), node_by_id.get(&e.to)) else {
                bail!("edge references unknown block ({} -> {})", e.from, e.to);
            };
            let data = EdgeData::with_profile(e.kind, e.probability, e.count);
            let edge = cfg.add_edge(from, to, data);
            edge_by_pair.insert((e.from, e.to), edge);
        }

        for b in &self.blocks {
            let Some(&node) = node_by_id.get(&b.id) else { continue };
            for phi in &b.phis {
                let mut p = PhiNode::new(phi.name.clone());
                for arg in &phi.args {
                    let Some(&edge) = edge_by_pair.get(&(arg.from, b.id)) else {
                        bail!(
                            "phi '{}' in block {} references unknown predecessor {}",
                            phi.name,
                            b.id,
                            arg.from
                        );
                    };
                    p.set_arg(edge, PhiArg::new(arg.value.clone(), None));
                }
                cfg.node_weight_mut(node).expect("just inserted").phis.push(p);
            }
        }

        let loops = LoopTree::build(&cfg);

        let mut store = PathStore::new();
        for (i, p) in self.paths.iter().enumerate() {
            let mut path = Path::new(p.id.max(i as u64));
            for step in &p.steps {
                let Some(&edge) = edge_by_pair.get(&(step.from, step.to)) else {
                    bail!("path step references unknown edge ({} -> {})", step.from, step.to);
                };
                path.push(JumpThreadEdge::new(edge, step.kind));
            }
            store.register(path);
        }

        Ok((cfg, loops, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_diamond_fixture_and_registers_its_path() {
        let json = r#"{
            "function_name": "diamond",
            "blocks": [
                {"id": 0, "kind": "Entry", "terminator": {"Goto": {"target": 1}}},
                {"id": 1, "kind": "Normal", "terminator": {"SwitchInt": {"targets": [2], "otherwise": 3}}},
                {"id": 2, "kind": "Exit", "terminator": "Return"},
                {"id": 3, "kind": "Exit", "terminator": "Return"}
            ],
            "edges": [
                {"from": 0, "to": 1, "kind": "Fallthrough"},
                {"from": 1, "to": 2, "kind": "TrueBranch"},
                {"from": 1, "to": 3, "kind": "FalseBranch"}
            ],
            "paths": [
                {"steps": [
                    {"from": 0, "to": 1, "kind": "StartJumpThread"},
                    {"from": 1, "to": 2, "kind": "CopySrcBlock"}
                ]}
            ]
        }"#;
        let request: ThreadRequest = serde_json::from_str(json).unwrap();
        let (cfg, _loops, mut store) = request.build().unwrap();
        assert_eq!(cfg.node_count(), 4);
        assert_eq!(cfg.edge_count(), 3);
        assert_eq!(store.len(), 1);
        assert_eq!(store.drain().len(), 1);
    }

    #[test]
    fn unknown_edge_reference_is_an_error() {
        let json = r#"{
            "blocks": [{"id": 0, "kind": "Entry", "terminator": "Return"}],
            "edges": [{"from": 0, "to": 99, "kind": "Fallthrough"}]
        }"#;
        let request: ThreadRequest = serde_json::from_str(json).unwrap();
        assert!(request.build().is_err());
    }
}
