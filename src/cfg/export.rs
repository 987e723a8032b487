//! CFG export to DOT and JSON formats

use crate::cfg::{BlockKind, Cfg, EdgeType, Terminator};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Export CFG to DOT format for Graphviz
pub fn export_dot(cfg: &Cfg) -> String {
    let mut dot = String::from("digraph CFG {\n");
    dot.push_str("  rankdir=TB;\n");
    dot.push_str("  node [shape=box, style=rounded];\n\n");

    // Define nodes
    for node_idx in cfg.node_indices() {
        if let Some(block) = cfg.node_weight(node_idx) {
            let label = escape_dot_string(&format!(
                "Block {}\\n{}\\n{}{}",
                block.id,
                format_block_kind(&block.kind),
                format_terminator(&block.terminator),
                format_phis_dot(block),
            ));

            let style = match block.kind {
                BlockKind::Entry => "fillcolor=lightgreen, style=filled",
                BlockKind::Exit => "fillcolor=lightcoral, style=filled",
                BlockKind::Normal => "",
            };

            writeln!(dot, "  \"{}\" [label=\"{}\" {}];", node_idx.index(), label, style).ok();
        }
    }

    // Define edges
    dot.push_str("\n");
    for edge_idx in cfg.edge_indices() {
        let (from, to) = cfg.edge_endpoints(edge_idx).unwrap();
        if let Some(edge) = cfg.edge_weight(edge_idx) {
            let color = edge.kind.dot_color();
            let base_label = edge.kind.dot_label();
            let label = if edge.has_path() {
                if base_label.is_empty() {
                    "thread".to_string()
                } else {
                    format!("{base_label},thread")
                }
            } else {
                base_label.to_string()
            };
            let label_attr = if label.is_empty() {
                String::new()
            } else {
                format!(", label=\"{}\"", label)
            };

            writeln!(
                dot,
                "  \"{}\" -> \"{}\" [color={}, style={}{}];",
                from.index(),
                to.index(),
                color,
                if edge.kind == EdgeType::Fallthrough { "dashed" } else { "solid" },
                label_attr
            )
            .ok();
        }
    }

    dot.push_str("}\n");
    dot
}

fn escape_dot_string(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn format_block_kind(kind: &BlockKind) -> &'static str {
    match kind {
        BlockKind::Entry => "ENTRY",
        BlockKind::Normal => "NORMAL",
        BlockKind::Exit => "EXIT",
    }
}

fn format_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Goto { target } => format!("goto {}", target),
        Terminator::SwitchInt { targets, otherwise } => {
            format!("switch({} targets, otherwise {})", targets.len(), otherwise)
        }
        Terminator::Return => "return".to_string(),
        Terminator::Unreachable => "unreachable".to_string(),
        Terminator::Call { target, unwind } => {
            format!("call {:?}, unwind {:?}", target, unwind)
        }
        Terminator::Abort(msg) => format!("abort({})", msg),
    }
}

fn format_phis_dot(block: &crate::cfg::BasicBlock) -> String {
    if block.phis.is_empty() {
        return String::new();
    }
    let names: Vec<_> = block.phis.iter().map(|p| format!("{}=phi(/{})", p.name, p.arity())).collect();
    format!("\\n{}", names.join(", "))
}

/// Complete CFG export for JSON serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgExport {
    pub function_name: String,
    pub entry: Option<usize>,
    pub exits: Vec<usize>,
    pub blocks: Vec<BlockExport>,
    pub edges: Vec<EdgeExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockExport {
    pub id: usize,
    pub kind: String,
    pub statements: Vec<String>,
    pub terminator: String,
    pub source_location: Option<String>,
    pub phis: Vec<PhiExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhiExport {
    pub name: String,
    pub arity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeExport {
    pub from: usize,
    pub to: usize,
    pub kind: String,
    /// Whether this edge currently carries a registered jump-thread path.
    pub has_path: bool,
}

/// Export CFG to JSON format
pub fn export_json(cfg: &Cfg, function_name: &str) -> CfgExport {
    use crate::cfg::analysis;

    let entry = analysis::find_entry(cfg).map(|idx| idx.index());
    let exits = analysis::find_exits(cfg)
        .iter()
        .map(|idx| idx.index())
        .collect();

    let blocks: Vec<_> = cfg
        .node_indices()
        .map(|idx| {
            let block = cfg.node_weight(idx).unwrap();
            BlockExport {
                id: block.id,
                kind: format_block_kind(&block.kind).to_string(),
                statements: block.statements.clone(),
                terminator: format_terminator(&block.terminator),
                source_location: block
                    .source_location
                    .as_ref()
                    .map(|loc| loc.display()),
                phis: block
                    .phis
                    .iter()
                    .map(|p| PhiExport { name: p.name.clone(), arity: p.arity() })
                    .collect(),
            }
        })
        .collect();

    let edges: Vec<_> = cfg
        .edge_indices()
        .map(|idx| {
            let (from, to) = cfg.edge_endpoints(idx).unwrap();
            let edge = cfg.edge_weight(idx).unwrap();
            EdgeExport {
                from: from.index(),
                to: to.index(),
                kind: format!("{:?}", edge.kind),
                has_path: edge.has_path(),
            }
        })
        .collect();

    CfgExport {
        function_name: function_name.to_string(),
        entry,
        exits,
        blocks,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::{BasicBlock, EdgeData};

    fn create_test_cfg() -> Cfg {
        let mut g = Cfg::new();

        let mut blk0 = BasicBlock::new(0, BlockKind::Entry, Terminator::Goto { target: 1 });
        blk0.statements = vec!["x = 1".to_string()];
        let b0 = g.add_node(blk0);

        let mut blk1 = BasicBlock::new(
            1,
            BlockKind::Normal,
            Terminator::SwitchInt { targets: vec![2], otherwise: 3 },
        );
        blk1.statements = vec!["if x > 0".to_string()];
        let b1 = g.add_node(blk1);

        let mut blk2 = BasicBlock::new(2, BlockKind::Exit, Terminator::Return);
        blk2.statements = vec!["return true".to_string()];
        let b2 = g.add_node(blk2);

        let mut blk3 = BasicBlock::new(3, BlockKind::Exit, Terminator::Return);
        blk3.statements = vec!["return false".to_string()];
        let b3 = g.add_node(blk3);

        g.add_edge(b0, b1, EdgeData::new(EdgeType::Fallthrough));
        g.add_edge(b1, b2, EdgeData::new(EdgeType::TrueBranch));
        g.add_edge(b1, b3, EdgeData::new(EdgeType::FalseBranch));

        g
    }

    #[test]
    fn test_export_dot() {
        let cfg = create_test_cfg();
        let dot = export_dot(&cfg);

        assert!(dot.contains("digraph CFG"));
        assert!(dot.contains("Block 0"));
        assert!(dot.contains("ENTRY"));
        assert!(dot.contains("color=green")); // TrueBranch
        assert!(dot.contains("color=red")); // FalseBranch
    }

    #[test]
    fn test_export_json() {
        let cfg = create_test_cfg();
        let export = export_json(&cfg, "test_function");

        assert_eq!(export.function_name, "test_function");
        assert_eq!(export.entry, Some(0));
        assert_eq!(export.exits.len(), 2); // blocks 2 and 3
        assert_eq!(export.blocks.len(), 4);
        assert_eq!(export.edges.len(), 3);

        // Check block kinds
        assert_eq!(export.blocks[0].kind, "ENTRY");
        assert_eq!(export.blocks[2].kind, "EXIT");

        // Check edge types
        assert!(export.edges.iter().any(|e| e.kind == "TrueBranch"));
        assert!(export.edges.iter().any(|e| e.kind == "FalseBranch"));
        assert!(export.edges.iter().all(|e| !e.has_path));
    }

    #[test]
    fn test_dot_is_valid_graphviz() {
        let cfg = create_test_cfg();
        let dot = export_dot(&cfg);

        // Basic validation: starts correctly, ends correctly
        assert!(dot.starts_with("digraph CFG {"));
        assert!(dot.ends_with("}\n"));

        // Check that edges section starts after newline following nodes
        // Edges start with "  \"" followed by number and " ->"
        // Nodes end with "];" before the "\n\n" separator
        let first_edge_pos = dot.find("->").unwrap();
        let section_separator = dot.find("\n\n").unwrap();
        assert!(section_separator < first_edge_pos, "Node section should end before edges start");

        // Verify basic DOT structure elements
        assert!(dot.contains("rankdir=TB;"));
        assert!(dot.contains("node [shape=box"));
    }

    #[test]
    fn export_json_reports_phi_arity() {
        let mut cfg = create_test_cfg();
        let b3 = crate::cfg::find_node_by_block_id(&cfg, 3).unwrap();
        let mut phi = crate::ssa::PhiNode::new("x.2");
        phi.set_arg(
            cfg.edge_indices().next().unwrap(),
            crate::ssa::PhiArg::new("x.0", None),
        );
        cfg.node_weight_mut(b3).unwrap().phis.push(phi);

        let export = export_json(&cfg, "f");
        let block3 = export.blocks.iter().find(|b| b.id == 3).unwrap();
        assert_eq!(block3.phis.len(), 1);
        assert_eq!(block3.phis[0].name, "x.2");
    }
}
