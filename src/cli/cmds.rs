//! Subcommand implementations: each takes its `*Args` plus the top-level
//! [`super::Cli`] (for `--output`) and prints a result or exits with a
//! non-zero code on failure.

use crate::cfg::{export_dot, export_json};
use crate::cli::fixture::ThreadRequest;
use crate::cli::{Cli, DumpArgs, OutputFormat, ThreadArgs, ValidateArgs};
use crate::output::{self, JsonResponse};
use crate::ssa::PendingStmts;
use crate::threading::{prevalidate, Engine, Stats};
use anyhow::Result;
use serde::Serialize;

/// Load a fixture or exit the process with the matching diagnostic code.
/// The engine itself has no user-visible error reporting, but the CLI's
/// fixture loader is this crate's own boundary, not the engine's, so it
/// gets ordinary exit-code error handling.
fn load(input: &std::path::Path) -> ThreadRequest {
    match ThreadRequest::load(input) {
        Ok(r) => r,
        Err(e) => {
            if !input.exists() {
                output::exit_fixture_not_found(&input.display().to_string());
            }
            output::exit_invalid_fixture(&format!("{e:#}"));
        }
    }
}

#[derive(Debug, Serialize)]
struct ThreadResult {
    function_name: String,
    threaded: bool,
    loops_need_fixup: bool,
    loops_may_have_multiple_latches: bool,
    stats: Stats,
    cfg: crate::cfg::CfgExport,
}

/// `thread` subcommand: run one complete jump-threading pass over a
/// fixture's CFG/path set.
pub fn thread(args: &ThreadArgs, cli: &Cli) -> Result<()> {
    let request = load(&args.input);
    let (mut cfg, mut loops, mut store) = request.build()?;
    let mut pending = PendingStmts::new();
    let mut stats = Stats::new();

    let threaded = {
        let mut engine = Engine::new(&mut cfg, &mut loops, &mut pending, &mut stats);
        engine.thread_through_all_blocks(&mut store, !args.no_loop_headers, args.optimize_for_size)
    };

    let text = if args.dot {
        export_dot(&cfg)
    } else {
        let result = ThreadResult {
            function_name: request.function_name.clone(),
            threaded,
            loops_need_fixup: loops.needs_fixup(),
            loops_may_have_multiple_latches: loops.may_have_multiple_latches(),
            stats,
            cfg: export_json(&cfg, &request.function_name),
        };
        match cli.output {
            OutputFormat::Json => JsonResponse::new(result).to_json(),
            OutputFormat::Text => format!(
                "function {}\nthreaded: {}\nloops need fixup: {}\nloops may have multiple latches: {}\n{}",
                result.function_name,
                result.threaded,
                result.loops_need_fixup,
                result.loops_may_have_multiple_latches,
                result.stats
            ),
        }
    };

    match &args.out {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

/// `dump` subcommand: register a fixture's paths and print the path store's
/// diagnostic dump.
pub fn dump(args: &DumpArgs, cli: &Cli) -> Result<()> {
    let request = load(&args.input);
    let (_cfg, _loops, store) = request.build()?;

    match cli.output {
        OutputFormat::Json => {
            println!("{}", JsonResponse::new(store.dump_lines()).to_json());
        }
        OutputFormat::Text => {
            output::header(&format!("path store dump: {}", request.function_name));
            for line in store.dump_lines() {
                output::dump(line);
            }
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ValidateResult {
    function_name: String,
    block_count: usize,
    edge_count: usize,
    loop_count: usize,
    phi_arity_violations: Vec<String>,
    blocks_eligible_for_threading: usize,
}

/// `validate` subcommand: check a fixture's structural invariants (φ-arity)
/// and report which blocks the pre-validator would mark eligible, without
/// threading anything.
pub fn validate(args: &ValidateArgs, cli: &Cli) -> Result<()> {
    let request = load(&args.input);
    let (mut cfg, loops, store) = request.build()?;

    let phi_arity_violations = phi_arity_violations(&cfg);

    let mut stats = Stats::new();
    let paths: Vec<_> = {
        let mut store = store;
        store.drain()
    };
    let eligible = prevalidate::mark_threaded_blocks(&mut cfg, paths, &loops, &mut stats, false);

    let result = ValidateResult {
        function_name: request.function_name.clone(),
        block_count: cfg.node_count(),
        edge_count: cfg.edge_count(),
        loop_count: loops.loops().len(),
        phi_arity_violations,
        blocks_eligible_for_threading: eligible.len(),
    };

    let ok = result.phi_arity_violations.is_empty();
    match cli.output {
        OutputFormat::Json => println!("{}", JsonResponse::new(&result).to_json()),
        OutputFormat::Text => {
            output::header(&format!("validating {}", result.function_name));
            output::info(&format!(
                "{} blocks, {} edges, {} loops, {} eligible for threading",
                result.block_count, result.edge_count, result.loop_count, result.blocks_eligible_for_threading
            ));
            if ok {
                println!("OK: no phi-arity violations");
            } else {
                for v in &result.phi_arity_violations {
                    output::error(v);
                }
            }
        }
    }

    if !ok {
        std::process::exit(output::EXIT_USAGE);
    }
    Ok(())
}

/// A static check on the fixture's starting shape: every phi's arity must
/// equal its block's predecessor count.
fn phi_arity_violations(cfg: &crate::cfg::Cfg) -> Vec<String> {
    use petgraph::Direction;

    let mut violations = Vec::new();
    for node in cfg.node_indices() {
        let block = &cfg[node];
        let pred_count = cfg.edges_directed(node, Direction::Incoming).count();
        for phi in &block.phis {
            if !phi.arity_matches(pred_count) {
                violations.push(format!(
                    "block {}: phi '{}' has {} args, block has {} predecessors",
                    block.id,
                    phi.name,
                    phi.arity(),
                    pred_count
                ));
            }
        }
    }
    violations
}
