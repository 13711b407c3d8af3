// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rill developer CLI.
//!
//! Folds a recorded trace stream (JSONL, one wire frame per line) through
//! the ingestion state machine and prints a per-rush summary. With
//! `--patches` the produced patch lists are also written as JSONL in the
//! `{op, path, value}` interop form.

// CLI output goes to stdout on purpose.
#![allow(clippy::print_stdout)]

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use rill_core::{ControlState, DevtoolState, DevtoolStore, RushIndex, TraceStateMachine};
use rill_protocol::{decode_trace_message, WirePatchOp};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "rill", about = "Rill devtool trace inspector", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fold a recorded trace stream and summarize each rush.
    Ingest {
        /// JSONL file of trace messages, one wire frame per line.
        trace: PathBuf,
        /// Also write every produced patch list as JSONL to this file.
        #[arg(long)]
        patches: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ingest { trace, patches } => ingest(&trace, patches.as_deref()),
    }
}

fn ingest(trace: &Path, patches: Option<&Path>) -> Result<()> {
    let file = File::open(trace)
        .with_context(|| format!("cannot open trace file {}", trace.display()))?;
    let reader = BufReader::new(file);

    let mut patch_out = match patches {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("cannot create patch output file {}", path.display())
        })?)),
        None => None,
    };

    let mut machine = TraceStateMachine::new();
    let mut store = DevtoolStore::new();
    let mut frames = 0_u64;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("cannot read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let message = decode_trace_message(&line)
            .with_context(|| format!("malformed trace frame at line {line_no}"))?;
        let ops = machine.fold(store.state(), &message);

        if let Some(out) = patch_out.as_mut() {
            for op in &ops {
                let wire = WirePatchOp::from_patch(op)
                    .with_context(|| format!("cannot render patch for line {line_no}"))?;
                serde_json::to_writer(&mut *out, &wire)?;
                out.write_all(b"\n")?;
            }
        }

        store
            .apply(&ops)
            .with_context(|| format!("patch list from line {line_no} failed to apply"))?;
        frames += 1;
        debug!(line_no, ops = ops.len(), "folded frame");
    }

    if let Some(out) = patch_out.as_mut() {
        out.flush()?;
    }

    let state = store.state();
    info!(
        frames,
        rushes = state.component_trees.len(),
        phase = ?machine.control(),
        "trace stream folded"
    );

    println!("{}", summary_table(state, machine.control()));
    Ok(())
}

/// Builds the per-rush summary: structure/emission counts and tree size.
fn summary_table(state: &DevtoolState, control: ControlState) -> Table {
    let mut rushes: BTreeSet<RushIndex> = BTreeSet::new();
    rushes.extend(state.tree_structure_traces.keys());
    rushes.extend(state.emission_traces.keys());
    rushes.extend(state.component_trees.keys());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["rush", "structures", "emissions", "tree nodes", "phase"]);

    for rush in rushes {
        let structures = state
            .tree_structure_traces
            .get(&rush)
            .map_or(0, Vec::len);
        let emissions = state.emission_traces.get(&rush).map_or(0, Vec::len);
        let nodes = state
            .component_trees
            .get(&rush)
            .map_or(0, |snap| snap.hash.len());
        let phase = if rush == state.current_rush_index {
            match control {
                ControlState::StructureMode => "structural",
                ControlState::EmissionMode => "emission",
            }
        } else {
            "closed"
        };
        table.add_row(vec![
            rush.to_string(),
            structures.to_string(),
            emissions.to_string(),
            nodes.to_string(),
            phase.to_string(),
        ]);
    }
    table
}
