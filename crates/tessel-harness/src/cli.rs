use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tessel_core::Rect;
use tessel_layout::{WorkspaceConfig, WorkspaceError};

use crate::demo::{build_demo, drive};
use crate::determinism::{DeterminismFixture, deterministic_mode};
use crate::error::{HarnessError, Result};
use crate::replay::replay_trace;
use crate::sinks::{FanoutSink, JsonlSink, TracingSink};
use crate::trace::{TraceHeader, read_trace};

#[derive(Debug, Parser)]
#[command(
    name = "tessel-trace",
    about = "Record and replay Tessel workspace debug traces",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a JSONL trace and verify every recorded state hash.
    Replay(ReplayArgs),

    /// Record a seeded random gesture session as a JSONL trace.
    Demo(DemoArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// Trace file written by `demo` or any JSONL debug sink.
    pub trace: PathBuf,

    /// Include the final tree snapshot in the report.
    #[arg(long)]
    pub snapshot: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DemoArgs {
    /// Output trace path.
    #[arg(long, short)]
    pub out: PathBuf,

    /// Gesture seed; defaults to `TESSEL_SEED`, then 0.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 40)]
    pub gestures: usize,

    #[arg(long, default_value_t = 120)]
    pub width: u16,

    #[arg(long, default_value_t = 36)]
    pub height: u16,

    /// Workspace config JSON (metrics and drag tuning).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    match cli.command {
        Commands::Replay(args) => run_replay(&args, out),
        Commands::Demo(args) => run_demo(&args, out),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| HarnessError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn run_replay<W: Write>(args: &ReplayArgs, out: &mut W) -> Result<()> {
    let trace = read_trace(BufReader::new(open(&args.trace)?))?;
    let report = replay_trace(&trace)?;
    let mut summary = serde_json::json!({
        "status": "ok",
        "events": report.events,
        "committed": report.committed,
        "cancelled": report.cancelled,
        "transitions": report.transitions,
        "final_hash": format!("{:016x}", report.final_hash),
    });
    if args.snapshot {
        summary["snapshot"] =
            serde_json::to_value(&report.final_snapshot).map_err(io::Error::from)?;
    }
    writeln!(out, "{summary}")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WorkspaceConfig> {
    let Some(path) = path else {
        return Ok(WorkspaceConfig::default());
    };
    let text = fs::read_to_string(path).map_err(|source| HarnessError::File {
        path: path.to_path_buf(),
        source,
    })?;
    WorkspaceConfig::from_json(&text).map_err(|err| WorkspaceError::from(err).into())
}

fn run_demo<W: Write>(args: &DemoArgs, out: &mut W) -> Result<()> {
    let fixture = match args.seed {
        Some(seed) => DeterminismFixture::new_with("demo", seed, deterministic_mode()),
        None => DeterminismFixture::new("demo", 0),
    };
    let config = load_config(args.config.as_deref())?;
    let area = Rect::from_size(args.width, args.height);

    let mut ws = build_demo(area, config)?;
    let header = TraceHeader::new(area, config, ws.tree_snapshot()).with_seed(fixture.seed());
    let file = File::create(&args.out).map_err(|source| HarnessError::File {
        path: args.out.clone(),
        source,
    })?;
    let sink = JsonlSink::new(BufWriter::new(file), &header)?;
    let _ = ws.set_sink(Some(Box::new(
        FanoutSink::new().with(sink.clone()).with(TracingSink),
    )));
    if fixture.deterministic() {
        ws = ws.with_logical_clock();
    }

    let mut rng = fixture.rng();
    let stats = drive(&mut ws, &mut rng, args.gestures);
    let final_hash = ws.tree().state_hash();
    drop(ws);
    let lines = sink.lines();
    let _ = sink.finish()?;

    tracing::info!(run_id = fixture.run_id(), lines, "demo.recorded");
    let summary = serde_json::json!({
        "status": "ok",
        "run_id": fixture.run_id(),
        "seed": fixture.seed(),
        "stats": stats,
        "lines": lines,
        "final_hash": format!("{final_hash:016x}"),
        "out": args.out.display().to_string(),
    });
    writeln!(out, "{summary}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::try_parse_from([
            "tessel-trace",
            "demo",
            "--out",
            "t.jsonl",
            "--seed",
            "9",
            "--gestures",
            "3",
        ])
        .expect("parse");
        let Commands::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.gestures, 3);
        assert_eq!((args.width, args.height), (120, 36));
    }

    #[test]
    fn missing_trace_names_the_path() {
        let mut out = Vec::new();
        let err = run(
            Cli {
                command: Commands::Replay(ReplayArgs {
                    trace: PathBuf::from("/definitely/not/here.jsonl"),
                    snapshot: false,
                }),
            },
            &mut out,
        )
        .expect_err("missing file");
        assert!(err.to_string().contains("not/here.jsonl"));
        assert_eq!(err.exit_code(), 1);
    }
}
