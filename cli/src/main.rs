//! Project Scheduler CLI
//!
//! Reads a command file, runs the scheduler to completion, and writes one
//! result line per query or completion.

use clap::Parser;
use project_scheduler_core_rs::{CommandSchedule, EngineConfig, SimulationEngine, WriterSink};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "project-scheduler")]
#[command(about = "Least-progress-first scheduler for construction projects")]
#[command(version)]
struct Cli {
    /// Command file, one `T: command(args)` per line
    input: PathBuf,

    /// Where result lines are written
    #[arg(short, long, default_value = "output_file.txt")]
    output: PathBuf,

    /// JSON engine configuration; flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Work units per turn on the resource
    #[arg(long)]
    quantum: Option<u64>,

    /// Maximum simultaneously open projects
    #[arg(long)]
    max_open_projects: Option<usize>,

    /// Dump the simulation event log as JSON lines
    #[arg(long)]
    event_log: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if let Some(quantum) = cli.quantum {
        config.quantum = quantum;
    }
    if let Some(max_open_projects) = cli.max_open_projects {
        config.max_open_projects = max_open_projects;
    }
    Ok(config)
}

fn write_event_log(
    engine: &SimulationEngine,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    for event in engine.event_log().events() {
        serde_json::to_writer(&mut writer, event)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout stays free for the user
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let schedule = CommandSchedule::parse(&fs::read_to_string(&cli.input)?)?;
    info!(commands = schedule.len(), ?config, "loaded command file");

    let mut engine = SimulationEngine::new(config, schedule)?;
    let mut sink = WriterSink::new(BufWriter::new(File::create(&cli.output)?));

    // Keep whatever was produced before a failure
    let result = engine.run(&mut sink);
    sink.finish()?;
    if let Some(path) = &cli.event_log {
        write_event_log(&engine, path)?;
    }

    match result {
        Ok(summary) => {
            info!(
                final_tick = summary.final_tick,
                completed = summary.projects_completed,
                lines = summary.lines_emitted,
                "simulation finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(tick = engine.current_tick(), %err, "simulation aborted");
            Err(err.into())
        }
    }
}
