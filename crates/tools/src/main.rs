use std::fs;
use std::path::{Path, PathBuf};

use chart::config::MapChartConfig;
use clap::{Parser, Subcommand};
use tools::scenario;
use tracing_subscriber::EnvFilter;

/// Drives a map chart through a scripted session and prints the result.
#[derive(Debug, Parser)]
#[command(name = "mapchart", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a scenario and print the final view and events as JSON.
    Run {
        #[arg(long)]
        script: PathBuf,
        /// Chart options; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Single-line output.
        #[arg(long)]
        compact: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Run {
            script,
            config,
            compact,
        } => cmd_run(&script, config.as_deref(), compact),
    }
}

fn cmd_run(script: &Path, config: Option<&Path>, compact: bool) -> Result<(), String> {
    let config = match config {
        Some(path) => MapChartConfig::from_json_str(&read(path)?).map_err(|e| format!("{path:?}: {e}"))?,
        None => MapChartConfig::default(),
    };
    let scenario = scenario::parse(&read(script)?).map_err(|e| format!("{script:?}: {e}"))?;
    let output = scenario::run(&config, &scenario).map_err(|e| e.to_string())?;

    let payload = if compact {
        serde_json::to_string(&output)
    } else {
        serde_json::to_string_pretty(&output)
    }
    .map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}
