//! # Warden
//!
//! Headless simulation driver for Project Warden.
//!
//! Loads a scenario, spawns the player and the enemies it describes, runs
//! the behavior core at a fixed step and prints a JSON report.
//!
//! ```text
//! warden [SCENARIO] [--json-logs] [--write-default PATH]
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod runner;

use anyhow::{bail, Context, Result};
use config::{ScenarioConfig, SCENARIO_FILE};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Parsed command line.
#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    write_default: Option<PathBuf>,
    json_logs: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--write-default" => {
                    let path = args
                        .next()
                        .context("--write-default needs a path")?;
                    parsed.write_default = Some(PathBuf::from(path));
                }
                "--json-logs" => parsed.json_logs = true,
                flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
                path => {
                    if parsed.scenario.is_some() {
                        bail!("more than one scenario given");
                    }
                    parsed.scenario = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("warden=info".parse()?);
    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    info!("Project Warden starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Some(path) = args.write_default {
        ScenarioConfig::default()
            .save_to(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        return Ok(());
    }

    let path = args.scenario.unwrap_or_else(|| PathBuf::from(SCENARIO_FILE));
    let scenario = ScenarioConfig::load_from(&path)
        .with_context(|| format!("loading scenario {}", path.display()))?;

    let report = runner::run(&scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!("Project Warden shutdown complete");
    Ok(())
}
