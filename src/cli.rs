//! Command-line interface module for dirsweep.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging arguments over the configuration file
//! - Target folder resolution
//! - Running one cycle or the background loop until interrupted

use crate::config::{CollisionPolicy, ConfigError, SweepConfig, SweepScope, SweepSettings};
use crate::output::OutputFormatter;
use crate::paths::default_target_folders;
use crate::report::CycleReport;
use crate::scheduler::{CancellationToken, Scheduler, SweepOptions};
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;

/// Keep folders tidy: sort loose files, remove duplicates, archive stale files.
#[derive(Debug, Parser)]
#[command(name = "dirsweep", version, about)]
pub struct Cli {
    /// Folders to sweep (defaults to Desktop and Downloads)
    pub folders: Vec<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "DIRSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Seconds between cycles
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Archive files older than this many days
    #[arg(short = 't', long, value_name = "DAYS")]
    pub age_days: Option<u64>,

    /// What to do when a destination name is taken
    #[arg(long, value_enum)]
    pub collision: Option<CollisionPolicy>,

    /// Which folders the dedupe and archive passes visit
    #[arg(long, value_enum)]
    pub scope: Option<SweepScope>,

    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Print each cycle report as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of file settings.
    pub fn apply_overrides(&self, settings: &mut SweepSettings) {
        if !self.folders.is_empty() {
            settings.folders = self
                .folders
                .iter()
                .map(|f| f.to_string_lossy().into_owned())
                .collect();
        }
        if let Some(interval) = self.interval {
            settings.interval_secs = interval;
        }
        if let Some(days) = self.age_days {
            settings.age_threshold_days = days;
        }
        if let Some(collision) = self.collision {
            settings.collision = collision;
        }
        if let Some(scope) = self.scope {
            settings.scope = scope;
        }
    }
}

/// Builds the scheduler inputs from a loaded configuration.
///
/// Falls back to the platform default folders when none are configured.
pub fn build_scheduler(config: &SweepConfig) -> Result<Scheduler, ConfigError> {
    let mut folders = config.sweep.expanded_folders();
    if folders.is_empty() {
        folders = default_target_folders();
    }

    let options = SweepOptions {
        interval: config.sweep.interval()?,
        age_threshold_days: config.sweep.age_threshold_days,
        collision: config.sweep.collision,
        scope: config.sweep.scope,
        filters: config.filters.compile()?,
    };

    Ok(Scheduler::new(folders, options))
}

fn report_cycle(report: &CycleReport, json: bool) {
    if json {
        if let Err(e) = OutputFormatter::cycle_json(report) {
            log::error!("Could not serialize cycle report: {e}");
        }
    } else if !report.is_idle() {
        OutputFormatter::cycle_summary(report);
    }
}

/// Runs the agent as described by the parsed arguments.
///
/// With `--once` a single cycle runs on the current thread. Otherwise the
/// scheduler runs on a background thread until Ctrl-C is pressed.
pub fn run_cli(cli: Cli) -> Result<()> {
    let mut config =
        SweepConfig::load(cli.config.as_deref()).context("Error loading configuration")?;
    cli.apply_overrides(&mut config.sweep);

    let mut scheduler = build_scheduler(&config).context("Invalid configuration")?;
    if scheduler.folders().is_empty() {
        bail!("No folders to sweep: pass them as arguments or set [sweep] folders");
    }

    if !cli.json {
        for folder in scheduler.folders() {
            OutputFormatter::info(&format!("Sweeping {}", folder.display()));
        }
    }

    let json = cli.json;
    if cli.once {
        let report = scheduler.run_once();
        report_cycle(&report, json);
        return Ok(());
    }

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install interrupt handler")?;

    let handle = scheduler
        .spawn(token, move |report| report_cycle(report, json))
        .context("Failed to start background sweep")?;

    match handle.join() {
        Ok(scheduler) => {
            if !json {
                OutputFormatter::success(&format!(
                    "Cleanup stopped after {} cycle(s)",
                    scheduler.cycles_completed()
                ));
            }
            Ok(())
        }
        Err(_) => bail!("Background sweep panicked"),
    }
}
