//! dirsweep - a background agent that keeps folders tidy
//!
//! Each cycle sorts loose files into category subfolders, deletes
//! byte-identical duplicates and compresses stale files into per-file zip
//! archives. Cycles repeat on a background thread until cancelled.

pub mod archive;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod paths;
pub mod report;
pub mod scan;
pub mod scheduler;

pub use archive::archive_old_files;
pub use config::{CollisionPolicy, CompiledFilters, ConfigError, SweepConfig, SweepScope};
pub use dedupe::remove_duplicates;
pub use error::{SweepError, SweepResult};
pub use file_category::{Category, ExtensionTable, classify};
pub use file_organizer::FileOrganizer;
pub use report::{Action, CycleReport, FolderReport, ItemFailure, PassReport};
pub use scheduler::{CancellationToken, Scheduler, SchedulerState, SweepOptions};
