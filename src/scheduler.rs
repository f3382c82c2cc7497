//! Periodic sweep cycles.
//!
//! A [`Scheduler`] owns the list of target folders and the sweep options. One
//! cycle initializes, relocates, deduplicates and archives every folder in
//! order; between cycles the scheduler sleeps for the configured interval.
//! A [`CancellationToken`] is checked before each cycle and while sleeping.

use crate::archive::archive_old_files;
use crate::config::{
    CollisionPolicy, CompiledFilters, DEFAULT_AGE_THRESHOLD_DAYS, DEFAULT_INTERVAL_SECS,
    SweepScope,
};
use crate::dedupe::remove_duplicates;
use crate::error::SweepResult;
use crate::file_category::Category;
use crate::file_organizer::FileOrganizer;
use crate::report::{Action, CycleReport, FolderReport, SkippedFolder};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; bounds how long shutdown can take while idle.
const SLEEP_SLICE: Duration = Duration::from_millis(200);

/// Shared flag asking the scheduler to stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What the scheduler is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Sleeping between cycles (or not started).
    Idle,
    /// Executing a cycle.
    Running,
}

/// Everything a cycle needs besides the folder list.
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub interval: Duration,
    pub age_threshold_days: u64,
    pub collision: CollisionPolicy,
    pub scope: SweepScope,
    pub filters: CompiledFilters,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            age_threshold_days: DEFAULT_AGE_THRESHOLD_DAYS,
            collision: CollisionPolicy::default(),
            scope: SweepScope::default(),
            filters: CompiledFilters::default(),
        }
    }
}

/// Runs sweep cycles over a fixed list of folders.
pub struct Scheduler {
    folders: Vec<PathBuf>,
    options: SweepOptions,
    state: SchedulerState,
    cycles: u64,
}

impl Scheduler {
    pub fn new(folders: Vec<PathBuf>, options: SweepOptions) -> Self {
        Self {
            folders,
            options,
            state: SchedulerState::Idle,
            cycles: 0,
        }
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of cycles finished so far.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    /// Runs one full cycle over every folder and returns what happened.
    ///
    /// A folder that is missing or whose category folders cannot be created
    /// is skipped for this cycle; the others are processed normally.
    pub fn run_once(&mut self) -> CycleReport {
        self.state = SchedulerState::Running;
        log::debug!("Starting cycle {}", self.cycles + 1);

        let mut report = CycleReport::new();
        for folder in &self.folders {
            match sweep_folder(folder, &self.options) {
                Ok(folder_report) => report.folders.push(folder_report),
                Err(e) => {
                    log::warn!("Skipping {} this cycle: {e}", folder.display());
                    report.skipped.push(SkippedFolder {
                        folder: folder.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.cycles += 1;
        self.state = SchedulerState::Idle;
        log::debug!("Cycle {} complete, waiting for next cycle", self.cycles);
        report
    }

    /// Runs cycles until `token` is cancelled, calling `on_cycle` after each.
    pub fn run<F>(&mut self, token: &CancellationToken, mut on_cycle: F)
    where
        F: FnMut(&CycleReport),
    {
        log::info!(
            "Sweeping {} folder(s) every {}s",
            self.folders.len(),
            self.options.interval.as_secs()
        );

        while !token.is_cancelled() {
            let report = self.run_once();
            on_cycle(&report);
            if !sleep_unless_cancelled(self.options.interval, token) {
                break;
            }
        }

        log::info!("Stopped after {} cycle(s)", self.cycles);
    }

    /// Moves the scheduler onto a named background thread.
    ///
    /// The thread hands the scheduler back when it stops.
    pub fn spawn<F>(mut self, token: CancellationToken, on_cycle: F) -> io::Result<JoinHandle<Self>>
    where
        F: FnMut(&CycleReport) + Send + 'static,
    {
        thread::Builder::new()
            .name("dirsweep-scheduler".to_string())
            .spawn(move || {
                self.run(&token, on_cycle);
                self
            })
    }
}

/// Sleeps for `interval`, waking early if `token` is cancelled.
///
/// Returns false if the sleep was cut short.
pub fn sleep_unless_cancelled(interval: Duration, token: &CancellationToken) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if token.is_cancelled() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return true;
        }
        thread::sleep(remaining.min(SLEEP_SLICE));
    }
}

/// Folders the dedupe pass visits for `target`.
fn dedupe_dirs(target: &Path, scope: SweepScope) -> Vec<PathBuf> {
    let mut dirs = vec![target.to_path_buf()];
    if scope == SweepScope::Categories {
        dirs.extend(Category::ALL.iter().map(|c| target.join(c.dir_name())));
    }
    dirs
}

/// Folders the archive pass visits for `target`. Under `Categories` each
/// category gets its own `Archives/` subfolder; the Archives category is
/// never archived into itself.
fn archive_dirs(target: &Path, scope: SweepScope) -> Vec<PathBuf> {
    let mut dirs = vec![target.to_path_buf()];
    if scope == SweepScope::Categories {
        dirs.extend(
            Category::ALL
                .iter()
                .filter(|c| **c != Category::Archives)
                .map(|c| target.join(c.dir_name())),
        );
    }
    dirs
}

/// Runs the four passes over one target folder.
///
/// # Errors
///
/// Fails only if the category folders cannot be set up; later pass failures
/// are recorded in the returned report.
pub fn sweep_folder(target: &Path, options: &SweepOptions) -> SweepResult<FolderReport> {
    let mut report = FolderReport::new(target);

    for path in FileOrganizer::ensure_category_folders(target)? {
        report.initialize.record(Action::FolderCreated { path });
    }

    match FileOrganizer::move_loose_files(target, &options.filters, options.collision) {
        Ok(pass) => report.relocate = pass,
        Err(e) => {
            log::warn!("{e}");
            report.relocate.fail(target, &e);
        }
    }

    for dir in dedupe_dirs(target, options.scope) {
        match remove_duplicates(&dir, &options.filters) {
            Ok(pass) => report.dedupe.merge(pass),
            Err(e) => {
                log::warn!("{e}");
                report.dedupe.fail(&dir, &e);
            }
        }
    }

    for dir in archive_dirs(target, options.scope) {
        match archive_old_files(
            &dir,
            options.age_threshold_days,
            &options.filters,
            options.collision,
        ) {
            Ok(pass) => report.archive.merge(pass),
            Err(e) => {
                log::warn!("{e}");
                report.archive.fail(&dir, &e);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::SystemTime;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn set_age(path: &Path, age: Duration) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    fn fast_options() -> SweepOptions {
        SweepOptions {
            interval: Duration::from_millis(10),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_once_on_empty_folder_only_creates_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut scheduler = Scheduler::new(vec![temp_dir.path().to_path_buf()], fast_options());

        let report = scheduler.run_once();

        assert!(report.skipped.is_empty());
        assert_eq!(report.failure_count(), 0);
        assert_eq!(report.folders[0].initialize.actions.len(), 7);
        assert_eq!(report.folders[0].actions().count(), 7);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.cycles_completed(), 1);
    }

    #[test]
    fn test_second_cycle_is_idle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut scheduler = Scheduler::new(vec![temp_dir.path().to_path_buf()], fast_options());

        scheduler.run_once();
        let report = scheduler.run_once();

        assert!(report.is_idle());
    }

    #[test]
    fn test_missing_folder_is_skipped_others_processed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("missing");
        let present = temp_dir.path().join("present");
        fs::create_dir(&present).unwrap();
        fs::write(present.join("photo.png"), "png").unwrap();

        let mut scheduler = Scheduler::new(vec![missing.clone(), present.clone()], fast_options());
        let report = scheduler.run_once();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].folder, missing);
        assert!(!missing.exists());
        assert!(present.join("Images/photo.png").exists());
    }

    #[test]
    fn test_categories_scope_dedupes_and_archives_subfolders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path();
        FileOrganizer::ensure_category_folders(target).unwrap();
        fs::write(target.join("Images/a.png"), "same").unwrap();
        fs::write(target.join("Images/b.png"), "same").unwrap();
        fs::write(target.join("Documents/old.pdf"), "old").unwrap();
        set_age(&target.join("Documents/old.pdf"), DAY * 45);
        fs::write(target.join("Archives/bundle.zip"), "zip").unwrap();
        set_age(&target.join("Archives/bundle.zip"), DAY * 45);

        let report = sweep_folder(target, &fast_options()).unwrap();

        assert_eq!(report.dedupe.actions.len(), 1);
        assert_eq!(report.archive.actions.len(), 1);
        assert!(target.join("Documents/Archives/old.pdf.zip").exists());
        assert!(!target.join("Documents/old.pdf").exists());
        assert!(target.join("Archives/bundle.zip").exists());
        assert!(!target.join("Archives/Archives").exists());
    }

    #[test]
    fn test_top_level_scope_leaves_subfolders_alone() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path();
        FileOrganizer::ensure_category_folders(target).unwrap();
        fs::write(target.join("Images/a.png"), "same").unwrap();
        fs::write(target.join("Images/b.png"), "same").unwrap();

        let options = SweepOptions {
            scope: SweepScope::TopLevel,
            ..fast_options()
        };
        let report = sweep_folder(target, &options).unwrap();

        assert!(report.dedupe.actions.is_empty());
        assert!(target.join("Images/a.png").exists());
        assert!(target.join("Images/b.png").exists());
    }

    #[test]
    fn test_run_stops_when_cancelled_before_start() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut scheduler = Scheduler::new(vec![temp_dir.path().to_path_buf()], fast_options());
        let token = CancellationToken::new();
        token.cancel();

        let mut cycles = 0;
        scheduler.run(&token, |_| cycles += 1);

        assert_eq!(cycles, 0);
        assert_eq!(scheduler.cycles_completed(), 0);
        assert!(!temp_dir.path().join("Documents").exists());
    }

    #[test]
    fn test_spawned_scheduler_repeats_until_cancelled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let scheduler = Scheduler::new(vec![temp_dir.path().to_path_buf()], fast_options());
        let token = CancellationToken::new();

        let stopper = token.clone();
        let handle = scheduler
            .spawn(token, move |report| {
                if report.is_idle() {
                    stopper.cancel();
                }
            })
            .expect("Failed to spawn scheduler");

        let scheduler = handle.join().expect("Scheduler thread panicked");
        assert_eq!(scheduler.cycles_completed(), 2);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_sleep_unless_cancelled() {
        let token = CancellationToken::new();
        assert!(sleep_unless_cancelled(Duration::from_millis(5), &token));

        token.cancel();
        let started = Instant::now();
        assert!(!sleep_unless_cancelled(Duration::from_secs(60), &token));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
