//! Per-pass and per-cycle result records.
//!
//! Every component pass returns a [`PassReport`] instead of stopping on the
//! first failure. The scheduler gathers them into a [`CycleReport`].

use crate::error::SweepError;
use crate::file_category::Category;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single filesystem change (or deliberate non-change) made by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// A category subfolder was created.
    FolderCreated { path: PathBuf },
    /// A loose file was moved into its category folder.
    Moved {
        from: PathBuf,
        to: PathBuf,
        category: Category,
    },
    /// A file was deleted because `kept` has the same content.
    DuplicateRemoved { removed: PathBuf, kept: PathBuf },
    /// A stale file was compressed into `archive` and then deleted.
    Archived { source: PathBuf, archive: PathBuf },
    /// A file was left alone because its destination was taken.
    Skipped { path: PathBuf, reason: String },
}

impl Action {
    /// Short label used for summary tables.
    pub fn label(&self) -> &'static str {
        match self {
            Action::FolderCreated { .. } => "Folders created",
            Action::Moved { .. } => "Files moved",
            Action::DuplicateRemoved { .. } => "Duplicates removed",
            Action::Archived { .. } => "Files archived",
            Action::Skipped { .. } => "Files skipped",
        }
    }
}

/// A failure that affected one file only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(path: &Path, error: &SweepError) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    }
}

/// The outcome of one pass over one folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub actions: Vec<Action>,
    pub failures: Vec<ItemFailure>,
}

impl PassReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn fail(&mut self, path: &Path, error: &SweepError) {
        self.failures.push(ItemFailure::new(path, error));
    }

    /// Appends everything from `other`.
    pub fn merge(&mut self, other: PassReport) {
        self.actions.extend(other.actions);
        self.failures.extend(other.failures);
    }

    /// Returns true if no item failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn count<F: Fn(&Action) -> bool>(&self, predicate: F) -> usize {
        self.actions.iter().filter(|a| predicate(a)).count()
    }
}

/// Everything that happened to one target folder during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub initialize: PassReport,
    pub relocate: PassReport,
    pub dedupe: PassReport,
    pub archive: PassReport,
}

impl FolderReport {
    pub fn new(folder: &Path) -> Self {
        Self {
            folder: folder.to_path_buf(),
            initialize: PassReport::new(),
            relocate: PassReport::new(),
            dedupe: PassReport::new(),
            archive: PassReport::new(),
        }
    }

    fn passes(&self) -> [&PassReport; 4] {
        [&self.initialize, &self.relocate, &self.dedupe, &self.archive]
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.passes().into_iter().flat_map(|p| p.actions.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.passes().into_iter().flat_map(|p| p.failures.iter())
    }
}

/// A target folder that could not be processed at all this cycle.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFolder {
    pub folder: PathBuf,
    pub reason: String,
}

/// The outcome of one full cycle across all target folders.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// RFC 3339 timestamp of when the cycle started.
    pub started_at: String,
    pub folders: Vec<FolderReport>,
    pub skipped: Vec<SkippedFolder>,
}

impl CycleReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Local::now().to_rfc3339(),
            folders: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Counts actions by their summary label.
    pub fn action_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for action in self.folders.iter().flat_map(FolderReport::actions) {
            *counts.entry(action.label()).or_insert(0) += 1;
        }
        counts
    }

    pub fn failure_count(&self) -> usize {
        self.folders.iter().map(|f| f.failures().count()).sum()
    }

    /// Returns true if nothing was touched and nothing went wrong.
    pub fn is_idle(&self) -> bool {
        self.skipped.is_empty()
            && self.failure_count() == 0
            && self.folders.iter().all(|f| f.actions().next().is_none())
    }
}

impl Default for CycleReport {
    fn default() -> Self {
        Self::new()
    }
}
