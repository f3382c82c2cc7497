//! Non-recursive listing of the regular files inside one folder.

use crate::config::CompiledFilters;
use crate::error::{SweepError, SweepResult};
use crate::report::PassReport;
use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A regular file found directly inside a folder.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// The file name, exactly as stored on disk.
    pub file_name: OsString,
    /// The full path to the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub len: u64,
}

impl FileEntry {
    /// The file name as text, with invalid UTF-8 replaced.
    pub fn name(&self) -> Cow<'_, str> {
        self.file_name.to_string_lossy()
    }
}

/// Lists the regular files directly inside `folder` that pass `filters`.
///
/// Directories and symlinks are skipped. Entries whose metadata cannot be
/// read are recorded as failures in `report` and left out.
///
/// # Errors
///
/// Returns [`SweepError::FolderUnavailable`] if `folder` cannot be listed.
pub fn list_files(
    folder: &Path,
    filters: &CompiledFilters,
    report: &mut PassReport,
) -> SweepResult<Vec<FileEntry>> {
    let entries = fs::read_dir(folder).map_err(|e| SweepError::FolderUnavailable {
        path: folder.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.fail(
                    folder,
                    &SweepError::Metadata {
                        path: folder.to_path_buf(),
                        source: e,
                    },
                );
                continue;
            }
        };

        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if file_type.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                report.fail(&path, &SweepError::Metadata { path: path.clone(), source: e });
                continue;
            }
        }

        if !filters.should_include(&path) {
            log::trace!("Ignoring filtered file {}", path.display());
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                report.fail(&path, &SweepError::Metadata { path: path.clone(), source: e });
                continue;
            }
        };

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                report.fail(&path, &SweepError::Metadata { path: path.clone(), source: e });
                continue;
            }
        };

        files.push(FileEntry {
            file_name: entry.file_name(),
            path,
            modified,
            len: metadata.len(),
        });
    }

    Ok(files)
}
