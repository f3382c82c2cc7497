//! Removal of byte-identical files within a single folder.
//!
//! Files are first grouped by size; only sizes shared by two or more files
//! are hashed. Candidates are visited oldest first (ties broken by name), so
//! the copy that survives is always the one with the oldest modification time.

use crate::config::CompiledFilters;
use crate::error::{SweepError, SweepResult};
use crate::report::{Action, PassReport};
use crate::scan::{FileEntry, list_files};
use blake3::Hasher;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Bytes read per hashing step.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Computes the BLAKE3 digest of a file's full content.
pub fn hash_file(path: &Path) -> std::io::Result<blake3::Hash> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_CHUNK_SIZE, file);
    let mut hasher = Hasher::new();

    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Orders files so that the one to keep comes first.
fn retention_order(files: &mut [FileEntry]) {
    files.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
}

/// Keeps only files whose size is shared with at least one other file.
fn same_size_candidates(files: Vec<FileEntry>) -> Vec<FileEntry> {
    let mut sizes: HashMap<u64, usize> = HashMap::new();
    for file in &files {
        *sizes.entry(file.len).or_insert(0) += 1;
    }
    files
        .into_iter()
        .filter(|f| sizes.get(&f.len).copied().unwrap_or(0) > 1)
        .collect()
}

/// Deletes every file in `folder` whose content duplicates an older file.
///
/// The scan is not recursive and keeps no state across folders. A file that
/// cannot be hashed or deleted is recorded as a failure and skipped.
///
/// # Errors
///
/// Returns [`SweepError::FolderUnavailable`] only if `folder` cannot be listed.
///
/// # Examples
///
/// ```no_run
/// use dirsweep::config::CompiledFilters;
/// use dirsweep::dedupe::remove_duplicates;
/// use std::path::Path;
///
/// let report = remove_duplicates(Path::new("/home/me/Downloads/Images"), &CompiledFilters::default())?;
/// println!("removed {} duplicates", report.actions.len());
/// # Ok::<(), dirsweep::SweepError>(())
/// ```
pub fn remove_duplicates(folder: &Path, filters: &CompiledFilters) -> SweepResult<PassReport> {
    let mut report = PassReport::new();
    let files = list_files(folder, filters, &mut report)?;
    remove_duplicate_entries(files, &mut report);
    Ok(report)
}

/// Hashes and deletes duplicates among already listed `files`.
fn remove_duplicate_entries(files: Vec<FileEntry>, report: &mut PassReport) {
    let mut candidates = same_size_candidates(files);
    retention_order(&mut candidates);

    let mut seen: HashMap<blake3::Hash, PathBuf> = HashMap::new();

    for file in candidates {
        let digest = match hash_file(&file.path) {
            Ok(digest) => digest,
            Err(e) => {
                let error = SweepError::Hash {
                    path: file.path.clone(),
                    source: e,
                };
                log::warn!("{error}");
                report.fail(&file.path, &error);
                continue;
            }
        };

        match seen.get(&digest) {
            Some(kept) => match fs::remove_file(&file.path) {
                Ok(()) => {
                    log::info!(
                        "Removed duplicate file: {} (same as {})",
                        file.path.display(),
                        kept.display()
                    );
                    report.record(Action::DuplicateRemoved {
                        removed: file.path,
                        kept: kept.clone(),
                    });
                }
                Err(e) => {
                    let error = SweepError::Delete {
                        path: file.path.clone(),
                        source: e,
                    };
                    log::warn!("{error}");
                    report.fail(&file.path, &error);
                }
            },
            None => {
                seen.insert(digest, file.path);
            }
        }
    }
}
