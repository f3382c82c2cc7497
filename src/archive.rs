//! Compression of stale files into per-file zip archives.
//!
//! A file older than the threshold is written to `Archives/<name>.zip` as a
//! single Deflate entry named like the original, and the original is deleted
//! afterwards. The archive is first written to `<name>.zip.partial`, synced
//! and renamed into place; the source is only removed once that has
//! succeeded.

use crate::config::{CollisionPolicy, CompiledFilters};
use crate::error::{SweepError, SweepResult};
use crate::file_category::Category;
use crate::file_organizer::{Destination, ensure_dir, resolve_destination};
use crate::report::{Action, PassReport};
use crate::scan::{FileEntry, list_files};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Name of the archive subfolder, shared with the Archives category.
pub fn archive_dir_name() -> &'static str {
    Category::Archives.dir_name()
}

/// Age of a file in whole days, rounded down. Future timestamps count as 0.
pub fn file_age_days(modified: SystemTime, now: SystemTime) -> u64 {
    let modified: DateTime<Local> = modified.into();
    let now: DateTime<Local> = now.into();
    (now - modified).num_days().max(0) as u64
}

/// Converts a modification time to the local DOS timestamp stored in zip
/// headers. `None` for times zip cannot represent (before 1980 or after 2107).
fn zip_timestamp(modified: SystemTime) -> Option<zip::DateTime> {
    let local: DateTime<Local> = modified.into();
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .ok()
}

/// Archives every file in `folder` older than `threshold_days`.
///
/// # Errors
///
/// * [`SweepError::DirectoryCreation`] if the Archives subfolder cannot be created
/// * [`SweepError::FolderUnavailable`] if `folder` is missing or cannot be listed
pub fn archive_old_files(
    folder: &Path,
    threshold_days: u64,
    filters: &CompiledFilters,
    policy: CollisionPolicy,
) -> SweepResult<PassReport> {
    archive_old_files_at(folder, threshold_days, filters, policy, SystemTime::now())
}

/// Same as [`archive_old_files`], measuring ages against `now`.
pub fn archive_old_files_at(
    folder: &Path,
    threshold_days: u64,
    filters: &CompiledFilters,
    policy: CollisionPolicy,
    now: SystemTime,
) -> SweepResult<PassReport> {
    if !folder.is_dir() {
        return Err(SweepError::FolderUnavailable {
            path: folder.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not an existing directory"),
        });
    }
    let archive_dir = folder.join(archive_dir_name());
    ensure_dir(&archive_dir)?;

    let mut report = PassReport::new();
    let files = list_files(folder, filters, &mut report)?;

    for file in files {
        let age = file_age_days(file.modified, now);
        if age <= threshold_days {
            continue;
        }
        log::debug!("{} is {} days old", file.path.display(), age);

        let mut archive_name = OsString::from(&file.file_name);
        archive_name.push(".zip");

        let destination = match resolve_destination(&archive_dir, &archive_name, policy) {
            Ok(destination) => destination,
            Err(e) => {
                log::warn!("{e}");
                report.fail(&file.path, &e);
                continue;
            }
        };

        let archive_path = match destination {
            Destination::Path(path) => path,
            Destination::Taken(existing) => {
                log::info!(
                    "{} not archived: {} already exists",
                    file.name(),
                    existing.display()
                );
                report.record(Action::Skipped {
                    path: file.path,
                    reason: format!("{} already exists", existing.display()),
                });
                continue;
            }
        };

        if let Err(e) = write_archive(&file, &archive_path) {
            log::warn!("{e}");
            report.fail(&file.path, &e);
            continue;
        }
        log::info!(
            "Compressed '{}' into '{}'",
            file.name(),
            archive_path.display()
        );

        match fs::remove_file(&file.path) {
            Ok(()) => {
                log::info!("Removed original file '{}' after compression", file.name());
                report.record(Action::Archived {
                    source: file.path,
                    archive: archive_path,
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
        }
    }

    Ok(report)
}

/// Writes `file` into a new single-entry archive at `archive_path`.
///
/// The `.partial` file is removed if this fails; a failed removal is logged.
fn write_archive(file: &FileEntry, archive_path: &Path) -> SweepResult<()> {
    let mut partial_name = archive_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    partial_name.push(".partial");
    let partial_path = archive_path.with_file_name(partial_name);

    let result = write_partial(file, &partial_path).and_then(|()| {
        fs::rename(&partial_path, archive_path).map_err(|e| SweepError::ArchiveIo {
            archive: archive_path.to_path_buf(),
            source: e,
        })
    });

    if result.is_err() {
        match fs::remove_file(&partial_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Could not remove partial archive {}: {e}",
                partial_path.display()
            ),
        }
    }
    result
}

fn write_partial(file: &FileEntry, partial_path: &Path) -> SweepResult<()> {
    let io_error = |e: io::Error| SweepError::ArchiveIo {
        archive: partial_path.to_path_buf(),
        source: e,
    };
    let zip_error = |e: zip::result::ZipError| SweepError::ArchiveZip {
        archive: partial_path.to_path_buf(),
        source: e,
    };

    let mut source = File::open(&file.path).map_err(|e| SweepError::Read {
        path: file.path.clone(),
        source: e,
    })?;
    let output = File::create(partial_path).map_err(io_error)?;

    let mut zip = ZipWriter::new(output);
    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(file.len >= u64::from(u32::MAX));
    match zip_timestamp(file.modified) {
        Some(timestamp) => options = options.last_modified_time(timestamp),
        None => log::debug!(
            "{} has a modification time zip cannot store, using the current time",
            file.path.display()
        ),
    }

    if file.file_name.to_str().is_none() {
        log::warn!(
            "{} is not valid UTF-8, storing the entry as '{}'",
            file.path.display(),
            file.name()
        );
    }
    zip.start_file(file.name().into_owned(), options)
        .map_err(zip_error)?;
    io::copy(&mut source, &mut zip).map_err(io_error)?;

    let output = zip.finish().map_err(zip_error)?;
    output.sync_all().map_err(io_error)?;
    Ok(())
}

/// Returns the path the archive for `file_name` gets when nothing collides.
pub fn archive_path_for(folder: &Path, file_name: &str) -> PathBuf {
    folder
        .join(archive_dir_name())
        .join(format!("{file_name}.zip"))
}
