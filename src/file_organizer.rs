/// Category folder setup and loose file relocation.
///
/// This module creates the fixed set of category subdirectories under a target
/// folder and moves the files lying directly in it into those subdirectories.
use crate::config::{CollisionPolicy, CompiledFilters};
use crate::error::{SweepError, SweepResult};
use crate::file_category::{Category, classify};
use crate::report::{Action, PassReport};
use crate::scan::list_files;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Upper bound on `name (N).ext` candidates tried before giving up.
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// Where a file should go, once collisions have been taken into account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write to this path.
    Path(PathBuf),
    /// The name is taken and the policy says to leave the file alone.
    Taken(PathBuf),
}

/// Picks the destination for `file_name` inside `dir` under `policy`.
///
/// With [`CollisionPolicy::Rename`], `report.pdf` becomes `report (1).pdf`,
/// then `report (2).pdf`, and so on. The check is not atomic: a file created
/// between this call and the write can still be replaced.
///
/// # Errors
///
/// Returns [`SweepError::NoFreeName`] if every rename candidate is taken.
pub fn resolve_destination(
    dir: &Path,
    file_name: &OsStr,
    policy: CollisionPolicy,
) -> SweepResult<Destination> {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Ok(Destination::Path(candidate));
    }

    match policy {
        CollisionPolicy::Overwrite => Ok(Destination::Path(candidate)),
        CollisionPolicy::Skip => Ok(Destination::Taken(candidate)),
        CollisionPolicy::Rename => {
            let as_path = Path::new(file_name);
            let stem = as_path.file_stem().unwrap_or(file_name);
            let extension = as_path.extension();

            for n in 1..=MAX_RENAME_ATTEMPTS {
                let mut name = OsString::from(stem);
                name.push(format!(" ({n})"));
                if let Some(ext) = extension {
                    name.push(".");
                    name.push(ext);
                }
                let candidate = dir.join(&name);
                if !candidate.exists() {
                    return Ok(Destination::Path(candidate));
                }
            }

            Err(SweepError::NoFreeName {
                name: file_name.to_string_lossy().into_owned(),
                dir: dir.to_path_buf(),
            })
        }
    }
}

/// Creates the directory at `path` unless it already exists.
///
/// Returns true if the directory had to be created.
pub(crate) fn ensure_dir(path: &Path) -> SweepResult<bool> {
    match fs::create_dir(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(false),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(SweepError::DirectoryCreation {
            path: path.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a file with this name already exists",
            ),
        }),
        Err(e) => Err(SweepError::DirectoryCreation {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Sorts files into category subdirectories.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Creates every category subfolder that is missing under `target`.
    ///
    /// Returns the folders that were actually created, so a second call on
    /// the same target returns an empty list.
    ///
    /// # Errors
    ///
    /// * [`SweepError::FolderUnavailable`] if `target` is not an accessible directory
    /// * [`SweepError::DirectoryCreation`] if a subfolder cannot be created, or if a
    ///   regular file already holds its name
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsweep::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let created = FileOrganizer::ensure_category_folders(Path::new("/home/me/Downloads"))?;
    /// println!("created {} folders", created.len());
    /// # Ok::<(), dirsweep::SweepError>(())
    /// ```
    pub fn ensure_category_folders(target: &Path) -> SweepResult<Vec<PathBuf>> {
        match fs::metadata(target) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(SweepError::FolderUnavailable {
                    path: target.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
                });
            }
            Err(e) => {
                return Err(SweepError::FolderUnavailable {
                    path: target.to_path_buf(),
                    source: e,
                });
            }
        }

        let mut created = Vec::new();
        for category in Category::ALL {
            let category_path = target.join(category.dir_name());
            if ensure_dir(&category_path)? {
                log::info!("{} folder created in {}", category, target.display());
                created.push(category_path);
            }
        }

        Ok(created)
    }

    /// Moves every loose file in `target` into its category subfolder.
    ///
    /// Each file is handled on its own: a failed move is recorded in the
    /// returned report and the remaining files are still processed. Category
    /// folders are expected to exist already.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::FolderUnavailable`] only if `target` cannot be listed.
    pub fn move_loose_files(
        target: &Path,
        filters: &CompiledFilters,
        policy: CollisionPolicy,
    ) -> SweepResult<PassReport> {
        let mut report = PassReport::new();
        let files = list_files(target, filters, &mut report)?;

        for file in files {
            let category = classify(&file.name());
            let category_dir = target.join(category.dir_name());

            match Self::move_to_category(&file.path, &file.file_name, &category_dir, policy) {
                Ok(Destination::Path(new_path)) => {
                    log::info!("{} moved to {}", file.name(), new_path.display());
                    report.record(Action::Moved {
                        from: file.path,
                        to: new_path,
                        category,
                    });
                }
                Ok(Destination::Taken(existing)) => {
                    log::info!(
                        "{} left in place: {} already exists",
                        file.name(),
                        existing.display()
                    );
                    report.record(Action::Skipped {
                        path: file.path,
                        reason: format!("{} already exists", existing.display()),
                    });
                }
                Err(e) => {
                    log::warn!("{e}");
                    report.fail(&file.path, &e);
                }
            }
        }

        Ok(report)
    }

    /// Moves one file into `category_dir`, honouring the collision policy.
    fn move_to_category(
        file_path: &Path,
        file_name: &OsStr,
        category_dir: &Path,
        policy: CollisionPolicy,
    ) -> SweepResult<Destination> {
        let destination = resolve_destination(category_dir, file_name, policy)?;
        if let Destination::Path(ref destination_path) = destination {
            fs::rename(file_path, destination_path).map_err(|e| SweepError::Move {
                from: file_path.to_path_buf(),
                to: destination_path.clone(),
                source: e,
            })?;
        }
        Ok(destination)
    }
}
