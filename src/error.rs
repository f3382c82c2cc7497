//! Error types for sweep operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while sweeping a folder.
///
/// Folder-level variants (`FolderUnavailable`, `DirectoryCreation`) cause the
/// whole folder to be skipped for the cycle. The rest describe a single file
/// and end up as an [`ItemFailure`](crate::report::ItemFailure).
#[derive(Debug, Error)]
pub enum SweepError {
    /// The target folder does not exist or cannot be listed.
    #[error("folder {} is unavailable: {source}", path.display())]
    FolderUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A category subfolder could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata for a directory entry could not be read.
    #[error("failed to inspect {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be moved into its category folder.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be read while hashing it.
    #[error("failed to hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be opened for reading.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be deleted.
    #[error("failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the archive container failed.
    #[error("failed to write archive {}: {source}", archive.display())]
    ArchiveIo {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer reported an error.
    #[error("failed to compress into {}: {source}", archive.display())]
    ArchiveZip {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// No free destination name exists for a file.
    #[error("no free name for {} in {}", name, dir.display())]
    NoFreeName { name: String, dir: PathBuf },
}

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;
