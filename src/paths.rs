//! Platform default target folders.

use std::path::PathBuf;

/// The folders swept when none are configured: Desktop, then Downloads.
///
/// Folders the platform cannot resolve are left out, so the list may be
/// shorter than two (or empty on headless systems).
pub fn default_target_folders() -> Vec<PathBuf> {
    [dirs::desktop_dir(), dirs::download_dir()]
        .into_iter()
        .flatten()
        .collect()
}
