//! File categorization by extension.
//!
//! Every file name maps to exactly one of seven fixed categories. The mapping
//! lives in an immutable [`ExtensionTable`] built once per process.
//!
//! # Examples
//!
//! ```
//! use dirsweep::file_category::{Category, classify};
//!
//! assert_eq!(classify("report.PDF"), Category::Documents);
//! assert_eq!(classify("holiday.jpeg"), Category::Images);
//! assert_eq!(classify("notes"), Category::Others);
//! ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

/// Represents a file category.
///
/// The set is closed: each variant owns one subfolder under every target
/// folder, named exactly like the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Documents (PDF, DOCX, TXT, XLSX, PPTX)
    Documents,
    /// Images (JPG, JPEG, PNG, GIF)
    Images,
    /// Videos (MP4, MOV, AVI)
    Videos,
    /// Music (MP3, WAV)
    Music,
    /// Archives (ZIP, RAR, TAR)
    Archives,
    /// Programs and scripts (EXE, SH, BAT)
    Programs,
    /// Anything not matched above
    Others,
}

impl Category {
    /// All categories, in the order their folders are created.
    pub const ALL: [Category; 7] = [
        Category::Documents,
        Category::Images,
        Category::Videos,
        Category::Music,
        Category::Archives,
        Category::Programs,
        Category::Others,
    ];

    /// Returns the subfolder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Archives => "Archives",
            Category::Programs => "Programs",
            Category::Others => "Others",
        }
    }

    /// Returns the category whose subfolder is called `name`, if any.
    pub fn from_dir_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Maps lowercase file extensions to categories.
///
/// Only the standard table exists; it is never modified after construction.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    extension_map: HashMap<&'static str, Category>,
}

static STANDARD_TABLE: LazyLock<ExtensionTable> = LazyLock::new(ExtensionTable::build);

impl ExtensionTable {
    /// Returns the process-wide standard table.
    pub fn standard() -> &'static ExtensionTable {
        &STANDARD_TABLE
    }

    fn build() -> Self {
        const ENTRIES: &[(Category, &[&str])] = &[
            (Category::Documents, &["pdf", "docx", "txt", "xlsx", "pptx"]),
            (Category::Images, &["jpg", "jpeg", "png", "gif"]),
            (Category::Videos, &["mp4", "mov", "avi"]),
            (Category::Music, &["mp3", "wav"]),
            (Category::Archives, &["zip", "rar", "tar"]),
            (Category::Programs, &["exe", "sh", "bat"]),
        ];

        let extension_map = ENTRIES
            .iter()
            .flat_map(|(category, exts)| exts.iter().map(move |ext| (*ext, *category)))
            .collect();

        Self { extension_map }
    }

    /// Maps a file extension (without the dot) to a category.
    ///
    /// Matching is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsweep::file_category::{Category, ExtensionTable};
    ///
    /// let table = ExtensionTable::standard();
    /// assert_eq!(table.extension_to_category("MP3"), Some(Category::Music));
    /// assert_eq!(table.extension_to_category("xyz"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(ext.to_lowercase().as_str()).copied()
    }

    /// Determines the category of a file from its name.
    ///
    /// Only the final path component is considered. A name without an
    /// extension, including dotfiles such as `.bashrc`, is `Others`.
    pub fn classify(&self, file_name: &str) -> Category {
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.extension_to_category(ext))
            .unwrap_or(Category::Others)
    }
}

/// Classifies a file name using the standard extension table.
pub fn classify(file_name: &str) -> Category {
    ExtensionTable::standard().classify(file_name)
}
