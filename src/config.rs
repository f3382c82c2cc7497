//! Agent configuration.
//!
//! Settings are read from a TOML file and may be overridden on the command
//! line. The file has two tables: `[sweep]` controls what the agent does and
//! how often, `[filters]` decides which files it is allowed to touch.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sweep]
//! folders = ["~/Desktop", "~/Downloads"]
//! interval_secs = 5
//! age_threshold_days = 30
//! collision = "rename"
//! scope = "categories"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "desktop.ini"]
//! patterns = ["*.part"]
//! extensions = ["crdownload", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use clap::ValueEnum;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default pause between two cycles.
pub const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Default age, in whole days, a file must exceed before it is archived.
pub const DEFAULT_AGE_THRESHOLD_DAYS: u64 = 30;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': patterns match file names, e.g. *.part or ~$*")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// The interval must be at least one second.
    #[error("Invalid interval: must be at least 1 second")]
    InvalidInterval,
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// What to do when a file's destination name is already taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Pick the first free `name (N).ext`.
    #[default]
    Rename,
    /// Leave the source file where it is.
    Skip,
    /// Replace the existing destination.
    Overwrite,
}

/// Which folders the dedupe and archive passes look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SweepScope {
    /// Only the target folder itself.
    TopLevel,
    /// The target folder and each of its category subfolders.
    #[default]
    Categories,
}

/// Complete agent configuration as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub sweep: SweepSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// The `[sweep]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// Target folders; `~` expands to the home directory. Empty means the
    /// platform defaults (Desktop and Downloads).
    #[serde(default)]
    pub folders: Vec<String>,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_age_threshold_days")]
    pub age_threshold_days: u64,

    #[serde(default)]
    pub collision: CollisionPolicy,

    #[serde(default)]
    pub scope: SweepScope,
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_age_threshold_days() -> u64 {
    DEFAULT_AGE_THRESHOLD_DAYS
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            age_threshold_days: DEFAULT_AGE_THRESHOLD_DAYS,
            collision: CollisionPolicy::default(),
            scope: SweepScope::default(),
        }
    }
}

impl SweepSettings {
    /// Pause between two cycles.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(Duration::from_secs(self.interval_secs))
    }

    /// Target folders with `~` expanded.
    pub fn expanded_folders(&self) -> Vec<PathBuf> {
        self.folders
            .iter()
            .map(|f| PathBuf::from(shellexpand::tilde(f).as_ref()))
            .collect()
    }
}

/// The `[filters]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to touch hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from every pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "crdownload", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SweepConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsweep.toml` in the current directory
    /// 3. Look for `dirsweep/config.toml` in the user's config directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file is malformed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsweep.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dirsweep").join("config.toml");
            if user_config.exists() {
                return Self::load_from_file(&user_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compile rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

/// Compiled filter rules, ready for matching against file paths.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl Default for CompiledFilters {
    /// Lets every file through.
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a file may be touched by the agent.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match (against the name) - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches(&file_name)) {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.exclude_patterns.iter().any(|p| p.matches(&file_name)) {
            return false;
        }

        if self.exclude_regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_with(exclude: ExcludeRules) -> FilterRules {
        FilterRules {
            enable_hidden_files: true,
            exclude,
            include: IncludeRules::default(),
        }
    }

    #[test]
    fn test_default_settings() {
        let config = SweepConfig::default();
        assert_eq!(config.sweep.interval_secs, 5);
        assert_eq!(config.sweep.age_threshold_days, 30);
        assert_eq!(config.sweep.collision, CollisionPolicy::Rename);
        assert_eq!(config.sweep.scope, SweepScope::Categories);
        assert!(config.sweep.folders.is_empty());
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SweepConfig::parse(
            r#"
            [sweep]
            folders = ["/data/inbox"]
            interval_secs = 300
            age_threshold_days = 7
            collision = "skip"
            scope = "top-level"

            [filters.exclude]
            extensions = ["crdownload"]
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep.folders, vec!["/data/inbox".to_string()]);
        assert_eq!(config.sweep.interval().unwrap(), Duration::from_secs(300));
        assert_eq!(config.sweep.age_threshold_days, 7);
        assert_eq!(config.sweep.collision, CollisionPolicy::Skip);
        assert_eq!(config.sweep.scope, SweepScope::TopLevel);
        assert_eq!(config.filters.exclude.extensions, vec!["crdownload"]);
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = SweepConfig::parse("[sweep]\ninterval_secs = 60\n").unwrap();
        assert_eq!(config.sweep.interval_secs, 60);
        assert_eq!(config.sweep.age_threshold_days, 30);
        assert_eq!(config.sweep.collision, CollisionPolicy::Rename);
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let result = SweepConfig::parse("[sweep]\ncollision = \"merge\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let settings = SweepSettings {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(settings.interval(), Err(ConfigError::InvalidInterval)));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = SweepConfig::load(Some(Path::new("/non/existent/dirsweep.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_expanded_folders_keeps_absolute_paths() {
        let settings = SweepSettings {
            folders: vec!["/srv/drop".to_string()],
            ..Default::default()
        };
        assert_eq!(settings.expanded_folders(), vec![PathBuf::from("/srv/drop")]);
    }

    #[test]
    fn test_expanded_folders_expands_tilde() {
        let settings = SweepSettings {
            folders: vec!["~/Downloads".to_string()],
            ..Default::default()
        };
        let expanded = settings.expanded_folders();
        assert!(!expanded[0].to_string_lossy().starts_with('~'));
        assert!(expanded[0].ends_with("Downloads"));
    }

    #[test]
    fn test_hidden_file_included_by_default() {
        let compiled = CompiledFilters::default();
        assert!(compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("report.pdf")));

        let parsed = SweepConfig::parse("[filters]\n").unwrap();
        assert!(parsed.filters.compile().unwrap().should_include(Path::new(".notes.txt")));
    }

    #[test]
    fn test_hidden_file_excluded_when_disabled() {
        let rules = FilterRules {
            enable_hidden_files: false,
            ..rules_with(ExcludeRules::default())
        };
        let compiled = rules.compile().unwrap();
        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("report.pdf")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = rules_with(ExcludeRules {
            filenames: vec!["desktop.ini".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("/home/u/Desktop/desktop.ini")));
        assert!(compiled.should_include(Path::new("/home/u/Desktop/image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = rules_with(ExcludeRules {
            extensions: vec!["crdownload".to_string(), ".part".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("movie.mp4.crdownload")));
        assert!(!compiled.should_include(Path::new("movie.mp4.PART")));
        assert!(compiled.should_include(Path::new("movie.mp4")));
    }

    #[test]
    fn test_exclude_glob_matches_file_name() {
        let compiled = rules_with(ExcludeRules {
            patterns: vec!["~$*".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("/home/u/Desktop/~$report.docx")));
        assert!(compiled.should_include(Path::new("/home/u/Desktop/report.docx")));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = rules_with(ExcludeRules {
            regex: vec![r"^keep_.*$".to_string()],
            ..Default::default()
        })
        .compile()
        .unwrap();

        assert!(!compiled.should_include(Path::new("keep_me.txt")));
        assert!(compiled.should_include(Path::new("move_me.txt")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let rules = FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: vec!["tmp".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec![".important".to_string(), "wanted.tmp".to_string()],
            },
        };
        let compiled = rules.compile().unwrap();

        assert!(compiled.should_include(Path::new(".important")));
        assert!(compiled.should_include(Path::new("wanted.tmp")));
        assert!(!compiled.should_include(Path::new(".other")));
        assert!(!compiled.should_include(Path::new("other.tmp")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let result = rules_with(ExcludeRules {
            regex: vec!["[invalid(".to_string()],
            ..Default::default()
        })
        .compile();

        assert!(matches!(
            result,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let result = rules_with(ExcludeRules {
            patterns: vec!["[".to_string()],
            ..Default::default()
        })
        .compile();

        assert!(matches!(result, Err(ConfigError::InvalidGlobPattern(_))));
    }

    #[test]
    fn test_invalid_glob_message_describes_file_name_patterns() {
        let message = ConfigError::InvalidGlobPattern("[".to_string()).to_string();
        assert!(message.contains("file names"));
        assert!(!message.contains("dir/**"));
    }
}
