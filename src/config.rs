//! Run configuration for the batch merger

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Error, Result};

/// Number of leading filename characters used as the group key by default
pub const DEFAULT_PREFIX_LENGTH: usize = 5;

/// Name of the subdirectory of the input directory receiving merged PDFs
pub const OUTPUT_DIR_NAME: &str = "output";

/// Extension of source and output files (matched case-sensitively)
pub const PDF_EXTENSION: &str = "pdf";

/// What to do when a source file in a group cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Skip the unreadable file, log a warning and merge the rest of the group
    #[default]
    SkipFile,
    /// Produce no output for the group and continue with the next one
    AbortGroup,
}

/// Configuration for a merge run, validated once before the run starts
#[derive(Debug, Clone)]
pub struct MergerConfig {
    /// Directory containing the source PDFs
    pub input_dir: PathBuf,
    /// Appended to each group key to form the output filename stem
    pub theme_suffix: String,
    /// Number of leading filename characters forming the group key
    pub prefix_length: usize,
    /// Handling of unreadable source files
    pub on_error: FailurePolicy,
    /// Plan the run without touching the filesystem
    pub dry_run: bool,
}

impl MergerConfig {
    /// Create a configuration with default settings for `input_dir`
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            theme_suffix: String::new(),
            prefix_length: DEFAULT_PREFIX_LENGTH,
            on_error: FailurePolicy::default(),
            dry_run: false,
        }
    }

    pub fn with_theme_suffix(mut self, theme_suffix: impl Into<String>) -> Self {
        self.theme_suffix = theme_suffix.into();
        self
    }

    pub fn with_prefix_length(mut self, prefix_length: usize) -> Self {
        self.prefix_length = prefix_length;
        self
    }

    pub fn with_failure_policy(mut self, on_error: FailurePolicy) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the configuration against the filesystem
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.exists() {
            return Err(Error::InputDirNotFound(self.input_dir.clone()));
        }
        if !self.input_dir.is_dir() {
            return Err(Error::NotADirectory(self.input_dir.clone()));
        }
        if self.prefix_length == 0 {
            return Err(Error::InvalidPrefixLength(self.prefix_length));
        }
        if self.theme_suffix.contains(&['/', '\\'][..]) {
            return Err(Error::InvalidThemeSuffix(self.theme_suffix.clone()));
        }
        Ok(())
    }

    /// Directory receiving the merged PDFs
    pub fn output_dir(&self) -> PathBuf {
        self.input_dir.join(OUTPUT_DIR_NAME)
    }

    /// Output path for the group identified by `key`
    pub fn output_path(&self, key: &str) -> PathBuf {
        self.output_dir()
            .join(format!("{}{}.{}", key, self.theme_suffix, PDF_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MergerConfig::new("maps");
        assert_eq!(config.prefix_length, 5);
        assert_eq!(config.theme_suffix, "");
        assert_eq!(config.on_error, FailurePolicy::SkipFile);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_output_path() {
        let config = MergerConfig::new("maps").with_theme_suffix("Territoire");
        assert_eq!(
            config.output_path("01234"),
            Path::new("maps").join("output").join("01234Territoire.pdf")
        );
    }

    #[test]
    fn test_validate_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = MergerConfig::new(temp_dir.path().join("missing"));
        assert!(matches!(config.validate(), Err(Error::InputDirNotFound(_))));
    }

    #[test]
    fn test_validate_file_instead_of_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.pdf");
        std::fs::write(&file, b"x").unwrap();
        let config = MergerConfig::new(file);
        assert!(matches!(config.validate(), Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_validate_zero_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let config = MergerConfig::new(temp_dir.path()).with_prefix_length(0);
        assert!(matches!(config.validate(), Err(Error::InvalidPrefixLength(0))));
    }

    #[test]
    fn test_validate_theme_with_separator() {
        let temp_dir = TempDir::new().unwrap();
        let config = MergerConfig::new(temp_dir.path()).with_theme_suffix("../up");
        assert!(matches!(config.validate(), Err(Error::InvalidThemeSuffix(_))));

        let config = MergerConfig::new(temp_dir.path()).with_theme_suffix("Territoire");
        assert!(config.validate().is_ok());
    }
}
