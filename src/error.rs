//! Error types for the PDF group merger

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Filesystem operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    /// Creating the output directory
    CreateDir,
    /// Listing the input directory
    ReadDir,
    /// Writing a merged PDF
    Write,
}

impl fmt::Display for IoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IoOperation::CreateDir => "create directory",
            IoOperation::ReadDir => "read directory",
            IoOperation::Write => "write",
        };
        f.write_str(name)
    }
}

/// Main error type for the PDF group merger
#[derive(Error, Debug)]
pub enum Error {
    /// Input directory does not exist
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    /// Input path exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Prefix length must be positive
    #[error("Invalid prefix length: {0} (must be at least 1)")]
    InvalidPrefixLength(usize),

    /// Theme suffix would escape the output directory
    #[error("Invalid theme suffix {0:?}: must not contain a path separator")]
    InvalidThemeSuffix(String),

    /// Input directory path cannot be turned into a glob pattern
    #[error("Input directory path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Source PDF could not be parsed
    #[error("Cannot read PDF {}: {source}", path.display())]
    UnreadablePdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    /// Source PDF is encrypted and the empty password does not open it
    #[error("PDF is encrypted: {}", .0.display())]
    EncryptedPdf(PathBuf),

    /// Page tree has no usable /Count entry
    #[error("PDF page tree has no page count: {}", .0.display())]
    MissingPageCount(PathBuf),

    /// Filesystem operation failed
    #[error("Failed to {op} {}: {source}", path.display())]
    Io {
        op: IoOperation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(op: IoOperation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the run configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::InputDirNotFound(_)
                | Error::NotADirectory(_)
                | Error::InvalidPrefixLength(_)
                | Error::InvalidThemeSuffix(_)
                | Error::NonUtf8Path(_)
                | Error::InvalidGlob(_)
        )
    }

    /// True for errors caused by a source file the PDF library rejects
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            Error::UnreadablePdf { .. } | Error::EncryptedPdf(_) | Error::MissingPageCount(_)
        )
    }
}
