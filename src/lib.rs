//! PDF Group Merge Library
//!
//! Groups the PDF files of a directory by a fixed-length filename prefix
//! and concatenates each group into one PDF under `<dir>/output`.
//! This library provides functionality to:
//! - Discover source PDFs and derive group keys from their names
//! - Merge whole documents with lopdf, in sorted filename order
//! - Report per-group outcomes of a batch run
//!
//! # Example
//!
//! ```no_run
//! use pdf_group_merge::{BatchMerger, MergerConfig};
//!
//! let config = MergerConfig::new("maps")
//!     .with_theme_suffix("Territoire")
//!     .with_prefix_length(5);
//!
//! let report = BatchMerger::new(config)?.run_with(|group| println!("{}", group.key))?;
//! assert!(report.is_success());
//! # Ok::<(), pdf_group_merge::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod grouping;
pub mod merger;
pub mod pdf;
pub mod report;

// Re-export commonly used items
pub use config::{FailurePolicy, MergerConfig, DEFAULT_PREFIX_LENGTH};
pub use error::{Error, Result};
pub use merger::BatchMerger;
pub use report::{GroupOutcome, GroupStatus, MergeReport};
