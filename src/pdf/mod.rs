//! PDF manipulation module

pub mod merge;
pub mod metadata;

// Re-export commonly used items
pub use merge::{open_source, MergeAccumulator};
pub use metadata::count_pages;
