//! Source file discovery and grouping by filename prefix

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions, Pattern};
use serde::Serialize;
use tracing::warn;

use crate::config::PDF_EXTENSION;
use crate::error::{Error, IoOperation, Result};

/// Source files sharing one group key, in merge order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGroup {
    pub key: String,
    pub files: Vec<PathBuf>,
}

/// List the `*.pdf` files directly inside `dir`
///
/// The match is case-sensitive and non-recursive. Hidden files (such as
/// `._name.pdf` resource forks) and directories whose name ends in `.pdf`
/// are left out. The result is sorted.
pub fn list_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir
        .to_str()
        .ok_or_else(|| Error::NonUtf8Path(dir.to_path_buf()))?;
    let pattern = format!("{}/*.{}", Pattern::escape(dir_str), PDF_EXTENSION);

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let entries = glob_with(&pattern, options).map_err(|e| Error::InvalidGlob(e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let source = std::io::Error::new(e.error().kind(), e.error().to_string());
            Error::io(IoOperation::ReadDir, e.path(), source)
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Group key of a filename: its first `prefix_length` characters
///
/// Names shorter than `prefix_length` are returned whole.
pub fn group_key(file_name: &str, prefix_length: usize) -> String {
    file_name.chars().take(prefix_length).collect()
}

/// Partition `files` into groups keyed by filename prefix
///
/// Groups come out in ascending key order and the files of a group in
/// ascending filename order. Each file lands in the group of its own key.
pub fn partition(files: &[PathBuf], prefix_length: usize) -> Vec<FileGroup> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };
        groups
            .entry(group_key(name, prefix_length))
            .or_default()
            .push(path.clone());
    }

    groups
        .into_iter()
        .map(|(key, mut files)| {
            files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            FileGroup { key, files }
        })
        .collect()
}

/// Pairs `(short, long)` of group keys where `short` is a proper prefix of `long`
///
/// This only happens when a filename is shorter than the prefix length.
pub fn overlapping_keys(groups: &[FileGroup]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for short in groups {
        for long in groups {
            if long.key.len() > short.key.len() && long.key.starts_with(&short.key) {
                pairs.push((short.key.clone(), long.key.clone()));
            }
        }
    }
    pairs
}
