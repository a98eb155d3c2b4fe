//! Outcome of a merge run

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Final state of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GroupStatus {
    /// Output file written
    Written,
    /// Dry run: output would be written
    Planned,
    /// No output file for this group
    Failed { reason: String },
}

/// Source file left out of its group's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened to one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupOutcome {
    pub key: String,
    pub output_path: PathBuf,
    /// Every source file of the group, in merge order
    pub inputs: Vec<PathBuf>,
    /// Source files whose pages made it into the output
    pub merged: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
    pub pages: usize,
    #[serde(flatten)]
    pub status: GroupStatus,
}

impl GroupOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, GroupStatus::Failed { .. })
    }
}

/// Aggregate report of a run, one outcome per group in key order
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub output_dir: PathBuf,
    pub groups: Vec<GroupOutcome>,
}

impl MergeReport {
    pub fn written(&self) -> impl Iterator<Item = &GroupOutcome> {
        self.groups
            .iter()
            .filter(|g| g.status == GroupStatus::Written)
    }

    pub fn failed(&self) -> impl Iterator<Item = &GroupOutcome> {
        self.groups.iter().filter(|g| g.is_failed())
    }

    pub fn skipped_files(&self) -> impl Iterator<Item = &SkippedFile> {
        self.groups.iter().flat_map(|g| g.skipped.iter())
    }

    /// True when no group failed
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn total_pages(&self) -> usize {
        self.groups.iter().map(|g| g.pages).sum()
    }

    pub fn group(&self, key: &str) -> Option<&GroupOutcome> {
        self.groups.iter().find(|g| g.key == key)
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let planned = self
            .groups
            .iter()
            .filter(|g| g.status == GroupStatus::Planned)
            .count();

        write!(f, "{} groups", self.groups.len())?;
        if planned > 0 {
            write!(f, ", {} planned", planned)?;
        } else {
            write!(f, ", {} written", self.written().count())?;
        }
        write!(
            f,
            ", {} failed, {} files skipped, {} pages",
            self.failed().count(),
            self.skipped_files().count(),
            self.total_pages()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(key: &str, pages: usize, status: GroupStatus) -> GroupOutcome {
        GroupOutcome {
            key: key.to_string(),
            output_path: PathBuf::from(format!("output/{}.pdf", key)),
            inputs: vec![PathBuf::from(format!("{}_1.pdf", key))],
            merged: vec![],
            skipped: vec![],
            pages,
            status,
        }
    }

    #[test]
    fn test_summary() {
        let report = MergeReport {
            output_dir: PathBuf::from("output"),
            groups: vec![
                outcome("AAAAA", 5, GroupStatus::Written),
                outcome("BBBBB", 0, GroupStatus::Failed { reason: "broken".into() }),
            ],
        };

        assert!(!report.is_success());
        assert_eq!(report.total_pages(), 5);
        assert_eq!(
            report.to_string(),
            "2 groups, 1 written, 1 failed, 0 files skipped, 5 pages"
        );
        assert!(report.group("BBBBB").unwrap().is_failed());
    }

    #[test]
    fn test_json_shape() {
        let report = MergeReport {
            output_dir: PathBuf::from("output"),
            groups: vec![outcome("CCCCC", 0, GroupStatus::Failed { reason: "broken".into() })],
        };

        let json = serde_json::to_value(&report).unwrap();
        let group = &json["groups"][0];
        assert_eq!(group["key"], "CCCCC");
        assert_eq!(group["status"], "failed");
        assert_eq!(group["reason"], "broken");
    }
}
