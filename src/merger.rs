//! The batch merge loop

use std::fs;

use tracing::{debug, error, info, warn};

use crate::config::{FailurePolicy, MergerConfig};
use crate::error::{Error, IoOperation, Result};
use crate::grouping::{list_pdf_files, overlapping_keys, partition, FileGroup};
use crate::pdf::{open_source, MergeAccumulator};
use crate::report::{GroupOutcome, GroupStatus, MergeReport, SkippedFile};

/// Merges the PDFs of a directory group by group
#[derive(Debug, Clone)]
pub struct BatchMerger {
    config: MergerConfig,
}

impl BatchMerger {
    /// Validate `config` and build a merger from it
    pub fn new(config: MergerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MergerConfig {
        &self.config
    }

    /// Run the merge over every group
    pub fn run(&self) -> Result<MergeReport> {
        self.run_with(|_| {})
    }

    /// Run the merge, calling `on_group` after each group completes
    ///
    /// Only configuration, output directory creation and directory listing
    /// errors end the run early. Failures inside a group are recorded in
    /// the report and the run continues with the next group.
    pub fn run_with<F>(&self, mut on_group: F) -> Result<MergeReport>
    where
        F: FnMut(&GroupOutcome),
    {
        let output_dir = self.config.output_dir();
        if !self.config.dry_run {
            fs::create_dir_all(&output_dir)
                .map_err(|e| Error::io(IoOperation::CreateDir, &output_dir, e))?;
        }

        let files = list_pdf_files(&self.config.input_dir)?;
        let groups = partition(&files, self.config.prefix_length);
        info!(
            "Found {} PDF files in {} groups under {}",
            files.len(),
            groups.len(),
            self.config.input_dir.display()
        );

        for (short, long) in overlapping_keys(&groups) {
            warn!(
                "Group key {:?} is a prefix of {:?}; files stay in their own group",
                short, long
            );
        }

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in groups {
            let outcome = if self.config.dry_run {
                self.plan_group(group)
            } else {
                self.merge_group(group)
            };
            on_group(&outcome);
            outcomes.push(outcome);
        }

        Ok(MergeReport {
            output_dir,
            groups: outcomes,
        })
    }

    fn plan_group(&self, group: FileGroup) -> GroupOutcome {
        GroupOutcome {
            output_path: self.config.output_path(&group.key),
            key: group.key,
            merged: Vec::new(),
            inputs: group.files,
            skipped: Vec::new(),
            pages: 0,
            status: GroupStatus::Planned,
        }
    }

    fn merge_group(&self, group: FileGroup) -> GroupOutcome {
        let FileGroup { key, files } = group;
        let mut outcome = GroupOutcome {
            output_path: self.config.output_path(&key),
            key,
            inputs: files.clone(),
            merged: Vec::new(),
            skipped: Vec::new(),
            pages: 0,
            status: GroupStatus::Written,
        };

        // Dropped at the end of this call, before the next group starts
        let mut accumulator = MergeAccumulator::new();

        for path in files {
            match open_source(&path) {
                Ok(doc) => {
                    debug!("[{}] + {}", outcome.key, path.display());
                    accumulator.append(doc);
                    outcome.merged.push(path);
                }
                Err(e) => match self.config.on_error {
                    FailurePolicy::SkipFile => {
                        warn!("[{}] Skipping {}", outcome.key, e);
                        outcome.skipped.push(SkippedFile {
                            path,
                            reason: e.to_string(),
                        });
                    }
                    FailurePolicy::AbortGroup => return fail(outcome, e.to_string()),
                },
            }
        }

        if accumulator.is_empty() {
            return fail(outcome, "no pages to merge".to_string());
        }

        match accumulator.write(&outcome.output_path) {
            Ok(pages) => {
                info!(
                    "[{}] Wrote {} pages from {} files to {}",
                    outcome.key,
                    pages,
                    outcome.merged.len(),
                    outcome.output_path.display()
                );
                outcome.pages = pages;
                outcome
            }
            Err(e) => fail(outcome, e.to_string()),
        }
    }
}

/// Mark a group as failed; nothing of it reaches the output
fn fail(mut outcome: GroupOutcome, reason: String) -> GroupOutcome {
    error!("[{}] Group failed: {}", outcome.key, reason);
    outcome.merged.clear();
    outcome.pages = 0;
    outcome.status = GroupStatus::Failed { reason };
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::merge::tests::{marked_document, page_texts};
    use lopdf::Document;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_pdf(dir: &Path, name: &str, pages: usize) {
        let markers: Vec<String> = (1..=pages).map(|p| format!("{}#{}", name, p)).collect();
        let markers: Vec<&str> = markers.iter().map(String::as_str).collect();
        marked_document(&markers).save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = MergerConfig::new(temp_dir.path()).with_prefix_length(0);
        assert!(BatchMerger::new(config).unwrap_err().is_config());
    }

    #[test]
    fn test_progress_callback_in_key_order() {
        let temp_dir = TempDir::new().unwrap();
        write_pdf(temp_dir.path(), "ZZZZZ_1.pdf", 1);
        write_pdf(temp_dir.path(), "AAAAA_1.pdf", 1);
        write_pdf(temp_dir.path(), "MMMMM_1.pdf", 1);

        let merger = BatchMerger::new(MergerConfig::new(temp_dir.path())).unwrap();
        let mut seen = Vec::new();
        let report = merger.run_with(|g| seen.push(g.key.clone())).unwrap();

        assert_eq!(seen, vec!["AAAAA", "MMMMM", "ZZZZZ"]);
        assert!(report.is_success());
    }

    #[test]
    fn test_skip_file_policy() {
        let temp_dir = TempDir::new().unwrap();
        write_pdf(temp_dir.path(), "CCCCC_1.pdf", 2);
        fs::write(temp_dir.path().join("CCCCC_2.pdf"), b"garbage").unwrap();
        write_pdf(temp_dir.path(), "CCCCC_3.pdf", 1);

        let merger = BatchMerger::new(MergerConfig::new(temp_dir.path())).unwrap();
        let report = merger.run().unwrap();
        let group = report.group("CCCCC").unwrap();

        assert_eq!(group.status, GroupStatus::Written);
        assert_eq!(group.pages, 3);
        assert_eq!(group.merged.len(), 2);
        assert_eq!(group.skipped.len(), 1);
        assert!(group.skipped[0].path.ends_with("CCCCC_2.pdf"));

        let doc = Document::load(&group.output_path).unwrap();
        let texts = page_texts(&doc);
        assert!(texts[0].contains("CCCCC_1.pdf#1"));
        assert!(texts[2].contains("CCCCC_3.pdf#1"));
    }

    #[test]
    fn test_abort_group_policy() {
        let temp_dir = TempDir::new().unwrap();
        write_pdf(temp_dir.path(), "CCCCC_1.pdf", 2);
        fs::write(temp_dir.path().join("CCCCC_2.pdf"), b"garbage").unwrap();
        write_pdf(temp_dir.path(), "DDDDD_1.pdf", 1);

        let config = MergerConfig::new(temp_dir.path())
            .with_failure_policy(FailurePolicy::AbortGroup);
        let report = BatchMerger::new(config).unwrap().run().unwrap();

        let failed = report.group("CCCCC").unwrap();
        assert!(failed.is_failed());
        assert!(!failed.output_path.exists());
        assert_eq!(failed.inputs.len(), 2);

        let ok = report.group("DDDDD").unwrap();
        assert_eq!(ok.status, GroupStatus::Written);
        assert!(ok.output_path.exists());
    }

    #[test]
    fn test_all_files_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("EEEEE_1.pdf"), b"garbage").unwrap();

        let report = BatchMerger::new(MergerConfig::new(temp_dir.path()))
            .unwrap()
            .run()
            .unwrap();

        let group = report.group("EEEEE").unwrap();
        assert!(group.is_failed());
        assert!(!group.output_path.exists());
    }

    #[test]
    fn test_zero_page_file_kept_under_both_policies() {
        for policy in [FailurePolicy::SkipFile, FailurePolicy::AbortGroup] {
            let temp_dir = TempDir::new().unwrap();
            write_pdf(temp_dir.path(), "AAAAA_1.pdf", 2);
            write_pdf(temp_dir.path(), "AAAAA_2.pdf", 0);

            let config = MergerConfig::new(temp_dir.path()).with_failure_policy(policy);
            let report = BatchMerger::new(config).unwrap().run().unwrap();
            let group = report.group("AAAAA").unwrap();

            assert_eq!(group.status, GroupStatus::Written, "{:?}", policy);
            assert_eq!(group.pages, 2);
            assert_eq!(group.merged.len(), 2);
            assert!(group.skipped.is_empty());
        }
    }

    #[test]
    fn test_group_of_blank_files_fails() {
        let temp_dir = TempDir::new().unwrap();
        write_pdf(temp_dir.path(), "BBBBB_1.pdf", 0);

        let report = BatchMerger::new(MergerConfig::new(temp_dir.path()))
            .unwrap()
            .run()
            .unwrap();

        let group = report.group("BBBBB").unwrap();
        assert!(group.is_failed());
        assert!(!group.output_path.exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        write_pdf(temp_dir.path(), "AAAAA_1.pdf", 1);

        let config = MergerConfig::new(temp_dir.path())
            .with_theme_suffix("X")
            .with_dry_run(true);
        let report = BatchMerger::new(config).unwrap().run().unwrap();

        assert!(!temp_dir.path().join("output").exists());
        let group = report.group("AAAAA").unwrap();
        assert_eq!(group.status, GroupStatus::Planned);
        assert!(group.output_path.ends_with("output/AAAAAX.pdf"));
        assert_eq!(group.inputs.len(), 1);
    }
}
