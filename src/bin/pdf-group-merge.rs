//! PDF Group Merge CLI tool
//!
//! Merges the PDFs of a directory into one file per filename prefix.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use pdf_group_merge::{BatchMerger, FailurePolicy, GroupStatus, MergerConfig, DEFAULT_PREFIX_LENGTH};

/// PDF Group Merge - Merge PDFs sharing a filename prefix
#[derive(Parser)]
#[command(name = "pdf-group-merge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge 01234_a.pdf, 01234_b.pdf, ... into output/01234Territoire.pdf
    pdf-group-merge ./maps --theme Territoire

    # Group by the first 3 characters and stop a group on the first bad file
    pdf-group-merge ./maps -n 3 --on-error abort-group

    # Show the groups without writing anything
    pdf-group-merge ./maps --dry-run --json")]
struct Cli {
    /// Directory containing the PDF files to group
    input_dir: PathBuf,

    /// Text appended to each group key in the output filename
    #[arg(short, long, default_value = "")]
    theme: String,

    /// Number of leading filename characters forming the group key
    #[arg(short = 'n', long, default_value_t = DEFAULT_PREFIX_LENGTH)]
    prefix_length: usize,

    /// What to do with a source file that cannot be read
    #[arg(long, value_enum, default_value_t = FailurePolicy::SkipFile)]
    on_error: FailurePolicy,

    /// List the groups and their files without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the run report as JSON instead of one line per group
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flags
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns whether every group succeeded
fn run(cli: Cli) -> Result<bool> {
    let config = MergerConfig::new(&cli.input_dir)
        .with_theme_suffix(cli.theme)
        .with_prefix_length(cli.prefix_length)
        .with_failure_policy(cli.on_error)
        .with_dry_run(cli.dry_run);

    let merger = BatchMerger::new(config).context("Invalid configuration")?;

    let json = cli.json;
    let report = merger
        .run_with(|group| {
            if json {
                return;
            }
            match &group.status {
                GroupStatus::Written => println!("{}", group.key),
                GroupStatus::Planned => {
                    println!("{} -> {}", group.key, group.output_path.display());
                    for input in &group.inputs {
                        println!("    {}", input.display());
                    }
                }
                GroupStatus::Failed { reason } => {
                    eprintln!("{}: FAILED ({})", group.key, reason)
                }
            }
        })
        .with_context(|| format!("Merge of {} failed", cli.input_dir.display()))?;

    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", text);
    }

    eprintln!("{} in {}", report, report.output_dir.display());

    Ok(report.is_success())
}
