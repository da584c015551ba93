//! cocokit: tools for COCO object detection datasets.
//!
//! The centrepiece is [`merge`], which combines datasets with independent
//! id spaces into one while keeping every annotation pointing at the right
//! image and category. Around it sit a batch driver for whole directory
//! trees, a rule-driven [`filter`], and [`validation`].
//!
//! # Modules
//!
//! - [`dataset`]: dataset model and COCO JSON I/O
//! - [`merge`]: id-remapping merge and the directory batch driver
//! - [`rule`] / [`filter`]: property rules and image filtering
//! - [`validation`]: structural checks and reports
//! - [`error`]: error types

pub mod dataset;
pub mod error;
pub mod filter;
pub mod merge;
pub mod rule;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use error::CocoKitError;

use dataset::io_coco_json::{read_coco_json, resolve_output_path, write_coco_json};
use merge::batch::{self, BatchOptions};
use merge::MergeOptions;
use rule::PropertyRule;
use validation::ValidateOptions;

/// The cocokit CLI application.
#[derive(Parser)]
#[command(name = "cocokit")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Merge two or more COCO files into one.
    Merge(MergeArgs),
    /// Merge every COCO file found under a directory.
    MergeDir(MergeDirArgs),
    /// Remove images matching a property rule.
    Filter(FilterArgs),
    /// Check a dataset for errors and warnings.
    Validate(ValidateArgs),
}

/// How to print a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Input files, merged in the order given.
    #[arg(required = true, num_args = 2..)]
    inputs: Vec<PathBuf>,

    /// Output file. A bare file name is placed next to the first input.
    #[arg(short, long, default_value = batch::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Keep the licenses of every input, not just the first.
    #[arg(long)]
    concat_licenses: bool,

    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct MergeDirArgs {
    /// Directory searched recursively for dataset files.
    dir: PathBuf,

    /// Output file, relative to DIR.
    #[arg(short, long, default_value = batch::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// File name pattern of the datasets to merge.
    #[arg(long, env = "COCOKIT_PATTERN", default_value = batch::DEFAULT_PATTERN)]
    pattern: String,

    /// Keep the licenses of every input, not just the first.
    #[arg(long)]
    concat_licenses: bool,

    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Dataset to filter.
    input: PathBuf,

    /// JSON rule config ({"filter": {...}, "match_all": bool}).
    rule: PathBuf,

    /// Output file. A bare file name is placed next to the input.
    #[arg(short, long, default_value = filter::DEFAULT_OUTPUT)]
    output: PathBuf,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Dataset to validate.
    input: PathBuf,

    /// Treat warnings as errors.
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Run the cocokit CLI.
///
/// Called from `main.rs`.
pub fn run() -> Result<(), CocoKitError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Merge(args)) => run_merge(args),
        Some(Commands::MergeDir(args)) => run_merge_dir(args),
        Some(Commands::Filter(args)) => run_filter(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("cocokit {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Merge, filter and validate COCO datasets.");
            println!();
            println!("Run 'cocokit --help' for usage information.");
            Ok(())
        }
    }
}

fn print_report<T: Serialize + std::fmt::Display>(
    report: &T,
    format: ReportFormat,
) -> Result<(), CocoKitError> {
    match format {
        ReportFormat::Text => print!("{}", report),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(|source| {
                CocoKitError::CocoJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_merge(args: MergeArgs) -> Result<(), CocoKitError> {
    let options = MergeOptions {
        concat_licenses: args.concat_licenses,
    };
    let (merged, report) = merge::merge_files(&args.inputs, &options)?;

    let output = resolve_output_path(&args.output, &args.inputs[0]);
    write_coco_json(&output, &merged)?;
    tracing::info!("Wrote {}", output.display());

    print_report(&report, args.report)
}

fn run_merge_dir(args: MergeDirArgs) -> Result<(), CocoKitError> {
    let options = BatchOptions {
        pattern: args.pattern,
        output: args.output,
        merge: MergeOptions {
            concat_licenses: args.concat_licenses,
        },
    };
    let outcome = batch::merge_directory(&args.dir, &options)?;
    print_report(&outcome.report, args.report)
}

fn run_filter(args: FilterArgs) -> Result<(), CocoKitError> {
    let dataset = read_coco_json(&args.input)?;
    let rule = PropertyRule::from_path(&args.rule)?;

    let (filtered, summary) = filter::filter_dataset(&dataset, &rule);

    let output = resolve_output_path(&args.output, &args.input);
    write_coco_json(&output, &filtered)?;

    println!(
        "Filtered {} -> {}",
        args.input.display(),
        output.display()
    );
    print!("{}", summary);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CocoKitError> {
    let dataset = read_coco_json(&args.input)?;

    let opts = ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_dataset(&dataset);
    print_report(&report, args.output)?;

    if opts.fails(&report) {
        Err(CocoKitError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
