//! CLI entry point for the listings pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use estate_processing::profiler::DataProfiler;
use estate_processing::reporting::{render_analysis, render_profile, render_summary};
use estate_processing::{ListingLoader, Pipeline, PipelineConfig, PipelineResult, ReportGenerator};
use std::path::Path;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Real-estate listings cleaning and analysis",
    long_about = "Fills the missing values of a listings export, derives price and date \
                  columns, and reports statistics, correlations, locality aggregates and \
                  a city-center comparison.\n\n\
                  EXAMPLES:\n  \
                  # Clean and analyze with defaults\n  \
                  estate-processing -i real_estate_data.csv\n\n  \
                  # Another city and a tighter center\n  \
                  estate-processing -i data.tsv --center-locality Пушкин --center-threshold 3000\n\n  \
                  # Missing-value profile only\n  \
                  estate-processing -i data.tsv --dry-run\n\n  \
                  # Machine-readable report\n  \
                  estate-processing -i data.tsv --json | jq .analysis.price_factors"
)]
struct Args {
    /// Path to the listings file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for written files
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Base name of written files (without extension)
    ///
    /// If not specified, uses the input file name
    #[arg(long)]
    output_name: Option<String>,

    /// Locality whose center is analyzed
    #[arg(long)]
    center_locality: Option<String>,

    /// Distance to the center (meters) below which a listing is central
    #[arg(long)]
    center_threshold: Option<f64>,

    /// Number of localities listed by listing count
    #[arg(long)]
    top_localities: Option<usize>,

    /// Field separator of the input file ("tab" or a single character)
    #[arg(long, default_value = "tab", value_parser = parse_separator)]
    separator: u8,

    /// Show the missing-value profile without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <output_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Write the cleaned table as <output_name>_cleaned.csv
    #[arg(long)]
    save_cleaned: bool,
}

/// Parse the `--separator` value.
fn parse_separator(value: &str) -> std::result::Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        other => match other.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!(
                "expected \"tab\" or a single ASCII character, got '{}'",
                other
            )),
        },
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = build_config(&args)?;

    if args.dry_run {
        return run_dry_run(&args, &config);
    }

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    match pipeline.process_file(Path::new(&args.input)) {
        Ok(result) => handle_pipeline_output(&pipeline, &result, &args),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Map command line flags onto the configuration builder.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let output_name = args
        .output_name
        .clone()
        .unwrap_or_else(|| extract_file_stem(&args.input));

    let mut builder = PipelineConfig::builder()
        .separator(args.separator)
        .output_dir(&args.output)
        .output_name(output_name)
        .emit_report(args.emit_report)
        .save_cleaned(args.save_cleaned);

    if let Some(ref locality) = args.center_locality {
        builder = builder.center_locality(locality);
    }
    if let Some(threshold) = args.center_threshold {
        builder = builder.center_threshold(threshold);
    }
    if let Some(count) = args.top_localities {
        builder = builder.top_localities(count);
    }

    Ok(builder.build()?)
}

/// Run dry-run mode - show the profile without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(args: &Args, config: &PipelineConfig) -> Result<()> {
    let data = ListingLoader::from_config(config).load_file(Path::new(&args.input))?;
    let profile = DataProfiler::profile_dataset(&data, None)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Missing-value profile");
    println!("{}\n", "=".repeat(80));
    println!("File: {}", args.input);
    println!("{}", render_profile(&profile));
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    let generator = ReportGenerator::new(
        config.output_dir.clone(),
        Some(config.output_stem().to_string()),
    );
    if config.save_cleaned {
        println!("  - {}", generator.cleaned_path().display());
    }
    if config.emit_report {
        println!("  - {}", generator.report_path().display());
    }
    if !config.save_cleaned && !config.emit_report {
        println!("  (none, add --save-cleaned or --emit-report)");
    }

    println!("{}", "=".repeat(80));
    println!("To execute the pipeline, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report` / `--save-cleaned`: files are written by the pipeline
fn handle_pipeline_output(pipeline: &Pipeline, result: &PipelineResult, args: &Args) -> Result<()> {
    if args.json {
        let report =
            ReportGenerator::build_comprehensive_report(&args.input, pipeline.config(), result);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(result, args);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("listings")
        .to_string()
}

/// Print a human-readable summary of the run.
fn print_human_readable_summary(result: &PipelineResult, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!("Input: {}", args.input);
    println!("{}", render_summary(&result.summary));
    println!();
    println!("{}", render_analysis(&result.report));

    if !result.summary.output_files.is_empty() {
        println!();
        println!("Files written:");
        for file in &result.summary.output_files {
            println!("  - {}", file);
        }
    }

    println!();
    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}
