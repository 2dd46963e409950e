//! Report generation module.
//!
//! This module provides functionality for writing the analysis report and
//! the cleaned table, and for rendering results as plain text.
//!
//! # Comprehensive Reports
//!
//! Use [`ComprehensiveReport`] to generate unified reports suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use estate_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_comprehensive_report("data/listings.tsv", &config, &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("outputs"), Some("listings".into()));
//! generator.write_report_to_file(&report)?;
//! ```

mod console;
mod generator;

pub use console::{render_analysis, render_profile, render_summary};
pub use generator::{
    ComprehensiveReport, ConfigurationSummary, DEFAULT_OUTPUT_STEM, ReportGenerator,
};
