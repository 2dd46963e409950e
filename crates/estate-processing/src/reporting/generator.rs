use crate::analysis::AnalysisReport;
use crate::config::PipelineConfig;
use crate::types::{DatasetProfile, PipelineResult, ProcessingSummary};
use anyhow::Result;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Base name used for output files when none is configured.
pub const DEFAULT_OUTPUT_STEM: &str = "listings";

// ============================================================================
// Comprehensive Report Types
// ============================================================================

/// Comprehensive report merging everything a run produced.
///
/// Use this for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Settings the run used
    pub configuration: ConfigurationSummary,
    /// Missing values before cleaning
    pub dataset_profile: DatasetProfile,
    /// Fills, actions, warnings and written files
    pub processing_summary: ProcessingSummary,
    /// Statistics over the cleaned table
    pub analysis: AnalysisReport,
}

/// Analysis settings recorded in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    pub center_locality: String,
    pub center_threshold: f64,
    pub top_localities: usize,
    pub kitchen_buckets: usize,
    pub sentinel: f64,
    pub undefined_locality: String,
}

impl From<&PipelineConfig> for ConfigurationSummary {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            center_locality: config.center_locality.clone(),
            center_threshold: config.center_threshold,
            top_localities: config.top_localities,
            kitchen_buckets: config.kitchen_buckets,
            sentinel: config.sentinel,
            undefined_locality: config.undefined_locality.clone(),
        }
    }
}

/// Writes the JSON report and the cleaned table.
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    fn stem(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_STEM)
    }

    /// `<output_dir>/<stem>_report.json`
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_report.json", self.stem()))
    }

    /// `<output_dir>/<stem>_cleaned.csv`
    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}_cleaned.csv", self.stem()))
    }

    /// Build a comprehensive report from pipeline results.
    ///
    /// The same structure is printed by `--json`, written by `--emit-report`
    /// and available to library callers.
    pub fn build_comprehensive_report(
        input_file: &str,
        config: &PipelineConfig,
        result: &PipelineResult,
    ) -> ComprehensiveReport {
        ComprehensiveReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            configuration: ConfigurationSummary::from(config),
            dataset_profile: result.profile.clone(),
            processing_summary: result.summary.clone(),
            analysis: result.report.clone(),
        }
    }

    /// Write a comprehensive report to `<stem>_report.json`.
    pub fn write_report_to_file(&self, report: &ComprehensiveReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path();
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Write the cleaned table to `<stem>_cleaned.csv`.
    ///
    /// Uses the input separator and date format so the file can be fed back
    /// to the loader.
    pub fn write_cleaned_csv(
        &self,
        df: &mut DataFrame,
        separator: u8,
        date_format: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.cleaned_path();
        let mut file = File::create(&output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(separator)
            .with_datetime_format(Some(date_format.to_string()))
            .finish(df)?;

        info!("Cleaned table saved: {}", output_path.display());
        Ok(output_path)
    }
}
