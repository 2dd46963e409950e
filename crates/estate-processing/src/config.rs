//! Configuration types for the listings pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::analysis::{HistogramSegment, HistogramSpec};
use crate::cleaner::normalize_locality_name;
use crate::reporting::DEFAULT_OUTPUT_STEM;
use crate::schema::{
    CEILING_HEIGHT, DAYS_EXPOSITION, DEFAULT_SENTINEL, LAST_PRICE, ROOMS, TOTAL_AREA,
    UNDEFINED_LOCALITY,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Listing date format used by the source export.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// City whose center segment is analyzed by default (after normalization).
pub const DEFAULT_CENTER_LOCALITY: &str = "санкт-петербург";

/// Distance to the center, in meters, below which a listing is "central".
pub const DEFAULT_CENTER_THRESHOLD: f64 = 7500.0;

/// Configuration for the listings pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use estate_processing::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .center_locality("санкт-петербург")
///     .center_threshold(7500.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Field separator of the input file.
    /// Default: tab
    pub separator: u8,

    /// chrono format of `first_day_exposition`.
    /// Default: "%Y-%m-%dT%H:%M:%S"
    pub date_format: String,

    /// Numeric marker written into unknown distance/count cells and
    /// excluded from every aggregate.
    /// Default: -999.99
    pub sentinel: f64,

    /// Marker written into listings without a locality.
    /// Default: "undefined"
    pub undefined_locality: String,

    /// Number of equal-frequency living-area buckets used to fill kitchen area.
    /// Default: 10
    pub kitchen_buckets: usize,

    /// Locality (normalized, lower case) whose center is analyzed.
    /// Default: "санкт-петербург"
    pub center_locality: String,

    /// Distance to the center in meters separating the center segment.
    /// Default: 7500.0
    pub center_threshold: f64,

    /// Number of localities listed by listing count.
    /// Default: 10
    pub top_localities: usize,

    /// Histogram panels computed during analysis.
    pub histograms: Vec<HistogramSpec>,

    /// Output directory for the report and cleaned data.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Base name of written files (without extension).
    /// If None, "listings" is used.
    pub output_name: Option<String>,

    /// Whether to write the cleaned table next to the report.
    /// Default: false
    pub save_cleaned: bool,

    /// Whether to write the JSON analysis report.
    /// Default: false
    pub emit_report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            separator: b'\t',
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            sentinel: DEFAULT_SENTINEL,
            undefined_locality: UNDEFINED_LOCALITY.to_string(),
            kitchen_buckets: 10,
            center_locality: DEFAULT_CENTER_LOCALITY.to_string(),
            center_threshold: DEFAULT_CENTER_THRESHOLD,
            top_localities: 10,
            histograms: default_histograms(),
            output_dir: PathBuf::from("outputs"),
            output_name: None,
            save_cleaned: false,
            emit_report: false,
        }
    }
}

/// Histogram panels over the whole table (raw and with tails trimmed) and
/// over the center segment.
pub fn default_histograms() -> Vec<HistogramSpec> {
    use HistogramSegment::{All, Center};

    vec![
        HistogramSpec::new(TOTAL_AREA, 100, (0.0, 400.0), All, "Total area"),
        HistogramSpec::new(LAST_PRICE, 100, (0.0, 40_000_000.0), All, "Price"),
        HistogramSpec::new(ROOMS, 10, (0.0, 9.0), All, "Rooms"),
        HistogramSpec::new(CEILING_HEIGHT, 20, (2.25, 4.0), All, "Ceiling height"),
        HistogramSpec::new(DAYS_EXPOSITION, 100, (0.0, 600.0), All, "Days on market"),
        HistogramSpec::new(TOTAL_AREA, 80, (0.0, 150.0), All, "Total area (trimmed)"),
        HistogramSpec::new(LAST_PRICE, 30, (0.0, 15_000_000.0), All, "Price (trimmed)"),
        HistogramSpec::new(ROOMS, 5, (0.0, 5.0), All, "Rooms (trimmed)"),
        HistogramSpec::new(CEILING_HEIGHT, 10, (2.25, 3.25), All, "Ceiling height (trimmed)"),
        HistogramSpec::new(DAYS_EXPOSITION, 80, (0.0, 300.0), All, "Days on market (trimmed)"),
        HistogramSpec::new(LAST_PRICE, 30, (0.0, 15_000_000.0), Center, "Center: price"),
        HistogramSpec::new(ROOMS, 5, (0.0, 5.0), Center, "Center: rooms"),
        HistogramSpec::new(CEILING_HEIGHT, 10, (2.25, 3.25), Center, "Center: ceiling height"),
        HistogramSpec::new(DAYS_EXPOSITION, 50, (0.0, 300.0), Center, "Center: days on market"),
    ]
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Base name of written files.
    pub fn output_stem(&self) -> &str {
        self.output_name.as_deref().unwrap_or(DEFAULT_OUTPUT_STEM)
    }

    /// Whether a value is the "unknown" sentinel.
    pub fn is_sentinel(&self, value: f64) -> bool {
        (value - self.sentinel).abs() < 1e-9
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.center_threshold.is_finite() && self.center_threshold > 0.0) {
            return Err(ConfigValidationError::InvalidCenterThreshold(
                self.center_threshold,
            ));
        }

        if self.kitchen_buckets < 2 {
            return Err(ConfigValidationError::InvalidBucketCount(self.kitchen_buckets));
        }

        if self.top_localities == 0 {
            return Err(ConfigValidationError::InvalidTopLocalities);
        }

        if self.center_locality.trim().is_empty() {
            return Err(ConfigValidationError::EmptyCenterLocality);
        }

        if !self.sentinel.is_finite() {
            return Err(ConfigValidationError::InvalidSentinel(self.sentinel));
        }

        for spec in &self.histograms {
            if spec.bins == 0 {
                return Err(ConfigValidationError::InvalidHistogram {
                    column: spec.column.clone(),
                    reason: "bin count must be at least 1".to_string(),
                });
            }
            let (min, max) = spec.range;
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(ConfigValidationError::InvalidHistogram {
                    column: spec.column.clone(),
                    reason: format!("range ({}, {}) is empty", min, max),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid center threshold: {0} (must be a positive distance in meters)")]
    InvalidCenterThreshold(f64),

    #[error("Invalid kitchen bucket count: {0} (must be at least 2)")]
    InvalidBucketCount(usize),

    #[error("Invalid top localities count: must be at least 1")]
    InvalidTopLocalities,

    #[error("Center locality must not be empty")]
    EmptyCenterLocality,

    #[error("Invalid sentinel: {0} (must be finite)")]
    InvalidSentinel(f64),

    #[error("Invalid histogram for '{column}': {reason}")]
    InvalidHistogram { column: String, reason: String },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    separator: Option<u8>,
    date_format: Option<String>,
    sentinel: Option<f64>,
    undefined_locality: Option<String>,
    kitchen_buckets: Option<usize>,
    center_locality: Option<String>,
    center_threshold: Option<f64>,
    top_localities: Option<usize>,
    histograms: Option<Vec<HistogramSpec>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    save_cleaned: Option<bool>,
    emit_report: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the field separator of the input file.
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the chrono format of the listing date column.
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Set the numeric "unknown" sentinel.
    pub fn sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Set the marker used for listings without a locality.
    pub fn undefined_locality(mut self, marker: impl Into<String>) -> Self {
        self.undefined_locality = Some(marker.into());
        self
    }

    /// Set the number of living-area buckets used for kitchen area.
    pub fn kitchen_buckets(mut self, buckets: usize) -> Self {
        self.kitchen_buckets = Some(buckets);
        self
    }

    /// Set the city whose center segment is analyzed.
    ///
    /// The name is compared after normalization (trimmed, lower case).
    pub fn center_locality(mut self, locality: impl Into<String>) -> Self {
        self.center_locality = Some(locality.into());
        self
    }

    /// Set the center boundary in meters.
    pub fn center_threshold(mut self, meters: f64) -> Self {
        self.center_threshold = Some(meters);
        self
    }

    /// Set how many localities are listed by listing count.
    pub fn top_localities(mut self, count: usize) -> Self {
        self.top_localities = Some(count);
        self
    }

    /// Replace the histogram panels.
    pub fn histograms(mut self, specs: Vec<HistogramSpec>) -> Self {
        self.histograms = Some(specs);
        self
    }

    /// Set the output directory for the report and cleaned data.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable writing the cleaned table.
    pub fn save_cleaned(mut self, save: bool) -> Self {
        self.save_cleaned = Some(save);
        self
    }

    /// Enable or disable writing the JSON report.
    pub fn emit_report(mut self, emit: bool) -> Self {
        self.emit_report = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            separator: self.separator.unwrap_or(defaults.separator),
            date_format: self.date_format.unwrap_or(defaults.date_format),
            sentinel: self.sentinel.unwrap_or(defaults.sentinel),
            undefined_locality: self
                .undefined_locality
                .unwrap_or(defaults.undefined_locality),
            kitchen_buckets: self.kitchen_buckets.unwrap_or(defaults.kitchen_buckets),
            center_locality: self
                .center_locality
                .map(|name| normalize_locality_name(&name))
                .unwrap_or(defaults.center_locality),
            center_threshold: self.center_threshold.unwrap_or(defaults.center_threshold),
            top_localities: self.top_localities.unwrap_or(defaults.top_localities),
            histograms: self.histograms.unwrap_or(defaults.histograms),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name,
            save_cleaned: self.save_cleaned.unwrap_or(false),
            emit_report: self.emit_report.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.separator, b'\t');
        assert_eq!(config.sentinel, -999.99);
        assert_eq!(config.kitchen_buckets, 10);
        assert_eq!(config.center_threshold, 7500.0);
        assert_eq!(config.center_locality, "санкт-петербург");
        assert_eq!(config.output_stem(), "listings");
        assert!(!config.save_cleaned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .separator(b',')
            .center_locality("  Пушкин ")
            .center_threshold(3000.0)
            .top_localities(5)
            .output_name("spb")
            .save_cleaned(true)
            .build()
            .unwrap();

        assert_eq!(config.separator, b',');
        assert_eq!(config.center_locality, "пушкин");
        assert_eq!(config.center_threshold, 3000.0);
        assert_eq!(config.top_localities, 5);
        assert_eq!(config.output_stem(), "spb");
        assert!(config.save_cleaned);
    }

    #[test]
    fn test_is_sentinel() {
        let config = PipelineConfig::default();
        assert!(config.is_sentinel(-999.99));
        assert!(!config.is_sentinel(-999.0));
        assert!(!config.is_sentinel(0.0));
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = PipelineConfig::builder().center_threshold(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCenterThreshold(_)
        ));

        let result = PipelineConfig::builder().center_threshold(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_invalid_buckets() {
        let result = PipelineConfig::builder().kitchen_buckets(1).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidBucketCount(1)
        ));
    }

    #[test]
    fn test_validation_invalid_histogram() {
        let result = PipelineConfig::builder()
            .histograms(vec![HistogramSpec::new(
                ROOMS,
                5,
                (5.0, 5.0),
                HistogramSegment::All,
                "Rooms",
            )])
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidHistogram { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "separator": 44,
            "date_format": "%Y-%m-%d",
            "sentinel": -1.0,
            "undefined_locality": "n/a",
            "kitchen_buckets": 5,
            "center_locality": "москва",
            "center_threshold": 5000.0,
            "top_localities": 3,
            "histograms": [],
            "output_dir": "custom_output",
            "output_name": "moscow",
            "save_cleaned": true,
            "emit_report": true
        }"#;

        let config: PipelineConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.separator, b',');
        assert_eq!(config.kitchen_buckets, 5);
        assert_eq!(config.center_locality, "москва");
        assert!(config.histograms.is_empty());
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert!(config.validate().is_ok());
    }
}
