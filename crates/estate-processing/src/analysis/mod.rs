//! Statistics over the cleaned listings table.
//!
//! This module provides:
//! - Descriptive statistics and listing duration
//! - Price factor correlations and the correlation matrix
//! - Locality aggregates
//! - City and city-center segment comparison
//! - Histograms

mod center;
mod histogram;
mod locality;
mod statistics;

pub use center::{
    CenterAnalysis, ColumnMedian, ComparisonRow, DistancePrice, SegmentProfile, center_mask,
    city_mask, compare_segments, price_by_distance, segment_factor_columns, select_rows,
};
pub use histogram::{Histogram, HistogramSegment, HistogramSpec};
pub use locality::{LocalityStats, LocalitySummary, summarize_localities};
pub use statistics::{
    CorrelationMatrix, DescriptiveStats, FactorCorrelation, correlation_matrix, describe,
    numeric_column, pearson, price_correlations,
};

use crate::config::PipelineConfig;
use crate::schema::{CORRELATION_COLUMNS, DAYS_EXPOSITION, DESCRIBED_COLUMNS, PRICE_FACTOR_COLUMNS};
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Mean and median time on the market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDuration {
    pub mean_days: Option<f64>,
    pub median_days: Option<f64>,
}

/// Everything computed by the analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub rows: usize,
    pub descriptive: Vec<DescriptiveStats>,
    pub listing_duration: ListingDuration,
    pub price_factors: Vec<FactorCorrelation>,
    pub correlation_matrix: CorrelationMatrix,
    pub localities: LocalitySummary,
    pub center: CenterAnalysis,
    pub histograms: Vec<Histogram>,
}

/// Runs every analysis over a cleaned table.
pub struct Analyzer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, df: &DataFrame) -> Result<AnalysisReport> {
        let sentinel = self.config.sentinel;

        info!("Computing descriptive statistics...");
        let descriptive = describe(df, &DESCRIBED_COLUMNS, sentinel)?;
        let duration = describe(df, &[DAYS_EXPOSITION], sentinel)?;
        let listing_duration = ListingDuration {
            mean_days: duration.first().and_then(|d| d.mean),
            median_days: duration.first().and_then(|d| d.median),
        };

        info!("Computing correlations...");
        let price_factors = price_correlations(df, &PRICE_FACTOR_COLUMNS, sentinel)?;
        let correlation_matrix = correlation_matrix(df, &CORRELATION_COLUMNS, sentinel)?;

        info!("Aggregating localities...");
        let localities = summarize_localities(df, self.config.top_localities, sentinel)?;

        info!(
            "Analyzing '{}' center (< {} m)...",
            self.config.center_locality, self.config.center_threshold
        );
        let (center, center_df) = CenterAnalysis::compute(df, self.config)?;
        debug!(
            "City segment: {} rows, center segment: {} rows",
            center.city.listings, center.center.listings
        );

        let histograms = self
            .config
            .histograms
            .iter()
            .map(|spec| {
                let source = match spec.segment {
                    HistogramSegment::All => df,
                    HistogramSegment::Center => &center_df,
                };
                let values: Vec<f64> = numeric_column(source, &spec.column, sentinel)?
                    .f64()?
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(Histogram::compute(spec, &values))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(AnalysisReport {
            rows: df.height(),
            descriptive,
            listing_duration,
            price_factors,
            correlation_matrix,
            localities,
            center,
            histograms,
        })
    }
}
