//! Data profiling module for the listings table.
//!
//! This module provides a per-column missing-value and moment profile,
//! taken before cleaning and shown by `--dry-run`.

mod statistics;

use crate::types::{ColumnProfile, DatasetProfile};
use crate::utils::{dtype_label, is_numeric_dtype, observed_series};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

use statistics::{calculate_skewness, calculate_std};

/// Data profiler for analyzing dataset structure and completeness.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Sentinel values are treated as missing when `sentinel` is given, so a
    /// cleaned table reports the unknowns the fill passes marked.
    pub fn profile_dataset(df: &DataFrame, sentinel: Option<f64>) -> Result<DatasetProfile> {
        let mut column_profiles = Vec::with_capacity(df.width());

        for col_name in df.get_column_names() {
            column_profiles.push(Self::profile_column(df, col_name, sentinel)?);
        }

        let total_missing: usize = column_profiles.iter().map(|c| c.null_count).sum();
        let cells = df.height() * df.width();
        let missing_percentage = if cells > 0 {
            total_missing as f64 / cells as f64 * 100.0
        } else {
            0.0
        };

        debug!(
            "Profiled {} columns, {} missing cells",
            column_profiles.len(),
            total_missing
        );

        Ok(DatasetProfile {
            shape: (df.height(), df.width()),
            column_profiles,
            total_missing,
            missing_percentage,
        })
    }

    fn profile_column(df: &DataFrame, col_name: &str, sentinel: Option<f64>) -> Result<ColumnProfile> {
        let series = df.column(col_name)?.as_materialized_series();
        let dtype = series.dtype().clone();
        let unique_count = series.n_unique()?;
        let mut null_count = series.null_count();

        let (mut col_mean, mut std, mut skewness) = (None, None, None);
        if is_numeric_dtype(&dtype) {
            // sentinel and NaN cells count as missing
            let present = observed_series(df, col_name, sentinel)?;
            null_count = present.null_count();
            col_mean = present.mean();
            if col_mean.is_some() {
                std = Some(calculate_std(&present));
                skewness = Some(calculate_skewness(&present)?);
            }
        }

        let null_percentage = if df.height() > 0 {
            null_count as f64 / df.height() as f64 * 100.0
        } else {
            0.0
        };

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype: dtype_label(&dtype).to_string(),
            unique_count,
            null_count,
            null_percentage,
            mean: col_mean,
            std,
            skewness,
        })
    }
}
