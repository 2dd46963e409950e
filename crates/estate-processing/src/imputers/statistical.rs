//! Statistical imputation methods.
//!
//! Single-value fills: constants, global mean and median, and the
//! "unknown" sentinel.

use crate::error::ProcessingError;
use crate::types::{ImputationMethod, ImputationRecord};
use crate::utils::{bool_values, f64_values, fill_numeric_nulls, fill_string_nulls};
use anyhow::Result;
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a boolean column with a default flag.
    pub fn fill_boolean(df: &mut DataFrame, col_name: &str, value: bool) -> Result<ImputationRecord> {
        let values = bool_values(df, col_name)?;
        let filled = values.iter().filter(|v| v.is_none()).count();
        let series: Vec<bool> = values.into_iter().map(|v| v.unwrap_or(value)).collect();
        df.replace(col_name, Series::new(col_name.into(), series))?;

        debug!("Filled {} missing values in '{}' with {}", filled, col_name, value);
        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Constant,
            value.to_string(),
            filled,
        ))
    }

    /// Fill a count column with a constant and store it as integers.
    pub fn fill_integer(df: &mut DataFrame, col_name: &str, value: i64) -> Result<ImputationRecord> {
        let values = f64_values(df, col_name)?;
        let filled = values.iter().filter(|v| v.is_none()).count();
        let series: Vec<i64> = values
            .into_iter()
            .map(|v| v.map(|x| x.trunc() as i64).unwrap_or(value))
            .collect();
        df.replace(col_name, Series::new(col_name.into(), series))?;

        debug!("Filled {} missing values in '{}' with {}", filled, col_name, value);
        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Constant,
            value.to_string(),
            filled,
        ))
    }

    /// Fill with the mean of observed values, then truncate the column to integers.
    ///
    /// Fails with [`ProcessingError::NoValidValues`] when there is something
    /// to fill but nothing to average.
    pub fn fill_mean_as_integer(df: &mut DataFrame, col_name: &str) -> Result<ImputationRecord> {
        let series = df
            .column(col_name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let filled = series.null_count();
        let mean_val = series.mean();

        if filled > 0 && mean_val.is_none() {
            return Err(ProcessingError::NoValidValues(col_name.to_string()).into());
        }
        let fill = mean_val.unwrap_or_default();

        let truncated = fill_numeric_nulls(&series, fill)?.cast(&DataType::Int64)?;
        df.replace(col_name, truncated)?;

        debug!("Filled {} missing values in '{}' with mean {:.3}", filled, col_name, fill);
        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Mean,
            format!("{:.3}", fill),
            filled,
        ))
    }

    /// Fill with the global median of observed values.
    ///
    /// Without observed values the column is left untouched.
    pub fn fill_median(df: &mut DataFrame, col_name: &str) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();

        let Some(median_val) = series.median() else {
            return Ok(ImputationRecord::new(
                col_name,
                ImputationMethod::Median,
                "no observed values",
                0,
            ));
        };

        if missing > 0 {
            df.replace(col_name, fill_numeric_nulls(&series, median_val)?)?;
        }

        debug!("Filled {} missing values in '{}' with median {}", missing, col_name, median_val);
        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Median,
            median_val.to_string(),
            missing,
        ))
    }

    /// Fill a numeric column with the "unknown" sentinel.
    pub fn fill_sentinel(df: &mut DataFrame, col_name: &str, sentinel: f64) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing > 0 {
            df.replace(col_name, fill_numeric_nulls(&series, sentinel)?)?;
        }

        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Sentinel,
            sentinel.to_string(),
            missing,
        ))
    }

    /// Fill a text column with a constant marker.
    pub fn fill_text(df: &mut DataFrame, col_name: &str, marker: &str) -> Result<ImputationRecord> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing > 0 {
            df.replace(col_name, fill_string_nulls(&series, marker)?)?;
        }

        Ok(ImputationRecord::new(
            col_name,
            ImputationMethod::Sentinel,
            marker,
            missing,
        ))
    }
}
