//! Moment statistics over observed numeric values.

use anyhow::Result;
use polars::prelude::*;

/// Sample standard deviation, zero for fewer than two values.
pub(crate) fn calculate_std(series: &Series) -> f64 {
    if series.len() - series.null_count() < 2 {
        return 0.0;
    }
    series.std(1).filter(|s| s.is_finite()).unwrap_or(0.0)
}

/// Skewness as the mean cubed z-score, zero for a constant sample.
pub(crate) fn calculate_skewness(series: &Series) -> Result<f64> {
    let Some(mean) = series.mean() else {
        return Ok(0.0);
    };
    let std = calculate_std(series);
    if std == 0.0 {
        return Ok(0.0);
    }

    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series.f64()?;
    let skew_sum: f64 = values
        .into_iter()
        .flatten()
        .map(|v| ((v - mean) / std).powi(3))
        .sum();

    Ok(skew_sum / (values.len() - values.null_count()) as f64)
}
