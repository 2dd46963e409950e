//! Listing counts and square-meter prices per locality.

use crate::schema::{LOCALITY_NAME, SQUARE_METER_PRICE};
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::statistics::numeric_expr;

const LISTINGS: &str = "listings";
const MEDIAN_PRICE: &str = "median_square_meter_price";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalityStats {
    pub locality: String,
    pub listings: usize,
    pub median_square_meter_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalitySummary {
    /// Number of distinct localities.
    pub localities: usize,
    /// Most listed localities, by descending count.
    pub top: Vec<LocalityStats>,
    /// Most expensive of `top` per square meter.
    pub highest: Option<LocalityStats>,
    /// Cheapest of `top` per square meter.
    pub lowest: Option<LocalityStats>,
}

/// Group listings by locality and keep the `top_n` with most listings.
///
/// Ties on the count are broken by name so the output is stable.
pub fn summarize_localities(df: &DataFrame, top_n: usize, sentinel: f64) -> Result<LocalitySummary> {
    let grouped = df
        .clone()
        .lazy()
        .filter(col(LOCALITY_NAME).is_not_null())
        .group_by([col(LOCALITY_NAME)])
        .agg([
            len().alias(LISTINGS),
            numeric_expr(SQUARE_METER_PRICE, sentinel)
                .median()
                .alias(MEDIAN_PRICE),
        ])
        .sort_by_exprs(
            [col(LISTINGS), col(LOCALITY_NAME)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;
    let localities = grouped.height();

    let top = grouped.head(Some(top_n));
    let names = top.column(LOCALITY_NAME)?.as_materialized_series().str()?;
    let listings = top
        .column(LISTINGS)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    let medians = top
        .column(MEDIAN_PRICE)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    let stats: Vec<LocalityStats> = names
        .into_iter()
        .zip(listings.u64()?)
        .zip(medians.f64()?)
        .filter_map(|((name, count), median)| {
            Some(LocalityStats {
                locality: name?.to_string(),
                listings: count.unwrap_or(0) as usize,
                median_square_meter_price: median,
            })
        })
        .collect();

    let priced = || {
        stats
            .iter()
            .filter_map(|s| s.median_square_meter_price.map(|p| (p, s)))
    };
    let highest = priced()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, s)| s.clone());
    let lowest = priced()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, s)| s.clone());

    Ok(LocalitySummary {
        localities,
        top: stats,
        highest,
        lowest,
    })
}
