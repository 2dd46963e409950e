//! City and city-center segments.
//!
//! The city segment holds listings of the configured locality with a known
//! distance to the center; the center segment is its subset closer than the
//! configured threshold.

use crate::cleaner::normalize_locality_name;
use crate::config::PipelineConfig;
use crate::schema::{
    CEILING_HEIGHT, CITY_CENTERS_NEAREST, LAST_PRICE, LOCALITY_NAME, PRICE_FACTOR_COLUMNS,
    SEGMENT_MEDIAN_COLUMNS,
};
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::statistics::{FactorCorrelation, numeric_column, numeric_expr, price_correlations};

const METERS: &str = "meters";
const LISTINGS: &str = "listings";
const MEDIAN_PRICE: &str = "median_price";

/// Listings of the configured locality with a known distance to the center.
///
/// The locality is matched after the same normalization the sanitize stage
/// applies to the table.
pub fn city_filter(config: &PipelineConfig) -> Expr {
    col(LOCALITY_NAME)
        .eq(lit(normalize_locality_name(&config.center_locality)))
        .and(numeric_expr(CITY_CENTERS_NEAREST, config.sentinel).is_not_null())
}

/// City listings strictly below the center threshold.
pub fn center_filter(config: &PipelineConfig) -> Expr {
    city_filter(config).and(
        col(CITY_CENTERS_NEAREST)
            .cast(DataType::Float64)
            .lt(lit(config.center_threshold)),
    )
}

fn mask(df: &DataFrame, filter: Expr) -> Result<Vec<bool>> {
    let out = df.clone().lazy().select([filter.alias("mask")]).collect()?;
    Ok(out
        .column("mask")?
        .as_materialized_series()
        .bool()?
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect())
}

/// Row mask of the city segment.
pub fn city_mask(df: &DataFrame, config: &PipelineConfig) -> Result<Vec<bool>> {
    mask(df, city_filter(config))
}

/// Row mask of the center segment: city rows strictly below the threshold.
pub fn center_mask(df: &DataFrame, config: &PipelineConfig) -> Result<Vec<bool>> {
    mask(df, center_filter(config))
}

/// Rows selected by a mask.
pub fn select_rows(df: &DataFrame, mask: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), mask);
    Ok(df.filter(&mask)?)
}

/// Median price of city listings at one (truncated) distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistancePrice {
    pub meters: i64,
    pub listings: usize,
    pub median_price: f64,
}

/// Median price per whole meter of distance, sorted by distance.
pub fn price_by_distance(city: &DataFrame) -> Result<Vec<DistancePrice>> {
    let curve = city
        .clone()
        .lazy()
        .filter(
            col(CITY_CENTERS_NEAREST)
                .is_not_null()
                .and(col(LAST_PRICE).is_not_null()),
        )
        .group_by([col(CITY_CENTERS_NEAREST)
            .cast(DataType::Float64)
            .cast(DataType::Int64)
            .alias(METERS)])
        .agg([
            len().alias(LISTINGS),
            col(LAST_PRICE)
                .cast(DataType::Float64)
                .median()
                .alias(MEDIAN_PRICE),
        ])
        .sort_by_exprs([col(METERS)], Default::default())
        .collect()?;

    let meters = curve.column(METERS)?.as_materialized_series();
    let listings = curve
        .column(LISTINGS)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    let medians = curve.column(MEDIAN_PRICE)?.as_materialized_series();

    Ok(meters
        .i64()?
        .into_iter()
        .zip(listings.u64()?)
        .zip(medians.f64()?)
        .filter_map(|((meters, listings), median_price)| {
            Some(DistancePrice {
                meters: meters?,
                listings: listings? as usize,
                median_price: median_price?,
            })
        })
        .collect())
}

/// Correlations and medians of one segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentProfile {
    pub name: String,
    pub listings: usize,
    pub correlations: Vec<FactorCorrelation>,
    pub medians: Vec<ColumnMedian>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMedian {
    pub column: String,
    pub median: Option<f64>,
}

/// Factor columns correlated with price inside a segment.
pub fn segment_factor_columns() -> Vec<&'static str> {
    let mut columns = PRICE_FACTOR_COLUMNS.to_vec();
    // ceiling height sits after distance, before the date parts
    let at = columns
        .iter()
        .position(|c| *c == CITY_CENTERS_NEAREST)
        .map_or(columns.len(), |i| i + 1);
    columns.insert(at, CEILING_HEIGHT);
    columns
}

impl SegmentProfile {
    pub fn compute(name: &str, segment: &DataFrame, sentinel: f64) -> Result<Self> {
        let correlations = price_correlations(segment, &segment_factor_columns(), sentinel)?;
        let medians = SEGMENT_MEDIAN_COLUMNS
            .iter()
            .map(|column| {
                Ok(ColumnMedian {
                    column: column.to_string(),
                    median: numeric_column(segment, column, sentinel)?.median(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            listings: segment.height(),
            correlations,
            medians,
        })
    }
}

/// One line of the city vs. center comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub city: Option<f64>,
    pub center: Option<f64>,
    /// `city - center`.
    pub difference: Option<f64>,
}

impl ComparisonRow {
    fn new(metric: String, city: Option<f64>, center: Option<f64>) -> Self {
        let difference = city.zip(center).map(|(a, b)| a - b);
        Self {
            metric,
            city,
            center,
            difference,
        }
    }
}

/// Correlations first, then medians, each paired between the two segments.
pub fn compare_segments(city: &SegmentProfile, center: &SegmentProfile) -> Vec<ComparisonRow> {
    let correlations = city
        .correlations
        .iter()
        .zip(&center.correlations)
        .map(|(a, b)| {
            ComparisonRow::new(
                format!("correlation: {}", a.column),
                a.correlation,
                b.correlation,
            )
        });
    let medians = city.medians.iter().zip(&center.medians).map(|(a, b)| {
        ComparisonRow::new(format!("median: {}", a.column), a.median, b.median)
    });

    correlations.chain(medians).collect()
}

/// Everything computed over the configured city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CenterAnalysis {
    pub locality: String,
    pub threshold_meters: f64,
    pub price_by_distance: Vec<DistancePrice>,
    pub city: SegmentProfile,
    pub center: SegmentProfile,
    pub comparison: Vec<ComparisonRow>,
}

impl CenterAnalysis {
    pub fn compute(df: &DataFrame, config: &PipelineConfig) -> Result<(Self, DataFrame)> {
        let city_df = select_rows(df, &city_mask(df, config)?)?;
        let center_df = select_rows(df, &center_mask(df, config)?)?;

        let city = SegmentProfile::compute("city", &city_df, config.sentinel)?;
        let center = SegmentProfile::compute("center", &center_df, config.sentinel)?;
        let comparison = compare_segments(&city, &center);

        let analysis = Self {
            locality: normalize_locality_name(&config.center_locality),
            threshold_meters: config.center_threshold,
            price_by_distance: price_by_distance(&city_df)?,
            city,
            center,
            comparison,
        };
        Ok((analysis, center_df))
    }
}
