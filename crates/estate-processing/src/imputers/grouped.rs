//! Group-aware median imputation.
//!
//! A missing cell takes the median of the observed values that share its
//! grouping key. Keys without observed values leave the cell missing so a
//! later, coarser fallback can handle it.

use crate::schema::{DAYS_EXPOSITION, KITCHEN_AREA, LIVING_AREA, ROOMS, TOTAL_AREA};
use crate::types::{ImputationMethod, ImputationRecord};
use crate::utils::f64_values;
use anyhow::Result;
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

const YEAR_KEY: &str = "__listing_year";
const MONTH_KEY: &str = "__listing_month";
const BUCKET_KEY: &str = "__bucket";
const FIRST_STAGE: &str = "__first_stage";

/// Median of `value` within its key group, null for rows with a missing key.
pub fn group_median(value: &str, keys: &[&str]) -> Expr {
    let partition: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let has_key = keys
        .iter()
        .map(|k| col(*k).is_not_null())
        .reduce(|a, b| a.and(b))
        .unwrap_or_else(|| lit(true));

    when(has_key)
        .then(col(value).median().over(partition))
        .otherwise(lit(NULL).cast(DataType::Float64))
}

/// Fill `column` in two passes and return the cells filled by each.
///
/// `frame` must hold `column` and every key the two expressions use. The
/// second expression is evaluated after the first pass, over the partly
/// filled column stored as [`FIRST_STAGE`].
fn fill_two_stage(
    df: &mut DataFrame,
    frame: DataFrame,
    column: &str,
    first: Expr,
    second: Expr,
) -> Result<(usize, usize)> {
    let missing = df.column(column)?.null_count();
    let out = frame
        .lazy()
        .with_column(col(column).cast(DataType::Float64))
        .with_column(col(column).fill_null(first).alias(FIRST_STAGE))
        .select([
            col(FIRST_STAGE),
            col(FIRST_STAGE).fill_null(second).alias(column),
        ])
        .collect()?;

    let after_first = out.column(FIRST_STAGE)?.null_count();
    let filled = out.column(column)?.as_materialized_series().clone();
    let after_second = filled.null_count();
    df.replace(column, filled)?;

    Ok((missing - after_first, after_first - after_second))
}

/// Equal-frequency bucket edges of a column.
///
/// Edges are quantiles at `i / buckets` with linear interpolation; repeated
/// edges collapse so every bucket is non-empty in range.
pub fn bucket_edges(series: &Series, buckets: usize) -> Result<Vec<f64>> {
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?;
    if buckets == 0 {
        return Ok(Vec::new());
    }

    let mut edges = Vec::with_capacity(buckets + 1);
    for i in 0..=buckets {
        if let Some(edge) = values.quantile(i as f64 / buckets as f64, QuantileMethod::Linear)? {
            edges.push(edge);
        }
    }
    edges.dedup();
    Ok(edges)
}

/// Bucket index of a value: `(e[k], e[k + 1]]`, with the lowest edge
/// belonging to the first bucket.
pub fn bucket_index(value: f64, edges: &[f64]) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if value.is_nan() || value < first || value > last {
        return None;
    }
    if edges.len() == 1 {
        return Some(0);
    }
    edges[1..].iter().position(|edge| value <= *edge)
}

/// Median imputation over grouping keys.
pub struct GroupedImputer;

impl GroupedImputer {
    /// Fill `days_exposition` by the (year, month) of the listing date, then
    /// by the year alone.
    ///
    /// Year medians ignore values filled by the month level: both levels
    /// group the values observed before this fill.
    pub fn fill_days_exposition(
        df: &mut DataFrame,
        dates: &[NaiveDateTime],
    ) -> Result<Vec<ImputationRecord>> {
        let mut frame = df.select([DAYS_EXPOSITION])?;
        frame.with_column(Series::new(
            YEAR_KEY.into(),
            dates.iter().map(|d| d.year()).collect::<Vec<i32>>(),
        ))?;
        frame.with_column(Series::new(
            MONTH_KEY.into(),
            dates.iter().map(|d| d.month()).collect::<Vec<u32>>(),
        ))?;

        // the year window is taken before the month pass runs
        let frame = frame
            .lazy()
            .with_column(group_median(DAYS_EXPOSITION, &[YEAR_KEY]).alias("__year_median"))
            .collect()?;

        let (by_month, by_year) = fill_two_stage(
            df,
            frame,
            DAYS_EXPOSITION,
            group_median(DAYS_EXPOSITION, &[YEAR_KEY, MONTH_KEY]),
            col("__year_median"),
        )?;
        debug!(
            "days_exposition: {} filled by month, {} by year",
            by_month, by_year
        );

        Ok(vec![
            ImputationRecord::new(
                DAYS_EXPOSITION,
                ImputationMethod::GroupedMedian,
                "by listing year and month",
                by_month,
            ),
            ImputationRecord::new(
                DAYS_EXPOSITION,
                ImputationMethod::GroupedMedian,
                "by listing year",
                by_year,
            ),
        ])
    }

    /// Fill `living_area` by exact `total_area`, then by `rooms`.
    ///
    /// The room medians see the values filled by the first stage.
    pub fn fill_living_area(df: &mut DataFrame) -> Result<Vec<ImputationRecord>> {
        let frame = df.select([LIVING_AREA, TOTAL_AREA, ROOMS])?;

        let (by_area, by_rooms) = fill_two_stage(
            df,
            frame,
            LIVING_AREA,
            group_median(LIVING_AREA, &[TOTAL_AREA]),
            group_median(FIRST_STAGE, &[ROOMS]),
        )?;
        debug!("living_area: {} filled by total_area, {} by rooms", by_area, by_rooms);

        Ok(vec![
            ImputationRecord::new(
                LIVING_AREA,
                ImputationMethod::GroupedMedian,
                "by total_area",
                by_area,
            ),
            ImputationRecord::new(
                LIVING_AREA,
                ImputationMethod::GroupedMedian,
                "by rooms",
                by_rooms,
            ),
        ])
    }

    /// Fill `kitchen_area` by equal-frequency buckets of `living_area`.
    pub fn fill_kitchen_area(df: &mut DataFrame, buckets: usize) -> Result<ImputationRecord> {
        let missing = df.column(KITCHEN_AREA)?.null_count();
        let edges = bucket_edges(df.column(LIVING_AREA)?.as_materialized_series(), buckets)?;
        let keys: Vec<Option<u32>> = f64_values(df, LIVING_AREA)?
            .into_iter()
            .map(|v| v.and_then(|x| bucket_index(x, &edges)).map(|k| k as u32))
            .collect();

        let mut frame = df.select([KITCHEN_AREA])?;
        frame.with_column(Series::new(BUCKET_KEY.into(), keys))?;
        let out = frame
            .lazy()
            .select([col(KITCHEN_AREA)
                .cast(DataType::Float64)
                .fill_null(group_median(KITCHEN_AREA, &[BUCKET_KEY]))])
            .collect()?;

        let values = out.column(KITCHEN_AREA)?.as_materialized_series().clone();
        let filled = missing - values.null_count();
        df.replace(KITCHEN_AREA, values)?;
        debug!(
            "kitchen_area: {} filled over {} living_area buckets",
            filled,
            edges.len().saturating_sub(1).max(1)
        );

        Ok(ImputationRecord::new(
            KITCHEN_AREA,
            ImputationMethod::BucketedMedian,
            format!("by living_area {}-quantile bucket", buckets),
            filled,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_group_median_ignores_missing() {
        let df = df![
            "key" => [Some("a"), Some("a"), Some("a"), Some("b"), None],
            "value" => [Some(1.0), Some(3.0), None, None, Some(100.0)]
        ]
        .unwrap();

        let out = df
            .lazy()
            .select([group_median("value", &["key"]).alias("median")])
            .collect()
            .unwrap();
        let medians = out.column("median").unwrap().f64().unwrap().clone();

        assert_eq!(medians.get(2), Some(2.0));
        assert_eq!(medians.get(3), None);
        // a missing key neither contributes nor receives a median
        assert_eq!(medians.get(4), None);
    }

    #[test]
    fn test_bucket_edges_deciles() {
        let values: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        let edges = bucket_edges(&Series::new("living_area".into(), values), 10).unwrap();
        assert_eq!(edges, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_bucket_edges_collapse_duplicates() {
        let values = Series::new(
            "living_area".into(),
            &[Some(5.0), Some(5.0), None, Some(5.0), Some(5.0), Some(9.0)],
        );
        let edges = bucket_edges(&values, 4).unwrap();
        assert_eq!(edges, vec![5.0, 9.0]);
        assert_eq!(bucket_index(5.0, &edges), Some(0));
        assert_eq!(bucket_index(9.0, &edges), Some(0));
    }

    #[test]
    fn test_bucket_index_right_closed() {
        let edges = [0.0, 10.0, 20.0];
        assert_eq!(bucket_index(0.0, &edges), Some(0));
        assert_eq!(bucket_index(10.0, &edges), Some(0));
        assert_eq!(bucket_index(10.5, &edges), Some(1));
        assert_eq!(bucket_index(20.0, &edges), Some(1));
        assert_eq!(bucket_index(20.5, &edges), None);
        assert_eq!(bucket_index(-1.0, &edges), None);
    }

    #[test]
    fn test_days_exposition_month_then_year() {
        let mut df = df![
            "days_exposition" => [Some(10.0), Some(30.0), None, Some(100.0), None, None]
        ]
        .unwrap();
        let dates = [
            date(2018, 1, 5),
            date(2018, 1, 20),
            date(2018, 1, 25),
            date(2018, 6, 1),
            date(2018, 9, 1),
            date(2015, 3, 1),
        ];

        let records = GroupedImputer::fill_days_exposition(&mut df, &dates).unwrap();
        let col = df.column("days_exposition").unwrap().f64().unwrap().clone();

        // same month
        assert_eq!(col.get(2), Some(20.0));
        // empty month, year median over observed 10, 30, 100
        assert_eq!(col.get(4), Some(30.0));
        // no data for the year
        assert_eq!(col.get(5), None);
        assert_eq!(records[0].filled, 1);
        assert_eq!(records[1].filled, 1);
    }

    #[test]
    fn test_living_area_by_total_then_rooms() {
        let mut df = df![
            "total_area" => [40.0, 40.0, 40.0, 55.0, 70.0],
            "rooms" => [1i64, 1, 1, 2, 2],
            "living_area" => [Some(18.0), Some(20.0), None, Some(30.0), None]
        ]
        .unwrap();

        let records = GroupedImputer::fill_living_area(&mut df).unwrap();
        let col = df.column("living_area").unwrap().f64().unwrap().clone();

        assert_eq!(col.get(2), Some(19.0));
        assert_eq!(col.get(4), Some(30.0));
        assert_eq!(records[0].filled, 1);
        assert_eq!(records[1].filled, 1);
    }

    #[test]
    fn test_kitchen_area_stays_within_bucket_range() {
        let mut df = df![
            "living_area" => [10.0, 11.0, 12.0, 40.0, 41.0, 42.0],
            "kitchen_area" => [Some(5.0), Some(7.0), None, Some(15.0), Some(17.0), None]
        ]
        .unwrap();

        let record = GroupedImputer::fill_kitchen_area(&mut df, 2).unwrap();
        let col = df.column("kitchen_area").unwrap().f64().unwrap().clone();

        assert_eq!(record.filled, 2);
        assert_eq!(col.get(2), Some(6.0));
        assert_eq!(col.get(5), Some(16.0));
    }
}
