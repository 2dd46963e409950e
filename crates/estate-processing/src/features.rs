//! Derived columns computed from a cleaned listing row.
//!
//! Every derived column is a pure function of its row and is rebuilt on each
//! run, replacing any column of the same name.

use crate::schema::{
    DAY_EXPOSITION, FLOOR, FLOOR_KIND, FLOORS_TOTAL, FloorKind, KITCHEN_AREA,
    KITCHEN_TO_TOTAL_AREA, LAST_PRICE, LIVING_AREA, LIVING_TO_TOTAL_AREA, MONTH_EXPOSITION,
    SQUARE_METER_PRICE, TOTAL_AREA, YEAR_EXPOSITION,
};
use crate::types::{ActionType, ProcessingAction};
use crate::utils::f64_values;
use anyhow::{Result, ensure};
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;
use tracing::debug;

/// `numerator / denominator`, missing when either side is missing or the
/// denominator is not positive.
fn ratio(numerator: &[Option<f64>], denominator: &[Option<f64>]) -> Vec<Option<f64>> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| match (n, d) {
            (Some(n), Some(d)) if *d > 0.0 => Some(n / d),
            _ => None,
        })
        .collect()
}

/// Builds the derived columns of the listings table.
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Add price per square meter, listing date parts, floor position and
    /// area ratios.
    pub fn derive(df: &mut DataFrame, dates: &[NaiveDateTime]) -> Result<Vec<ProcessingAction>> {
        ensure!(
            dates.len() == df.height(),
            "{} listing dates for {} rows",
            dates.len(),
            df.height()
        );

        let total_area = f64_values(df, TOTAL_AREA)?;
        let price = f64_values(df, LAST_PRICE)?;
        let living = f64_values(df, LIVING_AREA)?;
        let kitchen = f64_values(df, KITCHEN_AREA)?;

        let floor_kinds: Vec<Option<&'static str>> = f64_values(df, FLOOR)?
            .into_iter()
            .zip(f64_values(df, FLOORS_TOTAL)?)
            .map(|(floor, total)| match (floor, total) {
                (Some(f), Some(t)) => Some(FloorKind::classify(f as i64, t as i64).as_str()),
                _ => None,
            })
            .collect();

        let weekdays: Vec<i32> = dates
            .iter()
            .map(|d| d.weekday().num_days_from_monday() as i32)
            .collect();
        let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();
        let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();

        let derived = [
            Series::new(SQUARE_METER_PRICE.into(), ratio(&price, &total_area)),
            Series::new(DAY_EXPOSITION.into(), weekdays),
            Series::new(MONTH_EXPOSITION.into(), months),
            Series::new(YEAR_EXPOSITION.into(), years),
            Series::new(FLOOR_KIND.into(), floor_kinds),
            Series::new(LIVING_TO_TOTAL_AREA.into(), ratio(&living, &total_area)),
            Series::new(KITCHEN_TO_TOTAL_AREA.into(), ratio(&kitchen, &total_area)),
        ];

        let mut actions = Vec::with_capacity(derived.len());
        for series in derived {
            let name = series.name().to_string();
            debug!("Derived '{}' ({} missing)", name, series.null_count());
            df.with_column(series)?;
            actions.push(ProcessingAction::new(
                ActionType::ColumnDerived,
                name.as_str(),
                format!("Computed '{}'", name),
            ));
        }

        Ok(actions)
    }
}
