//! Imputation executor.
//!
//! Runs the column-specific fill rules in their fixed order and checks that
//! the cleaned table has no missing cells left.

use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::imputers::{GroupedImputer, StatisticalImputer};
use crate::pipeline::progress::{PipelineStage, ProgressReporter, ProgressUpdate};
use crate::schema::{
    BALCONY, CEILING_HEIGHT, DAYS_EXPOSITION, FLOORS_TOTAL, IS_APARTMENT, KITCHEN_AREA,
    LIVING_AREA, LOCALITY_NAME, PROXIMITY_COLUMNS,
};
use crate::types::ImputationRecord;
use chrono::NaiveDateTime;
use polars::prelude::*;
use tracing::{debug, info, warn};

type FillRule<'a> = Box<dyn Fn(&mut DataFrame) -> anyhow::Result<Vec<ImputationRecord>> + 'a>;

/// Fill rules in execution order, keyed by the column they fill.
///
/// Later rules may read columns filled by earlier ones: kitchen area is
/// bucketed on the already filled living area.
fn fill_rules<'a>(
    dates: &'a [NaiveDateTime],
    config: &'a PipelineConfig,
) -> Vec<(&'static str, FillRule<'a>)> {
    let mut rules: Vec<(&'static str, FillRule<'a>)> = vec![
        (
            IS_APARTMENT,
            Box::new(|df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_boolean(df, IS_APARTMENT, false)?])
            }),
        ),
        (
            BALCONY,
            Box::new(|df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_integer(df, BALCONY, 0)?])
            }),
        ),
        (
            DAYS_EXPOSITION,
            Box::new(move |df: &mut DataFrame| GroupedImputer::fill_days_exposition(df, dates)),
        ),
        (
            LIVING_AREA,
            Box::new(|df: &mut DataFrame| GroupedImputer::fill_living_area(df)),
        ),
        (
            KITCHEN_AREA,
            Box::new(move |df: &mut DataFrame| {
                Ok(vec![GroupedImputer::fill_kitchen_area(
                    df,
                    config.kitchen_buckets,
                )?])
            }),
        ),
        (
            FLOORS_TOTAL,
            Box::new(|df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_mean_as_integer(df, FLOORS_TOTAL)?])
            }),
        ),
        (
            CEILING_HEIGHT,
            Box::new(|df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_median(df, CEILING_HEIGHT)?])
            }),
        ),
        (
            LOCALITY_NAME,
            Box::new(move |df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_text(
                    df,
                    LOCALITY_NAME,
                    &config.undefined_locality,
                )?])
            }),
        ),
    ];

    for column in PROXIMITY_COLUMNS {
        rules.push((
            column,
            Box::new(move |df: &mut DataFrame| {
                Ok(vec![StatisticalImputer::fill_sentinel(
                    df,
                    column,
                    config.sentinel,
                )?])
            }),
        ));
    }

    rules
}

/// Executes the imputation and verification stages.
pub struct ListingExecutor;

impl ListingExecutor {
    /// Apply every fill rule in order.
    ///
    /// `dates` are the parsed listing dates, one per row. Reports one
    /// progress update per rule when a reporter is given.
    pub fn impute(
        &self,
        df: &mut DataFrame,
        dates: &[NaiveDateTime],
        config: &PipelineConfig,
        reporter: Option<&dyn ProgressReporter>,
    ) -> Result<Vec<ImputationRecord>> {
        let rules = fill_rules(dates, config);
        let total = rules.len();
        let mut records = Vec::new();

        info!("Applying {} fill rules...", total);
        for (index, (column, rule)) in rules.into_iter().enumerate() {
            let filled = rule(df).map_err(|e| {
                ProcessingError::from_anyhow(e, |reason| ProcessingError::ImputationFailed {
                    column: column.to_string(),
                    reason,
                })
            })?;

            for record in &filled {
                debug!(
                    "  {}: {} cells ({} {})",
                    record.column,
                    record.filled,
                    record.method.display_name(),
                    record.detail
                );
            }
            records.extend(filled);

            if let Some(reporter) = reporter {
                reporter.report(ProgressUpdate::with_items(
                    PipelineStage::Imputation,
                    index + 1,
                    total,
                    format!("Filled {}", column),
                ));
            }
        }

        Ok(records)
    }

    /// Fail with [`ProcessingError::UnresolvedMissing`] on the first column
    /// that still has missing cells.
    pub fn verify(&self, df: &DataFrame) -> Result<()> {
        let unresolved: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect();

        for (column, count) in &unresolved {
            warn!("'{}' still has {} missing values", column, count);
        }

        match unresolved.into_iter().next() {
            Some((column, count)) => Err(ProcessingError::UnresolvedMissing { column, count }),
            None => Ok(()),
        }
    }
}
