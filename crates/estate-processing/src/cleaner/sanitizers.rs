//! Value sanitization for text and price columns.

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim, collapse inner whitespace and lower-case a locality name.
pub fn normalize_locality(value: &str) -> String {
    WHITESPACE_RUN
        .replace_all(value.trim(), " ")
        .to_lowercase()
}

/// Normalize every value of a text column and return how many changed.
pub(crate) fn normalize_text_column(df: &mut DataFrame, col_name: &str) -> Result<usize> {
    let series = df.column(col_name)?.as_materialized_series();
    let str_series = series.str()?;

    let mut changed = 0;
    let mut cleaned_values = Vec::with_capacity(str_series.len());
    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => {
                let cleaned = normalize_locality(val);
                if cleaned != val {
                    changed += 1;
                }
                cleaned_values.push(Some(cleaned));
            }
            None => cleaned_values.push(None),
        }
    }

    if changed > 0 {
        df.replace(col_name, Series::new(col_name.into(), cleaned_values))?;
    }
    debug!("Normalized {} values in '{}'", changed, col_name);
    Ok(changed)
}

/// Replace non-positive prices with the median of the positive ones.
///
/// Returns the number of replaced values.
pub(crate) fn replace_non_positive(df: &mut DataFrame, col_name: &str) -> Result<usize> {
    let prices = df
        .column(col_name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let invalid = prices.f64()?.into_iter().flatten().filter(|v| *v <= 0.0).count();

    if invalid == 0 {
        return Ok(0);
    }
    let positive = prices.filter(&prices.f64()?.gt(0.0))?;
    let Some(replacement) = positive.median() else {
        bail!("column '{}' has no positive values", col_name);
    };

    let price = col(col_name).cast(DataType::Float64);
    let cleaned = df
        .select([col_name])?
        .lazy()
        .select([when(price.clone().lt_eq(lit(0.0)))
            .then(lit(replacement))
            .otherwise(price)
            .alias(col_name)])
        .collect()?;
    df.replace(col_name, cleaned.column(col_name)?.as_materialized_series().clone())?;

    debug!(
        "Replaced {} non-positive values in '{}' with {}",
        invalid, col_name, replacement
    );
    Ok(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locality() {
        assert_eq!(normalize_locality("  Санкт-Петербург "), "санкт-петербург");
        assert_eq!(
            normalize_locality("посёлок   Мурино"),
            "посёлок мурино"
        );
        assert_eq!(normalize_locality("undefined"), "undefined");
    }

    #[test]
    fn test_normalize_text_column_counts_changes() {
        let mut df = df!["locality_name" => ["Пушкин", "пушкин", " Колпино"]].unwrap();
        let changed = normalize_text_column(&mut df, "locality_name").unwrap();

        assert_eq!(changed, 2);
        let col = df.column("locality_name").unwrap();
        assert_eq!(col.str().unwrap().get(2), Some("колпино"));
    }

    #[test]
    fn test_replace_non_positive() {
        let mut df = df!["last_price" => [0.0, 100.0, 300.0, -5.0, 200.0]].unwrap();
        let replaced = replace_non_positive(&mut df, "last_price").unwrap();

        assert_eq!(replaced, 2);
        let col = df.column("last_price").unwrap().f64().unwrap().clone();
        assert_eq!(col.get(0), Some(200.0));
        assert_eq!(col.get(3), Some(200.0));
        assert_eq!(col.get(1), Some(100.0));
    }

    #[test]
    fn test_replace_non_positive_without_positive_values() {
        let mut df = df!["last_price" => [0.0, -1.0]].unwrap();
        assert!(replace_non_positive(&mut df, "last_price").is_err());
    }
}
