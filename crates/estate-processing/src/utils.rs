//! Shared utilities for the listings pipeline.
//!
//! Column extraction, the observed-value expression and boolean parsing used
//! by the imputers, the feature builder and the analysis code.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Short label of a dtype for profiles and reports.
pub fn dtype_label(dtype: &DataType) -> &'static str {
    if matches!(dtype, DataType::Float32 | DataType::Float64) {
        "float"
    } else if is_numeric_dtype(dtype) {
        "int"
    } else if is_datetime_dtype(dtype) {
        "datetime"
    } else if matches!(dtype, DataType::Boolean) {
        "bool"
    } else if matches!(dtype, DataType::String) {
        "string"
    } else {
        "other"
    }
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as optional `f64` values, casting integers and booleans.
pub fn f64_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df.column(column)?.as_materialized_series();
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted.f64()?.into_iter().collect())
}

/// Read a column as optional strings.
pub fn string_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(column)?.as_materialized_series();
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read a column as optional booleans.
///
/// String columns are parsed with [`parse_boolean`]; unrecognized text is
/// treated as missing.
pub fn bool_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<bool>>> {
    let series = df.column(column)?.as_materialized_series();
    match series.dtype() {
        DataType::Boolean => Ok(series.bool()?.into_iter().collect()),
        DataType::String => Ok(series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_boolean))
            .collect()),
        dtype if is_numeric_dtype(dtype) => {
            let casted = series.cast(&DataType::Float64)?;
            Ok(casted
                .f64()?
                .into_iter()
                .map(|v| v.map(|x| x != 0.0))
                .collect())
        }
        other => Err(PolarsError::ComputeError(
            format!("column '{}' of type {} is not boolean", column, other).into(),
        )),
    }
}

/// Number of missing cells in a column.
pub fn null_count(df: &DataFrame, column: &str) -> PolarsResult<usize> {
    Ok(df.column(column)?.null_count())
}

// =============================================================================
// Expression Utilities
// =============================================================================

const SENTINEL_TOLERANCE: f64 = 1e-9;

/// A numeric column as `Float64` with NaN and sentinel cells turned into nulls.
///
/// Aggregations over this expression (`median`, `mean`, `std`) see only the
/// observed values.
pub fn observed(column: &str, sentinel: Option<f64>) -> Expr {
    let value = col(column).cast(DataType::Float64);
    let mut unknown = value.clone().is_nan();
    if let Some(s) = sentinel {
        unknown = unknown.or(value
            .clone()
            .gt(lit(s - SENTINEL_TOLERANCE))
            .and(value.clone().lt(lit(s + SENTINEL_TOLERANCE))));
    }
    when(unknown)
        .then(lit(NULL).cast(DataType::Float64))
        .otherwise(value)
        .alias(column)
}

/// Evaluate [`observed`] for one column.
pub fn observed_series(
    df: &DataFrame,
    column: &str,
    sentinel: Option<f64>,
) -> PolarsResult<Series> {
    let out = df
        .select([column])?
        .lazy()
        .select([observed(column, sentinel)])
        .collect()?;
    Ok(out.column(column)?.as_materialized_series().clone())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::Float64)?;
    let filled: Vec<f64> = casted
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let casted = series.cast(&DataType::String)?;
    let filled: Vec<String> = casted
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Boolean Detection Utilities
// =============================================================================

/// Common boolean true representations.
pub const BOOLEAN_TRUE_VALUES: [&str; 5] = ["true", "yes", "1", "t", "y"];

/// Common boolean false representations.
pub const BOOLEAN_FALSE_VALUES: [&str; 5] = ["false", "no", "0", "f", "n"];

/// Parse a textual boolean (case-insensitive).
pub fn parse_boolean(s: &str) -> Option<bool> {
    let lower = s.trim().to_ascii_lowercase();
    if BOOLEAN_TRUE_VALUES.contains(&lower.as_str()) {
        Some(true)
    } else if BOOLEAN_FALSE_VALUES.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_label() {
        assert_eq!(dtype_label(&DataType::Int32), "int");
        assert_eq!(dtype_label(&DataType::Float64), "float");
        assert_eq!(
            dtype_label(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            "datetime"
        );
        assert_eq!(dtype_label(&DataType::String), "string");
    }

    #[test]
    fn test_observed_drops_sentinel_and_nan() {
        let df = df!["parks_nearest" => [Some(1.0), None, Some(-999.99), Some(f64::NAN), Some(5.0)]]
            .unwrap();

        let with_sentinel = observed_series(&df, "parks_nearest", Some(-999.99)).unwrap();
        assert_eq!(with_sentinel.null_count(), 3);
        assert_eq!(with_sentinel.median(), Some(3.0));

        let without = observed_series(&df, "parks_nearest", None).unwrap();
        assert_eq!(without.null_count(), 2);
        assert_eq!(without.f64().unwrap().get(2), Some(-999.99));
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(parse_boolean("True"), Some(true));
        assert_eq!(parse_boolean(" no "), Some(false));
        assert_eq!(parse_boolean("maybe"), None);
    }

    #[test]
    fn test_bool_values_from_strings() {
        let df = df!["flag" => [Some("True"), None, Some("False")]].unwrap();
        assert_eq!(
            bool_values(&df, "flag").unwrap(),
            vec![Some(true), None, Some(false)]
        );
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.f64().unwrap().get(1), Some(0.0));
        assert_eq!(filled.f64().unwrap().get(2), Some(3.0));
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "undefined").unwrap();
        assert_eq!(filled.str().unwrap().get(1), Some("undefined"));
    }
}
