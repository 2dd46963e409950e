//! Descriptive statistics and Pearson correlations over cleaned columns.

use crate::schema::{FLOOR_KIND, FloorKind, LAST_PRICE};
use crate::utils::observed;
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Numeric view of a column with sentinel cells as nulls.
///
/// `floor_kind` is read through its category code.
pub fn numeric_expr(column: &str, sentinel: f64) -> Expr {
    if column == FLOOR_KIND {
        let code = |kind: FloorKind| {
            (
                col(FLOOR_KIND).eq(lit(kind.as_str())),
                lit(f64::from(kind.code())),
            )
        };
        let (first, first_code) = code(FloorKind::First);
        let (last, last_code) = code(FloorKind::Last);
        let (other, other_code) = code(FloorKind::Other);
        return when(first)
            .then(first_code)
            .when(last)
            .then(last_code)
            .when(other)
            .then(other_code)
            .otherwise(lit(NULL).cast(DataType::Float64))
            .alias(FLOOR_KIND);
    }
    observed(column, Some(sentinel))
}

/// Numeric views of several columns, one `Float64` column each.
pub fn numeric_frame(df: &DataFrame, columns: &[&str], sentinel: f64) -> Result<DataFrame> {
    let exprs: Vec<Expr> = columns.iter().map(|c| numeric_expr(c, sentinel)).collect();
    Ok(df.clone().lazy().select(exprs).collect()?)
}

/// Numeric view of one column.
pub fn numeric_column(df: &DataFrame, column: &str, sentinel: f64) -> Result<Series> {
    let frame = numeric_frame(df, &[column], sentinel)?;
    Ok(frame.column(column)?.as_materialized_series().clone())
}

/// Pearson correlation of two columns of `frame` over the rows where both
/// are present.
///
/// `None` for fewer than two complete pairs or a constant side.
pub fn pearson(frame: &DataFrame, x: &str, y: &str) -> Result<Option<f64>> {
    let out = frame
        .clone()
        .lazy()
        .filter(col(x).is_not_null().and(col(y).is_not_null()))
        .select([
            pearson_corr(col(x), col(y)).alias("r"),
            len().alias("pairs"),
        ])
        .collect()?;

    let pairs = out
        .column("pairs")?
        .as_materialized_series()
        .cast(&DataType::UInt64)?
        .u64()?
        .get(0)
        .unwrap_or(0);
    let r = out
        .column("r")?
        .as_materialized_series()
        .cast(&DataType::Float64)?
        .f64()?
        .get(0);

    Ok(r.filter(|r| pairs >= 2 && r.is_finite())
        .map(|r| r.clamp(-1.0, 1.0)))
}

/// count/mean/median/min/max of one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DescriptiveStats {
    pub fn from_series(column: &str, values: &Series) -> Result<Self> {
        Ok(Self {
            column: column.to_string(),
            count: values.len() - values.null_count(),
            mean: values.mean(),
            median: values.median(),
            min: values.min::<f64>()?,
            max: values.max::<f64>()?,
        })
    }
}

/// Describe each column, sentinel excluded.
pub fn describe(df: &DataFrame, columns: &[&str], sentinel: f64) -> Result<Vec<DescriptiveStats>> {
    let frame = numeric_frame(df, columns, sentinel)?;
    columns
        .iter()
        .map(|column| {
            DescriptiveStats::from_series(column, frame.column(column)?.as_materialized_series())
        })
        .collect()
}

/// Correlation of `last_price` with one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCorrelation {
    pub column: String,
    pub correlation: Option<f64>,
}

/// Correlation of `last_price` with each factor column.
pub fn price_correlations(
    df: &DataFrame,
    factors: &[&str],
    sentinel: f64,
) -> Result<Vec<FactorCorrelation>> {
    let mut columns = vec![LAST_PRICE];
    columns.extend(factors.iter().filter(|c| **c != LAST_PRICE));
    let frame = numeric_frame(df, &columns, sentinel)?;

    factors
        .iter()
        .map(|column| {
            Ok(FactorCorrelation {
                column: column.to_string(),
                correlation: pearson(&frame, LAST_PRICE, column)?,
            })
        })
        .collect()
}

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` is the correlation of columns i and j.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Pairwise-complete correlation matrix over the given columns.
pub fn correlation_matrix(
    df: &DataFrame,
    columns: &[&str],
    sentinel: f64,
) -> Result<CorrelationMatrix> {
    let frame = numeric_frame(df, columns, sentinel)?;

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&frame, columns[i], columns[j])?;
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(x: &[Option<f64>], y: &[Option<f64>]) -> DataFrame {
        df!["x" => x, "y" => y].unwrap()
    }

    #[test]
    fn test_pearson_perfect() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let r = pearson(&pair(&x, &y), "x", "y").unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let neg = [Some(3.0), Some(2.0), Some(1.0)];
        let r = pearson(&pair(&x, &neg), "x", "y").unwrap().unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_pairwise_complete() {
        let x = [Some(1.0), None, Some(2.0), Some(3.0)];
        let y = [Some(1.0), Some(100.0), Some(2.0), Some(3.0)];
        let r = pearson(&pair(&x, &y), "x", "y").unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        let single = pair(&[Some(1.0)], &[Some(2.0)]);
        assert_eq!(pearson(&single, "x", "y").unwrap(), None);

        let constant = pair(&[Some(1.0), Some(2.0)], &[Some(5.0), Some(5.0)]);
        assert_eq!(pearson(&constant, "x", "y").unwrap(), None);
    }

    #[test]
    fn test_numeric_column_sentinel_and_floor_kind() {
        let df = df![
            "cityCenters_nearest" => [1200.0, -999.99, 8000.0],
            "floor_kind" => ["first", "last", "other"]
        ]
        .unwrap();

        let distance = numeric_column(&df, "cityCenters_nearest", -999.99).unwrap();
        assert_eq!(
            distance.f64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(1200.0), None, Some(8000.0)]
        );
        let floor = numeric_column(&df, "floor_kind", -999.99).unwrap();
        assert_eq!(
            floor.f64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(1.0), Some(2.0), Some(0.0)]
        );
    }

    #[test]
    fn test_describe_excludes_sentinel() {
        let df = df!["parks_nearest" => [100.0, -999.99, 300.0, 200.0]].unwrap();
        let stats = describe(&df, &["parks_nearest"], -999.99).unwrap();

        assert_eq!(stats[0].count, 3);
        assert_eq!(stats[0].mean, Some(200.0));
        assert_eq!(stats[0].median, Some(200.0));
        assert_eq!(stats[0].min, Some(100.0));
        assert_eq!(stats[0].max, Some(300.0));
    }

    #[test]
    fn test_price_correlations_skip_sentinel_rows() {
        let df = df![
            "last_price" => [1.0, 2.0, 3.0, 4.0],
            "parks_nearest" => [10.0, 20.0, -999.99, 40.0]
        ]
        .unwrap();

        let correlations = price_correlations(&df, &["parks_nearest"], -999.99).unwrap();
        assert!((correlations[0].correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_matrix_symmetric() {
        let df = df![
            "last_price" => [1.0, 2.0, 3.0, 4.0],
            "rooms" => [1.0, 1.0, 2.0, 3.0],
            "total_area" => [4.0, 3.0, 2.0, 1.0]
        ]
        .unwrap();
        let matrix =
            correlation_matrix(&df, &["last_price", "rooms", "total_area"], -999.99).unwrap();

        assert_eq!(matrix.get("last_price", "last_price"), Some(1.0));
        assert_eq!(
            matrix.get("last_price", "rooms"),
            matrix.get("rooms", "last_price")
        );
        assert!((matrix.get("last_price", "total_area").unwrap() + 1.0).abs() < 1e-12);
    }
}
