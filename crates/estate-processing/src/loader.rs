//! Loading the listings table.
//!
//! The source export is a delimited text file with a fixed 22-column header.
//! Loading checks the header, reads every column with a pinned dtype and turns
//! `first_day_exposition` into a datetime column, so the rest of the pipeline
//! never deals with raw text dates or textual booleans.

use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result, ResultExt};
use crate::schema::{self, FIRST_DAY_EXPOSITION, IS_APARTMENT, OPEN_PLAN, STUDIO};
use crate::utils::bool_values;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Dtypes the reader is told to use instead of inferring them.
fn pinned_schema() -> Schema {
    use schema::*;

    let float = [
        LAST_PRICE,
        TOTAL_AREA,
        CEILING_HEIGHT,
        FLOORS_TOTAL,
        LIVING_AREA,
        KITCHEN_AREA,
        BALCONY,
        AIRPORTS_NEAREST,
        CITY_CENTERS_NEAREST,
        PARKS_AROUND_3000,
        PARKS_NEAREST,
        PONDS_AROUND_3000,
        PONDS_NEAREST,
        DAYS_EXPOSITION,
    ];
    let int = [TOTAL_IMAGES, ROOMS, FLOOR];
    let text = [
        FIRST_DAY_EXPOSITION,
        IS_APARTMENT,
        STUDIO,
        OPEN_PLAN,
        LOCALITY_NAME,
    ];

    let mut pinned = Schema::default();
    for (names, dtype) in [
        (&float[..], DataType::Float64),
        (&int[..], DataType::Int64),
        (&text[..], DataType::String),
    ] {
        for name in names {
            pinned.with_column((*name).into(), dtype.clone());
        }
    }
    pinned
}

/// Reads listing files into a normalized [`DataFrame`].
#[derive(Debug, Clone)]
pub struct ListingLoader {
    separator: u8,
    date_format: String,
}

impl ListingLoader {
    pub fn new(separator: u8, date_format: impl Into<String>) -> Self {
        Self {
            separator,
            date_format: date_format.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.separator, config.date_format.clone())
    }

    /// Load and normalize a listings file.
    pub fn load_file(&self, path: &Path) -> Result<DataFrame> {
        info!("Loading listings from: {}", path.display());
        let bytes = std::fs::read(path)
            .map_err(ProcessingError::from)
            .context(format!("Failed to read '{}'", path.display()))?;
        self.load_bytes(bytes)
    }

    /// Load and normalize listings held in memory.
    pub fn load_bytes(&self, bytes: Vec<u8>) -> Result<DataFrame> {
        let header = header_columns(&bytes, self.separator);
        let missing = schema::missing_input_columns(&header);
        if !missing.is_empty() {
            return Err(ProcessingError::MissingColumns(missing));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .with_schema_overwrite(Some(Arc::new(pinned_schema())))
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.separator)
                    .with_try_parse_dates(false),
            )
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .context("Failed to parse listings table")?;

        debug!("Raw table shape: {:?}", df.shape());
        self.normalize(df)
    }

    /// Check the schema of an in-memory table and normalize its dates and
    /// boolean columns.
    ///
    /// Tables that already went through the pipeline pass unchanged apart
    /// from dtype normalization.
    pub fn normalize(&self, mut df: DataFrame) -> Result<DataFrame> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        let missing = schema::missing_input_columns(&names);
        if !missing.is_empty() {
            return Err(ProcessingError::MissingColumns(missing));
        }

        let dates = listing_dates(&df, &self.date_format)?;
        let date_series = DatetimeChunked::from_naive_datetime(
            FIRST_DAY_EXPOSITION.into(),
            dates,
            TimeUnit::Milliseconds,
        )
        .into_series();
        df.replace(FIRST_DAY_EXPOSITION, date_series)?;

        for column in [IS_APARTMENT, STUDIO, OPEN_PLAN] {
            if df.column(column)?.dtype() != &DataType::Boolean {
                let values = bool_values(&df, column)
                    .context(format!("Column '{}' is not boolean", column))?;
                df.replace(column, Series::new(column.into(), values))?;
            }
        }

        Ok(df)
    }
}

impl Default for ListingLoader {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Column names of the first line of a delimited file.
fn header_columns(bytes: &[u8], separator: u8) -> Vec<String> {
    let line_end = bytes
        .iter()
        .position(|b| *b == b'\n')
        .unwrap_or(bytes.len());
    let line = String::from_utf8_lossy(&bytes[..line_end]);
    line.trim_start_matches('\u{feff}')
        .trim_end_matches('\r')
        .split(separator as char)
        .map(|name| name.trim().trim_matches('"').to_string())
        .collect()
}

/// Listing dates of every row.
///
/// Accepts the column as text (parsed with `date_format`) or as an already
/// parsed date/datetime column. A missing or unparsable value fails with
/// [`ProcessingError::InvalidDate`] carrying the zero-based row index.
pub fn listing_dates(df: &DataFrame, date_format: &str) -> Result<Vec<NaiveDateTime>> {
    let series = df
        .column(FIRST_DAY_EXPOSITION)
        .map_err(|_| ProcessingError::ColumnNotFound(FIRST_DAY_EXPOSITION.to_string()))?
        .as_materialized_series();

    match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| parse_listing_date(row, value, date_format))
            .collect(),
        DataType::Datetime(_, _) | DataType::Date => {
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value
                        .and_then(DateTime::from_timestamp_millis)
                        .map(|dt| dt.naive_utc())
                        .ok_or_else(|| ProcessingError::InvalidDate {
                            row,
                            value: String::new(),
                        })
                })
                .collect()
        }
        other => Err(ProcessingError::InvalidDate {
            row: 0,
            value: format!("<{}>", other),
        }),
    }
}

fn parse_listing_date(row: usize, value: Option<&str>, format: &str) -> Result<NaiveDateTime> {
    let invalid = || ProcessingError::InvalidDate {
        row,
        value: value.unwrap_or_default().to_string(),
    };
    let text = value.map(str::trim).ok_or_else(invalid)?;

    NaiveDateTime::parse_from_str(text, format)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, format)
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| invalid())
}
