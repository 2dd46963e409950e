//! Data cleaning module for the listings table.
//!
//! This module provides functionality for:
//! - Normalizing locality names
//! - Replacing impossible prices

mod sanitizers;

pub use sanitizers::normalize_locality as normalize_locality_name;

use crate::schema::{LAST_PRICE, LOCALITY_NAME};
use crate::types::{ActionType, ProcessingAction};
use anyhow::Result;
use polars::prelude::*;
use tracing::info;

/// Data cleaner for the sanitize stage.
pub struct DataCleaner;

impl DataCleaner {
    /// Normalize locality names and repair non-positive prices.
    ///
    /// A pass over an already sanitized table changes nothing and returns
    /// no actions.
    pub fn sanitize(&self, df: &mut DataFrame) -> Result<Vec<ProcessingAction>> {
        let mut actions = Vec::new();

        info!("Sanitizing locality names and prices...");

        let normalized = sanitizers::normalize_text_column(df, LOCALITY_NAME)?;
        if normalized > 0 {
            actions.push(ProcessingAction::new(
                ActionType::ValueCleaned,
                LOCALITY_NAME,
                format!("Trimmed and lower-cased {} locality names", normalized),
            ));
        }

        let repaired = sanitizers::replace_non_positive(df, LAST_PRICE)?;
        if repaired > 0 {
            actions.push(ProcessingAction::new(
                ActionType::ValueCleaned,
                LAST_PRICE,
                format!(
                    "Replaced {} non-positive prices with the median positive price",
                    repaired
                ),
            ));
        }

        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_reports_actions() {
        let mut df = df![
            "locality_name" => ["Санкт-Петербург ", "санкт-петербург"],
            "last_price" => [0.0, 5_000_000.0]
        ]
        .unwrap();

        let actions = DataCleaner.sanitize(&mut df).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            df.column("last_price").unwrap().f64().unwrap().get(0),
            Some(5_000_000.0)
        );

        let again = DataCleaner.sanitize(&mut df).unwrap();
        assert!(again.is_empty());
    }
}
