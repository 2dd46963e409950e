//! Imputation module for handling missing values.
//!
//! This module provides the fill strategies used by the pipeline:
//! - Statistical imputation (constant, mean, median, sentinel)
//! - Grouped imputation (median by key, median by equal-frequency bucket)

mod grouped;
mod statistical;

pub use grouped::{GroupedImputer, bucket_edges, bucket_index, group_median};
pub use statistical::StatisticalImputer;
