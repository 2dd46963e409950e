//! Pipeline module.
//!
//! This module provides the listings pipeline and its progress reporting.

mod builder;
mod executor;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use executor::ListingExecutor;
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
