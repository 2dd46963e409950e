//! Real-Estate Listings Processing Library
//!
//! Cleaning and exploratory analysis of a real-estate listings export, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! This library loads one tab-delimited listings table and runs it through an
//! ordered sequence of stages:
//!
//! - **Loading**: Fixed 22-column schema, pinned dtypes, parsed listing dates
//! - **Profiling**: Missing values per column before cleaning
//! - **Imputation**: Column-specific fill rules (constants, grouped and
//!   bucketed medians, global mean/median, "unknown" sentinel)
//! - **Sanitizing**: Locality name normalization and price repair
//! - **Derivation**: Price per square meter, listing date parts, floor
//!   position, area ratios
//! - **Verification**: No missing value may survive cleaning
//! - **Analysis**: Descriptive statistics, correlations, locality aggregates,
//!   city-center segment comparison and histograms
//! - **Reporting**: Optional JSON report and cleaned table
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use estate_processing::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .center_locality("Санкт-Петербург")
//!     .center_threshold(7500.0)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process_file("real_estate_data.csv".as_ref())?;
//!
//! for factor in &result.report.price_factors {
//!     println!("{}: {:?}", factor.column, factor.correlation);
//! }
//! ```
//!
//! An in-memory table with the same columns can be passed to
//! [`Pipeline::process`] instead. Running the pipeline over its own output
//! changes nothing.

pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analysis::{AnalysisReport, Analyzer, CenterAnalysis, Histogram, HistogramSpec};
pub use cleaner::DataCleaner;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use features::FeatureBuilder;
pub use imputers::{GroupedImputer, StatisticalImputer};
pub use loader::{ListingLoader, listing_dates};
pub use pipeline::{
    ClosureProgressReporter, ListingExecutor, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use reporting::{ComprehensiveReport, ReportGenerator};
pub use schema::FloorKind;
pub use types::{
    ActionType, ColumnProfile, DatasetProfile, ImputationMethod, ImputationRecord,
    PipelineResult, ProcessingAction, ProcessingSummary,
};
