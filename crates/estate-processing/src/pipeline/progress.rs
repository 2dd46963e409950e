//! Progress reporting for the listings pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use estate_processing::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process_file("listings.tsv".as_ref());
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the listings pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Reading the file and checking its schema
    Loading,
    /// Profiling missing values before cleaning
    Profiling,
    /// Filling missing values
    Imputation,
    /// Normalizing localities and prices
    Sanitizing,
    /// Computing derived columns
    Derivation,
    /// Checking that no missing values remain
    Verification,
    /// Statistics, correlations and segments
    Analysis,
    /// Writing outputs
    Reporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Processing stages in execution order (terminal states excluded).
    pub const ORDERED: [PipelineStage; 8] = [
        Self::Loading,
        Self::Profiling,
        Self::Imputation,
        Self::Sanitizing,
        Self::Derivation,
        Self::Verification,
        Self::Analysis,
        Self::Reporting,
    ];

    /// Label shown in logs and the CLI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Listings",
            Self::Profiling => "Profiling Dataset",
            Self::Imputation => "Imputing Values",
            Self::Sanitizing => "Sanitizing Values",
            Self::Derivation => "Deriving Columns",
            Self::Verification => "Verifying Completeness",
            Self::Analysis => "Analyzing Listings",
            Self::Reporting => "Generating Reports",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage.
    ///
    /// Weights of the processing stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.05,
            Self::Profiling => 0.10,
            Self::Imputation => 0.35,
            Self::Sanitizing => 0.05,
            Self::Derivation => 0.10,
            Self::Verification => 0.05,
            Self::Analysis => 0.25,
            Self::Reporting => 0.05,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Overall progress when this stage starts.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            stage => Self::ORDERED
                .iter()
                .take_while(|s| *s != stage)
                .map(|s| s.weight())
                .sum(),
        }
    }
}

/// One progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Stage the update belongs to
    pub stage: PipelineStage,

    /// Share of the whole run done, 0.0 to 1.0
    pub progress: f32,

    /// Share of `stage` done, 0.0 to 1.0
    pub stage_progress: f32,

    /// What the pipeline is doing
    pub message: String,

    /// Fill rules applied so far, for the imputation stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Fill rules in the imputation stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Update for item `current` of `total` within a stage.
    pub fn with_items(
        stage: PipelineStage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Final update of a successful run.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    /// Final update of a failed run.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates.
///
/// Implementations must be `Send + Sync` so a pipeline carrying one can be
/// moved to a worker thread.
pub trait ProgressReporter: Send + Sync {
    /// Called when progress is made. May be called once per fill rule.
    fn report(&self, update: ProgressUpdate);
}

/// Adapts a closure to [`ProgressReporter`].
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_weights_sum_to_one() {
        let total: f32 = PipelineStage::ORDERED.iter().map(|s| s.weight()).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        assert_eq!(PipelineStage::Loading.base_progress(), 0.0);
        assert!((PipelineStage::Imputation.base_progress() - 0.15).abs() < 1e-6);
        assert!((PipelineStage::Reporting.base_progress() - 0.95).abs() < 1e-6);
        assert_eq!(PipelineStage::Complete.base_progress(), 1.0);
    }

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Profiling, 0.5, "Profiling...");
        assert_eq!(update.stage, PipelineStage::Profiling);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.10).abs() < 1e-6);
        assert_eq!(update.message, "Profiling...");
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(PipelineStage::Imputation, 5, 10, "Filling balcony");
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.items_processed, Some(5));
        assert_eq!(update.items_total, Some(10));
    }

    #[test]
    fn test_progress_update_terminal() {
        let done = ProgressUpdate::complete("Done!");
        assert_eq!(done.stage, PipelineStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, PipelineStage::Failed);
        assert_eq!(failed.progress, 0.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let reporter = ClosureProgressReporter::new(move |_update| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Loading, 0.0, "Loading"));
        reporter.report(ProgressUpdate::complete("Done"));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_progress_update_serialization() {
        let update = ProgressUpdate::new(PipelineStage::Verification, 1.0, "Verified");
        let json = serde_json::to_string(&update).expect("Should serialize");
        assert!(json.contains("\"verification\""));
        assert!(!json.contains("items_total"));
    }
}
