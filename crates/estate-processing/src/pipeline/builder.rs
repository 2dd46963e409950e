//! Main listings pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the load, clean and analyze workflow.

use crate::analysis::Analyzer;
use crate::cleaner::{DataCleaner, normalize_locality_name};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{ProcessingError, Result};
use crate::features::FeatureBuilder;
use crate::loader::{ListingLoader, listing_dates};
use crate::pipeline::ListingExecutor;
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::reporting::ReportGenerator;
use crate::schema::{BALCONY, FLOORS_TOTAL, IS_APARTMENT};
use crate::types::{ActionType, PipelineResult, ProcessingAction, ProcessingSummary};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Where the table of a run comes from.
enum Input<'a> {
    File(&'a Path),
    Table(DataFrame),
}

/// The listings pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use estate_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().center_threshold(5000.0).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process_file("real_estate_data.csv".as_ref())?;
///
/// println!("{} listings", result.data.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    loader: ListingLoader,
    cleaner: DataCleaner,
    executor: ListingExecutor,
    reporter: ReportGenerator,
}

// Ensure Pipeline is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load a listings file and run every stage over it.
    pub fn process_file(&self, path: &Path) -> Result<PipelineResult> {
        self.finish(self.process_internal(Input::File(path)))
    }

    /// Run every stage over a table already in memory.
    ///
    /// The table must carry the 22 input columns; extra columns such as the
    /// derived ones of a previous run are kept and rebuilt.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.finish(self.process_internal(Input::Table(df)))
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, input: Input<'_>) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let mut summary = ProcessingSummary::new();

        info!("Starting listings pipeline...");

        // Stage 1: Load
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            0.0,
            "Loading listings...",
        ));
        let source = match &input {
            Input::File(path) => path.display().to_string(),
            Input::Table(_) => "<memory>".to_string(),
        };
        let mut df = match input {
            Input::File(path) => self.loader.load_file(path)?,
            Input::Table(df) => self.loader.normalize(df)?,
        };
        let dates = listing_dates(&df, &self.config.date_format)?;
        summary.rows = df.height();
        summary.columns_before = df.width();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Loading,
            1.0,
            format!("Loaded {} listings", df.height()),
        ));

        // Stage 2: Profile
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Profiling,
            0.0,
            "Profiling dataset...",
        ));
        info!("Profiling missing values...");
        let profile = DataProfiler::profile_dataset(&df, None)
            .map_err(|e| ProcessingError::from_anyhow(e, ProcessingError::AnalysisFailed))?;
        summary.missing_before = profile.total_missing;
        for column in profile.columns_with_missing() {
            debug!(
                "  {}: {} missing ({:.2}%)",
                column.name, column.null_count, column.null_percentage
            );
        }
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Profiling,
            1.0,
            format!("{} missing cells", profile.total_missing),
        ));

        // Stage 3: Impute
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Filling missing values...",
        ));
        let records = self.executor.impute(
            &mut df,
            &dates,
            &self.config,
            self.progress_reporter.as_deref(),
        )?;
        for record in records {
            summary.add_imputation(record);
        }
        for column in [IS_APARTMENT, BALCONY, FLOORS_TOTAL] {
            summary.add_action(ProcessingAction::new(
                ActionType::TypeCast,
                column,
                format!("Stored '{}' as {}", column, df.column(column)?.dtype()),
            ));
        }

        // Stage 4: Sanitize
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Sanitizing,
            0.0,
            "Sanitizing values...",
        ));
        let actions = self
            .cleaner
            .sanitize(&mut df)
            .map_err(|e| ProcessingError::from_anyhow(e, ProcessingError::SanitizationFailed))?;
        for action in actions {
            summary.add_action(action);
        }
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Sanitizing,
            1.0,
            "Sanitizing complete",
        ));

        // Stage 5: Derive
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Derivation,
            0.0,
            "Deriving columns...",
        ));
        info!("Deriving computed columns...");
        let actions = FeatureBuilder::derive(&mut df, &dates)
            .map_err(|e| ProcessingError::from_anyhow(e, ProcessingError::DerivationFailed))?;
        for action in actions {
            summary.add_action(action);
        }
        summary.columns_after = df.width();
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Derivation,
            1.0,
            format!("{} columns", df.width()),
        ));

        // Stage 6: Verify
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Verification,
            0.0,
            "Verifying completeness...",
        ));
        self.executor.verify(&df)?;
        summary.missing_after = 0;
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Verification,
            1.0,
            "No missing values remain",
        ));

        // Stage 7: Analyze
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Analysis,
            0.0,
            "Analyzing listings...",
        ));
        let report = Analyzer::new(&self.config)
            .analyze(&df)
            .map_err(|e| ProcessingError::from_anyhow(e, ProcessingError::AnalysisFailed))?;
        if report.center.center.listings == 0 {
            summary.add_warning(format!(
                "No '{}' listings closer than {} m to the center",
                self.config.center_locality, self.config.center_threshold
            ));
        }
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Analysis,
            1.0,
            "Analysis complete",
        ));

        // Stage 8: Report
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Reporting,
            0.0,
            "Saving output files...",
        ));
        if self.config.save_cleaned {
            let path = self
                .reporter
                .write_cleaned_csv(&mut df, self.config.separator, &self.config.date_format)
                .map_err(|e| ProcessingError::ReportGenerationFailed(format!("{:#}", e)))?;
            summary.output_files.push(path.display().to_string());
        }
        if self.config.emit_report {
            summary
                .output_files
                .push(self.reporter.report_path().display().to_string());
        }
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        let result = PipelineResult {
            data: df,
            profile,
            report,
            summary,
        };

        if self.config.emit_report {
            let report = ReportGenerator::build_comprehensive_report(&source, &self.config, &result);
            self.reporter
                .write_report_to_file(&report)
                .map_err(|e| ProcessingError::ReportGenerationFailed(format!("{:#}", e)))?;
        }
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Reporting,
            1.0,
            "Output files saved",
        ));

        info!(
            "Pipeline finished in {} ms: {} cells filled",
            result.summary.duration_ms,
            result.summary.total_filled()
        );
        Ok(result)
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
///
/// # Example
///
/// ```rust,ignore
/// use estate_processing::{Pipeline, PipelineConfig};
///
/// let pipeline = Pipeline::builder()
///     .config(PipelineConfig::default())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use estate_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct StageLogger;
    ///
    /// impl ProgressReporter for StageLogger {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(StageLogger))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// The center locality is normalized like the table's locality names.
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let mut config = self.config.unwrap_or_default();
        config.center_locality = normalize_locality_name(&config.center_locality);
        config.validate()?;

        let reporter = ReportGenerator::new(
            config.output_dir.clone(),
            Some(config.output_stem().to_string()),
        );

        Ok(Pipeline {
            loader: ListingLoader::from_config(&config),
            config,
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            executor: ListingExecutor,
            reporter,
        })
    }
}
