use crate::analysis::AnalysisReport;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Profile of one column before cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub unique_count: usize,
    pub null_count: usize,
    pub null_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skewness: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
    pub total_missing: usize,
    pub missing_percentage: f64,
}

impl DatasetProfile {
    /// Columns with at least one missing cell, most incomplete first.
    pub fn columns_with_missing(&self) -> Vec<&ColumnProfile> {
        let mut columns: Vec<&ColumnProfile> = self
            .column_profiles
            .iter()
            .filter(|c| c.null_count > 0)
            .collect();
        columns.sort_by(|a, b| b.null_count.cmp(&a.null_count));
        columns
    }
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Cleaned table with derived columns.
    pub data: DataFrame,
    /// Missing-value profile taken before cleaning.
    pub profile: DatasetProfile,
    /// Statistics computed over the cleaned table.
    pub report: AnalysisReport,
    /// What the pipeline did.
    pub summary: ProcessingSummary,
}

// ============================================================================
// Processing Summary Types
// ============================================================================

/// Human-readable summary of what the pipeline did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Missing cells before the fill passes.
    pub missing_before: usize,
    /// Missing cells after the fill passes (zero on success).
    pub missing_after: usize,

    /// One record per fill rule, in execution order.
    pub imputations: Vec<ImputationRecord>,

    /// List of actions taken besides imputation.
    pub actions: Vec<ProcessingAction>,

    /// Warnings and notes generated during processing.
    pub warnings: Vec<String>,

    /// Files written by the reporting stage.
    #[serde(default)]
    pub output_files: Vec<String>,
}

impl ProcessingSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_imputation(&mut self, record: ImputationRecord) {
        self.imputations.push(record);
    }

    pub fn add_action(&mut self, action: ProcessingAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Total number of cells filled across every rule.
    pub fn total_filled(&self) -> usize {
        self.imputations.iter().map(|r| r.filled).sum()
    }

    /// Share of the initially missing cells that were filled, in percent.
    pub fn fill_percentage(&self) -> f64 {
        if self.missing_before == 0 {
            100.0
        } else {
            let resolved = self.missing_before.saturating_sub(self.missing_after);
            resolved as f64 / self.missing_before as f64 * 100.0
        }
    }
}

/// How a column's missing values were filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    /// A fixed default value.
    Constant,
    /// Median of a group sharing a key.
    GroupedMedian,
    /// Median of an equal-frequency bucket of another column.
    BucketedMedian,
    /// Global mean.
    Mean,
    /// Global median.
    Median,
    /// Out-of-domain "unknown" marker.
    Sentinel,
}

impl ImputationMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::GroupedMedian => "grouped median",
            Self::BucketedMedian => "bucketed median",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Sentinel => "sentinel",
        }
    }
}

/// A single fill applied to a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub method: ImputationMethod,
    /// Grouping key or fill value, e.g. "by total_area".
    pub detail: String,
    /// Cells that changed from missing to a value.
    pub filled: usize,
}

impl ImputationRecord {
    pub fn new(
        column: impl Into<String>,
        method: ImputationMethod,
        detail: impl Into<String>,
        filled: usize,
    ) -> Self {
        Self {
            column: column.into(),
            method,
            detail: detail.into(),
            filled,
        }
    }
}

/// A single non-imputation action taken during processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingAction {
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    pub description: String,
}

impl ProcessingAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column's data type was changed.
    TypeCast,
    /// Invalid values were cleaned or replaced.
    ValueCleaned,
    /// A computed column was added.
    ColumnDerived,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TypeCast => "Type Cast",
            Self::ValueCleaned => "Value Cleaned",
            Self::ColumnDerived => "Column Derived",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
