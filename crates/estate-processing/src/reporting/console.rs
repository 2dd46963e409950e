//! Plain-text rendering of profiles and analysis results.

use crate::analysis::{AnalysisReport, CenterAnalysis, LocalitySummary};
use crate::types::{DatasetProfile, ProcessingSummary};

const SEPARATOR_WIDTH: usize = 80;
const HISTOGRAM_ROWS: usize = 12;
const HISTOGRAM_BAR_WIDTH: usize = 40;
const DISTANCE_ROWS: usize = 15;

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(title.to_string());
    lines.push("-".repeat(SEPARATOR_WIDTH));
}

/// Missing values per column, most incomplete first.
pub fn render_profile(profile: &DatasetProfile) -> String {
    let mut lines = vec![format!(
        "Shape: {} rows x {} columns, {} missing cells ({:.2}%)",
        profile.shape.0, profile.shape.1, profile.total_missing, profile.missing_percentage
    )];

    let missing = profile.columns_with_missing();
    if missing.is_empty() {
        lines.push("No missing values.".to_string());
    } else {
        lines.push(format!("{:<24} {:>8} {:>9}  dtype", "column", "missing", "percent"));
        for column in missing {
            lines.push(format!(
                "{:<24} {:>8} {:>8.2}%  {}",
                column.name, column.null_count, column.null_percentage, column.dtype
            ));
        }
    }
    lines.join("\n")
}

/// Fill rules and other actions of one run.
pub fn render_summary(summary: &ProcessingSummary) -> String {
    let mut lines = vec![
        format!("Rows: {}", summary.rows),
        format!(
            "Columns: {} -> {}",
            summary.columns_before, summary.columns_after
        ),
        format!(
            "Missing cells: {} -> {} ({} filled)",
            summary.missing_before,
            summary.missing_after,
            summary.total_filled()
        ),
        format!("Duration: {} ms", summary.duration_ms),
    ];

    if !summary.imputations.is_empty() {
        section(&mut lines, "Imputation");
        for record in summary.imputations.iter().filter(|r| r.filled > 0) {
            lines.push(format!(
                "  {:<22} {:>7} cells  {} ({})",
                record.column,
                record.filled,
                record.method.display_name(),
                record.detail
            ));
        }
    }
    if !summary.actions.is_empty() {
        section(&mut lines, "Actions");
        for action in &summary.actions {
            lines.push(format!("  {}: {}", action.target, action.description));
        }
    }
    if !summary.warnings.is_empty() {
        section(&mut lines, "Warnings");
        for warning in &summary.warnings {
            lines.push(format!("  ! {}", warning));
        }
    }
    lines.join("\n")
}

fn render_localities(lines: &mut Vec<String>, localities: &LocalitySummary) {
    section(
        lines,
        &format!(
            "Top {} of {} localities by listings",
            localities.top.len(),
            localities.localities
        ),
    );
    lines.push(format!("  {:<32} {:>8} {:>14}", "locality", "listings", "median m2"));
    for stats in &localities.top {
        lines.push(format!(
            "  {:<32} {:>8} {:>14}",
            stats.locality,
            stats.listings,
            fmt_opt(stats.median_square_meter_price, 0)
        ));
    }
    if let Some(highest) = &localities.highest {
        lines.push(format!(
            "  Highest price per m2: {} ({})",
            highest.locality,
            fmt_opt(highest.median_square_meter_price, 0)
        ));
    }
    if let Some(lowest) = &localities.lowest {
        lines.push(format!(
            "  Lowest price per m2:  {} ({})",
            lowest.locality,
            fmt_opt(lowest.median_square_meter_price, 0)
        ));
    }
}

fn render_center(lines: &mut Vec<String>, center: &CenterAnalysis) {
    section(
        lines,
        &format!(
            "'{}': city {} listings, center (< {} m) {} listings",
            center.locality, center.city.listings, center.threshold_meters, center.center.listings
        ),
    );

    lines.push(format!("  {:>10} {:>8} {:>14}", "meters", "listings", "median price"));
    for point in center.price_by_distance.iter().take(DISTANCE_ROWS) {
        lines.push(format!(
            "  {:>10} {:>8} {:>14.0}",
            point.meters, point.listings, point.median_price
        ));
    }
    let hidden = center.price_by_distance.len().saturating_sub(DISTANCE_ROWS);
    if hidden > 0 {
        lines.push(format!("  ... {} more distances", hidden));
    }

    lines.push(String::new());
    lines.push(format!(
        "  {:<36} {:>14} {:>14} {:>14}",
        "metric", "city", "center", "difference"
    ));
    for row in &center.comparison {
        lines.push(format!(
            "  {:<36} {:>14} {:>14} {:>14}",
            row.metric,
            fmt_opt(row.city, 3),
            fmt_opt(row.center, 3),
            fmt_opt(row.difference, 3)
        ));
    }
}

/// Every analysis table followed by the histograms.
pub fn render_analysis(report: &AnalysisReport) -> String {
    let mut lines = vec![format!("Listings analyzed: {}", report.rows)];

    section(&mut lines, "Descriptive statistics");
    lines.push(format!(
        "  {:<20} {:>8} {:>14} {:>14} {:>14} {:>14}",
        "column", "count", "mean", "median", "min", "max"
    ));
    for stats in &report.descriptive {
        lines.push(format!(
            "  {:<20} {:>8} {:>14} {:>14} {:>14} {:>14}",
            stats.column,
            stats.count,
            fmt_opt(stats.mean, 2),
            fmt_opt(stats.median, 2),
            fmt_opt(stats.min, 2),
            fmt_opt(stats.max, 2)
        ));
    }
    lines.push(format!(
        "  Listing duration: mean {} days, median {} days",
        fmt_opt(report.listing_duration.mean_days, 1),
        fmt_opt(report.listing_duration.median_days, 1)
    ));

    section(&mut lines, "Correlation with last_price");
    for factor in &report.price_factors {
        lines.push(format!(
            "  {:<24} {:>8}",
            factor.column,
            fmt_opt(factor.correlation, 3)
        ));
    }

    section(&mut lines, "Correlation matrix");
    let matrix = &report.correlation_matrix;
    for (i, column) in matrix.columns.iter().enumerate() {
        let cells: Vec<String> = matrix.values[i]
            .iter()
            .map(|v| format!("{:>6}", fmt_opt(*v, 2)))
            .collect();
        lines.push(format!("  [{:>2}] {:<22} {}", i, column, cells.join("")));
    }

    render_localities(&mut lines, &report.localities);
    render_center(&mut lines, &report.center);

    section(&mut lines, "Histograms");
    for histogram in &report.histograms {
        lines.push(histogram.render(HISTOGRAM_ROWS, HISTOGRAM_BAR_WIDTH));
    }

    lines.join("\n")
}
