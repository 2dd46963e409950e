//! Equal-width histograms and their text rendering.

use serde::{Deserialize, Serialize};

/// Rows a histogram panel is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramSegment {
    /// Every listing.
    All,
    /// Listings in the center of the configured city.
    Center,
}

/// A histogram panel to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    pub column: String,
    pub bins: usize,
    /// Inclusive `[min, max]` value range.
    pub range: (f64, f64),
    pub segment: HistogramSegment,
    pub title: String,
}

impl HistogramSpec {
    pub fn new(
        column: impl Into<String>,
        bins: usize,
        range: (f64, f64),
        segment: HistogramSegment,
        title: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            bins,
            range,
            segment,
            title: title.into(),
        }
    }
}

/// Computed bin counts of one panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    pub title: String,
    pub column: String,
    pub segment: HistogramSegment,
    /// `bins + 1` ascending edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Values outside the range.
    pub excluded: usize,
}

impl Histogram {
    /// Bin `values` into equal-width bins over the panel's range.
    ///
    /// Bins are `[e[k], e[k + 1])` except the last, which also includes the
    /// upper edge. Values outside the range are counted in `excluded`.
    pub fn compute(spec: &HistogramSpec, values: &[f64]) -> Self {
        let (min, max) = spec.range;
        let bins = spec.bins.max(1);
        let width = (max - min) / bins as f64;

        let edges: Vec<f64> = (0..=bins).map(|k| min + width * k as f64).collect();
        let mut counts = vec![0usize; bins];
        let mut excluded = 0;

        for value in values {
            if value.is_nan() || *value < min || *value > max {
                excluded += 1;
                continue;
            }
            let index = (((value - min) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        Self {
            title: spec.title.clone(),
            column: spec.column.clone(),
            segment: spec.segment,
            edges,
            counts,
            excluded,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Render as horizontal text bars, merging adjacent bins down to at most
    /// `max_rows` lines.
    pub fn render(&self, max_rows: usize, bar_width: usize) -> String {
        let bins = self.counts.len();
        let group = bins.div_ceil(max_rows.max(1)).max(1);

        let rows: Vec<(f64, f64, usize)> = self
            .counts
            .chunks(group)
            .enumerate()
            .map(|(i, chunk)| {
                let start = i * group;
                let end = (start + chunk.len()).min(bins);
                (self.edges[start], self.edges[end], chunk.iter().sum())
            })
            .collect();

        let peak = rows.iter().map(|(_, _, c)| *c).max().unwrap_or(0).max(1);
        let mut out = format!("{} [{}]\n", self.title, self.column);
        for (lo, hi, count) in rows {
            let bar = "#".repeat(count * bar_width / peak);
            out.push_str(&format!(
                "  {:>12} - {:<12} | {:<width$} {}\n",
                format_edge(lo),
                format_edge(hi),
                bar,
                count,
                width = bar_width
            ));
        }
        if self.excluded > 0 {
            out.push_str(&format!("  ({} values outside range)\n", self.excluded));
        }
        out
    }
}

fn format_edge(value: f64) -> String {
    if value.abs() >= 1000.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
