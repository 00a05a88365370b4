//! Renderer-agnostic chart series: `{ labels, datasets: [{label, values}] }`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::metrics::*;

/// Label used for the placeholder series of an empty chart
pub const NO_DATA_LABEL: &str = "No Data";

/// Dataset colors, cycled by dataset index
pub const PALETTE: [&str; 8] = [
    "#3B82F6", // Blue
    "#EF4444", // Red
    "#10B981", // Green
    "#F59E0B", // Yellow
    "#8B5CF6", // Purple
    "#06B6D4", // Cyan
    "#F97316", // Orange
    "#EC4899", // Pink
];

/// Chart types the dashboard draws
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

/// One named row of values, aligned with the chart labels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    pub color: String,
}

/// Chart-ready series. Both vectors are always present, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            labels: Vec::new(),
            datasets: Vec::new(),
        }
    }

    /// Single "No Data" dataset with one zero value
    pub fn placeholder(kind: ChartKind) -> Self {
        Self::categorical(kind, vec![NO_DATA_LABEL.to_string()], NO_DATA_LABEL, vec![0.0])
    }

    /// Bar or doughnut chart from parallel labels and values
    pub fn categorical(kind: ChartKind, labels: Vec<String>, label: &str, values: Vec<f64>) -> Self {
        let mut series = Self::new(kind);
        series.labels = labels;
        series.push_dataset(label, values);
        series
    }

    /// Appends a dataset, coloring it by position
    pub fn push_dataset(&mut self, label: &str, values: Vec<f64>) {
        let color = PALETTE[self.datasets.len() % PALETTE.len()].to_string();
        self.datasets.push(Dataset {
            label: label.to_string(),
            values,
            color,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.datasets.iter().all(|d| d.values.is_empty())
    }

    /// True for the "No Data" placeholder
    pub fn is_placeholder(&self) -> bool {
        self.labels.len() == 1
            && self.labels[0] == NO_DATA_LABEL
            && self.datasets.len() == 1
            && self.datasets[0].label == NO_DATA_LABEL
    }

    /// Every dataset has exactly one value per label
    pub fn is_well_formed(&self) -> bool {
        self.datasets.iter().all(|d| d.values.len() == self.labels.len())
    }

    pub fn dataset(&self, label: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.label == label)
    }
}

/// Points that carry a calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for MetricPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for EngagementPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for PerformancePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for TrafficPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for ConversionPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Named value extractor for `build_series`
pub struct Field<P> {
    pub label: &'static str,
    pub select: fn(&P) -> f64,
}

impl<P> Field<P> {
    pub const fn new(label: &'static str, select: fn(&P) -> f64) -> Self {
        Self { label, select }
    }
}

/// `"{Mon} {day}"`, English month abbreviations regardless of locale
pub fn format_date_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Builds one dataset per field over date-labelled points
pub fn build_series<P: Dated>(kind: ChartKind, points: &[P], fields: &[Field<P>]) -> ChartSeries {
    let mut series = ChartSeries::new(kind);
    series.labels = points.iter().map(|p| format_date_label(p.date())).collect();
    for field in fields {
        let values = points.iter().map(|p| (field.select)(p)).collect();
        series.push_dataset(field.label, values);
    }
    series
}

/// Capitalizes the first character of a category name
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn point(day: u32, count: u64) -> MetricPoint {
        MetricPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            count,
        }
    }

    #[test]
    fn test_date_label_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date_label(date), "Mar 5");
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(format_date_label(date), "Dec 25");
    }

    #[test]
    fn test_build_series_line() {
        let points = vec![point(1, 3), point(2, 5)];
        let series = build_series(
            ChartKind::Line,
            &points,
            &[
                Field::new("Count", |p: &MetricPoint| p.count as f64),
                Field::new("Double", |p: &MetricPoint| p.count as f64 * 2.0),
            ],
        );

        assert_eq!(series.labels, vec!["Jan 1", "Jan 2"]);
        assert_eq!(series.datasets[0].values, vec![3.0, 5.0]);
        assert_eq!(series.datasets[1].values, vec![6.0, 10.0]);
        assert_eq!(series.datasets[0].color, PALETTE[0]);
        assert_eq!(series.datasets[1].color, PALETTE[1]);
        assert!(series.is_well_formed());
    }

    #[test]
    fn test_build_series_empty_input_is_well_formed() {
        let series = build_series::<MetricPoint>(
            ChartKind::Bar,
            &[],
            &[Field::new("Count", |p: &MetricPoint| p.count as f64)],
        );
        assert!(series.labels.is_empty());
        assert_eq!(series.datasets.len(), 1);
        assert!(series.datasets[0].values.is_empty());
        assert!(series.is_empty());
        assert!(series.is_well_formed());
    }

    #[test]
    fn test_placeholder() {
        let series = ChartSeries::placeholder(ChartKind::Line);
        assert!(series.is_placeholder());
        assert!(series.is_well_formed());
        assert_eq!(series.datasets[0].values, vec![0.0]);
    }

    #[test]
    fn test_palette_cycles() {
        let mut series = ChartSeries::new(ChartKind::Bar);
        for i in 0..(PALETTE.len() + 1) {
            series.push_dataset(&format!("d{}", i), vec![]);
        }
        assert_eq!(series.datasets[PALETTE.len()].color, PALETTE[0]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("completed"), "Completed");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
    }
}
