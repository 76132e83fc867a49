use serde::Serialize;

use super::bands::{Grade, RiskBand};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryScoreEntry {
    pub key: String,
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarAxisView {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarChartView {
    pub label: String,
    pub domain_min: f64,
    pub domain_max: f64,
    pub axes: Vec<RadarAxisView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarView {
    pub key: &'static str,
    pub label: &'static str,
    pub raw: f64,
    /// Fraction of the full bar height, in `[0, 1]`.
    pub height: f64,
    pub grade: Grade,
    pub grade_label: &'static str,
    pub color: &'static str,
}

/// Background band behind the bars, in the same fractional space as
/// [`BarView::height`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripeView {
    pub grade: Grade,
    pub from: f64,
    pub to: f64,
    pub color: &'static str,
}

/// Position inside a unit square; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMapView {
    pub label: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub raw_x: f64,
    pub raw_y: f64,
    pub point: ScatterPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskBadgeView {
    pub key: &'static str,
    pub label: &'static str,
    pub index: f64,
    pub display: i64,
    pub band: RiskBand,
    pub band_label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationPanel {
    pub respondents: usize,
    pub bars: Vec<BarView>,
    pub stripes: Vec<StripeView>,
    pub risk_maps: Vec<RiskMapView>,
    pub risk_badges: Vec<RiskBadgeView>,
}

/// Everything the result screen and the export render from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub high_stress: bool,
    pub headline: &'static str,
    pub message: &'static str,
    pub summary: Vec<SummaryScoreEntry>,
    pub radar_charts: Vec<RadarChartView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationPanel>,
}
