pub mod bands;
pub mod mapper;
pub mod views;

pub use bands::{Grade, GradeBand, RiskBand, GRADE_BANDS, RADAR_DOMAIN};
pub use mapper::{
    bar, bar_height, compose_report, grade, grade_band, radar_chart, risk_band, risk_color,
    scatter_point, zebra_stripes,
};
pub use views::{
    BarView, OrganizationPanel, RadarAxisView, RadarChartView, ReportView, RiskBadgeView,
    RiskMapView, ScatterPoint, StripeView, SummaryScoreEntry,
};
