//! Pure conversions from scorer output to chart geometry and colours.
//! Total over finite and non-finite input; nothing here allocates state.

use super::bands::{
    Grade, GradeBand, RiskBand, GRADE_BANDS, RADAR_DOMAIN, RISK_ELEVATED_FROM, RISK_HIGH_FROM,
    SCORE_CEILING, SCORE_FLOOR,
};
use super::views::{
    BarView, OrganizationPanel, RadarAxisView, RadarChartView, ReportView, RiskBadgeView,
    RiskMapView, ScatterPoint, StripeView, SummaryScoreEntry,
};
use crate::workflows::diagnosis::scoring::{
    ChartDescriptor, HealthRisk, OrganizationAggregate, OrganizationAverages, ScoringResult,
};

const HIGH_STRESS_HEADLINE: &str = "High Stress Warning";
const HIGH_STRESS_MESSAGE: &str =
    "Your job stress level came out high. We recommend talking to a specialist.";
const NORMAL_HEADLINE: &str = "Normal Stress Level";
const NORMAL_MESSAGE: &str = "Your job stress level is within a stable range.";

/// Linear position of `score` on the 3–12 scale, clamped to `[0, 1]`.
/// Non-finite input lands on the nearest edge (NaN on the floor).
pub fn normalize(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    ((score - SCORE_FLOOR) / (SCORE_CEILING - SCORE_FLOOR)).clamp(0.0, 1.0)
}

pub fn bar_height(score: f64) -> f64 {
    normalize(score)
}

pub fn grade_band(score: f64) -> &'static GradeBand {
    let score = if score.is_nan() { SCORE_FLOOR } else { score };
    GRADE_BANDS
        .iter()
        .rev()
        .find(|band| score >= band.from)
        .unwrap_or(&GRADE_BANDS[0])
}

pub fn grade(score: f64) -> Grade {
    grade_band(score).grade
}

pub fn bar(key: &'static str, label: &'static str, score: f64) -> BarView {
    let band = grade_band(score);
    BarView {
        key,
        label,
        raw: score,
        height: bar_height(score),
        grade: band.grade,
        grade_label: band.grade.label(),
        color: band.color,
    }
}

/// Background stripes, one per grade band, in bar-height space.
pub fn zebra_stripes() -> Vec<StripeView> {
    GRADE_BANDS
        .iter()
        .map(|band| StripeView {
            grade: band.grade,
            from: normalize(band.from),
            to: normalize(band.to),
            color: band.color,
        })
        .collect()
}

/// Risk band of the index as displayed, i.e. rounded to a whole number.
/// The band thresholds apply to that rounded value, not the raw index.
pub fn risk_band(index: f64) -> RiskBand {
    let shown = displayed_index(index) as f64;
    if shown >= RISK_HIGH_FROM {
        RiskBand::High
    } else if shown >= RISK_ELEVATED_FROM {
        RiskBand::Elevated
    } else {
        RiskBand::Normal
    }
}

pub fn risk_color(index: f64) -> &'static str {
    risk_band(index).color()
}

fn displayed_index(index: f64) -> i64 {
    if index.is_nan() {
        return 0;
    }
    index.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64
}

/// Both axes share the bar scale; the vertical one is flipped so a higher
/// raw value sits nearer the top.
pub fn scatter_point(raw_x: f64, raw_y: f64) -> ScatterPoint {
    ScatterPoint {
        x: normalize(raw_x),
        y: 1.0 - normalize(raw_y),
    }
}

/// Radar scores pass through as-is against the fixed 0–5 domain; only
/// non-finite values are pinned to an edge.
pub fn radar_chart(chart: &ChartDescriptor) -> RadarChartView {
    let (domain_min, domain_max) = RADAR_DOMAIN;
    RadarChartView {
        label: chart.label.clone(),
        domain_min,
        domain_max,
        axes: chart
            .axes
            .iter()
            .map(|axis| RadarAxisView {
                label: axis.label.clone(),
                score: radar_score(axis.score),
            })
            .collect(),
    }
}

fn radar_score(score: f64) -> f64 {
    let (domain_min, domain_max) = RADAR_DOMAIN;
    if score.is_nan() || score == f64::NEG_INFINITY {
        domain_min
    } else if score == f64::INFINITY {
        domain_max
    } else {
        score
    }
}

pub fn summary_label(key: &str) -> String {
    match key {
        "sum_a" => "A (Stress Causes)".to_owned(),
        "sum_b" => "B (Stress Responses)".to_owned(),
        "sum_c" => "C (Social Support)".to_owned(),
        other => other.to_owned(),
    }
}

pub fn organization_bars(averages: &OrganizationAverages) -> Vec<BarView> {
    vec![
        bar(
            "quantitative_burden",
            "Quantitative Burden",
            averages.quantitative_burden,
        ),
        bar("control", "Control", averages.control),
        bar(
            "supervisor_support",
            "Supervisor Support",
            averages.supervisor_support,
        ),
        bar(
            "coworker_support",
            "Coworker Support",
            averages.coworker_support,
        ),
    ]
}

pub fn risk_maps(averages: &OrganizationAverages) -> Vec<RiskMapView> {
    vec![
        RiskMapView {
            label: "Burden / Control",
            x_label: "Quantitative Burden",
            y_label: "Control",
            raw_x: averages.quantitative_burden,
            raw_y: averages.control,
            point: scatter_point(averages.quantitative_burden, averages.control),
        },
        RiskMapView {
            label: "Supervisor / Coworker Support",
            x_label: "Supervisor Support",
            y_label: "Coworker Support",
            raw_x: averages.supervisor_support,
            raw_y: averages.coworker_support,
            point: scatter_point(averages.supervisor_support, averages.coworker_support),
        },
    ]
}

fn risk_badge(key: &'static str, label: &'static str, index: f64) -> RiskBadgeView {
    let band = risk_band(index);
    RiskBadgeView {
        key,
        label,
        index,
        display: displayed_index(index),
        band,
        band_label: band.label(),
        color: band.color(),
    }
}

pub fn risk_badges(risk: &HealthRisk) -> Vec<RiskBadgeView> {
    vec![
        risk_badge("work_burden_risk", "Work Burden Risk", risk.work_burden_risk),
        risk_badge("support_risk", "Support Risk", risk.support_risk),
        risk_badge(
            "comprehensive_risk",
            "Comprehensive Risk",
            risk.comprehensive_risk,
        ),
    ]
}

pub fn organization_panel(aggregate: &OrganizationAggregate) -> OrganizationPanel {
    OrganizationPanel {
        respondents: aggregate.count,
        bars: organization_bars(&aggregate.averages),
        stripes: zebra_stripes(),
        risk_maps: risk_maps(&aggregate.averages),
        risk_badges: risk_badges(&aggregate.health_risk),
    }
}

pub fn compose_report(scoring: &ScoringResult) -> ReportView {
    let high_stress = scoring.high_stress();
    let (headline, message) = if high_stress {
        (HIGH_STRESS_HEADLINE, HIGH_STRESS_MESSAGE)
    } else {
        (NORMAL_HEADLINE, NORMAL_MESSAGE)
    };

    ReportView {
        high_stress,
        headline,
        message,
        summary: scoring
            .result
            .summary_scores
            .iter()
            .map(|(key, score)| SummaryScoreEntry {
                key: key.clone(),
                label: summary_label(key),
                score: *score,
            })
            .collect(),
        radar_charts: scoring.charts.iter().map(radar_chart).collect(),
        organization: scoring.organization.as_ref().map(organization_panel),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::diagnosis::scoring::AxisScore;

    #[test]
    fn bar_height_is_linear_and_clamped() {
        assert_eq!(bar_height(3.0), 0.0);
        assert_eq!(bar_height(12.0), 1.0);
        assert!((bar_height(7.5) - 0.5).abs() < 1e-9);
        assert_eq!(bar_height(1.0), 0.0);
        assert_eq!(bar_height(20.0), 1.0);
    }

    #[test]
    fn non_finite_scores_clamp_to_an_edge() {
        assert_eq!(bar_height(f64::NAN), 0.0);
        assert_eq!(bar_height(f64::INFINITY), 1.0);
        assert_eq!(bar_height(f64::NEG_INFINITY), 0.0);
        assert_eq!(grade(f64::NAN), Grade::VeryLow);
        assert_eq!(risk_band(f64::NAN), RiskBand::Normal);
    }

    #[test]
    fn grade_table_is_contiguous() {
        for pair in GRADE_BANDS.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert_eq!(GRADE_BANDS[0].from, SCORE_FLOOR);
        assert_eq!(GRADE_BANDS[GRADE_BANDS.len() - 1].to, SCORE_CEILING);
    }

    #[test]
    fn thresholds_belong_to_the_band_they_open() {
        assert_eq!(grade(5.0), Grade::Low);
        assert_eq!(grade(4.99), Grade::VeryLow);
        assert_eq!(grade(9.0), Grade::High);
    }

    #[test]
    fn stripes_cover_the_full_bar() {
        let stripes = zebra_stripes();
        assert_eq!(stripes.len(), GRADE_BANDS.len());
        assert_eq!(stripes[0].from, 0.0);
        assert_eq!(stripes[stripes.len() - 1].to, 1.0);
        for (stripe, band) in stripes.iter().zip(GRADE_BANDS.iter()) {
            assert_eq!(stripe.color, band.color);
        }
    }

    #[test]
    fn scatter_flips_the_vertical_axis() {
        let low = scatter_point(3.0, 3.0);
        let high = scatter_point(12.0, 12.0);
        assert_eq!(low, ScatterPoint { x: 0.0, y: 1.0 });
        assert_eq!(high, ScatterPoint { x: 1.0, y: 0.0 });
        assert!(scatter_point(7.0, 9.0).y < scatter_point(7.0, 8.0).y);
    }

    #[test]
    fn risk_rounds_before_banding() {
        assert_eq!(risk_band(100.4), RiskBand::Normal);
        assert_eq!(risk_band(100.6), RiskBand::Elevated);
        assert_eq!(risk_band(130.4), RiskBand::Elevated);
        assert_eq!(risk_band(130.6), RiskBand::High);
        assert_eq!(risk_color(150.0), RiskBand::High.color());
    }

    #[test]
    fn radar_pins_only_non_finite_scores() {
        let chart = ChartDescriptor {
            label: "Stress Responses (B)".to_owned(),
            axes: vec![
                AxisScore {
                    id: None,
                    label: "Vigor".to_owned(),
                    score: f64::NAN,
                },
                AxisScore {
                    id: None,
                    label: "Fatigue".to_owned(),
                    score: f64::INFINITY,
                },
                AxisScore {
                    id: None,
                    label: "Anxiety".to_owned(),
                    score: 3.5,
                },
            ],
        };
        let view = radar_chart(&chart);
        let scores: Vec<f64> = view.axes.iter().map(|axis| axis.score).collect();
        assert_eq!(scores, vec![0.0, 5.0, 3.5]);
        assert_eq!((view.domain_min, view.domain_max), (0.0, 5.0));
    }

    #[test]
    fn summary_labels_fall_back_to_the_key() {
        assert_eq!(summary_label("sum_b"), "B (Stress Responses)");
        assert_eq!(summary_label("sum_x"), "sum_x");
    }
}
