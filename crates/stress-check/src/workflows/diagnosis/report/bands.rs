//! Fixed band tables shared by every chart that colours by score.
//!
//! Boundary policy, used by both tables: a value exactly on a threshold
//! belongs to the band that starts there.

use serde::Serialize;

/// Lower edge of the three-item sum scale.
pub const SCORE_FLOOR: f64 = 3.0;
/// Upper edge of the three-item sum scale.
pub const SCORE_CEILING: f64 = 12.0;

/// Fixed radial domain of the radar charts; scores are not rescaled to it.
pub const RADAR_DOMAIN: (f64, f64) = (0.0, 5.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Grade {
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub grade: Grade,
    /// Inclusive lower edge on the raw scale.
    pub from: f64,
    /// Exclusive upper edge, except for the last band which closes the scale.
    pub to: f64,
    pub color: &'static str,
}

/// Bar grades and the bar chart's background stripes both read this table.
pub const GRADE_BANDS: [GradeBand; 5] = [
    GradeBand {
        grade: Grade::VeryLow,
        from: SCORE_FLOOR,
        to: 5.0,
        color: "#d4edda",
    },
    GradeBand {
        grade: Grade::Low,
        from: 5.0,
        to: 7.0,
        color: "#e8f4d9",
    },
    GradeBand {
        grade: Grade::Moderate,
        from: 7.0,
        to: 9.0,
        color: "#fff3cd",
    },
    GradeBand {
        grade: Grade::High,
        from: 9.0,
        to: 11.0,
        color: "#ffe0b2",
    },
    GradeBand {
        grade: Grade::VeryHigh,
        from: 11.0,
        to: SCORE_CEILING,
        color: "#f8d7da",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Normal,
    Elevated,
    High,
}

impl RiskBand {
    pub const fn ordered() -> [Self; 3] {
        [Self::Normal, Self::Elevated, Self::High]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::High => "High",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Normal => "#28a745",
            Self::Elevated => "#ffc107",
            Self::High => "#dc3545",
        }
    }
}

/// Health-risk indices centre on this value.
pub const RISK_BASELINE: f64 = 100.0;
/// First displayed index value in the elevated band. Compared against the
/// index after rounding, so any raw index from 100.5 is elevated.
pub const RISK_ELEVATED_FROM: f64 = 101.0;
/// First displayed index value in the high band. Compared against the index
/// after rounding, so any raw index from 130.5 is high.
pub const RISK_HIGH_FROM: f64 = 131.0;
