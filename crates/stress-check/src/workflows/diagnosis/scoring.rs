//! Wire shapes returned by the external scorer. Held read-only once a
//! submission succeeds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub result: Classification,
    pub charts: Vec<ChartDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationAggregate>,
}

impl ScoringResult {
    pub fn high_stress(&self) -> bool {
        self.result.high_stress
    }

    pub fn has_organization(&self) -> bool {
        self.organization.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub high_stress: bool,
    /// Named section totals such as `sum_a`, `sum_b`, `sum_c`.
    pub summary_scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub label: String,
    pub axes: Vec<AxisScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAggregate {
    pub count: usize,
    pub averages: OrganizationAverages,
    pub health_risk: HealthRisk,
}

/// Cohort means of three-item sums, each on the 3–12 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAverages {
    pub quantitative_burden: f64,
    pub control: f64,
    pub supervisor_support: f64,
    pub coworker_support: f64,
}

/// Health-risk indices centred on 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthRisk {
    pub work_burden_risk: f64,
    pub support_risk: f64,
    pub comprehensive_risk: f64,
}
