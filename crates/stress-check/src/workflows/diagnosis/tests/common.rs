use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::diagnosis::answers::AnswerSet;
use crate::workflows::diagnosis::domain::{
    AnswerOption, Question, QuestionId, ScoringVariant, Section,
};
use crate::workflows::diagnosis::export::{
    CapturedPage, DocumentEncoder, ExportError, PageGeometry, PlacedPage, RegionKind,
    RegionRenderer, RenderProfile,
};
use crate::workflows::diagnosis::gateway::{DeliveryChannel, DeliveryError, Scorer, ScorerError};
use crate::workflows::diagnosis::intake::IntakeController;
use crate::workflows::diagnosis::questionnaire::Questionnaire;
use crate::workflows::diagnosis::report::ReportView;
use crate::workflows::diagnosis::scoring::{
    AxisScore, ChartDescriptor, Classification, HealthRisk, OrganizationAggregate,
    OrganizationAverages, ScoringResult,
};

pub(crate) const SECTION_SIZES: [(Section, u32); 4] =
    [(Section::A, 17), (Section::B, 29), (Section::C, 9), (Section::D, 2)];

fn four_options() -> Vec<AnswerOption> {
    ["Very much so", "Somewhat", "A little", "Not at all"]
        .iter()
        .enumerate()
        .map(|(idx, label)| AnswerOption {
            label: (*label).to_string(),
            score: 4 - idx as i32,
        })
        .collect()
}

/// The 57-item instrument: A17, B29, C9, D2.
pub(crate) fn standard_questionnaire() -> Questionnaire {
    let questions = SECTION_SIZES
        .iter()
        .flat_map(|(section, size)| {
            (1..=*size).map(move |number| Question {
                id: QuestionId::new(*section, number),
                section: *section,
                number,
                text: format!("{} question {number}", section.label()),
                options: four_options(),
            })
        })
        .collect();
    Questionnaire::new(questions).expect("standard questionnaire is valid")
}

pub(crate) fn shared_questionnaire() -> Arc<Questionnaire> {
    Arc::new(standard_questionnaire())
}

pub(crate) fn fill_section(intake: &mut IntakeController, section: Section, score: i32) {
    let ids: Vec<QuestionId> = intake
        .questionnaire()
        .questions_for(section)
        .iter()
        .map(|question| question.id.clone())
        .collect();
    for id in ids {
        intake.select_answer(id, score).expect("valid selection");
    }
}

/// Answers everything and walks to the final section.
pub(crate) fn complete_intake(intake: &mut IntakeController) {
    for section in Section::ordered() {
        fill_section(intake, section, 2);
        intake.next().expect("section complete");
    }
}

pub(crate) fn full_answer_set() -> AnswerSet {
    standard_questionnaire()
        .questions()
        .iter()
        .map(|question| (question.id.clone(), 2))
        .collect()
}

pub(crate) fn sample_charts() -> Vec<ChartDescriptor> {
    let axis = |id: &str, label: &str, score: f64| AxisScore {
        id: Some(id.to_string()),
        label: label.to_string(),
        score,
    };
    vec![
        ChartDescriptor {
            label: "Stress Causes (A)".to_string(),
            axes: vec![
                axis("F-A1", "Quantitative Burden", 2.0),
                axis("F-A2", "Qualitative Burden", 3.0),
                axis("F-A3", "Physical Burden", 4.0),
                axis("F-A4", "Job Control", 1.5),
            ],
        },
        ChartDescriptor {
            label: "Stress Responses (B)".to_string(),
            axes: vec![
                axis("F-B1", "Vigor", 3.0),
                axis("F-B2", "Irritability", 2.5),
                axis("F-B3", "Fatigue", 5.0),
            ],
        },
    ]
}

pub(crate) fn sample_aggregate() -> OrganizationAggregate {
    OrganizationAggregate {
        count: 12,
        averages: OrganizationAverages {
            quantitative_burden: 9.5,
            control: 6.0,
            supervisor_support: 8.0,
            coworker_support: 11.0,
        },
        health_risk: HealthRisk {
            work_burden_risk: 112.3,
            support_risk: 95.1,
            comprehensive_risk: 132.8,
        },
    }
}

pub(crate) fn sample_result(with_organization: bool) -> ScoringResult {
    ScoringResult {
        result: Classification {
            high_stress: true,
            summary_scores: BTreeMap::from([
                ("sum_a".to_string(), 48.0),
                ("sum_b".to_string(), 80.0),
                ("sum_c".to_string(), 20.0),
            ]),
        },
        charts: sample_charts(),
        organization: with_organization.then(sample_aggregate),
    }
}

pub(crate) fn export_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 14)
        .and_then(|date| date.and_hms_opt(9, 26, 53))
        .expect("valid timestamp")
}

/// Scorer that records what it was sent and can be told to fail.
#[derive(Default)]
pub(crate) struct StubScorer {
    pub(crate) fail: AtomicBool,
    pub(crate) fail_organization: AtomicBool,
    pub(crate) calls: AtomicUsize,
    pub(crate) last_variant: Mutex<Option<ScoringVariant>>,
    pub(crate) cohort_sizes: Mutex<Vec<usize>>,
}

impl StubScorer {
    pub(crate) fn failing() -> Self {
        let scorer = Self::default();
        scorer.fail.store(true, Ordering::SeqCst);
        scorer
    }
}

#[async_trait]
impl Scorer for StubScorer {
    async fn diagnose(
        &self,
        _answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<ScoringResult, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_variant.lock().expect("variant lock") = Some(variant);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ScorerError::Transport("connection refused".to_string()));
        }
        Ok(sample_result(false))
    }

    async fn diagnose_organization(
        &self,
        cohort: &[AnswerSet],
        _variant: ScoringVariant,
    ) -> Result<OrganizationAggregate, ScorerError> {
        self.cohort_sizes
            .lock()
            .expect("cohort lock")
            .push(cohort.len());
        if self.fail_organization.load(Ordering::SeqCst) {
            return Err(ScorerError::Rejected {
                status: 400,
                body: "answers_list is empty".to_string(),
            });
        }
        let mut aggregate = sample_aggregate();
        aggregate.count = cohort.len();
        Ok(aggregate)
    }
}

/// Scorer that parks inside `diagnose` until released.
#[derive(Default)]
pub(crate) struct GatedScorer {
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

#[async_trait]
impl Scorer for GatedScorer {
    async fn diagnose(
        &self,
        _answers: &AnswerSet,
        _variant: ScoringVariant,
    ) -> Result<ScoringResult, ScorerError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(sample_result(false))
    }

    async fn diagnose_organization(
        &self,
        _cohort: &[AnswerSet],
        _variant: ScoringVariant,
    ) -> Result<OrganizationAggregate, ScorerError> {
        Ok(sample_aggregate())
    }
}

#[derive(Default)]
pub(crate) struct MemoryDelivery {
    pub(crate) fail: AtomicBool,
    pub(crate) sent: Mutex<Vec<(String, usize, ScoringVariant)>>,
}

#[async_trait]
impl DeliveryChannel for MemoryDelivery {
    async fn deliver(
        &self,
        address: &str,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected(503));
        }
        self.sent
            .lock()
            .expect("delivery lock")
            .push((address.to_string(), answers.count(), variant));
        Ok(())
    }
}

/// Renderer that always fails to capture.
pub(crate) struct BrokenRenderer;

impl RegionRenderer for BrokenRenderer {
    fn render(
        &self,
        _report: &ReportView,
        region: RegionKind,
        _profile: &RenderProfile,
    ) -> Result<CapturedPage, ExportError> {
        Err(ExportError::Capture {
            region,
            reason: "canvas unavailable".to_string(),
        })
    }
}

/// Encoder that remembers page order and emits one line per page.
#[derive(Default, Clone)]
pub(crate) struct RecordingEncoder {
    pub(crate) seen: Arc<Mutex<Vec<RegionKind>>>,
}

impl DocumentEncoder for RecordingEncoder {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn extension(&self) -> &'static str {
        "txt"
    }

    fn encode(
        &self,
        pages: &[PlacedPage],
        _geometry: &PageGeometry,
    ) -> Result<Vec<u8>, ExportError> {
        let mut seen = self.seen.lock().expect("encoder lock");
        seen.clear();
        seen.extend(pages.iter().map(|placed| placed.page.region));
        Ok(pages
            .iter()
            .map(|placed| placed.page.region.label())
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes())
    }
}

pub(crate) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
