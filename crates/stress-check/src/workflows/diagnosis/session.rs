use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};

use super::answers::AnswerSet;
use super::domain::{DiagnosisError, QuestionId, ScoringVariant, Section};
use super::export::{CapturedPage, ExportArtifact, ExportComposer, RegionKind};
use super::gateway::{DeliveryChannel, Scorer};
use super::intake::{IntakeController, IntakeSnapshot};
use super::questionnaire::Questionnaire;
use super::report::{compose_report, ReportView};
use super::scoring::ScoringResult;

/// Held once a submission succeeds; immutable until restart.
#[derive(Debug, Clone)]
pub struct ResultState {
    answers: AnswerSet,
    scoring: ScoringResult,
    report: ReportView,
}

impl ResultState {
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn scoring(&self) -> &ScoringResult {
        &self.scoring
    }

    pub fn report(&self) -> &ReportView {
        &self.report
    }
}

#[derive(Debug, Clone)]
pub enum SessionStage {
    Landing,
    Intake(IntakeController),
    Result(Box<ResultState>),
}

impl SessionStage {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Intake(_) => "intake",
            Self::Result(_) => "result",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SessionView {
    Landing {
        variant: ScoringVariant,
    },
    Intake {
        variant: ScoringVariant,
        intake: IntakeSnapshot,
    },
    Result {
        variant: ScoringVariant,
        answered: usize,
        report: ReportView,
    },
}

/// One respondent's pass through landing, intake, and result.
#[derive(Debug, Clone)]
pub struct DiagnosisSession {
    questionnaire: Arc<Questionnaire>,
    variant: ScoringVariant,
    stage: SessionStage,
}

impl DiagnosisSession {
    pub fn new(questionnaire: Arc<Questionnaire>) -> Self {
        Self {
            questionnaire,
            variant: ScoringVariant::default(),
            stage: SessionStage::Landing,
        }
    }

    pub fn stage(&self) -> &SessionStage {
        &self.stage
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage.name()
    }

    pub fn variant(&self) -> ScoringVariant {
        self.variant
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    /// Swaps in a freshly loaded questionnaire. Only valid before intake
    /// starts, so an in-progress answer set never refers to stale questions.
    pub fn load_questions(&mut self, questionnaire: Arc<Questionnaire>) -> Result<(), DiagnosisError> {
        self.expect_landing("load_questions")?;
        self.questionnaire = questionnaire;
        Ok(())
    }

    pub fn start(&mut self, variant: ScoringVariant) -> Result<&IntakeController, DiagnosisError> {
        self.expect_landing("start")?;
        self.variant = variant;
        self.stage = SessionStage::Intake(IntakeController::new(Arc::clone(&self.questionnaire)));
        info!(variant = variant.label(), total = self.questionnaire.total(), "intake started");
        self.intake("start")
    }

    pub fn intake(&self, operation: &'static str) -> Result<&IntakeController, DiagnosisError> {
        match &self.stage {
            SessionStage::Intake(intake) => Ok(intake),
            other => Err(invalid_stage(operation, other)),
        }
    }

    fn intake_mut(&mut self, operation: &'static str) -> Result<&mut IntakeController, DiagnosisError> {
        match &mut self.stage {
            SessionStage::Intake(intake) => Ok(intake),
            other => Err(invalid_stage(operation, other)),
        }
    }

    pub fn result(&self, operation: &'static str) -> Result<&ResultState, DiagnosisError> {
        match &self.stage {
            SessionStage::Result(state) => Ok(state),
            other => Err(invalid_stage(operation, other)),
        }
    }

    fn expect_landing(&self, operation: &'static str) -> Result<(), DiagnosisError> {
        match &self.stage {
            SessionStage::Landing => Ok(()),
            other => Err(invalid_stage(operation, other)),
        }
    }

    pub fn select_answer(&mut self, question_id: QuestionId, score: i32) -> Result<(), DiagnosisError> {
        self.intake_mut("select_answer")?
            .select_answer(question_id, score)
    }

    pub fn next(&mut self) -> Result<Section, DiagnosisError> {
        self.intake_mut("next")?.next()
    }

    pub fn previous(&mut self) -> Result<Section, DiagnosisError> {
        Ok(self.intake_mut("previous")?.previous())
    }

    /// 0 on landing, 100 once a result is held.
    pub fn progress(&self) -> u8 {
        match &self.stage {
            SessionStage::Landing => 0,
            SessionStage::Intake(intake) => intake.progress(),
            SessionStage::Result(_) => 100,
        }
    }

    /// Scores the respondent and, when a cohort is supplied, the cohort plus
    /// the respondent's own answers. Either both calls succeed and the
    /// session moves to its result, or nothing changes.
    pub async fn submit<S>(
        &mut self,
        scorer: &S,
        cohort: &[AnswerSet],
    ) -> Result<&ResultState, DiagnosisError>
    where
        S: Scorer + ?Sized,
    {
        let variant = self.variant;
        let (answers, scoring) = {
            let intake = self.intake("submit")?;
            let mut scoring = intake.submit(scorer, variant).await?;

            if !cohort.is_empty() {
                let mut batch = cohort.to_vec();
                batch.push(intake.answers().clone());
                let aggregate = scorer
                    .diagnose_organization(&batch, variant)
                    .await
                    .map_err(|err| {
                        warn!(error = %err, cohort = batch.len(), "organization scoring failed");
                        DiagnosisError::DiagnosisFailed(err)
                    })?;
                scoring.organization = Some(aggregate);
            }

            (intake.answers().clone(), scoring)
        };

        let report = compose_report(&scoring);
        info!(
            high_stress = scoring.high_stress(),
            organization = scoring.has_organization(),
            "diagnosis received"
        );
        self.stage = SessionStage::Result(Box::new(ResultState {
            answers,
            scoring,
            report,
        }));
        self.result("submit")
    }

    /// Back to landing from anywhere; answers and any result are dropped.
    pub fn restart(&mut self) {
        info!(from = self.stage.name(), "session restarted");
        self.variant = ScoringVariant::default();
        self.stage = SessionStage::Landing;
    }

    pub fn export(
        &self,
        composer: &ExportComposer,
        now: NaiveDateTime,
    ) -> Result<ExportArtifact, DiagnosisError> {
        let state = self.result("export")?;
        composer
            .export(&state.report, now)
            .map_err(DiagnosisError::ExportFailed)
    }

    /// Live rendering of one region of the held result.
    pub fn render_region(
        &self,
        composer: &ExportComposer,
        region: RegionKind,
        viewport_width_px: u32,
        viewport_height_px: u32,
    ) -> Result<CapturedPage, DiagnosisError> {
        let state = self.result("render_region")?;
        composer
            .render_live(&state.report, region, viewport_width_px, viewport_height_px)
            .map_err(DiagnosisError::ExportFailed)
    }

    pub async fn deliver<D>(&self, channel: &D, address: &str) -> Result<(), DiagnosisError>
    where
        D: DeliveryChannel + ?Sized,
    {
        let state = self.result("deliver")?;
        channel
            .deliver(address, &state.answers, self.variant)
            .await
            .map_err(|err| {
                warn!(error = %err, "delivery failed");
                DiagnosisError::DeliveryFailed(err)
            })
    }

    pub fn view(&self) -> SessionView {
        let variant = self.variant;
        match &self.stage {
            SessionStage::Landing => SessionView::Landing { variant },
            SessionStage::Intake(intake) => SessionView::Intake {
                variant,
                intake: intake.snapshot(),
            },
            SessionStage::Result(state) => SessionView::Result {
                variant,
                answered: state.answers.count(),
                report: state.report.clone(),
            },
        }
    }

    #[cfg(any(test, feature = "fixtures"))]
    pub fn load_debug_answers(&mut self) -> Result<(), DiagnosisError> {
        self.intake_mut("load_debug_answers")?.load_debug_answers();
        Ok(())
    }
}

fn invalid_stage(operation: &'static str, stage: &SessionStage) -> DiagnosisError {
    DiagnosisError::InvalidStage {
        operation,
        stage: stage.name(),
    }
}
