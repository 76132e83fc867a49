use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::answers::AnswerSet;
use super::domain::{DiagnosisError, Question, QuestionId, ScoringVariant, Section};
use super::gateway::Scorer;
use super::navigator::SectionNavigator;
use super::questionnaire::Questionnaire;
use super::scoring::ScoringResult;

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub value: i32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub number: u32,
    pub text: String,
    pub options: Vec<OptionView>,
    pub selected: Option<i32>,
}

impl QuestionView {
    fn from_question(question: &Question, answers: &AnswerSet) -> Self {
        Self {
            id: question.id.clone(),
            number: question.number,
            text: question.text.clone(),
            options: question
                .options
                .iter()
                .enumerate()
                .map(|(idx, option)| OptionView {
                    value: idx as i32 + 1,
                    label: option.label.clone(),
                })
                .collect(),
            selected: answers.get(&question.id),
        }
    }
}

/// What a respondent currently sees: the active section, its questions, and
/// overall progress.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSnapshot {
    pub section: Section,
    pub section_label: &'static str,
    pub section_index: usize,
    pub section_count: usize,
    pub is_final_section: bool,
    pub progress: u8,
    pub answered: usize,
    pub total: usize,
    pub questions: Vec<QuestionView>,
}

/// Owns the in-progress answers and section position for one respondent.
#[derive(Debug, Clone)]
pub struct IntakeController {
    questionnaire: Arc<Questionnaire>,
    answers: AnswerSet,
    navigator: SectionNavigator,
}

impl IntakeController {
    pub fn new(questionnaire: Arc<Questionnaire>) -> Self {
        Self {
            questionnaire,
            answers: AnswerSet::new(),
            navigator: SectionNavigator::standard(),
        }
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn current_section(&self) -> Section {
        self.navigator.current()
    }

    pub fn section_index(&self) -> usize {
        self.navigator.index()
    }

    pub fn current_questions(&self) -> Vec<&Question> {
        self.navigator
            .questions_for(&self.questionnaire, self.navigator.current())
    }

    /// Records a selection anywhere in the questionnaire. The identifier must
    /// belong to the loaded questions and the score must address one of its
    /// options.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        score: i32,
    ) -> Result<(), DiagnosisError> {
        let question = self
            .questionnaire
            .question(&question_id)
            .ok_or_else(|| DiagnosisError::UnknownQuestion(question_id.clone()))?;

        if !question.accepts(score) {
            return Err(DiagnosisError::InvalidScore {
                max: question.max_selection(),
                question_id,
                score,
            });
        }

        self.answers.set(question_id, score);
        Ok(())
    }

    pub fn next(&mut self) -> Result<Section, DiagnosisError> {
        let from = self.navigator.current();
        match self.navigator.advance(&self.questionnaire, &self.answers) {
            Ok(section) => {
                info!(from = %from, to = %section, progress = self.progress(), "section advanced");
                Ok(section)
            }
            Err(err) => {
                warn!(section = %from, question_id = ?err.question_id(), "section incomplete");
                Err(err)
            }
        }
    }

    pub fn previous(&mut self) -> Section {
        self.navigator.retreat()
    }

    /// Percentage of answered questions, rounded. Purely observational.
    pub fn progress(&self) -> u8 {
        let total = self.questionnaire.total();
        if total == 0 {
            return 0;
        }
        let pct = (self.answers.count() as f64 * 100.0 / total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Both submission guards: the final section is complete, and every
    /// question in the questionnaire has an answer.
    pub fn ensure_submittable(&self) -> Result<(), DiagnosisError> {
        if !self.navigator.is_last() {
            return Err(DiagnosisError::InvalidStage {
                operation: "submit",
                stage: "a non-final section",
            });
        }

        self.navigator
            .ensure_current_complete(&self.questionnaire, &self.answers)
            .map_err(|err| DiagnosisError::IncompleteSubmission {
                question_id: err.question_id().cloned(),
                answered: self.answers.count(),
                total: self.questionnaire.total(),
            })?;

        let total = self.questionnaire.total();
        if self.answers.count() != total {
            let question_id = self
                .questionnaire
                .questions()
                .iter()
                .map(|question| &question.id)
                .find(|id| !self.answers.contains(id))
                .cloned();
            return Err(DiagnosisError::IncompleteSubmission {
                question_id,
                answered: self.answers.count(),
                total,
            });
        }

        Ok(())
    }

    /// Hands the complete answer set to the scorer. Neither answers nor
    /// section position change, whatever the outcome.
    pub async fn submit<S>(
        &self,
        scorer: &S,
        variant: ScoringVariant,
    ) -> Result<ScoringResult, DiagnosisError>
    where
        S: Scorer + ?Sized,
    {
        if let Err(err) = self.ensure_submittable() {
            warn!(question_id = ?err.question_id(), "submission blocked");
            return Err(err);
        }

        info!(answered = self.answers.count(), variant = variant.label(), "submitting answers");
        scorer
            .diagnose(&self.answers, variant)
            .await
            .map_err(|err| {
                warn!(error = %err, "scorer call failed");
                DiagnosisError::DiagnosisFailed(err)
            })
    }

    pub fn restart(&mut self) {
        self.answers.reset_all();
        self.navigator.reset();
    }

    pub fn snapshot(&self) -> IntakeSnapshot {
        let questions = self
            .current_questions()
            .into_iter()
            .map(|question| QuestionView::from_question(question, &self.answers))
            .collect();
        let section = self.navigator.current();

        IntakeSnapshot {
            section,
            section_label: section.label(),
            section_index: self.navigator.index(),
            section_count: self.navigator.sections().len(),
            is_final_section: self.navigator.is_last(),
            progress: self.progress(),
            answered: self.answers.count(),
            total: self.questionnaire.total(),
            questions,
        }
    }

    #[cfg(any(test, feature = "fixtures"))]
    pub(crate) fn replace_answers(&mut self, answers: AnswerSet) {
        self.answers = answers;
    }
}
