use tracing::debug;

use super::answers::AnswerSet;
use super::domain::{DiagnosisError, Question, QuestionId, Section};
use super::questionnaire::Questionnaire;

/// Walks the ordered sections one step at a time. Forward steps are gated on
/// the current section being fully answered; backward steps are not.
#[derive(Debug, Clone)]
pub struct SectionNavigator {
    sections: Vec<Section>,
    index: usize,
}

impl Default for SectionNavigator {
    fn default() -> Self {
        Self::standard()
    }
}

impl SectionNavigator {
    pub fn standard() -> Self {
        Self {
            sections: Section::ordered().to_vec(),
            index: 0,
        }
    }

    /// Returns `None` for an empty section list.
    pub fn from_sections(sections: impl IntoIterator<Item = Section>) -> Option<Self> {
        let sections: Vec<Section> = sections.into_iter().collect();
        if sections.is_empty() {
            None
        } else {
            Some(Self { sections, index: 0 })
        }
    }

    pub fn current(&self) -> Section {
        self.sections[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.sections.len()
    }

    pub fn questions_for<'q>(
        &self,
        questionnaire: &'q Questionnaire,
        section: Section,
    ) -> Vec<&'q Question> {
        questionnaire.questions_for(section)
    }

    pub fn first_unanswered<'q>(
        &self,
        questionnaire: &'q Questionnaire,
        section: Section,
        answers: &AnswerSet,
    ) -> Option<&'q QuestionId> {
        questionnaire
            .questions_for(section)
            .into_iter()
            .map(|question| &question.id)
            .find(|id| !answers.contains(id))
    }

    pub fn is_section_complete(
        &self,
        questionnaire: &Questionnaire,
        section: Section,
        answers: &AnswerSet,
    ) -> bool {
        self.first_unanswered(questionnaire, section, answers)
            .is_none()
    }

    /// Checks the active section without moving.
    pub fn ensure_current_complete(
        &self,
        questionnaire: &Questionnaire,
        answers: &AnswerSet,
    ) -> Result<(), DiagnosisError> {
        let section = self.current();
        match self.first_unanswered(questionnaire, section, answers) {
            Some(question_id) => Err(DiagnosisError::IncompleteSection {
                section,
                question_id: question_id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Moves to the next section. Staying put on the last section is not an
    /// error.
    pub fn advance(
        &mut self,
        questionnaire: &Questionnaire,
        answers: &AnswerSet,
    ) -> Result<Section, DiagnosisError> {
        self.ensure_current_complete(questionnaire, answers)?;
        if !self.is_last() {
            self.index += 1;
        }
        debug!(section = %self.current(), "advanced section");
        Ok(self.current())
    }

    pub fn retreat(&mut self) -> Section {
        self.index = self.index.saturating_sub(1);
        debug!(section = %self.current(), "retreated section");
        self.current()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
