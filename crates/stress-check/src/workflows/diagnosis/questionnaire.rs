use std::collections::HashSet;
use std::io::Read;

use super::domain::{Question, QuestionId, Section};
use super::gateway::QuestionSourceError;

/// The loaded instrument: every question in document order.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionSourceError> {
        if questions.is_empty() {
            return Err(QuestionSourceError::Invalid(
                "question list is empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(&question.id) {
                return Err(QuestionSourceError::Invalid(format!(
                    "duplicate question id {}",
                    question.id
                )));
            }
            if question.options.is_empty() {
                return Err(QuestionSourceError::Invalid(format!(
                    "question {} has no options",
                    question.id
                )));
            }
        }

        Ok(Self { questions })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, QuestionSourceError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    /// Questions of one section, keeping their relative document order.
    pub fn questions_for(&self, section: Section) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.section == section)
            .collect()
    }

    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| &question.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::diagnosis::domain::AnswerOption;

    fn question(section: Section, number: u32) -> Question {
        Question {
            id: QuestionId::new(section, number),
            section,
            number,
            text: format!("{section} item {number}"),
            options: vec![
                AnswerOption {
                    label: "yes".to_string(),
                    score: 1,
                },
                AnswerOption {
                    label: "no".to_string(),
                    score: 2,
                },
            ],
        }
    }

    #[test]
    fn questions_for_keeps_document_order() {
        let questionnaire = Questionnaire::new(vec![
            question(Section::A, 2),
            question(Section::B, 1),
            question(Section::A, 1),
        ])
        .expect("valid questionnaire");

        let ids: Vec<&str> = questionnaire
            .questions_for(Section::A)
            .iter()
            .map(|question| question.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A2", "A1"]);
        assert!(questionnaire.questions_for(Section::D).is_empty());
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let result = Questionnaire::new(vec![question(Section::A, 1), question(Section::A, 1)]);
        assert!(matches!(result, Err(QuestionSourceError::Invalid(message)) if message.contains("A1")));
    }

    #[test]
    fn parses_scorer_question_payload() {
        let payload = r#"[
            {"id": "A1", "section": "A", "number": 1, "text": "Too much work",
             "options": [{"label": "Very true", "score": 4}, {"label": "Not true", "score": 1}]}
        ]"#;
        let questionnaire = Questionnaire::from_reader(payload.as_bytes()).expect("parses");
        let first = questionnaire
            .question(&QuestionId::from("A1"))
            .expect("A1 present");
        assert_eq!(first.section, Section::A);
        assert_eq!(first.max_selection(), 2);
        assert_eq!(first.options[0].score, 4);
    }

    #[test]
    fn rejects_unknown_section_tag() {
        let payload = r#"[{"id": "E1", "section": "E", "number": 1, "text": "?", "options": [{"label": "x", "score": 1}]}]"#;
        assert!(matches!(
            Questionnaire::from_reader(payload.as_bytes()),
            Err(QuestionSourceError::Decode(_))
        ));
    }
}
