use serde::{Deserialize, Serialize};
use std::fmt;

use super::export::ExportError;
use super::gateway::{DeliveryError, ScorerError};

/// Instrument sections in the order respondents walk through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    A,
    B,
    C,
    D,
}

impl Section {
    pub const fn ordered() -> [Self; 4] {
        [Self::A, Self::B, Self::C, Self::D]
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "Part A. Stress Causes",
            Self::B => "Part B. Stress Responses",
            Self::C => "Part C. Social Support",
            Self::D => "Part D. Satisfaction",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Section letter followed by the 1-based ordinal, e.g. `A17`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

impl QuestionId {
    pub fn new(section: Section, ordinal: u32) -> Self {
        Self(format!("{}{}", section.tag(), ordinal))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    /// Instrument weight of the option; the respondent's selection is the
    /// option's 1-based position, not this value.
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub section: Section,
    pub number: u32,
    pub text: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn max_selection(&self) -> usize {
        self.options.len()
    }

    pub fn accepts(&self, selection: i32) -> bool {
        selection >= 1 && (selection as usize) <= self.max_selection()
    }
}

/// Scale variant forwarded to the scorer; it selects which conversion
/// tables apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringVariant {
    #[default]
    Male,
    Female,
}

impl ScoringVariant {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error("question {0} is not part of the loaded questionnaire")]
    UnknownQuestion(QuestionId),
    #[error("score {score} is outside 1..={max} for question {question_id}")]
    InvalidScore {
        question_id: QuestionId,
        score: i32,
        max: usize,
    },
    #[error("section {section} is incomplete; question {question_id} is unanswered")]
    IncompleteSection {
        section: Section,
        question_id: QuestionId,
    },
    #[error("submission is incomplete: {answered} of {total} questions answered")]
    IncompleteSubmission {
        question_id: Option<QuestionId>,
        answered: usize,
        total: usize,
    },
    #[error("diagnosis failed: {0}")]
    DiagnosisFailed(#[source] ScorerError),
    #[error("export failed: {0}")]
    ExportFailed(#[source] ExportError),
    #[error("delivery failed: {0}")]
    DeliveryFailed(#[source] DeliveryError),
    #[error("{operation} is not available while the session is at {stage}")]
    InvalidStage {
        operation: &'static str,
        stage: &'static str,
    },
}

impl DiagnosisError {
    /// The question the caller should direct attention to, if any.
    pub fn question_id(&self) -> Option<&QuestionId> {
        match self {
            Self::UnknownQuestion(id) => Some(id),
            Self::InvalidScore { question_id, .. } => Some(question_id),
            Self::IncompleteSection { question_id, .. } => Some(question_id),
            Self::IncompleteSubmission { question_id, .. } => question_id.as_ref(),
            Self::DiagnosisFailed(_)
            | Self::ExportFailed(_)
            | Self::DeliveryFailed(_)
            | Self::InvalidStage { .. } => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownQuestion(_) => "unknown_question",
            Self::InvalidScore { .. } => "invalid_score",
            Self::IncompleteSection { .. } => "incomplete_section",
            Self::IncompleteSubmission { .. } => "incomplete_submission",
            Self::DiagnosisFailed(_) => "diagnosis_failed",
            Self::ExportFailed(_) => "export_failed",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::InvalidStage { .. } => "invalid_stage",
        }
    }
}
