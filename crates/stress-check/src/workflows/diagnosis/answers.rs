use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::QuestionId;

/// Selected scores keyed by question. A key is present only once the
/// respondent has picked an option; unanswered questions are absent.
///
/// The store performs no validation. Callers that need range or membership
/// checks do them before calling [`AnswerSet::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: BTreeMap<QuestionId, i32>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question_id: QuestionId, score: i32) {
        self.entries.insert(question_id, score);
    }

    pub fn get(&self, question_id: &QuestionId) -> Option<i32> {
        self.entries.get(question_id).copied()
    }

    pub fn contains(&self, question_id: &QuestionId) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset_all(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, i32)> {
        self.entries.iter().map(|(id, score)| (id, *score))
    }
}

impl FromIterator<(QuestionId, i32)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (QuestionId, i32)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
