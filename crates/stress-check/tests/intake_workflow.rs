use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use stress_check::workflows::diagnosis::{
    AnswerOption, AnswerSet, Classification, DiagnosisError, IntakeController,
    OrganizationAggregate, Question, QuestionId, Questionnaire, Scorer, ScorerError,
    ScoringResult, ScoringVariant, Section,
};

fn two_per_section() -> Arc<Questionnaire> {
    let questions = Section::ordered()
        .into_iter()
        .flat_map(|section| {
            (1..=2).map(move |number| Question {
                id: QuestionId::new(section, number),
                section,
                number,
                text: format!("{} question {number}", section.label()),
                options: (1..=4)
                    .map(|score| AnswerOption {
                        label: format!("option {score}"),
                        score,
                    })
                    .collect(),
            })
        })
        .collect();
    Arc::new(Questionnaire::new(questions).expect("valid questionnaire"))
}

#[derive(Default)]
struct RecordingScorer {
    seen: Mutex<Vec<(usize, ScoringVariant)>>,
}

#[async_trait]
impl Scorer for RecordingScorer {
    async fn diagnose(
        &self,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<ScoringResult, ScorerError> {
        self.seen
            .lock()
            .expect("scorer lock")
            .push((answers.count(), variant));
        Ok(ScoringResult {
            result: Classification {
                high_stress: false,
                summary_scores: BTreeMap::from([("sum_a".to_string(), 20.0)]),
            },
            charts: Vec::new(),
            organization: None,
        })
    }

    async fn diagnose_organization(
        &self,
        _cohort: &[AnswerSet],
        _variant: ScoringVariant,
    ) -> Result<OrganizationAggregate, ScorerError> {
        Err(ScorerError::Transport("not used".to_string()))
    }
}

fn answer_current(intake: &mut IntakeController, score: i32) {
    let ids: Vec<QuestionId> = intake
        .current_questions()
        .iter()
        .map(|question| question.id.clone())
        .collect();
    for id in ids {
        intake.select_answer(id, score).expect("valid selection");
    }
}

#[tokio::test]
async fn walks_every_section_and_submits() {
    let mut intake = IntakeController::new(two_per_section());
    let scorer = RecordingScorer::default();

    for expected in [Section::B, Section::C, Section::D] {
        answer_current(&mut intake, 3);
        assert_eq!(intake.next().expect("section complete"), expected);
    }
    answer_current(&mut intake, 1);
    assert_eq!(intake.progress(), 100);

    let result = intake
        .submit(&scorer, ScoringVariant::Female)
        .await
        .expect("scored");
    assert!(!result.high_stress());
    assert_eq!(
        *scorer.seen.lock().expect("scorer lock"),
        vec![(8, ScoringVariant::Female)]
    );
}

#[test]
fn next_names_the_first_gap() {
    let mut intake = IntakeController::new(two_per_section());
    intake
        .select_answer(QuestionId::from("A2"), 4)
        .expect("valid selection");

    match intake.next() {
        Err(DiagnosisError::IncompleteSection {
            section,
            question_id,
        }) => {
            assert_eq!(section, Section::A);
            assert_eq!(question_id.as_str(), "A1");
        }
        other => panic!("expected incomplete section, got {other:?}"),
    }
    assert_eq!(intake.current_section(), Section::A);
}

#[test]
fn answers_survive_moving_back() {
    let mut intake = IntakeController::new(two_per_section());
    answer_current(&mut intake, 2);
    intake.next().expect("advance");
    intake
        .select_answer(QuestionId::from("B1"), 4)
        .expect("valid selection");

    assert_eq!(intake.previous(), Section::A);
    assert_eq!(intake.previous(), Section::A);
    assert_eq!(intake.answers().get(&QuestionId::from("B1")), Some(4));
    assert_eq!(intake.progress(), 38);
}

#[test]
fn out_of_range_scores_leave_answers_untouched() {
    let mut intake = IntakeController::new(two_per_section());
    for score in [0, 5, -1] {
        assert!(matches!(
            intake.select_answer(QuestionId::from("A1"), score),
            Err(DiagnosisError::InvalidScore { max: 4, .. })
        ));
    }
    assert!(matches!(
        intake.select_answer(QuestionId::from("Z9"), 1),
        Err(DiagnosisError::UnknownQuestion(_))
    ));
    assert!(intake.answers().is_empty());
}

#[tokio::test]
async fn submit_outside_the_final_section_is_refused() {
    let intake = IntakeController::new(two_per_section());
    let scorer = RecordingScorer::default();

    assert!(matches!(
        intake.submit(&scorer, ScoringVariant::Male).await,
        Err(DiagnosisError::InvalidStage { operation: "submit", .. })
    ));
    assert!(scorer.seen.lock().expect("scorer lock").is_empty());
}
