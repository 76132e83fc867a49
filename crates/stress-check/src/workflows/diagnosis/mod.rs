//! Occupational stress diagnosis: questionnaire intake gated section by
//! section, scoring through an external service, and presentation plus
//! export of the held result.

pub mod answers;
pub mod domain;
pub mod export;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod gateway;
pub mod intake;
pub mod navigator;
pub mod questionnaire;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use answers::AnswerSet;
pub use domain::{
    AnswerOption, DiagnosisError, Question, QuestionId, ScoringVariant, Section,
};
pub use export::{ExportArtifact, ExportComposer, ExportError, RegionKind};
pub use gateway::{
    wait_until_ready, DeliveryChannel, DeliveryError, HttpScorerClient, ProbeError, QuestionFile,
    QuestionSource, QuestionSourceError, ReadinessProbe, Scorer, ScorerError,
};
pub use intake::{IntakeController, IntakeSnapshot};
pub use navigator::SectionNavigator;
pub use questionnaire::Questionnaire;
pub use report::{compose_report, ReportView};
pub use router::diagnosis_router;
pub use scoring::{
    AxisScore, ChartDescriptor, Classification, HealthRisk, OrganizationAggregate,
    OrganizationAverages, ScoringResult,
};
pub use service::{DiagnosisService, ServiceError, SessionId, SessionRegistry};
pub use session::{DiagnosisSession, ResultState, SessionStage, SessionView};
