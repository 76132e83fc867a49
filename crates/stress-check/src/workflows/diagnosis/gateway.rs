use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::answers::AnswerSet;
use super::domain::ScoringVariant;
use super::questionnaire::Questionnaire;
use super::scoring::{OrganizationAggregate, ScoringResult};
use crate::config::{ReadinessConfig, ScorerConfig};

#[derive(Debug, thiserror::Error)]
pub enum QuestionSourceError {
    #[error("question source unavailable: {0}")]
    Unavailable(String),
    #[error("unable to read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to decode questions: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid questionnaire: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("scorer unreachable: {0}")]
    Transport(String),
    #[error("scorer rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("scorer response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery channel unreachable: {0}")]
    Transport(String),
    #[error("delivery rejected with status {0}")]
    Rejected(u16),
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("health check unreachable: {0}")]
    Unreachable(String),
    #[error("health check returned status {0}")]
    Unhealthy(u16),
    #[error("scorer not ready after {attempts} attempt(s)")]
    Exhausted { attempts: u32 },
}

/// Supplies the full ordered question list.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn load_questions(&self) -> Result<Questionnaire, QuestionSourceError>;
}

/// External scoring service. The algorithm itself lives on the other side.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn diagnose(
        &self,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<ScoringResult, ScorerError>;

    async fn diagnose_organization(
        &self,
        cohort: &[AnswerSet],
        variant: ScoringVariant,
    ) -> Result<OrganizationAggregate, ScorerError>;
}

/// Zero-argument health check used before letting respondents start.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;
}

/// Optional out-of-band delivery of a diagnosis (e.g. e-mail).
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(
        &self,
        address: &str,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<(), DeliveryError>;
}

/// Polls `probe` on a fixed interval until it succeeds or the attempt budget
/// runs out. Returns the attempt number that succeeded.
pub async fn wait_until_ready<P>(probe: &P, readiness: ReadinessConfig) -> Result<u32, ProbeError>
where
    P: ReadinessProbe + ?Sized,
{
    let attempts = readiness.max_attempts.max(1);
    for attempt in 1..=attempts {
        match probe.check().await {
            Ok(()) => {
                info!(attempt, "scorer ready");
                return Ok(attempt);
            }
            Err(err) => {
                warn!(attempt, max_attempts = attempts, error = %err, "scorer not ready");
                if attempt < attempts {
                    tokio::time::sleep(readiness.poll_interval).await;
                }
            }
        }
    }

    Err(ProbeError::Exhausted { attempts })
}

/// Reads questions from a local JSON file in the scorer's format.
#[derive(Debug, Clone)]
pub struct QuestionFile {
    path: PathBuf,
}

impl QuestionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionSource for QuestionFile {
    async fn load_questions(&self) -> Result<Questionnaire, QuestionSourceError> {
        let file = std::fs::File::open(&self.path)?;
        let questionnaire = Questionnaire::from_reader(std::io::BufReader::new(file))?;
        debug!(path = %self.path.display(), total = questionnaire.total(), "loaded question file");
        Ok(questionnaire)
    }
}

#[derive(Serialize)]
struct DiagnosisRequest<'a> {
    answers: &'a AnswerSet,
    gender: ScoringVariant,
}

#[derive(Serialize)]
struct OrganizationRequest<'a> {
    answers_list: &'a [AnswerSet],
    gender: ScoringVariant,
}

#[derive(Serialize)]
struct DeliveryRequest<'a> {
    email: &'a str,
    answers: &'a AnswerSet,
    gender: ScoringVariant,
}

/// HTTP client for the scorer service; also serves questions, the health
/// probe, and e-mail delivery from the same origin.
#[derive(Debug, Clone)]
pub struct HttpScorerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScorerClient {
    pub fn new(config: &ScorerConfig) -> Result<Self, ScorerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ScorerError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ScorerError>
    where
        B: Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| ScorerError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScorerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ScorerError::Decode(err.to_string()))
    }
}

#[async_trait]
impl Scorer for HttpScorerClient {
    async fn diagnose(
        &self,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<ScoringResult, ScorerError> {
        self.post_json(
            "/api/diagnosis",
            &DiagnosisRequest {
                answers,
                gender: variant,
            },
        )
        .await
    }

    async fn diagnose_organization(
        &self,
        cohort: &[AnswerSet],
        variant: ScoringVariant,
    ) -> Result<OrganizationAggregate, ScorerError> {
        self.post_json(
            "/api/diagnosis/organization",
            &OrganizationRequest {
                answers_list: cohort,
                gender: variant,
            },
        )
        .await
    }
}

#[async_trait]
impl QuestionSource for HttpScorerClient {
    async fn load_questions(&self) -> Result<Questionnaire, QuestionSourceError> {
        let response = self
            .client
            .get(self.url("/api/questions"))
            .send()
            .await
            .map_err(|err| QuestionSourceError::Unavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuestionSourceError::Unavailable(format!(
                "status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| QuestionSourceError::Unavailable(err.to_string()))?;
        Questionnaire::from_reader(bytes.as_ref())
    }
}

#[async_trait]
impl ReadinessProbe for HttpScorerClient {
    async fn check(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(self.url("/health-check"))
            .send()
            .await
            .map_err(|err| ProbeError::Unreachable(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProbeError::Unhealthy(response.status().as_u16()))
        }
    }
}

#[async_trait]
impl DeliveryChannel for HttpScorerClient {
    async fn deliver(
        &self,
        address: &str,
        answers: &AnswerSet,
        variant: ScoringVariant,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url("/api/diagnosis/email"))
            .json(&DeliveryRequest {
                email: address,
                answers,
                gender: variant,
            })
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(response.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyProbe {
        calls: AtomicU32,
        healthy_after: u32,
    }

    #[async_trait]
    impl ReadinessProbe for FlakyProbe {
        async fn check(&self) -> Result<(), ProbeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.healthy_after {
                Ok(())
            } else {
                Err(ProbeError::Unhealthy(503))
            }
        }
    }

    fn readiness(max_attempts: u32) -> ReadinessConfig {
        ReadinessConfig {
            poll_interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn wait_until_ready_masks_cold_start() {
        let probe = FlakyProbe {
            calls: AtomicU32::new(0),
            healthy_after: 3,
        };
        let attempt = wait_until_ready(&probe, readiness(5))
            .await
            .expect("ready on third attempt");
        assert_eq!(attempt, 3);
    }

    #[tokio::test]
    async fn wait_until_ready_is_bounded() {
        let probe = FlakyProbe {
            calls: AtomicU32::new(0),
            healthy_after: u32::MAX,
        };
        match wait_until_ready(&probe, readiness(4)).await {
            Err(ProbeError::Exhausted { attempts }) => assert_eq!(attempts, 4),
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn diagnosis_request_uses_scorer_field_names() {
        let answers: AnswerSet = [(crate::workflows::diagnosis::domain::QuestionId::from("A1"), 2)]
            .into_iter()
            .collect();
        let body = serde_json::to_value(DiagnosisRequest {
            answers: &answers,
            gender: ScoringVariant::Female,
        })
        .expect("serializes");
        assert_eq!(
            body,
            serde_json::json!({ "answers": { "A1": 2 }, "gender": "female" })
        );
    }
}
