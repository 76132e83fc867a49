use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stress_check::config::{AppConfig, ReadinessConfig};
use stress_check::error::AppError;
use stress_check::workflows::diagnosis::{
    wait_until_ready, DeliveryChannel, DiagnosisService, HttpScorerClient, QuestionFile,
    QuestionSource, Questionnaire, ReadinessProbe, Scorer,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) scorer_ready: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

impl AppState {
    pub(crate) fn is_ready(&self) -> bool {
        self.readiness.load(Ordering::Acquire) && self.scorer_ready.load(Ordering::Acquire)
    }
}

/// Questions come from `QUESTIONS_PATH` when set, otherwise from the scorer
/// once it answers its health check.
pub(crate) async fn load_questionnaire(
    config: &AppConfig,
    client: &HttpScorerClient,
    scorer_ready: &AtomicBool,
) -> Result<Questionnaire, AppError> {
    let questionnaire = match &config.scorer.questions_path {
        Some(path) => QuestionFile::new(path).load_questions().await?,
        None => {
            wait_until_ready(client, config.scorer.readiness).await?;
            scorer_ready.store(true, Ordering::Release);
            client.load_questions().await?
        }
    };
    info!(total = questionnaire.total(), "questionnaire loaded");
    Ok(questionnaire)
}

/// Polls the probe in the background and raises `flag` on the first success.
pub(crate) fn spawn_readiness_watch<P>(
    probe: Arc<P>,
    readiness: ReadinessConfig,
    flag: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    P: ReadinessProbe + 'static,
{
    tokio::spawn(async move {
        if flag.load(Ordering::Acquire) {
            return;
        }
        match wait_until_ready(probe.as_ref(), readiness).await {
            Ok(_) => flag.store(true, Ordering::Release),
            Err(err) => warn!(error = %err, "scorer never became ready; intake stays closed"),
        }
    })
}

/// Drops sessions idle for `idle_ttl`, checking every `period`.
pub(crate) fn spawn_session_sweeper<S, D>(
    service: Arc<DiagnosisService<S, D>>,
    idle_ttl: Duration,
    period: Duration,
) -> JoinHandle<()>
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            service.evict_idle(idle_ttl);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::routes::tests::{questionnaire, OfflineScorer};
    use stress_check::workflows::diagnosis::{ExportComposer, ProbeError};

    struct AlwaysReady;

    #[async_trait]
    impl ReadinessProbe for AlwaysReady {
        async fn check(&self) -> Result<(), ProbeError> {
            Ok(())
        }
    }

    struct NeverReady;

    #[async_trait]
    impl ReadinessProbe for NeverReady {
        async fn check(&self) -> Result<(), ProbeError> {
            Err(ProbeError::Unreachable("connection refused".to_string()))
        }
    }

    fn readiness() -> ReadinessConfig {
        ReadinessConfig {
            poll_interval: Duration::from_millis(1),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn watch_raises_flag_once_probe_succeeds() {
        let flag = Arc::new(AtomicBool::new(false));
        spawn_readiness_watch(Arc::new(AlwaysReady), readiness(), flag.clone())
            .await
            .expect("watch task joins");
        assert!(flag.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn watch_leaves_flag_down_when_attempts_run_out() {
        let flag = Arc::new(AtomicBool::new(false));
        spawn_readiness_watch(Arc::new(NeverReady), readiness(), flag.clone())
            .await
            .expect("watch task joins");
        assert!(!flag.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn sweeper_drops_idle_sessions() {
        let scorer = Arc::new(OfflineScorer);
        let service = Arc::new(DiagnosisService::new(
            Arc::new(questionnaire()),
            scorer.clone(),
            scorer,
            ExportComposer::standard(1.0),
        ));
        service.create_session();
        service.create_session();
        assert_eq!(service.sessions().len(), 2);

        let sweeper = spawn_session_sweeper(
            service.clone(),
            Duration::from_millis(5),
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        sweeper.abort();

        assert!(service.sessions().is_empty());
    }
}
