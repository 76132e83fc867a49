use crate::cli::ServeArgs;
use crate::infra::{load_questionnaire, spawn_readiness_watch, spawn_session_sweeper, AppState};
use crate::routes::with_diagnosis_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stress_check::config::AppConfig;
use stress_check::error::AppError;
use stress_check::telemetry;
use stress_check::workflows::diagnosis::{DiagnosisService, ExportComposer, HttpScorerClient};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let scorer_ready = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        scorer_ready: scorer_ready.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(HttpScorerClient::new(&config.scorer)?);
    let questionnaire = load_questionnaire(&config, &client, &scorer_ready).await?;
    spawn_readiness_watch(client.clone(), config.scorer.readiness, scorer_ready.clone());

    let diagnosis_service = Arc::new(
        DiagnosisService::new(
            Arc::new(questionnaire),
            client.clone(),
            client,
            ExportComposer::standard(config.export.scale),
        )
        .with_readiness(scorer_ready),
    );
    spawn_session_sweeper(
        diagnosis_service.clone(),
        config.sessions.idle_ttl,
        config.sessions.sweep_period(),
    );

    let app = with_diagnosis_routes(diagnosis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, scorer = %config.scorer.base_url, "stress check service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
