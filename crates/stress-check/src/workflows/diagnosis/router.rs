use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::answers::AnswerSet;
use super::domain::{DiagnosisError, QuestionId, ScoringVariant};
use super::export::{ExportError, RegionKind};
use super::gateway::{DeliveryChannel, Scorer};
use super::service::{DiagnosisService, ServiceError, SessionId};

#[derive(Debug, Deserialize)]
pub(crate) struct StartRequest {
    #[serde(default)]
    pub(crate) variant: ScoringVariant,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    pub(crate) question_id: QuestionId,
    pub(crate) score: i32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub(crate) cohort: Vec<AnswerSet>,
}

const LIVE_VIEWPORT_WIDTH_PX: u32 = 1280;
const LIVE_VIEWPORT_HEIGHT_PX: u32 = 720;

#[derive(Debug, Deserialize)]
pub(crate) struct ViewportQuery {
    #[serde(default = "default_viewport_width")]
    pub(crate) width: u32,
    #[serde(default = "default_viewport_height")]
    pub(crate) height: u32,
}

fn default_viewport_width() -> u32 {
    LIVE_VIEWPORT_WIDTH_PX
}

fn default_viewport_height() -> u32 {
    LIVE_VIEWPORT_HEIGHT_PX
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeliverRequest {
    pub(crate) address: String,
}

/// Questionnaire and session endpoints under `/api/v1`.
pub fn diagnosis_router<S, D>(service: Arc<DiagnosisService<S, D>>) -> Router
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    Router::new()
        .route("/api/v1/questions", get(questions_handler::<S, D>))
        .route("/api/v1/sessions", post(create_handler::<S, D>))
        .route(
            "/api/v1/sessions/:session_id",
            get(view_handler::<S, D>).delete(close_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/start",
            post(start_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/answers",
            put(answer_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/next",
            post(next_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/previous",
            post(previous_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/submit",
            post(submit_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/restart",
            post(restart_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/export",
            post(export_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/regions/:region",
            get(region_handler::<S, D>),
        )
        .route(
            "/api/v1/sessions/:session_id/deliver",
            post(deliver_handler::<S, D>),
        )
        .with_state(service)
}

pub(crate) fn error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::SessionNotFound(_) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
        }
        ServiceError::SessionBusy(_) => {
            (StatusCode::CONFLICT, Json(json!({ "error": err.to_string() }))).into_response()
        }
        ServiceError::ScorerNotReady => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string(), "status": "initializing" })),
        )
            .into_response(),
        ServiceError::Diagnosis(err) => diagnosis_error_response(err),
    }
}

fn diagnosis_error_response(err: DiagnosisError) -> Response {
    let status = match &err {
        DiagnosisError::UnknownQuestion(_)
        | DiagnosisError::InvalidScore { .. }
        | DiagnosisError::IncompleteSection { .. }
        | DiagnosisError::IncompleteSubmission { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DiagnosisError::ExportFailed(ExportError::MissingRegion(_)) => StatusCode::NOT_FOUND,
        DiagnosisError::DiagnosisFailed(_)
        | DiagnosisError::ExportFailed(_)
        | DiagnosisError::DeliveryFailed(_) => StatusCode::BAD_GATEWAY,
        DiagnosisError::InvalidStage { .. } => StatusCode::CONFLICT,
    };
    let payload = json!({
        "error": err.to_string(),
        "kind": err.kind(),
        "question_id": err.question_id(),
    });
    (status, Json(payload)).into_response()
}

/// A body that is present but unreadable never falls back to "no cohort".
fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
        "kind": "invalid_request",
    });
    (rejection.status(), Json(payload)).into_response()
}

fn view_response<T: serde::Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn questions_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    (StatusCode::OK, Json(service.questionnaire().questions())).into_response()
}

pub(crate) async fn create_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    let (id, view) = service.create_session();
    let payload = json!({ "session_id": id, "session": view });
    (StatusCode::CREATED, Json(payload)).into_response()
}

pub(crate) async fn view_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.view(SessionId(session_id)))
}

pub(crate) async fn close_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    match service.close_session(SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn start_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<StartRequest>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.start(SessionId(session_id), request.variant))
}

pub(crate) async fn answer_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.select_answer(
        SessionId(session_id),
        request.question_id,
        request.score,
    ))
}

pub(crate) async fn next_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.next(SessionId(session_id)))
}

pub(crate) async fn previous_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.previous(SessionId(session_id)))
}

pub(crate) async fn submit_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
    body: Bytes,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitRequest::default()
    } else {
        match Json::<SubmitRequest>::from_bytes(&body) {
            Ok(Json(request)) => request,
            Err(rejection) => return rejection_response(rejection),
        }
    };
    view_response(
        service
            .submit(SessionId(session_id), &request.cohort)
            .await,
    )
}

pub(crate) async fn restart_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    view_response(service.restart(SessionId(session_id)))
}

pub(crate) async fn export_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    let now = Local::now().naive_local();
    match service.export(SessionId(session_id), now) {
        Ok(artifact) => {
            let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
            let mut response = (StatusCode::OK, artifact.bytes).into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(artifact.content_type),
            );
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn region_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path((session_id, region)): Path<(Uuid, RegionKind)>,
    Query(viewport): Query<ViewportQuery>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    match service.render_region(
        SessionId(session_id),
        region,
        viewport.width,
        viewport.height,
    ) {
        Ok(page) => {
            let mut response = (StatusCode::OK, page.bytes).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(page.content_type),
            );
            response
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn deliver_handler<S, D>(
    State(service): State<Arc<DiagnosisService<S, D>>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<DeliverRequest>,
) -> Response
where
    S: Scorer + 'static,
    D: DeliveryChannel + 'static,
{
    match service
        .deliver(SessionId(session_id), &request.address)
        .await
    {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "delivered": true }))).into_response(),
        Err(err) => error_response(err),
    }
}
