use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::diagnosis::{DiagnosisError, ProbeError, QuestionSourceError, ScorerError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Questions(QuestionSourceError),
    Scorer(ScorerError),
    Probe(ProbeError),
    Decode(serde_json::Error),
    Diagnosis(DiagnosisError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Questions(err) => write!(f, "question source error: {}", err),
            AppError::Scorer(err) => write!(f, "scorer error: {}", err),
            AppError::Probe(err) => write!(f, "readiness error: {}", err),
            AppError::Decode(err) => write!(f, "decode error: {}", err),
            AppError::Diagnosis(err) => write!(f, "diagnosis error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Questions(err) => Some(err),
            AppError::Scorer(err) => Some(err),
            AppError::Probe(err) => Some(err),
            AppError::Decode(err) => Some(err),
            AppError::Diagnosis(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Diagnosis(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Questions(_) | AppError::Scorer(_) => StatusCode::BAD_GATEWAY,
            AppError::Probe(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<QuestionSourceError> for AppError {
    fn from(value: QuestionSourceError) -> Self {
        Self::Questions(value)
    }
}

impl From<ScorerError> for AppError {
    fn from(value: ScorerError) -> Self {
        Self::Scorer(value)
    }
}

impl From<ProbeError> for AppError {
    fn from(value: ProbeError) -> Self {
        Self::Probe(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<DiagnosisError> for AppError {
    fn from(value: DiagnosisError) -> Self {
        Self::Diagnosis(value)
    }
}
