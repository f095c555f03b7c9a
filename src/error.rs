use crate::constraints::ConstraintKind;
use crate::model::ValidationError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use itertools::Itertools;
use serde_json::json;
use thiserror::Error;

/// Every problem found while validating a request, in discovery order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid timetable configuration: {}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join_messages(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.message.as_str()).join("; ")
}

/// Errors that stop a generation request from producing any outcome.
///
/// Infeasibility and exhausted budgets are not errors; they are reported as
/// [`crate::data::TimetableResponse::Failed`].
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("internal consistency fault: solved timetable violates {violations:?}")]
    InternalFault { violations: Vec<ConstraintKind> },

    #[error("solver worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        match self {
            GenerateError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors.0 }))).into_response()
            }
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("server IO error: {0}")]
    Io(#[from] std::io::Error),
}
