use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{json, Value as JsonValue};

use closingdesk_core::EngineError;

/// HTTP status for an engine error kind.
pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
        EngineError::InvalidTransition { .. }
        | EngineError::ConditionNotSatisfied { .. }
        | EngineError::NotPermitted { .. } => StatusCode::CONFLICT,
        EngineError::IncompleteFunding { .. }
        | EngineError::InsufficientFunds { .. }
        | EngineError::AccountFrozen(_)
        | EngineError::AccountClosed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Contention(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvariantViolation(_) | EngineError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    error_body(status_for(&err), err.kind(), err.to_string(), err.details())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    error_body(status, code, message.into(), json!({}))
}

pub fn error_body(
    status: StatusCode,
    code: &str,
    message: String,
    details: JsonValue,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message,
            "details": details,
        })),
    )
        .into_response()
}

pub fn json_rejection(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}

pub fn path_rejection(rejection: PathRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text())
}
