use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use closingdesk_infra::Engine;

use crate::app::{blocking, dto, errors};

/// Mounted under `/transactions`.
pub fn router() -> Router {
    Router::new().route("/audit-logs/list", get(list_audit_logs))
}

pub async fn list_audit_logs(
    Extension(engine): Extension<Arc<Engine>>,
    query: Result<Query<dto::AuditListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let query = match dto::to_audit_query(query) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    match blocking::run_engine(engine, move |engine| engine.query_audit(&query)).await {
        Ok(page) => (StatusCode::OK, Json(dto::audit_page_to_json(&page))).into_response(),
        Err(resp) => resp,
    }
}
