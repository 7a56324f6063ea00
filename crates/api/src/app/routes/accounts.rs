use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use closingdesk_core::AccountId;
use closingdesk_infra::{AccountChanges, Engine, NewAccount};

use crate::app::{blocking, dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(open_account))
        .route("/:id", get(get_account).put(update_account))
        .route("/:id/reconciliation", get(reconcile_account))
}

pub async fn list_accounts(Extension(engine): Extension<Arc<Engine>>) -> axum::response::Response {
    match blocking::run_engine(engine, |engine| engine.list_accounts()).await {
        Ok(accounts) => {
            let items = accounts.iter().map(dto::account_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items, "total": items.len() })),
            )
                .into_response()
        }
        Err(resp) => resp,
    }
}

pub async fn open_account(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    body: Result<Json<NewAccount>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.open_account(actor.actor_id(), body)
    })
    .await;
    match result {
        Ok(account) => (StatusCode::CREATED, Json(dto::account_to_json(&account))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_account(
    Extension(engine): Extension<Arc<Engine>>,
    path: Result<Path<AccountId>, PathRejection>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match blocking::run_engine(engine, move |engine| engine.get_account(id)).await {
        Ok(account) => (StatusCode::OK, Json(dto::account_to_json(&account))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_account(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<AccountId>, PathRejection>,
    body: Result<Json<AccountChanges>, JsonRejection>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(changes) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.update_account(actor.actor_id(), id, changes)
    })
    .await;
    match result {
        Ok(account) => (StatusCode::OK, Json(dto::account_to_json(&account))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn reconcile_account(
    Extension(engine): Extension<Arc<Engine>>,
    path: Result<Path<AccountId>, PathRejection>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match blocking::run_engine(engine, move |engine| engine.reconcile_account(id)).await {
        Ok(report) => (StatusCode::OK, Json(dto::reconciliation_to_json(&report))).into_response(),
        Err(resp) => resp,
    }
}
