use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use closingdesk_core::TransactionId;
use closingdesk_infra::{CompletionOutcome, Engine, NewTransaction};

use crate::app::{blocking, dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/:id", get(get_transaction))
        .route("/:id/complete", post(complete_transaction))
        .route("/:id/reverse", post(reverse_transaction))
}

pub async fn list_transactions(
    Extension(engine): Extension<Arc<Engine>>,
    query: Result<Query<dto::TransactionListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let filter = match dto::to_transaction_filter(query) {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match blocking::run_engine(engine, move |engine| engine.list_transactions(&filter)).await {
        Ok(transactions) => {
            let items = transactions
                .iter()
                .map(dto::transaction_to_json)
                .collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items, "total": items.len() })),
            )
                .into_response()
        }
        Err(resp) => resp,
    }
}

pub async fn create_transaction(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    body: Result<Json<NewTransaction>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.create_transaction(actor.actor_id(), body)
    })
    .await;
    match result {
        Ok(tx) => (StatusCode::CREATED, Json(dto::transaction_to_json(&tx))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_transaction(
    Extension(engine): Extension<Arc<Engine>>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match blocking::run_engine(engine, move |engine| engine.get_transaction(id)).await {
        Ok(tx) => (StatusCode::OK, Json(dto::transaction_to_json(&tx))).into_response(),
        Err(resp) => resp,
    }
}

/// A completion the ledger refuses is not an HTTP failure of the call itself:
/// the transaction is now `failed`, and the response carries both the reason
/// and the transaction.
pub async fn complete_transaction(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<TransactionId>, PathRejection>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.complete_transaction(actor.actor_id(), id)
    })
    .await;
    match result {
        Ok(CompletionOutcome::Completed(tx)) | Ok(CompletionOutcome::AlreadyCompleted(tx)) => {
            (StatusCode::OK, Json(dto::transaction_to_json(&tx))).into_response()
        }
        Ok(CompletionOutcome::Failed {
            transaction,
            reason,
        }) => {
            let mut details = reason.details();
            details["transaction"] = dto::transaction_to_json(&transaction);
            errors::error_body(
                errors::status_for(&reason),
                reason.kind(),
                reason.to_string(),
                details,
            )
        }
        Err(resp) => resp,
    }
}

pub async fn reverse_transaction(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<TransactionId>, PathRejection>,
    body: Option<Json<dto::ReverseTransactionRequest>>,
) -> axum::response::Response {
    let Path(id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let note = body.and_then(|Json(b)| b.note);

    let result = blocking::run_engine(engine, move |engine| {
        engine.reverse_transaction(actor.actor_id(), id, note)
    })
    .await;
    match result {
        Ok(tx) => (StatusCode::OK, Json(dto::transaction_to_json(&tx))).into_response(),
        Err(resp) => resp,
    }
}
