use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use closingdesk_core::{ConditionId, DealId};
use closingdesk_deals::ConditionChange;
use closingdesk_infra::{ConditionSpec, DealChanges, Engine, NewDeal};

use crate::app::{blocking, dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_deals).post(create_deal))
        .route("/:id", get(get_deal).put(amend_deal).delete(delete_deal))
        .route("/:id/status", patch(change_status))
        .route("/:id/conditions", post(add_condition))
        .route("/:id/conditions/:condition_id", patch(update_condition))
        .route("/:id/transactions", get(list_deal_transactions))
}

pub async fn list_deals(
    Extension(engine): Extension<Arc<Engine>>,
    query: Result<Query<dto::DealListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let filter = match dto::to_deal_filter(query) {
        Ok(f) => f,
        Err(resp) => return resp,
    };

    match blocking::run_engine(engine, move |engine| engine.list_deals(&filter)).await {
        Ok(deals) => {
            let items = deals.iter().map(dto::deal_to_json).collect::<Vec<_>>();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "items": items, "total": items.len() })),
            )
                .into_response()
        }
        Err(resp) => resp,
    }
}

pub async fn create_deal(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    body: Result<Json<NewDeal>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.create_deal(actor.actor_id(), body)
    })
    .await;
    match result {
        Ok(deal) => (StatusCode::CREATED, Json(dto::deal_to_json(&deal))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_deal(
    Extension(engine): Extension<Arc<Engine>>,
    path: Result<Path<DealId>, PathRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match blocking::run_engine(engine, move |engine| engine.get_deal(&deal_id)).await {
        Ok(deal) => (StatusCode::OK, Json(dto::deal_to_json(&deal))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn amend_deal(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<DealId>, PathRejection>,
    body: Result<Json<DealChanges>, JsonRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(changes) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.amend_deal(actor.actor_id(), &deal_id, changes)
    })
    .await;
    match result {
        Ok(deal) => (StatusCode::OK, Json(dto::deal_to_json(&deal))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn delete_deal(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<DealId>, PathRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.delete_deal(actor.actor_id(), &deal_id)
    })
    .await;
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(resp) => resp,
    }
}

pub async fn change_status(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<DealId>, PathRejection>,
    body: Result<Json<dto::ChangeStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.change_status(actor.actor_id(), &deal_id, body.status, body.note)
    })
    .await;
    match result {
        Ok(deal) => (StatusCode::OK, Json(dto::deal_to_json(&deal))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn add_condition(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<DealId>, PathRejection>,
    body: Result<Json<ConditionSpec>, JsonRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(spec) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let result = blocking::run_engine(engine, move |engine| {
        engine.add_condition(actor.actor_id(), &deal_id, spec)
    })
    .await;
    match result {
        Ok(condition) => {
            (StatusCode::CREATED, Json(dto::condition_to_json(&condition))).into_response()
        }
        Err(resp) => resp,
    }
}

/// Responds with the updated condition plus the deal status it left behind,
/// so callers can see a cascade without a second request.
pub async fn update_condition(
    Extension(engine): Extension<Arc<Engine>>,
    Extension(actor): Extension<ActorContext>,
    path: Result<Path<(DealId, ConditionId)>, PathRejection>,
    body: Result<Json<ConditionChange>, JsonRejection>,
) -> axum::response::Response {
    let Path((deal_id, condition_id)) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };
    let Json(change) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    let target = condition_id.clone();
    let result = blocking::run_engine(engine, move |engine| {
        engine.update_condition(actor.actor_id(), &deal_id, &target, change)
    })
    .await;
    let deal = match result {
        Ok(deal) => deal,
        Err(resp) => return resp,
    };

    match deal.conditions().get(&condition_id) {
        Some(condition) => {
            let mut body = dto::condition_to_json(condition);
            body["deal_status"] = serde_json::json!(deal.status());
            (StatusCode::OK, Json(body)).into_response()
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "condition not found"),
    }
}

pub async fn list_deal_transactions(
    Extension(engine): Extension<Arc<Engine>>,
    path: Result<Path<DealId>, PathRejection>,
) -> axum::response::Response {
    let Path(deal_id) = match path {
        Ok(p) => p,
        Err(rejection) => return errors::path_rejection(rejection),
    };

    match blocking::run_engine(engine, move |engine| engine.deal_transactions(&deal_id)).await {
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
