use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use closingdesk_core::UserId;

use crate::app::errors;
use crate::context::ActorContext;

pub const ACTOR_HEADER: &str = "x-actor-id";

pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let actor_id = match extract_actor(req.headers()) {
        Ok(id) => id,
        Err(message) => {
            return errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", message);
        }
    };

    req.extensions_mut().insert(ActorContext::new(actor_id));

    next.run(req).await
}

fn extract_actor(headers: &HeaderMap) -> Result<UserId, &'static str> {
    let header = headers
        .get(ACTOR_HEADER)
        .ok_or("missing x-actor-id header")?;

    let header = header
        .to_str()
        .map_err(|_| "x-actor-id header is not valid text")?;

    UserId::parse(header).map_err(|_| "x-actor-id header must not be blank")
}
