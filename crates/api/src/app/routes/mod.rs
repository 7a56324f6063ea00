use axum::Router;

pub mod accounts;
pub mod audit;
pub mod deals;
pub mod system;
pub mod transactions;

/// Router for all endpoints that require an acting user.
pub fn router() -> Router {
    Router::new()
        .nest("/deals", deals::router())
        .nest("/transactions", transactions::router().merge(audit::router()))
        .nest("/accounts", accounts::router())
}
