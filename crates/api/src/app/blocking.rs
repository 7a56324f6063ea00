//! Bridge from async handlers to the synchronous engine.
//!
//! Engine calls wait on entity locks, sleep between contention retries and
//! sync the journal, so they run on Tokio's blocking pool instead of a
//! runtime worker.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Response;

use closingdesk_core::EngineResult;
use closingdesk_infra::Engine;

use crate::app::errors;

/// Run `op` against the engine on the blocking pool.
///
/// Engine errors come back already mapped to the shared error body.
pub async fn run_engine<T, F>(engine: Arc<Engine>, op: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> EngineResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || op(&engine)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(errors::engine_error_to_response(err)),
        Err(join) => {
            tracing::error!(error = %join, "engine task did not finish");
            Err(errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "engine task did not finish",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    use closingdesk_core::AccountId;
    use closingdesk_infra::EngineConfig;

    fn engine() -> Arc<Engine> {
        Arc::new(Engine::from_config(&EngineConfig::default()).unwrap())
    }

    // The default test runtime has a single thread: a slow engine call run
    // inline would hold up the timer below until it returned.
    #[tokio::test]
    async fn slow_engine_call_leaves_the_runtime_responsive() {
        let slow = tokio::spawn(run_engine(engine(), |engine| {
            thread::sleep(Duration::from_millis(300));
            engine.list_accounts()
        }));

        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(started.elapsed() < Duration::from_millis(150));

        match slow.await.unwrap() {
            Ok(accounts) => assert!(accounts.is_empty()),
            Err(resp) => panic!("unexpected status {}", resp.status()),
        }
    }

    #[tokio::test]
    async fn engine_errors_map_to_error_responses() {
        match run_engine(engine(), |engine| engine.get_account(AccountId::new(99))).await {
            Ok(account) => panic!("unexpected account {account:?}"),
            Err(resp) => assert_eq!(resp.status(), StatusCode::NOT_FOUND),
        }
    }

    #[tokio::test]
    async fn panicking_engine_call_is_an_internal_error() {
        let result: Result<(), Response> =
            run_engine(engine(), |_| panic!("engine blew up")).await;
        match result {
            Ok(()) => panic!("expected an error response"),
            Err(resp) => assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
