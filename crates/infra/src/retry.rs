use std::time::Duration;

use closingdesk_core::EngineResult;

use crate::config::EngineConfig;

/// Bounded retry of operations that fail with `Contention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.contention_retries,
            backoff: config.retry_backoff,
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `op`, re-running it while it returns a retryable error.
    ///
    /// Each attempt must be a complete unit of work (reload, decide, commit).
    pub fn run<T, F>(&self, operation: &'static str, mut op: F) -> EngineResult<T>
    where
        F: FnMut() -> EngineResult<T>,
    {
        let mut attempt = 0u32;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(operation, attempt, error = %err, "retrying after contention");
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff * attempt);
                    }
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use closingdesk_core::EngineError;

    #[test]
    fn retries_contention_until_success() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;

        let result = policy.run("test", || {
            calls += 1;
            if calls < 3 {
                Err(EngineError::contention("busy"))
            } else {
                Ok(calls)
            }
        });

        assert_eq!(result, Ok(3));
    }

    #[test]
    fn gives_up_after_max_retries() {
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Duration::ZERO,
        };
        let mut calls = 0;

        let result: EngineResult<()> = policy.run("test", || {
            calls += 1;
            Err(EngineError::contention("busy"))
        });

        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls, 3);
    }

    #[test]
    fn business_errors_are_not_retried() {
        let mut calls = 0;
        let result: EngineResult<()> = RetryPolicy::from_config(&EngineConfig::default()).run(
            "test",
            || {
                calls += 1;
                Err(EngineError::validation("amount", "must be positive"))
            },
        );

        assert_eq!(result.unwrap_err().kind(), "validation_error");
        assert_eq!(calls, 1);
    }
}
