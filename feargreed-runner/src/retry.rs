//! Task-level retry.
//!
//! A task is one named, fallible step (fetch a day of news, build the
//! catalog, create a table). Each attempt runs the whole step again; there
//! is no retry inside the providers themselves.

use crate::clock::Clock;
use feargreed_core::data::DataError;
use feargreed_core::RunContext;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many times a failed task is re-run, and how long to wait in between.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TaskPolicy {
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for TaskPolicy {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl TaskPolicy {
    pub const fn new(retries: u32, retry_delay_secs: u64) -> Self {
        Self {
            retries,
            retry_delay_secs,
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Total attempts, counting the first.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Run `task` until it succeeds or the policy's attempts are exhausted.
///
/// Returns the last error when every attempt fails.
pub fn run_task<T>(
    ctx: &RunContext,
    name: &str,
    policy: &TaskPolicy,
    clock: &dyn Clock,
    mut task: impl FnMut() -> Result<T, DataError>,
) -> Result<T, DataError> {
    let attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match task() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    parent: ctx.span(),
                    task = name,
                    attempt,
                    max_attempts = attempts,
                    retry_in_secs = policy.retry_delay_secs,
                    transport = e.is_transport(),
                    error = %e,
                    "task failed, retrying"
                );
                clock.sleep(policy.retry_delay());
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    parent: ctx.span(),
                    task = name,
                    attempts,
                    transport = e.is_transport(),
                    error = %e,
                    "task failed"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn succeeds_without_sleeping() {
        let clock = ManualClock::new();
        let out = run_task(&RunContext::detached(), "t", &TaskPolicy::new(3, 61), &clock, || {
            Ok::<_, DataError>(5)
        });
        assert_eq!(out.unwrap(), 5);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn retries_then_succeeds() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let out = run_task(&RunContext::detached(), "t", &TaskPolicy::new(3, 61), &clock, || {
            calls += 1;
            if calls < 3 {
                Err(DataError::Timeout("slow".into()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(61); 2]);
    }

    #[test]
    fn exhausted_attempts_return_last_error() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let out: Result<(), _> =
            run_task(&RunContext::detached(), "t", &TaskPolicy::new(1, 61), &clock, || {
                calls += 1;
                Err(DataError::Other(format!("attempt {calls}")))
            });
        assert_eq!(calls, 2);
        assert_eq!(out.unwrap_err().to_string(), "data error: attempt 2");
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[test]
    fn zero_retries_runs_once() {
        let clock = ManualClock::new();
        let mut calls = 0;
        let _ = run_task(&RunContext::detached(), "t", &TaskPolicy::default(), &clock, || {
            calls += 1;
            Err::<(), _>(DataError::Other("x".into()))
        });
        assert_eq!(calls, 1);
        assert!(clock.sleeps().is_empty());
    }
}
