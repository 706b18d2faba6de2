//! Bounded retry with a fixed pause between attempts.

use std::future::Future;
use std::time::{Duration, Instant};

use pelagicontain_test_core::DiscoverySettings;

/// How often to try an operation and how long to pause after each try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts
    pub max_attempts: u32,

    /// Pause after every attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&DiscoverySettings> for RetryPolicy {
    fn from(settings: &DiscoverySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            delay: settings.delay(),
        }
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Value of the first successful attempt
    pub value: Option<T>,

    /// Error of the last failed attempt
    pub last_error: Option<E>,

    /// Attempts made
    pub attempts: u32,

    /// Time spent, pauses included
    pub elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Whether an attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

impl RetryPolicy {
    /// Create a new policy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `attempt` until it succeeds or the attempts are used up.
    ///
    /// The pause follows every attempt, the successful one included, so a run
    /// that succeeds on attempt `n` takes at least `n * delay`. `attempt`
    /// receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut attempt: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut last_error = None;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            let result = attempt(attempts).await;
            tokio::time::sleep(self.delay).await;

            match result {
                Ok(value) => {
                    return RetryOutcome {
                        value: Some(value),
                        last_error: None,
                        attempts,
                        elapsed: start.elapsed(),
                    };
                }
                Err(e) => last_error = Some(e),
            }
        }

        RetryOutcome {
            value: None,
            last_error,
            attempts,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_from_settings() {
        let settings = DiscoverySettings {
            max_attempts: 4,
            delay_ms: 20,
        };
        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy, RetryPolicy::new(4, Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn test_stops_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        let outcome: RetryOutcome<(), &str> = policy
            .run(|_| {
                calls.set(calls.get() + 1);
                async { Err("not yet") }
            })
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(outcome.last_error, Some("not yet"));
        assert!(outcome.elapsed >= Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_stops_on_first_success() {
        let policy = RetryPolicy::new(5, Duration::from_millis(5));
        let outcome: RetryOutcome<u32, &str> = policy
            .run(|attempt| async move {
                if attempt == 2 {
                    Ok(attempt)
                } else {
                    Err("not yet")
                }
            })
            .await;

        assert_eq!(outcome.value, Some(2));
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.last_error.is_none());
    }

    #[tokio::test]
    async fn test_pauses_after_successful_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(50));
        let outcome: RetryOutcome<(), ()> = policy.run(|_| async { Ok(()) }).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.elapsed >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_zero_attempts() {
        let policy = RetryPolicy::new(0, Duration::from_millis(50));
        let outcome: RetryOutcome<(), ()> = policy.run(|_| async { Ok(()) }).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts, 0);
        assert!(outcome.last_error.is_none());
    }
}
