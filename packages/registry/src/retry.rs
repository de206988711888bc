//! Retry loop driven by a [`RetryStrategy`].

use std::future::Future;

use sync_core::{RegistryError, RetryStrategy};

/// Run `operation` until it succeeds or fails permanently.
///
/// Only `RegistryError::Transport` is retried; `BadRequest` and
/// `DeviceNotFound` are returned immediately.
pub async fn with_retry<T, F, Fut>(
    strategy: &RetryStrategy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Err(RegistryError::Transport(message)) => match strategy.next_delay(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        "{} failed (attempt {}): {}; retrying in {:?}",
                        operation_name,
                        attempt + 1,
                        message,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                None => return Err(RegistryError::Transport(message)),
            },
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use sync_core::Backoff;

    use super::*;

    fn fast() -> RetryStrategy {
        RetryStrategy::WithInfiniteExpBackOff(Backoff::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
    }

    #[tokio::test]
    async fn retries_transport_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(RegistryError::Transport("boom".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RegistryError::DeviceNotFound("gone".into())) }
        })
        .await;

        assert_eq!(result, Err(RegistryError::DeviceNotFound("gone".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn just_dont_surfaces_first_transport_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&RetryStrategy::JustDont, "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RegistryError::Transport("down".into())) }
        })
        .await;

        assert_eq!(result, Err(RegistryError::Transport("down".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
