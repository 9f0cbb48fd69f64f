use std::future::Future;
use std::time::Duration;

/// Run `op` up to `attempts` times total, pausing `pause` between attempts.
///
/// The pause is an async sleep; nothing blocks while waiting. The final
/// attempt's error is returned unchanged.
pub(crate) async fn with_retries<T, E, F, Fut>(
    attempts: usize,
    pause: Duration,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    debug_assert!(attempts >= 1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                tracing::warn!("attempt {attempt}/{attempts} failed: {e}");
                attempt += 1;
                tokio::time::sleep(pause).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result = with_retries(3, Duration::from_millis(1), || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("transient failure {n}"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_configured_attempts() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<(), String> =
            with_retries(3, Duration::from_millis(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("store unavailable".to_string())
            })
            .await;

        assert_eq!(result, Err("store unavailable".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result: Result<&str, &str> =
            with_retries(3, Duration::from_millis(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("row")
            })
            .await;

        assert_eq!(result, Ok("row"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
