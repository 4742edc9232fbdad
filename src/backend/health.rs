//! Backend Readiness
//!
//! Probes the backend's root URL until it answers, under a bounded retry
//! policy with exponential backoff. The poll loop observes a cancellation
//! flag so shutdown does not have to wait for the backend to appear.

use std::future::Future;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ShellError;

/// Per-probe HTTP timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bounds for the readiness poll loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            deadline: Duration::from_secs(30),
        }
    }
}

/// Delay to sleep after the given (1-based) failed attempt.
///
/// Doubles from the initial delay, capped at the policy maximum.
pub fn next_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let delay = policy.initial_delay.saturating_mul(1u32 << exp);
    delay.min(policy.max_delay)
}

/// Single readiness probe: any 2xx response means ready, body discarded.
///
/// Connection refused, request timeout, and non-2xx are all just
/// "not ready yet".
pub async fn probe_once(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Drive `probe` until it reports ready, an attempt/deadline bound is hit,
/// or `cancelled` is set. Returns the number of probes issued on success.
pub async fn wait_until_ready<F, Fut>(
    mut probe: F,
    policy: &RetryPolicy,
    cancelled: &AtomicBool,
) -> Result<u32, ShellError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        if cancelled.load(Ordering::SeqCst) {
            return Err(ShellError::StartupCancelled);
        }

        attempts += 1;
        if probe().await {
            return Ok(attempts);
        }

        if start.elapsed() >= policy.deadline {
            break;
        }
        tokio::time::sleep(next_delay(policy, attempts)).await;
    }

    Err(ShellError::StartupTimeout { attempts })
}

/// Wait for the backend's root URL to answer a GET.
pub async fn wait_for_ready(
    base_url: &str,
    policy: &RetryPolicy,
    cancelled: &AtomicBool,
) -> Result<(), ShellError> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| ShellError::Http(e.to_string()))?;
    let url = base_url.to_string();

    let attempts = wait_until_ready(
        || {
            let client = client.clone();
            let url = url.clone();
            async move { probe_once(&client, &url).await }
        },
        policy,
        cancelled,
    )
    .await?;

    log::info!("[backend] ready after {} probe(s)", attempts);
    Ok(())
}

/// Check if the backend port is free on loopback.
pub fn is_port_free(port: u16) -> bool {
    TcpListener::bind((super::config::BACKEND_HOST, port)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            deadline: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn ready_after_n_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancelled = AtomicBool::new(false);
        let counter = calls.clone();

        let attempts = wait_until_ready(
            move || {
                let counter = counter.clone();
                async move { counter.fetch_add(1, Ordering::SeqCst) + 1 >= 4 }
            },
            &fast_policy(10),
            &cancelled,
        )
        .await
        .unwrap();

        // three failures, then success on the fourth probe
        assert_eq!(attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn immediate_success_takes_one_probe() {
        let cancelled = AtomicBool::new(false);
        let attempts = wait_until_ready(|| async { true }, &fast_policy(10), &cancelled)
            .await
            .unwrap();
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancelled = AtomicBool::new(false);
        let counter = calls.clone();

        let result = wait_until_ready(
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                }
            },
            &fast_policy(5),
            &cancelled,
        )
        .await;

        match result {
            Err(ShellError::StartupTimeout { attempts }) => assert_eq!(attempts, 5),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn cancelled_before_first_probe() {
        let cancelled = AtomicBool::new(true);
        let result = wait_until_ready(|| async { true }, &fast_policy(10), &cancelled).await;
        assert!(matches!(result, Err(ShellError::StartupCancelled)));
    }

    #[tokio::test]
    async fn cancellation_stops_polling() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));
        let counter = calls.clone();
        let flag = cancelled.clone();

        let result = wait_until_ready(
            move || {
                let counter = counter.clone();
                let flag = flag.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 2 {
                        flag.store(true, Ordering::SeqCst);
                    }
                    false
                }
            },
            &fast_policy(100),
            &cancelled,
        )
        .await;

        assert!(matches!(result, Err(ShellError::StartupCancelled)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(next_delay(&policy, 1), Duration::from_millis(100));
        assert_eq!(next_delay(&policy, 2), Duration::from_millis(200));
        assert_eq!(next_delay(&policy, 3), Duration::from_millis(400));
        assert_eq!(next_delay(&policy, 5), Duration::from_millis(1600));
        assert_eq!(next_delay(&policy, 6), Duration::from_secs(2));
        assert_eq!(next_delay(&policy, 40), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn probe_accepts_any_success_status() {
        use axum::{routing::get, Router};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route("/", get(|| async { "<html>hi</html>" }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        assert!(probe_once(&client, &format!("http://127.0.0.1:{}/", port)).await);
    }

    #[tokio::test]
    async fn probe_treats_server_error_as_not_ready() {
        use axum::http::StatusCode;
        use axum::{routing::get, Router};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().route("/", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::new();
        assert!(!probe_once(&client, &format!("http://127.0.0.1:{}/", port)).await);
    }

    #[tokio::test]
    async fn probe_treats_refused_connection_as_not_ready() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = reqwest::Client::new();
        assert!(!probe_once(&client, &format!("http://127.0.0.1:{}/", port)).await);
    }

    #[test]
    fn port_free_tracks_listener() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_free(port));
        drop(listener);
        assert!(is_port_free(port));
    }
}
