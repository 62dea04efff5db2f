//! Session readiness probing
//!
//! The server is ready when it answers HTTP on the tunnel's local bind
//! address. Any response counts, including errors: a 404 still proves the
//! tunnel is forwarding and the server is accepting connections. Connection
//! refusals are retried immediately, since the local listener appearing is
//! exactly the event being waited for.

use std::time::{Duration, Instant};

use portside_core::error::SessionError;

/// Per-request timeout, short enough to retry several times within the
/// overall deadline.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// How long to wait for the server before giving up on the session
pub const READY_DEADLINE: Duration = Duration::from_secs(15);

/// Wait until `url` answers HTTP or the deadline passes.
pub async fn wait_ready(url: &str, deadline: Duration) -> Result<(), SessionError> {
    let client = reqwest::Client::new();
    let started = Instant::now();

    loop {
        if started.elapsed() > deadline {
            return Err(SessionError::ReadinessTimeout {
                url: url.to_string(),
                timeout_secs: deadline.as_secs(),
            });
        }

        match client.get(url).timeout(REQUEST_TIMEOUT).send().await {
            Ok(response) => {
                tracing::debug!(
                    "{} answered with {} after {:.1}s",
                    url,
                    response.status(),
                    started.elapsed().as_secs_f64()
                );
                return Ok(());
            }
            Err(e) => {
                tracing::trace!("not ready yet: {}", e);
            }
        }
    }
}
