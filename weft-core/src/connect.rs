//! # Connection Manager
//!
//! Establishes a transport connection, blocking until it is ready or failing
//! fast on a terminal error.
//!
//! The dial runs as an independent background task whose first result (ready
//! channel or error) is written into a single-slot channel with a non-blocking
//! send. The caller races that slot against its own deadline; whichever fires
//! first wins and the other outcome is discarded. This surfaces permanent
//! connection errors (refused dial, failed TLS handshake) immediately instead
//! of waiting out the full deadline, and guarantees the abandoned dial task can
//! never block on a channel nobody reads again.

use std::time::Duration;
use tokio::sync::mpsc;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};

/// Errors that can occur while establishing a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Invalid TLS configuration for '{0}': {1}")]
    InvalidTlsConfig(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
    #[error("Connection to '{0}' did not become ready within {1:?}")]
    DeadlineExceeded(String, Duration),
    #[error("Dial task for '{0}' terminated without producing a result")]
    DialInterrupted(String),
}

/// Dials `addr` (e.g. `http://localhost:50051`), optionally wrapping the
/// transport in TLS, and blocks until the connection is ready, the dial fails,
/// or `deadline` elapses.
///
/// On deadline the in-flight dial attempt is abandoned, not force-killed: it
/// may still complete in the background, but its result lands in a slot that is
/// no longer observed.
pub async fn connect(
    addr: &str,
    tls: Option<ClientTlsConfig>,
    deadline: Duration,
) -> Result<Channel, ConnectError> {
    let mut endpoint = Endpoint::new(addr.to_string())
        .map_err(|e| ConnectError::InvalidUrl(addr.to_string(), e))?;

    if let Some(tls) = tls {
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| ConnectError::InvalidTlsConfig(addr.to_string(), e))?;
    }

    // Single-slot, first-write-wins handoff. Capacity one plus `try_send` means
    // at most one result is ever observed and a late writer never blocks.
    let (tx, mut rx) = mpsc::channel::<Result<Channel, tonic::transport::Error>>(1);

    tokio::spawn(async move {
        let result = endpoint.connect().await;
        let _ = tx.try_send(result);
    });

    tokio::select! {
        dialed = rx.recv() => match dialed {
            Some(Ok(channel)) => {
                tracing::debug!(%addr, "connection ready");
                Ok(channel)
            }
            Some(Err(e)) => Err(ConnectError::ConnectionFailed(addr.to_string(), e)),
            None => Err(ConnectError::DialInterrupted(addr.to_string())),
        },
        _ = tokio::time::sleep(deadline) => {
            tracing::debug!(%addr, ?deadline, "dial abandoned on deadline");
            Err(ConnectError::DeadlineExceeded(addr.to_string(), deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_fails_before_dialing() {
        let result = connect("not a url", None, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ConnectError::InvalidUrl(..))));
    }

    #[tokio::test]
    async fn deadline_fires_on_unreachable_target() {
        // RFC 5737 TEST-NET address: packets go nowhere, the dial never resolves.
        let result = connect(
            "http://192.0.2.1:50051",
            None,
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(ConnectError::DeadlineExceeded(..))));
    }
}
