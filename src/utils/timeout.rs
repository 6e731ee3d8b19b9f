//! Async timeout wrappers and default durations.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{ProtocolError, Result};

/// Default timeout for connecting, sending and receiving.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period for in-flight connections when an acceptor shuts down.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs `fut`, failing with [`ProtocolError::Timeout`] if it does not finish
/// within `duration`.
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}

/// Runs an infallible `fut` under a timeout.
pub async fn with_timeout<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = T>,
{
    timeout(duration, fut)
        .await
        .map_err(|_| ProtocolError::Timeout)
}
