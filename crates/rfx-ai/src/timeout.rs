use std::future::Future;
use std::time::Duration;

use rfx_types::{GatewayError, Result};

/// Race `fut` against `deadline`.
///
/// On expiry the inner future is dropped, which aborts an in-flight HTTP request
/// and returns its connection, and `GatewayError::Timeout` is raised.
pub async fn with_timeout<T, Fut>(deadline: Duration, provider: &str, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(provider, timeout_ms = %deadline.as_millis(), "Provider call timed out");
            Err(GatewayError::Timeout {
                provider: provider.to_string(),
                timeout_ms: deadline.as_millis() as u64,
            })
        }
    }
}
