//! Bounded calls to external stores.
//!
//! Every store round-trip made while gating a request goes through `bounded`,
//! so a slow backend costs one request its deadline and nothing more.
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreCallError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error("store call failed: {0}")]
    Backend(String),
}

pub async fn bounded<T, E, F>(limit: Duration, call: F) -> Result<T, StoreCallError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(StoreCallError::Backend(e.to_string())),
        Err(_) => Err(StoreCallError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_values_and_errors() {
        let ok = bounded(Duration::from_secs(1), async { Ok::<_, String>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = bounded(Duration::from_secs(1), async { Err::<u8, _>("boom") }).await;
        assert!(matches!(err, Err(StoreCallError::Backend(m)) if m == "boom"));
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let res = bounded(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        })
        .await;
        assert!(matches!(res, Err(StoreCallError::Timeout(_))));
    }
}
