//! Runtime implementations backing the lookup retry delays.

use std::time::Duration;

use async_trait::async_trait;

use super::LookupSleeper;

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl LookupSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
