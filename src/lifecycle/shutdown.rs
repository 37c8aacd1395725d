//! Shutdown coordination for the gateway.

use crate::resilience::CancelToken;

/// Coordinator for graceful shutdown.
///
/// Every long-running task holds a clone of the same token, so a task that
/// subscribes after `trigger` still sees the shutdown.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancelToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that resolves once shutdown is triggered.
    pub fn subscribe(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once `trigger` has been called.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn late_subscribers_see_shutdown() {
        let shutdown = Shutdown::new();
        let early = shutdown.subscribe();

        let waiter = tokio::spawn(async move { early.cancelled().await });
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();

        assert!(shutdown.subscribe().is_cancelled());
        shutdown.wait().await;
    }
}
