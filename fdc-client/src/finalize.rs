//! Round finalization polling.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chain::ChainClient;
use crate::error::FdcError;

/// Polls relay finality for a voting round until it is finalized.
///
/// Finalization legitimately takes minutes, so no attempt cap is enforced
/// unless one is configured. Checking has no side effects on chain state;
/// the wait is safe to repeat or run concurrently for the same round.
#[derive(Clone, Debug)]
pub struct FinalizationWaiter {
    protocol_id: u64,
    poll_interval: Duration,
    max_attempts: Option<u32>,
}

impl FinalizationWaiter {
    pub fn new(protocol_id: u64, poll_interval: Duration) -> Self {
        Self {
            protocol_id,
            poll_interval,
            max_attempts: None,
        }
    }

    /// Cap the number of unsuccessful finality checks.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Suspend until the round is finalized.
    pub async fn wait<C>(
        &self,
        chain: &C,
        round_id: u64,
        cancel: &CancellationToken,
    ) -> Result<(), FdcError>
    where
        C: ChainClient + ?Sized,
    {
        let mut attempts = 0u32;
        loop {
            if chain.is_finalized(self.protocol_id, round_id).await? {
                info!(round_id, "round finalized");
                return Ok(());
            }

            attempts += 1;
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(FdcError::FinalizationTimeout { round_id, attempts });
                }
            }

            debug!(
                round_id,
                "round not finalized yet, retrying in {:?}", self.poll_interval
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(FdcError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::chain::testing::MockChain;

    const INTERVAL: Duration = Duration::from_secs(30);

    #[tokio::test(start_paused = true)]
    async fn test_returns_once_finalized() {
        let chain = MockChain {
            finalized_after: 3,
            ..MockChain::default()
        };
        let waiter = FinalizationWaiter::new(200, INTERVAL);
        waiter
            .wait(&chain, 812, &CancellationToken::new())
            .await
            .unwrap();
        // three false checks plus the final true one
        assert_eq!(chain.finality_checks.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_finalized_checks_once() {
        let chain = MockChain::default();
        let waiter = FinalizationWaiter::new(200, INTERVAL);
        waiter
            .wait(&chain, 812, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(chain.finality_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_capped() {
        let chain = MockChain {
            finalized_after: u32::MAX,
            ..MockChain::default()
        };
        let waiter = FinalizationWaiter::new(200, INTERVAL).with_max_attempts(5);
        let result = waiter.wait(&chain, 812, &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(FdcError::FinalizationTimeout {
                round_id: 812,
                attempts: 5,
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let chain = MockChain {
            finalized_after: u32::MAX,
            ..MockChain::default()
        };
        let waiter = FinalizationWaiter::new(200, INTERVAL);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = waiter.wait(&chain, 812, &cancel).await;
        assert!(matches!(result, Err(FdcError::Cancelled)));
    }
}
