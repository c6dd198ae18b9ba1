//! Voting round derivation.

use tracing::debug;

use crate::chain::ChainClient;
use crate::error::FdcError;

/// Derive the voting round a mined transaction belongs to.
///
/// Reads the block timestamp and the epoch timing parameters, then applies
/// integer division. A block timestamped before the first voting round is
/// an error, never round zero.
pub async fn compute_round_id<C>(chain: &C, block_number: u64) -> Result<u64, FdcError>
where
    C: ChainClient + ?Sized,
{
    let block = chain
        .get_block(block_number)
        .await?
        .ok_or(FdcError::BlockNotFound(block_number))?;
    let timing = chain.timing_params().await?;

    debug!(
        block_timestamp = block.timestamp,
        first_voting_round_start_ts = timing.first_voting_round_start_ts,
        voting_epoch_duration_seconds = timing.voting_epoch_duration_seconds,
        "computing round id"
    );

    if timing.voting_epoch_duration_seconds == 0 {
        return Err(FdcError::RoundComputationFailed(
            "votingEpochDurationSeconds is zero".into(),
        ));
    }
    if block.timestamp < timing.first_voting_round_start_ts {
        return Err(FdcError::InvalidTimingWindow {
            block_timestamp: block.timestamp,
            epoch_start: timing.first_voting_round_start_ts,
        });
    }

    Ok((block.timestamp - timing.first_voting_round_start_ts)
        / timing.voting_epoch_duration_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::MockChain;
    use crate::chain::BlockInfo;

    fn chain_with_timestamp(timestamp: u64) -> MockChain {
        MockChain {
            block: Some(BlockInfo {
                number: 7,
                timestamp,
            }),
            ..MockChain::default()
        }
    }

    #[tokio::test]
    async fn test_round_id_truncates_toward_epoch_start() {
        // (1267 - 1000) / 90 = 2.96... -> 2
        let chain = chain_with_timestamp(1_267);
        assert_eq!(compute_round_id(&chain, 7).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_round_id_monotonic_in_timestamp() {
        let mut previous = 0;
        for timestamp in (1_000..2_000).step_by(17) {
            let chain = chain_with_timestamp(timestamp);
            let round_id = compute_round_id(&chain, 7).await.unwrap();
            assert!(round_id >= previous);
            previous = round_id;
        }
    }

    #[tokio::test]
    async fn test_round_id_stable_across_calls() {
        let chain = chain_with_timestamp(1_267);
        let first = compute_round_id(&chain, 7).await.unwrap();
        let second = compute_round_id(&chain, 7).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_timestamp_before_epoch_start() {
        let chain = chain_with_timestamp(999);
        assert!(matches!(
            compute_round_id(&chain, 7).await,
            Err(FdcError::InvalidTimingWindow {
                block_timestamp: 999,
                epoch_start: 1_000,
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_block() {
        let chain = MockChain::default();
        assert!(matches!(
            compute_round_id(&chain, 7).await,
            Err(FdcError::BlockNotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_zero_epoch_duration() {
        let mut chain = chain_with_timestamp(1_267);
        chain.timing.voting_epoch_duration_seconds = 0;
        assert!(matches!(
            compute_round_id(&chain, 7).await,
            Err(FdcError::RoundComputationFailed(_))
        ));
    }
}
