//! Chain access surface for the attestation pipeline.
//!
//! The pipeline depends only on the [`ChainClient`] capability trait;
//! [`EvmChainClient`] is the production adapter.

mod evm;

pub use evm::EvmChainClient;

use async_trait::async_trait;
use ethers::types::{H256, U256};

use crate::error::FdcError;

/// Minimal view of a mined block.
#[derive(Clone, Copy, Debug)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
}

/// Voting epoch timing parameters read from the chain.
///
/// Logically constant for a network, but re-fetched on every round
/// computation; the pipeline holds no cross-call state.
#[derive(Clone, Copy, Debug)]
pub struct TimingParams {
    pub first_voting_round_start_ts: u64,
    pub voting_epoch_duration_seconds: u64,
}

/// Receipt of a mined attestation request transaction.
#[derive(Clone, Copy, Debug)]
pub struct SubmissionReceipt {
    pub tx_hash: H256,
    /// Absent while the transaction is not yet included in a block.
    pub block_number: Option<u64>,
}

/// Chain capabilities the pipeline depends on.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Fetch a block by number. `None` if the chain does not know it.
    async fn get_block(&self, number: u64) -> Result<Option<BlockInfo>, FdcError>;

    /// Read the voting epoch timing parameters.
    async fn timing_params(&self) -> Result<TimingParams, FdcError>;

    /// Quote the fee required for an attestation request.
    async fn request_fee(&self, request: &[u8]) -> Result<U256, FdcError>;

    /// Submit the attestation request with the quoted fee as value and wait
    /// for the transaction receipt.
    async fn submit_attestation_request(
        &self,
        request: &[u8],
        fee: U256,
    ) -> Result<SubmissionReceipt, FdcError>;

    /// Check whether a voting round is finalized for a protocol.
    async fn is_finalized(&self, protocol_id: u64, round_id: u64) -> Result<bool, FdcError>;

    /// Read the current voting epoch id reported by the chain.
    async fn current_voting_epoch_id(&self) -> Result<u64, FdcError>;
}
