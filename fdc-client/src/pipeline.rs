//! Attestation pipeline orchestration.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chain::ChainClient;
use crate::config::PipelineConfig;
use crate::da_layer::{ProofRequest, ProofService};
use crate::decode::{decode_proof, DecodedProof, ProofSchema};
use crate::error::FdcError;
use crate::finalize::FinalizationWaiter;
use crate::poller::ProofPoller;
use crate::round::compute_round_id;

/// Orchestrates attestation submission and proof retrieval.
///
/// Every call is an independent flow: the pipeline holds only its
/// collaborators and tuning, so one instance can serve many concurrent
/// requests without shared mutable state.
pub struct AttestationPipeline<C, S> {
    chain: C,
    proof_service: S,
    config: PipelineConfig,
    schema: ProofSchema,
}

impl<C, S> AttestationPipeline<C, S>
where
    C: ChainClient,
    S: ProofService,
{
    pub fn new(chain: C, proof_service: S, config: PipelineConfig, schema: ProofSchema) -> Self {
        Self {
            chain,
            proof_service,
            config,
            schema,
        }
    }

    /// Submit an attestation request on-chain.
    ///
    /// Returns the voting round the request landed in. No retries: a failed
    /// submission surfaces immediately, and resubmitting consumes a new
    /// fee, so that decision stays with the caller.
    pub async fn submit(&self, request: &[u8]) -> Result<u64, FdcError> {
        let fee = self.chain.request_fee(request).await?;
        debug!(%fee, "quoted attestation request fee");

        let receipt = self.chain.submit_attestation_request(request, fee).await?;
        info!(tx_hash = ?receipt.tx_hash, "submitted attestation request");

        let block_number = receipt.block_number.ok_or_else(|| {
            FdcError::RoundComputationFailed("transaction receipt carries no block number".into())
        })?;
        let round_id = compute_round_id(&self.chain, block_number).await?;

        match self.chain.current_voting_epoch_id().await {
            Ok(current_epoch) => debug!(round_id, current_epoch, "round id cross-check"),
            Err(err) => debug!("current voting epoch unavailable: {err}"),
        }

        info!(round_id, "attestation request assigned to round");
        Ok(round_id)
    }

    /// Retrieve and decode the proof for a submitted request.
    ///
    /// Waits for round finalization, then polls the DA layer until the
    /// proof is generated. Any stage failure aborts the call; re-invoking
    /// restarts from the (idempotent) finalization wait.
    pub async fn retrieve(
        &self,
        request: &[u8],
        round_id: u64,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, FdcError> {
        info!(round_id, "waiting for round to finalize");
        let mut waiter = FinalizationWaiter::new(
            self.config.protocol_id,
            self.config.finalization_poll_interval,
        );
        if let Some(max) = self.config.max_finalization_attempts {
            waiter = waiter.with_max_attempts(max);
        }
        waiter.wait(&self.chain, round_id, cancel).await?;

        // Give the DA layer a moment to aggregate before the first query.
        tokio::select! {
            _ = cancel.cancelled() => return Err(FdcError::Cancelled),
            _ = tokio::time::sleep(self.config.proof_grace_delay) => {}
        }

        let mut poller = ProofPoller::new(self.config.proof_poll_interval);
        if let Some(max) = self.config.max_proof_attempts {
            poller = poller.with_max_attempts(max);
        }
        if let Some(max) = self.config.max_consecutive_proof_failures {
            poller = poller.with_max_consecutive_failures(max);
        }

        info!(round_id, "waiting for the DA layer to generate the proof");
        let proof_request = ProofRequest::new(round_id, request);
        let raw = poller
            .poll(&self.proof_service, &proof_request, cancel)
            .await?;

        decode_proof(&raw, &self.schema)
    }
}
