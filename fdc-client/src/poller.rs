//! Proof polling against the DA layer.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::da_layer::{ProofRequest, ProofService, RawProof};
use crate::error::FdcError;

/// Polls the proof service for a (request, round) pair until the proof is
/// generated.
///
/// The first request is strict: the service refusing it outright signals
/// misconfiguration, not a proof still being aggregated. Later attempts
/// treat error statuses and transport faults as "not ready".
#[derive(Clone, Debug)]
pub struct ProofPoller {
    poll_interval: Duration,
    max_attempts: Option<u32>,
    max_consecutive_failures: Option<u32>,
}

impl ProofPoller {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_attempts: None,
            max_consecutive_failures: None,
        }
    }

    /// Cap the total number of polls.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Escalate after this many hard failures in a row. Off by default, so
    /// a flaky service keeps reading as "not ready".
    pub fn with_max_consecutive_failures(mut self, max_failures: u32) -> Self {
        self.max_consecutive_failures = Some(max_failures);
        self
    }

    /// Poll until the proof materializes.
    pub async fn poll<S>(
        &self,
        service: &S,
        request: &ProofRequest,
        cancel: &CancellationToken,
    ) -> Result<RawProof, FdcError>
    where
        S: ProofService + ?Sized,
    {
        let mut attempts = 0u32;
        let mut consecutive_failures = 0u32;
        let mut strict = true;

        loop {
            attempts += 1;
            match service.post_proof_request(request).await {
                Ok(reply) if reply.is_success() => {
                    consecutive_failures = 0;
                    if let Some(proof) = reply.to_raw_proof() {
                        info!(
                            voting_round_id = request.voting_round_id,
                            "proof generated"
                        );
                        return Ok(proof);
                    }
                    debug!(
                        voting_round_id = request.voting_round_id,
                        "proof not ready yet"
                    );
                }
                Ok(reply) => {
                    if strict {
                        return Err(FdcError::ProofServiceUnavailable(format!(
                            "response status is not OK: {}",
                            reply.status
                        )));
                    }
                    consecutive_failures += 1;
                    warn!(
                        status = reply.status,
                        "proof service returned an error status"
                    );
                }
                Err(err) => {
                    if strict {
                        return Err(FdcError::ProofServiceUnavailable(err.to_string()));
                    }
                    consecutive_failures += 1;
                    warn!("proof service request failed: {err}");
                }
            }
            strict = false;

            if let Some(max) = self.max_consecutive_failures {
                if consecutive_failures >= max {
                    return Err(FdcError::ProofServiceUnavailable(format!(
                        "{consecutive_failures} consecutive failures"
                    )));
                }
            }
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(FdcError::ProofTimeout { attempts });
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(FdcError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
