//! Pipeline configuration.

use std::env;
use std::time::Duration;

use crate::error::FdcError;

/// Default cadence for relay finality checks.
pub const DEFAULT_FINALIZATION_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Default cadence for proof service polls.
pub const DEFAULT_PROOF_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Delay between finalization and the first proof query; the DA layer needs
/// a moment to aggregate the round before it can serve proofs.
pub const DEFAULT_PROOF_GRACE_DELAY: Duration = Duration::from_secs(10);
/// Protocol id of the JSON-API attestation protocol.
pub const DEFAULT_PROTOCOL_ID: u64 = 200;

/// Endpoint and tuning configuration for the attestation pipeline.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Base URL of the DA layer serving proofs.
    pub da_layer_url: String,
    /// Protocol id used for the relay finality check.
    pub protocol_id: u64,
    /// Sleep between finality checks.
    pub finalization_poll_interval: Duration,
    /// Sleep between proof service polls.
    pub proof_poll_interval: Duration,
    /// Delay between finalization and the first proof query.
    pub proof_grace_delay: Duration,
    /// Optional cap on finality checks. `None` polls indefinitely.
    pub max_finalization_attempts: Option<u32>,
    /// Optional cap on proof polls. `None` polls indefinitely.
    pub max_proof_attempts: Option<u32>,
    /// Optional cap on consecutive hard failures from the proof service
    /// before escalating to an error. `None` keeps treating every
    /// non-initial failure as "not ready".
    pub max_consecutive_proof_failures: Option<u32>,
}

impl PipelineConfig {
    /// Configuration with default tuning for a DA layer base URL.
    pub fn new(da_layer_url: impl Into<String>) -> Self {
        Self {
            da_layer_url: da_layer_url.into(),
            protocol_id: DEFAULT_PROTOCOL_ID,
            finalization_poll_interval: DEFAULT_FINALIZATION_POLL_INTERVAL,
            proof_poll_interval: DEFAULT_PROOF_POLL_INTERVAL,
            proof_grace_delay: DEFAULT_PROOF_GRACE_DELAY,
            max_finalization_attempts: None,
            max_proof_attempts: None,
            max_consecutive_proof_failures: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, FdcError> {
        let da_layer_url = env::var("DA_LAYER_URL")
            .map_err(|_| FdcError::Config("DA_LAYER_URL must be set".into()))?;

        let mut config = Self::new(da_layer_url);

        if let Some(id) = env_u64("FDC_PROTOCOL_ID") {
            config.protocol_id = id;
        }
        if let Some(secs) = env_u64("FINALIZATION_POLL_INTERVAL_SECS") {
            config.finalization_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("PROOF_POLL_INTERVAL_SECS") {
            config.proof_poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("PROOF_GRACE_DELAY_SECS") {
            config.proof_grace_delay = Duration::from_secs(secs);
        }
        config.max_finalization_attempts = env_u32("MAX_FINALIZATION_ATTEMPTS");
        config.max_proof_attempts = env_u32("MAX_PROOF_ATTEMPTS");
        config.max_consecutive_proof_failures = env_u32("MAX_CONSECUTIVE_PROOF_FAILURES");

        Ok(config)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new("https://da.example.org/");
        assert_eq!(config.protocol_id, DEFAULT_PROTOCOL_ID);
        assert_eq!(
            config.finalization_poll_interval,
            DEFAULT_FINALIZATION_POLL_INTERVAL
        );
        assert_eq!(config.proof_poll_interval, DEFAULT_PROOF_POLL_INTERVAL);
        assert_eq!(config.proof_grace_delay, DEFAULT_PROOF_GRACE_DELAY);
        assert!(config.max_finalization_attempts.is_none());
        assert!(config.max_proof_attempts.is_none());
        assert!(config.max_consecutive_proof_failures.is_none());
    }

    #[test]
    fn test_from_env() {
        env::remove_var("DA_LAYER_URL");
        assert!(matches!(
            PipelineConfig::from_env(),
            Err(FdcError::Config(_))
        ));

        env::set_var("DA_LAYER_URL", "https://da.example.org/");
        env::set_var("MAX_PROOF_ATTEMPTS", "5");
        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.da_layer_url, "https://da.example.org/");
        assert_eq!(config.max_proof_attempts, Some(5));
        env::remove_var("DA_LAYER_URL");
        env::remove_var("MAX_PROOF_ATTEMPTS");
    }
}
