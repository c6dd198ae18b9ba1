//! DA layer proof service client.
//!
//! The DA layer serves Merkle proofs for finalized rounds over a single
//! POST endpoint. A response body without `response_hex` means the proof is
//! still being aggregated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::FdcError;

/// Path of the proof-by-request endpoint, relative to the DA layer base URL.
pub const DA_PROOF_PATH: &str = "api/v1/fdc/proof-by-request-round-raw";

/// Wire payload identifying a (request, round) pair to the proof service.
#[derive(Clone, Debug, Serialize)]
pub struct ProofRequest {
    #[serde(rename = "votingRoundId")]
    pub voting_round_id: u64,
    /// ABI-encoded attestation request, 0x-prefixed hex.
    #[serde(rename = "requestBytes")]
    pub request_bytes: String,
}

impl ProofRequest {
    pub fn new(voting_round_id: u64, request: &[u8]) -> Self {
        Self {
            voting_round_id,
            request_bytes: format!("0x{}", hex::encode(request)),
        }
    }
}

/// Proof service response once the proof is generated.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawProof {
    /// ABI-encoded attestation response, 0x-prefixed hex.
    pub response_hex: String,
    /// Merkle path proving inclusion in the finalized round.
    #[serde(default)]
    pub proof: Vec<String>,
}

/// Raw HTTP reply from the proof service.
#[derive(Clone, Debug)]
pub struct ProofServiceReply {
    pub status: u16,
    pub body: Value,
}

impl ProofServiceReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body into a raw proof. Pending replies return `None`.
    pub fn to_raw_proof(&self) -> Option<RawProof> {
        serde_json::from_value(self.body.clone()).ok()
    }
}

/// Proof-serving capability of the DA layer.
#[async_trait]
pub trait ProofService: Send + Sync {
    /// POST the proof request and return the status plus parsed JSON body.
    async fn post_proof_request(&self, request: &ProofRequest)
        -> Result<ProofServiceReply, FdcError>;
}

/// HTTP client for the DA layer proof endpoint.
#[derive(Clone, Debug)]
pub struct DaLayerClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl DaLayerClient {
    /// Build a client for a DA layer base URL.
    pub fn new(base_url: &str) -> Result<Self, FdcError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join(DA_PROOF_PATH))
            .map_err(|e| FdcError::Config(format!("invalid DA layer url: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
        })
    }

    /// Full endpoint URL proofs are requested from.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl ProofService for DaLayerClient {
    async fn post_proof_request(
        &self,
        request: &ProofRequest,
    ) -> Result<ProofServiceReply, FdcError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| FdcError::Transport(format!("request failed: {e}")))?;
        let status = response.status().as_u16();
        let body: Value = response
            .json()
            .await
            .map_err(|e| FdcError::Transport(format!("failed to parse JSON: {e}")))?;
        Ok(ProofServiceReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_proof_request_wire_format() {
        let request = ProofRequest::new(812, &[0x12, 0x34]);
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({ "votingRoundId": 812, "requestBytes": "0x1234" })
        );
    }

    #[test]
    fn test_pending_reply_has_no_proof() {
        let reply = ProofServiceReply {
            status: 200,
            body: json!({}),
        };
        assert!(reply.is_success());
        assert!(reply.to_raw_proof().is_none());
    }

    #[test]
    fn test_ready_reply_parses() {
        let reply = ProofServiceReply {
            status: 200,
            body: json!({ "response_hex": "0x1234", "proof": ["0xab", "0xcd"] }),
        };
        let proof = reply.to_raw_proof().unwrap();
        assert_eq!(proof.response_hex, "0x1234");
        assert_eq!(proof.proof, vec!["0xab", "0xcd"]);
    }

    #[test]
    fn test_endpoint_joining() {
        let with_slash = DaLayerClient::new("https://da.example.org/").unwrap();
        let without_slash = DaLayerClient::new("https://da.example.org").unwrap();
        assert_eq!(with_slash.endpoint(), without_slash.endpoint());
        assert!(with_slash.endpoint().ends_with(DA_PROOF_PATH));
    }
}
