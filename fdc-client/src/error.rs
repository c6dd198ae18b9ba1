//! Error types for the attestation pipeline.

use thiserror::Error;

/// Error type for attestation submission and proof retrieval.
#[derive(Error, Debug)]
pub enum FdcError {
    /// The block a transaction was mined in could not be found.
    #[error("block {0} not found")]
    BlockNotFound(u64),

    /// Block timestamp precedes the first voting round.
    #[error("block timestamp {block_timestamp} precedes first voting round start {epoch_start}")]
    InvalidTimingWindow {
        block_timestamp: u64,
        epoch_start: u64,
    },

    /// The attestation request transaction reverted or was rejected.
    #[error("attestation submission failed: {0}")]
    SubmissionFailed(String),

    /// The voting round could not be derived for a submitted request.
    #[error("round computation failed: {0}")]
    RoundComputationFailed(String),

    /// The round did not finalize within the configured number of checks.
    #[error("round {round_id} not finalized after {attempts} checks")]
    FinalizationTimeout { round_id: u64, attempts: u32 },

    /// The proof service rejected a request outright.
    #[error("proof service unavailable: {0}")]
    ProofServiceUnavailable(String),

    /// The proof was not produced within the configured number of polls.
    #[error("proof not produced after {attempts} attempts")]
    ProofTimeout { attempts: u32 },

    /// The verification ABI does not have the expected shape.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The proof payload bytes do not match the schema layout.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Chain RPC fault.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// HTTP transport fault talking to the proof service.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
