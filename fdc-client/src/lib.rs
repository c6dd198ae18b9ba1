//! fdc-client
//!
//! Client pipeline for a voting-round-based oracle attestation protocol:
//! submit an ABI-encoded attestation request on-chain, derive the voting
//! round it landed in, wait for that round's consensus finalization, fetch
//! the Merkle proof from the data-availability layer, and decode the binary
//! payload into JSON-friendly data.
//!
//! # Architecture
//!
//! 1. [`AttestationPipeline::submit`] quotes the request fee, submits the
//!    request transaction, and derives the voting round from the mined
//!    block's timestamp.
//! 2. [`AttestationPipeline::retrieve`] polls relay finality for that
//!    round, polls the DA layer until the proof is generated, then
//!    ABI-decodes the payload with integers rendered as decimal strings.
//!
//! Chain and proof-service access sit behind the [`ChainClient`] and
//! [`ProofService`] traits; [`EvmChainClient`] and [`DaLayerClient`] are
//! the production adapters. All waits are cooperative and cancellable
//! through a `CancellationToken`.

pub mod chain;
pub mod config;
pub mod da_layer;
pub mod decode;
pub mod error;
pub mod finalize;
pub mod pipeline;
pub mod poller;
pub mod round;

pub use chain::{BlockInfo, ChainClient, EvmChainClient, SubmissionReceipt, TimingParams};
pub use config::PipelineConfig;
pub use da_layer::{DaLayerClient, ProofRequest, ProofService, ProofServiceReply, RawProof};
pub use decode::{decode_proof, DecodedProof, ProofSchema};
pub use error::FdcError;
pub use finalize::FinalizationWaiter;
pub use pipeline::AttestationPipeline;
pub use poller::ProofPoller;
pub use round::compute_round_id;
