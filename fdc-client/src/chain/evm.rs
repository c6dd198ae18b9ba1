//! EVM chain adapter.
//!
//! Protocol contract addresses (relay, attestation hub, systems manager,
//! fee configurations) are resolved through a single on-chain registry
//! contract on every call; view calls are built from keccak selectors and
//! decoded with explicit output types.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    abi::{self, ParamType, Token},
    prelude::*,
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, U256},
    utils::keccak256,
};
use tracing::{debug, info};

use super::{BlockInfo, ChainClient, SubmissionReceipt, TimingParams};
use crate::error::FdcError;

// Registry accessors for the protocol contracts.
const SIG_GET_RELAY: &str = "getRelay()";
const SIG_GET_FDC_HUB: &str = "getFdcHub()";
const SIG_GET_SYSTEMS_MANAGER: &str = "getFlareSystemsManager()";
const SIG_GET_FEE_CONFIGURATIONS: &str = "getFdcRequestFeeConfigurations()";

const SIG_FIRST_ROUND_START_TS: &str = "firstVotingRoundStartTs()";
const SIG_EPOCH_DURATION_SECONDS: &str = "votingEpochDurationSeconds()";
const SIG_CURRENT_VOTING_EPOCH_ID: &str = "getCurrentVotingEpochId()";
const SIG_IS_FINALIZED: &str = "isFinalized(uint256,uint256)";
const SIG_GET_REQUEST_FEE: &str = "getRequestFee(bytes)";
const SIG_REQUEST_ATTESTATION: &str = "requestAttestation(bytes)";

/// Chain client backed by a JSON-RPC provider and a local signer.
pub struct EvmChainClient {
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
    registry_address: Address,
}

impl EvmChainClient {
    /// Connect to an RPC endpoint.
    ///
    /// The signer chain id is fetched from the provider. Without a private
    /// key an ephemeral wallet is generated; reads work, submissions won't
    /// be accepted on-chain.
    pub async fn connect(
        rpc_url: &str,
        registry_address: &str,
        private_key: Option<&str>,
    ) -> Result<Self, FdcError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| FdcError::Config(format!("invalid rpc url: {e}")))?;
        let chain_id = provider.get_chainid().await.map_err(rpc_err)?;

        let wallet = match private_key {
            Some(key) => key
                .parse::<LocalWallet>()
                .map_err(|e| FdcError::Config(format!("invalid private key: {e}")))?,
            None => LocalWallet::new(&mut rand::thread_rng()),
        };
        let wallet = wallet.with_chain_id(chain_id.as_u64());

        let registry_address: Address = registry_address
            .parse()
            .map_err(|e| FdcError::Config(format!("invalid registry address: {e}")))?;

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet)),
            registry_address,
        })
    }

    async fn view_call(
        &self,
        to: Address,
        signature: &str,
        args: &[Token],
        outputs: &[ParamType],
    ) -> Result<Vec<Token>, FdcError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(to)
            .data(encode_call(signature, args))
            .into();
        let returned = self.client.call(&tx, None).await.map_err(rpc_err)?;
        abi::decode(outputs, &returned)
            .map_err(|e| FdcError::Rpc(format!("{signature} returned malformed data: {e}")))
    }

    async fn registry_lookup(&self, signature: &str) -> Result<Address, FdcError> {
        let tokens = self
            .view_call(self.registry_address, signature, &[], &[ParamType::Address])
            .await?;
        match tokens.first() {
            Some(Token::Address(address)) => Ok(*address),
            _ => Err(FdcError::Rpc(format!(
                "{signature} did not return an address"
            ))),
        }
    }

    async fn uint_view(&self, to: Address, signature: &str) -> Result<U256, FdcError> {
        let tokens = self
            .view_call(to, signature, &[], &[ParamType::Uint(256)])
            .await?;
        match tokens.first() {
            Some(Token::Uint(value)) => Ok(*value),
            _ => Err(FdcError::Rpc(format!("{signature} did not return a uint"))),
        }
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn get_block(&self, number: u64) -> Result<Option<BlockInfo>, FdcError> {
        let block = self.client.get_block(number).await.map_err(rpc_err)?;
        Ok(block.map(|block| BlockInfo {
            number: block.number.map(|n| n.as_u64()).unwrap_or(number),
            timestamp: block.timestamp.as_u64(),
        }))
    }

    async fn timing_params(&self) -> Result<TimingParams, FdcError> {
        let manager = self.registry_lookup(SIG_GET_SYSTEMS_MANAGER).await?;
        let first_voting_round_start_ts =
            self.uint_view(manager, SIG_FIRST_ROUND_START_TS).await?.as_u64();
        let voting_epoch_duration_seconds = self
            .uint_view(manager, SIG_EPOCH_DURATION_SECONDS)
            .await?
            .as_u64();
        Ok(TimingParams {
            first_voting_round_start_ts,
            voting_epoch_duration_seconds,
        })
    }

    async fn request_fee(&self, request: &[u8]) -> Result<U256, FdcError> {
        let fee_configurations = self.registry_lookup(SIG_GET_FEE_CONFIGURATIONS).await?;
        let tokens = self
            .view_call(
                fee_configurations,
                SIG_GET_REQUEST_FEE,
                &[Token::Bytes(request.to_vec())],
                &[ParamType::Uint(256)],
            )
            .await?;
        match tokens.first() {
            Some(Token::Uint(fee)) => Ok(*fee),
            _ => Err(FdcError::Rpc(
                "getRequestFee did not return a fee".into(),
            )),
        }
    }

    async fn submit_attestation_request(
        &self,
        request: &[u8],
        fee: U256,
    ) -> Result<SubmissionReceipt, FdcError> {
        let hub = self.registry_lookup(SIG_GET_FDC_HUB).await?;
        let tx = TransactionRequest::new()
            .to(hub)
            .data(encode_call(
                SIG_REQUEST_ATTESTATION,
                &[Token::Bytes(request.to_vec())],
            ))
            .value(fee);

        debug!(hub = ?hub, %fee, "sending attestation request transaction");

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| FdcError::SubmissionFailed(e.to_string()))?;
        let receipt = pending
            .await
            .map_err(rpc_err)?
            .ok_or_else(|| FdcError::SubmissionFailed("transaction dropped before inclusion".into()))?;

        if receipt.status == Some(0u64.into()) {
            return Err(FdcError::SubmissionFailed("transaction reverted".into()));
        }

        info!(tx_hash = ?receipt.transaction_hash, "attestation request mined");

        Ok(SubmissionReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
        })
    }

    async fn is_finalized(&self, protocol_id: u64, round_id: u64) -> Result<bool, FdcError> {
        let relay = self.registry_lookup(SIG_GET_RELAY).await?;
        let tokens = self
            .view_call(
                relay,
                SIG_IS_FINALIZED,
                &[
                    Token::Uint(U256::from(protocol_id)),
                    Token::Uint(U256::from(round_id)),
                ],
                &[ParamType::Bool],
            )
            .await?;
        match tokens.first() {
            Some(Token::Bool(finalized)) => Ok(*finalized),
            _ => Err(FdcError::Rpc("isFinalized did not return a bool".into())),
        }
    }

    async fn current_voting_epoch_id(&self) -> Result<u64, FdcError> {
        let manager = self.registry_lookup(SIG_GET_SYSTEMS_MANAGER).await?;
        Ok(self
            .uint_view(manager, SIG_CURRENT_VOTING_EPOCH_ID)
            .await?
            .as_u64())
    }
}

fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut calldata = keccak256(signature.as_bytes())[..4].to_vec();
    calldata.extend_from_slice(&abi::encode(args));
    Bytes::from(calldata)
}

fn rpc_err<E: std::fmt::Display>(err: E) -> FdcError {
    FdcError::Rpc(err.to_string())
}
