//! fdc-tools
//!
//! Command-line driver for the attestation pipeline:
//! 1. `submit` sends an ABI-encoded attestation request on-chain and
//!    prints the voting round it landed in.
//! 2. `retrieve` waits for a round to finalize and fetches the decoded
//!    proof from the DA layer.
//! 3. `attest` chains the two.

use std::env;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use fdc_client::{AttestationPipeline, DaLayerClient, EvmChainClient, PipelineConfig, ProofSchema};

#[derive(Parser)]
#[command(
    name = "fdc-tools",
    about = "Submit oracle attestation requests and retrieve Merkle proofs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an attestation request; prints the assigned voting round.
    Submit(RequestArgs),
    /// Retrieve and decode the proof for a submitted request.
    Retrieve(RetrieveArgs),
    /// Submit, then wait for and decode the proof.
    Attest(RequestArgs),
}

#[derive(Args)]
struct RequestArgs {
    /// ABI-encoded attestation request, 0x-prefixed hex.
    #[arg(long)]
    request: String,
}

#[derive(Args)]
struct RetrieveArgs {
    /// ABI-encoded attestation request, 0x-prefixed hex.
    #[arg(long)]
    request: String,
    /// Voting round the request was submitted in.
    #[arg(long)]
    round: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fdc_client=info,fdc_tools=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let rpc_url = env::var("FDC_RPC_URL").context("FDC_RPC_URL must be set")?;
    let registry_address =
        env::var("FDC_REGISTRY_ADDRESS").context("FDC_REGISTRY_ADDRESS must be set")?;
    let private_key = env::var("FDC_PRIVATE_KEY").ok();

    let config = PipelineConfig::from_env()?;
    let chain =
        EvmChainClient::connect(&rpc_url, &registry_address, private_key.as_deref()).await?;
    let proof_service = DaLayerClient::new(&config.da_layer_url)?;
    let pipeline =
        AttestationPipeline::new(chain, proof_service, config, ProofSchema::json_api());

    // A ctrl-c unwinds the pipeline through its cancellation token instead
    // of leaving a suspended poll behind.
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            cancel_on_signal.cancel();
        }
    });

    match cli.command {
        Commands::Submit(args) => {
            let request = decode_request(&args.request)?;
            let round_id = pipeline.submit(&request).await?;
            println!("{round_id}");
        }
        Commands::Retrieve(args) => {
            let request = decode_request(&args.request)?;
            let proof = pipeline.retrieve(&request, args.round, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&proof)?);
        }
        Commands::Attest(args) => {
            let request = decode_request(&args.request)?;
            let round_id = pipeline.submit(&request).await?;
            info!(round_id, "request submitted, retrieving proof");
            let proof = pipeline.retrieve(&request, round_id, &cancel).await?;
            println!("{}", serde_json::to_string_pretty(&proof)?);
        }
    }

    Ok(())
}

fn decode_request(request: &str) -> Result<Vec<u8>> {
    let payload = request.strip_prefix("0x").unwrap_or(request);
    hex::decode(payload).context("request must be hex-encoded")
}
