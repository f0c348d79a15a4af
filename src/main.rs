//! tx-harness
//!
//! Command-line front end for the transaction harness.
//!
//! # Architecture Overview
//!
//! ```text
//!   tx-harness submit ...
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────────┐   ┌────────────────────┐
//!   │  config  │──▶│ ProgramInterface │──▶│ TransactionHarness │──▶ SubmissionResult
//!   │  (TOML)  │   │    (IDL JSON)    │   │  encode/sign/send  │
//!   └──────────┘   └──────────────────┘   │  poll commitment   │
//!                                         └─────────┬──────────┘
//!                                                   │ JSON-RPC
//!                                                   ▼
//!                                             ledger node(s)
//! ```
//!
//! This is the only place configuration, key files and environment
//! variables are read; the library takes everything by injection.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tx_harness::config::{load_config, override_rpc_url, HarnessConfig};
use tx_harness::ledger::{CommitmentLevel, Connection, Keypair, Pubkey, RpcConnection, Signature, Signer};
use tx_harness::lifecycle::{signals::spawn_signal_handler, Shutdown};
use tx_harness::observability::{logging, metrics};
use tx_harness::program::{ArgType, ArgValue, CallDescriptor, ProgramInterface};
use tx_harness::{HarnessSettings, SubmissionResult, TransactionHarness};

const DEFAULT_CONFIG_PATH: &str = "tx-harness.toml";

#[derive(Parser)]
#[command(name = "tx-harness")]
#[command(about = "Submit program calls and wait for ledger confirmation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit one program call and wait for the requested commitment
    Submit {
        /// Instruction name (snake_case or camelCase)
        #[arg(short, long)]
        method: String,

        /// Positional argument, typed by the IDL; `<type>:<value>` pins the type
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Account binding as `<name>=<pubkey>`
        #[arg(long = "account")]
        accounts: Vec<String>,

        /// processed, confirmed or finalized (defaults to the configured level)
        #[arg(long)]
        commitment: Option<CommitmentLevel>,

        /// Fee payer key file; falls back to TX_HARNESS_KEYPAIR
        #[arg(short, long)]
        keypair: Option<PathBuf>,

        /// IDL path; overrides the configured one
        #[arg(long)]
        idl: Option<PathBuf>,
    },
    /// Show the ledger's status for a transaction signature
    Status {
        signature: Signature,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = read_config(&cli.config)?;
    if let Some(url) = cli.rpc_url {
        config = override_rpc_url(config, url)?;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(rpc_url = %config.rpc.url, "tx-harness v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let connection = Arc::new(RpcConnection::new(&config.rpc)?);

    match cli.command {
        Commands::Submit {
            method,
            args,
            accounts,
            commitment,
            keypair,
            idl,
        } => {
            let idl_path = idl
                .or_else(|| config.program.idl_path.as_ref().map(PathBuf::from))
                .ok_or("No IDL given: pass --idl or set program.idl_path")?;
            let interface = ProgramInterface::from_idl_file(&idl_path, config.program.program_id)?;

            let payer: Arc<dyn Signer> = match keypair {
                Some(path) => Arc::new(Keypair::from_file(&path)?),
                None => Arc::new(Keypair::from_env()?),
            };
            tracing::info!(payer = %payer.pubkey(), program_id = %interface.program_id, "Signer loaded");

            let descriptor = build_descriptor(&interface, &method, &args, &accounts, payer)?;
            let commitment = commitment.unwrap_or(config.confirmation.commitment);

            let harness = TransactionHarness::new(
                connection,
                Arc::new(interface),
                HarnessSettings::from(&config.confirmation),
            );

            let shutdown = Shutdown::new();
            spawn_signal_handler(shutdown.clone());

            let result = harness
                .submit_with_cancel(descriptor, commitment, shutdown.cancelled())
                .await;
            report(&result)
        }
        Commands::Status { signature } => {
            match connection.get_signature_status(&signature).await? {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("{}: not found", signature),
            }
            Ok(())
        }
    }
}

/// Load the config file, or defaults when the default path does not exist.
fn read_config(path: &Path) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        return Ok(HarnessConfig::default());
    }
    Ok(load_config(path)?)
}

fn build_descriptor(
    interface: &ProgramInterface,
    method: &str,
    args: &[String],
    accounts: &[String],
    payer: Arc<dyn Signer>,
) -> Result<CallDescriptor, Box<dyn std::error::Error>> {
    let declared: Vec<ArgType> = interface
        .instruction(method)
        .map(|ix| ix.args.iter().map(|a| a.ty).collect())
        .unwrap_or_default();

    let mut descriptor = CallDescriptor::new(method).signer(payer);

    for (i, raw) in args.iter().enumerate() {
        let (ty, value) = match split_typed(raw) {
            Some((ty, value)) => (ty, value),
            None => {
                let ty = declared
                    .get(i)
                    .copied()
                    .ok_or_else(|| format!("Argument {} has no declared type; use <type>:<value>", i))?;
                (ty, raw.as_str())
            }
        };
        descriptor = descriptor.arg(ArgValue::parse(ty, value)?);
    }

    for binding in accounts {
        let (name, pubkey) = binding
            .split_once('=')
            .ok_or_else(|| format!("Account binding '{}' must be <name>=<pubkey>", binding))?;
        descriptor = descriptor.account(name, pubkey.parse::<Pubkey>()?);
    }

    Ok(descriptor)
}

/// `u8:254` → `(U8, "254")`. Values without a known type prefix return `None`.
fn split_typed(raw: &str) -> Option<(ArgType, &str)> {
    let (prefix, value) = raw.split_once(':')?;
    let ty = serde_json::from_value(serde_json::Value::String(prefix.to_string())).ok()?;
    Some((ty, value))
}

fn report(result: &SubmissionResult) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        SubmissionResult::Confirmed { signature, slot } => {
            println!("signature: {}", signature);
            println!("slot: {}", slot);
            Ok(())
        }
        SubmissionResult::Failed { reason, logs, signature } => {
            if let Some(signature) = signature {
                eprintln!("signature: {}", signature);
            }
            for line in logs {
                eprintln!("  {}", line);
            }
            Err(reason.to_string().into())
        }
    }
}
