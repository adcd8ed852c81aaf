//! Back2Use checkout
//!
//! Tops up a Back2Use wallet through a hosted VNPay or MoMo checkout and
//! confirms the deposit against the wallet ledger.

mod config;
mod driver;
mod shutdown;

use b2u_core::backend::WalletBackend;
use b2u_core::events::UiEvent;
use b2u_sdk::client::WalletClient;
use b2u_sdk::objects::{PaymentMethod, TransactionQuery};
use clap::{Parser, Subcommand};
use config::{ConfigLoader, get_access_token};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Back2Use checkout - wallet top-up through hosted payment gateways
#[derive(Parser, Debug)]
#[command(name = "b2u-checkout")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./b2u-config.toml")]
    config: PathBuf,

    /// Override the backend base URL (e.g., http://10.0.2.2:3000)
    #[arg(short, long)]
    backend: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Top up the wallet and confirm the deposit
    Deposit {
        /// Amount in VND
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        amount: u64,

        /// Payment gateway (vnpay or momo)
        #[arg(long)]
        provider: PaymentMethod,
    },
    /// List personal wallet transactions
    History {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting b2u-checkout v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.backend);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let mut client = WalletClient::new(loaded_config.base_url.clone(), &loaded_config.wallet_id);
    match get_access_token() {
        Some(token) => client = client.with_access_token(token),
        None => tracing::warn!(
            "{} not set, calling the wallet API without a token",
            config::ACCESS_TOKEN_ENV
        ),
    }

    match args.command {
        Command::Deposit { amount, provider } => {
            let backend: Arc<dyn WalletBackend> = Arc::new(client);
            let outcome =
                driver::run_deposit(backend, loaded_config.flow, amount, provider).await?;
            Ok(match outcome {
                Some(UiEvent::PaymentSucceeded { .. }) => ExitCode::SUCCESS,
                // Not a failure: the ledger may still confirm it later.
                Some(UiEvent::StillProcessing { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            })
        }
        Command::History { limit } => {
            let query = TransactionQuery::personal(loaded_config.flow.wallet_type.clone(), limit);
            let wallet = client.get_wallet().await?;
            let transactions = client.list_transactions(&query).await?;

            println!("Wallet {} balance: {} VND", wallet.id, wallet.balance);
            for tx in transactions {
                println!(
                    "{:<26} {:<4} {:<11} {:>12}  {}",
                    tx.created_at.as_deref().unwrap_or("-"),
                    format!("{:?}", tx.direction).to_lowercase(),
                    tx.status.to_string(),
                    tx.amount.to_string(),
                    tx.description.as_deref().unwrap_or(""),
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_args() {
        let args = Args::try_parse_from([
            "b2u-checkout",
            "deposit",
            "--amount",
            "500000",
            "--provider",
            "MoMo",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Deposit {
                amount: 500_000,
                provider: PaymentMethod::MoMo
            }
        ));
        assert_eq!(args.config, PathBuf::from("./b2u-config.toml"));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let result = Args::try_parse_from([
            "b2u-checkout",
            "deposit",
            "--amount",
            "0",
            "--provider",
            "vnpay",
        ]);
        assert!(result.is_err());
    }
}
