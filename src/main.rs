// Main entry point for the proxy-probe CLI
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use proxy_probe::config::{Config, Credentials};
use proxy_probe::economics::profit::{assess_profit, lamports_to_sol, Prices};
use proxy_probe::loadgen::events::FanoutSink;
use proxy_probe::loadgen::runner::{LoadRunner, LoadSettings};
use proxy_probe::rpc_core::constants::{config as keys, units};
use proxy_probe::rpc_core::methods::RpcMethod;
use proxy_probe::transport::client::RpcClient;
use proxy_probe::utils::logging::{init_tracing, install_panic_hook};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the credentials file (network name -> endpoints)
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Network to target, e.g. "night-stand" or "devnet"
    #[arg(long)]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported JSON-RPC methods
    Methods,

    /// Send one JSON-RPC call and print the reply
    Call {
        method: String,

        /// JSON array of positional params
        #[arg(long, default_value = "[]")]
        params: String,

        /// Explicit request id
        #[arg(long)]
        id: Option<u64>,
    },

    /// Run simulated users against the proxy
    Load {
        #[arg(long, default_value_t = 10)]
        users: usize,

        /// Users started per second
        #[arg(long, default_value_t = 1.0)]
        spawn_rate: f64,

        /// Run time in seconds
        #[arg(long, default_value_t = 60)]
        duration: u64,
    },

    /// Check operator profit for a measured balance change
    Profit {
        /// Lamports the operator spent on Solana
        #[arg(long)]
        sol_spent: u64,

        /// NEON the operator collected
        #[arg(long, allow_hyphen_values = true)]
        neon_gained: f64,

        /// SOL price in USD
        #[arg(long)]
        sol_price: f64,

        /// NEON price in USD
        #[arg(long, default_value_t = units::DEFAULT_NEON_PRICE_USD)]
        neon_price: f64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    install_panic_hook();

    let mut config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from env, using defaults: {}", e);
        Config::default()
    });

    // CLI flags override env
    if let Some(path) = &cli.credentials {
        config.credentials_path = path.clone();
    }
    if let Some(host) = &cli.host {
        config.network = host.clone();
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to init tracing: {}", e);
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Methods => {
            for method in RpcMethod::ALL {
                println!("{}", method);
            }
            Ok(())
        }
        Command::Call { method, params, id } => call(&config, &method, &params, id).await,
        Command::Load {
            users,
            spawn_rate,
            duration,
        } => {
            let settings = LoadSettings {
                users,
                spawn_rate,
                duration: Duration::from_secs(duration),
            };
            load(config, settings).await
        }
        Command::Profit {
            sol_spent,
            neon_gained,
            sol_price,
            neon_price,
        } => {
            let prices = Prices {
                sol_usd: sol_price,
                neon_usd: neon_price,
            };
            let report = assess_profit(sol_spent, neon_gained, prices)?;
            println!(
                "Operator receive {:.9} NEON ({:.2} $) and spend {:.9} SOL ({:.2} $), profit - {:.9}%",
                report.neon_gained,
                report.neon_income_usd,
                lamports_to_sol(report.sol_spent_lamports),
                report.sol_cost_usd,
                report.profit_percent
            );
            Ok(())
        }
    }
}

/// A missing credentials file falls back to `envs.json` in the working directory.
fn load_credentials(config: &Config) -> Result<Credentials> {
    Credentials::load_with_fallback(
        &config.credentials_path,
        Path::new(keys::DEFAULT_CREDENTIALS_FILE),
    )
        .with_context(|| format!("loading credentials for network '{}'", config.network))
}

async fn call(config: &Config, method: &str, params: &str, id: Option<u64>) -> Result<()> {
    let method: RpcMethod = method.parse()?;
    let params = match serde_json::from_str::<Value>(params).context("--params is not valid JSON")? {
        Value::Array(items) => items,
        other => return Err(anyhow!("--params must be a JSON array, got {}", other)),
    };

    let credentials = load_credentials(config)?;
    let network = credentials.select(&config.network)?;
    let client = RpcClient::new(network.proxy_url.clone(), config)?;

    let request = match id {
        Some(id) => client.factory().build_with_id(method, params, id),
        None => client.factory().build(method, params),
    };
    let reply = client.call(&request).await?;
    if !reply.is_success() {
        warn!(method = %method, "Proxy answered with an error");
    }
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

async fn load(config: Config, settings: LoadSettings) -> Result<()> {
    let credentials = load_credentials(&config)?;
    let network = credentials.select(&config.network)?.clone();
    info!(network = %config.network, proxy = %network.proxy_url, "Load target selected");

    let runner = LoadRunner::new(settings, config, network, Arc::new(FanoutSink::new()));
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping load run");
            cancel.cancel();
        }
    });

    let report = runner.run().await?;
    print!("{}", report.render_table());
    Ok(())
}
