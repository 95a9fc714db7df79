// node/src/main.rs
use clap::{ArgGroup, Parser, Subcommand};
use ledger_core::{Amount, Transaction, TransactionType, GWEI};
use node::{NodeConfig, Runtime};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "amm-node")]
#[command(about = "Bonding-curve AMM token ledger", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and sample script
    Init {
        /// Data directory
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Price a purchase against the configured curve
    #[command(group(ArgGroup::new("quantity").required(true).args(["units", "deposit"])))]
    Quote {
        /// Configuration file path
        #[arg(short, long, default_value = "./config.toml")]
        config: PathBuf,

        /// Deposit required to buy this many units
        #[arg(short, long)]
        units: Option<u64>,

        /// Units this deposit (smallest denomination) buys
        #[arg(long)]
        deposit: Option<String>,

        /// Current supply in whole units
        #[arg(short, long, default_value_t = 0)]
        supply: u64,
    },

    /// Execute a JSON transaction script
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "./config.toml")]
        config: PathBuf,

        /// Script file: a JSON array of transactions
        #[arg(short, long)]
        script: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}={},amm_token={}", env!("CARGO_PKG_NAME"), log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { data_dir } => init_node(&data_dir)?,
        Commands::Quote { config, units, deposit, supply } => quote(&config, units, deposit, supply)?,
        Commands::Run { config, script } => run_script(&config, &script)?,
    }

    Ok(())
}

fn init_node(data_dir: &Path) -> anyhow::Result<()> {
    tracing::info!("Initializing node at {}", data_dir.display());
    std::fs::create_dir_all(data_dir)?;

    let config = NodeConfig::default();
    config.to_file(data_dir.join("config.toml"))?;

    let script = sample_script(&config);
    std::fs::write(data_dir.join("script.json"), serde_json::to_string_pretty(&script)?)?;

    tracing::info!("Token will deploy at {}", config.ledger_address());
    tracing::info!("Edit {}/config.toml to configure the token", data_dir.display());
    Ok(())
}

/// Buy ten units, sell three back, then try a fractional purchase
fn sample_script(config: &NodeConfig) -> Vec<Transaction> {
    let ledger = config.ledger_address();
    let buyer = config
        .genesis
        .iter()
        .map(|account| account.address)
        .find(|address| *address != config.owner)
        .unwrap_or(config.owner);
    // The owner's first nonce went to the deployment
    let mut nonce = if buyer == config.owner { 1 } else { 0 };
    let mut next = |call| {
        let tx = Transaction { timestamp: 0, ..Transaction::new(buyer, nonce, call, 20 * GWEI) };
        nonce += 1;
        tx
    };

    vec![
        next(TransactionType::NativeTransfer { to: ledger, value: Amount::from_tokens(55) }),
        next(TransactionType::TransferAndCall { to: ledger, amount: Amount::from_tokens(3), data: Vec::new() }),
        next(TransactionType::NativeTransfer {
            to: ledger,
            value: Amount::from_u128(1_500_000_000_000_000_000),
        }),
    ]
}

fn quote(config_path: &Path, units: Option<u64>, deposit: Option<String>, supply: u64) -> anyhow::Result<()> {
    let config = NodeConfig::from_file(config_path)?;
    let curve = bonding_curve::LinearCurve::new(&config.token_config().curve)?;

    let quote = match (units, deposit) {
        (Some(units), _) => serde_json::json!({
            "supply": supply,
            "units": units,
            "cost": curve.cost_to_buy(supply, units),
            "next_unit_price": curve.next_unit_price(supply + units),
        }),
        (None, Some(deposit)) => {
            let deposit: Amount = deposit.parse()?;
            let units = curve.units_for_deposit(supply, &deposit)?;
            let cost = curve.cost_to_buy(supply, units);
            serde_json::json!({
                "supply": supply,
                "deposit": deposit,
                "units": units,
                "cost": cost,
                "exact": cost == deposit,
            })
        }
        (None, None) => anyhow::bail!("either --units or --deposit is required"),
    };

    println!("{}", serde_json::to_string_pretty(&quote)?);
    Ok(())
}

fn run_script(config_path: &Path, script_path: &Path) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from {}", config_path.display());
    let config = NodeConfig::from_file(config_path)?;
    let script: Vec<Transaction> = serde_json::from_str(&std::fs::read_to_string(script_path)?)?;

    let mut runtime = Runtime::new(&config)?;
    tracing::info!("Executing {} transactions", script.len());

    for tx in script {
        let receipt = runtime.execute(tx)?;
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    }

    runtime.check_invariants()?;
    println!("{}", serde_json::to_string_pretty(&runtime.summary()?)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::ExecutionStatus;

    #[test]
    fn test_sample_script_runs_against_default_config() {
        let config = NodeConfig::default();
        let mut runtime = Runtime::new(&config).unwrap();

        let statuses: Vec<_> = sample_script(&config)
            .into_iter()
            .map(|tx| runtime.execute(tx).unwrap().status)
            .collect();
        assert_eq!(
            statuses,
            vec![ExecutionStatus::Success, ExecutionStatus::Success, ExecutionStatus::Reverted]
        );
        assert_eq!(runtime.token().supply_units(), 7);
        runtime.check_invariants().unwrap();
    }
}
