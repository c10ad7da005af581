//! `sdomains`: resolve Soroban Domains names and prepare key/value writes from the shell.

use anyhow::Context;
use clap::{Parser, Subcommand};
use soroban_domains::{
    derive_node, AssembledTransaction, SdkConfig, SorobanDomainsSdk, StorageValue,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Soroban RPC endpoint
    #[arg(long, env = "SOROBAN_DOMAINS_RPC_URL", global = true)]
    rpc_url: Option<String>,
    /// Network passphrase
    #[arg(long, env = "SOROBAN_DOMAINS_NETWORK_PASSPHRASE", global = true)]
    network_passphrase: Option<String>,
    /// Account used as the source of read-only simulations
    #[arg(long, env = "SOROBAN_DOMAINS_SIMULATION_ACCOUNT", global = true)]
    simulation_account: Option<String>,
    /// Naming (vaults) contract id
    #[arg(long, env = "SOROBAN_DOMAINS_VAULTS_CONTRACT", global = true)]
    vaults_contract: Option<String>,
    /// Key/value database contract id
    #[arg(long, env = "SOROBAN_DOMAINS_VALUESDB_CONTRACT", global = true)]
    valuesdb_contract: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node of a domain or sub-domain
    Node {
        domain: String,
        #[arg(long)]
        sub: Option<String>,
    },
    /// Print the record of a domain or sub-domain as JSON
    Search {
        domain: String,
        #[arg(long)]
        sub: Option<String>,
    },
    /// Print the value stored under a key as JSON
    Get { node: String, key: String },
    /// Print an unsigned transaction storing a value under a key
    Set {
        node: String,
        key: String,
        /// Bytes (hex), Number or String
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        value: String,
        #[arg(long)]
        source: String,
    },
    /// Print an unsigned transaction removing a key
    Remove {
        node: String,
        key: String,
        #[arg(long)]
        source: String,
    },
}

impl Cli {
    fn config(&self) -> SdkConfig {
        let mut config = SdkConfig::from_env();
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(passphrase) = &self.network_passphrase {
            config.network_passphrase = passphrase.clone();
        }
        if let Some(account) = &self.simulation_account {
            config.simulation_account = account.clone();
        }
        if self.vaults_contract.is_some() {
            config.vaults_contract_id = self.vaults_contract.clone();
        }
        if self.valuesdb_contract.is_some() {
            config.values_database_contract_id = self.valuesdb_contract.clone();
        }
        config
    }
}

fn print_assembled(sdk: &SorobanDomainsSdk, assembled: &AssembledTransaction) -> anyhow::Result<()> {
    let hash = assembled.hash(&sdk.config().network_passphrase)?;
    let output = serde_json::json!({
        "xdr": assembled.to_xdr_base64()?,
        "hash": hex::encode(hash),
        "needs_restore": assembled.needs_restore(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soroban_domains=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    let connect =
        || SorobanDomainsSdk::connect(config.clone()).context("failed to create RPC client");

    match cli.command {
        Command::Node { domain, sub } => {
            println!("{}", derive_node(&domain, sub.as_deref()));
        }
        Command::Search { domain, sub } => {
            let record = connect()?.search_domain(&domain, sub.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Get { node, key } => {
            let value = connect()?.get_domain_data(&node, &key).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Set {
            node,
            key,
            kind,
            value,
            source,
        } => {
            let value = StorageValue::try_from(serde_json::json!({"type": kind, "value": value}))?;
            let sdk = connect()?;
            let assembled = sdk.set_domain_data(&node, &key, value, &source).await?;
            print_assembled(&sdk, &assembled)?;
        }
        Command::Remove { node, key, source } => {
            let sdk = connect()?;
            let assembled = sdk.remove_domain_data(&node, &key, &source).await?;
            print_assembled(&sdk, &assembled)?;
        }
    }

    Ok(())
}
