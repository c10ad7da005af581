//! SDK configuration.

use std::time::Duration;

/// Passphrase of the Stellar public network.
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
/// Passphrase of the Stellar test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Well-known networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Public,
    Testnet,
}

impl Network {
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Public => PUBLIC_PASSPHRASE,
            Network::Testnet => TESTNET_PASSPHRASE,
        }
    }
}

/// Configuration for [`SorobanDomainsSdk`](crate::SorobanDomainsSdk).
///
/// Fixed once the SDK is constructed.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Soroban RPC endpoint URL.
    pub rpc_url: String,
    /// Network passphrase the transactions are built for.
    pub network_passphrase: String,
    /// Throwaway `G…` account used as the source of read-only simulations.
    pub simulation_account: String,
    /// Naming ("vaults") contract, `C…`. Only needed by `search_domain`.
    pub vaults_contract_id: Option<String>,
    /// Key/value database contract, `C…`. Only needed by the storage operations.
    pub values_database_contract_id: Option<String>,
    /// Base fee in stroops.
    pub default_fee: u32,
    /// Transaction validity window in seconds. 0 leaves the upper time bound open.
    pub default_timeout: u64,
    /// HTTP request timeout for the RPC client.
    pub http_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            simulation_account: String::new(),
            vaults_contract_id: None,
            values_database_contract_id: None,
            default_fee: 100,
            default_timeout: 0,
            http_timeout: Duration::from_secs(10),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl SdkConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let var = |name: &str| std::env::var(name).ok().and_then(non_blank);

        if let Some(url) = var("SOROBAN_DOMAINS_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(passphrase) = var("SOROBAN_DOMAINS_NETWORK_PASSPHRASE") {
            config.network_passphrase = passphrase;
        }
        if let Some(account) = var("SOROBAN_DOMAINS_SIMULATION_ACCOUNT") {
            config.simulation_account = account;
        }
        config.vaults_contract_id = var("SOROBAN_DOMAINS_VAULTS_CONTRACT");
        config.values_database_contract_id = var("SOROBAN_DOMAINS_VALUESDB_CONTRACT");
        if let Some(fee) = var("SOROBAN_DOMAINS_DEFAULT_FEE") {
            match fee.parse::<u32>() {
                Ok(v) => config.default_fee = v,
                Err(e) => tracing::warn!(error = %e, fee, "ignoring invalid default fee"),
            }
        }
        if let Some(secs) = var("SOROBAN_DOMAINS_DEFAULT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(v) => config.default_timeout = v,
                Err(e) => tracing::warn!(error = %e, secs, "ignoring invalid default timeout"),
            }
        }

        config
    }

    pub fn with_network(mut self, network: Network) -> Self {
        self.network_passphrase = network.passphrase().to_string();
        self
    }
}
