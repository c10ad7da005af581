//! Client SDK for Soroban Domains.
//!
//! Resolves `.xlm` names and sub-domains to their on-chain records, and reads
//! or prepares writes of the key/value data attached to a domain.
//!
//! ```no_run
//! use soroban_domains::{SdkConfig, SorobanDomainsSdk};
//!
//! # async fn run() -> Result<(), soroban_domains::SdkError> {
//! let sdk = SorobanDomainsSdk::connect(SdkConfig::from_env())?;
//! let record = sdk.search_domain("example", None).await?;
//! println!("{}", record.address());
//! # Ok(())
//! # }
//! ```
//!
//! Writes are never signed or submitted here: [`SorobanDomainsSdk::set_domain_data`]
//! and [`SorobanDomainsSdk::remove_domain_data`] return an [`AssembledTransaction`]
//! for the caller's wallet.

pub mod address;
pub mod config;
pub mod error;
pub mod node;
pub mod record;
pub mod rpc;
pub mod sdk;
pub mod transaction;
pub mod value;

pub use config::{Network, SdkConfig};
pub use error::{SdkError, SdkResult};
pub use node::{derive_node, parse_domain};
pub use record::{DomainRecord, Record, RecordKey, SubDomainRecord};
pub use rpc::{Account, LedgerRpc, SimulateTransactionResponse, SorobanRpcClient};
pub use sdk::SorobanDomainsSdk;
pub use transaction::AssembledTransaction;
pub use value::StorageValue;
