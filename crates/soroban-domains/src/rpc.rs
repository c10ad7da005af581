//! Soroban RPC access: the seam between the SDK and the network.
//!
//! The SDK needs exactly two things from a ledger node: the current sequence
//! number of an account, and a simulation of an unsigned transaction. Both sit
//! behind [`LedgerRpc`] so the resolver and storage operations can be driven
//! by [`MockLedgerRpc`] in tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stellar_xdr::curr::{
    LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, ReadXdr, ScVal,
    SorobanAuthorizationEntry, SorobanTransactionData, TransactionEnvelope, WriteXdr,
};

use crate::address::account_id;
use crate::config::SdkConfig;
use crate::error::{SdkError, SdkResult};

pub type RpcFuture<'a, T> = Pin<Box<dyn Future<Output = SdkResult<T>> + Send + 'a>>;

/// An account snapshot, enough to sequence a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,
    pub sequence: i64,
}

// =============================================================================
// Simulation results
// =============================================================================

/// Result of `simulateTransaction`, as returned by the RPC node.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Base64 `SorobanTransactionData` (footprint and resources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_data: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_resource_fee: Option<u64>,
    #[serde(default)]
    pub results: Vec<SimulateHostFunctionResult>,
    /// Present when archived entries must be restored before the call can succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_preamble: Option<RestorePreamble>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulateHostFunctionResult {
    /// Base64 `SorobanAuthorizationEntry` list.
    #[serde(default)]
    pub auth: Vec<String>,
    /// Base64 `ScVal` return value.
    pub xdr: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    pub transaction_data: String,
    #[serde_as(as = "DisplayFromStr")]
    pub min_resource_fee: u64,
}

impl SimulateTransactionResponse {
    /// Turn a reported simulation error into [`SdkError::Simulation`], verbatim.
    pub fn into_success(self) -> SdkResult<Self> {
        match self.error {
            Some(message) => Err(SdkError::Simulation(message)),
            None => Ok(self),
        }
    }

    /// The invoked function's return value; `Void` when the node returned none.
    pub fn return_value(&self) -> SdkResult<ScVal> {
        match self.results.first() {
            Some(result) => Ok(ScVal::from_xdr(base64::decode(&result.xdr)?, Limits::none())?),
            None => Ok(ScVal::Void),
        }
    }

    pub fn soroban_data(&self) -> SdkResult<Option<SorobanTransactionData>> {
        self.transaction_data
            .as_deref()
            .map(|b64| -> SdkResult<SorobanTransactionData> {
                Ok(SorobanTransactionData::from_xdr(
                    base64::decode(b64)?,
                    Limits::none(),
                )?)
            })
            .transpose()
    }

    /// Authorization entries the invocation needs, from the first result.
    pub fn auth(&self) -> SdkResult<Vec<SorobanAuthorizationEntry>> {
        let Some(result) = self.results.first() else {
            return Ok(Vec::new());
        };
        result
            .auth
            .iter()
            .map(|b64| -> SdkResult<SorobanAuthorizationEntry> {
                Ok(SorobanAuthorizationEntry::from_xdr(
                    base64::decode(b64)?,
                    Limits::none(),
                )?)
            })
            .collect()
    }
}

// =============================================================================
// Trait: LedgerRpc
// =============================================================================

/// Abstraction over a Soroban RPC node for testability.
pub trait LedgerRpc: Send + Sync + 'static {
    /// Fetch the account's current sequence number.
    fn get_account(&self, account: &str) -> RpcFuture<'_, Account>;

    /// Simulate an unsigned transaction against current ledger state.
    fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> RpcFuture<'_, SimulateTransactionResponse>;
}

// =============================================================================
// Production: SorobanRpcClient
// =============================================================================

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct GetLedgerEntriesParams {
    keys: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetLedgerEntriesResponse {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Deserialize)]
struct LedgerEntryResult {
    /// Base64 `LedgerEntryData`.
    xdr: String,
}

#[derive(Serialize)]
struct SimulateTransactionParams {
    transaction: String,
}

/// JSON-RPC 2.0 client for a Soroban RPC endpoint.
pub struct SorobanRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl SorobanRpcClient {
    pub fn new(config: &SdkConfig) -> SdkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            client,
            url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<P, R>(&self, method: &str, params: P) -> SdkResult<R>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::debug!(method, url = %self.url, "Soroban RPC request");

        let response: JsonRpcResponse<R> = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(JsonRpcError { code, message }) = response.error {
            return Err(SdkError::Rpc { code, message });
        }
        response
            .result
            .ok_or_else(|| SdkError::InvalidResponse(format!("{method}: empty result")))
    }
}

impl LedgerRpc for SorobanRpcClient {
    fn get_account(&self, account: &str) -> RpcFuture<'_, Account> {
        let account = account.to_string();
        Box::pin(async move {
            let key = LedgerKey::Account(LedgerKeyAccount {
                account_id: account_id(&account)?,
            });
            let params = GetLedgerEntriesParams {
                keys: vec![base64::encode(key.to_xdr(Limits::none())?)],
            };
            let response: GetLedgerEntriesResponse =
                self.call("getLedgerEntries", params).await?;

            let entry = response
                .entries
                .unwrap_or_default()
                .into_iter()
                .next()
                .ok_or_else(|| SdkError::AccountNotFound(account.clone()))?;
            match LedgerEntryData::from_xdr(base64::decode(&entry.xdr)?, Limits::none())? {
                LedgerEntryData::Account(entry) => Ok(Account {
                    account_id: account,
                    sequence: entry.seq_num.0,
                }),
                other => Err(SdkError::InvalidResponse(format!(
                    "expected account entry, got {}",
                    other.name()
                ))),
            }
        })
    }

    fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> RpcFuture<'_, SimulateTransactionResponse> {
        let encoded = envelope.to_xdr(Limits::none()).map(base64::encode);
        Box::pin(async move {
            let params = SimulateTransactionParams {
                transaction: encoded?,
            };
            self.call("simulateTransaction", params).await
        })
    }
}

// =============================================================================
// Mock: MockLedgerRpc (test / testing feature)
// =============================================================================

#[cfg(any(test, feature = "testing"))]
pub use mock::{simulation_returning, MockLedgerRpc};

#[cfg(any(test, feature = "testing"))]
mod mock {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use stellar_xdr::curr::{
        LedgerFootprint, Limits, ScVal, SorobanResources, SorobanTransactionData,
        SorobanTransactionDataExt, TransactionEnvelope, VecM, WriteXdr,
    };

    use super::{
        Account, LedgerRpc, RpcFuture, SimulateHostFunctionResult, SimulateTransactionResponse,
    };
    use crate::error::SdkError;

    /// A successful simulation whose invocation returned `value`.
    pub fn simulation_returning(value: &ScVal) -> SimulateTransactionResponse {
        let data = SorobanTransactionData {
            ext: SorobanTransactionDataExt::V0,
            resources: SorobanResources {
                footprint: LedgerFootprint {
                    read_only: VecM::default(),
                    read_write: VecM::default(),
                },
                instructions: 1_000,
                disk_read_bytes: 0,
                write_bytes: 0,
            },
            resource_fee: 5_000,
        };
        SimulateTransactionResponse {
            latest_ledger: 1_000,
            transaction_data: Some(base64::encode(
                data.to_xdr(Limits::none()).expect("encode transaction data"),
            )),
            min_resource_fee: Some(5_000),
            results: vec![SimulateHostFunctionResult {
                auth: Vec::new(),
                xdr: base64::encode(value.to_xdr(Limits::none()).expect("encode return value")),
            }],
            ..Default::default()
        }
    }

    /// In-memory [`LedgerRpc`] that replays queued simulations and records what it saw.
    pub struct MockLedgerRpc {
        sequence: i64,
        responses: Mutex<VecDeque<SimulateTransactionResponse>>,
        simulated: Mutex<Vec<TransactionEnvelope>>,
        account_calls: AtomicUsize,
        simulate_calls: AtomicUsize,
        /// Whether account lookups should fail.
        pub should_fail: bool,
    }

    impl Default for MockLedgerRpc {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockLedgerRpc {
        pub fn new() -> Self {
            Self {
                sequence: 41,
                responses: Mutex::new(VecDeque::new()),
                simulated: Mutex::new(Vec::new()),
                account_calls: AtomicUsize::new(0),
                simulate_calls: AtomicUsize::new(0),
                should_fail: false,
            }
        }

        /// A mock whose next simulation returns `value`.
        pub fn returning(value: &ScVal) -> Self {
            let mock = Self::new();
            mock.push_response(simulation_returning(value));
            mock
        }

        /// A mock whose next simulation reports `message` as its error.
        pub fn failing_simulation(message: &str) -> Self {
            let mock = Self::new();
            mock.push_response(SimulateTransactionResponse {
                error: Some(message.to_string()),
                ..Default::default()
            });
            mock
        }

        pub fn failing() -> Self {
            Self {
                should_fail: true,
                ..Self::new()
            }
        }

        pub fn push_response(&self, response: SimulateTransactionResponse) {
            self.responses.lock().push_back(response);
        }

        pub fn account_calls(&self) -> usize {
            self.account_calls.load(Ordering::SeqCst)
        }

        pub fn simulate_calls(&self) -> usize {
            self.simulate_calls.load(Ordering::SeqCst)
        }

        /// Total number of round trips attempted.
        pub fn calls(&self) -> usize {
            self.account_calls() + self.simulate_calls()
        }

        /// Every envelope passed to `simulate_transaction`, oldest first.
        pub fn simulated(&self) -> Vec<TransactionEnvelope> {
            self.simulated.lock().clone()
        }
    }

    impl LedgerRpc for MockLedgerRpc {
        fn get_account(&self, account: &str) -> RpcFuture<'_, Account> {
            self.account_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                let account = account.to_string();
                return Box::pin(async move { Err(SdkError::AccountNotFound(account)) });
            }
            let account = Account {
                account_id: account.to_string(),
                sequence: self.sequence,
            };
            Box::pin(async move { Ok(account) })
        }

        fn simulate_transaction(
            &self,
            envelope: &TransactionEnvelope,
        ) -> RpcFuture<'_, SimulateTransactionResponse> {
            self.simulate_calls.fetch_add(1, Ordering::SeqCst);
            self.simulated.lock().push(envelope.clone());
            let response = self
                .responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| simulation_returning(&ScVal::Void));
            Box::pin(async move { Ok(response) })
        }
    }
}
