//! The SDK entry point: domain resolution and key/value storage operations.

use stellar_xdr::curr::ScVal;

use crate::config::SdkConfig;
use crate::error::{SdkError, SdkResult};
use crate::node::{derive_node, derive_node_bytes, node_from_hex};
use crate::record::{decode_record, Record, RecordKey};
use crate::rpc::{Account, LedgerRpc, SorobanRpcClient};
use crate::transaction::{assemble, AssembledTransaction, TransactionBuilder};
use crate::value::{decode_value, encode_value, sc_bytes, sc_symbol, StorageValue};

/// Client for the Soroban Domains naming and key/value contracts.
///
/// Holds only immutable configuration and an RPC handle, so one instance can
/// serve concurrent calls; every call builds its own transaction.
pub struct SorobanDomainsSdk<R = SorobanRpcClient> {
    config: SdkConfig,
    rpc: R,
}

impl SorobanDomainsSdk<SorobanRpcClient> {
    /// Build an SDK talking JSON-RPC to `config.rpc_url`.
    pub fn connect(config: SdkConfig) -> SdkResult<Self> {
        let rpc = SorobanRpcClient::new(&config)?;
        Ok(Self::new(config, rpc))
    }
}

impl<R: LedgerRpc> SorobanDomainsSdk<R> {
    pub fn new(config: SdkConfig, rpc: R) -> Self {
        Self { config, rpc }
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Node of a domain, or of a sub-domain under it.
    pub fn parse_domain(&self, domain: &str, sub_domain: Option<&str>) -> String {
        derive_node(domain, sub_domain)
    }

    /// Look up the record of a domain or sub-domain.
    ///
    /// Read-only: the call is simulated from the configured simulation account
    /// and never submitted.
    pub async fn search_domain(&self, domain: &str, sub_domain: Option<&str>) -> SdkResult<Record> {
        let contract = self.vaults_contract()?;
        let node = derive_node_bytes(domain, sub_domain);
        let key = RecordKey::for_lookup(sub_domain).to_sc_val(&node)?;

        let value = self.simulate_read(contract, "record", vec![key]).await?;
        decode_record(&value)
    }

    /// Read the value stored under `key` for a domain node.
    pub async fn get_domain_data(&self, node: &str, key: &str) -> SdkResult<StorageValue> {
        let contract = self.values_contract()?;
        let args = vec![sc_bytes(&node_from_hex(node)?)?, sc_symbol(key)?];

        let value = self.simulate_read(contract, "get", args).await?;
        decode_value(&value)
    }

    /// Prepare an unsigned transaction storing `value` under `key`, paid for by `source`.
    pub async fn set_domain_data<V>(
        &self,
        node: &str,
        key: &str,
        value: V,
        source: &str,
    ) -> SdkResult<AssembledTransaction>
    where
        V: TryInto<StorageValue>,
        SdkError: From<V::Error>,
    {
        let contract = self.values_contract()?;
        let value: StorageValue = value.try_into()?;
        let args = vec![
            sc_bytes(&node_from_hex(node)?)?,
            sc_symbol(key)?,
            encode_value(&value)?,
        ];

        self.prepare_write(contract, "set", args, source).await
    }

    /// Prepare an unsigned transaction deleting `key`, paid for by `source`.
    pub async fn remove_domain_data(
        &self,
        node: &str,
        key: &str,
        source: &str,
    ) -> SdkResult<AssembledTransaction> {
        let contract = self.values_contract()?;
        let args = vec![sc_bytes(&node_from_hex(node)?)?, sc_symbol(key)?];

        self.prepare_write(contract, "remove", args, source).await
    }

    fn vaults_contract(&self) -> SdkResult<&str> {
        self.config
            .vaults_contract_id
            .as_deref()
            .ok_or(SdkError::ConfigurationMissing("vaults contract id"))
    }

    fn values_contract(&self) -> SdkResult<&str> {
        self.config
            .values_database_contract_id
            .as_deref()
            .ok_or(SdkError::ConfigurationMissing("values database contract id"))
    }

    fn builder<'a>(&self, source: &'a Account) -> TransactionBuilder<'a> {
        TransactionBuilder::new(source, self.config.default_fee)
            .timeout(self.config.default_timeout)
    }

    async fn simulate_read(
        &self,
        contract: &str,
        function: &str,
        args: Vec<ScVal>,
    ) -> SdkResult<ScVal> {
        let account = self.rpc.get_account(&self.config.simulation_account).await?;
        let envelope = self.builder(&account).invoke_contract(contract, function, args)?;

        tracing::debug!(contract, function, "Simulating read-only call");
        let simulation = self
            .rpc
            .simulate_transaction(&envelope)
            .await?
            .into_success()
            .inspect_err(|e| tracing::debug!(contract, function, error = %e, "Simulation failed"))?;
        simulation.return_value()
    }

    async fn prepare_write(
        &self,
        contract: &str,
        function: &str,
        args: Vec<ScVal>,
        source: &str,
    ) -> SdkResult<AssembledTransaction> {
        let account = self.rpc.get_account(source).await?;
        let envelope = self.builder(&account).invoke_contract(contract, function, args)?;

        tracing::debug!(contract, function, source, "Simulating write");
        let simulation = self
            .rpc
            .simulate_transaction(&envelope)
            .await?
            .into_success()?;

        if let Some(preamble) = &simulation.restore_preamble {
            tracing::warn!(
                contract,
                function,
                min_resource_fee = preamble.min_resource_fee,
                "Archived entries must be restored before this transaction can succeed"
            );
        }

        let envelope = assemble(envelope, &simulation)?;
        Ok(AssembledTransaction {
            envelope,
            simulation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{domain_response, sub_domain_response};
    use crate::rpc::{simulation_returning, MockLedgerRpc};
    use crate::transaction::invocation;
    use crate::value::split_tagged;
    use serde_json::json;
    use stellar_xdr::curr::{TransactionEnvelope, TransactionExt};
    use testresult::TestResult;

    const SIM_ACCOUNT: &str = "GAAZI4TCR3TY5OJHCTJC2A4QSY6CJWJH5IAJTGKIN2ER7LBNVKOCCWN7";
    const SOURCE: &str = "GADQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOBYHA4DQOZPI";
    const VAULTS: &str = "CAAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQC526";
    const VALUES_DB: &str = "CABAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAFNSZ";

    fn config() -> SdkConfig {
        SdkConfig {
            rpc_url: "http://localhost:8000/soroban/rpc".to_string(),
            simulation_account: SIM_ACCOUNT.to_string(),
            vaults_contract_id: Some(VAULTS.to_string()),
            values_database_contract_id: Some(VALUES_DB.to_string()),
            ..Default::default()
        }
    }

    fn sdk(rpc: MockLedgerRpc) -> SorobanDomainsSdk<MockLedgerRpc> {
        SorobanDomainsSdk::new(config(), rpc)
    }

    fn node() -> String {
        derive_node("example", None)
    }

    /// Name and arguments of the single invocation the mock simulated.
    fn simulated_call(rpc: &MockLedgerRpc) -> (String, Vec<ScVal>) {
        let envelopes = rpc.simulated();
        assert_eq!(envelopes.len(), 1);
        let args = invocation(&envelopes[0]).expect("invoke contract op");
        let name: &[u8] = args.function_name.as_ref();
        (String::from_utf8_lossy(name).into_owned(), args.args.to_vec())
    }

    // =========================================================================
    // search_domain
    // =========================================================================

    #[tokio::test]
    async fn test_search_domain_returns_domain() -> TestResult {
        let node = derive_node_bytes("example", None);
        let sdk = sdk(MockLedgerRpc::returning(&domain_response(node)));

        let record = sdk.search_domain("example", None).await?;
        let Record::Domain(domain) = record else {
            panic!("expected Domain variant");
        };
        assert_eq!(domain.node, hex::encode(node));
        assert_eq!(domain.exp_date, "1767225600");
        assert_eq!(domain.collateral, "18446744073709551621");

        let (function, args) = simulated_call(sdk.rpc());
        assert_eq!(function, "record");
        assert_eq!(args, vec![RecordKey::Record.to_sc_val(&node)?]);
        assert_eq!(sdk.rpc().account_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_sub_domain_uses_sub_record_key() -> TestResult {
        let parent = derive_node_bytes("example", None);
        let node = derive_node_bytes("example", Some("pay"));
        let sdk = sdk(MockLedgerRpc::returning(&sub_domain_response(node, parent)));

        let record = sdk.search_domain("example", Some("pay")).await?;
        assert!(matches!(&record, Record::SubDomain(sub) if sub.parent == hex::encode(parent)));
        assert_eq!(record.node(), hex::encode(node));

        let (_, args) = simulated_call(sdk.rpc());
        let (tag, _) = split_tagged(&args[0])?;
        assert_eq!(tag, "SubRecord");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_domain_not_found() {
        let sdk = sdk(MockLedgerRpc::returning(&ScVal::Void));
        let result = sdk.search_domain("unregistered", None).await;
        assert!(matches!(result, Err(SdkError::DomainNotFound)));
    }

    #[tokio::test]
    async fn test_search_domain_simulation_error_verbatim() {
        let sdk = sdk(MockLedgerRpc::failing_simulation(
            "host invocation failed: Error(WasmVm, InvalidAction)",
        ));
        match sdk.search_domain("example", None).await {
            Err(SdkError::Simulation(message)) => {
                assert_eq!(message, "host invocation failed: Error(WasmVm, InvalidAction)")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_domain_requires_vaults_contract() {
        let config = SdkConfig {
            vaults_contract_id: None,
            ..config()
        };
        let sdk = SorobanDomainsSdk::new(config, MockLedgerRpc::new());

        let result = sdk.search_domain("example", None).await;
        assert!(matches!(result, Err(SdkError::ConfigurationMissing(_))));
        assert_eq!(sdk.rpc().calls(), 0);
    }

    #[tokio::test]
    async fn test_account_lookup_failure_propagates() {
        let sdk = sdk(MockLedgerRpc::failing());
        let result = sdk.search_domain("example", None).await;
        assert!(matches!(result, Err(SdkError::AccountNotFound(_))));
        assert_eq!(sdk.rpc().simulate_calls(), 0);
    }

    // =========================================================================
    // Storage operations
    // =========================================================================

    #[tokio::test]
    async fn test_storage_requires_values_contract() {
        let config = SdkConfig {
            values_database_contract_id: None,
            ..config()
        };
        let sdk = SorobanDomainsSdk::new(config, MockLedgerRpc::new());
        let node = node();

        let get = sdk.get_domain_data(&node, "email").await;
        let set = sdk
            .set_domain_data(&node, "email", StorageValue::from("a@b.c"), SOURCE)
            .await;
        let remove = sdk.remove_domain_data(&node, "email", SOURCE).await;

        assert!(matches!(get, Err(SdkError::ConfigurationMissing(_))));
        assert!(matches!(set, Err(SdkError::ConfigurationMissing(_))));
        assert!(matches!(remove, Err(SdkError::ConfigurationMissing(_))));
        assert_eq!(sdk.rpc().calls(), 0);
    }

    #[tokio::test]
    async fn test_get_domain_data_not_found() {
        let sdk = sdk(MockLedgerRpc::returning(&ScVal::Void));
        let result = sdk.get_domain_data(&node(), "email").await;
        assert!(matches!(result, Err(SdkError::DomainDataNotFound)));
    }

    #[tokio::test]
    async fn test_get_domain_data_call_shape() -> TestResult {
        let stored = StorageValue::Number(-12);
        let sdk = sdk(MockLedgerRpc::returning(&encode_value(&stored)?));

        assert_eq!(sdk.get_domain_data(&node(), "age").await?, stored);
        let (function, args) = simulated_call(sdk.rpc());
        assert_eq!(function, "get");
        assert_eq!(
            args,
            vec![
                sc_bytes(&derive_node_bytes("example", None))?,
                sc_symbol("age")?
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_domain_data_rejects_bad_node() {
        let sdk = sdk(MockLedgerRpc::new());
        let result = sdk.get_domain_data("not-hex", "age").await;
        assert!(matches!(result, Err(SdkError::InvalidNode(_))));
        assert_eq!(sdk.rpc().calls(), 0);
    }

    #[tokio::test]
    async fn test_set_domain_data_echo_round_trip() -> TestResult {
        let values = [
            StorageValue::Bytes(vec![0, 1, 2, 254, 255]),
            StorageValue::Number(i128::MIN + 1),
            StorageValue::String("https://example.xlm".to_string()),
        ];

        for value in values {
            let writer = sdk(MockLedgerRpc::new());
            writer
                .set_domain_data(&node(), "profile", value.clone(), SOURCE)
                .await?;
            let (function, args) = simulated_call(writer.rpc());
            assert_eq!(function, "set");
            assert_eq!(args.len(), 3);

            // The contract hands back exactly what it was given.
            let reader = sdk(MockLedgerRpc::returning(&args[2]));
            assert_eq!(reader.get_domain_data(&node(), "profile").await?, value);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_set_domain_data_assembles_unsigned_transaction() -> TestResult {
        let sdk = sdk(MockLedgerRpc::returning(&ScVal::Void));
        let assembled = sdk
            .set_domain_data(&node(), "email", json!({"type": "String", "value": "a@b.c"}), SOURCE)
            .await?;

        let TransactionEnvelope::Tx(v1) = &assembled.envelope else {
            panic!("expected v1 envelope");
        };
        assert!(v1.signatures.is_empty());
        assert!(matches!(v1.tx.ext, TransactionExt::V1(_)));
        assert_eq!(v1.tx.fee, 100 + 5_000);
        assert_eq!(assembled.simulation.min_resource_fee, Some(5_000));
        assert!(assembled.to_xdr_base64().is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_domain_data_rejects_unsupported_type_before_rpc() {
        let sdk = sdk(MockLedgerRpc::new());
        let result = sdk
            .set_domain_data(&node(), "flag", json!({"type": "Boolean", "value": true}), SOURCE)
            .await;
        assert!(matches!(result, Err(SdkError::UnsupportedValueType(t)) if t == "Boolean"));
        assert_eq!(sdk.rpc().calls(), 0);
    }

    #[tokio::test]
    async fn test_set_domain_data_simulation_error() {
        let sdk = sdk(MockLedgerRpc::failing_simulation("Error(Auth, InvalidAction)"));
        let result = sdk
            .set_domain_data(&node(), "email", StorageValue::from("a@b.c"), SOURCE)
            .await;
        assert!(matches!(result, Err(SdkError::Simulation(m)) if m == "Error(Auth, InvalidAction)"));
    }

    #[tokio::test]
    async fn test_remove_domain_data() -> TestResult {
        let mut response = simulation_returning(&ScVal::Void);
        response.restore_preamble = Some(crate::rpc::RestorePreamble {
            transaction_data: response.transaction_data.clone().unwrap_or_default(),
            min_resource_fee: 200,
        });
        let rpc = MockLedgerRpc::new();
        rpc.push_response(response);
        let sdk = sdk(rpc);

        let assembled = sdk.remove_domain_data(&node(), "email", SOURCE).await?;
        assert!(assembled.needs_restore());

        let (function, args) = simulated_call(sdk.rpc());
        assert_eq!(function, "remove");
        assert_eq!(args.len(), 2);
        assert_eq!(sdk.rpc().account_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_parse_domain_matches_deriver() {
        let sdk = sdk(MockLedgerRpc::new());
        assert_eq!(
            sdk.parse_domain("example", Some("pay")),
            derive_node("example", Some("pay"))
        );
        assert_eq!(sdk.rpc().calls(), 0);
    }
}
