//! Building, assembling and hashing contract-invocation transactions.
//!
//! Transactions leave the SDK unsigned. Reads stop at simulation; writes are
//! assembled with the simulation's resource footprint and handed back to the
//! caller to sign and submit.

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, Operation,
    OperationBody, Preconditions, ScSymbol, ScVal, SequenceNumber, StringM, TimeBounds, TimePoint,
    Transaction, TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, VecM, WriteXdr,
};

use crate::address::{contract_address, muxed_account};
use crate::error::{SdkError, SdkResult};
use crate::rpc::{Account, SimulateTransactionResponse};

/// SHA-256 of the network passphrase, the domain every signature is bound to.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Validity window for a new transaction.
///
/// A `max_time` of 0 is "no upper bound" on Stellar, so a zero timeout leaves the
/// transaction valid until its sequence number is consumed.
pub fn time_bounds(timeout_secs: u64) -> TimeBounds {
    let max_time = if timeout_secs == 0 {
        0
    } else {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        now.saturating_add(timeout_secs)
    };
    TimeBounds {
        min_time: TimePoint(0),
        max_time: TimePoint(max_time),
    }
}

/// Builds single-operation `InvokeContract` transactions for one source account.
#[derive(Debug, Clone)]
pub struct TransactionBuilder<'a> {
    source: &'a Account,
    fee: u32,
    timeout_secs: u64,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(source: &'a Account, fee: u32) -> Self {
        Self {
            source,
            fee,
            timeout_secs: 0,
        }
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn invoke_contract(
        &self,
        contract: &str,
        function: &str,
        args: Vec<ScVal>,
    ) -> SdkResult<TransactionEnvelope> {
        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: contract_address(contract)?,
                    function_name: ScSymbol(StringM::try_from(function)?),
                    args: args.try_into()?,
                }),
                auth: VecM::default(),
            }),
        };

        let tx = Transaction {
            source_account: muxed_account(&self.source.account_id)?,
            fee: self.fee,
            seq_num: SequenceNumber(self.source.sequence + 1),
            cond: Preconditions::Time(time_bounds(self.timeout_secs)),
            memo: Memo::None,
            operations: vec![operation].try_into()?,
            ext: TransactionExt::V0,
        };

        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx,
            signatures: VecM::default(),
        }))
    }
}

/// The contract invocation carried by a transaction built here, if any.
pub fn invocation(envelope: &TransactionEnvelope) -> Option<&InvokeContractArgs> {
    let TransactionEnvelope::Tx(v1) = envelope else {
        return None;
    };
    v1.tx.operations.iter().find_map(|op| match &op.body {
        OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(args),
            ..
        }) => Some(args),
        _ => None,
    })
}

/// Fold a successful simulation into the transaction: resource data, the
/// resource fee on top of the base fee, and authorization entries.
pub fn assemble(
    envelope: TransactionEnvelope,
    simulation: &SimulateTransactionResponse,
) -> SdkResult<TransactionEnvelope> {
    let TransactionEnvelope::Tx(TransactionV1Envelope { mut tx, signatures }) = envelope else {
        return Err(SdkError::InvalidResponse(
            "only v1 transaction envelopes can be assembled".into(),
        ));
    };

    let data = simulation.soroban_data()?.ok_or_else(|| {
        SdkError::InvalidResponse("simulation returned no transaction data".into())
    })?;
    let resource_fee = simulation.min_resource_fee.unwrap_or_default();
    tx.fee = u32::try_from(u64::from(tx.fee).saturating_add(resource_fee)).unwrap_or(u32::MAX);
    tx.ext = TransactionExt::V1(data);

    let auth = simulation.auth()?;
    if !auth.is_empty() {
        let mut operations = tx.operations.to_vec();
        for op in &mut operations {
            if let OperationBody::InvokeHostFunction(invoke) = &mut op.body {
                if invoke.auth.is_empty() {
                    invoke.auth = auth.clone().try_into()?;
                }
            }
        }
        tx.operations = operations.try_into()?;
    }

    Ok(TransactionEnvelope::Tx(TransactionV1Envelope { tx, signatures }))
}

/// Hash a transaction must be signed over on the given network.
pub fn transaction_hash(
    envelope: &TransactionEnvelope,
    network_passphrase: &str,
) -> SdkResult<[u8; 32]> {
    let TransactionEnvelope::Tx(v1) = envelope else {
        return Err(SdkError::InvalidResponse(
            "only v1 transaction envelopes are hashed".into(),
        ));
    };
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(network_passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(v1.tx.clone()),
    };
    Ok(Sha256::digest(payload.to_xdr(Limits::none())?).into())
}

/// An unsigned transaction ready for signing, with the simulation it was assembled from.
#[derive(Debug, Clone)]
pub struct AssembledTransaction {
    pub envelope: TransactionEnvelope,
    pub simulation: SimulateTransactionResponse,
}

impl AssembledTransaction {
    pub fn to_xdr_base64(&self) -> SdkResult<String> {
        Ok(base64::encode(self.envelope.to_xdr(Limits::none())?))
    }

    /// Signature hash on the network identified by `network_passphrase`.
    pub fn hash(&self, network_passphrase: &str) -> SdkResult<[u8; 32]> {
        transaction_hash(&self.envelope, network_passphrase)
    }

    /// Whether archived ledger entries must be restored before submission.
    pub fn needs_restore(&self) -> bool {
        self.simulation.restore_preamble.is_some()
    }
}
