//! Strkey (`G…` account / `C…` contract) conversions to and from XDR addresses.

use stellar_xdr::curr::{
    AccountId, ContractId, Hash, MuxedAccount, PublicKey, ScAddress, Uint256,
};

use crate::error::{SdkError, SdkResult};

/// Decode a `G…` account strkey into its raw Ed25519 key.
pub fn account_key(account: &str) -> SdkResult<[u8; 32]> {
    stellar_strkey::ed25519::PublicKey::from_string(account.trim())
        .map(|pk| pk.0)
        .map_err(|e| SdkError::InvalidAddress(format!("{account}: {e:?}")))
}

/// Decode a `C…` contract strkey into its raw contract hash.
pub fn contract_hash(contract: &str) -> SdkResult<[u8; 32]> {
    stellar_strkey::Contract::from_string(contract.trim())
        .map(|c| c.0)
        .map_err(|e| SdkError::InvalidAddress(format!("{contract}: {e:?}")))
}

pub fn account_id(account: &str) -> SdkResult<AccountId> {
    Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
        account_key(account)?,
    ))))
}

pub fn muxed_account(account: &str) -> SdkResult<MuxedAccount> {
    Ok(MuxedAccount::Ed25519(Uint256(account_key(account)?)))
}

pub fn contract_address(contract: &str) -> SdkResult<ScAddress> {
    Ok(ScAddress::Contract(ContractId(Hash(contract_hash(contract)?))))
}

/// Render an on-chain address as its strkey.
pub fn render_address(address: &ScAddress) -> SdkResult<String> {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))) => {
            Ok(stellar_strkey::ed25519::PublicKey(*key).to_string())
        }
        ScAddress::Contract(ContractId(Hash(hash))) => {
            Ok(stellar_strkey::Contract(*hash).to_string())
        }
        other => Err(SdkError::InvalidResponse(format!(
            "unsupported address kind {}",
            other.name()
        ))),
    }
}
