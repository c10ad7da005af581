//! Node derivation for domains and sub-domains.
//!
//! A node is the 32-byte key the naming contract stores a record under:
//!
//! ```text
//! node(domain)         = K( K("xlm")  || K(domain) )
//! node(domain, sub)    = K( K(parent) || K(sub) )      where parent = node(domain)
//! ```
//!
//! `K` is Keccak-256 and `||` means the two digests are fed to one hasher as two
//! successive updates. The root label `"xlm"` is fixed by the deployed contract.

use sha3::{Digest, Keccak256};

use crate::error::{SdkError, SdkResult};

/// Label every top-level domain is committed under.
const ROOT_LABEL: &[u8] = b"xlm";

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// One level of the commitment: `K(K-seeded prefix || K(label))`.
fn commit(prefix_digest: &[u8; 32], label: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(prefix_digest);
    hasher.update(keccak256(label));
    hasher.finalize().into()
}

/// Raw 32-byte node for a domain, optionally descending into a sub-domain.
pub fn derive_node_bytes(domain: &str, sub_domain: Option<&str>) -> [u8; 32] {
    let root = commit(&keccak256(ROOT_LABEL), domain.as_bytes());
    match sub_domain {
        None => root,
        Some(sub) => commit(&keccak256(&root), sub.as_bytes()),
    }
}

/// Lowercase hex (64 chars, no prefix) node for a domain and optional sub-domain.
///
/// Any input, including the empty string, yields a digest; names are not validated.
pub fn derive_node(domain: &str, sub_domain: Option<&str>) -> String {
    hex::encode(derive_node_bytes(domain, sub_domain))
}

/// Alias kept for callers used to the `parseDomain` name of other SDKs.
pub fn parse_domain(domain: &str, sub_domain: Option<&str>) -> String {
    derive_node(domain, sub_domain)
}

/// Decode a hex node back into its 32 bytes.
pub fn node_from_hex(node: &str) -> SdkResult<[u8; 32]> {
    let bytes = hex::decode(node.trim()).map_err(|e| SdkError::InvalidNode(e.to_string()))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        SdkError::InvalidNode(format!("expected 32 bytes, got {}", b.len()))
    })
}
