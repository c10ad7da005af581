//! Domain and sub-domain records returned by the naming contract's `record` entry point.
//!
//! The contract answers with an optional enum:
//!
//! ```text
//! Void                                                   no record
//! Vec[Symbol("Domain"),    Map{node, owner, address, exp_date, snapshot, collateral}]
//! Vec[Symbol("SubDomain"), Map{node, parent, address, snapshot}]
//! ```
//!
//! Record fields are rendered as strings: bytes as lowercase hex, addresses as
//! strkeys and integers in decimal, so 64/128-bit values cross JSON untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{ScMapEntry, ScVal, UInt128Parts};

use crate::address::render_address;
use crate::error::{SdkError, SdkResult};
use crate::value::{i128_from_parts, sc_bytes, sc_symbol, sc_vec, split_tagged};

/// Which lookup table of the naming contract a call addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKey {
    Record,
    SubRecord,
}

impl RecordKey {
    pub fn for_lookup(sub_domain: Option<&str>) -> Self {
        if sub_domain.is_some() {
            RecordKey::SubRecord
        } else {
            RecordKey::Record
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Record => "Record",
            RecordKey::SubRecord => "SubRecord",
        }
    }

    /// The `record` call argument: `Vec[Symbol(key), Bytes(node)]`.
    pub fn to_sc_val(&self, node: &[u8; 32]) -> SdkResult<ScVal> {
        sc_vec(vec![sc_symbol(self.as_str())?, sc_bytes(node)?])
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DomainRecord {
    pub node: String,
    pub owner: String,
    pub address: String,
    pub exp_date: String,
    pub snapshot: String,
    pub collateral: String,
}

/// A name under a parent domain. Expiration and collateral live on the parent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SubDomainRecord {
    pub node: String,
    pub parent: String,
    pub address: String,
    pub snapshot: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value")]
pub enum Record {
    Domain(DomainRecord),
    SubDomain(SubDomainRecord),
}

impl Record {
    pub fn node(&self) -> &str {
        match self {
            Record::Domain(d) => &d.node,
            Record::SubDomain(s) => &s.node,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            Record::Domain(d) => &d.address,
            Record::SubDomain(s) => &s.address,
        }
    }
}

/// Decode the naming contract's answer. `Void` means the name is not registered.
pub fn decode_record(val: &ScVal) -> SdkResult<Record> {
    if matches!(val, ScVal::Void) {
        return Err(SdkError::DomainNotFound);
    }

    let (tag, payload) = split_tagged(val)?;
    let fields = Fields::new(&tag, payload)?;

    if tag == "Domain" {
        Ok(Record::Domain(DomainRecord {
            node: fields.render("node")?,
            owner: fields.render("owner")?,
            address: fields.render("address")?,
            exp_date: fields.render("exp_date")?,
            snapshot: fields.render("snapshot")?,
            collateral: fields.render("collateral")?,
        }))
    } else {
        Ok(Record::SubDomain(SubDomainRecord {
            node: fields.render("node")?,
            parent: fields.render("parent")?,
            address: fields.render("address")?,
            snapshot: fields.render("snapshot")?,
        }))
    }
}

/// Struct fields of a record, keyed by field name.
struct Fields<'a> {
    tag: &'a str,
    by_name: HashMap<String, &'a ScVal>,
}

impl<'a> Fields<'a> {
    fn new(tag: &'a str, payload: Option<&'a ScVal>) -> SdkResult<Self> {
        let Some(ScVal::Map(Some(map))) = payload else {
            return Err(SdkError::InvalidResponse(format!(
                "{tag} record is not a struct"
            )));
        };

        let entries: &[ScMapEntry] = map.as_ref();
        let mut by_name = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let ScVal::Symbol(sym) = &entry.key {
                let name: &[u8] = sym.as_ref();
                by_name.insert(String::from_utf8_lossy(name).into_owned(), &entry.val);
            }
        }
        Ok(Self { tag, by_name })
    }

    fn render(&self, name: &str) -> SdkResult<String> {
        let val = self.by_name.get(name).ok_or_else(|| {
            SdkError::InvalidResponse(format!("{} record missing `{name}`", self.tag))
        })?;
        render_field(val)
            .map_err(|e| SdkError::InvalidResponse(format!("{}.{name}: {e}", self.tag)))
    }
}

fn u128_from_parts(parts: &UInt128Parts) -> u128 {
    (u128::from(parts.hi) << 64) | u128::from(parts.lo)
}

/// Render one record field as a JSON-safe string.
fn render_field(val: &ScVal) -> SdkResult<String> {
    match val {
        ScVal::Bytes(bytes) => {
            let b: &[u8] = bytes.as_ref();
            Ok(hex::encode(b))
        }
        ScVal::Address(address) => render_address(address),
        ScVal::U32(n) => Ok(n.to_string()),
        ScVal::I32(n) => Ok(n.to_string()),
        ScVal::U64(n) => Ok(n.to_string()),
        ScVal::I64(n) => Ok(n.to_string()),
        ScVal::Timepoint(t) => Ok(t.0.to_string()),
        ScVal::U128(parts) => Ok(u128_from_parts(parts).to_string()),
        ScVal::I128(parts) => Ok(i128_from_parts(parts).to_string()),
        ScVal::String(s) => {
            let b: &[u8] = s.as_ref();
            Ok(String::from_utf8_lossy(b).into_owned())
        }
        other => Err(SdkError::InvalidResponse(format!(
            "unexpected {} field",
            other.name()
        ))),
    }
}
