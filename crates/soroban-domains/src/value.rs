//! Storage values held by the key/value database contract, and their `ScVal` wire form.
//!
//! On chain a value is a contract enum, which Soroban encodes as a two element
//! vector: the variant name as a symbol followed by the payload.
//!
//! ```text
//! Bytes(b)   -> Vec[Symbol("Bytes"),  Bytes(b)]
//! Number(n)  -> Vec[Symbol("Number"), I128(n)]
//! String(s)  -> Vec[Symbol("String"), String(s)]
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use stellar_xdr::curr::{Int128Parts, ScBytes, ScString, ScSymbol, ScVal, ScVec, StringM};

use crate::error::{SdkError, SdkResult};

/// Discriminants the key/value contract accepts.
pub const VALUE_TAGS: [&str; 3] = ["Bytes", "Number", "String"];

/// A value stored under a `(node, key)` pair.
///
/// Serializes as `{"type": "...", "value": ...}` with bytes in hex and numbers
/// as decimal strings so the JSON form survives transports without 128-bit integers.
#[serde_as]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "value")]
pub enum StorageValue {
    Bytes(#[serde_as(as = "serde_with::hex::Hex")] Vec<u8>),
    Number(#[serde_as(as = "DisplayFromStr")] i128),
    String(String),
}

impl StorageValue {
    /// The contract-side variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageValue::Bytes(_) => "Bytes",
            StorageValue::Number(_) => "Number",
            StorageValue::String(_) => "String",
        }
    }
}

impl From<Vec<u8>> for StorageValue {
    fn from(bytes: Vec<u8>) -> Self {
        StorageValue::Bytes(bytes)
    }
}

impl From<i128> for StorageValue {
    fn from(n: i128) -> Self {
        StorageValue::Number(n)
    }
}

impl From<String> for StorageValue {
    fn from(s: String) -> Self {
        StorageValue::String(s)
    }
}

impl From<&str> for StorageValue {
    fn from(s: &str) -> Self {
        StorageValue::String(s.to_string())
    }
}

/// Untyped input, e.g. from a JSON request body or the command line.
///
/// A `type` outside [`VALUE_TAGS`] is rejected as [`SdkError::UnsupportedValueType`];
/// a known type with a payload of the wrong shape as [`SdkError::InvalidValue`].
impl TryFrom<serde_json::Value> for StorageValue {
    type Error = SdkError;

    fn try_from(raw: serde_json::Value) -> SdkResult<Self> {
        let tag = match raw.get("type") {
            Some(serde_json::Value::String(tag)) => tag.clone(),
            Some(other) => return Err(SdkError::UnsupportedValueType(other.to_string())),
            None => return Err(SdkError::InvalidValue("missing \"type\"".into())),
        };
        if !VALUE_TAGS.contains(&tag.as_str()) {
            return Err(SdkError::UnsupportedValueType(tag));
        }

        // Plain JSON integers are accepted for numbers alongside decimal strings.
        if let ("Number", Some(serde_json::Value::Number(n))) = (tag.as_str(), raw.get("value")) {
            return n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .map(StorageValue::Number)
                .ok_or_else(|| SdkError::InvalidValue(format!("not an integer: {n}")));
        }

        serde_json::from_value(raw).map_err(|e| SdkError::InvalidValue(e.to_string()))
    }
}

// =============================================================================
// ScVal helpers
// =============================================================================

pub(crate) fn sc_symbol(name: &str) -> SdkResult<ScVal> {
    Ok(ScVal::Symbol(ScSymbol(StringM::try_from(name)?)))
}

pub(crate) fn sc_bytes(bytes: &[u8]) -> SdkResult<ScVal> {
    Ok(ScVal::Bytes(ScBytes(bytes.to_vec().try_into()?)))
}

pub(crate) fn sc_vec(items: Vec<ScVal>) -> SdkResult<ScVal> {
    Ok(ScVal::Vec(Some(ScVec(items.try_into()?))))
}

pub(crate) fn i128_to_parts(n: i128) -> Int128Parts {
    Int128Parts {
        hi: (n >> 64) as i64,
        lo: n as u64,
    }
}

pub(crate) fn i128_from_parts(parts: &Int128Parts) -> i128 {
    ((parts.hi as i128) << 64) | (parts.lo as i128)
}

/// Split a contract enum value into its variant name and (optional) payload.
pub(crate) fn split_tagged(val: &ScVal) -> SdkResult<(String, Option<&ScVal>)> {
    let ScVal::Vec(Some(vec)) = val else {
        return Err(SdkError::InvalidResponse(format!(
            "expected tagged vector, got {}",
            val.name()
        )));
    };
    let items: &[ScVal] = vec.as_ref();
    let tag = match items.first() {
        Some(ScVal::Symbol(sym)) => {
            let sym_bytes: &[u8] = sym.as_ref();
            String::from_utf8_lossy(sym_bytes).into_owned()
        }
        Some(other) => {
            return Err(SdkError::InvalidResponse(format!(
                "expected variant symbol, got {}",
                other.name()
            )))
        }
        None => return Err(SdkError::InvalidResponse("empty tagged vector".into())),
    };
    Ok((tag, items.get(1)))
}

// =============================================================================
// Codec
// =============================================================================

/// Encode a storage value into the contract's wire form.
pub fn encode_value(value: &StorageValue) -> SdkResult<ScVal> {
    let payload = match value {
        StorageValue::Bytes(bytes) => sc_bytes(bytes)?,
        StorageValue::Number(n) => ScVal::I128(i128_to_parts(*n)),
        StorageValue::String(s) => ScVal::String(ScString(StringM::try_from(s.as_str())?)),
    };
    sc_vec(vec![sc_symbol(value.kind())?, payload])
}

/// Decode a value returned by the contract's `get`.
///
/// `Void` (the contract's `None`) means nothing is stored under the key.
pub fn decode_value(val: &ScVal) -> SdkResult<StorageValue> {
    if matches!(val, ScVal::Void) {
        return Err(SdkError::DomainDataNotFound);
    }

    let (tag, payload) = split_tagged(val)?;
    let payload =
        payload.ok_or_else(|| SdkError::InvalidResponse(format!("{tag} value has no payload")))?;

    match (tag.as_str(), payload) {
        ("Bytes", ScVal::Bytes(bytes)) => {
            let b: &[u8] = bytes.as_ref();
            Ok(StorageValue::Bytes(b.to_vec()))
        }
        ("Number", ScVal::I128(parts)) => Ok(StorageValue::Number(i128_from_parts(parts))),
        ("String", ScVal::String(s)) => {
            let b: &[u8] = s.as_ref();
            let text = std::str::from_utf8(b)
                .map_err(|e| SdkError::InvalidResponse(format!("string value: {e}")))?;
            Ok(StorageValue::String(text.to_string()))
        }
        (tag, _) if !VALUE_TAGS.contains(&tag) => Err(SdkError::UnsupportedValueType(tag.into())),
        (tag, other) => Err(SdkError::InvalidResponse(format!(
            "{tag} value carried a {} payload",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(StorageValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]))]
    #[case(StorageValue::Number(-42))]
    #[case(StorageValue::Number(i128::MAX))]
    #[case(StorageValue::Number(i128::MIN))]
    #[case(StorageValue::String("GABC…".to_string()))]
    fn test_encode_decode(#[case] value: StorageValue) {
        let encoded = encode_value(&value).unwrap();
        assert_eq!(decode_value(&encoded).unwrap(), value);
    }

    #[test]
    fn test_encode_shape() {
        let encoded = encode_value(&StorageValue::Number(-1)).unwrap();
        let (tag, payload) = split_tagged(&encoded).unwrap();
        assert_eq!(tag, "Number");
        match payload {
            Some(ScVal::I128(parts)) => {
                assert_eq!(parts.hi, -1);
                assert_eq!(parts.lo, u64::MAX);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_decode_void_is_not_found() {
        assert!(matches!(
            decode_value(&ScVal::Void),
            Err(SdkError::DomainDataNotFound)
        ));
    }

    #[test]
    fn test_decode_unknown_tag() {
        let val = sc_vec(vec![sc_symbol("Boolean").unwrap(), ScVal::Bool(true)]).unwrap();
        match decode_value(&val) {
            Err(SdkError::UnsupportedValueType(tag)) => assert_eq!(tag, "Boolean"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_mismatched_payload() {
        let val = sc_vec(vec![sc_symbol("Number").unwrap(), ScVal::Bool(true)]).unwrap();
        assert!(matches!(
            decode_value(&val),
            Err(SdkError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_json_form() {
        let value = StorageValue::Number(170141183460469231731687303715884105727);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            json!({"type": "Number", "value": "170141183460469231731687303715884105727"})
        );

        let bytes = serde_json::to_value(StorageValue::Bytes(vec![1, 2, 255])).unwrap();
        assert_eq!(bytes, json!({"type": "Bytes", "value": "0102ff"}));
    }

    #[rstest]
    #[case(json!({"type": "String", "value": "hello"}), StorageValue::String("hello".into()))]
    #[case(json!({"type": "Number", "value": "-7"}), StorageValue::Number(-7))]
    #[case(json!({"type": "Number", "value": 12}), StorageValue::Number(12))]
    #[case(json!({"type": "Bytes", "value": "00ff"}), StorageValue::Bytes(vec![0, 255]))]
    fn test_from_json(#[case] raw: serde_json::Value, #[case] expected: StorageValue) {
        assert_eq!(StorageValue::try_from(raw).unwrap(), expected);
    }

    #[test]
    fn test_from_json_rejects_unknown_type() {
        let err = StorageValue::try_from(json!({"type": "Boolean", "value": true})).unwrap_err();
        assert!(matches!(err, SdkError::UnsupportedValueType(t) if t == "Boolean"));
    }

    #[test]
    fn test_from_json_rejects_bad_payload() {
        let err = StorageValue::try_from(json!({"type": "Bytes", "value": "xyz"})).unwrap_err();
        assert!(matches!(err, SdkError::InvalidValue(_)));
        let err = StorageValue::try_from(json!({"value": 1})).unwrap_err();
        assert!(matches!(err, SdkError::InvalidValue(_)));
    }
}
