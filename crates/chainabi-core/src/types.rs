//! ABI type descriptors and native values.
//!
//! Type strings from an ABI definition are parsed once into [`AbiType`];
//! the codec dispatches on the enum and never re-parses strings per value.
//! [`AbiValue`] is the native side of the codec: what callers pass in and
//! what decoding hands back.

use alloy_primitives::{Address, I256, U256};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::{AbiError, EncodeError};
use crate::hexutil::{self, HexStyle};

/// A parsed ABI type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// `uintN`, width in bits (8..=256, multiple of 8)
    Uint(u16),
    /// `intN`, width in bits (8..=256, multiple of 8)
    Int(u16),
    Bool,
    /// 20-byte address
    Address,
    /// `bytesN` (1..=32)
    FixedBytes(u8),
    /// Dynamic `bytes`
    Bytes,
    /// Dynamic UTF-8 `string`
    String,
    /// `T[N]`
    FixedArray(Box<AbiType>, usize),
    /// `T[]`
    Array(Box<AbiType>),
    /// `(T1,T2,...)`
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Parse a type descriptor such as `uint256`, `bytes32[]` or
    /// `(address,uint256)[2]`. The bare `tuple` keyword needs components;
    /// use [`AbiType::from_descriptor`] for ABI parameters.
    pub fn parse(descriptor: &str) -> Result<Self, AbiError> {
        Self::parse_inner(descriptor.trim(), None, descriptor)
    }

    /// Parse an ABI parameter's `type` string, resolving `tuple` against the
    /// already-parsed `components`.
    pub fn from_descriptor(descriptor: &str, components: &[AbiType]) -> Result<Self, AbiError> {
        Self::parse_inner(descriptor.trim(), Some(components), descriptor)
    }

    fn parse_inner(s: &str, components: Option<&[AbiType]>, original: &str) -> Result<Self, AbiError> {
        let unknown = || AbiError::UnknownType {
            descriptor: original.to_string(),
        };

        // Array suffixes bind last: `T[2][]` is a dynamic array of `T[2]`.
        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped.rfind('[').ok_or_else(unknown)?;
            let elem = Self::parse_inner(&stripped[..open], components, original)?;
            let dim = &stripped[open + 1..];
            if dim.is_empty() {
                return Ok(AbiType::Array(Box::new(elem)));
            }
            let len: usize = dim.parse().map_err(|_| unknown())?;
            // The head of `T[N]` must stay addressable.
            if len == 0 || elem.head_len().checked_mul(len).is_none() {
                return Err(unknown());
            }
            return Ok(AbiType::FixedArray(Box::new(elem), len));
        }

        if s == "tuple" {
            let members = components.filter(|c| !c.is_empty()).ok_or_else(unknown)?.to_vec();
            return Self::tuple(members).ok_or_else(unknown);
        }

        if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            let members = split_top_level(inner)
                .into_iter()
                .map(|part| Self::parse_inner(part.trim(), None, original))
                .collect::<Result<Vec<_>, _>>()?;
            return Self::tuple(members).ok_or_else(unknown);
        }

        match s {
            "address" => return Ok(AbiType::Address),
            "bool" => return Ok(AbiType::Bool),
            "string" => return Ok(AbiType::String),
            "bytes" => return Ok(AbiType::Bytes),
            "byte" => return Ok(AbiType::FixedBytes(1)),
            _ => {}
        }

        if let Some(rest) = s.strip_prefix("uint") {
            return parse_width(rest).map(AbiType::Uint).ok_or_else(unknown);
        }
        if let Some(rest) = s.strip_prefix("int") {
            return parse_width(rest).map(AbiType::Int).ok_or_else(unknown);
        }
        if let Some(rest) = s.strip_prefix("bytes") {
            let size: u8 = rest.parse().map_err(|_| unknown())?;
            if (1..=32).contains(&size) {
                return Ok(AbiType::FixedBytes(size));
            }
        }

        Err(unknown())
    }

    /// A tuple whose combined head size fits in `usize`.
    fn tuple(members: Vec<AbiType>) -> Option<Self> {
        members
            .iter()
            .try_fold(0usize, |acc, m| acc.checked_add(m.head_len()))
            .map(|_| AbiType::Tuple(members))
    }

    /// Returns `true` for types encoded out-of-line behind an offset word.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            AbiType::Tuple(members) => members.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this type occupies in the head of an encoding.
    pub fn head_len(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            AbiType::FixedArray(inner, len) => inner.head_len().saturating_mul(*len),
            AbiType::Tuple(members) => members
                .iter()
                .fold(0usize, |acc, m| acc.saturating_add(m.head_len())),
            _ => 32,
        }
    }

    /// Indexed event parameters of these types are stored as a hash.
    pub fn is_hashed_in_topic(&self) -> bool {
        matches!(
            self,
            AbiType::Bytes
                | AbiType::String
                | AbiType::Array(_)
                | AbiType::FixedArray(..)
                | AbiType::Tuple(_)
        )
    }
}

fn parse_width(rest: &str) -> Option<u16> {
    if rest.is_empty() {
        return Some(256);
    }
    let bits: u16 = rest.parse().ok()?;
    (bits >= 8 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{bits}"),
            AbiType::Int(bits) => write!(f, "int{bits}"),
            AbiType::Bool => write!(f, "bool"),
            AbiType::Address => write!(f, "address"),
            AbiType::FixedBytes(n) => write!(f, "bytes{n}"),
            AbiType::Bytes => write!(f, "bytes"),
            AbiType::String => write!(f, "string"),
            AbiType::FixedArray(elem, len) => write!(f, "{elem}[{len}]"),
            AbiType::Array(elem) => write!(f, "{elem}[]"),
            AbiType::Tuple(members) => {
                let parts: Vec<_> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl std::str::FromStr for AbiType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbiType::parse(s)
    }
}

/// A native ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    /// `bytesN` content, exactly N bytes once decoded
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// Elements of a fixed or dynamic array
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    pub fn uint(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }

    /// Parse a 20-byte address from hex, with or without the `0x` marker.
    pub fn address(hex_str: &str) -> Result<Self, EncodeError> {
        parse_address(hex_str).map(AbiValue::Address)
    }

    /// Short name of the variant, used in mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Bool(_) => "bool",
            AbiValue::Address(_) => "address",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce a JSON argument into a value of type `ty`.
    ///
    /// Integers accept JSON numbers and decimal or `0x` strings; addresses
    /// and bytes accept hex strings; arrays and tuples accept JSON arrays.
    pub fn from_json(ty: &AbiType, json: &Value) -> Result<Self, EncodeError> {
        let mismatch = |reason: String| EncodeError::TypeMismatch {
            ty: ty.to_string(),
            reason,
        };

        match (ty, json) {
            (AbiType::Bool, Value::Bool(b)) => Ok(AbiValue::Bool(*b)),
            (AbiType::Bool, Value::String(s)) => match s.as_str() {
                "true" => Ok(AbiValue::Bool(true)),
                "false" => Ok(AbiValue::Bool(false)),
                _ => Err(mismatch(format!("'{s}' is not a boolean"))),
            },

            (AbiType::Uint(_), Value::Number(n)) => n
                .as_u64()
                .map(AbiValue::uint)
                .ok_or_else(|| mismatch(format!("{n} is not an unsigned integer"))),
            (AbiType::Uint(_), Value::String(s)) => s
                .trim()
                .parse::<U256>()
                .map(AbiValue::Uint)
                .map_err(|e| mismatch(format!("'{s}': {e}"))),

            (AbiType::Int(_), Value::Number(n)) => n
                .as_i64()
                .and_then(|v| I256::try_from(v).ok())
                .map(AbiValue::Int)
                .ok_or_else(|| mismatch(format!("{n} is not an integer"))),
            (AbiType::Int(_), Value::String(s)) => s
                .trim()
                .parse::<I256>()
                .map(AbiValue::Int)
                .map_err(|e| mismatch(format!("'{s}': {e}"))),

            (AbiType::Address, Value::String(s)) => AbiValue::address(s),

            (AbiType::FixedBytes(n), Value::String(s)) => {
                let bytes = hexutil::decode(s).map_err(|e| EncodeError::InvalidHex {
                    reason: format!("'{s}': {e}"),
                })?;
                if bytes.len() > *n as usize {
                    return Err(mismatch(format!("got {} bytes", bytes.len())));
                }
                Ok(AbiValue::FixedBytes(bytes))
            }
            (AbiType::Bytes, Value::String(s)) => hexutil::decode(s)
                .map(AbiValue::Bytes)
                .map_err(|e| EncodeError::InvalidHex {
                    reason: format!("'{s}': {e}"),
                }),

            (AbiType::String, Value::String(s)) => Ok(AbiValue::String(s.clone())),

            (AbiType::Array(inner), Value::Array(items)) => items
                .iter()
                .map(|item| AbiValue::from_json(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(AbiValue::Array),
            (AbiType::FixedArray(inner, len), Value::Array(items)) => {
                if items.len() != *len {
                    return Err(mismatch(format!("expected {len} elements, got {}", items.len())));
                }
                items
                    .iter()
                    .map(|item| AbiValue::from_json(inner, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AbiValue::Array)
            }
            (AbiType::Tuple(members), Value::Array(items)) => {
                if items.len() != members.len() {
                    return Err(mismatch(format!(
                        "expected {} components, got {}",
                        members.len(),
                        items.len()
                    )));
                }
                members
                    .iter()
                    .zip(items)
                    .map(|(member, item)| AbiValue::from_json(member, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(AbiValue::Tuple)
            }

            (_, other) => Err(mismatch(format!("cannot convert JSON {other}"))),
        }
    }

    /// Render as JSON. Integers that fit 64 bits become JSON numbers, larger
    /// ones decimal strings; addresses and bytes become hex in `style`.
    pub fn to_json(&self, style: HexStyle) -> Value {
        match self {
            AbiValue::Uint(v) => match u64::try_from(*v) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(v.to_string()),
            },
            AbiValue::Int(v) => match i64::try_from(*v) {
                Ok(small) => Value::from(small),
                Err(_) => Value::String(v.to_string()),
            },
            AbiValue::Bool(b) => Value::Bool(*b),
            AbiValue::Address(a) => Value::String(style.encode(a.as_slice())),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => Value::String(style.encode(b)),
            AbiValue::String(s) => Value::String(s.clone()),
            AbiValue::Array(items) | AbiValue::Tuple(items) => {
                Value::Array(items.iter().map(|v| v.to_json(style)).collect())
            }
        }
    }
}

/// Parse a 20-byte hex address.
pub fn parse_address(hex_str: &str) -> Result<Address, EncodeError> {
    let bytes = hexutil::decode(hex_str).map_err(|e| EncodeError::InvalidHex {
        reason: format!("address '{hex_str}': {e}"),
    })?;
    if bytes.len() != 20 {
        return Err(EncodeError::TypeMismatch {
            ty: "address".into(),
            reason: format!("expected 20 bytes, got {}", bytes.len()),
        });
    }
    Ok(Address::from_slice(&bytes))
}

impl Serialize for AbiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json(HexStyle::Prefixed).serialize(serializer)
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint(v) => write!(f, "{v}"),
            AbiValue::Int(v) => write!(f, "{v}"),
            AbiValue::Bool(v) => write!(f, "{v}"),
            AbiValue::Address(a) => write!(f, "0x{}", hex::encode(a.as_slice())),
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            AbiValue::String(s) => write!(f, "{s}"),
            AbiValue::Array(items) => {
                let parts: Vec<_> = items.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            AbiValue::Tuple(items) => {
                let parts: Vec<_> = items.iter().map(|x| x.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
