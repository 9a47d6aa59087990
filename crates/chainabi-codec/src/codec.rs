//! Type codec: single-value encoding rules and the head/tail layout.
//!
//! # Layout rules
//! - Every slot is a 32-byte word.
//! - Static types (`bool`, `uintN`, `intN`, `address`, `bytesN`, and
//!   fixed arrays/tuples of static types) are written inline in the head.
//! - Dynamic types (`bytes`, `string`, `T[]`, and fixed arrays/tuples that
//!   contain one) write a single offset word in the head and their content
//!   in the tail. Offsets are byte positions relative to the start of the
//!   enclosing parameter block.

use alloy_primitives::{Address, I256, U256};
use chainabi_core::{
    error::{DecodeError, EncodeError},
    hexutil::{self, HexStyle},
    types::{AbiType, AbiValue},
};
use std::iter;

/// Size of one ABI slot in bytes.
pub const WORD: usize = 32;

// ─── Encoding ────────────────────────────────────────────────────────────────

/// Encode a single value.
///
/// Static types yield their inline word(s). Dynamic types yield their tail
/// form (length word + content for `bytes`/`string`, length word + element
/// block for `T[]`), without a leading offset word.
pub fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    if ty.is_dynamic() {
        encode_tail(ty, value, &mut out)?;
    } else {
        encode_static(ty, value, &mut out)?;
    }
    Ok(out)
}

/// [`encode_value`] rendered as hex.
pub fn encode_value_hex(ty: &AbiType, value: &AbiValue, style: HexStyle) -> Result<String, EncodeError> {
    encode_value(ty, value).map(|bytes| style.encode(bytes))
}

/// Encode a value against a type descriptor such as `"uint256[]"`.
pub fn encode_typed(descriptor: &str, value: &AbiValue, style: HexStyle) -> Result<String, EncodeError> {
    let ty = AbiType::parse(descriptor)?;
    encode_value_hex(&ty, value, style)
}

/// Encode an ordered parameter list with the head/tail layout.
///
/// Dynamic parameters first reserve a zeroed head word; once every
/// parameter has been written, each reserved word is patched with
/// `head_len + tail_offset_of_that_parameter`.
pub fn encode_params<'a, I>(params: I) -> Result<Vec<u8>, EncodeError>
where
    I: IntoIterator<Item = (&'a AbiType, &'a AbiValue)>,
{
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut placeholders = Vec::new();

    for (ty, value) in params {
        if ty.is_dynamic() {
            placeholders.push((head.len(), tail.len()));
            head.extend_from_slice(&[0u8; WORD]);
            encode_tail(ty, value, &mut tail)?;
        } else {
            encode_static(ty, value, &mut head)?;
        }
    }

    let head_len = head.len();
    for (slot, tail_offset) in placeholders {
        head[slot..slot + WORD].copy_from_slice(&usize_word(head_len + tail_offset));
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Encode `values` against `types`, checking arity first.
pub fn encode_tuple(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, EncodeError> {
    if types.len() != values.len() {
        return Err(EncodeError::ArgumentCount {
            method: "tuple".into(),
            expected: types.len(),
            got: values.len(),
        });
    }
    encode_params(types.iter().zip(values))
}

fn encode_static(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (ty, value) {
        (AbiType::Bool, AbiValue::Bool(b)) => {
            let mut word = [0u8; WORD];
            word[WORD - 1] = u8::from(*b);
            out.extend_from_slice(&word);
        }

        (AbiType::Uint(bits), AbiValue::Uint(v)) => {
            let word = v.to_be_bytes::<WORD>();
            let pad = WORD - usize::from(*bits) / 8;
            if word[..pad].iter().any(|b| *b != 0) {
                return Err(out_of_range(ty, value));
            }
            out.extend_from_slice(&word);
        }

        (AbiType::Int(bits), AbiValue::Int(v)) => {
            // Two's complement, sign-extended across the whole word.
            let word = v.into_raw().to_be_bytes::<WORD>();
            let pad = WORD - usize::from(*bits) / 8;
            let fill = if word[pad] & 0x80 != 0 { 0xff } else { 0x00 };
            if word[..pad].iter().any(|b| *b != fill) {
                return Err(out_of_range(ty, value));
            }
            out.extend_from_slice(&word);
        }

        (AbiType::Address, AbiValue::Address(a)) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a.as_slice());
            out.extend_from_slice(&word);
        }

        (AbiType::FixedBytes(n), AbiValue::FixedBytes(b)) => {
            if b.len() > usize::from(*n) {
                return Err(mismatch(ty, format!("got {} bytes", b.len())));
            }
            let mut word = [0u8; WORD];
            word[..b.len()].copy_from_slice(b);
            out.extend_from_slice(&word);
        }

        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            check_len(ty, *len, items.len())?;
            for item in items {
                encode_static(inner, item, out)?;
            }
        }

        (AbiType::Tuple(members), AbiValue::Tuple(items)) => {
            check_len(ty, members.len(), items.len())?;
            for (member, item) in members.iter().zip(items) {
                encode_static(member, item, out)?;
            }
        }

        _ => return Err(mismatch(ty, format!("got {} value", value.kind()))),
    }
    Ok(())
}

fn encode_tail(ty: &AbiType, value: &AbiValue, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (ty, value) {
        (AbiType::Bytes, AbiValue::Bytes(b)) => encode_bytes(b, out),
        (AbiType::String, AbiValue::String(s)) => encode_bytes(s.as_bytes(), out),

        (AbiType::Array(inner), AbiValue::Array(items)) => {
            out.extend_from_slice(&usize_word(items.len()));
            out.extend(encode_params(iter::repeat(inner.as_ref()).zip(items))?);
        }

        (AbiType::FixedArray(inner, len), AbiValue::Array(items)) => {
            check_len(ty, *len, items.len())?;
            out.extend(encode_params(iter::repeat(inner.as_ref()).zip(items))?);
        }

        (AbiType::Tuple(members), AbiValue::Tuple(items)) => {
            check_len(ty, members.len(), items.len())?;
            out.extend(encode_params(members.iter().zip(items))?);
        }

        _ if !ty.is_dynamic() => encode_static(ty, value, out)?,

        _ => return Err(mismatch(ty, format!("got {} value", value.kind()))),
    }
    Ok(())
}

/// Length word followed by content right-padded to a word boundary.
fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(data.len()));
    out.extend_from_slice(data);
    let padded_len = data.len().div_ceil(WORD) * WORD;
    out.resize(out.len() + (padded_len - data.len()), 0);
}

fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn check_len(ty: &AbiType, expected: usize, got: usize) -> Result<(), EncodeError> {
    if expected == got {
        Ok(())
    } else {
        Err(mismatch(ty, format!("expected {expected} elements, got {got}")))
    }
}

fn mismatch(ty: &AbiType, reason: String) -> EncodeError {
    EncodeError::TypeMismatch {
        ty: ty.to_string(),
        reason,
    }
}

fn out_of_range(ty: &AbiType, value: &AbiValue) -> EncodeError {
    EncodeError::ValueOutOfRange {
        ty: ty.to_string(),
        value: value.to_string(),
    }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Upper bound on decoded output, as a multiple of the input length.
///
/// A well-formed encoding never decodes to more than its own size; offsets
/// that alias one tail payload from many head slots are cut off here.
pub const MAX_DECODE_EXPANSION: usize = 2;

/// Decoded-byte allowance shared by one top-level decode.
struct Budget {
    remaining: usize,
    limit: usize,
}

impl Budget {
    fn for_input(data: &[u8]) -> Self {
        let limit = data.len().saturating_mul(MAX_DECODE_EXPANSION);
        Self { remaining: limit, limit }
    }

    /// Every value costs a word; `bytes`/`string` also cost their content.
    fn charge(&mut self, ty: &AbiType, bytes: usize) -> Result<(), DecodeError> {
        self.remaining = self
            .remaining
            .checked_sub(bytes)
            .ok_or_else(|| DecodeError::OutputTooLarge {
                ty: ty.to_string(),
                limit: self.limit,
            })?;
        Ok(())
    }
}

/// Decode a single value laid out as [`encode_value`] produces it.
pub fn decode_value(ty: &AbiType, data: &[u8]) -> Result<AbiValue, DecodeError> {
    let mut budget = Budget::for_input(data);
    if ty.is_dynamic() {
        decode_tail(ty, data, 0, &mut budget)
    } else {
        decode_static(ty, data, 0, &mut budget)
    }
}

/// [`decode_value`] over a hex string, with or without `0x`.
pub fn decode_value_hex(ty: &AbiType, hex_str: &str) -> Result<AbiValue, DecodeError> {
    decode_value(ty, &decode_hex(hex_str)?)
}

/// Decode hex against a type descriptor such as `"(address,string)"`.
pub fn decode_typed(descriptor: &str, hex_str: &str) -> Result<AbiValue, DecodeError> {
    let ty = AbiType::parse(descriptor)?;
    decode_value_hex(&ty, hex_str)
}

/// Decode an ordered parameter list whose block starts at `base`.
pub fn decode_params<'a, I>(types: I, data: &[u8], base: usize) -> Result<Vec<AbiValue>, DecodeError>
where
    I: IntoIterator<Item = &'a AbiType>,
{
    decode_params_in(types, data, base, &mut Budget::for_input(data))
}

fn decode_params_in<'a, I>(types: I, data: &[u8], base: usize, budget: &mut Budget) -> Result<Vec<AbiValue>, DecodeError>
where
    I: IntoIterator<Item = &'a AbiType>,
{
    let mut cursor = base;
    let mut values = Vec::new();

    for ty in types {
        if ty.is_dynamic() {
            let offset = read_usize(ty, data, cursor)?;
            let start = base
                .checked_add(offset)
                .filter(|start| *start <= data.len())
                .ok_or_else(|| DecodeError::OffsetOutOfRange {
                    ty: ty.to_string(),
                    offset: offset.to_string(),
                    len: data.len(),
                })?;
            values.push(decode_tail(ty, data, start, budget)?);
            cursor = cursor.saturating_add(WORD);
        } else {
            values.push(decode_static(ty, data, cursor, budget)?);
            cursor = cursor.saturating_add(ty.head_len());
        }
    }
    Ok(values)
}

pub(crate) fn decode_hex(hex_str: &str) -> Result<Vec<u8>, DecodeError> {
    hexutil::decode(hex_str).map_err(|e| DecodeError::InvalidHex {
        reason: e.to_string(),
    })
}

fn decode_static(ty: &AbiType, data: &[u8], pos: usize, budget: &mut Budget) -> Result<AbiValue, DecodeError> {
    match ty {
        AbiType::FixedArray(inner, len) => (0..*len)
            .map(|i| decode_static(inner, data, pos.saturating_add(i * inner.head_len()), budget))
            .collect::<Result<Vec<_>, _>>()
            .map(AbiValue::Array),
        AbiType::Tuple(members) => decode_params_in(members, data, pos, budget).map(AbiValue::Tuple),
        AbiType::Bytes | AbiType::String | AbiType::Array(_) => decode_tail(ty, data, pos, budget),
        _ => {
            let w = word(ty, data, pos)?;
            budget.charge(ty, WORD)?;
            Ok(match ty {
                AbiType::Bool => AbiValue::Bool(w.iter().any(|b| *b != 0)),
                AbiType::Int(_) => AbiValue::Int(I256::from_raw(U256::from_be_bytes(*w))),
                AbiType::Address => AbiValue::Address(Address::from_slice(&w[12..])),
                AbiType::FixedBytes(n) => AbiValue::FixedBytes(w[..usize::from(*n)].to_vec()),
                _ => AbiValue::Uint(U256::from_be_bytes(*w)),
            })
        }
    }
}

fn decode_tail(ty: &AbiType, data: &[u8], pos: usize, budget: &mut Budget) -> Result<AbiValue, DecodeError> {
    match ty {
        AbiType::Bytes | AbiType::String => {
            let len = read_usize(ty, data, pos)?;
            let start = pos + WORD;
            let end = start.checked_add(len).ok_or_else(|| DecodeError::OffsetOutOfRange {
                ty: ty.to_string(),
                offset: len.to_string(),
                len: data.len(),
            })?;
            if end > data.len() {
                return Err(DecodeError::Truncated {
                    ty: ty.to_string(),
                    needed: end,
                    available: data.len(),
                });
            }
            budget.charge(ty, WORD.saturating_add(len))?;
            let bytes = data[start..end].to_vec();
            if matches!(ty, AbiType::String) {
                String::from_utf8(bytes)
                    .map(AbiValue::String)
                    .map_err(|e| DecodeError::InvalidUtf8 {
                        reason: e.to_string(),
                    })
            } else {
                Ok(AbiValue::Bytes(bytes))
            }
        }

        AbiType::Array(inner) => {
            let count = read_usize(ty, data, pos)?;
            let start = pos + WORD;
            // Reject counts the payload cannot possibly hold before allocating.
            let needed = count
                .checked_mul(inner.head_len())
                .and_then(|n| n.checked_add(start))
                .unwrap_or(usize::MAX);
            if needed > data.len() {
                return Err(DecodeError::Truncated {
                    ty: ty.to_string(),
                    needed,
                    available: data.len(),
                });
            }
            budget.charge(ty, WORD)?;
            decode_params_in(iter::repeat(inner.as_ref()).take(count), data, start, budget).map(AbiValue::Array)
        }

        AbiType::FixedArray(inner, len) if ty.is_dynamic() => {
            decode_params_in(iter::repeat(inner.as_ref()).take(*len), data, pos, budget).map(AbiValue::Array)
        }

        AbiType::Tuple(members) if ty.is_dynamic() => {
            decode_params_in(members, data, pos, budget).map(AbiValue::Tuple)
        }

        _ => decode_static(ty, data, pos, budget),
    }
}

fn word<'d>(ty: &AbiType, data: &'d [u8], pos: usize) -> Result<&'d [u8; WORD], DecodeError> {
    let end = pos.checked_add(WORD).unwrap_or(usize::MAX);
    data.get(pos..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| DecodeError::Truncated {
            ty: ty.to_string(),
            needed: end,
            available: data.len(),
        })
}

/// Read an offset or length word; values beyond 64 bits cannot address the payload.
fn read_usize(ty: &AbiType, data: &[u8], pos: usize) -> Result<usize, DecodeError> {
    let w = word(ty, data, pos)?;
    let out_of_range = || DecodeError::OffsetOutOfRange {
        ty: ty.to_string(),
        offset: U256::from_be_bytes(*w).to_string(),
        len: data.len(),
    };
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(out_of_range());
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&w[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> AbiType {
        AbiType::parse(s).unwrap()
    }

    fn int(v: i64) -> AbiValue {
        AbiValue::Int(I256::try_from(v).unwrap())
    }

    fn roundtrip(t: &str, value: AbiValue) {
        let t = ty(t);
        let encoded = encode_value(&t, &value).unwrap();
        assert_eq!(decode_value(&t, &encoded).unwrap(), value, "type {t}");
    }

    #[test]
    fn roundtrip_every_supported_kind() {
        roundtrip("bool", AbiValue::Bool(true));
        roundtrip("uint8", AbiValue::uint(255));
        roundtrip("uint256", AbiValue::Uint(U256::MAX));
        roundtrip("int8", int(-128));
        roundtrip("int256", int(-1));
        roundtrip("address", AbiValue::address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap());
        roundtrip("bytes4", AbiValue::FixedBytes(vec![0xde, 0xad, 0xbe, 0xef]));
        roundtrip("bytes", AbiValue::Bytes((0u8..70).collect()));
        roundtrip("string", AbiValue::String("héllo wörld".into()));
        roundtrip("uint16[3]", AbiValue::Array(vec![AbiValue::uint(1), AbiValue::uint(2), AbiValue::uint(3)]));
        roundtrip(
            "string[]",
            AbiValue::Array(vec![AbiValue::String("a".into()), AbiValue::String("bc".into())]),
        );
        roundtrip(
            "(address,bytes)",
            AbiValue::Tuple(vec![
                AbiValue::address("0x0000000000000000000000000000000000000001").unwrap(),
                AbiValue::Bytes(vec![1, 2, 3]),
            ]),
        );
    }

    #[test]
    fn bool_words() {
        let t = ty("bool");
        assert_eq!(encode_value(&t, &AbiValue::Bool(true)).unwrap()[31], 1);
        assert_eq!(encode_value(&t, &AbiValue::Bool(false)).unwrap(), vec![0u8; 32]);
        let mut nonzero = [0u8; 32];
        nonzero[0] = 0x10;
        assert_eq!(decode_value(&t, &nonzero).unwrap(), AbiValue::Bool(true));
    }

    #[test]
    fn negative_ints_are_sign_extended() {
        let encoded = encode_value(&ty("int8"), &int(-1)).unwrap();
        assert_eq!(encoded, vec![0xff; 32]);
        let encoded = encode_value(&ty("int256"), &int(-2)).unwrap();
        assert_eq!(encoded[31], 0xfe);
        assert!(encoded[..31].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn out_of_range_integers_are_rejected() {
        assert!(matches!(
            encode_value(&ty("uint8"), &AbiValue::uint(256)),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            encode_value(&ty("int8"), &int(128)),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
        assert!(matches!(
            encode_value(&ty("int8"), &int(-129)),
            Err(EncodeError::ValueOutOfRange { .. })
        ));
        assert!(encode_value(&ty("int8"), &int(127)).is_ok());
    }

    #[test]
    fn address_is_left_padded() {
        let addr = AbiValue::address("742d35cc6634c0532925a3b844bc9e7595f0ab3d").unwrap();
        let encoded = encode_value(&ty("address"), &addr).unwrap();
        assert_eq!(&encoded[..12], &[0u8; 12]);
        assert_eq!(hex::encode(&encoded[12..]), "742d35cc6634c0532925a3b844bc9e7595f0ab3d");
    }

    #[test]
    fn fixed_bytes_are_right_padded_and_truncated_on_decode() {
        let encoded = encode_value(&ty("bytes2"), &AbiValue::FixedBytes(vec![0xab, 0xcd])).unwrap();
        assert_eq!(&encoded[..2], &[0xab, 0xcd]);
        assert!(encoded[2..].iter().all(|b| *b == 0));
        assert_eq!(
            decode_value(&ty("bytes2"), &encoded).unwrap(),
            AbiValue::FixedBytes(vec![0xab, 0xcd])
        );
        assert!(encode_value(&ty("bytes2"), &AbiValue::FixedBytes(vec![1, 2, 3])).is_err());
    }

    #[test]
    fn string_layout() {
        let encoded = encode_value_hex(&ty("string"), &AbiValue::String("hello".into()), HexStyle::Bare).unwrap();
        assert_eq!(
            encoded,
            concat!(
                "0000000000000000000000000000000000000000000000000000000000000005",
                "68656c6c6f000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn params_place_dynamic_data_after_head() {
        let types = [ty("string"), ty("uint256")];
        let values = [AbiValue::String("hi".into()), AbiValue::uint(7)];
        let encoded = encode_tuple(&types, &values).unwrap();
        // head: offset word + uint word
        assert_eq!(encoded[31], 64);
        assert_eq!(encoded[63], 7);
        assert_eq!(encoded[95], 2);
        assert_eq!(&encoded[96..98], b"hi");
        assert_eq!(decode_params(&types, &encoded, 0).unwrap(), values.to_vec());
    }

    #[test]
    fn shape_mismatch_fails_without_output() {
        let err = encode_value(&ty("uint256[2]"), &AbiValue::uint(1)).unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { .. }));
        let err = encode_value(&ty("uint256[2]"), &AbiValue::Array(vec![AbiValue::uint(1)])).unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { .. }));
        assert!(encode_tuple(&[ty("bool")], &[]).is_err());
    }

    #[test]
    fn truncated_and_malformed_input() {
        assert!(matches!(
            decode_value(&ty("uint256"), &[0u8; 31]),
            Err(DecodeError::Truncated { needed: 32, available: 31, .. })
        ));
        // length word claims 64 bytes, only 32 follow
        let mut data = vec![0u8; 64];
        data[31] = 64;
        assert!(matches!(
            decode_value(&ty("bytes"), &data),
            Err(DecodeError::Truncated { .. })
        ));
        // huge array count must not allocate
        let mut data = vec![0xffu8; 32];
        data[..24].fill(0);
        assert!(decode_value(&ty("uint256[]"), &data).is_err());
        assert!(matches!(
            decode_value_hex(&ty("uint256"), "0xzz"),
            Err(DecodeError::InvalidHex { .. })
        ));
    }

    #[test]
    fn descriptor_entry_points_name_unknown_types() {
        let hex = encode_typed("uint", &AbiValue::uint(5), HexStyle::Bare).unwrap();
        assert_eq!(hex, format!("{}05", "0".repeat(62)));
        assert_eq!(decode_typed("uint256", &format!("0x{hex}")).unwrap(), AbiValue::uint(5));

        assert_eq!(
            encode_typed("uint7", &AbiValue::uint(5), HexStyle::Bare).unwrap_err(),
            EncodeError::UnknownType { descriptor: "uint7".into() }
        );
        assert_eq!(
            decode_typed("strin[]", &hex).unwrap_err(),
            DecodeError::UnknownType { descriptor: "strin[]".into() }
        );
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let encoded = encode_value(&ty("bytes"), &AbiValue::Bytes(vec![0xff, 0xfe])).unwrap();
        assert!(matches!(
            decode_value(&ty("string"), &encoded),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }
}
