//! Result decoder: contract return blobs back into named values.

use chainabi_core::{
    abi::Param,
    call::DecodedResult,
    error::DecodeError,
    signature::format_signature,
    types::{AbiType, AbiValue},
};

use crate::codec::{decode_hex, decode_params};

/// Decode a return blob against `types`, in declaration order.
///
/// The blob must hold at least the combined head size of the outputs.
pub fn decode_outputs(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }

    let head_len = types
        .iter()
        .fold(0usize, |acc, ty| acc.saturating_add(ty.head_len()));
    if data.len() < head_len {
        return Err(DecodeError::Truncated {
            ty: format_signature("", types),
            needed: head_len,
            available: data.len(),
        });
    }

    decode_params(types, data, 0)
}

pub fn decode_outputs_hex(types: &[AbiType], hex_str: &str) -> Result<Vec<AbiValue>, DecodeError> {
    decode_outputs(types, &decode_hex(hex_str)?)
}

/// Decode a return blob into a [`DecodedResult`] keyed by output name.
pub fn decode_result(outputs: &[Param], data: &[u8]) -> Result<DecodedResult, DecodeError> {
    let types: Vec<AbiType> = outputs.iter().map(|p| p.ty.clone()).collect();
    let values = decode_outputs(&types, data)?;
    Ok(DecodedResult::from_named(
        outputs.iter().map(|p| p.name.as_str()),
        values,
    ))
}

pub fn decode_result_hex(outputs: &[Param], hex_str: &str) -> Result<DecodedResult, DecodeError> {
    decode_result(outputs, &decode_hex(hex_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_tuple;

    fn ty(s: &str) -> AbiType {
        AbiType::parse(s).unwrap()
    }

    #[test]
    fn mixed_static_and_dynamic_outputs() {
        let types = [ty("uint256"), ty("string"), ty("bool")];
        let values = vec![
            AbiValue::uint(42),
            AbiValue::String("QTUM".into()),
            AbiValue::Bool(true),
        ];
        let blob = encode_tuple(&types, &values).unwrap();
        assert_eq!(decode_outputs(&types, &blob).unwrap(), values);
    }

    #[test]
    fn named_and_unnamed_outputs() {
        let outputs = [Param::new("amount", ty("uint256")), Param::new("", ty("address"))];
        let blob = concat!(
            "0x0000000000000000000000000000000000000000000000000000000000000007",
            "000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f0ab3d"
        );
        let result = decode_result_hex(&outputs, blob).unwrap();
        assert_eq!(result.get("amount"), Some(&AbiValue::uint(7)));
        assert_eq!(
            result.get("1"),
            Some(&AbiValue::address("742d35cc6634c0532925a3b844bc9e7595f0ab3d").unwrap())
        );
    }

    #[test]
    fn short_blob_is_truncated() {
        let err = decode_outputs(&[ty("uint256"), ty("uint256")], &[0u8; 40]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                ty: "(uint256,uint256)".into(),
                needed: 64,
                available: 40,
            }
        );
    }

    #[test]
    fn offset_past_end_is_rejected() {
        let mut blob = vec![0u8; 32];
        blob[31] = 0x40;
        assert!(matches!(
            decode_outputs(&[ty("bytes")], &blob),
            Err(DecodeError::OffsetOutOfRange { .. })
        ));
    }

    fn word(n: usize) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&(n as u64).to_be_bytes());
        w
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn huge_fixed_array_output_is_truncated_not_overflowed() {
        let types = [ty("uint256[288230376151711744]"), ty("uint256")];
        assert!(matches!(
            decode_outputs(&types, &[0u8; 64]),
            Err(DecodeError::Truncated { available: 64, .. })
        ));
    }

    #[test]
    fn aliased_offsets_cannot_inflate_output() {
        // bytes[] whose 64 elements all point at the same 1 KiB payload
        let count = 64;
        let payload_len = 1024;
        let mut blob = Vec::new();
        blob.extend_from_slice(&word(32));
        blob.extend_from_slice(&word(count));
        for _ in 0..count {
            blob.extend_from_slice(&word(count * 32));
        }
        blob.extend_from_slice(&word(payload_len));
        blob.extend(std::iter::repeat(0xab).take(payload_len));

        let err = decode_outputs(&[ty("bytes[]")], &blob).unwrap_err();
        assert!(matches!(err, DecodeError::OutputTooLarge { .. }), "got {err:?}");

        // the same payload referenced once decodes normally
        let once = encode_tuple(
            &[ty("bytes[]")],
            &[AbiValue::Array(vec![AbiValue::Bytes(vec![0xab; payload_len])])],
        )
        .unwrap();
        let decoded = decode_outputs(&[ty("bytes[]")], &once).unwrap();
        assert_eq!(decoded[0], AbiValue::Array(vec![AbiValue::Bytes(vec![0xab; payload_len])]));
    }

    #[test]
    fn no_outputs_decode_empty() {
        assert!(decode_result_hex(&[], "0x").unwrap().is_empty());
        assert!(decode_outputs(&[], &[1, 2, 3]).unwrap().is_empty());
    }
}
