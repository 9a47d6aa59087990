//! Selector and event topic computation.
//!
//! A function selector is the first 4 bytes of the keccak256 hash of its
//! canonical signature, e.g.:
//!   keccak256("transfer(address,uint256)")[..4] → a9059cbb
//!
//! An event topic is the full 32-byte hash of the event signature, taken
//! over all inputs whether indexed or not.

use tiny_keccak::{Hasher, Keccak};

use crate::error::AbiError;
use crate::types::AbiType;

/// keccak256 of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    output
}

/// 4-byte selector of a canonical function signature `"name(type1,...)"`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// 32-byte topic of a canonical event signature `"Name(type1,...)"`.
pub fn event_topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// Render `name(type1,type2,...)`.
pub fn format_signature<T: std::fmt::Display>(name: &str, types: impl IntoIterator<Item = T>) -> String {
    let parts: Vec<String> = types.into_iter().map(|t| t.to_string()).collect();
    format!("{name}({})", parts.join(","))
}

/// Canonicalize `name(type,...)`: whitespace removed, type aliases such as
/// `uint` expanded. Fails when there is no parameter list or a type is unknown.
pub fn canonical_signature(signature: &str) -> Result<String, AbiError> {
    let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
    let open = compact.find('(').ok_or_else(|| AbiError::InvalidAbi {
        reason: format!("signature '{signature}' has no parameter list"),
    })?;
    let (name, params) = compact.split_at(open);
    match AbiType::parse(params)? {
        AbiType::Tuple(types) => Ok(format_signature(name, &types)),
        _ => Err(AbiError::InvalidAbi {
            reason: format!("signature '{signature}' has a malformed parameter list"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_selectors() {
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn erc20_transfer_topic() {
        assert_eq!(
            hex::encode(event_topic("Transfer(address,address,uint256)")),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn selector_is_deterministic() {
        let a = function_selector("approve(address,uint256)");
        let b = function_selector("approve(address,uint256)");
        assert_eq!(a, b);
        assert_ne!(a, function_selector("approve(address,uint128)"));
    }

    #[test]
    fn canonical_signatures() {
        assert_eq!(canonical_signature("transfer(address, uint)").unwrap(), "transfer(address,uint256)");
        assert_eq!(canonical_signature(" totalSupply() ").unwrap(), "totalSupply()");
        assert_eq!(canonical_signature("f((uint,bool)[],bytes)").unwrap(), "f((uint256,bool)[],bytes)");
        assert!(matches!(canonical_signature("transfer"), Err(AbiError::InvalidAbi { .. })));
        assert!(matches!(canonical_signature("f(uint7)"), Err(AbiError::UnknownType { .. })));
        assert!(canonical_signature("f(uint)[]").is_err());
    }

    #[test]
    fn signature_formatting() {
        assert_eq!(format_signature("f", ["uint256", "bytes"]), "f(uint256,bytes)");
        assert_eq!(format_signature::<&str>("g", []), "g()");
    }
}
