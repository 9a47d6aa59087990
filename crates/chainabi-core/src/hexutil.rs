//! Hex convention helpers.
//!
//! Binary payloads travel as lowercase hex strings. The node accepts and
//! returns bare hex, while most tooling prefixes it with `0x`, so every
//! parser here is prefix-agnostic and every renderer takes a [`HexStyle`].

use serde::{Deserialize, Serialize};

/// The fixed marker that may precede a hex payload.
pub const HEX_PREFIX: &str = "0x";

/// How hex-valued output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HexStyle {
    /// `0x`-prefixed lowercase hex.
    #[default]
    Prefixed,
    /// Bare lowercase hex, as the node expects it.
    Bare,
}

impl HexStyle {
    /// `Bare` when `strip` is set, `Prefixed` otherwise.
    pub fn from_strip_flag(strip: bool) -> Self {
        if strip {
            HexStyle::Bare
        } else {
            HexStyle::Prefixed
        }
    }

    /// Render `bytes` in this style.
    pub fn encode(self, bytes: impl AsRef<[u8]>) -> String {
        match self {
            HexStyle::Prefixed => format!("{HEX_PREFIX}{}", hex::encode(bytes)),
            HexStyle::Bare => hex::encode(bytes),
        }
    }

    /// Re-render an existing hex string (with or without prefix) in this style.
    pub fn apply(self, hex_str: &str) -> String {
        let bare = strip_prefix(hex_str).to_ascii_lowercase();
        match self {
            HexStyle::Prefixed => format!("{HEX_PREFIX}{bare}"),
            HexStyle::Bare => bare,
        }
    }
}

/// Strip a leading `0x`/`0X` marker if present.
pub fn strip_prefix(s: &str) -> &str {
    s.strip_prefix(HEX_PREFIX)
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string, with or without the `0x` marker.
pub fn decode(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_prefix(s.trim()))
}

/// Normalize a contract address for map lookups: lowercase, no marker.
pub fn normalize_address(address: &str) -> String {
    strip_prefix(address.trim()).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_is_prefix_agnostic() {
        assert_eq!(decode("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(decode("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert!(decode("0x0").is_err());
    }

    #[test]
    fn styles_render_consistently() {
        assert_eq!(HexStyle::Prefixed.encode([0xab]), "0xab");
        assert_eq!(HexStyle::Bare.encode([0xab]), "ab");
        assert_eq!(HexStyle::Bare.apply("0xABCD"), "abcd");
        assert_eq!(HexStyle::Prefixed.apply("abcd"), "0xabcd");
    }

    #[test]
    fn address_normalization() {
        assert_eq!(
            normalize_address("0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
            "d8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
    }
}
