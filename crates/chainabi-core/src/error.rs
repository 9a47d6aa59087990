//! Error types for ABI loading, encoding and decoding.

use thiserror::Error;

/// Errors raised while loading an ABI definition or parsing a type descriptor.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("Unknown ABI type descriptor: '{descriptor}'")]
    UnknownType { descriptor: String },

    #[error("Invalid ABI: {reason}")]
    InvalidAbi { reason: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Validation errors raised while encoding a call or a single value.
/// Encoding never returns partial output when one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Unknown ABI type descriptor: '{descriptor}'")]
    UnknownType { descriptor: String },

    #[error("Function '{name}' not found in ABI")]
    FunctionNotFound { name: String },

    #[error("Ambiguous call to '{name}': candidates {}", candidates.join(", "))]
    AmbiguousSignature { name: String, candidates: Vec<String> },

    #[error("Argument count mismatch for '{method}': expected {expected}, got {got}")]
    ArgumentCount {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("Type mismatch for {ty}: {reason}")]
    TypeMismatch { ty: String, reason: String },

    #[error("Value {value} does not fit in {ty}")]
    ValueOutOfRange { ty: String, value: String },

    #[error("Invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("ABI has no constructor definition")]
    NoConstructor,

    #[error("Invalid ABI: {reason}")]
    InvalidAbi { reason: String },
}

/// Errors raised while decoding a return blob or a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unknown ABI type descriptor: '{descriptor}'")]
    UnknownType { descriptor: String },

    #[error("Data too short for {ty}: need {needed} bytes, have {available}")]
    Truncated {
        ty: String,
        needed: usize,
        available: usize,
    },

    #[error("Offset {offset} for {ty} is outside the {len}-byte payload")]
    OffsetOutOfRange { ty: String, offset: String, len: usize },

    #[error("Invalid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("Decoded {ty} exceeds the {limit}-byte output limit for this payload")]
    OutputTooLarge { ty: String, limit: usize },

    #[error("Invalid UTF-8 in string value: {reason}")]
    InvalidUtf8 { reason: String },

    #[error("No ABI registered for contract address {address}")]
    NoAbiForAddress { address: String },

    #[error("No event in the ABI of {address} matches topic {topic}")]
    EventNotFound { address: String, topic: String },

    #[error("Missing topic {index} for parameter '{param}'")]
    MissingTopic { param: String, index: usize },

    #[error("Invalid topic {index}: {reason}")]
    InvalidTopic { index: usize, reason: String },

    #[error("Function '{name}' not found in ABI")]
    FunctionNotFound { name: String },

    #[error("Invalid ABI: {reason}")]
    InvalidAbi { reason: String },
}

impl From<AbiError> for EncodeError {
    fn from(err: AbiError) -> Self {
        match err {
            AbiError::UnknownType { descriptor } => EncodeError::UnknownType { descriptor },
            other => EncodeError::InvalidAbi {
                reason: other.to_string(),
            },
        }
    }
}

impl From<AbiError> for DecodeError {
    fn from(err: AbiError) -> Self {
        match err {
            AbiError::UnknownType { descriptor } => DecodeError::UnknownType { descriptor },
            other => DecodeError::InvalidAbi {
                reason: other.to_string(),
            },
        }
    }
}
