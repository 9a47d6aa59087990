//! # chainabi-core
//!
//! Core types shared across all ChainABI crates: the contract ABI model,
//! the canonical type descriptors and native values, the hex convention,
//! selector hashing, raw log/receipt shapes and the error taxonomy.
//! The codec and the RPC client are both built on top of the definitions here.

pub mod abi;
pub mod call;
pub mod error;
pub mod event;
pub mod hexutil;
pub mod signature;
pub mod types;

pub use abi::{AbiEntry, ConstructorDescriptor, ContractAbi, EventDescriptor, EventParam, FunctionDescriptor, Param};
pub use call::DecodedResult;
pub use error::{AbiError, DecodeError, EncodeError};
pub use event::{DecodedLog, DecodedReceipt, LogEntry, RawLog, SearchLogReceipt, UndecodedLog};
pub use hexutil::HexStyle;
pub use signature::{canonical_signature, event_topic, function_selector, keccak256};
pub use types::{AbiType, AbiValue};
