//! # chainabi-codec
//!
//! Contract ABI codec built on the `chainabi-core` data model.
//!
//! ## Layout
//! - `codec` → single-value rules plus the head/tail parameter layout
//! - `encoder` → overload resolution and call payloads (selector ++ head ++ tail)
//! - `decoder` → return blobs back into named values
//! - `log_decoder` → topics[0] → event, topics[1..] → indexed params,
//!   `data` → non-indexed params, batched with Rayon
//! - `registry` → contract address → ABI lookup for log decoding

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod log_decoder;
pub mod registry;

pub use codec::{decode_typed, decode_value, decode_value_hex, encode_typed, encode_value, encode_value_hex};
pub use decoder::{decode_outputs, decode_outputs_hex, decode_result, decode_result_hex};
pub use encoder::AbiEncoder;
pub use log_decoder::{decode_search_log, LogDecoder};
pub use registry::ContractRegistry;
