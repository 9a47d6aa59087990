//! Raw and decoded log types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::DecodeError;
use crate::hexutil::{self, HexStyle};
use crate::types::AbiValue;

/// A raw log entry as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract
    pub address: String,
    /// topics[0] is the event topic for non-anonymous events;
    /// topics[1..] hold indexed parameters
    #[serde(default)]
    pub topics: Vec<String>,
    /// Concatenated ABI encoding of the non-indexed parameters
    #[serde(default)]
    pub data: String,
}

impl RawLog {
    /// The signature topic, if present.
    pub fn signature_topic(&self) -> Option<&str> {
        self.topics.first().map(|s| s.as_str())
    }
}

/// A transaction receipt as returned by `searchlogs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLogReceipt {
    #[serde(default)]
    pub block_hash: String,
    pub block_number: u64,
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction_index: u32,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub cumulative_gas_used: u64,
    #[serde(default)]
    pub gas_used: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excepted: Option<String>,
    #[serde(default)]
    pub log: Vec<RawLog>,
}

/// A log entry matched to an event and decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    /// Position of the entry in its batch
    pub index: usize,
    /// Emitting contract, as reported by the node
    pub address: String,
    /// Matched event name, e.g. "Transfer"
    pub event: String,
    /// Canonical event signature
    pub signature: String,
    /// Decoded fields in declaration order
    pub fields: IndexMap<String, AbiValue>,
    /// Rendering of hex-valued fields
    pub hex_style: HexStyle,
}

impl DecodedLog {
    /// Get a field value by name.
    pub fn field(&self, name: &str) -> Option<&AbiValue> {
        self.fields.get(name)
    }

    /// Get a field rendered in this log's hex style.
    pub fn field_json(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(|v| v.to_json(self.hex_style))
    }

    pub fn to_json(&self) -> Value {
        let fields: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json(self.hex_style)))
            .collect();
        json!({
            "address": self.hex_style.apply(&self.address),
            "event": self.event,
            "signature": self.signature,
            "fields": fields,
        })
    }
}

/// A log entry that could not be decoded, kept alongside its cause.
#[derive(Debug, Clone, PartialEq)]
pub struct UndecodedLog {
    pub index: usize,
    pub log: RawLog,
    pub error: DecodeError,
    pub hex_style: HexStyle,
}

impl UndecodedLog {
    /// The raw entry rendered in the batch hex style. Malformed hex is
    /// passed through untouched so the cause stays visible.
    pub fn to_json(&self) -> Value {
        let style = |s: &str| {
            if s.is_empty() || hexutil::decode(s).is_err() {
                s.to_string()
            } else {
                self.hex_style.apply(s)
            }
        };
        let topics: Vec<String> = self.log.topics.iter().map(|t| style(t)).collect();
        json!({
            "address": style(&self.log.address),
            "topics": topics,
            "data": style(&self.log.data),
            "error": self.error.to_string(),
        })
    }
}

/// Outcome of decoding one entry of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Decoded(DecodedLog),
    Undecoded(UndecodedLog),
}

impl LogEntry {
    pub fn is_decoded(&self) -> bool {
        matches!(self, LogEntry::Decoded(_))
    }

    pub fn decoded(&self) -> Option<&DecodedLog> {
        match self {
            LogEntry::Decoded(d) => Some(d),
            LogEntry::Undecoded(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DecodeError> {
        match self {
            LogEntry::Decoded(_) => None,
            LogEntry::Undecoded(u) => Some(&u.error),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            LogEntry::Decoded(d) => d.to_json(),
            LogEntry::Undecoded(u) => u.to_json(),
        }
    }
}

impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A `searchlogs` receipt whose log entries have been decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedReceipt {
    pub block_hash: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u32,
    pub from: String,
    pub to: String,
    pub cumulative_gas_used: u64,
    pub gas_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub log: Vec<LogEntry>,
}

impl DecodedReceipt {
    /// Copy the receipt metadata, rendering hashes and addresses in `style`,
    /// and attach the decoded entries.
    pub fn from_receipt(receipt: &SearchLogReceipt, log: Vec<LogEntry>, style: HexStyle) -> Self {
        let render = |s: &str| if s.is_empty() { String::new() } else { style.apply(s) };
        Self {
            block_hash: render(&receipt.block_hash),
            block_number: receipt.block_number,
            transaction_hash: render(&receipt.transaction_hash),
            transaction_index: receipt.transaction_index,
            from: render(&receipt.from),
            to: render(&receipt.to),
            cumulative_gas_used: receipt.cumulative_gas_used,
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address.as_deref().map(|a| render(a)),
            log,
        }
    }
}

/// Topics compare case- and prefix-insensitively.
pub fn topics_equal(a: &str, b: &str) -> bool {
    hexutil::strip_prefix(a).eq_ignore_ascii_case(hexutil::strip_prefix(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_deserializes_from_node_json() {
        let json = r#"{
            "blockHash": "975326b65c20d0b8500f00a59f76b08a98513fff7ce0484382534a47b55f8985",
            "blockNumber": 4063,
            "transactionHash": "c1816e5fbdd4d1cc62394be83c7c7130ccd2aadefcd91e789c1a0b33ec093fef",
            "transactionIndex": 2,
            "from": "6035164523d4e9c06f4a8c3f6a20fa6ed6b2f5b4",
            "to": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060",
            "cumulativeGasUsed": 39174,
            "gasUsed": 39174,
            "contractAddress": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060",
            "log": [{"address": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060", "topics": [], "data": ""}]
        }"#;
        let receipt: SearchLogReceipt = serde_json::from_str(json).unwrap();
        assert_eq!(receipt.block_number, 4063);
        assert_eq!(receipt.log.len(), 1);
        assert!(receipt.excepted.is_none());
    }

    #[test]
    fn topic_comparison_ignores_prefix_and_case() {
        assert!(topics_equal("0xDDF2", "ddf2"));
        assert!(!topics_equal("ddf2", "ddf3"));
    }
}
