//! Typed node request and response shapes.

use chainabi_core::event::RawLog;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A filter argument that accepts one value or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleOrMany<T> {
    Single(T),
    Many(Vec<T>),
}

impl<T> SingleOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            SingleOrMany::Single(one) => vec![one],
            SingleOrMany::Many(many) => many,
        }
    }
}

impl<T> From<Vec<T>> for SingleOrMany<T> {
    fn from(many: Vec<T>) -> Self {
        SingleOrMany::Many(many)
    }
}

impl From<String> for SingleOrMany<String> {
    fn from(one: String) -> Self {
        SingleOrMany::Single(one)
    }
}

impl From<&str> for SingleOrMany<String> {
    fn from(one: &str) -> Self {
        SingleOrMany::Single(one.to_string())
    }
}

/// `toBlock` value meaning "up to the chain tip".
pub const LATEST_BLOCK: i64 = -1;

/// Filter for `searchlogs` and `waitforlogs`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogFilter {
    pub from_block: u64,
    /// `None` searches to the chain tip
    pub to_block: Option<u64>,
    /// Contract addresses; empty matches all
    pub addresses: Vec<String>,
    /// Positional topic filter; `None` is a wildcard
    pub topics: Vec<Option<String>>,
    pub min_confirmations: Option<u32>,
}

impl LogFilter {
    pub fn new(from_block: u64) -> Self {
        Self {
            from_block,
            ..Default::default()
        }
    }

    pub fn to_block(mut self, to_block: u64) -> Self {
        self.to_block = Some(to_block);
        self
    }

    /// Restrict to one or more contract addresses.
    pub fn addresses(mut self, addresses: impl Into<SingleOrMany<String>>) -> Self {
        self.addresses = addresses
            .into()
            .into_vec()
            .into_iter()
            .map(|a| chainabi_core::hexutil::normalize_address(&a))
            .collect();
        self
    }

    pub fn topics(mut self, topics: Vec<Option<String>>) -> Self {
        self.topics = topics;
        self
    }

    pub fn min_confirmations(mut self, n: u32) -> Self {
        self.min_confirmations = Some(n);
        self
    }

    fn to_block_param(&self) -> Value {
        match self.to_block {
            Some(n) => json!(n),
            None => json!(LATEST_BLOCK),
        }
    }

    /// `searchlogs fromBlock toBlock {"addresses"} {"topics"} [minconf]`
    pub fn search_params(&self) -> Vec<Value> {
        let mut params = vec![
            json!(self.from_block),
            self.to_block_param(),
            json!({ "addresses": self.addresses }),
            json!({ "topics": self.topics }),
        ];
        if let Some(minconf) = self.min_confirmations {
            params.push(json!(minconf));
        }
        params
    }

    /// `waitforlogs fromBlock toBlock {"addresses", "topics"} [minconf]`
    pub fn wait_params(&self) -> Vec<Value> {
        let mut params = vec![
            json!(self.from_block),
            match self.to_block {
                Some(n) => json!(n),
                None => Value::Null,
            },
            json!({ "addresses": self.addresses, "topics": self.topics }),
        ];
        if let Some(minconf) = self.min_confirmations {
            params.push(json!(minconf));
        }
        params
    }
}

/// VM outcome of a `callcontract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    #[serde(default)]
    pub gas_used: u64,
    /// `"None"` on success, otherwise the exception kind (e.g. `"Revert"`)
    pub excepted: String,
    #[serde(default)]
    pub new_address: String,
    /// Hex-encoded return data
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub code_deposit: u64,
    #[serde(default)]
    pub gas_refunded: u64,
    #[serde(default)]
    pub deposit_size: u64,
    #[serde(default)]
    pub gas_for_deposit: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.excepted == "None"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReceipt {
    #[serde(default)]
    pub state_root: String,
    #[serde(default)]
    pub gas_used: u64,
    #[serde(default)]
    pub bloom: String,
    #[serde(default)]
    pub log: Vec<RawLog>,
}

/// Result of `callcontract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractCallResult {
    pub address: String,
    pub execution_result: ExecutionResult,
    #[serde(default)]
    pub transaction_receipt: Option<CallReceipt>,
}

/// Result of `sendtocontract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendToContractResult {
    pub txid: String,
    pub sender: String,
    pub hash160: String,
}

/// Result of `createcontract`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContractResult {
    pub txid: String,
    pub sender: String,
    pub hash160: String,
    pub address: String,
}

/// One entry of `listunspent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unspent {
    pub txid: String,
    pub vout: u32,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub script_pub_key: String,
    pub amount: f64,
    pub confirmations: u64,
    #[serde(default)]
    pub spendable: bool,
    #[serde(default)]
    pub solvable: bool,
    #[serde(default)]
    pub safe: bool,
}

/// Result of `getaccountinfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub balance: u64,
    #[serde(default)]
    pub storage: Value,
    #[serde(default)]
    pub code: String,
}

/// One flattened log entry from `waitforlogs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitLogEntry {
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
    pub contract_address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

impl WaitLogEntry {
    /// The log part of the entry, emitted by `contract_address`.
    pub fn raw_log(&self) -> RawLog {
        RawLog {
            address: self.contract_address.clone(),
            topics: self.topics.clone(),
            data: self.data.clone(),
        }
    }
}

/// Result of `waitforlogs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitForLogsResult {
    pub entries: Vec<WaitLogEntry>,
    pub count: u64,
    /// Block to resume waiting from
    #[serde(rename = "nextblock")]
    pub next_block: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_or_many_from_json() {
        let one: SingleOrMany<String> = serde_json::from_value(json!("ab")).unwrap();
        let many: SingleOrMany<String> = serde_json::from_value(json!(["ab", "cd"])).unwrap();
        assert_eq!(one.into_vec(), vec!["ab"]);
        assert_eq!(many.into_vec(), vec!["ab", "cd"]);
    }

    #[test]
    fn search_params_layout() {
        let filter = LogFilter::new(100)
            .addresses("0xA1AEB3E9D3D4B4C3B2B2F1E0D0C0B0A090807060")
            .topics(vec![Some("ddf252ad".into()), None]);
        assert_eq!(
            filter.search_params(),
            vec![
                json!(100),
                json!(-1),
                json!({ "addresses": ["a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060"] }),
                json!({ "topics": ["ddf252ad", null] }),
            ]
        );
        let waited = LogFilter::new(5).to_block(9).min_confirmations(1).wait_params();
        assert_eq!(waited.len(), 4);
        assert_eq!(waited[1], json!(9));
    }

    #[test]
    fn call_result_from_node_json() {
        let result: ContractCallResult = serde_json::from_value(json!({
            "address": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060",
            "executionResult": {
                "gasUsed": 21679,
                "excepted": "None",
                "newAddress": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060",
                "output": "00000000000000000000000000000000000000000000000000000000000003e8",
                "codeDeposit": 0,
                "gasRefunded": 0,
                "depositSize": 0,
                "gasForDeposit": 0
            },
            "transactionReceipt": {
                "stateRoot": "5a0d9cd5df18eb9d5ef6f4ce5e2c0d9f1ab3ec1e6a2ce2b8c3cb8f4b0f5f9e7a",
                "gasUsed": 21679,
                "bloom": "00",
                "log": []
            }
        }))
        .unwrap();
        assert!(result.execution_result.is_success());
        assert_eq!(result.transaction_receipt.unwrap().gas_used, 21679);
    }
}
