//! Contract address → ABI registry used to route log entries.
//!
//! Two JSON layouts load directly:
//! - an address map: `{ "<address>": [abi...] }`
//! - contract metadata: `{ "<name>": { "address": "...", "abi": [...] } }`,
//!   optionally wrapped in a top-level `"contracts"` object

use std::collections::HashMap;

use chainabi_core::{
    abi::{ContractAbi, EventDescriptor},
    error::AbiError,
    hexutil::{self, HexStyle},
};
use serde_json::Value;

/// An event with its signature topic precomputed as bare hex.
#[derive(Debug, Clone)]
pub(crate) struct TopicEvent {
    pub topic: String,
    pub event: EventDescriptor,
}

/// A registered contract.
#[derive(Debug, Clone)]
pub struct RegisteredContract {
    /// Name from a metadata document, if loaded from one
    pub name: Option<String>,
    /// Normalized address (lowercase, no `0x`)
    pub address: String,
    pub abi: ContractAbi,
    events: Vec<TopicEvent>,
}

impl RegisteredContract {
    fn new(name: Option<String>, address: &str, abi: ContractAbi) -> Self {
        // Anonymous events carry no signature topic.
        let events = abi
            .events()
            .filter(|e| !e.anonymous)
            .map(|e| TopicEvent {
                topic: HexStyle::Bare.encode(e.topic()),
                event: e.clone(),
            })
            .collect();
        Self {
            name,
            address: hexutil::normalize_address(address),
            abi,
            events,
        }
    }

    pub(crate) fn events(&self) -> &[TopicEvent] {
        &self.events
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, RegisteredContract>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `abi` under `address`, replacing any previous entry.
    pub fn register(&mut self, address: &str, abi: ContractAbi) {
        self.insert(RegisteredContract::new(None, address, abi));
    }

    pub fn register_named(&mut self, name: impl Into<String>, address: &str, abi: ContractAbi) {
        self.insert(RegisteredContract::new(Some(name.into()), address, abi));
    }

    /// Builder form of [`Self::register`].
    pub fn with_contract(mut self, address: &str, abi: ContractAbi) -> Self {
        self.register(address, abi);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AbiError> {
        let Value::Object(mut obj) = value else {
            return Err(AbiError::InvalidAbi {
                reason: "contract registry must be a JSON object".into(),
            });
        };
        if let Some(Value::Object(contracts)) = obj.remove("contracts") {
            obj = contracts;
        }

        let mut registry = Self::new();
        for (key, entry) in obj {
            match entry {
                Value::Array(_) => {
                    let abi = ContractAbi::from_value(entry).map_err(|e| in_entry(&key, e))?;
                    registry.register(&key, abi);
                }
                Value::Object(mut meta) => {
                    let address = match meta.remove("address") {
                        Some(Value::String(address)) => address,
                        _ => {
                            return Err(AbiError::InvalidAbi {
                                reason: format!("contract '{key}': missing string field 'address'"),
                            })
                        }
                    };
                    let abi = meta.remove("abi").ok_or_else(|| AbiError::InvalidAbi {
                        reason: format!("contract '{key}': missing field 'abi'"),
                    })?;
                    let abi = ContractAbi::from_value(abi).map_err(|e| in_entry(&key, e))?;
                    registry.register_named(key, &address, abi);
                }
                other => {
                    return Err(AbiError::InvalidAbi {
                        reason: format!("contract '{key}': expected an ABI array or metadata object, got {other}"),
                    })
                }
            }
        }
        Ok(registry)
    }

    /// Look up a contract by address in any case, with or without `0x`.
    pub fn get(&self, address: &str) -> Option<&RegisteredContract> {
        self.contracts.get(&hexutil::normalize_address(address))
    }

    pub fn abi(&self, address: &str) -> Option<&ContractAbi> {
        self.get(address).map(|c| &c.abi)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.contracts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    fn insert(&mut self, contract: RegisteredContract) {
        tracing::debug!(
            address = %contract.address,
            events = contract.events.len(),
            "registered contract ABI"
        );
        self.contracts.insert(contract.address.clone(), contract);
    }
}

fn in_entry(key: &str, err: AbiError) -> AbiError {
    match err {
        AbiError::InvalidAbi { reason } => AbiError::InvalidAbi {
            reason: format!("contract '{key}': {reason}"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transfer_abi() -> Value {
        json!([{
            "type": "event",
            "name": "Transfer",
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]
        }])
    }

    #[test]
    fn loads_address_map() {
        let doc = json!({ "0xA1AEB3E9D3D4B4C3B2B2F1E0D0C0B0A090807060": transfer_abi() });
        let registry = ContractRegistry::from_value(doc).unwrap();
        let contract = registry.get("a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060").unwrap();
        assert_eq!(contract.address, "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060");
        assert_eq!(
            contract.events()[0].topic,
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn loads_contract_metadata() {
        let doc = json!({
            "contracts": {
                "MyToken": {
                    "address": "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060",
                    "abi": transfer_abi(),
                    "bin": "6080"
                }
            }
        });
        let registry = ContractRegistry::from_value(doc).unwrap();
        assert_eq!(registry.len(), 1);
        let contract = registry.get("0xa1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060").unwrap();
        assert_eq!(contract.name.as_deref(), Some("MyToken"));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(ContractRegistry::from_value(json!([])).is_err());
        assert!(ContractRegistry::from_value(json!({ "Token": { "abi": [] } })).is_err());
        assert!(ContractRegistry::from_value(json!({ "abcd": 5 })).is_err());
    }
}
