//! Contract ABI definitions.
//!
//! ABI JSON is loaded into a closed set of entry kinds discriminated by the
//! `type` tag. Every parameter type string is parsed into an [`AbiType`]
//! during deserialization, so an ABI that loads is an ABI whose descriptors
//! all resolve to a codec rule.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::AbiError;
use crate::signature::{event_topic, format_signature, function_selector};
use crate::types::AbiType;

/// Wire shape of a parameter, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indexed: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    components: Vec<RawParam>,
    #[serde(rename = "internalType", default, skip_serializing_if = "Option::is_none")]
    internal_type: Option<String>,
}

/// A function input/output or constructor parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParam", into = "RawParam")]
pub struct Param {
    /// Parameter name; empty when the ABI leaves it unnamed
    pub name: String,
    /// Parsed type
    pub ty: AbiType,
    /// Type string exactly as it appeared in the ABI (e.g. `tuple[]`)
    pub type_name: String,
    /// Named tuple components, empty for non-tuple types
    pub components: Vec<Param>,
}

impl TryFrom<RawParam> for Param {
    type Error = AbiError;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let components = raw
            .components
            .into_iter()
            .map(Param::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let component_types: Vec<AbiType> = components.iter().map(|c| c.ty.clone()).collect();
        let ty = AbiType::from_descriptor(&raw.ty, &component_types)?;
        Ok(Self {
            name: raw.name,
            ty,
            type_name: raw.ty,
            components,
        })
    }
}

impl From<Param> for RawParam {
    fn from(p: Param) -> Self {
        RawParam {
            name: p.name,
            ty: p.type_name,
            indexed: None,
            components: p.components.into_iter().map(RawParam::from).collect(),
            internal_type: None,
        }
    }
}

impl Param {
    pub fn new(name: impl Into<String>, ty: AbiType) -> Self {
        let type_name = ty.to_string();
        Self {
            name: name.into(),
            ty,
            type_name,
            components: Vec::new(),
        }
    }
}

/// An event input: a parameter plus its `indexed` flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParam", into = "RawParam")]
pub struct EventParam {
    pub param: Param,
    /// Stored as a topic rather than in the data blob
    pub indexed: bool,
}

impl TryFrom<RawParam> for EventParam {
    type Error = AbiError;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let indexed = raw.indexed.unwrap_or(false);
        Ok(Self {
            param: Param::try_from(raw)?,
            indexed,
        })
    }
}

impl From<EventParam> for RawParam {
    fn from(p: EventParam) -> Self {
        let mut raw = RawParam::from(p.param);
        raw.indexed = Some(p.indexed);
        raw
    }
}

impl EventParam {
    pub fn new(name: impl Into<String>, ty: AbiType, indexed: bool) -> Self {
        Self {
            param: Param::new(name, ty),
            indexed,
        }
    }

    pub fn name(&self) -> &str {
        &self.param.name
    }

    pub fn ty(&self) -> &AbiType {
        &self.param.ty
    }
}

/// A callable contract function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Param>,
    /// Informational only
    #[serde(default)]
    pub constant: bool,
    /// Informational only
    #[serde(default)]
    pub payable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
}

impl FunctionDescriptor {
    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        format_signature(&self.name, self.inputs.iter().map(|p| &p.ty))
    }

    /// 4-byte selector of [`Self::signature`].
    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }

    /// `true` when the function does not modify state.
    pub fn is_read_only(&self) -> bool {
        self.constant || matches!(self.state_mutability.as_deref(), Some("view" | "pure"))
    }
}

/// A contract event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<EventParam>,
    /// Anonymous events carry no signature topic and cannot be matched
    #[serde(default)]
    pub anonymous: bool,
}

impl EventDescriptor {
    /// Canonical signature over all inputs, indexed or not.
    pub fn signature(&self) -> String {
        format_signature(&self.name, self.inputs.iter().map(|p| p.ty()))
    }

    /// 32-byte topic hash of [`Self::signature`].
    pub fn topic(&self) -> [u8; 32] {
        event_topic(&self.signature())
    }

    /// Indexed inputs in declaration order (decoded from `topics[1..]`).
    pub fn indexed_inputs(&self) -> Vec<&EventParam> {
        self.inputs.iter().filter(|p| p.indexed).collect()
    }

    /// Non-indexed inputs in declaration order (decoded from `data`).
    pub fn data_inputs(&self) -> Vec<&EventParam> {
        self.inputs.iter().filter(|p| !p.indexed).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default)]
    pub payable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FallbackDescriptor {
    #[serde(default)]
    pub payable: bool,
}

/// A custom error declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<Param>,
}

/// One entry of an ABI definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiEntry {
    Function(FunctionDescriptor),
    Event(EventDescriptor),
    Constructor(ConstructorDescriptor),
    Fallback(FallbackDescriptor),
    Receive(FallbackDescriptor),
    Error(ErrorDescriptor),
}

/// A loaded, validated contract ABI.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ContractAbi {
    entries: Vec<AbiEntry>,
}

impl ContractAbi {
    pub fn new(entries: Vec<AbiEntry>) -> Self {
        Self { entries }
    }

    /// Load from ABI JSON: either the entry array itself or an object with
    /// an `abi` field holding it.
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AbiError> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("abi") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(AbiError::InvalidAbi {
                        reason: "expected an array of ABI entries".into(),
                    })
                }
            },
            other => {
                return Err(AbiError::InvalidAbi {
                    reason: format!("expected an array of ABI entries, got {other}"),
                })
            }
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| parse_entry(item).map_err(|e| with_entry_index(i, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.entries.iter().filter_map(|e| match e {
            AbiEntry::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &EventDescriptor> {
        self.entries.iter().filter_map(|e| match e {
            AbiEntry::Event(ev) => Some(ev),
            _ => None,
        })
    }

    /// All overloads sharing `name`, in ABI order.
    pub fn functions_named<'s, 'n>(&'s self, name: &'n str) -> impl Iterator<Item = &'s FunctionDescriptor> + 'n
    where
        's: 'n,
    {
        self.functions().filter(move |f| f.name == name)
    }

    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.entries.iter().find_map(|e| match e {
            AbiEntry::Constructor(c) => Some(c),
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for ContractAbi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ContractAbi::from_value(value).map_err(serde::de::Error::custom)
    }
}

/// Compilers historically omitted `type` for functions.
fn parse_entry(mut item: Value) -> Result<AbiEntry, AbiError> {
    if let Value::Object(obj) = &mut item {
        obj.entry("type").or_insert_with(|| Value::String("function".into()));
    }
    Ok(serde_json::from_value(item)?)
}

fn with_entry_index(index: usize, err: AbiError) -> AbiError {
    match err {
        AbiError::Serde(e) => AbiError::InvalidAbi {
            reason: format!("entry {index}: {e}"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_ABI: &str = r#"[
        {"type": "constructor", "inputs": [{"name": "supply", "type": "uint256"}], "payable": false},
        {"type": "function", "name": "transfer", "constant": false,
         "inputs": [{"name": "to", "type": "address"}, {"name": "value", "type": "uint256"}],
         "outputs": [{"name": "", "type": "bool"}]},
        {"name": "balanceOf", "constant": true,
         "inputs": [{"name": "owner", "type": "address"}],
         "outputs": [{"name": "balance", "type": "uint256"}]},
        {"type": "event", "name": "Transfer", "anonymous": false,
         "inputs": [{"name": "from", "type": "address", "indexed": true},
                    {"name": "to", "type": "address", "indexed": true},
                    {"name": "value", "type": "uint256", "indexed": false}]},
        {"type": "fallback", "payable": true}
    ]"#;

    #[test]
    fn loads_all_entry_kinds() {
        let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
        assert_eq!(abi.entries().len(), 5);
        assert_eq!(abi.functions().count(), 2);
        assert_eq!(abi.events().count(), 1);
        assert_eq!(abi.constructor().unwrap().inputs.len(), 1);
    }

    #[test]
    fn missing_type_defaults_to_function() {
        let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
        let f = abi.functions_named("balanceOf").next().unwrap();
        assert!(f.is_read_only());
        assert_eq!(f.signature(), "balanceOf(address)");
    }

    #[test]
    fn lookup_results_outlive_the_name() {
        let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
        let found: Vec<&FunctionDescriptor> = {
            let name = format!(" {} ", "transfer");
            abi.functions_named(name.trim()).collect()
        };
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].signature(), "transfer(address,uint256)");
    }

    #[test]
    fn signatures_and_hashes() {
        let abi = ContractAbi::from_json(TOKEN_ABI).unwrap();
        let transfer = abi.functions_named("transfer").next().unwrap();
        assert_eq!(transfer.selector(), [0xa9, 0x05, 0x9c, 0xbb]);

        let event = abi.events().next().unwrap();
        assert_eq!(event.signature(), "Transfer(address,address,uint256)");
        assert_eq!(
            hex::encode(event.topic()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert_eq!(event.indexed_inputs().len(), 2);
        assert_eq!(event.data_inputs()[0].name(), "value");
    }

    #[test]
    fn unknown_type_fails_load() {
        let bad = r#"[{"type": "function", "name": "f", "inputs": [{"name": "x", "type": "uint7"}]}]"#;
        let err = ContractAbi::from_json(bad).unwrap_err();
        assert!(err.to_string().contains("uint7"), "{err}");
    }

    #[test]
    fn tuple_components_resolve() {
        let json = r#"[{"type": "function", "name": "submit", "inputs": [
            {"name": "orders", "type": "tuple[]", "components": [
                {"name": "maker", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ]}
        ]}]"#;
        let abi = ContractAbi::from_json(json).unwrap();
        let f = abi.functions().next().unwrap();
        assert_eq!(f.signature(), "submit((address,uint256)[])");
    }

    #[test]
    fn accepts_metadata_object_with_abi_field() {
        let wrapped = format!(r#"{{"abi": {TOKEN_ABI}}}"#);
        assert_eq!(ContractAbi::from_json(&wrapped).unwrap().functions().count(), 2);
    }
}
