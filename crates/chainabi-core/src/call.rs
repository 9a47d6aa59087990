//! Decoded function results.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::hexutil::HexStyle;
use crate::types::AbiValue;

/// Values returned by a function call, keyed by output name in declaration
/// order. Unnamed outputs are keyed by their position (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecodedResult {
    values: IndexMap<String, AbiValue>,
}

impl DecodedResult {
    /// Pair decoded `values` with output `names`, falling back to positions.
    pub fn from_named<'a>(names: impl IntoIterator<Item = &'a str>, values: Vec<AbiValue>) -> Self {
        let values = names
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(i, (name, value))| {
                let key = if name.is_empty() { i.to_string() } else { name.to_string() };
                (key, value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.values.get(name)
    }

    /// Value at declaration position `index`.
    pub fn at(&self, index: usize) -> Option<&AbiValue> {
        self.values.get_index(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_values(self) -> Vec<AbiValue> {
        self.values.into_values().collect()
    }

    pub fn to_json(&self, style: HexStyle) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json(style)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_outputs_use_positions() {
        let result = DecodedResult::from_named(
            ["", "balance"],
            vec![AbiValue::Bool(true), AbiValue::uint(10)],
        );
        assert_eq!(result.get("0"), Some(&AbiValue::Bool(true)));
        assert_eq!(result.get("balance"), Some(&AbiValue::uint(10)));
        assert_eq!(result.at(1), Some(&AbiValue::uint(10)));
    }
}
