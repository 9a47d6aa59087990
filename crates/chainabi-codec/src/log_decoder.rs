//! Event log decoder.
//!
//! A log is routed by its emitting address to a registered ABI, matched to
//! an event by `topics[0]`, then decoded: indexed inputs from `topics[1..]`,
//! the rest from `data`. Indexed inputs of dynamic or composite type are
//! stored in the topic as a hash and come back as that opaque 32-byte value.

use chainabi_core::{
    abi::EventDescriptor,
    error::DecodeError,
    event::{topics_equal, DecodedLog, DecodedReceipt, LogEntry, RawLog, SearchLogReceipt, UndecodedLog},
    hexutil::{self, HexStyle},
    types::{AbiType, AbiValue},
};
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::codec::{decode_hex, decode_value};
use crate::decoder::decode_outputs;
use crate::registry::ContractRegistry;

/// Decodes raw logs against a [`ContractRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct LogDecoder<'r> {
    registry: &'r ContractRegistry,
    hex_style: HexStyle,
}

impl<'r> LogDecoder<'r> {
    pub fn new(registry: &'r ContractRegistry) -> Self {
        Self {
            registry,
            hex_style: HexStyle::default(),
        }
    }

    /// Render hex-valued fields and addresses in `style`.
    pub fn with_hex_style(mut self, style: HexStyle) -> Self {
        self.hex_style = style;
        self
    }

    pub fn hex_style(&self) -> HexStyle {
        self.hex_style
    }

    /// Decode a single log entry.
    pub fn decode_log(&self, raw: &RawLog) -> Result<DecodedLog, DecodeError> {
        self.decode_at(0, raw)
    }

    /// Decode a batch in parallel. Output order matches input order; entries
    /// that fail are kept as [`LogEntry::Undecoded`] with their cause.
    pub fn decode_logs(&self, raws: &[RawLog]) -> Vec<LogEntry> {
        raws.par_iter()
            .enumerate()
            .map(|(index, raw)| match self.decode_at(index, raw) {
                Ok(decoded) => LogEntry::Decoded(decoded),
                Err(error) => {
                    tracing::warn!(index, address = %raw.address, %error, "log entry left undecoded");
                    LogEntry::Undecoded(UndecodedLog {
                        index,
                        log: raw.clone(),
                        error,
                        hex_style: self.hex_style,
                    })
                }
            })
            .collect()
    }

    fn decode_at(&self, index: usize, raw: &RawLog) -> Result<DecodedLog, DecodeError> {
        let contract = self
            .registry
            .get(&raw.address)
            .ok_or_else(|| DecodeError::NoAbiForAddress {
                address: raw.address.clone(),
            })?;

        let topic0 = raw.signature_topic().ok_or_else(|| DecodeError::MissingTopic {
            param: "event signature".into(),
            index: 0,
        })?;

        let matched = contract
            .events()
            .iter()
            .find(|e| topics_equal(topic0, &e.topic))
            .ok_or_else(|| DecodeError::EventNotFound {
                address: raw.address.clone(),
                topic: topic0.to_string(),
            })?;

        let fields = decode_fields(&matched.event, raw)?;
        Ok(DecodedLog {
            index,
            address: raw.address.clone(),
            event: matched.event.name.clone(),
            signature: matched.event.signature(),
            fields,
            hex_style: self.hex_style,
        })
    }
}

/// Decode every receipt's `log` array against `registry`.
///
/// With `strip_hex_prefix`, hex-valued fields, addresses and hashes render
/// without `0x`. Receipts keep their order, and so do their entries.
pub fn decode_search_log(
    receipts: &[SearchLogReceipt],
    registry: &ContractRegistry,
    strip_hex_prefix: bool,
) -> Vec<DecodedReceipt> {
    let style = HexStyle::from_strip_flag(strip_hex_prefix);
    let decoder = LogDecoder::new(registry).with_hex_style(style);
    receipts
        .iter()
        .map(|receipt| DecodedReceipt::from_receipt(receipt, decoder.decode_logs(&receipt.log), style))
        .collect()
}

fn decode_fields(event: &EventDescriptor, raw: &RawLog) -> Result<IndexMap<String, AbiValue>, DecodeError> {
    let data = decode_hex(&raw.data)?;
    let data_types: Vec<AbiType> = event.data_inputs().iter().map(|p| p.ty().clone()).collect();
    let mut data_values = decode_outputs(&data_types, &data)?.into_iter();

    let mut fields = IndexMap::with_capacity(event.inputs.len());
    let mut topic_index = 1;
    for (position, input) in event.inputs.iter().enumerate() {
        let value = if input.indexed {
            let topic = raw.topics.get(topic_index).ok_or_else(|| DecodeError::MissingTopic {
                param: input.name().to_string(),
                index: topic_index,
            })?;
            let value = decode_topic(input.ty(), topic, topic_index)?;
            topic_index += 1;
            value
        } else {
            data_values.next().ok_or_else(|| DecodeError::Truncated {
                ty: input.ty().to_string(),
                needed: data.len() + 32,
                available: data.len(),
            })?
        };

        let key = if input.name().is_empty() {
            position.to_string()
        } else {
            input.name().to_string()
        };
        fields.insert(key, value);
    }
    Ok(fields)
}

fn decode_topic(ty: &AbiType, topic: &str, index: usize) -> Result<AbiValue, DecodeError> {
    let bytes = hexutil::decode(topic).map_err(|e| DecodeError::InvalidTopic {
        index,
        reason: e.to_string(),
    })?;
    if bytes.len() != 32 {
        return Err(DecodeError::InvalidTopic {
            index,
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }
    if ty.is_hashed_in_topic() {
        Ok(AbiValue::FixedBytes(bytes))
    } else {
        decode_value(ty, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainabi_core::abi::ContractAbi;

    const TOKEN: &str = "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060";

    fn registry() -> ContractRegistry {
        let abi = ContractAbi::from_json(
            r#"[
                {"type":"event","name":"Named","inputs":[
                    {"name":"label","type":"string","indexed":true},
                    {"name":"","type":"uint8","indexed":true},
                    {"name":"note","type":"string","indexed":false}
                ]},
                {"type":"event","name":"Hidden","anonymous":true,"inputs":[]}
            ]"#,
        )
        .unwrap();
        ContractRegistry::new().with_contract(TOKEN, abi)
    }

    fn named_log() -> RawLog {
        let topic = HexStyle::Bare.encode(chainabi_core::event_topic("Named(string,uint8,string)"));
        RawLog {
            address: TOKEN.into(),
            topics: vec![
                topic,
                "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470".into(),
                "0000000000000000000000000000000000000000000000000000000000000009".into(),
            ],
            data: concat!(
                "0000000000000000000000000000000000000000000000000000000000000020",
                "0000000000000000000000000000000000000000000000000000000000000002",
                "6869000000000000000000000000000000000000000000000000000000000000"
            )
            .into(),
        }
    }

    #[test]
    fn indexed_string_is_opaque_hash() {
        let registry = registry();
        let decoded = LogDecoder::new(&registry).decode_log(&named_log()).unwrap();
        assert_eq!(decoded.event, "Named");
        let keys: Vec<&str> = decoded.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["label", "1", "note"]);
        assert_eq!(
            decoded.field_json("label").unwrap(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(decoded.field("1"), Some(&AbiValue::uint(9)));
        assert_eq!(decoded.field("note"), Some(&AbiValue::String("hi".into())));
    }

    #[test]
    fn missing_indexed_topic() {
        let registry = registry();
        let mut log = named_log();
        log.topics.truncate(2);
        assert_eq!(
            LogDecoder::new(&registry).decode_log(&log).unwrap_err(),
            DecodeError::MissingTopic { param: "".into(), index: 2 }
        );
    }

    #[test]
    fn routing_failures() {
        let registry = registry();
        let decoder = LogDecoder::new(&registry);

        let mut unknown = named_log();
        unknown.address = "0000000000000000000000000000000000000001".into();
        assert!(matches!(decoder.decode_log(&unknown), Err(DecodeError::NoAbiForAddress { .. })));

        let mut no_topics = named_log();
        no_topics.topics.clear();
        assert!(matches!(decoder.decode_log(&no_topics), Err(DecodeError::MissingTopic { index: 0, .. })));

        // anonymous events are never matched
        let mut anonymous = named_log();
        anonymous.topics = vec![HexStyle::Bare.encode(chainabi_core::event_topic("Hidden()"))];
        assert!(matches!(decoder.decode_log(&anonymous), Err(DecodeError::EventNotFound { .. })));
    }

    #[test]
    fn batch_keeps_order_and_indices() {
        let registry = registry();
        let mut bad = named_log();
        bad.data = "zz".into();
        let entries = LogDecoder::new(&registry).decode_logs(&[named_log(), bad, named_log()]);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_decoded());
        assert!(matches!(entries[1].error(), Some(DecodeError::InvalidHex { .. })));
        assert_eq!(entries[2].decoded().map(|d| d.index), Some(2));
    }

    #[test]
    fn undecoded_entries_follow_batch_hex_style() {
        let registry = registry();
        let mut stray = named_log();
        stray.address = "0x00000000000000000000000000000000000000AB".into();
        stray.topics[0] = format!("0x{}", stray.topics[0]);
        stray.data = format!("0x{}", stray.data);

        let entries = LogDecoder::new(&registry)
            .with_hex_style(HexStyle::Bare)
            .decode_logs(std::slice::from_ref(&stray));
        let json = entries[0].to_json();
        assert_eq!(json["address"], "00000000000000000000000000000000000000ab");
        assert!(!json["topics"][0].as_str().unwrap().starts_with("0x"));
        assert!(!json["data"].as_str().unwrap().starts_with("0x"));

        // default style is prefixed; malformed hex is echoed as received
        let mut bad = named_log();
        bad.data = "zz".into();
        let entries = LogDecoder::new(&registry).decode_logs(&[bad]);
        let json = entries[0].to_json();
        assert_eq!(json["address"], format!("0x{TOKEN}"));
        assert_eq!(json["data"], "zz");
    }
}
