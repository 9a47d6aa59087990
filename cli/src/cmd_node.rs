//! Commands that talk to a node.

use anyhow::{Context, Result};
use chainabi_codec::decode_search_log;
use chainabi_core::hexutil::HexStyle;
use chainabi_rpc::{config::ENV_RPC_URL, Contract, LogFilter, NodeClient, RpcEndpoint};
use serde_json::json;

use crate::{load_encoder, load_registry, parse_args, print_json};

pub struct CallArgs<'a> {
    pub abi_path: &'a str,
    pub address: &'a str,
    pub function: &'a str,
    pub args_json: &'a str,
    pub sender: Option<&'a str>,
    pub strip_hex_prefix: bool,
}

/// `--rpc` wins over `CHAINABI_RPC_URL`; the timeout always comes from the environment.
fn connect(rpc: Option<&str>) -> Result<NodeClient> {
    let endpoint = RpcEndpoint::from_lookup(|name| match (name, rpc) {
        (ENV_RPC_URL, Some(url)) => Some(url.to_string()),
        _ => std::env::var(name).ok(),
    })
    .context("resolve node endpoint (pass --rpc or set CHAINABI_RPC_URL)")?;
    tracing::debug!(timeout_ms = endpoint.http.request_timeout_ms, "connecting to node");
    NodeClient::http(&endpoint).context("build HTTP transport")
}

pub async fn call(rpc: Option<&str>, call: CallArgs<'_>) -> Result<()> {
    let encoder = load_encoder(call.abi_path)?;
    let args = parse_args(call.args_json)?;

    let mut contract = Contract::new(connect(rpc)?, call.address, encoder.abi().clone());
    if let Some(sender) = call.sender {
        contract = contract.with_sender(sender);
    }

    let result = contract
        .call_json(call.function, &args)
        .await
        .with_context(|| format!("call '{}' on {}", call.function, contract.address()))?;
    print_json(&result.to_json(HexStyle::from_strip_flag(call.strip_hex_prefix)))
}

pub async fn search_logs(
    rpc: Option<&str>,
    registry_path: &str,
    from_block: u64,
    to_block: Option<u64>,
    addresses: Vec<String>,
    strip_hex_prefix: bool,
) -> Result<()> {
    let registry = load_registry(registry_path)?;
    let client = connect(rpc)?;

    let addresses = if addresses.is_empty() {
        registry.addresses().map(str::to_string).collect()
    } else {
        addresses
    };
    let mut filter = LogFilter::new(from_block).addresses(addresses);
    if let Some(to_block) = to_block {
        filter = filter.to_block(to_block);
    }

    let receipts = client
        .search_logs(&filter)
        .await
        .with_context(|| format!("searchlogs from block {}", from_block))?;
    tracing::info!(receipts = receipts.len(), "searchlogs returned");

    let decoded = decode_search_log(&receipts, &registry, strip_hex_prefix);
    print_json(&json!(decoded))
}
