//! `NodeClient`: typed pass-through wrappers over the node's RPC methods.
//!
//! Each method maps 1:1 to an RPC call of the same name (`get_block_count`
//! → `getblockcount`). Hex arguments are sent bare, as the node expects.

use chainabi_core::{event::SearchLogReceipt, hexutil};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::{CreateContractOptions, RpcEndpoint, SendToContractOptions};
use crate::error::{ClientError, TransportError};
use crate::http::HttpTransport;
use crate::transport::RpcTransport;
use crate::types::{
    AccountInfo, ContractCallResult, CreateContractResult, LogFilter, SendToContractResult, Unspent,
    WaitForLogsResult,
};

#[derive(Clone)]
pub struct NodeClient {
    transport: Arc<dyn RpcTransport>,
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient").field("url", &self.transport.url()).finish()
    }
}

impl NodeClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Client over an [`HttpTransport`] for `endpoint`.
    pub fn http(endpoint: &RpcEndpoint) -> Result<Self, TransportError> {
        Ok(Self::new(Arc::new(HttpTransport::from_endpoint(endpoint)?)))
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }

    /// Untyped call.
    pub async fn raw_call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        Ok(self.transport.raw_call(method, params).await?)
    }

    /// Call `method` and deserialize its result into `T`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, ClientError> {
        let result = self.raw_call(method, params).await?;
        serde_json::from_value(result).map_err(|e| ClientError::UnexpectedResponse {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    // ─── Blockchain ──────────────────────────────────────────────────────────

    pub async fn get_info(&self) -> Result<Value, ClientError> {
        self.raw_call("getinfo", vec![]).await
    }

    pub async fn get_block_count(&self) -> Result<u64, ClientError> {
        self.call("getblockcount", vec![]).await
    }

    pub async fn get_block_hash(&self, height: u64) -> Result<String, ClientError> {
        self.call("getblockhash", vec![json!(height)]).await
    }

    /// Block by hash; `verbose = false` returns the serialized block hex.
    pub async fn get_block(&self, hash: &str, verbose: bool) -> Result<Value, ClientError> {
        self.raw_call("getblock", vec![json!(hexutil::strip_prefix(hash)), json!(verbose)]).await
    }

    pub async fn get_best_block_hash(&self) -> Result<String, ClientError> {
        self.call("getbestblockhash", vec![]).await
    }

    // ─── Transactions ────────────────────────────────────────────────────────

    pub async fn get_raw_transaction(&self, txid: &str, verbose: bool) -> Result<Value, ClientError> {
        self.raw_call("getrawtransaction", vec![json!(hexutil::strip_prefix(txid)), json!(verbose)])
            .await
    }

    pub async fn decode_raw_transaction(&self, hex_tx: &str) -> Result<Value, ClientError> {
        self.raw_call("decoderawtransaction", vec![json!(hexutil::strip_prefix(hex_tx))]).await
    }

    /// Broadcast a signed transaction, returning its id.
    pub async fn send_raw_transaction(&self, hex_tx: &str) -> Result<String, ClientError> {
        self.call("sendrawtransaction", vec![json!(hexutil::strip_prefix(hex_tx))]).await
    }

    /// Wallet view of a transaction.
    pub async fn get_transaction(&self, txid: &str) -> Result<Value, ClientError> {
        self.raw_call("gettransaction", vec![json!(hexutil::strip_prefix(txid))]).await
    }

    /// Receipts of the contract executions in a transaction.
    pub async fn get_transaction_receipt(&self, txid: &str) -> Result<Vec<SearchLogReceipt>, ClientError> {
        self.call("gettransactionreceipt", vec![json!(hexutil::strip_prefix(txid))]).await
    }

    pub async fn get_account_info(&self, address: &str) -> Result<AccountInfo, ClientError> {
        self.call("getaccountinfo", vec![json!(hexutil::normalize_address(address))]).await
    }

    // ─── Wallet ──────────────────────────────────────────────────────────────

    pub async fn get_balance(&self) -> Result<f64, ClientError> {
        self.call("getbalance", vec![]).await
    }

    pub async fn get_new_address(&self) -> Result<String, ClientError> {
        self.call("getnewaddress", vec![]).await
    }

    /// Base58 address → hex160.
    pub async fn get_hex_address(&self, address: &str) -> Result<String, ClientError> {
        self.call("gethexaddress", vec![json!(address)]).await
    }

    /// hex160 → base58 address.
    pub async fn from_hex_address(&self, hex_address: &str) -> Result<String, ClientError> {
        self.call("fromhexaddress", vec![json!(hexutil::normalize_address(hex_address))]).await
    }

    pub async fn list_unspent(
        &self,
        min_conf: u32,
        max_conf: u32,
        addresses: &[String],
    ) -> Result<Vec<Unspent>, ClientError> {
        self.call("listunspent", vec![json!(min_conf), json!(max_conf), json!(addresses)]).await
    }

    /// Send `amount` coins, returning the transaction id.
    pub async fn send_to_address(&self, address: &str, amount: f64) -> Result<String, ClientError> {
        self.call("sendtoaddress", vec![json!(address), json!(amount)]).await
    }

    pub async fn wallet_passphrase(&self, passphrase: &str, timeout_secs: u64) -> Result<(), ClientError> {
        self.raw_call("walletpassphrase", vec![json!(passphrase), json!(timeout_secs)])
            .await
            .map(drop)
    }

    pub async fn wallet_lock(&self) -> Result<(), ClientError> {
        self.raw_call("walletlock", vec![]).await.map(drop)
    }

    // ─── Contracts ───────────────────────────────────────────────────────────

    /// Execute `data` against `address` without creating a transaction.
    pub async fn call_contract(
        &self,
        address: &str,
        data: &str,
        sender: Option<&str>,
        gas_limit: Option<u64>,
    ) -> Result<ContractCallResult, ClientError> {
        let mut params = vec![
            json!(hexutil::normalize_address(address)),
            json!(hexutil::strip_prefix(data)),
        ];
        match (sender, gas_limit) {
            (Some(sender), Some(gas)) => params.extend([json!(sender), json!(gas)]),
            (Some(sender), None) => params.push(json!(sender)),
            (None, Some(gas)) => params.extend([Value::Null, json!(gas)]),
            (None, None) => {}
        }
        self.call("callcontract", params).await
    }

    pub async fn send_to_contract(
        &self,
        address: &str,
        data: &str,
        options: &SendToContractOptions,
    ) -> Result<SendToContractResult, ClientError> {
        let params = options.to_params(&hexutil::normalize_address(address), hexutil::strip_prefix(data));
        self.call("sendtocontract", params).await
    }

    pub async fn create_contract(
        &self,
        bytecode: &str,
        options: &CreateContractOptions,
    ) -> Result<CreateContractResult, ClientError> {
        self.call("createcontract", options.to_params(hexutil::strip_prefix(bytecode))).await
    }

    pub async fn search_logs(&self, filter: &LogFilter) -> Result<Vec<SearchLogReceipt>, ClientError> {
        self.call("searchlogs", filter.search_params()).await
    }

    /// Block until matching logs appear after `filter.from_block`.
    ///
    /// The HTTP request timeout bounds the wait.
    pub async fn wait_for_logs(&self, filter: &LogFilter) -> Result<WaitForLogsResult, ClientError> {
        self.call("waitforlogs", filter.wait_params()).await
    }
}
