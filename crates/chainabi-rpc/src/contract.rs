//! ABI-aware contract handle.
//!
//! ```ignore
//! let token = Contract::new(client, "a1aeb3e9d3d4b4c3b2b2f1e0d0c0b0a090807060", abi);
//! let balance = token.call("balanceOf", &[AbiValue::address(owner)?]).await?;
//! ```

use chainabi_codec::{decode_result_hex, decode_search_log, AbiEncoder, ContractRegistry};
use chainabi_core::{
    abi::{ContractAbi, FunctionDescriptor},
    call::DecodedResult,
    event::DecodedReceipt,
    hexutil::{self, HexStyle},
    types::AbiValue,
};
use serde_json::Value;

use crate::client::NodeClient;
use crate::config::SendToContractOptions;
use crate::error::ClientError;
use crate::types::{LogFilter, SendToContractResult};

/// A deployed contract bound to a node client.
#[derive(Debug, Clone)]
pub struct Contract {
    client: NodeClient,
    address: String,
    encoder: AbiEncoder,
    registry: ContractRegistry,
    sender: Option<String>,
}

impl Contract {
    pub fn new(client: NodeClient, address: &str, abi: ContractAbi) -> Self {
        let address = hexutil::normalize_address(address);
        Self {
            client,
            registry: ContractRegistry::new().with_contract(&address, abi.clone()),
            encoder: AbiEncoder::new(abi),
            address,
            sender: None,
        }
    }

    /// Default sender for calls and for sends that don't name one.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Normalized address (lowercase, no `0x`).
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn abi(&self) -> &ContractAbi {
        self.encoder.abi()
    }

    pub fn encoder(&self) -> &AbiEncoder {
        &self.encoder
    }

    /// Run a read-only call and decode its outputs.
    ///
    /// An execution the VM reports as excepted (e.g. a revert) fails with
    /// [`ClientError::Execution`].
    pub async fn call(&self, method: &str, args: &[AbiValue]) -> Result<DecodedResult, ClientError> {
        let (func, payload) = self.encoder.prepare_call(method, args)?;
        self.call_prepared(method, func, &payload).await
    }

    /// [`Self::call`] with JSON arguments.
    pub async fn call_json(&self, method: &str, args: &[Value]) -> Result<DecodedResult, ClientError> {
        let (func, payload) = self.encoder.prepare_call_json(method, args)?;
        self.call_prepared(method, func, &payload).await
    }

    async fn call_prepared(
        &self,
        method: &str,
        func: &FunctionDescriptor,
        payload: &[u8],
    ) -> Result<DecodedResult, ClientError> {
        let data = HexStyle::Bare.encode(payload);
        let result = self
            .client
            .call_contract(&self.address, &data, self.sender.as_deref(), None)
            .await?;

        let execution = result.execution_result;
        if !execution.is_success() {
            tracing::warn!(
                contract = %self.address,
                method,
                excepted = %execution.excepted,
                "contract call excepted"
            );
            return Err(ClientError::Execution {
                method: method.to_string(),
                excepted: execution.excepted,
            });
        }
        Ok(decode_result_hex(&func.outputs, &execution.output)?)
    }

    /// Send a state-changing transaction to the contract.
    pub async fn send(
        &self,
        method: &str,
        args: &[AbiValue],
        options: &SendToContractOptions,
    ) -> Result<SendToContractResult, ClientError> {
        let data = self.encoder.encode_call_hex(method, args, HexStyle::Bare)?;
        let mut options = options.clone();
        if options.sender.is_none() {
            options.sender = self.sender.clone();
        }
        let sent = self.client.send_to_contract(&self.address, &data, &options).await?;
        tracing::debug!(contract = %self.address, method, txid = %sent.txid, "sent to contract");
        Ok(sent)
    }

    /// Search this contract's logs and decode them with its ABI.
    ///
    /// The filter's address list is replaced by this contract's address.
    pub async fn logs(&self, filter: LogFilter, strip_hex_prefix: bool) -> Result<Vec<DecodedReceipt>, ClientError> {
        let filter = filter.addresses(self.address.as_str());
        let receipts = self.client.search_logs(&filter).await?;
        Ok(decode_search_log(&receipts, &self.registry, strip_hex_prefix))
    }
}
