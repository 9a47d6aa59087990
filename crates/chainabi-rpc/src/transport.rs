//! The `RpcTransport` trait: the seam between the client and the wire.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// The async trait every RPC transport implements.
///
/// Implementations must be `Send + Sync` and are shared as
/// `Arc<dyn RpcTransport>`. Errors pass through unchanged; nothing here
/// retries.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Allocate the next request ID.
    fn next_id(&self) -> u64;

    /// The transport's identifier (URL or name).
    fn url(&self) -> &str;

    /// Protocol version written into outgoing requests.
    fn jsonrpc_version(&self) -> &str {
        "2.0"
    }

    /// Call `method` with positional `params` and return the raw result.
    async fn raw_call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let req = JsonRpcRequest::new(self.next_id(), method, params).with_version(self.jsonrpc_version());
        tracing::debug!(method, id = %req.id, url = %self.url(), "rpc call");

        let resp = self.send(req).await?;
        resp.into_result().map_err(|err| {
            tracing::warn!(method, code = err.code, message = %err.message, "node returned an error");
            TransportError::Rpc(err)
        })
    }
}
