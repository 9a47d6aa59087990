//! # chainabi-rpc
//!
//! JSON-RPC plumbing for a contract-capable node.
//!
//! ## Layers
//! - `request` / `transport` → wire types and the `RpcTransport` seam
//! - `http` → `reqwest` transport, one attempt per call
//! - `client` → `NodeClient` with typed node methods
//! - `contract` → `Contract`: encode → `callcontract`/`sendtocontract` → decode

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use client::NodeClient;
pub use config::{ConfigError, CreateContractOptions, HttpClientConfig, RpcEndpoint, SendToContractOptions};
pub use contract::Contract;
pub use error::{ClientError, TransportError};
pub use http::HttpTransport;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
pub use types::{
    AccountInfo, ContractCallResult, CreateContractResult, ExecutionResult, LogFilter, SendToContractResult,
    SingleOrMany, Unspent, WaitForLogsResult, WaitLogEntry,
};
