//! # chainabi-observability
//!
//! Structured logging for ChainABI binaries.
//!
//! Libraries in this workspace only emit `tracing` events; a binary calls
//! [`init_tracing`] once to route them to stderr as text or JSON, with
//! levels configurable per component.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
