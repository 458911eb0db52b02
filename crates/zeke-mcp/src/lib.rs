#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod adapter;
pub mod dispatcher;
pub mod jsonrpc;
pub mod tools;

pub use adapter::{Credentials, ToolAdapter};
pub use dispatcher::{McpDispatcher, PROTOCOL_VERSION, SERVER_NAME, ToolEndpoints};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use tools::{ReaderArgs, SearchArgs, ToolDescriptor, ToolKind};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio as _;
