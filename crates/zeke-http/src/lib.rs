#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod call;
mod client;
mod outcome;
mod response;
mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// ============================================================================
// Public API
// ============================================================================

pub use call::{ACCEPT_UPSTREAM, BuildError, JSON_CONTENT_TYPE, OutboundCall};
pub use client::ResilientClient;
pub use outcome::UpstreamOutcome;
pub use response::{ByteStream, ResponseBody, UpstreamResponse, is_retryable_status};
pub use transport::{HttpTransport, PreparedRequest, ReqwestTransport, TransportError};

// HTTP vocabulary types, re-exported so callers don't need a direct reqwest dependency
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode, Url};

// Silence unused dev-dependency warnings
#[cfg(test)]
use mockall as _;
