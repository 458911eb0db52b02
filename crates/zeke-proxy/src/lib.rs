#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod forward;
pub mod models;
pub mod server;

pub use error::ProxyError;
pub use forward::{CHAT_COMPLETIONS_ROUTE, ChatProxy, KNOWN_GLM_MODELS, normalize_model};
pub use models::{ErrorDetail, ErrorResponse};
pub use server::{AppState, router, serve};

// Silence unused dev-dependency warnings
#[cfg(test)]
use {http_body_util as _, reqwest as _, tower as _};
