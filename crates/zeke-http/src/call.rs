//! Outbound request description.

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use std::time::Duration;
use thiserror::Error;

use crate::transport::PreparedRequest;

/// `Accept` value required by the upstream MCP endpoints.
pub const ACCEPT_UPSTREAM: &str = "application/json, text/event-stream";

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Malformed input to the request builder. Terminal, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },
}

/// An immutable description of an upstream request.
///
/// Headers are case-insensitive and last-write-wins. The call itself is never
/// mutated by the client; every attempt derives a fresh header set from it.
#[derive(Debug, Clone)]
pub struct OutboundCall {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl OutboundCall {
    /// Build a call from a method name, an absolute http(s) URL and an optional body.
    ///
    /// No `Content-Type` is set here; callers add it explicitly.
    pub fn build(method: &str, url: &str, body: Option<Bytes>) -> Result<Self, BuildError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| BuildError::InvalidMethod(method.to_string()))?;

        let parsed = Url::parse(url).map_err(|e| BuildError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BuildError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            method,
            url: parsed,
            headers: HeaderMap::new(),
            body,
        })
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, BuildError> {
        let invalid = || BuildError::InvalidHeader {
            name: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Set `Authorization: Bearer <token>`, marked sensitive.
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self, BuildError> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| BuildError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
            })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    #[must_use]
    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Headers for one attempt: the base set plus `Accept` when absent.
    pub fn attempt_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if !headers.contains_key(ACCEPT) {
            headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_UPSTREAM));
        }
        headers
    }

    pub(crate) fn prepare(&self, timeout: Duration) -> PreparedRequest {
        PreparedRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.attempt_headers(),
            body: self.body.clone(),
            timeout,
        }
    }
}
