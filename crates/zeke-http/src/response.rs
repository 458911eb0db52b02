//! Upstream response with a buffered or streaming body.

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::fmt;
use std::time::Duration;

use crate::transport::TransportError;

/// Body chunks as they arrive from upstream.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Response body, either fully read or still on the wire.
pub enum ResponseBody {
    Buffered(Bytes),
    Streaming(ByteStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// 5xx and 429 are worth another attempt; everything else is final.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.as_u16() >= 500 || status == StatusCode::TOO_MANY_REQUESTS
}

/// Status, headers and body of an upstream response.
#[derive(Debug)]
pub struct UpstreamResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl UpstreamResponse {
    pub const fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A response whose body is already in memory.
    pub fn buffered(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status, HeaderMap::new(), ResponseBody::Buffered(body.into()))
    }

    pub(crate) fn from_reqwest(response: reqwest::Response, timeout: Duration) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let stream = response
            .bytes_stream()
            .map_err(move |e| TransportError::from_reqwest(&e, timeout))
            .boxed();
        Self::new(status, headers, ResponseBody::Streaming(stream))
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_retryable(&self) -> bool {
        is_retryable_status(self.status)
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Split into status, headers and a body stream without buffering.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, ByteStream) {
        let stream = match self.body {
            ResponseBody::Buffered(bytes) => {
                stream::once(async move { Ok::<_, TransportError>(bytes) }).boxed()
            }
            ResponseBody::Streaming(stream) => stream,
        };
        (self.status, self.headers, stream)
    }
}
