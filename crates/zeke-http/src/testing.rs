//! Scripted transport for tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for dependent crates that need to drive a [`ResilientClient`] without a
//! network.
//!
//! [`ResilientClient`]: crate::ResilientClient

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::response::{ResponseBody, UpstreamResponse};
use crate::transport::{HttpTransport, PreparedRequest, TransportError};

/// One scripted reaction to a request.
#[derive(Debug, Clone)]
pub enum Scripted {
    Response {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// A streaming body delivered chunk by chunk, possibly ending in an error.
    Chunks {
        status: StatusCode,
        headers: HeaderMap,
        chunks: Vec<Result<Bytes, TransportError>>,
    },
    Error(TransportError),
    /// Waits `delay` on the tokio clock, then reacts as `entry`.
    Delayed {
        delay: Duration,
        entry: Box<Scripted>,
    },
    /// Never answers.
    Hang,
}

impl Scripted {
    fn into_result(self) -> Option<Result<UpstreamResponse, TransportError>> {
        match self {
            Self::Response {
                status,
                headers,
                body,
            } => Some(Ok(UpstreamResponse::new(
                status,
                headers,
                ResponseBody::Buffered(body),
            ))),
            Self::Chunks {
                status,
                headers,
                chunks,
            } => Some(Ok(UpstreamResponse::new(
                status,
                headers,
                ResponseBody::Streaming(stream::iter(chunks).boxed()),
            ))),
            Self::Error(err) => Some(Err(err)),
            Self::Delayed { entry, .. } => (*entry).into_result(),
            Self::Hang => None,
        }
    }
}

#[derive(Default)]
struct State {
    script: VecDeque<Scripted>,
    last: Option<Scripted>,
    requests: Vec<(Instant, PreparedRequest)>,
}

/// A transport that answers from a script and records every request.
///
/// Entries are consumed in order; once the script runs out the final entry
/// repeats. An empty script answers `200 OK` with an empty body.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<State>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(self, entry: Scripted) -> Self {
        self.lock().script.push_back(entry);
        self
    }

    #[must_use]
    pub fn respond(self, status: u16, body: impl Into<Bytes>) -> Self {
        self.respond_with_headers(status, HeaderMap::new(), body)
    }

    #[must_use]
    pub fn respond_with_headers(
        self,
        status: u16,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        self.then(Scripted::Response {
            status: status_code(status),
            headers,
            body: body.into(),
        })
    }

    #[must_use]
    pub fn respond_chunks(self, status: u16, chunks: Vec<Result<Bytes, TransportError>>) -> Self {
        self.then(Scripted::Chunks {
            status: status_code(status),
            headers: HeaderMap::new(),
            chunks,
        })
    }

    #[must_use]
    pub fn fail(self, err: TransportError) -> Self {
        self.then(Scripted::Error(err))
    }

    /// Answer `status` with `body`, but only after `delay`.
    #[must_use]
    pub fn respond_after(self, delay: Duration, status: u16, body: impl Into<Bytes>) -> Self {
        self.then(Scripted::Delayed {
            delay,
            entry: Box::new(Scripted::Response {
                status: status_code(status),
                headers: HeaderMap::new(),
                body: body.into(),
            }),
        })
    }

    #[must_use]
    pub fn hang(self) -> Self {
        self.then(Scripted::Hang)
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.lock()
            .requests
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Instants at which requests arrived, on the tokio clock.
    pub fn request_times(&self) -> Vec<Instant> {
        self.lock().requests.iter().map(|(at, _)| *at).collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_entry(&self, request: PreparedRequest) -> Scripted {
        let mut state = self.lock();
        state.requests.push((Instant::now(), request));
        if let Some(entry) = state.script.pop_front() {
            state.last = Some(entry.clone());
            return entry;
        }
        state.last.clone().unwrap_or_else(|| Scripted::Response {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        })
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: PreparedRequest) -> Result<UpstreamResponse, TransportError> {
        let mut entry = self.next_entry(request);
        while let Scripted::Delayed { delay, entry: inner } = entry {
            tokio::time::sleep(delay).await;
            entry = *inner;
        }
        match entry.into_result() {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
