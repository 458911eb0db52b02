//! Bounded buffer of recent upstream errors.
//!
//! Diagnostic aid only: entries live in memory until overwritten and are
//! exposed through the debug endpoint.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Default number of entries retained.
pub const DEFAULT_ERROR_LOG_CAPACITY: usize = 100;

/// Maximum characters of an upstream body kept in an entry.
pub const MAX_SNIPPET_CHARS: usize = 512;

/// A single recorded upstream failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingLogEntry {
    pub timestamp: DateTime<Utc>,
    /// Tool name or route that made the call
    pub source: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub error: String,
    pub body_snippet: String,
}

impl RingLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        source: impl Into<String>,
        endpoint: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source: source.into(),
            endpoint: endpoint.into(),
            status: None,
            error: error.into(),
            body_snippet: String::new(),
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the upstream body, truncated to [`MAX_SNIPPET_CHARS`].
    #[must_use]
    pub fn with_body(mut self, body: &str) -> Self {
        self.body_snippet = snippet(body, MAX_SNIPPET_CHARS);
        self
    }
}

/// Truncate `text` to at most `max_chars` characters, marking the cut.
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Debug, Default)]
struct Slots {
    entries: Vec<RingLogEntry>,
    /// Index of the oldest entry once the buffer is full.
    next: usize,
}

/// Fixed-capacity circular buffer of [`RingLogEntry`].
///
/// Writers take the lock exclusively; snapshots share it. A capacity of zero
/// disables recording.
#[derive(Debug)]
pub struct ErrorRing {
    capacity: usize,
    slots: RwLock<Slots>,
}

impl ErrorRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: RwLock::new(Slots {
                entries: Vec::with_capacity(capacity),
                next: 0,
            }),
        }
    }

    /// Append an entry, overwriting the oldest once full.
    pub fn record(&self, entry: RingLogEntry) {
        if self.capacity == 0 {
            return;
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.entries.len() < self.capacity {
            slots.entries.push(entry);
        } else {
            let idx = slots.next;
            slots.entries[idx] = entry;
            slots.next = (idx + 1) % self.capacity;
        }
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<RingLogEntry> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let (newer, older) = slots.entries.split_at(slots.next);
        older.iter().chain(newer).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ErrorRing {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_LOG_CAPACITY)
    }
}
