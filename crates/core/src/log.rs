//! Append-only, bounded log of step-level diagnostics.
//!
//! Entries are ordered by arrival time and never mutated after
//! insertion. The reference behavior keeps an unbounded history; this
//! implementation caps it at [`LOG_HISTORY_CAP`] entries, dropping the
//! oldest first.

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::event::{classify, LogClass, Level, ProgressEvent, StepStatus};
use crate::types::Timestamp;

/// Maximum number of retained log entries.
pub const LOG_HISTORY_CAP: usize = 256;

/// Delimiter for compound `details` strings. The text before the first
/// occurrence is the primary displayed message.
pub const DETAILS_DELIMITER: char = '|';

/// One recorded step-level diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Arrival time of the underlying event (UTC).
    pub timestamp: Timestamp,
    pub step: String,
    pub status: StepStatus,
    pub message: String,
    pub level: Option<Level>,
    /// Raw compound detail string, retained in full.
    pub details: Option<String>,
    /// Display classification derived at append time.
    pub class: LogClass,
}

impl LogEntry {
    /// Build an entry from a progress event, stamped with the current time.
    pub fn from_event(event: &ProgressEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            step: event.step.clone(),
            status: event.status.clone(),
            message: event.message.clone(),
            level: event.level,
            details: event.details.clone(),
            class: classify(&event.status, event.level),
        }
    }

    /// The primary message to display.
    ///
    /// When `details` is present, this is the text before the first
    /// [`DETAILS_DELIMITER`], trimmed; the remainder is retained but
    /// not prioritized. Otherwise it is `message`.
    pub fn display_message(&self) -> &str {
        match &self.details {
            Some(details) => details
                .split(DETAILS_DELIMITER)
                .next()
                .unwrap_or(details)
                .trim(),
            None => &self.message,
        }
    }
}

/// Bounded, arrival-ordered log history for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHistory {
    entries: VecDeque<LogEntry>,
    /// Entries evicted by the cap; keeps `since` indices absolute.
    #[serde(default)]
    dropped: usize,
}

impl LogHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning `false` if it was suppressed as a
    /// duplicate.
    ///
    /// An entry identical in step, status, and message to the
    /// immediately preceding one is not appended again, so re-delivered
    /// events do not produce duplicate lines. When the history is full
    /// the oldest entry is dropped.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if let Some(last) = self.entries.back() {
            if last.step == entry.step
                && last.status == entry.status
                && last.message == entry.message
            {
                return false;
            }
        }
        if self.entries.len() == LOG_HISTORY_CAP {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total entries ever appended, including evicted ones.
    pub fn total(&self) -> usize {
        self.dropped + self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Entries from absolute index `start` onward, for incremental
    /// rendering. Indices refer to [`total`](Self::total) counts, so
    /// they stay stable across cap evictions.
    pub fn since(&self, start: usize) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().skip(start.saturating_sub(self.dropped))
    }
}
