//! Shared error definitions and small utilities used across all dropfarm crates.

pub mod error;
pub mod ready;

pub use {error::FromMessage, ready::Readiness};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Last four characters of a credential, for log lines. Never log the rest.
#[must_use]
pub fn credential_tail(credential: &str) -> String {
    let tail: String = credential
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{tail}")
}
