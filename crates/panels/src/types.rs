//! Core data types for panels and dispatch bookkeeping.

use serde::{Deserialize, Serialize};

use dropfarm_common::credential_tail;

/// A named binding of one Discord channel to a fixed-length set of account
/// slots. `slots[i]` holds the credential rotated in on tick `i`; `None`
/// (or an empty string in older documents) means no account is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub channel_id: String,
    /// Display convenience, resolved from the channel id. Never trusted.
    #[serde(default)]
    pub server_name: String,
    pub slots: Vec<Option<String>>,
}

impl Panel {
    #[must_use]
    pub fn new(name: impl Into<String>, slot_count: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            channel_id: String::new(),
            server_name: String::new(),
            slots: vec![None; slot_count],
        }
    }

    /// Credential bound at `slot`, treating empty strings as unbound.
    #[must_use]
    pub fn credential_at(&self, slot: usize) -> Option<&str> {
        self.slots
            .get(slot)
            .and_then(Option::as_deref)
            .filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn has_channel(&self) -> bool {
        !self.channel_id.is_empty()
    }

    /// Force the slot vector to exactly `slot_count` entries, padding with
    /// unbound slots and dropping any overflow.
    pub fn normalize_slots(&mut self, slot_count: usize) {
        self.slots.resize(slot_count, None);
    }
}

/// An observed drop announcement. Constructed by the gateway listener,
/// consumed once by the reaction coordinator, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    pub channel_id: String,
    pub message_id: String,
    pub author_id: u64,
    pub content: String,
    pub observed_at_ms: u64,
}

/// Outcome of a single outbound action, for logging and per-tick summaries.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    /// Credential tail, never the full token.
    pub account: String,
    pub panel_id: String,
    pub slot: usize,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    #[must_use]
    pub fn ok(credential: &str, panel_id: impl Into<String>, slot: usize) -> Self {
        Self {
            account: credential_tail(credential),
            panel_id: panel_id.into(),
            slot,
            succeeded: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(
        credential: &str,
        panel_id: impl Into<String>,
        slot: usize,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            account: credential_tail(credential),
            panel_id: panel_id.into(),
            slot,
            succeeded: false,
            error: Some(error.to_string()),
        }
    }
}
