//! Config schema types (accounts, listener, rotation, store, server).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Karuta's bot user id on Discord.
pub const DEFAULT_BROADCASTER_ID: u64 = 646937666251915264;

/// Substring that marks a drop announcement in the broadcaster's message.
pub const DEFAULT_DROP_PATTERN: &str = "is dropping";

/// One configured Discord account. Immutable after load; the token never
/// leaves the process except inside `Authorization` headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing)]
    pub token: String,
}

/// HTTP control-surface binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 10000,
        }
    }
}

/// Gateway listener filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Only messages authored by this user id are considered.
    pub broadcaster_id: u64,
    /// Only messages containing this substring are drops.
    pub drop_pattern: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            broadcaster_id: DEFAULT_BROADCASTER_ID,
            drop_pattern: DEFAULT_DROP_PATTERN.into(),
        }
    }
}

/// Rotation loop timing. The tick interval scales with the slot count so
/// that a full rotation takes the same wall time regardless of K.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Number of slots per panel (K). Fixed per deployment.
    pub slot_count: usize,
    /// Seconds between completed ticks. `None` means derive from K.
    pub tick_interval_secs: Option<u64>,
    /// Poll interval while the loop is disabled.
    pub idle_poll_secs: u64,
    /// Fixed backoff after an unexpected tick-loop fault.
    pub error_backoff_secs: u64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            slot_count: 3,
            tick_interval_secs: None,
            idle_poll_secs: 5,
            error_backoff_secs: 60,
        }
    }
}

impl RotationConfig {
    /// Effective inter-tick sleep. Deployment constants: 305s for K=6,
    /// 605s otherwise (the observed K=3 value).
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        let secs = self.tick_interval_secs.unwrap_or(match self.slot_count {
            6 => 305,
            _ => 605,
        });
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn idle_poll(&self) -> Duration {
        Duration::from_secs(self.idle_poll_secs)
    }

    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Remote JSON-document store credentials. Both keys absent means panels
/// live only in process memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub api_key: Option<String>,
    pub bin_id: Option<String>,
}

impl StoreConfig {
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.api_key.is_some() && self.bin_id.is_some()
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    pub server: ServerConfig,
    pub accounts: Vec<Account>,
    pub listener: ListenerConfig,
    pub rotation: RotationConfig,
    pub store: StoreConfig,
}

impl FarmConfig {
    /// Token used for the long-lived gateway connection: always the first
    /// configured account.
    #[must_use]
    pub fn listener_token(&self) -> Option<&str> {
        self.accounts.first().map(|a| a.token.as_str())
    }
}
