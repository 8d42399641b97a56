//! Build a [`FarmConfig`] from process environment variables.

use tracing::warn;

use crate::schema::{
    Account, FarmConfig, ListenerConfig, RotationConfig, ServerConfig, StoreConfig,
};

/// Read the full configuration from the environment. Missing optional vars
/// fall back to defaults; a malformed numeric var is reported, not fatal.
pub fn from_env() -> anyhow::Result<FarmConfig> {
    let accounts = parse_accounts(
        &std::env::var("TOKENS").unwrap_or_default(),
        &std::env::var("ACC_NAMES").unwrap_or_default(),
    );
    if accounts.is_empty() {
        anyhow::bail!("TOKENS is not set; at least one account token is required");
    }

    let mut listener = ListenerConfig::default();
    if let Some(id) = parse_var::<u64>("KARUTA_ID") {
        listener.broadcaster_id = id;
    }
    if let Ok(pattern) = std::env::var("DROP_PATTERN") {
        if !pattern.trim().is_empty() {
            listener.drop_pattern = pattern;
        }
    }

    let mut rotation = RotationConfig::default();
    if let Some(k) = parse_var::<usize>("SLOT_COUNT") {
        if k == 0 {
            anyhow::bail!("SLOT_COUNT must be at least 1");
        }
        rotation.slot_count = k;
    }
    rotation.tick_interval_secs = parse_var::<u64>("TICK_INTERVAL_SECS");

    let mut server = ServerConfig::default();
    if let Some(port) = parse_var::<u16>("PORT") {
        server.port = port;
    }

    let store = StoreConfig {
        api_key: non_empty_var("JSONBIN_API_KEY"),
        bin_id: non_empty_var("JSONBIN_BIN_ID"),
    };

    Ok(FarmConfig {
        server,
        accounts,
        listener,
        rotation,
        store,
    })
}

/// Pair up comma-separated tokens and display names. Extra tokens get a
/// generated name; extra names are ignored.
pub fn parse_accounts(tokens: &str, names: &str) -> Vec<Account> {
    let names: Vec<&str> = names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    tokens
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(i, token)| Account {
            id: format!("acc_{i}"),
            name: names
                .get(i)
                .map_or_else(|| format!("Account {}", i + 1), ToString::to_string),
            token: token.to_string(),
        })
        .collect()
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring malformed env var");
            None
        },
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
