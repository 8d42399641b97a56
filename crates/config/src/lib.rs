//! Environment-backed configuration for the dropfarm process.
//! Accounts come from `TOKENS` / `ACC_NAMES`; everything else has a default.

pub mod loader;
pub mod schema;

pub use {
    loader::from_env,
    schema::{Account, FarmConfig, ListenerConfig, RotationConfig, ServerConfig, StoreConfig},
};
