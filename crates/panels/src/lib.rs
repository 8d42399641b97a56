//! Panel domain types, persistence, and the seams the platform adapters
//! implement. A panel binds one Discord channel to a fixed-length set of
//! account slots; the rotation loop and the drop coordinator both read
//! panels through [`service::PanelService`] snapshots.

pub mod error;
pub mod outbound;
pub mod service;
pub mod store;
pub mod store_memory;
pub mod store_remote;
pub mod types;

pub use {
    error::{Error, Result},
    outbound::{ActionOutbound, DropSink},
    service::PanelService,
    store::PanelStore,
    types::{DispatchResult, DropEvent, Panel},
};
