//! Discord platform adapter: the REST action client used by the rotation
//! loop and the reaction coordinator, and the single long-lived gateway
//! listener that watches for drop announcements.

pub mod error;
pub mod listener;
pub mod rest;

pub use {
    error::{Error, Result},
    listener::DropListener,
    rest::RestClient,
};
