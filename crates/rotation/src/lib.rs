//! Slot-rotation scheduler: a timed, cyclic dispatcher that advances one
//! slot per tick and fans the turn command out across all panels.

pub mod service;
pub mod state;

pub use {
    service::{RotationService, RotationStatus},
    state::{RotationSnapshot, RotationState},
};
