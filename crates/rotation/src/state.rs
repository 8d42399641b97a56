//! Rotation cursor and enable flag behind one lock.
//!
//! The tick loop and the external toggle are the only writers; both go
//! through this object, so the slot/enabled pair can never tear.

use std::sync::Mutex;

use serde::Serialize;

use dropfarm_common::now_ms;

/// Point-in-time copy of the rotation state.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RotationSnapshot {
    pub current_slot: usize,
    pub enabled: bool,
    pub last_cycle_start_ms: u64,
}

#[derive(Debug)]
struct Inner {
    current_slot: usize,
    enabled: bool,
    last_cycle_start_ms: u64,
}

#[derive(Debug)]
pub struct RotationState {
    inner: Mutex<Inner>,
}

impl RotationState {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current_slot: 0,
                enabled,
                last_cycle_start_ms: now_ms(),
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> RotationSnapshot {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        RotationSnapshot {
            current_slot: inner.current_slot,
            enabled: inner.enabled,
            last_cycle_start_ms: inner.last_cycle_start_ms,
        }
    }

    /// Advance the cursor by exactly one (mod `slot_count`) and stamp the
    /// cycle start. Returns the new slot.
    pub fn advance(&self, slot_count: usize) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.current_slot = (inner.current_slot + 1) % slot_count.max(1);
        inner.last_cycle_start_ms = now_ms();
        inner.current_slot
    }

    /// Flip the enable flag without touching the cursor. Returns the new
    /// value.
    pub fn toggle(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.enabled = !inner.enabled;
        if inner.enabled {
            // Countdown restarts when the loop resumes.
            inner.last_cycle_start_ms = now_ms();
        }
        inner.enabled
    }
}
