//! Rotation timer loop and per-tick fan-out.

use std::sync::Arc;

use {
    futures::future::join_all,
    serde::Serialize,
    tokio::{
        sync::{Mutex, RwLock},
        task::JoinHandle,
    },
    tracing::{debug, error, info, warn},
};

use {
    dropfarm_common::{Readiness, now_ms},
    dropfarm_config::RotationConfig,
    dropfarm_panels::{ActionOutbound, DispatchResult, PanelService},
};

use crate::state::RotationState;

/// The literal turn command posted on every tick.
pub const TURN_COMMAND: &str = "kd";

/// Control-surface view of the scheduler.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RotationStatus {
    pub ready: bool,
    pub running: bool,
    pub enabled: bool,
    pub current_slot: usize,
    pub slot_count: usize,
    pub seconds_until_next_tick: u64,
}

/// The slot-rotation scheduler.
///
/// One cooperative task owns the tick loop; the only other writer is the
/// external toggle, which goes through the same [`RotationState`].
pub struct RotationService {
    state: RotationState,
    panels: Arc<PanelService>,
    outbound: Arc<dyn ActionOutbound>,
    config: RotationConfig,
    readiness: Readiness,
    running: RwLock<bool>,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RotationService {
    pub fn new(
        panels: Arc<PanelService>,
        outbound: Arc<dyn ActionOutbound>,
        config: RotationConfig,
        readiness: Readiness,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: RotationState::new(true),
            panels,
            outbound,
            config,
            readiness,
            running: RwLock::new(false),
            timer_handle: Mutex::new(None),
        })
    }

    /// Start the tick loop. The first tick waits for gateway readiness.
    pub async fn start(self: &Arc<Self>) {
        *self.running.write().await = true;
        let svc = Arc::clone(self);
        let handle = tokio::spawn(async move {
            svc.rotation_loop().await;
        });
        *self.timer_handle.lock().await = Some(handle);
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
        let mut handle = self.timer_handle.lock().await;
        if let Some(h) = handle.take() {
            h.abort();
        }
        info!("rotation service stopped");
    }

    /// Flip the enable flag. Takes effect at the next idle-poll check and
    /// never cancels an in-flight fan-out.
    pub fn toggle(&self) -> bool {
        let enabled = self.state.toggle();
        info!(enabled, "rotation toggled");
        enabled
    }

    pub async fn status(&self) -> RotationStatus {
        let snapshot = self.state.snapshot();
        let interval = self.config.tick_interval().as_secs();
        let seconds_until_next_tick = if snapshot.enabled {
            let elapsed = now_ms().saturating_sub(snapshot.last_cycle_start_ms) / 1000;
            interval.saturating_sub(elapsed)
        } else {
            0
        };
        RotationStatus {
            ready: self.readiness.is_set(),
            running: *self.running.read().await,
            enabled: snapshot.enabled,
            current_slot: snapshot.current_slot,
            slot_count: self.config.slot_count,
            seconds_until_next_tick,
        }
    }

    /// One complete cycle: fan out the current slot, then advance. Exposed
    /// for deterministic property tests; the timer loop calls it too.
    pub async fn run_cycle(self: &Arc<Self>) -> Vec<DispatchResult> {
        let slot = self.state.snapshot().current_slot;
        let results = self.dispatch_slot(slot).await;
        self.state.advance(self.config.slot_count);
        results
    }

    /// Fan out one `kd` per panel bound at `slot`, all concurrently. Every
    /// call is attempted; a failing sibling never cancels or delays the
    /// rest.
    pub async fn dispatch_slot(&self, slot: usize) -> Vec<DispatchResult> {
        let panels = self.panels.list().await;
        let mut calls = Vec::new();

        for panel in panels {
            let Some(credential) = panel.credential_at(slot) else {
                continue;
            };
            if !panel.has_channel() {
                warn!(panel = %panel.id, slot, "panel has no channel id; skipped this tick");
                continue;
            }
            let outbound = Arc::clone(&self.outbound);
            let credential = credential.to_string();
            let panel_id = panel.id.clone();
            let channel_id = panel.channel_id.clone();
            calls.push(async move {
                match outbound
                    .post_command(&credential, &channel_id, TURN_COMMAND)
                    .await
                {
                    Ok(()) => DispatchResult::ok(&credential, panel_id, slot),
                    Err(e) => {
                        warn!(panel = %panel_id, slot, error = %e, "command dispatch failed");
                        DispatchResult::failed(&credential, panel_id, slot, e)
                    },
                }
            });
        }

        if calls.is_empty() {
            debug!(slot, "no panel bound at this slot");
        }
        join_all(calls).await
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn rotation_loop(self: &Arc<Self>) {
        debug!("rotation loop waiting for gateway readiness");
        self.readiness.wait().await;
        info!("gateway ready; rotation loop started");

        loop {
            if !*self.running.read().await {
                break;
            }
            if !self.state.snapshot().enabled {
                tokio::time::sleep(self.config.idle_poll()).await;
                continue;
            }

            let slot = self.state.snapshot().current_slot;
            let svc = Arc::clone(self);
            // Run the tick body on its own task so an unexpected fault in
            // it is caught here instead of killing the loop.
            match tokio::spawn(async move { svc.run_cycle().await }).await {
                Ok(results) => {
                    let failed = results.iter().filter(|r| !r.succeeded).count();
                    info!(slot, dispatched = results.len(), failed, "tick complete");
                },
                Err(e) => {
                    error!(error = %e, "tick body fault; backing off");
                    tokio::time::sleep(self.config.error_backoff()).await;
                    continue;
                },
            }

            tokio::time::sleep(self.config.tick_interval()).await;
        }
    }
}
