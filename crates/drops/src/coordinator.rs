//! Fan-out of tagged reactions onto a drop announcement.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    tokio_util::task::TaskTracker,
    tracing::{debug, info, warn},
};

use {
    dropfarm_common::credential_tail,
    dropfarm_panels::{ActionOutbound, DropEvent, DropSink, Panel},
};

/// Reaction glyph per slot index, cycled when K exceeds the table.
pub const SLOT_TAGS: [&str; 3] = ["1\u{fe0f}\u{20e3}", "2\u{fe0f}\u{20e3}", "3\u{fe0f}\u{20e3}"];

/// Stagger before each slot's reaction, indexed like [`SLOT_TAGS`]. The
/// offsets are deliberately uneven so the burst does not look scripted.
pub const SLOT_DELAYS_MS: [u64; 3] = [1300, 2300, 3200];

/// Schedules one delayed reaction per bound slot when a drop is observed.
///
/// [`handle_drop`](DropSink::handle_drop) only spawns; the gateway read
/// loop is never held across a delay or a network call. Spawned reactions
/// are tracked so shutdown can drain in-flight work.
pub struct ReactionCoordinator {
    outbound: Arc<dyn ActionOutbound>,
    tracker: TaskTracker,
    tags: Vec<String>,
    delays: Vec<Duration>,
}

impl ReactionCoordinator {
    pub fn new(outbound: Arc<dyn ActionOutbound>) -> Arc<Self> {
        Self::with_tables(
            outbound,
            SLOT_TAGS.iter().map(ToString::to_string).collect(),
            SLOT_DELAYS_MS.iter().map(|ms| Duration::from_millis(*ms)).collect(),
        )
    }

    /// Build with explicit tag and delay tables. Both are cycled by slot
    /// index, so they may be shorter than K.
    pub fn with_tables(
        outbound: Arc<dyn ActionOutbound>,
        tags: Vec<String>,
        delays: Vec<Duration>,
    ) -> Arc<Self> {
        Arc::new(Self {
            outbound,
            tracker: TaskTracker::new(),
            tags,
            delays,
        })
    }

    /// Stop accepting new drops and wait for in-flight reactions to land.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        info!("reaction coordinator drained");
    }

    fn schedule(&self, slot: usize, credential: String, event: &DropEvent) {
        if self.tags.is_empty() || self.delays.is_empty() {
            return;
        }
        let tag = self.tags[slot % self.tags.len()].clone();
        let delay = self.delays[slot % self.delays.len()];
        let outbound = Arc::clone(&self.outbound);
        let channel_id = event.channel_id.clone();
        let message_id = event.message_id.clone();

        self.tracker.spawn(async move {
            tokio::time::sleep(delay).await;
            match outbound
                .add_reaction(&credential, &channel_id, &message_id, &tag)
                .await
            {
                Ok(()) => {
                    debug!(
                        account = %credential_tail(&credential),
                        message = %message_id,
                        slot,
                        tag = %tag,
                        "reaction added"
                    );
                },
                Err(e) => {
                    warn!(
                        account = %credential_tail(&credential),
                        message = %message_id,
                        slot,
                        error = %e,
                        "reaction failed"
                    );
                },
            }
        });
    }
}

#[async_trait]
impl DropSink for ReactionCoordinator {
    async fn handle_drop(&self, panel: Panel, event: DropEvent) {
        if self.tracker.is_closed() {
            debug!(message = %event.message_id, "coordinator closed; drop ignored");
            return;
        }
        let mut scheduled = 0usize;
        for slot in 0..panel.slots.len() {
            if let Some(credential) = panel.credential_at(slot) {
                self.schedule(slot, credential.to_string(), &event);
                scheduled += 1;
            }
        }
        info!(
            panel = %panel.id,
            channel = %event.channel_id,
            message = %event.message_id,
            scheduled,
            "drop observed"
        );
    }
}
