//! Authoritative in-process panel table with best-effort write-behind.
//!
//! All reads are served from memory as owned snapshots; every mutation
//! updates memory first and then schedules one non-blocking save of the
//! whole document. A failed save is logged and never rolled back.

use std::sync::Arc;

use {
    tokio::sync::RwLock,
    tracing::{info, warn},
};

use crate::{
    Error, Result,
    store::PanelStore,
    types::Panel,
};

pub struct PanelService {
    store: Arc<dyn PanelStore>,
    panels: RwLock<Vec<Panel>>,
    slot_count: usize,
}

impl PanelService {
    pub fn new(store: Arc<dyn PanelStore>, slot_count: usize) -> Arc<Self> {
        Arc::new(Self {
            store,
            panels: RwLock::new(Vec::new()),
            slot_count,
        })
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Seed the local table from the store. A read failure leaves the local
    /// state empty and does NOT write back; only explicit mutations persist,
    /// so a transient read failure cannot destroy the remote document.
    pub async fn load(self: &Arc<Self>) {
        match self.store.load().await {
            Ok(mut loaded) => {
                for panel in &mut loaded {
                    panel.normalize_slots(self.slot_count);
                }
                info!(count = loaded.len(), "loaded panels");
                *self.panels.write().await = loaded;
            },
            Err(e) => {
                warn!(error = %e, "panel load failed; starting with empty local state");
            },
        }
    }

    /// Owned snapshot of all panels. Safe to hold across awaits.
    pub async fn list(&self) -> Vec<Panel> {
        self.panels.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Panel> {
        self.panels.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// The panel owning a channel, if any.
    pub async fn get_by_channel(&self, channel_id: &str) -> Option<Panel> {
        if channel_id.is_empty() {
            return None;
        }
        self.panels
            .read()
            .await
            .iter()
            .find(|p| p.channel_id == channel_id)
            .cloned()
    }

    pub async fn create(self: &Arc<Self>, name: &str) -> Result<Panel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("panel name is required"));
        }

        let panel = Panel::new(name, self.slot_count);
        {
            let mut panels = self.panels.write().await;
            panels.push(panel.clone());
        }
        self.schedule_persist().await;
        info!(panel = %panel.id, name = %panel.name, "panel created");
        Ok(panel)
    }

    pub async fn rename(self: &Arc<Self>, id: &str, name: &str) -> Result<Panel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("panel name is required"));
        }
        let panel = self
            .mutate(id, |panel| {
                panel.name = name.to_string();
            })
            .await?;
        self.schedule_persist().await;
        Ok(panel)
    }

    /// Point a panel at a new channel. `server_name` is whatever the caller
    /// resolved for display; it is stored verbatim.
    pub async fn set_channel(
        self: &Arc<Self>,
        id: &str,
        channel_id: &str,
        server_name: String,
    ) -> Result<Panel> {
        let channel_id = channel_id.trim().to_string();
        let panel = self
            .mutate(id, |panel| {
                panel.channel_id = channel_id;
                panel.server_name = server_name;
            })
            .await?;
        self.schedule_persist().await;
        info!(panel = %panel.id, channel = %panel.channel_id, "panel channel updated");
        Ok(panel)
    }

    /// Atomically replace one slot binding. An empty credential unbinds.
    pub async fn upsert_slot(
        self: &Arc<Self>,
        id: &str,
        slot: usize,
        credential: Option<String>,
    ) -> Result<Panel> {
        if slot >= self.slot_count {
            return Err(Error::invalid_input(format!(
                "slot {slot} out of range (K={})",
                self.slot_count
            )));
        }
        let credential = credential.filter(|c| !c.is_empty());
        let panel = self
            .mutate(id, |panel| {
                panel.slots[slot] = credential;
            })
            .await?;
        self.schedule_persist().await;
        info!(panel = %panel.id, slot, bound = panel.credential_at(slot).is_some(), "slot updated");
        Ok(panel)
    }

    pub async fn delete(self: &Arc<Self>, id: &str) -> Result<()> {
        {
            let mut panels = self.panels.write().await;
            let before = panels.len();
            panels.retain(|p| p.id != id);
            if panels.len() == before {
                return Err(Error::not_found(id));
            }
        }
        self.schedule_persist().await;
        info!(panel = %id, "panel deleted");
        Ok(())
    }

    // ── Internal ────────────────────────────────────────────────────────

    async fn mutate<F: FnOnce(&mut Panel)>(&self, id: &str, f: F) -> Result<Panel> {
        let mut panels = self.panels.write().await;
        let panel = panels
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::not_found(id))?;
        f(panel);
        Ok(panel.clone())
    }

    /// One-way write-behind: snapshot under the read lock, save off-task.
    async fn schedule_persist(&self) {
        let snapshot = self.panels.read().await.clone();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.save(&snapshot).await {
                warn!(error = %e, "panel persistence failed; local state kept");
            }
        });
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use {anyhow::anyhow, async_trait::async_trait};

    use {super::*, crate::store_memory::MemoryStore};

    /// Store whose reads always fail; writes record themselves.
    #[derive(Default)]
    struct BrokenReadStore {
        saves: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl PanelStore for BrokenReadStore {
        async fn load(&self) -> anyhow::Result<Vec<Panel>> {
            Err(anyhow!("document store unreachable"))
        }

        async fn save(&self, _panels: &[Panel]) -> anyhow::Result<()> {
            self.saves
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn create_and_list() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let panel = svc.create("Farm One").await.unwrap();
        let listed = svc.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, panel.id);
        assert_eq!(listed[0].slots.len(), 3);
    }

    #[tokio::test]
    async fn create_requires_name() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        assert!(svc.create("  ").await.is_err());
    }

    #[tokio::test]
    async fn upsert_slot_binds_and_unbinds() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let panel = svc.create("farm").await.unwrap();

        let updated = svc
            .upsert_slot(&panel.id, 1, Some("credB".into()))
            .await
            .unwrap();
        assert_eq!(updated.credential_at(1), Some("credB"));

        let updated = svc.upsert_slot(&panel.id, 1, Some(String::new())).await.unwrap();
        assert_eq!(updated.credential_at(1), None);
    }

    #[tokio::test]
    async fn upsert_slot_rejects_out_of_range() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let panel = svc.create("farm").await.unwrap();
        assert!(svc.upsert_slot(&panel.id, 3, None).await.is_err());
    }

    #[tokio::test]
    async fn get_by_channel_matches_only_configured() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let panel = svc.create("farm").await.unwrap();
        svc.set_channel(&panel.id, "123", String::new())
            .await
            .unwrap();

        assert!(svc.get_by_channel("123").await.is_some());
        assert!(svc.get_by_channel("999").await.is_none());
        // Panels without a channel never match the empty id.
        svc.create("unconfigured").await.unwrap();
        assert!(svc.get_by_channel("").await.is_none());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        assert!(matches!(
            svc.delete("nope").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mutation_schedules_write_behind() {
        let store = Arc::new(MemoryStore::new());
        let svc = PanelService::new(store.clone(), 3);
        svc.create("farm").await.unwrap();
        settle().await;
        assert!(store.save_count() >= 1);
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_failure_keeps_local_state_and_writes_nothing() {
        let store = Arc::new(BrokenReadStore::default());
        let svc = PanelService::new(store.clone(), 3);
        svc.load().await;
        settle().await;

        assert!(svc.list().await.is_empty());
        // A failed read must never trigger a write of the empty list.
        assert_eq!(store.saves.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn load_normalizes_slot_length() {
        let store = Arc::new(MemoryStore::new());
        let mut panel = Panel::new("odd", 1);
        panel.slots = vec![Some("credA".into())];
        store.save(std::slice::from_ref(&panel)).await.unwrap();

        let svc = PanelService::new(store, 3);
        svc.load().await;
        let listed = svc.list().await;
        assert_eq!(listed[0].slots.len(), 3);
        assert_eq!(listed[0].credential_at(0), Some("credA"));
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_later_mutation() {
        let svc = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let panel = svc.create("farm").await.unwrap();
        let snapshot = svc.list().await;

        svc.upsert_slot(&panel.id, 0, Some("credA".into()))
            .await
            .unwrap();
        assert_eq!(snapshot[0].credential_at(0), None);
    }
}
