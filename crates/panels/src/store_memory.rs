//! In-memory store for tests and remote-less deployments.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {anyhow::Result, async_trait::async_trait};

use crate::{store::PanelStore, types::Panel};

/// No persistence beyond process memory. Used when the remote document
/// store is not configured, and as the test backend.
#[derive(Default)]
pub struct MemoryStore {
    panels: Mutex<Vec<Panel>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `save` calls, for write-behind assertions.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PanelStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Panel>> {
        let panels = self.panels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(panels.clone())
    }

    async fn save(&self, panels: &[Panel]) -> Result<()> {
        let mut stored = self.panels.lock().unwrap_or_else(|e| e.into_inner());
        *stored = panels.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
