//! Persistence trait for the panel list.

use async_trait::async_trait;

use crate::types::Panel;

/// Whole-document persistence: the panel list is read and written as one
/// unit. Writes overwrite; reads return the last-written list or empty.
#[async_trait]
pub trait PanelStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<Panel>>;
    async fn save(&self, panels: &[Panel]) -> anyhow::Result<()>;
}
