//! Router assembly and the serve loop.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        routing::{get, post, put},
    },
    tracing::info,
};

use {
    dropfarm_config::Account,
    dropfarm_panels::{ActionOutbound, PanelService},
    dropfarm_rotation::RotationService,
};

use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub rotation: Arc<RotationService>,
    pub panels: Arc<PanelService>,
    pub outbound: Arc<dyn ActionOutbound>,
    /// Accounts from the registry, exposed (id and name only) on the status
    /// endpoint. The first account's token doubles as the lookup credential
    /// for guild-name resolution.
    pub accounts: Arc<Vec<Account>>,
}

impl AppState {
    /// Token used for read-only lookups such as guild-name resolution.
    #[must_use]
    pub fn lookup_token(&self) -> Option<&str> {
        self.accounts.first().map(|a| a.token.as_str())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(routes::status))
        .route("/api/rotation/toggle", post(routes::toggle_rotation))
        .route(
            "/api/panels",
            get(routes::panels_list).post(routes::panels_create),
        )
        .route(
            "/api/panels/{id}",
            put(routes::panels_update).delete(routes::panels_delete),
        )
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "control surface listening");
    axum::serve(listener, app).await?;
    Ok(())
}
