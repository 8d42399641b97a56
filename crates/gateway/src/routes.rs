//! JSON handlers for the control surface.

use {
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    },
    serde::Deserialize,
    serde_json::json,
    tracing::warn,
};

use dropfarm_panels::Error;

use crate::server::AppState;

fn panel_error(e: &Error) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

/// Rotation status plus a summary of panels and configured accounts.
/// Account tokens never appear here.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let rotation = state.rotation.status().await;
    let panel_count = state.panels.list().await.len();
    let accounts: Vec<_> = state
        .accounts
        .iter()
        .map(|a| json!({ "id": a.id, "name": a.name }))
        .collect();
    Json(json!({
        "ready": rotation.ready,
        "running": rotation.running,
        "enabled": rotation.enabled,
        "currentSlot": rotation.current_slot,
        "slotCount": rotation.slot_count,
        "secondsUntilNextTick": rotation.seconds_until_next_tick,
        "panelCount": panel_count,
        "accounts": accounts,
    }))
}

pub async fn toggle_rotation(State(state): State<AppState>) -> impl IntoResponse {
    let enabled = state.rotation.toggle();
    Json(json!({ "enabled": enabled }))
}

pub async fn panels_list(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.panels.list().await)
}

#[derive(Debug, Deserialize)]
pub struct PanelCreate {
    pub name: String,
}

pub async fn panels_create(
    State(state): State<AppState>,
    Json(body): Json<PanelCreate>,
) -> impl IntoResponse {
    match state.panels.create(&body.name).await {
        Ok(panel) => (StatusCode::CREATED, Json(panel)).into_response(),
        Err(e) => panel_error(&e).into_response(),
    }
}

/// Partial update; any combination of fields may be present. `credential`
/// is only meaningful alongside `slot`; an empty credential unbinds.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PanelUpdate {
    pub name: Option<String>,
    pub channel_id: Option<String>,
    pub slot: Option<usize>,
    pub credential: Option<String>,
}

pub async fn panels_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<PanelUpdate>,
) -> impl IntoResponse {
    let mut panel = match state.panels.get(&id).await {
        Some(panel) => panel,
        None => return panel_error(&Error::not_found(&id)).into_response(),
    };

    if let Some(name) = body.name {
        panel = match state.panels.rename(&id, &name).await {
            Ok(panel) => panel,
            Err(e) => return panel_error(&e).into_response(),
        };
    }

    if let Some(channel_id) = body.channel_id {
        let server_name = resolve_server_name(&state, &channel_id).await;
        panel = match state.panels.set_channel(&id, &channel_id, server_name).await {
            Ok(panel) => panel,
            Err(e) => return panel_error(&e).into_response(),
        };
    }

    if let Some(slot) = body.slot {
        panel = match state.panels.upsert_slot(&id, slot, body.credential).await {
            Ok(panel) => panel,
            Err(e) => return panel_error(&e).into_response(),
        };
    }

    Json(panel).into_response()
}

pub async fn panels_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.panels.delete(&id).await {
        Ok(()) => Json(json!({ "deleted": id })).into_response(),
        Err(e) => panel_error(&e).into_response(),
    }
}

/// Display-only lookup; never blocks a channel update on failure.
async fn resolve_server_name(state: &AppState, channel_id: &str) -> String {
    if channel_id.is_empty() {
        return String::new();
    }
    let Some(token) = state.lookup_token() else {
        return String::new();
    };
    match state.outbound.guild_name(token, channel_id).await {
        Ok(name) => name,
        Err(e) => {
            warn!(channel = %channel_id, error = %e, "guild name lookup failed");
            String::new()
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {async_trait::async_trait, axum::response::Response};

    use {
        dropfarm_common::Readiness,
        dropfarm_config::{Account, RotationConfig},
        dropfarm_panels::{ActionOutbound, PanelService, Result, store_memory::MemoryStore},
        dropfarm_rotation::RotationService,
    };

    use super::*;

    struct StubOutbound;

    #[async_trait]
    impl ActionOutbound for StubOutbound {
        async fn post_command(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn add_reaction(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn guild_name(&self, _: &str, _: &str) -> Result<String> {
            Ok("Card Corner".into())
        }
    }

    fn test_state() -> AppState {
        let panels = PanelService::new(Arc::new(MemoryStore::new()), 3);
        let outbound: Arc<dyn ActionOutbound> = Arc::new(StubOutbound);
        let rotation = RotationService::new(
            panels.clone(),
            outbound.clone(),
            RotationConfig::default(),
            Readiness::new(),
        );
        AppState {
            rotation,
            panels,
            outbound,
            accounts: Arc::new(vec![Account {
                id: "acc_0".into(),
                name: "Main".into(),
                token: "tok-main".into(),
            }]),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_reports_rotation_and_registry() {
        let state = test_state();
        state.panels.create("farm").await.unwrap();

        let response = status(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        assert_eq!(body["panelCount"], 1);
        assert_eq!(body["currentSlot"], 0);
        assert_eq!(body["slotCount"], 3);
        assert_eq!(body["enabled"], true);
        assert_eq!(body["accounts"][0]["name"], "Main");
        assert!(body["accounts"][0].get("token").is_none());
    }

    #[tokio::test]
    async fn toggle_flips_and_reports() {
        let state = test_state();
        let response = toggle_rotation(State(state.clone())).await.into_response();
        assert_eq!(body_json(response).await["enabled"], false);
        let response = toggle_rotation(State(state)).await.into_response();
        assert_eq!(body_json(response).await["enabled"], true);
    }

    #[tokio::test]
    async fn create_then_list() {
        let state = test_state();
        let response = panels_create(
            State(state.clone()),
            Json(PanelCreate {
                name: "farm".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = panels_list(State(state)).await.into_response();
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "farm");
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let state = test_state();
        let response = panels_create(
            State(state),
            Json(PanelCreate { name: "  ".into() }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_sets_channel_and_resolves_server_name() {
        let state = test_state();
        let panel = state.panels.create("farm").await.unwrap();

        let response = panels_update(
            State(state.clone()),
            Path(panel.id.clone()),
            Json(PanelUpdate {
                channel_id: Some("1234".into()),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["channelId"], "1234");
        assert_eq!(body["serverName"], "Card Corner");
    }

    #[tokio::test]
    async fn update_binds_and_unbinds_slot() {
        let state = test_state();
        let panel = state.panels.create("farm").await.unwrap();

        let response = panels_update(
            State(state.clone()),
            Path(panel.id.clone()),
            Json(PanelUpdate {
                slot: Some(1),
                credential: Some("credB".into()),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert_eq!(body_json(response).await["slots"][1], "credB");

        let response = panels_update(
            State(state),
            Path(panel.id),
            Json(PanelUpdate {
                slot: Some(1),
                credential: Some(String::new()),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert!(body_json(response).await["slots"][1].is_null());
    }

    #[tokio::test]
    async fn update_out_of_range_slot_is_bad_request() {
        let state = test_state();
        let panel = state.panels.create("farm").await.unwrap();
        let response = panels_update(
            State(state),
            Path(panel.id),
            Json(PanelUpdate {
                slot: Some(3),
                credential: Some("x".into()),
                ..Default::default()
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_missing_panel_is_not_found() {
        let state = test_state();
        let response = panels_update(
            State(state),
            Path("nope".into()),
            Json(PanelUpdate::default()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_round_trip() {
        let state = test_state();
        let panel = state.panels.create("farm").await.unwrap();

        let response = panels_delete(State(state.clone()), Path(panel.id))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.panels.list().await.is_empty());

        let response = panels_delete(State(state), Path("gone".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
