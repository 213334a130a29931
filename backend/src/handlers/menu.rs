use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;
use crate::models::{
    DashboardMeta, MenuCapabilities, MenuItem, PanelActionKind, PanelActionResponse,
    PanelSnapshot,
};
use crate::services::ScopedVarsExpander;
use crate::utils::{ApiError, ApiResult};

/// Panel snapshot plus caller-evaluated gating state.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PanelMenuRequest {
    pub panel: PanelSnapshot,
    #[serde(default)]
    pub dashboard: DashboardMeta,
    #[serde(default)]
    pub capabilities: MenuCapabilities,
}

// Build the contextual menu for one panel
#[utoipa::path(
    post,
    path = "/api/panel/menu",
    request_body = PanelMenuRequest,
    responses(
        (status = 200, description = "Ordered menu item tree", body = Vec<MenuItem>)
    ),
    tag = "Panel Menu"
)]
pub async fn build_panel_menu(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PanelMenuRequest>,
) -> ApiResult<Json<Vec<MenuItem>>> {
    let menu = state.menu_service.build_menu(
        &request.panel,
        &request.dashboard,
        &request.capabilities,
        None,
    );
    tracing::debug!(panel_id = request.panel.id, entries = menu.len(), "panel menu built");
    Ok(Json(menu))
}

// Resolve a custom action into its deep-link URL. `url` is null when the
// action's precondition data is empty.
#[utoipa::path(
    post,
    path = "/api/panel/actions/{action}",
    params(
        ("action" = String, Path, description = "add-strategy | data-retrieval | relate-alert")
    ),
    request_body = PanelMenuRequest,
    responses(
        (status = 200, description = "Deep-link URL, or null when suppressed", body = PanelActionResponse),
        (status = 404, description = "Unknown action")
    ),
    tag = "Panel Menu"
)]
pub async fn resolve_panel_action(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    Json(request): Json<PanelMenuRequest>,
) -> ApiResult<Json<PanelActionResponse>> {
    let Some(kind) = PanelActionKind::from_slug(&action) else {
        return Err(ApiError::action_not_found(action));
    };

    let variables = ScopedVarsExpander::new(request.panel.scoped_vars.clone());
    let url = match kind {
        PanelActionKind::AddStrategy => {
            state.menu_service.on_add_strategy(&request.panel, &variables)?
        }
        PanelActionKind::DataRetrieval => {
            state.menu_service.on_data_retrieval(&request.panel, &variables)?
        }
        PanelActionKind::RelateAlert => {
            state.menu_service.on_relate_alert(&request.panel, &variables)?
        }
    };

    Ok(Json(PanelActionResponse { url }))
}
