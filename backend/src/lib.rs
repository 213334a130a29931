//! Monitor Panel Menu
//!
//! Backend for the monitoring platform's dashboard customization layer:
//! builds the contextual action menu attached to a visualization panel and
//! resolves the custom deep-link actions (add strategy, data retrieval,
//! related alarms) from a normalized form of the panel's query targets.
//!
//! # Architecture
//!
//! ```text
//! handlers ──▶ PanelMenuService ──▶ query_normalizer ──▶ template_vars
//!                   │                      │
//!                   ▼                      ▼
//!              MenuItem tree        NormalizedQuery + metric signature
//! ```

rust_i18n::i18n!("locales", fallback = "zh");

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use config::Config;
use services::PanelMenuService;

pub struct AppState {
    pub config: Config,
    pub menu_service: PanelMenuService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let menu_service = PanelMenuService::new(&config.monitor);
        Self { config, menu_service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::menu::build_panel_menu,
        handlers::menu::resolve_panel_action,
    ),
    components(schemas(
        handlers::menu::PanelMenuRequest,
        models::menu::MenuItem,
        models::menu::MenuItemKind,
        models::menu::MenuAction,
        models::menu::PanelActionKind,
        models::menu::PanelActionResponse,
        models::panel::PanelSnapshot,
        models::panel::PanelOptions,
        models::panel::LegendOptions,
        models::panel::DashboardMeta,
        models::panel::MenuCapabilities,
        models::panel::TimeRange,
        models::panel::TimeBound,
        services::query_normalizer::models::PanelTarget,
        services::query_normalizer::models::QueryData,
        services::query_normalizer::models::QueryConfig,
        services::query_normalizer::models::ConditionItem,
        services::query_normalizer::models::FunctionItem,
        services::query_normalizer::models::FunctionParam,
        services::query_normalizer::models::ParamValue,
        services::query_normalizer::models::ExpressionItem,
        services::query_normalizer::models::TargetItem,
        services::query_normalizer::models::HostItem,
        services::query_normalizer::models::LegacyTarget,
        services::query_normalizer::models::LegacyMetric,
        services::query_normalizer::models::MonitorObject,
        services::query_normalizer::models::LegacyConditionEntry,
        services::query_normalizer::models::LegacyFunc,
        services::query_normalizer::models::LegacyRank,
        services::query_normalizer::models::LegacySelector,
        services::query_normalizer::models::LegacyList,
        services::query_normalizer::models::NormalizedQuery,
    )),
    tags(
        (name = "Panel Menu", description = "Panel contextual menu and custom actions"),
        (name = "System", description = "Service endpoints")
    )
)]
pub struct ApiDoc;

/// Assemble the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/panel/menu", post(handlers::menu::build_panel_menu))
        .route("/api/panel/actions/:action", post(handlers::menu::resolve_panel_action))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(middleware::locale_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
