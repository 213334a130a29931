//! Panel and dashboard snapshot models
//!
//! The frontend ships a read-only snapshot of the panel and dashboard
//! state with every menu/action request. Only the narrow accessors the
//! menu needs are modeled; permission evaluation stays on the caller's
//! side and arrives as booleans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::services::query_normalizer::models::PanelTarget;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PanelSnapshot {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub targets: Vec<PanelTarget>,
    #[serde(default)]
    pub options: PanelOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Current values of the dashboard's template variables.
    #[serde(default)]
    pub scoped_vars: HashMap<String, Vec<String>>,
}

impl PanelSnapshot {
    /// Targets the custom actions operate on: present and not hidden.
    pub fn active_targets(&self) -> Vec<&PanelTarget> {
        self.targets.iter().filter(|target| !target.hide).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PanelOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegendOptions {
    #[serde(rename = "showLegend", default)]
    pub show_legend: bool,
}

/// Dashboard state relevant to menu gating, evaluated by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DashboardMeta {
    /// The current user may edit this panel.
    #[serde(default)]
    pub can_edit_panel: bool,
    /// The dashboard itself is editable.
    #[serde(default)]
    pub can_edit: bool,
    /// The user holds the editor role (dashboard may still be read-only).
    #[serde(default)]
    pub is_editor: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Caller-supplied capability flags collapsing the menu variants into one
/// configurable builder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct MenuCapabilities {
    #[serde(default)]
    pub is_editing: bool,
    #[serde(default)]
    pub is_viewing: bool,
    /// User has access to the explore view.
    #[serde(default)]
    pub can_explore: bool,
    /// Panel plugin renders without data queries (no inspect data/query).
    #[serde(default)]
    pub skip_data_query: bool,
    #[serde(default)]
    pub is_library_panel: bool,
    /// A query is currently streaming/loading and can be cancelled.
    #[serde(default)]
    pub is_streaming: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeRange {
    pub from: TimeBound,
    pub to: TimeBound,
}

/// One bound of the panel's time range: an epoch-millisecond instant or a
/// relative expression such as `now-1h`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum TimeBound {
    Epoch(i64),
    Text(String),
}

impl TimeBound {
    /// Render the bound for a deep link: `YYYY-MM-DD HH:mm:ss` when the
    /// bound is an instant, the raw expression otherwise.
    pub fn format_for_link(&self) -> String {
        const LINK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
        match self {
            TimeBound::Epoch(millis) => match DateTime::<Utc>::from_timestamp_millis(*millis) {
                Some(instant) => instant.format(LINK_FORMAT).to_string(),
                None => millis.to_string(),
            },
            TimeBound::Text(text) => match DateTime::parse_from_rfc3339(text) {
                Ok(instant) => instant.format(LINK_FORMAT).to_string(),
                Err(_) => text.clone(),
            },
        }
    }
}
