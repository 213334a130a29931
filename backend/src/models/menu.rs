//! Panel menu tree models
//!
//! The menu is returned to the dashboard frontend as an ordered tree of
//! entries. Leaf entries carry a dispatchable action id (or a prebuilt
//! href); branch entries carry a sub-tree.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One entry of the panel header menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct MenuItem {
    pub text: String,
    #[serde(rename = "iconClassName", default, skip_serializing_if = "Option::is_none")]
    pub icon_class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MenuItemKind>,
    #[serde(rename = "subMenu", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_menu: Vec<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Action id the frontend dispatches on click.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<MenuAction>,
}

impl MenuItem {
    pub fn action(text: impl Into<String>, action: MenuAction) -> Self {
        Self { text: text.into(), action: Some(action), ..Default::default() }
    }

    pub fn divider() -> Self {
        Self { kind: Some(MenuItemKind::Divider), ..Default::default() }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon_class_name = Some(icon.into());
        self
    }

    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = Some(shortcut.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    Submenu,
    Divider,
}

/// Dispatchable menu actions. The three custom actions are resolved
/// server-side into deep-link URLs; the rest are handled by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MenuAction {
    View,
    Edit,
    Share,
    Explore,
    StopQuery,
    Inspect,
    InspectData,
    InspectQuery,
    InspectJson,
    GetHelp,
    Duplicate,
    Copy,
    CreateLibraryPanel,
    UnlinkLibraryPanel,
    ToggleLegend,
    Remove,
    AddStrategy,
    DataRetrieval,
    RelateAlert,
}

/// Custom actions the service resolves into deep-link URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PanelActionKind {
    AddStrategy,
    DataRetrieval,
    RelateAlert,
}

impl PanelActionKind {
    /// Parse the action path segment of the resolve endpoint.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "add-strategy" => Some(Self::AddStrategy),
            "data-retrieval" => Some(Self::DataRetrieval),
            "relate-alert" => Some(Self::RelateAlert),
            _ => None,
        }
    }
}

/// Response of the action-resolve endpoint. `url` is absent when the
/// action's precondition data is empty; the frontend must not navigate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PanelActionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
