pub mod menu;
pub mod panel;

pub use menu::{MenuAction, MenuItem, MenuItemKind, PanelActionKind, PanelActionResponse};
pub use panel::{
    DashboardMeta, LegendOptions, MenuCapabilities, PanelOptions, PanelSnapshot, TimeBound,
    TimeRange,
};
