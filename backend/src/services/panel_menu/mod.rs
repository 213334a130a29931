//! Panel action menu
//!
//! Assembles the ordered menu-item tree for a visualization panel and
//! resolves the custom action cluster (add strategy, data retrieval,
//! related alarms) against the normalized query targets.
//!
//! One configurable builder covers every observed menu variant; the
//! differences (explore access, streaming cancel, legend placement,
//! gating refinements) arrive as capability flags.

pub mod actions;

#[cfg(test)]
mod tests;

pub use actions::{
    InteractionReporter, LoggingNavigator, MonitorContext, MonitorRoute, Navigator,
    TracingReporter, origin_before_grafana,
};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_i18n::t;
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::models::{
    DashboardMeta, MenuAction, MenuCapabilities, MenuItem, MenuItemKind, PanelSnapshot,
};
use crate::services::query_normalizer::NormalizerOptions;
use crate::services::query_normalizer::models::{PanelTarget, QueryConfig};
use crate::utils::get_locale;

/// Result tables with this prefix belong to the uptime-check feature and
/// cannot back an alarm strategy.
static UPTIMECHECK_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^uptimecheck").expect("invalid uptimecheck regex"));

/// Dimension keys reserved for CMDB node aggregation; strategies cannot be
/// created over them.
const RESERVED_CMDB_KEYS: &[&str] = &["bk_inst_id", "bk_obj_id"];

/// Extra menu entries contributed by an embedded legacy panel controller.
pub trait ExtendedMenuProvider: Send + Sync {
    fn extra_menu_items(&self) -> Vec<MenuItem>;
}

/// Builds panel menus and resolves the custom deep-link actions.
pub struct PanelMenuService {
    pub(crate) context: MonitorContext,
    pub(crate) normalizer: NormalizerOptions,
    queryable_datasource_ids: Vec<String>,
    require_metric_configs: bool,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) reporter: Arc<dyn InteractionReporter>,
}

impl PanelMenuService {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            context: MonitorContext {
                app_origin: config.app_origin.clone(),
                biz_id: config.biz_id.clone(),
            },
            normalizer: NormalizerOptions {
                excluded_function_ids: config.excluded_functions.iter().cloned().collect(),
                source_min_len: config.source_min_len,
            },
            queryable_datasource_ids: config.queryable_datasources.clone(),
            require_metric_configs: config.require_metric_configs,
            navigator: Arc::new(LoggingNavigator),
            reporter: Arc::new(TracingReporter),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn InteractionReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build the ordered menu tree for one panel.
    pub fn build_menu(
        &self,
        panel: &PanelSnapshot,
        dashboard: &DashboardMeta,
        capabilities: &MenuCapabilities,
        extended: Option<&dyn ExtendedMenuProvider>,
    ) -> Vec<MenuItem> {
        let locale = get_locale();
        let mut menu: Vec<MenuItem> = Vec::new();

        if !capabilities.is_editing {
            menu.push(
                MenuItem::action(t!("menu.view", locale = &locale), MenuAction::View)
                    .with_icon("eye")
                    .with_shortcut("v"),
            );
        }

        if dashboard.can_edit_panel && !capabilities.is_editing {
            menu.push(
                MenuItem::action(t!("menu.edit", locale = &locale), MenuAction::Edit)
                    .with_icon("edit")
                    .with_shortcut("e"),
            );
        }

        menu.push(
            MenuItem::action(t!("menu.share", locale = &locale), MenuAction::Share)
                .with_icon("share-alt")
                .with_shortcut("p s"),
        );

        if capabilities.can_explore && !capabilities.skip_data_query {
            menu.push(
                MenuItem::action(t!("menu.explore", locale = &locale), MenuAction::Explore)
                    .with_icon("compass")
                    .with_shortcut("x"),
            );
        }

        if capabilities.is_streaming {
            menu.push(
                MenuItem::action(t!("menu.stop_query", locale = &locale), MenuAction::StopQuery)
                    .with_icon("circle"),
            );
        }

        menu.push(self.inspect_submenu(dashboard, capabilities, &locale));

        // Custom action cluster, only for editable panels whose targets all
        // carry a queryable metric config.
        menu.extend(self.custom_action_items(panel, dashboard, &locale));

        let sub_menu = self.more_submenu(panel, dashboard, capabilities, extended, &locale);
        if !sub_menu.is_empty() {
            menu.push(MenuItem {
                text: t!("menu.more", locale = &locale).to_string(),
                icon_class_name: Some("cube".to_string()),
                kind: Some(MenuItemKind::Submenu),
                sub_menu,
                ..Default::default()
            });
        }

        if dashboard.can_edit_panel && !capabilities.is_editing && !capabilities.is_viewing {
            menu.push(MenuItem::divider());
            menu.push(
                MenuItem::action(t!("menu.remove", locale = &locale), MenuAction::Remove)
                    .with_icon("trash-alt")
                    .with_shortcut("p r"),
            );
        }

        menu
    }

    fn inspect_submenu(
        &self,
        dashboard: &DashboardMeta,
        capabilities: &MenuCapabilities,
        locale: &str,
    ) -> MenuItem {
        let mut inspect: Vec<MenuItem> = Vec::new();

        if !capabilities.skip_data_query {
            inspect.push(MenuItem::action(
                t!("menu.inspect_data", locale = locale),
                MenuAction::InspectData,
            ));
            if dashboard.can_edit {
                inspect.push(MenuItem::action(
                    t!("menu.inspect_query", locale = locale),
                    MenuAction::InspectQuery,
                ));
            }
        }

        inspect.push(MenuItem::action(
            t!("menu.inspect_json", locale = locale),
            MenuAction::InspectJson,
        ));

        MenuItem {
            text: t!("menu.inspect", locale = locale).to_string(),
            icon_class_name: Some("info-circle".to_string()),
            shortcut: Some("i".to_string()),
            kind: Some(MenuItemKind::Submenu),
            sub_menu: inspect,
            action: Some(MenuAction::Inspect),
            ..Default::default()
        }
    }

    fn more_submenu(
        &self,
        panel: &PanelSnapshot,
        dashboard: &DashboardMeta,
        capabilities: &MenuCapabilities,
        extended: Option<&dyn ExtendedMenuProvider>,
        locale: &str,
    ) -> Vec<MenuItem> {
        let mut sub_menu: Vec<MenuItem> = Vec::new();

        if !(capabilities.is_viewing || capabilities.is_editing) {
            if dashboard.can_edit_panel {
                sub_menu.push(
                    MenuItem::action(t!("menu.duplicate", locale = locale), MenuAction::Duplicate)
                        .with_shortcut("p d"),
                );
                sub_menu.push(MenuItem::action(
                    t!("menu.copy", locale = locale),
                    MenuAction::Copy,
                ));
                if capabilities.is_library_panel {
                    sub_menu.push(MenuItem::action(
                        t!("menu.unlink_library_panel", locale = locale),
                        MenuAction::UnlinkLibraryPanel,
                    ));
                } else {
                    sub_menu.push(MenuItem::action(
                        t!("menu.create_library_panel", locale = locale),
                        MenuAction::CreateLibraryPanel,
                    ));
                }
            } else if dashboard.is_editor {
                // An editor but the dashboard is not editable
                sub_menu.push(MenuItem::action(
                    t!("menu.copy", locale = locale),
                    MenuAction::Copy,
                ));
            }
        }

        if let Some(provider) = extended {
            sub_menu.extend(provider.extra_menu_items());
        }

        if let Some(legend) = &panel.options.legend {
            let key = if legend.show_legend { "menu.hide_legend" } else { "menu.show_legend" };
            sub_menu.push(
                MenuItem::action(t!(key, locale = locale), MenuAction::ToggleLegend)
                    .with_shortcut("p l"),
            );
        }

        // When editing hide most actions
        if capabilities.is_editing {
            sub_menu.clear();
        }

        if dashboard.can_edit_panel && !capabilities.skip_data_query {
            sub_menu.push(MenuItem::action(
                t!("menu.get_help", locale = locale),
                MenuAction::GetHelp,
            ));
        }

        sub_menu
    }

    fn custom_action_items(
        &self,
        panel: &PanelSnapshot,
        dashboard: &DashboardMeta,
        locale: &str,
    ) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = Vec::new();

        if !dashboard.can_edit_panel
            || panel.targets.is_empty()
            || !panel.targets.iter().all(|target| self.is_queryable(target))
        {
            return items;
        }

        let only_promql =
            panel.targets.iter().any(|target| target.query.only_promql.unwrap_or(false));
        let has_metric_configs =
            panel.targets.iter().any(|target| !target.query.query_configs.is_empty());

        if panel.targets.len() < 2 && !only_promql && can_set_strategy(&panel.targets) {
            items.push(
                MenuItem::action(
                    t!("menu.add_strategy", locale = locale),
                    MenuAction::AddStrategy,
                )
                .with_icon("shield"),
            );
        }

        if !only_promql && (!self.require_metric_configs || has_metric_configs) {
            items.push(
                MenuItem::action(
                    t!("menu.data_retrieval", locale = locale),
                    MenuAction::DataRetrieval,
                )
                .with_icon("signal"),
            );
        }

        if !self.require_metric_configs || has_metric_configs {
            items.push(
                MenuItem::action(
                    t!("menu.relate_alert", locale = locale),
                    MenuAction::RelateAlert,
                )
                .with_icon("apps"),
            );
        }

        items
    }

    /// A target can feed the custom actions when it queries a native
    /// monitoring datasource, carries structured query configs, or is a
    /// sufficiently long raw query-language source.
    fn is_queryable(&self, target: &PanelTarget) -> bool {
        target
            .datasource_id
            .as_ref()
            .map(|id| self.queryable_datasource_ids.iter().any(|known| known == id))
            .unwrap_or(false)
            || !target.query.query_configs.is_empty()
            || target
                .query
                .source
                .as_ref()
                .map(|source| source.len() > self.normalizer.source_min_len)
                .unwrap_or(false)
    }
}

/// Strategy creation eligibility. Single-config targets are always
/// eligible; a multi-config target must be time-series only, free of
/// uptime-check tables and free of reserved CMDB dimensions.
fn can_set_strategy(targets: &[PanelTarget]) -> bool {
    let Some(first) = targets.first() else {
        return true;
    };
    if first.query.query_configs.len() <= 1 {
        return true;
    }
    first.query.query_configs.iter().all(|config| {
        matches!(
            config.meta_label().as_str(),
            "bk_monitor|time_series" | "custom|time_series"
        ) && !UPTIMECHECK_TABLE.is_match(&config.result_table_id)
            && !has_special_cmdb_dimension(config)
    })
}

fn has_special_cmdb_dimension(config: &QueryConfig) -> bool {
    config.data_source_label == "bk_monitor"
        && config.data_type_label == "time_series"
        && (config.group_by.iter().any(|dim| RESERVED_CMDB_KEYS.contains(&dim.as_str()))
            || config
                .where_conditions
                .iter()
                .any(|condition| RESERVED_CMDB_KEYS.contains(&condition.key.as_str())))
}
