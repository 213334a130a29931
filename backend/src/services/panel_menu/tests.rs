//! Unit tests for the panel menu builder and custom actions

use serde_json::json;
use std::sync::{Arc, Mutex};

use super::actions::{MonitorRoute, Navigator, origin_before_grafana};
use super::PanelMenuService;
use crate::config::MonitorConfig;
use crate::models::{
    DashboardMeta, MenuAction, MenuCapabilities, PanelSnapshot, TimeBound, TimeRange,
};
use crate::services::query_normalizer::models::QueryConfig;
use crate::services::template_vars::ScopedVarsExpander;

/// Navigator that records opened URLs instead of spawning a browser.
#[derive(Default)]
struct CaptureNavigator {
    opened: Mutex<Vec<String>>,
}

impl CaptureNavigator {
    fn urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Navigator for CaptureNavigator {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

fn service() -> PanelMenuService {
    PanelMenuService::new(&MonitorConfig::default())
}

fn service_with(navigator: Arc<CaptureNavigator>) -> PanelMenuService {
    service().with_navigator(navigator)
}

fn editable_dashboard() -> DashboardMeta {
    DashboardMeta { can_edit_panel: true, can_edit: true, is_editor: true, tags: Vec::new() }
}

fn panel_with_targets(targets: Vec<serde_json::Value>) -> PanelSnapshot {
    serde_json::from_value(json!({ "id": 1, "targets": targets }))
        .expect("panel fixture must deserialize")
}

fn time_series_target(ref_id: &str, metric: &str) -> serde_json::Value {
    json!({
        "refId": ref_id,
        "query_configs": [{
            "data_source_label": "bk_monitor",
            "data_type_label": "time_series",
            "result_table_id": "system.cpu",
            "metric_field": metric,
            "refId": "a",
            "method": "AVG",
            "interval": 60,
            "interval_unit": "s"
        }]
    })
}

fn target_with_kind(source: &str, kind: &str) -> serde_json::Value {
    json!({
        "refId": "A",
        "query_configs": [{
            "data_source_label": source,
            "data_type_label": kind,
            "result_table_id": "table",
            "metric_field": "field"
        }]
    })
}

fn actions_of(menu: &[crate::models::MenuItem]) -> Vec<MenuAction> {
    menu.iter().filter_map(|item| item.action).collect()
}

// ============================================================================
// Menu Builder Tests
// ============================================================================

mod builder_tests {
    use super::*;

    #[test]
    fn test_view_leads_when_not_editing() {
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert_eq!(menu[0].action, Some(MenuAction::View));
        assert_eq!(menu[1].action, Some(MenuAction::Edit));
    }

    #[test]
    fn test_editing_hides_view_and_edit() {
        let capabilities = MenuCapabilities { is_editing: true, ..Default::default() };
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &capabilities,
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::View));
        assert!(!actions.contains(&MenuAction::Edit));
        assert!(actions.contains(&MenuAction::Share));
    }

    #[test]
    fn test_readonly_dashboard_has_no_edit_or_remove() {
        let dashboard = DashboardMeta { is_editor: true, ..Default::default() };
        let menu = service().build_menu(
            &panel_with_targets(vec![time_series_target("A", "usage")]),
            &dashboard,
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::Edit));
        assert!(!actions.contains(&MenuAction::Remove));
        // The custom cluster is gated on edit permission too.
        assert!(!actions.contains(&MenuAction::AddStrategy));
    }

    #[test]
    fn test_explore_requires_capability() {
        let capabilities = MenuCapabilities { can_explore: true, ..Default::default() };
        let with_explore = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &capabilities,
            None,
        );
        assert!(actions_of(&with_explore).contains(&MenuAction::Explore));

        let without = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert!(!actions_of(&without).contains(&MenuAction::Explore));
    }

    #[test]
    fn test_streaming_adds_stop_query() {
        let capabilities = MenuCapabilities { is_streaming: true, ..Default::default() };
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &capabilities,
            None,
        );
        assert!(actions_of(&menu).contains(&MenuAction::StopQuery));
    }

    #[test]
    fn test_custom_cluster_present_for_queryable_targets() {
        let menu = service().build_menu(
            &panel_with_targets(vec![time_series_target("A", "usage")]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(actions.contains(&MenuAction::AddStrategy));
        assert!(actions.contains(&MenuAction::DataRetrieval));
        assert!(actions.contains(&MenuAction::RelateAlert));
    }

    #[test]
    fn test_custom_cluster_labels_are_localized() {
        crate::utils::set_locale("zh");
        let menu = service().build_menu(
            &panel_with_targets(vec![time_series_target("A", "usage")]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let labels: Vec<&str> = menu
            .iter()
            .filter(|item| {
                matches!(
                    item.action,
                    Some(MenuAction::AddStrategy)
                        | Some(MenuAction::DataRetrieval)
                        | Some(MenuAction::RelateAlert)
                )
            })
            .map(|item| item.text.as_str())
            .collect();
        assert_eq!(labels, vec!["添加策略", "数据检索", "相关告警"]);
    }

    #[test]
    fn test_custom_cluster_absent_when_target_not_queryable() {
        let plain = json!({ "refId": "A" });
        let menu = service().build_menu(
            &panel_with_targets(vec![time_series_target("A", "usage"), plain]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::AddStrategy));
        assert!(!actions.contains(&MenuAction::DataRetrieval));
        assert!(!actions.contains(&MenuAction::RelateAlert));
    }

    #[test]
    fn test_native_datasource_target_is_queryable() {
        let target = json!({ "refId": "A", "datasourceId": "bkmonitor-timeseries-datasource" });
        let menu = service().build_menu(
            &panel_with_targets(vec![target]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        // Queryable via datasource id, but without metric configs the
        // retrieval entries stay hidden under the default gating.
        let actions = actions_of(&menu);
        assert!(actions.contains(&MenuAction::AddStrategy));
        assert!(!actions.contains(&MenuAction::DataRetrieval));
        assert!(!actions.contains(&MenuAction::RelateAlert));
    }

    #[test]
    fn test_two_targets_hide_add_strategy() {
        let menu = service().build_menu(
            &panel_with_targets(vec![
                time_series_target("A", "usage"),
                time_series_target("B", "idle"),
            ]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::AddStrategy));
        assert!(actions.contains(&MenuAction::DataRetrieval));
    }

    #[test]
    fn test_promql_only_hides_strategy_and_retrieval() {
        let target = json!({
            "refId": "A",
            "only_promql": true,
            "source": "up == 1",
            "query_configs": [{
                "data_source_label": "bk_monitor",
                "data_type_label": "time_series",
                "result_table_id": "t",
                "metric_field": "m"
            }]
        });
        let menu = service().build_menu(
            &panel_with_targets(vec![target]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::AddStrategy));
        assert!(!actions.contains(&MenuAction::DataRetrieval));
        assert!(actions.contains(&MenuAction::RelateAlert));
    }

    #[test]
    fn test_multi_config_strategy_eligibility() {
        let eligible = json!({
            "refId": "A",
            "query_configs": [
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "system.cpu",
                    "metric_field": "usage"
                },
                {
                    "data_source_label": "custom",
                    "data_type_label": "time_series",
                    "result_table_id": "custom.table",
                    "metric_field": "value"
                }
            ]
        });
        let menu = service().build_menu(
            &panel_with_targets(vec![eligible]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert!(actions_of(&menu).contains(&MenuAction::AddStrategy));
    }

    #[test]
    fn test_uptimecheck_table_blocks_strategy() {
        let target = json!({
            "refId": "A",
            "query_configs": [
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "system.cpu",
                    "metric_field": "usage"
                },
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "UptimeCheck.http",
                    "metric_field": "available"
                }
            ]
        });
        let menu = service().build_menu(
            &panel_with_targets(vec![target]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let actions = actions_of(&menu);
        assert!(!actions.contains(&MenuAction::AddStrategy));
        assert!(actions.contains(&MenuAction::DataRetrieval));
    }

    #[test]
    fn test_cmdb_dimension_blocks_strategy() {
        let target = json!({
            "refId": "A",
            "query_configs": [
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "system.cpu",
                    "metric_field": "usage",
                    "group_by": ["bk_inst_id"]
                },
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "system.mem",
                    "metric_field": "used"
                }
            ]
        });
        let menu = service().build_menu(
            &panel_with_targets(vec![target]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert!(!actions_of(&menu).contains(&MenuAction::AddStrategy));
    }

    #[test]
    fn test_non_time_series_multi_config_blocks_strategy() {
        let target = json!({
            "refId": "A",
            "query_configs": [
                {
                    "data_source_label": "bk_monitor",
                    "data_type_label": "time_series",
                    "result_table_id": "system.cpu",
                    "metric_field": "usage"
                },
                {
                    "data_source_label": "bk_log_search",
                    "data_type_label": "log",
                    "result_table_id": "app_log",
                    "metric_field": "count"
                }
            ]
        });
        let menu = service().build_menu(
            &panel_with_targets(vec![target]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert!(!actions_of(&menu).contains(&MenuAction::AddStrategy));
    }

    #[test]
    fn test_remove_needs_edit_and_not_viewing() {
        let capabilities = MenuCapabilities { is_viewing: true, ..Default::default() };
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &capabilities,
            None,
        );
        assert!(!actions_of(&menu).contains(&MenuAction::Remove));

        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        assert_eq!(menu.last().unwrap().action, Some(MenuAction::Remove));
    }

    #[test]
    fn test_more_submenu_library_panel_toggle() {
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &MenuCapabilities::default(),
            None,
        );
        let more = menu
            .iter()
            .find(|item| !item.sub_menu.is_empty() && item.action.is_none())
            .expect("more submenu present");
        let actions: Vec<MenuAction> = more.sub_menu.iter().filter_map(|i| i.action).collect();
        assert!(actions.contains(&MenuAction::CreateLibraryPanel));
        assert!(!actions.contains(&MenuAction::UnlinkLibraryPanel));

        let capabilities = MenuCapabilities { is_library_panel: true, ..Default::default() };
        let menu = service().build_menu(
            &panel_with_targets(vec![]),
            &editable_dashboard(),
            &capabilities,
            None,
        );
        let more = menu
            .iter()
            .find(|item| !item.sub_menu.is_empty() && item.action.is_none())
            .expect("more submenu present");
        let actions: Vec<MenuAction> = more.sub_menu.iter().filter_map(|i| i.action).collect();
        assert!(actions.contains(&MenuAction::UnlinkLibraryPanel));
    }
}

// ============================================================================
// Action Tests
// ============================================================================

mod action_tests {
    use super::*;

    fn no_vars() -> ScopedVarsExpander {
        ScopedVarsExpander::default()
    }

    #[test]
    fn test_add_strategy_builds_deep_link() {
        let navigator = Arc::new(CaptureNavigator::default());
        let service = service_with(Arc::clone(&navigator));
        let panel = panel_with_targets(vec![time_series_target("A", "usage")]);

        let url = service.on_add_strategy(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.starts_with("http://localhost/?bizId=2#/strategy-config/add?data="));
        // Payload is url-encoded JSON of the first normalized record.
        let encoded = url.split("data=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(value["refId"], "A");
        assert_eq!(value["query_configs"][0]["metric_field"], "usage");
        assert_eq!(navigator.urls(), vec![url]);
    }

    #[test]
    fn test_add_strategy_suppressed_with_two_active_targets() {
        let navigator = Arc::new(CaptureNavigator::default());
        let service = service_with(Arc::clone(&navigator));
        let panel = panel_with_targets(vec![
            time_series_target("A", "usage"),
            time_series_target("B", "idle"),
        ]);

        let url = service.on_add_strategy(&panel, &no_vars()).unwrap();
        assert!(url.is_none());
        assert!(navigator.urls().is_empty());
    }

    #[test]
    fn test_add_strategy_ignores_hidden_targets() {
        let mut hidden = time_series_target("B", "idle");
        hidden["hide"] = json!(true);
        let panel = panel_with_targets(vec![time_series_target("A", "usage"), hidden]);

        let url = service().on_add_strategy(&panel, &no_vars()).unwrap().unwrap();
        let encoded = url.split("data=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert_eq!(value["refId"], "A");
    }

    #[test]
    fn test_add_strategy_suppressed_without_targets() {
        let panel = panel_with_targets(vec![]);
        assert!(service().on_add_strategy(&panel, &no_vars()).unwrap().is_none());
    }

    #[test]
    fn test_data_retrieval_routes_time_series() {
        let panel = panel_with_targets(vec![time_series_target("A", "usage")]);
        let url = service().on_data_retrieval(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.starts_with("http://localhost/?bizId=2#/data-retrieval?targets="));

        let encoded = url.split("targets=").nth(1).unwrap();
        let decoded = urlencoding::decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["data"]["refId"], "A");
    }

    #[test]
    fn test_data_retrieval_routes_event() {
        let panel = panel_with_targets(vec![target_with_kind("custom", "event")]);
        let url = service().on_data_retrieval(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.contains("#/event-retrieval?targets="));
    }

    #[test]
    fn test_data_retrieval_routes_monitor_log_to_event() {
        let panel = panel_with_targets(vec![target_with_kind("bk_monitor", "log")]);
        let url = service().on_data_retrieval(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.contains("#/event-retrieval?targets="));
    }

    #[test]
    fn test_data_retrieval_routes_other_log_to_log() {
        let panel = panel_with_targets(vec![target_with_kind("bk_log_search", "log")]);
        let url = service().on_data_retrieval(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.contains("#/log-retrieval?targets="));
    }

    #[test]
    fn test_data_retrieval_suppressed_without_targets() {
        let panel = panel_with_targets(vec![]);
        assert!(service().on_data_retrieval(&panel, &no_vars()).unwrap().is_none());
    }

    #[test]
    fn test_relate_alert_builds_deep_link_with_time_range() {
        let mut panel = panel_with_targets(vec![time_series_target("A", "usage")]);
        panel.time_range = Some(TimeRange {
            from: TimeBound::Epoch(1696118400000),
            to: TimeBound::Text("now".to_string()),
        });

        let url = service().on_relate_alert(&panel, &no_vars()).unwrap().unwrap();
        assert!(url.starts_with("http://localhost/?bizId=2#/event-center?queryString="));
        assert!(url.contains("指标ID : bk_monitor.system.cpu.usage"));
        assert!(url.contains("&from=2023-10-01 00:00:00"));
        assert!(url.ends_with("&to=now"));
    }

    #[test]
    fn test_relate_alert_suppressed_without_signature() {
        let navigator = Arc::new(CaptureNavigator::default());
        let service = service_with(Arc::clone(&navigator));
        // Unknown metric kind produces no signature fragment.
        let panel = panel_with_targets(vec![target_with_kind("unknown", "kind")]);

        assert!(service.on_relate_alert(&panel, &no_vars()).unwrap().is_none());
        assert!(navigator.urls().is_empty());
    }

    #[test]
    fn test_route_selection_table() {
        let config = |source: &str, kind: &str| QueryConfig {
            data_source_label: source.to_string(),
            data_type_label: kind.to_string(),
            ..Default::default()
        };
        assert_eq!(
            MonitorRoute::for_config(Some(&config("bk_monitor", "time_series"))),
            MonitorRoute::DataRetrieval
        );
        assert_eq!(
            MonitorRoute::for_config(Some(&config("bk_monitor", "event"))),
            MonitorRoute::EventRetrieval
        );
        assert_eq!(
            MonitorRoute::for_config(Some(&config("bk_monitor", "log"))),
            MonitorRoute::EventRetrieval
        );
        assert_eq!(
            MonitorRoute::for_config(Some(&config("other", "log"))),
            MonitorRoute::LogRetrieval
        );
        assert_eq!(MonitorRoute::for_config(None), MonitorRoute::DataRetrieval);
    }

    #[test]
    fn test_origin_before_grafana() {
        assert_eq!(
            origin_before_grafana("https://monitor.example.com/grafana/d/abc?orgId=1"),
            "https://monitor.example.com"
        );
        assert_eq!(
            origin_before_grafana("https://monitor.example.com/"),
            "https://monitor.example.com/"
        );
    }
}
