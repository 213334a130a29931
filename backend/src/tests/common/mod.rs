// Common test utilities and helpers

use serde_json::json;
use std::sync::Arc;

use crate::AppState;
use crate::config::Config;
use crate::handlers::PanelMenuRequest;

/// Application state backed by the default configuration
/// (origin `http://localhost`, bizId `2`).
pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::new(Config::default()))
}

/// Menu request for an editable dashboard with the given targets.
pub fn menu_request(targets: Vec<serde_json::Value>) -> PanelMenuRequest {
    serde_json::from_value(json!({
        "panel": { "id": 1, "targets": targets },
        "dashboard": { "can_edit_panel": true, "can_edit": true, "is_editor": true },
        "capabilities": {}
    }))
    .expect("request fixture must deserialize")
}

/// A current-format time-series target.
pub fn cpu_target(ref_id: &str) -> serde_json::Value {
    json!({
        "refId": ref_id,
        "query_configs": [{
            "data_source_label": "bk_monitor",
            "data_type_label": "time_series",
            "result_table_id": "system.cpu",
            "metric_field": "usage",
            "refId": "a",
            "method": "AVG",
            "interval": 60,
            "interval_unit": "s"
        }]
    })
}

/// A legacy-format target as saved by old dashboards.
pub fn legacy_cpu_target(ref_id: &str) -> serde_json::Value {
    json!({
        "refId": ref_id,
        "data": {
            "metric": { "id": ["bk_monitor_time_series", "", "tableA", "cpu_usage"] },
            "monitorObject": { "id": "host", "groupId": "hosts" },
            "conditions": [],
            "dimensions": [],
            "period": 60,
            "method": "AVG",
            "alias": "a"
        }
    })
}
