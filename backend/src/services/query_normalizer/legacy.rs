//! Legacy target adaptation
//!
//! Old dashboards store one query per panel target keyed by a composite
//! metric identifier instead of explicit `query_configs`. This module
//! synthesizes a current-format record from that shape so the rest of the
//! pipeline only ever sees one format.

use once_cell::sync::Lazy;
use regex::Regex;

use super::NormalizeError;
use super::models::{
    ConditionItem, FunctionItem, FunctionParam, HostItem, LegacyConditionEntry, LegacyTarget,
    ParamValue, QueryConfig, QueryData, TargetItem,
};

/// Trailing data-type suffix of a composite source-type label, e.g.
/// `bk_monitor_time_series` or `bk_log_search.log`.
static SOURCE_TYPE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(_|\.)(log|event|time_series)$").expect("invalid suffix regex"));

/// Synthesize a current-format query from a legacy record.
///
/// Fails with [`NormalizeError::MalformedLegacyTarget`] when the record
/// lacks the 4-part metric identifier or the `conditions` sequence; a
/// partially-populated record must never be emitted silently.
pub fn adapt_legacy_target(data: &LegacyTarget) -> Result<QueryData, NormalizeError> {
    let metric = data
        .metric
        .as_ref()
        .ok_or_else(|| NormalizeError::malformed("missing metric.id"))?;
    if metric.id.len() < 4 {
        return Err(NormalizeError::malformed(format!(
            "metric.id has {} segments, expected 4",
            metric.id.len()
        )));
    }
    let conditions = data
        .conditions
        .as_ref()
        .ok_or_else(|| NormalizeError::malformed("missing conditions"))?;

    let source_type_label = metric.id[0].as_str();
    let index_set_id = metric.id[1].as_str();
    let result_table_id = metric.id[2].as_str();
    let metric_field = metric.id[3].as_str();

    let (data_source_label, data_type_label) = split_source_type_label(source_type_label);

    let result_table_label = data
        .monitor_object
        .as_ref()
        .map(|object| object.id.clone())
        .unwrap_or_default();

    let config = QueryConfig {
        index_set_id: (data_source_label == "bk_log_search")
            .then(|| index_set_id.to_string()),
        data_source_label,
        data_type_label,
        result_table_label,
        result_table_id: result_table_id.to_string(),
        metric_field: metric_field.to_string(),
        filter_dict: Default::default(),
        functions: legacy_functions(data),
        group_by: data.dimensions.clone(),
        interval: data.period,
        interval_unit: "s".to_string(),
        method: data.method.clone(),
        ref_id: "a".to_string(),
        alias: data.alias.clone(),
        display: true,
        time_field: String::new(),
        query_string: None,
        where_conditions: fold_conditions(conditions),
    };

    let (host, module, cluster) = resolve_selectors(data);

    Ok(QueryData {
        expression: String::new(),
        alias: String::new(),
        display: false,
        ref_id: "a".to_string(),
        query_configs: vec![config],
        host,
        module,
        cluster,
        only_promql: None,
        source: None,
        expression_list: None,
    })
}

/// Split `bk_monitor_time_series` into `("bk_monitor", "time_series")`.
/// Labels without a recognized suffix keep the full label on both sides.
fn split_source_type_label(label: &str) -> (String, String) {
    match SOURCE_TYPE_SUFFIX.captures(label) {
        Some(caps) => {
            let suffix = caps.get(0).map(|m| m.start()).unwrap_or(label.len());
            let kind = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            (label[..suffix].to_string(), kind.to_string())
        }
        None => (label.to_string(), label.to_string()),
    }
}

/// Fold each legacy `{type, value}` pair-list into one condition, keyed by
/// the pair type.
fn fold_conditions(groups: &[Vec<LegacyConditionEntry>]) -> Vec<ConditionItem> {
    groups
        .iter()
        .map(|group| {
            let mut condition = ConditionItem {
                key: String::new(),
                method: String::new(),
                value: Vec::new(),
                condition: None,
            };
            for entry in group {
                match entry.kind.as_str() {
                    "key" => condition.key = value_as_text(&entry.value),
                    "method" => condition.method = value_as_text(&entry.value),
                    "value" => condition.value = value_as_list(&entry.value),
                    "condition" => {
                        let text = value_as_text(&entry.value);
                        if !text.is_empty() {
                            condition.condition = Some(text);
                        }
                    }
                    other => {
                        tracing::debug!("ignoring unknown legacy condition entry type: {}", other);
                    }
                }
            }
            condition
        })
        .collect()
}

fn value_as_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_as_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::String(text) => vec![text.clone()],
        serde_json::Value::Array(items) => items.iter().map(value_as_text).collect(),
        other => vec![other.to_string()],
    }
}

/// Map the legacy rank hint to a `top`/`bottom` function and the offset to
/// a `time_shift` function, appended in that fixed order.
fn legacy_functions(data: &LegacyTarget) -> Vec<FunctionItem> {
    let mut functions = Vec::new();
    if let Some(rank) = data.func.as_ref().and_then(|f| f.rank.as_ref())
        && !rank.sort.is_empty()
    {
        functions.push(FunctionItem {
            id: if rank.sort == "desc" { "top" } else { "bottom" }.to_string(),
            params: vec![FunctionParam {
                id: "n".to_string(),
                name: None,
                value: ParamValue::Number(rank.limit.into()),
            }],
            ..Default::default()
        });
    }
    if let Some(offset) = &data.offset {
        functions.push(FunctionItem {
            id: "time_shift".to_string(),
            params: vec![FunctionParam {
                id: "n".to_string(),
                name: None,
                value: offset.clone(),
            }],
            ..Default::default()
        });
    }
    functions
}

/// Resolve the target-selector sub-variant into host/module/cluster lists.
///
/// The earliest variant carries raw selected values under
/// `target.realValues`; later ones use explicit per-kind lists.
fn resolve_selectors(
    data: &LegacyTarget,
) -> (Vec<HostItem>, Vec<TargetItem>, Vec<TargetItem>) {
    if let Some(selector) = &data.target {
        let hosts_group = data
            .monitor_object
            .as_ref()
            .map(|object| object.group_id == "hosts")
            .unwrap_or(false);
        let host = selector
            .real_values
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|set| {
                if hosts_group {
                    // Host values are `<cloud id>-<ip>` pairs; the ip is
                    // the display label.
                    let label = set.split('-').nth(1).unwrap_or_default().to_string();
                    HostItem::LabelValue(TargetItem { label, value: set.clone() })
                } else {
                    HostItem::ServiceInstance { bk_target_service_instance_id: set.clone() }
                }
            })
            .collect();
        return (host, Vec::new(), Vec::new());
    }

    let host = data
        .host
        .as_ref()
        .map(|wrapper| wrapper.list.iter().cloned().map(HostItem::LabelValue).collect())
        .unwrap_or_default();
    let module = data.module.as_ref().map(|wrapper| wrapper.list.clone()).unwrap_or_default();
    let cluster = data.cluster.as_ref().map(|wrapper| wrapper.list.clone()).unwrap_or_default();
    (host, module, cluster)
}
