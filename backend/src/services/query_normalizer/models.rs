//! Query target wire models
//!
//! These models mirror the JSON shapes exchanged with the dashboard frontend
//! and the monitoring platform's strategy/retrieval tools. Field casing is
//! part of the wire contract (mixed snake_case and camelCase) and is pinned
//! with explicit serde renames.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

// ============================================================================
// Current-format query target
// ============================================================================

/// One query definition attached to a visualization panel, as sent by the
/// dashboard frontend. Carries the current-format body and, on dashboards
/// saved by old clients, the legacy `data` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PanelTarget {
    /// Hidden targets are skipped by every custom action.
    #[serde(default)]
    pub hide: bool,

    /// Datasource plugin id, e.g. `bkmonitor-timeseries-datasource`.
    #[serde(rename = "datasourceId", default, skip_serializing_if = "Option::is_none")]
    pub datasource_id: Option<String>,

    /// Legacy payload. Present only on targets saved before the
    /// `query_configs` format existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LegacyTarget>,

    #[serde(flatten)]
    pub query: QueryData,
}

impl PanelTarget {
    /// Legacy targets are recognized by a composite metric id with more
    /// than three segments (source-type label, index-set id, table id,
    /// metric field).
    pub fn is_legacy(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.metric.as_ref())
            .map(|m| m.id.len() > 3)
            .unwrap_or(false)
    }
}

/// Current-format query body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct QueryData {
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub query_configs: Vec<QueryConfig>,
    #[serde(rename = "refId", default)]
    pub ref_id: String,
    #[serde(default)]
    pub host: Vec<HostItem>,
    #[serde(default)]
    pub module: Vec<TargetItem>,
    #[serde(default)]
    pub cluster: Vec<TargetItem>,
    /// Set when the target is expressed purely as a raw query-language
    /// string with no structured configs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_promql: Option<bool>,
    /// Raw query-language source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "expressionList", default, skip_serializing_if = "Option::is_none")]
    pub expression_list: Option<Vec<ExpressionItem>>,
}

/// One entry of the normalized `expressionList`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpressionItem {
    pub expression: String,
    pub functions: Vec<FunctionItem>,
    pub alias: String,
    pub active: bool,
}

/// One data-source-bound metric query within a target.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct QueryConfig {
    pub data_source_label: String,
    pub data_type_label: String,
    #[serde(default)]
    pub result_table_label: String,
    #[serde(default)]
    pub result_table_id: String,
    #[serde(default)]
    pub metric_field: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filter_dict: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub functions: Vec<FunctionItem>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub interval: i64,
    #[serde(default)]
    pub interval_unit: String,
    #[serde(default)]
    pub method: String,
    #[serde(rename = "refId", default)]
    pub ref_id: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub time_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(rename = "where", default)]
    pub where_conditions: Vec<ConditionItem>,
}

impl QueryConfig {
    /// `data_source_label|data_type_label`, the key of the metric-kind table.
    pub fn meta_label(&self) -> String {
        format!("{}|{}", self.data_source_label, self.data_type_label)
    }
}

/// One filter condition. Values beginning with the `$` sigil reference
/// dashboard template variables and are expanded before use.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConditionItem {
    pub key: String,
    pub method: String,
    #[serde(default)]
    pub value: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// A named query transform (rank, time shift, rate, ...) with ordered
/// parameters.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct FunctionItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<FunctionParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FunctionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FunctionParam {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: ParamValue,
}

/// Function parameter value. Only text values participate in template
/// variable expansion; numbers pass through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    #[schema(value_type = f64)]
    Number(serde_json::Number),
}

/// Label/value descriptor used by module and cluster selector lists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TargetItem {
    pub label: String,
    pub value: String,
}

/// Host selector entry. Old host-group targets use label/value pairs,
/// service-instance targets carry the instance id alone.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum HostItem {
    LabelValue(TargetItem),
    ServiceInstance {
        bk_target_service_instance_id: String,
    },
}

// ============================================================================
// Legacy-format query target
// ============================================================================

/// Legacy query-target payload, keyed by a composite metric identifier
/// instead of explicit query configs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<LegacyMetric>,
    #[serde(rename = "monitorObject", default, skip_serializing_if = "Option::is_none")]
    pub monitor_object: Option<MonitorObject>,
    /// Sequence of key/value pair-lists, folded into `where` conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Vec<LegacyConditionEntry>>>,
    #[serde(default)]
    pub dimensions: Vec<String>,
    /// Monitor period in seconds.
    #[serde(default)]
    pub period: i64,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func: Option<LegacyFunc>,
    /// Time-shift offset, mapped to a `time_shift` function when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<LegacySelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<LegacyList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<LegacyList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<LegacyList>,
}

/// Composite metric identifier: `[source_type_label, index_set_id,
/// result_table_id, metric_field]`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyMetric {
    #[serde(default)]
    pub id: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct MonitorObject {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "groupId", default)]
    pub group_id: String,
}

/// One `{type, value}` pair of a legacy condition group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LegacyConditionEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyFunc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<LegacyRank>,
}

/// Rank hint: `sort` direction plus result `limit`, mapped to a
/// `top`/`bottom` function.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyRank {
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub limit: i64,
}

/// Earliest-variant target selector carrying raw selected values.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacySelector {
    #[serde(rename = "realValues", default, skip_serializing_if = "Option::is_none")]
    pub real_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LegacyList {
    #[serde(default)]
    pub list: Vec<TargetItem>,
}

// ============================================================================
// Normalized output
// ============================================================================

/// Per-target normalization output: the current-format record with
/// `alias`/`display`/`expression` stripped (the expression survives as a
/// single-entry `expressionList`) and all conditions and functions already
/// variable-expanded and filtered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NormalizedQuery {
    pub query_configs: Vec<QueryConfig>,
    #[serde(rename = "refId")]
    pub ref_id: String,
    pub host: Vec<HostItem>,
    pub module: Vec<TargetItem>,
    pub cluster: Vec<TargetItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_promql: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "expressionList", default, skip_serializing_if = "Option::is_none")]
    pub expression_list: Option<Vec<ExpressionItem>>,
}
