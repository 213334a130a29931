//! Metric signature derivation
//!
//! A metric signature is the identifier string the alarm center matches
//! against when looking up events related to a set of metrics. Each query
//! config contributes one fragment; the final search string joins the
//! distinct fragments in first-seen order.

use super::models::QueryConfig;

/// Wire literal prefixed to every fragment of the alarm-center search
/// string. Not localized: the receiving system matches it verbatim.
pub const METRIC_ID_LABEL: &str = "指标ID : ";

/// Wire literal joining signature fragments.
pub const FRAGMENT_SEPARATOR: &str = " or ";

/// Inputs of [`derive_metric_signature`]. The optional identifiers are only
/// consulted by the metric kinds that use them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricDescriptor<'a> {
    pub data_source_label: &'a str,
    pub data_type_label: &'a str,
    pub metric_field: &'a str,
    pub result_table_id: &'a str,
    pub index_set_id: Option<&'a str>,
    pub strategy_id: Option<&'a str>,
    pub alert_name: Option<&'a str>,
}

impl<'a> From<&'a QueryConfig> for MetricDescriptor<'a> {
    fn from(config: &'a QueryConfig) -> Self {
        Self {
            data_source_label: &config.data_source_label,
            data_type_label: &config.data_type_label,
            metric_field: &config.metric_field,
            result_table_id: &config.result_table_id,
            index_set_id: config.index_set_id.as_deref(),
            strategy_id: None,
            alert_name: None,
        }
    }
}

/// Derive the signature fragment for one metric.
///
/// `data_source_label|data_type_label` is a closed enumeration; unmatched
/// combinations yield an empty fragment and are dropped from the final
/// search string.
pub fn derive_metric_signature(metric: &MetricDescriptor<'_>) -> String {
    let MetricDescriptor {
        data_source_label: source,
        data_type_label: kind,
        metric_field,
        result_table_id,
        index_set_id,
        strategy_id,
        alert_name,
    } = *metric;

    match (source, kind) {
        ("bk_monitor", "time_series") | ("custom", "time_series") | ("bk_data", "time_series") => {
            [source, result_table_id, metric_field].join(".")
        }
        ("bk_monitor", "event") => [source, metric_field].join("."),
        ("bk_monitor", "log") => [source, kind, result_table_id].join("."),
        ("bk_monitor", "alert") => {
            [source, kind, strategy_id.unwrap_or(metric_field)].join(".")
        }
        ("custom", "event") => [source, kind, result_table_id, "*"].join("."),
        ("bk_log_search", "log") => {
            format!("{}.index_set.{}", source, index_set_id.unwrap_or_default())
        }
        ("bk_fta", "alert") | ("bk_fta", "event") => {
            [source, kind, alert_name.unwrap_or(metric_field)].join(".")
        }
        _ => String::new(),
    }
}

/// Collects distinct non-empty fragments in first-seen order and renders
/// the alarm-center search string.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    fragments: Vec<String>,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fragment. Empty fragments and repeats are ignored.
    pub fn record(&mut self, fragment: String) {
        if !fragment.is_empty() && !self.fragments.contains(&fragment) {
            self.fragments.push(fragment);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Render `指标ID : f1 or 指标ID : f2 ...`; empty set renders as `""`.
    pub fn render(&self) -> String {
        let mut query_string = String::new();
        for fragment in &self.fragments {
            if !query_string.is_empty() {
                query_string.push_str(FRAGMENT_SEPARATOR);
            }
            query_string.push_str(METRIC_ID_LABEL);
            query_string.push_str(fragment);
        }
        query_string
    }
}
