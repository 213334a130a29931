//! Custom action resolution
//!
//! Each custom menu action normalizes the panel's active targets and
//! constructs a deep link into the monitoring platform. The URL formats
//! are a wire contract with the receiving tools and must be reproduced
//! byte for byte.
//!
//! Actions never surface their preconditions as errors: when the
//! normalized payload is empty the navigation is silently suppressed and
//! no URL is produced.

use serde::Serialize;

use super::PanelMenuService;
use crate::models::PanelSnapshot;
use crate::services::query_normalizer::models::{NormalizedQuery, QueryConfig};
use crate::services::query_normalizer::{NormalizeOutput, normalize_targets};
use crate::services::template_vars::TemplateVarService;
use crate::utils::ApiResult;

/// Injected monitoring-platform identity: where deep links point and which
/// business they are scoped to.
#[derive(Debug, Clone, Default)]
pub struct MonitorContext {
    /// Platform origin, i.e. everything before the dashboard mount path.
    pub app_origin: String,
    /// Business identifier appended to every deep link.
    pub biz_id: String,
}

impl MonitorContext {
    /// Derive the context from the dashboard page URL: the origin is the
    /// portion preceding the first `/grafana` path segment.
    pub fn from_page_url(page_url: &str, biz_id: impl Into<String>) -> Self {
        Self {
            app_origin: origin_before_grafana(page_url).to_string(),
            biz_id: biz_id.into(),
        }
    }

    fn base(&self) -> String {
        format!("{}/?bizId={}", self.app_origin, self.biz_id)
    }
}

/// Portion of a page URL preceding the first `/grafana` path segment.
pub fn origin_before_grafana(page_url: &str) -> &str {
    page_url.split("/grafana").next().unwrap_or(page_url)
}

/// Fire-and-forget navigation sink. The HTTP surface hands the URL back to
/// the frontend; embedded callers may open a browser context directly.
pub trait Navigator: Send + Sync {
    fn open(&self, url: &str);
}

/// Default navigator: records the navigation in the service log.
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn open(&self, url: &str) {
        tracing::info!(%url, "opening monitor deep link");
    }
}

/// Opaque analytics sink for menu interactions.
pub trait InteractionReporter: Send + Sync {
    fn report(&self, item: &str);
}

/// Default reporter: interaction events go to the trace log.
pub struct TracingReporter;

impl InteractionReporter for TracingReporter {
    fn report(&self, item: &str) {
        tracing::debug!(item, "dashboards_panelheader_menu");
    }
}

/// Retrieval route selected from the first normalized config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorRoute {
    DataRetrieval,
    EventRetrieval,
    LogRetrieval,
}

impl MonitorRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorRoute::DataRetrieval => "data-retrieval",
            MonitorRoute::EventRetrieval => "event-retrieval",
            MonitorRoute::LogRetrieval => "log-retrieval",
        }
    }

    /// Time-series queries open the data explorer; events and monitor
    /// logs open the event explorer; other logs open the log explorer.
    pub fn for_config(config: Option<&QueryConfig>) -> Self {
        let Some(config) = config else {
            return MonitorRoute::DataRetrieval;
        };
        match (config.data_source_label.as_str(), config.data_type_label.as_str()) {
            (_, "time_series") => MonitorRoute::DataRetrieval,
            (_, "event") | ("bk_monitor", "log") => MonitorRoute::EventRetrieval,
            (_, "log") => MonitorRoute::LogRetrieval,
            _ => MonitorRoute::DataRetrieval,
        }
    }
}

/// Wrapper matching the retrieval tool's `targets` payload element.
#[derive(Serialize)]
struct TargetEnvelope<'a> {
    data: &'a NormalizedQuery,
}

impl PanelMenuService {
    fn normalize_active(
        &self,
        panel: &PanelSnapshot,
        variables: &dyn TemplateVarService,
    ) -> NormalizeOutput {
        let active = panel.active_targets();
        let output = normalize_targets(&active, &self.normalizer, variables);
        for failure in &output.failures {
            tracing::warn!(panel_id = panel.id, ref_id = %failure.ref_id,
                error = %failure.error, "target skipped during normalization");
        }
        output
    }

    /// Resolve the add-strategy deep link. Suppressed unless exactly one
    /// active target normalizes into at least one record.
    pub fn on_add_strategy(
        &self,
        panel: &PanelSnapshot,
        variables: &dyn TemplateVarService,
    ) -> ApiResult<Option<String>> {
        self.reporter.report("add_strategy");
        let active = panel.active_targets();
        if active.len() != 1 {
            return Ok(None);
        }

        let output = self.normalize_active(panel, variables);
        let Some(first) = output.normalized.first() else {
            return Ok(None);
        };

        let payload = serde_json::to_string(first)?;
        let url = format!(
            "{}#/strategy-config/add?data={}",
            self.context.base(),
            urlencoding::encode(&payload)
        );
        tracing::debug!(panel_id = panel.id, %url, "add strategy");
        self.navigator.open(&url);
        Ok(Some(url))
    }

    /// Resolve the data-retrieval deep link for all active targets.
    pub fn on_data_retrieval(
        &self,
        panel: &PanelSnapshot,
        variables: &dyn TemplateVarService,
    ) -> ApiResult<Option<String>> {
        self.reporter.report("data_retrieval");
        let output = self.normalize_active(panel, variables);
        if output.normalized.is_empty() {
            return Ok(None);
        }

        let route = MonitorRoute::for_config(
            output.normalized.first().and_then(|query| query.query_configs.first()),
        );
        let envelopes: Vec<TargetEnvelope<'_>> =
            output.normalized.iter().map(|data| TargetEnvelope { data }).collect();
        let payload = serde_json::to_string(&envelopes)?;
        let url = format!(
            "{}#/{}?targets={}",
            self.context.base(),
            route.as_str(),
            urlencoding::encode(&payload)
        );
        tracing::debug!(panel_id = panel.id, %url, "data retrieval");
        self.navigator.open(&url);
        Ok(Some(url))
    }

    /// Resolve the related-alarms deep link from the metric signature of
    /// all active targets and the panel's current time range.
    pub fn on_relate_alert(
        &self,
        panel: &PanelSnapshot,
        variables: &dyn TemplateVarService,
    ) -> ApiResult<Option<String>> {
        self.reporter.report("relate_alert");
        let output = self.normalize_active(panel, variables);
        if output.metric_signature.is_empty() {
            return Ok(None);
        }

        let (from, to) = panel
            .time_range
            .as_ref()
            .map(|range| (range.from.format_for_link(), range.to.format_for_link()))
            .unwrap_or_default();
        let url = format!(
            "{}#/event-center?queryString={}&from={}&to={}",
            self.context.base(),
            output.metric_signature,
            from,
            to
        );
        tracing::debug!(panel_id = panel.id, %url, "relate alert");
        self.navigator.open(&url);
        Ok(Some(url))
    }
}
