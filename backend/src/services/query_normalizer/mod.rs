//! Query target normalization
//!
//! Converts the heterogeneous query targets attached to a panel
//! (current-format or legacy-format) into a uniform list of normalized
//! query records and derives the metric signature string used to look up
//! related alarms.
//!
//! The transformation is pure: every call works on a deep copy of the
//! caller's snapshot, and a malformed target only fails itself; siblings
//! still normalize and the failures are reported alongside the output.

pub mod legacy;
pub mod models;
pub mod signature;


pub use legacy::adapt_legacy_target;
pub use signature::{FRAGMENT_SEPARATOR, METRIC_ID_LABEL, MetricDescriptor, SignatureBuilder,
    derive_metric_signature};

use std::collections::HashSet;
use thiserror::Error;

use crate::services::template_vars::TemplateVarService;
use models::{
    ConditionItem, ExpressionItem, FunctionItem, NormalizedQuery, PanelTarget, ParamValue,
    QueryConfig,
};

/// Per-target normalization error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// Legacy record missing the expected 4-part metric identifier or the
    /// conditions sequence.
    #[error("malformed legacy target: {reason}")]
    MalformedLegacyTarget { reason: String },
}

impl NormalizeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedLegacyTarget { reason: reason.into() }
    }
}

/// Normalization policy knobs.
///
/// The function exclusion set differs between observed callers (`top` and
/// `bottom` always, `time_shift` in the stricter policy), so it is a
/// parameter rather than a hardcoded branch.
#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Function ids dropped from normalized output. These are display-only
    /// ranking/offset hints the downstream tools do not understand.
    pub excluded_function_ids: HashSet<String>,
    /// A raw query-language source longer than this is re-expanded through
    /// the template-variable service before inclusion.
    pub source_min_len: usize,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            excluded_function_ids: ["top", "bottom", "time_shift"]
                .into_iter()
                .map(String::from)
                .collect(),
            source_min_len: 0,
        }
    }
}

impl NormalizerOptions {
    pub fn with_excluded_functions<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded_function_ids: ids.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// A target that failed to normalize. Index and refId identify it within
/// the submitted snapshot.
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub index: usize,
    pub ref_id: String,
    pub error: NormalizeError,
}

/// Output of [`normalize_targets`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutput {
    pub normalized: Vec<NormalizedQuery>,
    pub metric_signature: String,
    pub failures: Vec<TargetFailure>,
}

/// Normalize a list of targets in input order.
///
/// Legacy records are adapted first (see [`legacy`]); every config then has
/// its filter values variable-expanded, its excluded functions dropped, its
/// interval canonicalized to seconds, and its metric signature fragment
/// recorded (set semantics, first-seen order).
pub fn normalize_targets(
    targets: &[&PanelTarget],
    options: &NormalizerOptions,
    variables: &dyn TemplateVarService,
) -> NormalizeOutput {
    let mut output = NormalizeOutput::default();
    let mut signature = SignatureBuilder::new();

    for (index, target) in targets.iter().enumerate() {
        // Work on a private copy; the caller's snapshot is never aliased.
        let mut data = if target.is_legacy() {
            let legacy = target.data.as_ref().expect("legacy target carries data");
            match adapt_legacy_target(legacy) {
                Ok(data) => data,
                Err(error) => {
                    tracing::warn!(index, ref_id = %target.query.ref_id, %error,
                        "skipping target that failed to normalize");
                    output.failures.push(TargetFailure {
                        index,
                        ref_id: target.query.ref_id.clone(),
                        error,
                    });
                    continue;
                }
            }
        } else {
            target.query.clone()
        };

        for config in &mut data.query_configs {
            expand_conditions(&mut config.where_conditions, variables);
            config.functions =
                filter_functions(std::mem::take(&mut config.functions), options, variables);
            canonicalize_interval(config);
            signature.record(derive_metric_signature(&MetricDescriptor::from(&*config)));
        }

        let expression_list = (!data.expression.is_empty()).then(|| {
            vec![ExpressionItem {
                expression: data.expression.clone(),
                active: data.display,
                functions: Vec::new(),
                alias: data.alias.clone(),
            }]
        });

        let source = data.source.map(|source| {
            if source.len() > options.source_min_len {
                variables.replace_source(&source)
            } else {
                source
            }
        });

        output.normalized.push(NormalizedQuery {
            query_configs: data.query_configs,
            ref_id: data.ref_id,
            host: data.host,
            module: data.module,
            cluster: data.cluster,
            only_promql: data.only_promql,
            source,
            expression_list,
        });
    }

    output.metric_signature = signature.render();
    output
}

/// Expand `$variable` references in condition values. A reference that
/// expands to nothing falls back to the original literal so a user's
/// filter is never silently dropped.
fn expand_conditions(conditions: &mut [ConditionItem], variables: &dyn TemplateVarService) {
    for condition in conditions {
        condition.value = build_where_values(&condition.value, variables);
    }
}

pub(crate) fn build_where_values(
    values: &[String],
    variables: &dyn TemplateVarService,
) -> Vec<String> {
    let mut expanded = Vec::with_capacity(values.len());
    for value in values {
        if value.starts_with('$') {
            let resolved = variables.expand(value);
            if resolved.is_empty() {
                expanded.push(value.clone());
            } else {
                expanded.extend(resolved);
            }
        } else {
            expanded.push(value.clone());
        }
    }
    expanded
}

/// Drop excluded functions and expand string parameters of the retained
/// ones. Number parameters pass through unchanged.
fn filter_functions(
    functions: Vec<FunctionItem>,
    options: &NormalizerOptions,
    variables: &dyn TemplateVarService,
) -> Vec<FunctionItem> {
    functions
        .into_iter()
        .filter(|function| !options.excluded_function_ids.contains(&function.id))
        .map(|mut function| {
            for param in &mut function.params {
                if let ParamValue::Text(text) = &param.value {
                    param.value = ParamValue::Text(variables.replace(text));
                }
            }
            function
        })
        .collect()
}

/// Convert a raw interval + unit pair to canonical integer seconds.
fn canonicalize_interval(config: &mut QueryConfig) {
    let multiplier = match config.interval_unit.as_str() {
        "m" | "min" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return,
    };
    config.interval *= multiplier;
    config.interval_unit = "s".to_string();
}
