//! Template variable expansion
//!
//! Dashboard filter values and function parameters may reference template
//! variables with a `$` sigil (`$host`, `${cluster}`). The dashboard ships
//! the variables' current values with each panel snapshot; this service
//! expands references against that map.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static VAR_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(?:\{(\w+)\}|(\w+))").expect("invalid variable regex"));

/// Expansion contract consumed by the query normalizer.
///
/// `replace` performs scalar in-place substitution (unknown variables are
/// left as-is); `expand` resolves a whole-value reference into the
/// variable's current values and returns an empty list when the variable
/// is undefined.
pub trait TemplateVarService: Send + Sync {
    fn replace(&self, text: &str) -> String;

    fn expand(&self, text: &str) -> Vec<String>;

    /// Substitution for raw query-language sources. The default scalar
    /// substitution is correct for PromQL label values.
    fn replace_source(&self, source: &str) -> String {
        self.replace(source)
    }
}

/// Expander backed by the `scoped_vars` map of a panel snapshot.
#[derive(Debug, Clone, Default)]
pub struct ScopedVarsExpander {
    vars: HashMap<String, Vec<String>>,
}

impl ScopedVarsExpander {
    pub fn new(vars: HashMap<String, Vec<String>>) -> Self {
        Self { vars }
    }

    fn lookup(&self, name: &str) -> Option<&Vec<String>> {
        self.vars.get(name).filter(|values| !values.is_empty())
    }
}

impl TemplateVarService for ScopedVarsExpander {
    fn replace(&self, text: &str) -> String {
        VAR_REFERENCE
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
                match name.and_then(|n| self.lookup(n)) {
                    // Multi-value variables collapse to a comma list in
                    // scalar position.
                    Some(values) => values.join(","),
                    None => caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string(),
                }
            })
            .into_owned()
    }

    fn expand(&self, text: &str) -> Vec<String> {
        let name = text
            .strip_prefix('$')
            .map(|rest| rest.trim_start_matches('{').trim_end_matches('}'));
        match name.and_then(|n| self.lookup(n)) {
            Some(values) => values.clone(),
            None => Vec::new(),
        }
    }
}
