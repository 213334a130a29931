pub mod panel_menu;
pub mod query_normalizer;
pub mod template_vars;

pub use panel_menu::{ExtendedMenuProvider, PanelMenuService};
pub use query_normalizer::{NormalizeOutput, NormalizerOptions, normalize_targets};
pub use template_vars::{ScopedVarsExpander, TemplateVarService};
