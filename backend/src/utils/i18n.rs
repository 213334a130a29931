//! Request locale plumbing
//!
//! Menu labels are localized per request. The locale is extracted from the
//! Accept-Language header by the locale middleware and held in thread-local
//! storage for the duration of the request.

use std::cell::RefCell;

thread_local! {
    static CURRENT_LOCALE: RefCell<String> = RefCell::new(DEFAULT_LOCALE.to_string());
}

pub const SUPPORTED_LOCALES: &[&str] = &["zh", "en"];
pub const DEFAULT_LOCALE: &str = "zh";

/// Set the current locale for the current thread.
pub fn set_locale(locale: &str) {
    let locale = normalize_locale(locale);
    CURRENT_LOCALE.with(|l| {
        *l.borrow_mut() = locale;
    });
}

/// Get the current locale for the current thread.
pub fn get_locale() -> String {
    CURRENT_LOCALE.with(|l| l.borrow().clone())
}

/// Normalize a locale tag to a supported locale.
/// Accepts forms like "zh", "zh-CN", "zh_CN", "en-US".
fn normalize_locale(locale: &str) -> String {
    let locale = locale.trim().to_lowercase();
    let primary = locale
        .split(|c| c == '-' || c == '_' || c == ',')
        .next()
        .unwrap_or(DEFAULT_LOCALE);

    for supported in SUPPORTED_LOCALES {
        if primary.starts_with(supported) {
            return (*supported).to_string();
        }
    }
    DEFAULT_LOCALE.to_string()
}

/// Extract the locale from an Accept-Language header value.
pub fn extract_locale_from_header(header_value: Option<&str>) -> String {
    match header_value {
        Some(value) => normalize_locale(value),
        None => DEFAULT_LOCALE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("zh"), "zh");
        assert_eq!(normalize_locale("zh-CN"), "zh");
        assert_eq!(normalize_locale("en_US"), "en");
        assert_eq!(normalize_locale("fr"), "zh"); // Unsupported, fallback to default
        assert_eq!(normalize_locale(""), "zh");
    }

    #[test]
    fn test_extract_locale_from_header() {
        assert_eq!(extract_locale_from_header(Some("en-US,en;q=0.9")), "en");
        assert_eq!(extract_locale_from_header(None), "zh");
    }
}
