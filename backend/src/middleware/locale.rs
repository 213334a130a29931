//! Locale extraction middleware
//!
//! Menu labels are localized per request: the Accept-Language header is
//! resolved to a supported locale and pinned to the current thread for
//! the handler to read.

use axum::{
    extract::Request,
    http::header::ACCEPT_LANGUAGE,
    middleware::Next,
    response::Response,
};

use crate::utils::{extract_locale_from_header, set_locale};

/// Middleware to extract locale from Accept-Language header
pub async fn locale_middleware(req: Request, next: Next) -> Response {
    let locale = req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let locale = extract_locale_from_header(locale);
    set_locale(&locale);

    next.run(req).await
}
