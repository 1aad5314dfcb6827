//! Request locale and timezone, read from headers

use crate::{AppState, response::ApiError};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::ACCEPT_LANGUAGE, request::Parts},
};
use nodetree_core::{Locale, Projection, context::parse_timezone};
use std::sync::Arc;

const X_LANG: &str = "x-lang";
const X_TIMEZONE: &str = "x-timezone";

/// Locale and timezone for the current request
///
/// `X-Lang` wins over `Accept-Language`; only the first two characters are
/// used. `X-Timezone` takes an IANA name. Missing headers fall back to the
/// configured defaults.
#[derive(Debug, Clone)]
pub struct RequestContext(pub Projection);

fn header<'a>(headers: &'a HeaderMap, name: impl axum::http::header::AsHeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let locale = header(&parts.headers, X_LANG)
            .or_else(|| header(&parts.headers, ACCEPT_LANGUAGE))
            .and_then(Locale::from_header)
            .unwrap_or_else(|| state.default_locale.clone());

        let timezone = match header(&parts.headers, X_TIMEZONE) {
            Some(name) => parse_timezone(name)?,
            None => state.default_timezone,
        };

        Ok(Self(Projection::new(locale, timezone)))
    }
}
