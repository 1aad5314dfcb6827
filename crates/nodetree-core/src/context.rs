//! Per-request locale and timezone
//!
//! Titles are spelled in the request's language and timestamps are shown in
//! the request's timezone. Storage is always UTC.

use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Two-letter lowercase language code (e.g. "en", "es")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    /// Parse an exact two-letter code, case-insensitive
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(Self(code.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// Take the language from a header value such as `es-AR,es;q=0.9`
    ///
    /// Only the first two characters count.
    pub fn from_header(value: &str) -> Option<Self> {
        let prefix: String = value.trim().chars().take(2).collect();
        Self::parse(&prefix)
    }

    pub fn english() -> Self {
        Self("en".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to render nodes for one request
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub locale: Locale,
    pub timezone: Tz,
}

impl Projection {
    pub fn new(locale: Locale, timezone: Tz) -> Self {
        Self { locale, timezone }
    }

    /// Timestamps in UTC
    pub fn utc(locale: Locale) -> Self {
        Self::new(locale, Tz::UTC)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::utc(Locale::default())
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::InvalidArgument(format!("Unknown timezone: {}", name)))
}

/// Shift a UTC instant into `tz`
pub fn to_zone(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    tz.from_utc_datetime(&instant.naive_utc())
}

/// Shift a zoned instant back to UTC
pub fn to_utc(zoned: DateTime<Tz>) -> DateTime<Utc> {
    zoned.with_timezone(&Utc)
}

/// `YYYY-MM-DD HH:MM:SS` wall-clock time in `tz`
pub fn format_timestamp(instant: DateTime<Utc>, tz: Tz) -> String {
    to_zone(instant, tz).format("%Y-%m-%d %H:%M:%S").to_string()
}
