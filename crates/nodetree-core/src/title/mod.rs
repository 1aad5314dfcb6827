//! Node titles: the node id spelled out in words
//!
//! Titles are derived, never stored as the source of truth. A provider must
//! be deterministic for a given `(n, locale)`.

mod english;
mod french;
mod german;
mod spanish;

use crate::{Error, Locale, Result};

/// Locales `Spellout` can render
pub const SUPPORTED_LOCALES: &[&str] = &["en", "es", "fr", "de"];

/// Maps a number and locale to its spelled-out form
pub trait TitleProvider: Send + Sync {
    /// Spell `n` in `locale`, first letter capitalized
    fn spell(&self, n: u64, locale: &Locale) -> Result<String>;

    /// Like `spell`, but falls back to English instead of failing
    fn number_to_words(&self, n: u64, locale: &Locale) -> String {
        match self.spell(n, locale) {
            Ok(words) => words,
            Err(e) => {
                tracing::debug!(n, locale = %locale, error = %e, "falling back to English title");
                capitalize(&english::spell(n))
            }
        }
    }
}

/// Cardinal spell-out for en, es, fr and de
#[derive(Debug, Clone, Copy, Default)]
pub struct Spellout;

impl Spellout {
    pub fn supports(locale: &Locale) -> bool {
        SUPPORTED_LOCALES.contains(&locale.as_str())
    }
}

impl TitleProvider for Spellout {
    fn spell(&self, n: u64, locale: &Locale) -> Result<String> {
        let words = match locale.as_str() {
            "en" => english::spell(n),
            "es" => spanish::spell(n)?,
            "fr" => french::spell(n)?,
            "de" => german::spell(n)?,
            other => return Err(Error::Unsupported(format!("locale {}", other))),
        };
        Ok(capitalize(&words))
    }
}

fn capitalize(words: &str) -> String {
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Largest value the non-English tables spell (exclusive)
const TRILLION: u64 = 1_000_000_000_000;

fn check_range(n: u64, language: &str) -> Result<()> {
    if n >= TRILLION {
        return Err(Error::Unsupported(format!(
            "{} spell-out of {} (limit {})",
            language, n, TRILLION
        )));
    }
    Ok(())
}
