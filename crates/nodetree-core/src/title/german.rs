//! German cardinals ("einundzwanzig", "eintausendeins")

use super::check_range;
use crate::Result;

const UNITS: [&str; 20] = [
    "null", "eins", "zwei", "drei", "vier", "fünf", "sechs", "sieben", "acht", "neun", "zehn",
    "elf", "zwölf", "dreizehn", "vierzehn", "fünfzehn", "sechzehn", "siebzehn", "achtzehn",
    "neunzehn",
];

const TENS: [&str; 10] = [
    "", "", "zwanzig", "dreißig", "vierzig", "fünfzig", "sechzig", "siebzig", "achtzig", "neunzig",
];

/// "ein" inside compounds, "eins" only at the end of a number
fn unit_prefix(n: usize) -> &'static str {
    if n == 1 { "ein" } else { UNITS[n] }
}

fn below_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        return UNITS[n].to_string();
    }
    match n % 10 {
        0 => TENS[n / 10].to_string(),
        unit => format!("{}und{}", unit_prefix(unit), TENS[n / 10]),
    }
}

fn below_thousand(n: u64) -> String {
    let (hundreds, rest) = (n / 100, n % 100);
    let mut words = String::new();
    if hundreds > 0 {
        words.push_str(unit_prefix(hundreds as usize));
        words.push_str("hundert");
    }
    if rest > 0 {
        words.push_str(&below_hundred(rest));
    }
    words
}

/// Count glued in front of "tausend" ("eintausend", "einhunderteintausend")
fn compound(n: u64) -> String {
    let words = below_thousand(n);
    match words.strip_suffix("eins") {
        Some(stem) => format!("{}ein", stem),
        None => words,
    }
}

/// Count in front of "Million"/"Milliarde" (feminine: "eine")
fn feminine(n: u64) -> String {
    let words = below_thousand(n);
    match words.strip_suffix("eins") {
        Some(stem) => format!("{}eine", stem),
        None => words,
    }
}

fn scaled(count: u64, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("eine {}", singular)
    } else {
        format!("{} {}", feminine(count), plural)
    }
}

pub(super) fn spell(n: u64) -> Result<String> {
    check_range(n, "German")?;
    if n == 0 {
        return Ok(UNITS[0].to_string());
    }

    let billions = n / 1_000_000_000;
    let millions = n / 1_000_000 % 1000;
    let thousands = n / 1000 % 1000;
    let rest = n % 1000;

    let mut parts = Vec::new();
    if billions > 0 {
        parts.push(scaled(billions, "Milliarde", "Milliarden"));
    }
    if millions > 0 {
        parts.push(scaled(millions, "Million", "Millionen"));
    }

    let mut tail = String::new();
    if thousands > 0 {
        tail.push_str(&compound(thousands));
        tail.push_str("tausend");
    }
    if rest > 0 {
        tail.push_str(&below_thousand(rest));
    }
    if !tail.is_empty() {
        parts.push(tail);
    }
    Ok(parts.join(" "))
}
