//! Spanish cardinals ("ciento veintitrés", "veintiún mil")

use super::check_range;
use crate::Result;

const UNITS: [&str; 30] = [
    "cero", "uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez",
    "once", "doce", "trece", "catorce", "quince", "dieciséis", "diecisiete", "dieciocho",
    "diecinueve", "veinte", "veintiuno", "veintidós", "veintitrés", "veinticuatro",
    "veinticinco", "veintiséis", "veintisiete", "veintiocho", "veintinueve",
];

const TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];

const HUNDREDS: [&str; 10] = [
    "",
    "ciento",
    "doscientos",
    "trescientos",
    "cuatrocientos",
    "quinientos",
    "seiscientos",
    "setecientos",
    "ochocientos",
    "novecientos",
];

/// `apocope` shortens a trailing "uno" to "un" before a noun (mil, millones)
fn below_hundred(n: u64, apocope: bool) -> String {
    let n = n as usize;
    if n < 30 {
        return match (n, apocope) {
            (1, true) => "un".to_string(),
            (21, true) => "veintiún".to_string(),
            _ => UNITS[n].to_string(),
        };
    }
    match n % 10 {
        0 => TENS[n / 10].to_string(),
        1 if apocope => format!("{} y un", TENS[n / 10]),
        unit => format!("{} y {}", TENS[n / 10], UNITS[unit]),
    }
}

fn below_thousand(n: u64, apocope: bool) -> String {
    if n == 100 {
        return "cien".to_string();
    }
    let (hundreds, rest) = (n / 100, n % 100);
    match (hundreds, rest) {
        (0, _) => below_hundred(rest, apocope),
        (h, 0) => HUNDREDS[h as usize].to_string(),
        (h, r) => format!("{} {}", HUNDREDS[h as usize], below_hundred(r, apocope)),
    }
}

fn below_million(n: u64, apocope: bool) -> String {
    let (thousands, rest) = (n / 1000, n % 1000);
    let mut parts = Vec::new();
    match thousands {
        0 => {}
        1 => parts.push("mil".to_string()),
        t => parts.push(format!("{} mil", below_thousand(t, true))),
    }
    if rest > 0 {
        parts.push(below_thousand(rest, apocope));
    }
    parts.join(" ")
}

pub(super) fn spell(n: u64) -> Result<String> {
    check_range(n, "Spanish")?;
    if n == 0 {
        return Ok(UNITS[0].to_string());
    }

    let (millions, rest) = (n / 1_000_000, n % 1_000_000);
    let mut parts = Vec::new();
    match millions {
        0 => {}
        1 => parts.push("un millón".to_string()),
        m => parts.push(format!("{} millones", below_million(m, true))),
    }
    if rest > 0 {
        parts.push(below_million(rest, false));
    }
    Ok(parts.join(" "))
}
