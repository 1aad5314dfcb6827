//! French cardinals ("soixante-et-onze", "quatre-vingts")

use super::check_range;
use crate::Result;

const UNITS: [&str; 17] = [
    "zéro", "un", "deux", "trois", "quatre", "cinq", "six", "sept", "huit", "neuf", "dix", "onze",
    "douze", "treize", "quatorze", "quinze", "seize",
];

const TENS: [&str; 7] = [
    "", "", "vingt", "trente", "quarante", "cinquante", "soixante",
];

/// `terminal` is false when the number multiplies "mille"; "vingts" and
/// "cents" only take their plural s at the end of a number.
fn below_hundred(n: u64, terminal: bool) -> String {
    let n = n as usize;
    match n {
        0..=16 => UNITS[n].to_string(),
        17..=19 => format!("dix-{}", UNITS[n - 10]),
        20..=69 => match n % 10 {
            0 => TENS[n / 10].to_string(),
            1 => format!("{}-et-un", TENS[n / 10]),
            unit => format!("{}-{}", TENS[n / 10], UNITS[unit]),
        },
        70 => "soixante-dix".to_string(),
        71 => "soixante-et-onze".to_string(),
        72..=79 => format!("soixante-{}", below_hundred((n - 60) as u64, terminal)),
        80 if terminal => "quatre-vingts".to_string(),
        80 => "quatre-vingt".to_string(),
        _ => format!("quatre-vingt-{}", below_hundred((n - 80) as u64, terminal)),
    }
}

fn below_thousand(n: u64, terminal: bool) -> String {
    let (hundreds, rest) = (n / 100, n % 100);
    match (hundreds, rest) {
        (0, _) => below_hundred(rest, terminal),
        (1, 0) => "cent".to_string(),
        (1, r) => format!("cent {}", below_hundred(r, terminal)),
        (h, 0) if terminal => format!("{} cents", UNITS[h as usize]),
        (h, 0) => format!("{} cent", UNITS[h as usize]),
        (h, r) => format!("{} cent {}", UNITS[h as usize], below_hundred(r, terminal)),
    }
}

fn scaled(count: u64, noun: &str) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!("{} {}{}", below_thousand(count, true), noun, plural)
}

pub(super) fn spell(n: u64) -> Result<String> {
    check_range(n, "French")?;
    if n == 0 {
        return Ok(UNITS[0].to_string());
    }

    let billions = n / 1_000_000_000;
    let millions = n / 1_000_000 % 1000;
    let thousands = n / 1000 % 1000;
    let rest = n % 1000;

    let mut parts = Vec::new();
    if billions > 0 {
        parts.push(scaled(billions, "milliard"));
    }
    if millions > 0 {
        parts.push(scaled(millions, "million"));
    }
    match thousands {
        0 => {}
        1 => parts.push("mille".to_string()),
        t => parts.push(format!("{} mille", below_thousand(t, false))),
    }
    if rest > 0 {
        parts.push(below_thousand(rest, true));
    }
    Ok(parts.join(" "))
}
