//! Number formatting and rounding for axis labels and grid spacing.
//!
//! Axis values are shown in short SI form (`1.5k`, `250`, `3m`), and grid
//! spacing is rounded to "currency" numbers: 1, 2, 5, 10, 20, 50, ...

use strum::{AsRefStr, EnumString};

/// SI prefixes from atto to exa; index 6 is no prefix.
const SI_PREFIXES: [&str; 13] = ["a", "f", "p", "n", "u", "m", "", "k", "M", "G", "T", "P", "E"];
const SI_UNIT: usize = 6;

/// Significant digits kept by [`to_si`].
pub const SI_DIGITS: u32 = 3;

/// Rounding direction for precision rounding
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Rounding {
    Floor,
    Ceil,
    #[default]
    Round,
}

impl Rounding {
    pub fn apply(&self, n: f64) -> f64 {
        match self {
            Rounding::Floor => n.floor(),
            Rounding::Ceil => n.ceil(),
            Rounding::Round => n.round(),
        }
    }
}

/// `10^exp`, dividing for negative exponents so that results like `0.001`
/// stay exact.
fn scale(n: f64, exp: i32) -> f64 {
    if exp >= 0 {
        n * 10f64.powi(exp)
    } else {
        n / 10f64.powi(-exp)
    }
}

fn magnitude(n: f64) -> i32 {
    n.abs().log10().floor() as i32
}

/// Round `n` to `digits` significant digits.
pub fn round_to_precision(n: f64, digits: u32, rounding: Rounding) -> f64 {
    if n == 0.0 || !n.is_finite() {
        return n;
    }
    let exp = digits as i32 - magnitude(n) - 1;
    scale(rounding.apply(scale(n, exp)), -exp)
}

pub fn floor_to_precision(n: f64, digits: u32) -> f64 {
    round_to_precision(n, digits, Rounding::Floor)
}

pub fn ceil_to_precision(n: f64, digits: u32) -> f64 {
    round_to_precision(n, digits, Rounding::Ceil)
}

/// Smallest currency number (1, 2 or 5 times a power of ten) at or above `n`.
/// Zero and negative numbers are returned unchanged.
pub fn ceil_to_currency(n: f64) -> f64 {
    if n <= 0.0 || !n.is_finite() {
        return n;
    }
    let exp = magnitude(n);
    let flattened = scale(n, -exp);
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .find(|&m| m >= flattened * (1.0 - 1e-9))
        .unwrap_or(10.0);
    scale(step, exp)
}

/// Currency number closest to `n` on a log scale.
pub fn round_to_currency(n: f64) -> f64 {
    if n <= 0.0 || !n.is_finite() {
        return n;
    }
    let exp = magnitude(n);
    let flattened = scale(n, -exp).ln();
    let step = [1.0_f64, 2.0, 5.0, 10.0]
        .into_iter()
        .min_by(|a, b| (a.ln() - flattened).abs().total_cmp(&(b.ln() - flattened).abs()))
        .unwrap_or(1.0);
    scale(step, exp)
}

/// Short SI form with at most three significant digits: `1.5k`, `250`,
/// `12M`, `3m`.
pub fn to_si(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if !n.is_finite() {
        return n.to_string();
    }

    let mut index = SI_UNIT;
    let mut value = n.abs();
    while value >= 1000.0 && index < SI_PREFIXES.len() - 1 {
        value /= 1000.0;
        index += 1;
    }
    while value < 1.0 && index > 0 {
        value *= 1000.0;
        index -= 1;
    }
    value = round_to_precision(value, SI_DIGITS, Rounding::Round);
    if value >= 1000.0 && index < SI_PREFIXES.len() - 1 {
        value /= 1000.0;
        index += 1;
    }

    let decimals = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    let mut digits = format!("{:.*}", decimals, value);
    if digits.contains('.') {
        digits = digits.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, digits, SI_PREFIXES[index])
}

/// Parse a number in short SI form, like `12k` or `1.5m`.
pub fn from_si(s: &str) -> Option<f64> {
    let s = s.trim();
    let last = s.chars().last()?;
    match SI_PREFIXES.iter().position(|p| p.starts_with(last) && !p.is_empty()) {
        Some(index) => {
            let number: f64 = s[..s.len() - last.len_utf8()].trim().parse().ok()?;
            Some(scale(number, 3 * (index as i32 - SI_UNIT as i32)))
        }
        None => s.parse().ok(),
    }
}
