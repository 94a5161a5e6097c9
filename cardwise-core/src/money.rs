//! Cent/dollar conversion and note formatting.
//!
//! Amounts travel as whole cents; estimated rewards come out as dollars.

/// Whole cents to dollars.
pub fn dollars(cents: u64) -> f64 {
    cents as f64 / 100.0
}

/// Signed cents (caps, fixed credits) to dollars, floored at zero.
pub fn dollars_clamped(cents: i64) -> f64 {
    cents.max(0) as f64 / 100.0
}

/// `percent`% of `cents`, in dollars.
pub fn percent_of(cents: u64, percent: f64) -> f64 {
    dollars(cents) * percent / 100.0
}

/// Two decimals, no thousands separator: `$1234.50`.
pub fn fmt_dollars(value: f64) -> String {
    format!("${value:.2}")
}

/// Rates print without trailing zeros: `5`, `1.5`, `0.25`.
pub fn fmt_rate(rate: f64) -> String {
    let s = format!("{rate:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}
