//! Display formatting for statistic values.
//!
//! Every function here is total: absent, NaN or infinite inputs degrade to a
//! zero-like string instead of failing.

/// Scale thresholds for abbreviated output, smallest first
const MAGNITUDES: [(f64, &str); 5] = [
    (1.0, ""),
    (1_000.0, "k"),
    (1_000_000.0, "m"),
    (1_000_000_000.0, "b"),
    (1_000_000_000_000.0, "t"),
];

/// Format a daily delta as `+1,234`. Absent or non-positive values render `+0`.
pub fn pretty_print_stat(stat: Option<f64>) -> String {
    match stat {
        Some(v) if v.is_finite() && v > 0.0 => format!("+{}", group_digits(v.round() as u64)),
        _ => "+0".to_string(),
    }
}

/// Abbreviate a count to one decimal with a magnitude suffix (`1.2m`)
pub fn magnitude_format(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "0".to_string();
    };

    let abs = v.abs();
    let mut idx = MAGNITUDES
        .iter()
        .rposition(|(scale, _)| abs >= *scale)
        .unwrap_or(0);

    let mut rounded = round_tenth(abs / MAGNITUDES[idx].0);
    // 999_950 rounds to 1000.0k, promote to 1.0m
    if rounded >= 1000.0 && idx + 1 < MAGNITUDES.len() {
        idx += 1;
        rounded = round_tenth(abs / MAGNITUDES[idx].0);
    }

    let sign = if v < 0.0 && rounded > 0.0 { "-" } else { "" };
    format!("{sign}{rounded:.1}{}", MAGNITUDES[idx].1)
}

/// Insert `,` thousands separators
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[inline(always)]
fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
