/// Format a non-negative count with thousands separators, truncating any
/// fractional part.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_count;
///
/// assert_eq!(format_count(1234.0), "1,234");
/// assert_eq!(format_count(245_000_000.0), "245,000,000");
/// assert_eq!(format_count(999.9), "999");
/// ```
pub fn format_count(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }
    group_thousands(&format!("{:.0}", value.trunc()))
}

/// Suffixes used by [`format_compact`], largest first. They are the same
/// suffixes the ingestion coercer accepts.
const COMPACT_UNITS: [(f64, &str); 3] = [(1e9, "B"), (1e6, "M"), (1e3, "K")];

/// Format a count in the shorthand used by the source data: one decimal
/// place, trailing `.0` dropped, with a `K`, `M` or `B` suffix.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_compact;
///
/// assert_eq!(format_compact(2_300_000.0), "2.3M");
/// assert_eq!(format_compact(120_000.0), "120K");
/// assert_eq!(format_compact(999.0), "999");
/// ```
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "0".to_string();
    }

    for (idx, (scale, suffix)) in COMPACT_UNITS.iter().enumerate() {
        if value < *scale {
            continue;
        }
        let scaled = format!("{:.1}", value / scale);
        // 999_950 rounds to "1000.0K"; promote to the next unit up.
        if idx > 0 && scaled.parse::<f64>().map_or(false, |v| v >= 1000.0) {
            let (up_scale, up_suffix) = COMPACT_UNITS[idx - 1];
            return format!("{}{}", trim_zero(format!("{:.1}", value / up_scale)), up_suffix);
        }
        return format!("{}{}", trim_zero(scaled), suffix);
    }

    format!("{:.0}", value.trunc())
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    ((part / whole) * 100.0 * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn trim_zero(s: String) -> String {
    match s.strip_suffix(".0") {
        Some(stripped) => stripped.to_string(),
        None => s,
    }
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
