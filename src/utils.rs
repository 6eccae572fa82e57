use crate::config::COUNT_UP_DURATION_MS;
use once_cell::sync::Lazy;
use regex::Regex;

// Leading unsigned integer, the way parseInt reads "250", " 250px" or "+250"
static LEADING_INT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+?(\d+)").unwrap());

/// Parse a count-up target attribute.
///
/// Only leading decimal digits are read, so trailing units are ignored.
/// Missing, negative or non-numeric values yield `0`; values too large for
/// `u64` saturate.
///
/// # Examples
/// ```
/// use rlist_ui::utils::parse_count_target;
/// assert_eq!(parse_count_target(Some("250")), 250);
/// assert_eq!(parse_count_target(Some(" 12k")), 12);
/// assert_eq!(parse_count_target(Some("-4")), 0);
/// assert_eq!(parse_count_target(None), 0);
/// ```
pub fn parse_count_target(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    match LEADING_INT_REGEX.captures(raw) {
        Some(captures) => captures[1].parse().unwrap_or(u64::MAX),
        None => 0,
    }
}

/// Parse a 1-based slide index attribute into a 0-based dot position.
///
/// Returns `None` for missing, zero or non-numeric values.
pub fn dot_position_for_index(raw: Option<&str>) -> Option<usize> {
    let index: usize = raw?.trim().parse().ok()?;
    index.checked_sub(1)
}

/// Fraction of the count-up duration that has elapsed, clamped to `[0, 1]`.
pub fn elapsed_fraction(elapsed_ms: f64) -> f64 {
    (elapsed_ms / COUNT_UP_DURATION_MS).max(0.0).min(1.0)
}

/// Value to display `elapsed_ms` into a count-up towards `target`.
///
/// Returns `(value, finished)`. Once finished the value is exactly `target`.
pub fn count_up_frame(target: u64, elapsed_ms: f64) -> (u64, bool) {
    let fraction = elapsed_fraction(elapsed_ms);
    if fraction >= 1.0 {
        (target, true)
    } else {
        ((target as f64 * fraction).floor() as u64, false)
    }
}
