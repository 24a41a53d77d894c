/*!
 * Shared timestamp arithmetic.
 *
 * Every ordering, overlap and boundary decision in the crate goes through the
 * comparisons in this module so that they all agree on one tolerance. Stored
 * values are never snapped; the tolerance only affects comparisons.
 */

/// Two timestamps closer than this are treated as the same instant
pub const TIME_EPSILON: f64 = 1e-9;

/// Intervals shorter than this are folded into a neighbour before saving
pub const MIN_INTERVAL_LENGTH: f64 = 1e-8;

/// Whether `a` and `b` denote the same instant
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// `a` is strictly before `b`, beyond the tolerance
pub fn approx_lt(a: f64, b: f64) -> bool {
    a < b - TIME_EPSILON
}

/// `a` is before or at `b`
pub fn approx_le(a: f64, b: f64) -> bool {
    a <= b + TIME_EPSILON
}

/// `a` is strictly after `b`, beyond the tolerance
pub fn approx_gt(a: f64, b: f64) -> bool {
    approx_lt(b, a)
}

/// `a` is after or at `b`
pub fn approx_ge(a: f64, b: f64) -> bool {
    approx_le(b, a)
}

/// Whether `value` lies in `[min, max]`, tolerant at both edges
pub fn within(value: f64, min: f64, max: f64) -> bool {
    approx_ge(value, min) && approx_le(value, max)
}

/// Length of the overlap of two spans, zero when they only touch or are disjoint
pub fn overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if approx_gt(end, start) {
        end - start
    } else {
        0.0
    }
}

/// Whether two spans share more than a single instant
pub fn overlaps(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    overlap(a_start, a_end, b_start, b_end) > 0.0
}

/// Formats a number the way the Praat text dialects write it.
///
/// Integral values print without a fractional part (`0`, `2`), everything else
/// in the shortest form that parses back to the same value (`0.3`). Very small
/// or very large magnitudes switch to exponent notation (`1e-05`, `1e+20`).
pub fn format_number(value: f64) -> String {
    let truncated = value.trunc();
    let tolerance = 1e-14 * value.abs().max(truncated.abs());
    if value.is_finite() && (value - truncated).abs() <= tolerance && truncated.abs() < 1e15 {
        return format!("{}", truncated as i64);
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{}", value);
    };
    match exponent.parse::<i32>() {
        Ok(exponent) if !(-4..16).contains(&exponent) => {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
        }
        _ => format!("{}", value),
    }
}
