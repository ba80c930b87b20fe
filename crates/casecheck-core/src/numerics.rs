/// Closeness tolerance for numeric expectations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericTolerance {
    pub rel_tol: f64,
    pub abs_tol: f64,
}

impl NumericTolerance {
    pub const DEFAULT_REL_TOL: f64 = 1.0e-9;
    pub const DEFAULT_ABS_TOL: f64 = 0.0;
}

impl Default for NumericTolerance {
    fn default() -> Self {
        Self {
            rel_tol: Self::DEFAULT_REL_TOL,
            abs_tol: Self::DEFAULT_ABS_TOL,
        }
    }
}

/// `true` when `lhs` and `rhs` differ by at most the relative tolerance
/// (scaled by the larger magnitude) or the absolute tolerance.
pub fn within_tolerance(lhs: f64, rhs: f64, tolerance: NumericTolerance) -> bool {
    if lhs == rhs {
        return true;
    }
    if !lhs.is_finite() || !rhs.is_finite() {
        return false;
    }

    let abs_diff = (lhs - rhs).abs();
    let scale = lhs.abs().max(rhs.abs());
    abs_diff <= (tolerance.rel_tol * scale).max(tolerance.abs_tol)
}

/// Returns the element of `sorted` nearest to `x`; on a tie the smaller one.
///
/// `sorted` must be non-empty and in ascending order.
pub fn closest(sorted: &[f64], x: f64) -> f64 {
    assert!(
        !sorted.is_empty(),
        "closest() requires at least one candidate value"
    );

    let position = sorted.partition_point(|value| *value < x);
    if position == 0 {
        return sorted[0];
    }
    if position == sorted.len() {
        return sorted[sorted.len() - 1];
    }

    let before = sorted[position - 1];
    let after = sorted[position];
    if after - x < x - before { after } else { before }
}

/// Renders a value for failure messages in shortest round-trip form.
///
/// Decimal exponents in `-4..16` print positionally with at least one
/// fractional digit (`5.0`, `0.0001`); anything else switches to scientific
/// notation with a signed, two-digit exponent (`1e+16`, `1.5e-05`).
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return scientific;
    };

    if (-4..16).contains(&exponent) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            positional + ".0"
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}
