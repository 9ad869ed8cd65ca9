//! Input guards shared by all calculators, plus the zero-safe ratio helpers.

use crate::{TaxError, TaxResult};

/// Value must be finite and strictly greater than zero.
pub fn ensure_positive(field: &'static str, value: f64) -> TaxResult<f64> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(TaxError::invalid(field, format!("must be greater than 0, got {value}")));
    }
    Ok(value)
}

/// Value must be finite and not negative.
pub fn ensure_non_negative(field: &'static str, value: f64) -> TaxResult<f64> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(TaxError::invalid(field, format!("must not be negative, got {value}")));
    }
    Ok(value)
}

/// Percentage in the closed range 0..=100.
pub fn ensure_percent(field: &'static str, value: f64) -> TaxResult<f64> {
    ensure_range(field, value, 0.0, 100.0)
}

pub fn ensure_range(field: &'static str, value: f64, min: f64, max: f64) -> TaxResult<f64> {
    ensure_finite(field, value)?;
    if value < min || value > max {
        return Err(TaxError::invalid(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(value)
}

pub fn ensure_finite(field: &'static str, value: f64) -> TaxResult<f64> {
    if !value.is_finite() {
        return Err(TaxError::invalid(field, "must be a finite number"));
    }
    Ok(value)
}

/// `numerator / denominator`, or 0 when the division is degenerate.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// `numerator / denominator * 100`, or 0 when the division is degenerate.
pub fn percent_of(numerator: f64, denominator: f64) -> f64 {
    safe_ratio(numerator, denominator) * 100.0
}
