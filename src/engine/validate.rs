//! Input validation shared by the calculators and the request readers.

use super::ValidationError;
use crate::model::{Calculation, MAX_CUSTOMERS};

/// Parse user-entered text as an amount, ignoring surrounding whitespace and
/// `,` thousands separators.
pub fn parse_amount(field: &'static str, input: &str) -> Result<f64, ValidationError> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    let value = cleaned
        .parse::<f64>()
        .map_err(|_| ValidationError::NotNumeric { field })?;
    require_numeric(field, value)
}

/// Non-finite values (`NaN`, infinities) do not count as numbers.
pub fn require_numeric(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotNumeric { field })
    }
}

pub fn require_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    let value = require_numeric(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

/// Finite inputs can still overflow to infinity in a formula; such a
/// result is rejected rather than recorded.
pub fn require_representable<T: Calculation>(fields: T) -> Result<T, ValidationError> {
    if fields.figures().iter().all(|figure| figure.is_finite()) {
        Ok(fields)
    } else {
        Err(ValidationError::OutOfRange {
            category: T::CATEGORY,
        })
    }
}

/// Keep the usable customer slots, numbered from 1 by slot position.
/// Empty, non-numeric and non-positive slots are skipped.
pub fn positive_customers(slots: &[Option<f64>; MAX_CUSTOMERS]) -> Vec<(u8, f64)> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(idx, slot)| {
            let amount = slot.filter(|amount| amount.is_finite() && *amount > 0.0)?;
            Some((idx as u8 + 1, amount))
        })
        .collect()
}
