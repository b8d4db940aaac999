use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::{Number, Value};

use crate::error::AnalysisError;

/// Returns a reproducible RNG.
#[must_use]
pub fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Draws from `[low, high)`, refusing empty or non-finite ranges instead of panicking.
pub fn uniform<R: Rng + ?Sized>(
    rng: &mut R,
    field: &'static str,
    low: f64,
    high: f64,
) -> Result<f64, AnalysisError> {
    if !(low.is_finite() && high.is_finite() && low < high) {
        return Err(AnalysisError::InvalidRange { field, low, high });
    }
    Ok(rng.gen_range(low..high))
}

/// Rounds half away from zero to `digits` decimals.
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    (value * factor).round() / factor
}

/// Converts a float into a JSON number.
pub fn number(field: &str, value: f64) -> Result<Value, AnalysisError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| AnalysisError::NonFinite {
            field: field.to_string(),
            value,
        })
}
