//! Numeric value generators.

use rand::Rng;
use rndb_core::Value;

/// Generate a random integer in the given range (inclusive).
///
/// A reversed range yields `min`.
pub fn generate_int_range<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> Value {
    if min >= max {
        return Value::Int(min);
    }
    Value::Int(rng.gen_range(min..=max))
}

/// Generate a random float in the given range (inclusive).
///
/// A reversed range yields `min`; a range without a finite width yields null.
pub fn generate_float_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> Value {
    if !(max - min).is_finite() {
        return Value::Null;
    }
    if min >= max {
        return Value::Float(min);
    }
    Value::Float(rng.gen_range(min..=max))
}

/// Generate a random float in the given range, rounded to `scale` decimal places.
pub fn generate_decimal_range<R: Rng + ?Sized>(
    rng: &mut R,
    min: f64,
    max: f64,
    scale: u32,
) -> Value {
    let Value::Float(value) = generate_float_range(rng, min, max) else {
        return Value::Null;
    };
    let factor = 10f64.powi(scale as i32);
    Value::Float((value * factor).round() / factor)
}

/// Bernoulli trial: `true` with probability `true_weight`, clamped to `[0, 1]`.
pub fn generate_weighted_bool<R: Rng + ?Sized>(rng: &mut R, true_weight: f64) -> Value {
    let p = if true_weight.is_nan() {
        0.0
    } else {
        true_weight.clamp(0.0, 1.0)
    };
    Value::Bool(rng.gen_bool(p))
}
