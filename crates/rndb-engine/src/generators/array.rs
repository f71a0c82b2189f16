//! Pool-based value generators.

use rand::seq::SliceRandom;
use rand::Rng;
use rndb_core::Value;

/// Pick one value from a pool; null when the pool is empty.
pub fn generate_one_of<R: Rng + ?Sized>(rng: &mut R, values: &[Value]) -> Value {
    values.choose(rng).cloned().unwrap_or(Value::Null)
}

/// Generate an array by sampling from a pool of values.
///
/// The length is drawn from `[min_length, max_length]`; items are drawn with
/// replacement.
pub fn generate_sample_array<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[Value],
    min_length: usize,
    max_length: usize,
) -> Value {
    if pool.is_empty() || max_length == 0 {
        return Value::Array(vec![]);
    }

    let length = if min_length >= max_length {
        max_length
    } else {
        rng.gen_range(min_length..=max_length)
    };

    let items: Vec<Value> = (0..length)
        .filter_map(|_| pool.choose(rng).cloned())
        .collect();

    Value::Array(items)
}
