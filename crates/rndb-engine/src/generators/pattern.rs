//! Pattern-based string generator.
//!
//! Supports placeholders:
//! - `{id}` - record identifier
//! - `{category}` - the record's category for this column, empty if none
//! - `{uuid}` - UUID drawn from the seeded generator
//! - `{rand:N}` - random N-digit number

use super::uuid::random_uuid;
use rand::Rng;
use rndb_core::Value;

/// Generate a string based on a pattern with placeholders.
pub fn generate_pattern<R: Rng + ?Sized>(
    pattern: &str,
    rng: &mut R,
    id: u64,
    category: Option<&Value>,
) -> Value {
    let mut result = pattern.replace("{id}", &id.to_string());

    let category = category.map(Value::to_string).unwrap_or_default();
    result = result.replace("{category}", &category);

    while result.contains("{uuid}") {
        result = result.replacen("{uuid}", &random_uuid(rng).to_string(), 1);
    }

    // Replace {rand:N} patterns; scanning resumes after each replacement so a
    // malformed placeholder is left as-is.
    let mut cursor = 0;
    while let Some(offset) = result[cursor..].find("{rand:") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}').map(|end| start + end) else {
            break;
        };
        match result[start + 6..end].parse::<usize>() {
            Ok(digits) => {
                let random_num = generate_random_digits(rng, digits);
                result = format!("{}{}{}", &result[..start], random_num, &result[end + 1..]);
                cursor = start + random_num.len();
            }
            Err(_) => cursor = end + 1,
        }
    }

    Value::String(result)
}

/// Generate a random number with exactly N digits.
fn generate_random_digits<R: Rng + ?Sized>(rng: &mut R, digits: usize) -> String {
    if digits == 0 {
        return String::new();
    }

    let mut result = String::with_capacity(digits);

    // First digit should be 1-9 to avoid leading zeros
    result.push(char::from(b'0' + rng.gen_range(1..10u8)));

    for _ in 1..digits {
        result.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }

    result
}
