//! UUID value generator.

use rand::Rng;
use rndb_core::Value;
use uuid::Uuid;

/// Generate a UUID v4 from the provided RNG rather than the OS entropy source.
pub fn generate_uuid_v4<R: Rng + ?Sized>(rng: &mut R) -> Value {
    Value::Uuid(random_uuid(rng))
}

/// Build a version 4 UUID from 16 random bytes.
pub(crate) fn random_uuid<R: Rng + ?Sized>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}
