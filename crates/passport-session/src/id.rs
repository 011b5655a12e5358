//! Session identifier generation.

use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::error::{Error, Result};

/// Number of random bytes in a session identifier.
pub const SESSION_ID_BYTES: usize = 24;

/// Generate a fresh session identifier from the OS CSPRNG.
///
/// The identifier is 24 random bytes, hex-encoded to 48 characters.
pub fn generate_session_id() -> Result<String> {
    session_id_from(&mut OsRng)
}

/// Generate a session identifier from `rng`.
///
/// Any failure of the random source is an error; a short or predictable
/// identifier is never returned.
pub fn session_id_from<R: TryRngCore>(rng: &mut R) -> Result<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::IdentityGeneration(e.to_string()))?;
    Ok(hex::encode(bytes))
}
