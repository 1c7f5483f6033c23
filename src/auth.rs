//! Credential hashing.
//!
//! PBKDF2-HMAC-SHA256 with a fresh random salt per derivation and an
//! iteration count high enough to make offline guessing expensive.
//! Verification recomputes the digest and compares in constant time.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};

const ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 32;
const HASH_LEN: usize = 32;

/// Derives and verifies salted password digests.
pub struct PasswordDigest;

impl PasswordDigest {
    /// Derive a digest and fresh salt for `password`, as `(hash, salt)`.
    ///
    /// Two calls with the same password produce different hashes because
    /// the salt is random per call. Both outputs must be stored with the
    /// user record; verification needs the original salt.
    pub fn derive(password: &str) -> Result<(Vec<u8>, Vec<u8>)> {
        if password.is_empty() {
            return Err(Error::InvalidInput("password required".into()));
        }

        let mut salt = vec![0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut hash = vec![0u8; HASH_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, ROUNDS, &mut hash);

        Ok((hash, salt))
    }

    /// Check `password` against a stored digest and salt.
    ///
    /// The comparison takes the same time regardless of where the first
    /// differing byte occurs, so a mismatch position cannot be inferred
    /// from timing.
    pub fn verify(password: &str, hash: &[u8], salt: &[u8]) -> Result<bool> {
        if password.is_empty() || hash.is_empty() || salt.is_empty() {
            return Err(Error::InvalidInput(
                "password, hash, and salt required".into(),
            ));
        }

        let mut computed = vec![0u8; HASH_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ROUNDS, &mut computed);

        Ok(computed.ct_eq(hash).into())
    }
}
