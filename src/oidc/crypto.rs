//! Crypto primitives (C1): CSPRNG availability, random bytes/strings, and
//! the PKCE verifier/challenge pair.
//!
//! Grounded on `phylum-dev-cli`'s `auth/oidc.rs` `CodeVerifier::generate`,
//! generalized to the exact alphabet and length-selection rule in the
//! original `pkg/oidc/crypto.go`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{thread_rng, Rng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::{OidcError, Result};
use crate::model::CodeVerifier;

/// The unreserved character set RFC 7636 permits for a PKCE code verifier.
const PKCE_ALPHABET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._~";

const MAX_RANDOM_RANGE: i64 = i32::MAX as i64;

/// Confirms the OS entropy source can yield at least one byte.
pub fn assert_prng() -> Result<()> {
    let mut buf = [0u8; 1];
    thread_rng().try_fill_bytes(&mut buf).map_err(|_| OidcError::CryptoUnavailable)
}

pub fn random_bytes(n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    thread_rng().try_fill_bytes(&mut buf).map_err(|_| OidcError::CryptoUnavailable)?;
    Ok(buf)
}

pub fn random_url_safe(n: usize) -> Result<String> {
    let bytes = random_bytes(n)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Uniform over `[min, max)`. Rejects ranges that would require sampling
/// past `i32::MAX`, matching the original's `GetRandomNumberBetween` guard.
pub fn random_int_in_range(min: i64, max: i64) -> Result<i64> {
    if max >= MAX_RANDOM_RANGE {
        return Err(OidcError::Config(format!("range max {max} exceeds i32::MAX")));
    }
    if min >= max {
        return Err(OidcError::Config(format!("invalid range [{min}, {max})")));
    }
    Ok(thread_rng().gen_range(min..max))
}

fn generate_pkce_string(length: usize) -> Result<String> {
    let mut out = String::with_capacity(length);
    for _ in 0..length {
        let idx = random_int_in_range(0, PKCE_ALPHABET.len() as i64)? as usize;
        out.push(PKCE_ALPHABET[idx] as char);
    }
    Ok(out)
}

pub fn base64_sha256(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generates a verifier of uniformly random length in `[43, 128)` and its
/// S256 challenge.
pub fn pkce_verifier() -> Result<CodeVerifier> {
    let length = random_int_in_range(43, 128)? as usize;
    let verifier = generate_pkce_string(length)?;
    let challenge = base64_sha256(&verifier);
    Ok(CodeVerifier { verifier, challenge })
}
