//! Cryptographically secure token generation and one-way hashing.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Minimum entropy for a token secret in bytes
pub const MIN_TOKEN_BYTES: usize = 32;

/// Shortest well-formed secret: 32 bytes base64url-encoded without padding
pub const MIN_TOKEN_LENGTH: usize = 43;

/// Longest secret accepted before any lookup happens
pub const MAX_TOKEN_LENGTH: usize = 128;

/// Generator for single-use token secrets.
///
/// Secrets are raw OS-CSPRNG bytes encoded with the URL-safe base64 alphabet
/// so they can ride in a link path unescaped. Only the SHA-256 hex digest is
/// ever handed to the store. Pure computation, no side effects.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    byte_length: usize,
}

impl TokenGenerator {
    /// Create a generator producing secrets of `byte_length` bytes of
    /// entropy. Lengths below [`MIN_TOKEN_BYTES`] are raised to the minimum.
    pub fn new(byte_length: usize) -> Self {
        Self {
            byte_length: byte_length.max(MIN_TOKEN_BYTES),
        }
    }

    /// Entropy of generated secrets in bytes
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Generate a fresh secret token
    pub fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.byte_length];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// SHA-256 hex digest of a secret. Deterministic: equal inputs always
    /// hash identically, which is what makes lookup-by-hash work.
    pub fn hash(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Timing-safe check of a secret against a stored hash
    pub fn verify_hash(secret: &str, expected_hash: &str) -> bool {
        let computed = Self::hash(secret);
        constant_time_eq(computed.as_bytes(), expected_hash.as_bytes())
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(MIN_TOKEN_BYTES)
    }
}

/// Syntactic check of an untrusted secret before any store lookup: length
/// bounds plus the URL-safe base64 alphabet. Malformed input never reaches
/// the persistence layer.
pub fn is_valid_token_format(token: &str) -> bool {
    (MIN_TOKEN_LENGTH..=MAX_TOKEN_LENGTH).contains(&token.len())
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_secret_length_and_alphabet() {
        let generator = TokenGenerator::default();
        let secret = generator.generate();
        assert_eq!(secret.len(), MIN_TOKEN_LENGTH);
        assert!(is_valid_token_format(&secret));
    }

    #[test]
    fn test_byte_length_floor() {
        let generator = TokenGenerator::new(8);
        assert_eq!(generator.byte_length(), MIN_TOKEN_BYTES);
        assert!(is_valid_token_format(&generator.generate()));
    }

    #[test]
    fn test_generated_secrets_are_unique() {
        let generator = TokenGenerator::default();
        let secrets: HashSet<String> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(secrets.len(), 100);
    }

    #[test]
    fn test_hash_is_deterministic_hex_sha256() {
        let a = TokenGenerator::hash("secret-value");
        let b = TokenGenerator::hash("secret-value");
        let c = TokenGenerator::hash("other-value");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_does_not_contain_secret() {
        let secret = TokenGenerator::default().generate();
        let hash = TokenGenerator::hash(&secret);
        assert!(!hash.contains(&secret));
    }

    #[test]
    fn test_verify_hash() {
        let secret = TokenGenerator::default().generate();
        let hash = TokenGenerator::hash(&secret);
        assert!(TokenGenerator::verify_hash(&secret, &hash));
        assert!(!TokenGenerator::verify_hash("wrong", &hash));
    }

    #[test]
    fn test_token_format_validation() {
        assert!(is_valid_token_format(&"A".repeat(MIN_TOKEN_LENGTH)));
        assert!(is_valid_token_format(&"a1-_".repeat(11)));

        // too short, too long, bad characters
        assert!(!is_valid_token_format(&"A".repeat(MIN_TOKEN_LENGTH - 1)));
        assert!(!is_valid_token_format(&"A".repeat(MAX_TOKEN_LENGTH + 1)));
        assert!(!is_valid_token_format(&format!("{}+", "A".repeat(MIN_TOKEN_LENGTH - 1))));
        assert!(!is_valid_token_format(&format!("{}=", "A".repeat(MIN_TOKEN_LENGTH - 1))));
        assert!(!is_valid_token_format(""));
    }
}
