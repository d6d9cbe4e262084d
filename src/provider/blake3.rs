// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! BLAKE3-backed hash provider
//!
//! The strong hash is keyed BLAKE3 over a salt-derived key, rendered as hex.
//! The fast hash folds the first four digest bytes into a decimal `u32`.

use async_trait::async_trait;

use super::HashProvider;
use crate::errors::DigestResult;

/// Context string for deriving the strong-hash key from a salt
const KEY_CONTEXT: &str = "signer 2025-01-01 strong-hash key";

/// Default salt when none is configured
pub const DEFAULT_SALT: &str = "signer";

/// BLAKE3 hash provider
pub struct Blake3Provider {
    key: [u8; 32],
}

impl Blake3Provider {
    /// Create a provider whose strong hash is keyed by `salt`
    pub fn new(salt: &str) -> Self {
        Self {
            key: ::blake3::derive_key(KEY_CONTEXT, salt.as_bytes()),
        }
    }

    fn strong(&self, input: &str) -> String {
        ::blake3::keyed_hash(&self.key, input.as_bytes())
            .to_hex()
            .to_string()
    }

    fn fast(input: &str) -> String {
        let digest = ::blake3::hash(input.as_bytes());
        let bytes = digest.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]).to_string()
    }
}

impl Default for Blake3Provider {
    fn default() -> Self {
        Self::new(DEFAULT_SALT)
    }
}

#[async_trait]
impl HashProvider for Blake3Provider {
    fn name(&self) -> &str {
        "blake3"
    }

    async fn strong_hash(&self, input: &str) -> DigestResult<String> {
        Ok(self.strong(input))
    }

    async fn fast_hash(&self, input: &str) -> DigestResult<String> {
        Ok(Self::fast(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_strong_hash_is_keyed() {
        let a = Blake3Provider::new("alpha");
        let b = Blake3Provider::new("beta");

        let a1 = a.strong_hash("hello").await.unwrap();
        let a2 = a.strong_hash("hello").await.unwrap();
        let b1 = b.strong_hash("hello").await.unwrap();

        assert_eq!(a1, a2);
        assert_ne!(a1, b1);
        assert_eq!(a1.len(), 64);
        assert!(a1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_fast_hash_is_decimal_checksum() {
        let provider = Blake3Provider::default();

        let h1 = provider.fast_hash("hello").await.unwrap();
        let h2 = provider.fast_hash("hello").await.unwrap();
        let h3 = provider.fast_hash("world").await.unwrap();

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert!(h1.parse::<u32>().is_ok());
    }

    #[tokio::test]
    async fn test_fast_hash_ignores_salt() {
        let a = Blake3Provider::new("alpha");
        let b = Blake3Provider::new("beta");

        assert_eq!(
            a.fast_hash("data").await.unwrap(),
            b.fast_hash("data").await.unwrap()
        );
    }
}
