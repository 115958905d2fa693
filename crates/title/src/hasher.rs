//! String to 64-bit key hashing.
//!
//! > **WARNING:** any change here that alters the output for an existing input
//! > requires every table in the index to be rebuilt.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

/// Deterministic string hasher producing signed 64-bit keys.
///
/// The input is first brought into Unicode canonical composition (NFC) so that
/// precomposed and decomposed spellings of the same text share a key. The key
/// is the first 8 bytes of the SHA-256 digest of the NFC text, read as a
/// big-endian `i64`.
///
/// Previous deployments produced keys by parsing the first 16 hex digits of
/// the digest as two 32-bit words and combining them with `hi << 32 | lo`.
/// Reading the bytes as a big-endian `i64` is bit-for-bit the same value, so
/// existing data remains valid.
///
/// ```
/// use crosswiki_title::StringHasher;
///
/// let hasher = StringHasher::new();
/// assert_eq!(hasher.hash("Foo"), 2071311921841431698);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct StringHasher;

impl StringHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a string into a signed 64-bit key.
    pub fn hash(&self, input: impl AsRef<str>) -> i64 {
        let input = input.as_ref();
        let composed: Cow<'_, str> = if unicode_normalization::is_nfc(input) {
            Cow::Borrowed(input)
        } else {
            Cow::Owned(input.nfc().collect())
        };
        let digest = Sha256::digest(composed.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(head)
    }

    /// Hash raw bytes that are expected to be UTF-8 text.
    ///
    /// Bytes that are not valid UTF-8 are rejected with
    /// [`ErrorKind::InvalidInput`] rather than lossily converted: two
    /// different byte strings must never be coerced into one key.
    pub fn hash_bytes(&self, input: &[u8]) -> Result<i64> {
        let input = std::str::from_utf8(input).or_raise(|| ErrorKind::InvalidInput("not UTF-8"))?;
        Ok(self.hash(input))
    }
}
