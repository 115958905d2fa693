//! Title primitives shared by every part of the index.
//!
//! Everything stored in the index is keyed by hashes rather than strings, so
//! the two pure functions in this crate are load-bearing for on-disk data:
//! - [`StringHasher`] maps a string to a signed 64-bit key.
//! - [`StringNormalizer`] maps a raw title to its cosmetic equivalence class.
//!
//! Changing the output of either for an existing input invalidates stored keys.

pub mod error;
mod hasher;
pub mod namespace;
mod normalizer;
mod target;

pub use crate::hasher::StringHasher;
pub use crate::namespace::Namespace;
pub use crate::normalizer::StringNormalizer;
pub use crate::target::LinkTarget;
