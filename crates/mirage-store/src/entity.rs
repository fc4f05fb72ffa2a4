//! Entity identifiers.
//!
//! An [`EntityId`] is an opaque 128-bit handle derived from one or more
//! integer keys. Records with composite keys (a realm and a resource kind, a
//! hex column and row) hash the whole key tuple so that every table in the
//! store is addressed the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// An opaque entity identifier.
///
/// Derived from a key tuple via [`EntityId::from_keys`]; the same tuple always
/// produces the same id, and distinct tuples collide with negligible
/// probability (blake3, truncated to 128 bits).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u128);

impl EntityId {
    /// Derive an id from a tuple of integer keys.
    ///
    /// Keys are hashed in order, so `from_keys(&[a, b])` and
    /// `from_keys(&[b, a])` are distinct ids.
    pub fn from_keys(keys: &[u128]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for key in keys {
            hasher.update(&key.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest.as_bytes()[..16]);
        Self(u128::from_le_bytes(bytes))
    }

    /// Derive an id from a single key.
    #[inline]
    pub fn from_key(key: u128) -> Self {
        Self::from_keys(&[key])
    }

    /// Raw `u128` representation.
    #[inline]
    pub fn to_raw(self) -> u128 {
        self.0
    }

    /// Reconstruct from a raw `u128`.
    #[inline]
    pub fn from_raw(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({:#010x})", self.0 as u32)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
