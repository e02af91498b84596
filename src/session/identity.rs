//! Client identity derivation.
//!
//! The cache key for session resources. Derived deterministically from the
//! resolved credential so the same credential always maps to the same
//! session, while the credential itself never appears in logs or cache
//! keys.

use sha2::{Digest, Sha256};

/// Fixed identity for sessions without any credential.
pub const ANONYMOUS_IDENTITY: &str = "anonymous";

/// Opaque, deterministic session cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Derive an identity from an optional resolved credential.
    ///
    /// A present credential hashes to a stable hex digest; an absent one
    /// maps to the single [`ANONYMOUS_IDENTITY`].
    #[must_use]
    pub fn derive(credential: Option<&str>) -> Self {
        match credential {
            Some(value) if !value.is_empty() => {
                let mut hasher = Sha256::new();
                hasher.update(value.as_bytes());
                Self(format!("{:x}", hasher.finalize()))
            }
            _ => Self(ANONYMOUS_IDENTITY.to_owned()),
        }
    }

    /// The identity string (a hex digest or the anonymous sentinel).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
