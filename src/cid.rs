//! Correlation ids threaded through one logical request.

use base64::Engine as _;
use rand::RngCore;
use std::{fmt, sync::Arc};

/// Opaque correlation id. Cheap to clone; every accessor takes one for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cid(Arc<str>);

impl Cid {
    /// 96 random bits => 16 chars base64url (no padding).
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        rand::rng().fill_bytes(&mut bytes);
        Cid(Arc::from(
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cid {
    fn from(value: &str) -> Self {
        Cid(Arc::from(value))
    }
}

impl From<String> for Cid {
    fn from(value: String) -> Self {
        Cid(Arc::from(value))
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_short_and_distinct() {
        let a = Cid::generate();
        let b = Cid::generate();
        assert_eq!(a.as_str().len(), 16);
        assert_ne!(a, b);
    }
}
