// ABOUTME: Secret string wrapper that never prints its contents.
// ABOUTME: Backed by secrecy::SecretString so memory is zeroed on drop.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// A decrypted credential held in memory.
///
/// `Debug` prints `[REDACTED]`; the value is only reachable through
/// [`Secret::expose`].
pub struct Secret {
    inner: SecretString,
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: SecretString::from(value.into()),
        }
    }

    /// Expose the secret value for use.
    ///
    /// The returned reference must not be logged or persisted in clear.
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn len(&self) -> usize {
        self.expose().len()
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Secret {}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::new("hunter22");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter22");
    }

    #[test]
    fn clone_preserves_value() {
        let secret = Secret::new("s3cret");
        assert_eq!(secret.clone(), secret);
    }
}
