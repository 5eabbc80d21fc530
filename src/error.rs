//! Error types for the SIEVE cache.
//!
//! Only two things can go wrong in this crate:
//!
//! - [`ConfigError`]: construction was attempted with an invalid configuration
//!   (a capacity of zero). Nothing is allocated when this is returned.
//! - [`InvariantError`]: [`SieveCache::check_invariants`](crate::SieveCache::check_invariants)
//!   found the recency queue, the lookup index and the hand out of agreement.
//!
//! Looking up or removing a key that is not cached is not an error; those
//! operations return `None`.

use thiserror::Error;

/// Returned when a cache configuration is rejected.
///
/// # Example
///
/// ```
/// use sieve_rs::config::SieveCacheConfig;
/// use sieve_rs::error::ConfigError;
///
/// let err = SieveCacheConfig::new(0).unwrap_err();
/// assert_eq!(err, ConfigError::ZeroCapacity);
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The cache must be able to hold at least one entry.
    #[error("capacity must be positive")]
    ZeroCapacity,
}

/// Returned when an internal structural invariant does not hold.
///
/// Carries a human-readable description of the first violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated: {0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the description of the violated invariant.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            ConfigError::ZeroCapacity.to_string(),
            "capacity must be positive"
        );
    }

    #[test]
    fn test_invariant_error_message() {
        let err = InvariantError::new("tail.older is set");
        assert_eq!(err.message(), "tail.older is set");
        assert_eq!(err.to_string(), "invariant violated: tail.older is set");
    }
}
