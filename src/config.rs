//! Cache Configuration Module
//!
//! A SIEVE cache has exactly one tunable: the number of entries it may hold.
//! Capacity is a count of entries, not a byte budget, and it is fixed for the
//! lifetime of the cache.
//!
//! # Sizing Guidelines
//!
//! Each entry costs roughly the key twice (once in the lookup index, once in
//! the entry itself), the value, and ~96 bytes of bookkeeping: the `Arc`
//! header, the atomic value cell, the visited flag and the two queue links.
//!
//! ```text
//! Total Memory ≈ capacity × (2 × size_of::<K>() + size_of::<V>() + ~96 bytes)
//! ```
//!
//! # Examples
//!
//! ```
//! use sieve_rs::config::SieveCacheConfig;
//! use sieve_rs::SieveCache;
//!
//! let config = SieveCacheConfig::new(10_000).unwrap();
//! let cache: SieveCache<String, Vec<u8>> = SieveCache::init(config, None);
//! assert_eq!(cache.capacity(), 10_000);
//! ```

use crate::error::ConfigError;
use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for a [`SieveCache`](crate::SieveCache).
///
/// # Examples
///
/// ```
/// use sieve_rs::config::SieveCacheConfig;
/// use core::num::NonZeroUsize;
///
/// // Validated at runtime
/// let config = SieveCacheConfig::new(512).unwrap();
/// assert_eq!(config.capacity().get(), 512);
///
/// // Validated by the type system
/// let config = SieveCacheConfig::from_capacity(NonZeroUsize::new(512).unwrap());
/// assert_eq!(config.capacity().get(), 512);
///
/// assert!(SieveCacheConfig::new(0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SieveCacheConfig {
    capacity: NonZeroUsize,
}

impl SieveCacheConfig {
    /// Creates a configuration holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(capacity)
            .map(Self::from_capacity)
            .ok_or(ConfigError::ZeroCapacity)
    }

    /// Creates a configuration from an already-validated capacity.
    #[inline]
    pub const fn from_capacity(capacity: NonZeroUsize) -> Self {
        Self { capacity }
    }

    /// Returns the maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }
}

impl fmt::Debug for SieveCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SieveCacheConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sieve_config_creation() {
        let config = SieveCacheConfig::new(1000).unwrap();
        assert_eq!(config.capacity().get(), 1000);
    }

    #[test]
    fn test_sieve_config_rejects_zero() {
        assert_eq!(SieveCacheConfig::new(0), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_sieve_config_from_nonzero() {
        let config = SieveCacheConfig::from_capacity(NonZeroUsize::new(1).unwrap());
        assert_eq!(config.capacity().get(), 1);
        assert_eq!(config, SieveCacheConfig::new(1).unwrap());
    }
}
