//! Runtime configuration shared by the command-line tools
use crate::{arithmetics::Ring, store::file::default_root, Result, DEGREE, MODULUS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    /// Polynomial degree d
    pub degree: usize,
    /// Prime modulus q
    pub modulus: i64,
    /// Directory holding the shared blobs
    pub store_dir: PathBuf,
    /// How often a waiting participant re-checks the barrier
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            degree: DEGREE,
            modulus: MODULUS,
            store_dir: default_root(),
            poll_interval_ms: 5,
        };
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the defaults for anything
    /// unset or unparsable
    ///
    /// Environment variables:
    /// - AVP_DEGREE: polynomial degree
    /// - AVP_MODULUS: prime modulus
    /// - AVP_STORE_DIR: directory of the shared store
    /// - AVP_POLL_INTERVAL_MS: barrier polling interval in milliseconds
    pub fn from_env() -> Self {
        let defaults = Self::default();
        return Self {
            degree: env::var("AVP_DEGREE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.degree),
            modulus: env::var("AVP_MODULUS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.modulus),
            store_dir: env::var("AVP_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_dir),
            poll_interval_ms: env::var("AVP_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
        };
    }

    /// The validated ring described by this configuration
    pub fn ring(&self) -> Result<Ring> {
        return Ring::new(self.degree, self.modulus);
    }

    pub fn poll_interval(&self) -> Duration {
        return Duration::from_millis(self.poll_interval_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ring().unwrap(), Ring::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert!(config.store_dir.ends_with("avp"));
    }

    #[test]
    fn test_invalid_ring() {
        let config = Config {
            modulus: 315520,
            ..Config::default()
        };
        assert!(config.ring().is_err());
    }
}
