//! Signup configuration loaded from environment variables.

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Shortest verification code `SignupFlow` will issue.
pub const MIN_CODE_LENGTH: usize = 4;
/// Longest verification code `SignupFlow` will issue.
pub const MAX_CODE_LENGTH: usize = 10;

/// Pending-signup store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Lifetime of a pending registration
    #[serde(default = "default_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// How often the background sweep runs
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub sweep_interval: Duration,
}

/// Signup flow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupConfig {
    /// Lifetime of an issued verification code
    #[serde(default = "default_code_ttl", with = "humantime_serde")]
    pub code_ttl: Duration,

    /// Number of digits in a verification code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            code_ttl: default_code_ttl(),
            code_length: default_code_length(),
            store: StoreConfig::default(),
        }
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_code_ttl() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_code_length() -> usize {
    6
}

impl SignupConfig {
    /// Load configuration from `SIGNUP__*` environment variables.
    ///
    /// e.g. `SIGNUP__CODE_TTL=10m`, `SIGNUP__STORE__TTL=1h`.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SIGNUP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would disable verification or spin the sweeper.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length),
            "code_length must be between {} and {}, got {}",
            MIN_CODE_LENGTH,
            MAX_CODE_LENGTH,
            self.code_length
        );
        ensure!(!self.code_ttl.is_zero(), "code_ttl must be greater than zero");
        ensure!(!self.store.ttl.is_zero(), "store.ttl must be greater than zero");
        ensure!(
            !self.store.sweep_interval.is_zero(),
            "store.sweep_interval must be greater than zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_source() {
        let config: SignupConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.code_ttl, Duration::from_secs(300));
        assert_eq!(config.code_length, 6);
        assert_eq!(config.store.ttl, Duration::from_secs(1800));
        assert_eq!(config.store.sweep_interval, Duration::from_secs(900));
    }

    #[test]
    fn test_humantime_overrides() {
        let config: SignupConfig = config::Config::builder()
            .set_override("code_ttl", "90s")
            .unwrap()
            .set_override("store.ttl", "1h")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.code_ttl, Duration::from_secs(90));
        assert_eq!(config.store.ttl, Duration::from_secs(3600));
        assert_eq!(config.store.sweep_interval, Duration::from_secs(900));
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(SignupConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_code_length_out_of_range() {
        for code_length in [0, 3, 11] {
            let config = SignupConfig {
                code_length,
                ..SignupConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("code_length"));
        }

        for code_length in [MIN_CODE_LENGTH, MAX_CODE_LENGTH] {
            let config = SignupConfig {
                code_length,
                ..SignupConfig::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_zero_sweep_interval() {
        let config: SignupConfig = config::Config::builder()
            .set_override("store.sweep_interval", "0s")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sweep_interval"));
    }
}
