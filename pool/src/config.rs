//! Pool configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use mutual_types::PoolParams;

use crate::logging::LogFormat;
use crate::PoolError;

/// Configuration for a pool instance.
///
/// Can be loaded from a TOML file via [`PoolConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Directory of the LMDB database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pool parameters: unlock curve, burn scope, voting windows.
    #[serde(default)]
    pub params: PoolParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./mutual_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl PoolConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PoolError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PoolError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, PoolError> {
        let config: Self = toml::from_str(s).map_err(|e| PoolError::Config(e.to_string()))?;
        config.params.validate()?;
        config.log_format()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, PoolError> {
        toml::to_string_pretty(self).map_err(|e| PoolError::Config(e.to_string()))
    }

    pub fn log_format(&self) -> Result<LogFormat, PoolError> {
        self.log_format.parse()
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1 << 20)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            params: PoolParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mutual_types::{BurnScope, DAY_SECS};

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = PoolConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = PoolConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = PoolConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, "human");
        assert_eq!(config.params, PoolParams::default());
        assert_eq!(config.params.unlock_curve.bonding_period_secs(), 250 * DAY_SECS);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_level = "debug"

            [params]
            burn_scope = "full_principal"
            ca_min_lock = 500

            [[params.unlock_curve.points]]
            age_secs = 0
            vested_bps = 0

            [[params.unlock_curve.points]]
            age_secs = 8640000
            vested_bps = 10000
        "#;
        let config = PoolConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.params.burn_scope, BurnScope::FullPrincipal);
        assert_eq!(config.params.ca_min_lock, 500);
        assert_eq!(config.params.unlock_curve.bonding_period_secs(), 100 * DAY_SECS);
        assert_eq!(config.params.ca_voting_secs, PoolParams::default().ca_voting_secs);
    }

    #[test]
    fn invalid_curve_is_rejected_at_load() {
        let toml = r#"
            [[params.unlock_curve.points]]
            age_secs = 0
            vested_bps = 0

            [[params.unlock_curve.points]]
            age_secs = 100
            vested_bps = 5000
        "#;
        assert!(matches!(PoolConfig::from_toml_str(toml), Err(PoolError::Types(_))));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(matches!(
            PoolConfig::from_toml_str("log_format = \"xml\""),
            Err(PoolError::Config(_))
        ));
    }
}
