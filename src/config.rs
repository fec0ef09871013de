//! Transaction pool configuration.

use std::path::Path;

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

/// Configuration for the transaction pool and its periodic jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Milliseconds between gossip broadcast rounds; recorded for the
    /// broadcast layer, the pool itself never ticks on it
    pub broadcast_interval_ms: u64,
    /// Maximum transactions released to the broadcast layer per round
    pub release_limit: usize,
    /// Maximum size of the union of the unverified, pending and ready
    /// partitions
    pub pool_storage_txs_limit: usize,
    /// Milliseconds between processing ticks (unverified drain and
    /// pending promotion)
    pub pool_process_interval_ms: u64,
    /// Milliseconds between expiry ticks; the invalid-cache reset runs at
    /// ten times this interval
    pub pool_expiry_interval_ms: u64,
    /// Seconds an unsigned, non-multisignature transaction may stay in the
    /// pool before expiring; co-signed transactions get eight times this
    pub unconfirmed_transaction_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 5_000,
            release_limit: 25,
            pool_storage_txs_limit: 50_000,
            pool_process_interval_ms: 30_000,
            pool_expiry_interval_ms: 300_000,
            unconfirmed_transaction_timeout_secs: 10_800,
        }
    }
}

impl PoolConfig {
    /// Load configuration from a file path.
    ///
    /// Supports TOML with a `[pool]` table. Environment variables with the
    /// `TXPOOL_` prefix and `__` separator override file values, e.g.
    /// `TXPOOL_POOL__RELEASE_LIMIT=50`.
    ///
    /// # Example config (TOML)
    /// ```toml
    /// [pool]
    /// broadcast_interval_ms = 5000
    /// release_limit = 25
    /// pool_storage_txs_limit = 50000
    /// pool_process_interval_ms = 30000
    /// pool_expiry_interval_ms = 300000
    /// unconfirmed_transaction_timeout_secs = 10800
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut figment = Figment::new();

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            figment = match ext {
                "toml" => figment.merge(Toml::file(path)),
                _ => {
                    return Err(anyhow::anyhow!(
                        "Unsupported config file format: {}. Use .toml",
                        ext
                    ));
                }
            };
        } else {
            return Err(anyhow::anyhow!("Config file must have an extension (.toml)"));
        }

        figment = figment.merge(Env::prefixed("TXPOOL_").split("__"));

        let config: PoolConfig = figment.extract_inner("pool").map_err(anyhow::Error::msg)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_default_values() {
        let config = PoolConfig::default();
        assert_eq!(config.broadcast_interval_ms, 5_000);
        assert_eq!(config.release_limit, 25);
        assert_eq!(config.pool_storage_txs_limit, 50_000);
        assert_eq!(config.pool_process_interval_ms, 30_000);
        assert_eq!(config.pool_expiry_interval_ms, 300_000);
        assert_eq!(config.unconfirmed_transaction_timeout_secs, 10_800);
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = PoolConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PoolConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.pool_storage_txs_limit, parsed.pool_storage_txs_limit);
        assert_eq!(
            config.pool_process_interval_ms,
            parsed.pool_process_interval_ms
        );
        assert_eq!(config.release_limit, parsed.release_limit);
    }

    #[test]
    fn from_path_reads_pool_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[pool]\n\
             broadcast_interval_ms = 1000\n\
             release_limit = 10\n\
             pool_storage_txs_limit = 100\n\
             pool_process_interval_ms = 50\n\
             pool_expiry_interval_ms = 500\n\
             unconfirmed_transaction_timeout_secs = 60"
        )
        .unwrap();

        let config = PoolConfig::from_path(&path).unwrap();
        assert_eq!(config.pool_storage_txs_limit, 100);
        assert_eq!(config.pool_process_interval_ms, 50);
        assert_eq!(config.unconfirmed_transaction_timeout_secs, 60);
    }

    #[test]
    fn from_path_unsupported_extension() {
        let result = PoolConfig::from_path("config.json");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unsupported"));
    }

    #[test]
    fn from_path_no_extension() {
        let result = PoolConfig::from_path("config");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("extension"));
    }
}
