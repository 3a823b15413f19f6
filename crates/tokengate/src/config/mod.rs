//! Runtime configuration
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields a usable local-development configuration. The two connection
//! URLs can be overridden from the environment, which is how deployments
//! inject credentials.
//!
//! The loaded [`Config`] is passed into constructors explicitly; there is
//! no process-wide configuration singleton.

mod types;

pub use types::{
    AdminConfig, AdmissionConfig, BucketStoreConfig, Config, LimiterConfig, PolicyDbConfig,
    RefreshConfig,
};

use crate::error::{LimiterError, Result};
use std::path::Path;

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "TOKENGATE_CONFIG";
/// Environment override for the policy database URL.
pub const DATABASE_URL_ENV: &str = "TOKENGATE_DATABASE_URL";
/// Environment override for the bucket store address.
pub const BUCKET_STORE_ENV: &str = "TOKENGATE_REDIS_URL";

impl Config {
    /// Load configuration from `path`, from the file named by
    /// `TOKENGATE_CONFIG`, or from defaults when neither is given, then
    /// apply the environment URL overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(path) => Self::from_file(Path::new(&path))?,
                Err(_) => Config::default(),
            },
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            config.policy_db.url = url;
        }
        if let Ok(address) = std::env::var(BUCKET_STORE_ENV) {
            config.bucket_store.address = address;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            LimiterError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            LimiterError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.admission.deadline(), Duration::from_millis(1000));
        assert_eq!(config.limiter.load_sample_period(), Duration::from_secs(300));
        assert!(!config.limiter.dynamic_enabled);
        assert_eq!(config.refresh.listen_address, "0.0.0.0:8081");
        assert_eq!(config.admin.listen_address, "0.0.0.0:8082");
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[admission]
listen_address = "0.0.0.0:9000"
deadline_ms = 250

[limiter]
dynamic_enabled = true
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.admission.listen_address, "0.0.0.0:9000");
        assert_eq!(config.admission.deadline(), Duration::from_millis(250));
        assert!(config.limiter.dynamic_enabled);
        // Untouched sections fall back to defaults
        assert_eq!(config.refresh.listen_address, "0.0.0.0:8081");
        assert_eq!(config.limiter.load_sample_period(), Duration::from_secs(300));
    }

    #[test]
    fn rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[admission").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, LimiterError::Configuration(_)));
    }
}
