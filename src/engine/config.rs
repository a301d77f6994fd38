//! Engine configuration
//!
//! Loadable from a JSON file; every field has a default so partial files work.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{RlvError, RlvResult};

/// Configuration for an [`RlvEngine`](super::RlvEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlvConfig {
    /// Initial value of the engine's enabled flag
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Name of the shared restriction folder
    #[serde(default = "default_shared_folder")]
    pub shared_folder: String,

    /// Folders starting with this prefix are left out of listings and searches
    #[serde(default = "default_hidden_prefix")]
    pub hidden_prefix: String,

    /// Stale-rule sweep period in seconds
    #[serde(default = "default_gc_interval_secs")]
    pub gc_interval_secs: u64,

    /// Bound on a group-role lookup in milliseconds
    #[serde(default = "default_role_lookup_timeout_ms")]
    pub role_lookup_timeout_ms: u64,

    /// `@version` reply
    #[serde(default = "default_version_label")]
    pub version_label: String,

    /// `@versionnew` reply
    #[serde(default = "default_version_new_label")]
    pub version_new_label: String,

    /// `@versionnum` reply
    #[serde(default = "default_version_num")]
    pub version_num: String,
}

fn default_enabled() -> bool {
    true
}

fn default_shared_folder() -> String {
    "#RLV".to_string()
}

fn default_hidden_prefix() -> String {
    ".".to_string()
}

fn default_gc_interval_secs() -> u64 {
    300
}

fn default_role_lookup_timeout_ms() -> u64 {
    5000
}

fn default_version_label() -> String {
    "RestrainedLife viewer v1.23".to_string()
}

fn default_version_new_label() -> String {
    "RestrainedLove viewer v1.23".to_string()
}

fn default_version_num() -> String {
    "1230100".to_string()
}

impl Default for RlvConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            shared_folder: default_shared_folder(),
            hidden_prefix: default_hidden_prefix(),
            gc_interval_secs: default_gc_interval_secs(),
            role_lookup_timeout_ms: default_role_lookup_timeout_ms(),
            version_label: default_version_label(),
            version_new_label: default_version_new_label(),
            version_num: default_version_num(),
        }
    }
}

impl RlvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> RlvResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::info!("[RlvConfig] Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> RlvResult<()> {
        if self.gc_interval_secs == 0 {
            return Err(RlvError::InvalidConfig(
                "gc_interval_secs must be positive".into(),
            ));
        }
        if self.role_lookup_timeout_ms == 0 {
            return Err(RlvError::InvalidConfig(
                "role_lookup_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_shared_folder(mut self, name: impl Into<String>) -> Self {
        self.shared_folder = name.into();
        self
    }

    pub fn with_hidden_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.hidden_prefix = prefix.into();
        self
    }

    pub fn with_gc_interval(mut self, secs: u64) -> Self {
        self.gc_interval_secs = secs;
        self
    }

    pub fn with_role_lookup_timeout(mut self, timeout_ms: u64) -> Self {
        self.role_lookup_timeout_ms = timeout_ms;
        self
    }

    /// Sweep period as Duration
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    /// Role lookup bound as Duration
    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.role_lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RlvConfig::default();
        assert!(config.enabled);
        assert_eq!(config.shared_folder, "#RLV");
        assert_eq!(config.gc_interval(), Duration::from_secs(300));
        assert_eq!(config.role_lookup_timeout(), Duration::from_millis(5000));
        assert_eq!(config.version_num, "1230100");
    }

    #[test]
    fn test_builder() {
        let config = RlvConfig::new()
            .with_enabled(false)
            .with_hidden_prefix("~")
            .with_role_lookup_timeout(50);
        assert!(!config.enabled);
        assert_eq!(config.hidden_prefix, "~");
        assert_eq!(config.role_lookup_timeout_ms, 50);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"{{"shared_folder": "#Restraints", "gc_interval_secs": 60}}"##).unwrap();

        let config = RlvConfig::from_file(file.path()).unwrap();
        assert_eq!(config.shared_folder, "#Restraints");
        assert_eq!(config.gc_interval_secs, 60);
        assert_eq!(config.hidden_prefix, ".");
        assert!(config.enabled);
    }

    #[test]
    fn test_from_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            RlvConfig::from_file(file.path()),
            Err(RlvError::Serialization(_))
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"gc_interval_secs": 0}}"#).unwrap();
        assert!(matches!(
            RlvConfig::from_file(file.path()),
            Err(RlvError::InvalidConfig(_))
        ));

        assert!(matches!(
            RlvConfig::from_file("/nonexistent/rlv.json"),
            Err(RlvError::Io(_))
        ));
    }
}
