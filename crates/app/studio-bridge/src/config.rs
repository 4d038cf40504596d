use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use studio_bridge_protocol::DEFAULT_MODEL;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Model sent with `init` when the guest does not pick one.
    pub default_model: String,
    /// How long a `generate_content` call may wait for its reply. `None`
    /// waits forever.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    /// Origins allowed to perform the handshake. Empty trusts whichever
    /// origin sends the first handshake.
    pub allowed_origins: Vec<String>,
    /// Drop non-handshake messages whose origin differs from the locked one.
    pub strict_origin: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            request_timeout: Some(Duration::from_secs(120)),
            allowed_origins: Vec::new(),
            strict_origin: false,
        }
    }
}

impl BridgeConfig {
    /// Loads the config from a JSON file that may contain comments. Missing
    /// keys keep their defaults and a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No bridge config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json_lenient::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn trusts(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::load(&dir.path().join("bridge.jsonc")).unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                // only the studio itself may connect
                "allowedOrigins": ["https://host.example"],
                "requestTimeout": "30s"
            }}"#
        )
        .unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.allowed_origins, vec!["https://host.example"]);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert!(!config.strict_origin);
    }

    #[test]
    fn null_timeout_disables_it() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"requestTimeout": null}}"#).unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            BridgeConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn empty_allow_list_trusts_anyone() {
        let config = BridgeConfig::default();
        assert!(config.trusts("https://anything.example"));

        let config = BridgeConfig {
            allowed_origins: vec!["https://host.example".into()],
            ..Default::default()
        };
        assert!(config.trusts("https://host.example"));
        assert!(!config.trusts("https://evil.example"));
    }
}
