//! TOML-based configuration system for Beacon.

use crate::error::{BeaconError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Top-level Beacon configuration, deserialized from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconConfig {
    pub beacon: BeaconSection,
    pub tenant: TenantConfig,
    #[serde(default)]
    pub sis: SisConfig,
}

/// Core Beacon instance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeaconSection {
    pub instance_name: String,
    pub data_dir: String,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "/var/lib/beacon/beacon.db".into()
}

/// The tenant this instance operates as. Every scope the process builds
/// starts from this id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: Uuid,
}

/// SIS (Student Information System) provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub provider: SisProvider,
    /// API host, e.g. `api.wonde.com`.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub token: String,
}

impl Default for SisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: SisProvider::Wonde,
            domain: String::new(),
            token: String::new(),
        }
    }
}

/// Supported SIS providers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SisProvider {
    #[default]
    Wonde,
}

impl BeaconConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| BeaconError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Validate the configuration, returning an error for invalid combinations.
    pub fn validate(&self) -> Result<()> {
        if self.beacon.instance_name.is_empty() {
            return Err(BeaconError::Config(
                "beacon.instance_name must not be empty".into(),
            ));
        }

        if self.beacon.data_dir.is_empty() {
            return Err(BeaconError::Config(
                "beacon.data_dir must not be empty".into(),
            ));
        }

        if self.beacon.database.path.is_empty() {
            return Err(BeaconError::Config(
                "beacon.database.path must not be empty".into(),
            ));
        }

        if self.tenant.tenant_id.is_nil() {
            return Err(BeaconError::Config(
                "tenant.tenant_id must be a non-nil UUID".into(),
            ));
        }

        if self.sis.enabled {
            if self.sis.domain.is_empty() {
                return Err(BeaconError::Config(
                    "sis.domain is required when SIS is enabled".into(),
                ));
            }
            if self.sis.token.is_empty() {
                return Err(BeaconError::Config(
                    "sis.token is required when SIS is enabled".into(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a sensible default configuration.
    pub fn generate_default() -> Self {
        Self {
            beacon: BeaconSection {
                instance_name: "My Trust".into(),
                data_dir: "/var/lib/beacon".into(),
                database: DatabaseConfig::default(),
            },
            tenant: TenantConfig {
                tenant_id: Uuid::new_v4(),
            },
            sis: SisConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TOML: &str = r#"
[beacon]
instance_name = "Oakbridge Trust"
data_dir = "/var/lib/beacon"

[beacon.database]
path = "/var/lib/beacon/beacon.db"

[tenant]
tenant_id = "5f9c2b7e-1d7b-4b2e-9f5a-0c3a9f6d8e21"

[sis]
enabled = true
provider = "wonde"
domain = "api.wonde.com"
token = "abc123"
"#;

    fn parse_sample() -> BeaconConfig {
        toml::from_str(SAMPLE_TOML).expect("sample TOML should parse")
    }

    #[test]
    fn parse_full_config() {
        let cfg = parse_sample();
        assert_eq!(cfg.beacon.instance_name, "Oakbridge Trust");
        assert_eq!(cfg.beacon.database.path, "/var/lib/beacon/beacon.db");
        assert!(!cfg.tenant.tenant_id.is_nil());
        assert!(cfg.sis.enabled);
        assert_eq!(cfg.sis.provider, SisProvider::Wonde);
        assert_eq!(cfg.sis.domain, "api.wonde.com");
    }

    #[test]
    fn minimal_config_parses() {
        let minimal = r#"
[beacon]
instance_name = "Test"
data_dir = "/tmp/beacon"

[tenant]
tenant_id = "5f9c2b7e-1d7b-4b2e-9f5a-0c3a9f6d8e21"
"#;
        let cfg: BeaconConfig = toml::from_str(minimal).expect("minimal config should parse");
        assert!(!cfg.sis.enabled);
        assert_eq!(cfg.beacon.database.path, "/var/lib/beacon/beacon.db");
    }

    #[test]
    fn roundtrip_serialization() {
        let cfg = parse_sample();
        let serialized = toml::to_string(&cfg).expect("should serialize");
        let deserialized: BeaconConfig =
            toml::from_str(&serialized).expect("should deserialize roundtrip");
        assert_eq!(deserialized.beacon.instance_name, cfg.beacon.instance_name);
        assert_eq!(deserialized.tenant.tenant_id, cfg.tenant.tenant_id);
    }

    #[test]
    fn generate_default_is_valid() {
        let cfg = BeaconConfig::generate_default();
        cfg.validate().expect("default config should be valid");
    }

    #[test]
    fn validate_requires_instance_name() {
        let mut cfg = BeaconConfig::generate_default();
        cfg.beacon.instance_name = String::new();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("instance_name"));
    }

    #[test]
    fn validate_requires_non_nil_tenant() {
        let mut cfg = BeaconConfig::generate_default();
        cfg.tenant.tenant_id = Uuid::nil();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("tenant_id"));
    }

    #[test]
    fn validate_sis_requires_domain_and_token_when_enabled() {
        let mut cfg = BeaconConfig::generate_default();
        cfg.sis.enabled = true;
        cfg.sis.domain = String::new();
        cfg.sis.token = "abc".into();
        assert!(cfg.validate().unwrap_err().to_string().contains("domain"));

        cfg.sis.domain = "api.wonde.com".into();
        cfg.sis.token = String::new();
        assert!(cfg.validate().unwrap_err().to_string().contains("token"));
    }

    #[test]
    fn validate_sis_disabled_skips_provider_fields() {
        let mut cfg = BeaconConfig::generate_default();
        cfg.sis.enabled = false;
        cfg.sis.domain = String::new();
        cfg.validate()
            .expect("disabled SIS should not require domain");
    }

    #[test]
    fn load_nonexistent_file_returns_io_error() {
        let result = BeaconConfig::load(Path::new("/nonexistent/beacon.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_invalid_toml_returns_config_error() {
        let dir = std::env::temp_dir().join("beacon_test_bad_toml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "this is [[[not valid toml").unwrap();

        let result = BeaconConfig::load(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("config"));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("beacon_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("beacon.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let cfg = BeaconConfig::load(&path).expect("should load from file");
        assert_eq!(cfg.beacon.instance_name, "Oakbridge Trust");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
