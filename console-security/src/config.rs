use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::SecurityError;
use crate::session::PendingProfilePolicy;

pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

fn default_audit_capacity() -> usize {
    DEFAULT_AUDIT_CAPACITY
}

/// Access-control settings, read from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    #[serde(default)]
    pub pending_profile: PendingProfilePolicy,
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_file: Option<PathBuf>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            pending_profile: PendingProfilePolicy::default(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            audit_file: None,
        }
    }
}

impl SecurityConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: SecurityConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), ?config, "loaded security config");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.audit_capacity == 0 {
            return Err(SecurityError::InvalidConfig(
                "audit_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SecurityConfig::from_toml_str("").unwrap();
        assert_eq!(config, SecurityConfig::default());
        assert_eq!(config.pending_profile, PendingProfilePolicy::DenyAll);
        assert_eq!(config.audit_capacity, DEFAULT_AUDIT_CAPACITY);
    }

    #[test]
    fn test_full_config() {
        let config = SecurityConfig::from_toml_str(
            r#"
pending_profile = "as_user"
audit_capacity = 50
audit_file = "/tmp/audits.json"
"#,
        )
        .unwrap();
        assert_eq!(config.pending_profile, PendingProfilePolicy::AsUser);
        assert_eq!(config.audit_capacity, 50);
        assert_eq!(config.audit_file, Some(PathBuf::from("/tmp/audits.json")));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = SecurityConfig::from_toml_str("admin_bypass = false");
        assert!(matches!(result, Err(SecurityError::Config(_))));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = SecurityConfig::from_toml_str(r#"pending_profile = "allow_all""#);
        assert!(matches!(result, Err(SecurityError::Config(_))));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = SecurityConfig::from_toml_str("audit_capacity = 0");
        assert!(matches!(result, Err(SecurityError::InvalidConfig(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "audit_capacity = 12").unwrap();
        let config = SecurityConfig::load(file.path()).unwrap();
        assert_eq!(config.audit_capacity, 12);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SecurityConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(SecurityError::Io(_))));
    }
}
