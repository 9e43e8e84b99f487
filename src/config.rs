//! Runtime configuration.
//!
//! Defaults suit almost every agent; a YAML document or environment
//! variables can switch individual behaviors off.
//!
//! ```yaml
//! dynamic_skill_install: true
//! cache_capacities: false
//! lifecycle_hooks: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Env var toggling [`RuntimeConfig::dynamic_skill_install`].
pub const ENV_DYNAMIC_INSTALL: &str = "CAPACITIES_DYNAMIC_INSTALL";
/// Env var toggling [`RuntimeConfig::cache_capacities`].
pub const ENV_TRAIT_CACHE: &str = "CAPACITIES_TRAIT_CACHE";
/// Env var toggling [`RuntimeConfig::lifecycle_hooks`].
pub const ENV_LIFECYCLE_HOOKS: &str = "CAPACITIES_LIFECYCLE_HOOKS";

/// Behavior switches for an [`Agent`](crate::Agent) and its traits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Consult the agent's dynamic skill provider when a lookup misses.
    pub dynamic_skill_install: bool,
    /// Let traits cache capacity references between requests.
    pub cache_capacities: bool,
    /// Run `Skill::install` / `Skill::uninstall`.
    pub lifecycle_hooks: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            dynamic_skill_install: true,
            cache_capacities: true,
            lifecycle_hooks: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values returned by `lookup` for the `CAPACITIES_*` variables.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let fields: [(&str, &mut bool); 3] = [
            (ENV_DYNAMIC_INSTALL, &mut self.dynamic_skill_install),
            (ENV_TRAIT_CACHE, &mut self.cache_capacities),
            (ENV_LIFECYCLE_HOOKS, &mut self.lifecycle_hooks),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key) {
                *field = parse_flag(key, &value)?;
            }
        }
        Ok(self)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_enable_everything() {
        let config = RuntimeConfig::default();
        assert!(config.dynamic_skill_install);
        assert!(config.cache_capacities);
        assert!(config.lifecycle_hooks);
    }

    #[test]
    fn test_yaml_partial_document() {
        let config = RuntimeConfig::from_yaml_str("cache_capacities: false\n").unwrap();
        assert!(!config.cache_capacities);
        assert!(config.dynamic_skill_install);
        assert!(config.lifecycle_hooks);
    }

    #[test]
    fn test_yaml_invalid_type() {
        let err = RuntimeConfig::from_yaml_str("lifecycle_hooks: maybe\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dynamic_skill_install: false").unwrap();
        writeln!(file, "lifecycle_hooks: false").unwrap();

        let config = RuntimeConfig::from_file(file.path()).unwrap();
        assert!(!config.dynamic_skill_install);
        assert!(!config.lifecycle_hooks);
        assert!(config.cache_capacities);
    }

    #[test]
    fn test_missing_file() {
        let err = RuntimeConfig::from_file("/nonexistent/capacities.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_TRAIT_CACHE, "off"), (ENV_LIFECYCLE_HOOKS, " No ")]);
        let config = RuntimeConfig::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert!(!config.cache_capacities);
        assert!(!config.lifecycle_hooks);
        assert!(config.dynamic_skill_install);
    }

    #[test]
    fn test_env_invalid_value() {
        let err = RuntimeConfig::default()
            .with_env_overrides(|key| (key == ENV_DYNAMIC_INSTALL).then(|| "sometimes".to_string()))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, ENV_DYNAMIC_INSTALL);
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
