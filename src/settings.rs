//! Resolver settings.
//!
//! Settings come from three layers, lowest priority first:
//! 1. **Defaults** - `node_modules` as the dependency directory, root not enforced
//! 2. **File** - a YAML file passed with `--settings`
//! 3. **Environment** - `NEAREST_CONFIG_DEPENDENCY_DIR`, `NEAREST_CONFIG_ENFORCE_ROOT`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Env var overriding [`LocatorSettings::dependency_dir`].
pub const ENV_DEPENDENCY_DIR: &str = "NEAREST_CONFIG_DEPENDENCY_DIR";
/// Env var overriding [`LocatorSettings::enforce_root`].
pub const ENV_ENFORCE_ROOT: &str = "NEAREST_CONFIG_ENFORCE_ROOT";

/// Traversal settings for the config locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSettings {
    /// Directory name that holds third-party dependencies. The upward search
    /// stops when it reaches a directory with this name.
    #[serde(default = "default_dependency_dir")]
    pub dependency_dir: String,

    /// Stop the upward search at the caller-supplied root directory.
    #[serde(default)]
    pub enforce_root: bool,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            dependency_dir: default_dependency_dir(),
            enforce_root: false,
        }
    }
}

fn default_dependency_dir() -> String {
    "node_modules".to_string()
}

impl LocatorSettings {
    /// Load settings from a YAML file. Empty files yield the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Option<LocatorSettings> = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(settings.unwrap_or_default())
    }

    /// Defaults, then the optional file, then environment overrides.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(ENV_DEPENDENCY_DIR).ok(),
            std::env::var(ENV_ENFORCE_ROOT).ok(),
        )
    }

    fn apply_overrides(
        &mut self,
        dependency_dir: Option<String>,
        enforce_root: Option<String>,
    ) -> Result<()> {
        if let Some(dir) = dependency_dir
            && !dir.is_empty()
        {
            self.dependency_dir = dir;
        }

        if let Some(flag) = enforce_root {
            self.enforce_root = parse_flag(&flag)
                .with_context(|| format!("{ENV_ENFORCE_ROOT} must be a boolean, got {flag:?}"))?;
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = LocatorSettings::default();
        assert_eq!(settings.dependency_dir, "node_modules");
        assert!(!settings.enforce_root);
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, "enforce_root: true\n").unwrap();

        let settings = LocatorSettings::load(&path).unwrap();
        assert!(settings.enforce_root);
        assert_eq!(settings.dependency_dir, "node_modules");
    }

    #[test]
    fn test_load_empty_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.yaml");
        std::fs::write(&path, "# nothing here\n").unwrap();

        assert_eq!(LocatorSettings::load(&path).unwrap(), LocatorSettings::default());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(LocatorSettings::load(temp.path().join("nope.yaml")).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut settings = LocatorSettings::default();
        settings
            .apply_overrides(Some("vendor".into()), Some("yes".into()))
            .unwrap();
        assert_eq!(settings.dependency_dir, "vendor");
        assert!(settings.enforce_root);

        settings.apply_overrides(Some(String::new()), Some("off".into())).unwrap();
        assert_eq!(settings.dependency_dir, "vendor");
        assert!(!settings.enforce_root);

        assert!(settings.apply_overrides(None, Some("maybe".into())).is_err());
    }
}
