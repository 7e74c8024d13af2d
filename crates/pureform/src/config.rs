//! Configuration system for pureform.
//!
//! Loads config from:
//! 1. Global: ~/.config/pureform/config.toml (or `$XDG_CONFIG_HOME`)
//! 2. Per-project: .pureform/config.toml (overrides global, key by key)
//!
//! Example config.toml:
//! ```toml
//! [classify]
//! extraction = "syntax"
//!
//! [runtime]
//! max_call_depth = 128
//!
//! [log]
//! filter = "pureform=debug"
//! ```

use crate::classify::ExtractionMode;
use pureform_script::RealmOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Classifier settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    pub extraction: ExtractionMode,
}

/// Script host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Nested calls allowed before a `RangeError`.
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_call_depth: RealmOptions::default().max_call_depth,
        }
    }
}

impl RuntimeConfig {
    pub fn realm_options(&self) -> RealmOptions {
        RealmOptions {
            max_call_depth: self.max_call_depth,
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PureformConfig {
    pub classify: ClassifyConfig,
    pub runtime: RuntimeConfig,
    pub log: LogConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl PureformConfig {
    /// Load configuration for a project, logging and skipping files that
    /// cannot be used.
    pub fn load(root: &Path) -> Self {
        let (config, errors) = Self::load_with_errors(root);
        for err in &errors {
            tracing::warn!("{}", err);
        }
        config
    }

    /// Like [`load`](Self::load) but hands back the skipped files' errors,
    /// for callers that set up logging after reading the config.
    pub fn load_with_errors(root: &Path) -> (Self, Vec<ConfigError>) {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(root),
        )
    }

    /// The global config path.
    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("pureform").join("config.toml"))
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(".pureform").join("config.toml")
    }

    /// Load a single config file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_table(path, read_table(path)?)
    }

    fn from_table(path: &Path, table: toml::Table) -> Result<Self, ConfigError> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })
    }

    fn load_layers(global: Option<&Path>, project: &Path) -> (Self, Vec<ConfigError>) {
        let mut merged = toml::Table::new();
        let mut errors = Vec::new();

        for path in global.into_iter().chain([project]) {
            if !path.exists() {
                continue;
            }
            // Validate each layer on its own so one bad file does not poison
            // the other.
            let layer = read_table(path)
                .and_then(|table| Self::from_table(path, table.clone()).map(|_| table));
            match layer {
                Ok(table) => merge_tables(&mut merged, table),
                Err(err) => errors.push(err),
            }
        }

        match toml::Value::Table(merged).try_into() {
            Ok(config) => (config, errors),
            Err(source) => {
                errors.push(ConfigError::Toml {
                    path: project.to_path_buf(),
                    source,
                });
                (Self::default(), errors)
            }
        }
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlay `other` onto `base`. Nested tables merge; any other value replaces.
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = PureformConfig::default();
        assert_eq!(config.classify.extraction, ExtractionMode::Pattern);
        assert_eq!(config.runtime.max_call_depth, 64);
        assert_eq!(config.log.filter, "warn");
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        let project = PureformConfig::project_config_path(dir.path());
        write(
            &project,
            r#"
[classify]
extraction = "syntax"
"#,
        );

        let (config, errors) = PureformConfig::load_layers(None, &project);
        assert!(errors.is_empty());
        assert_eq!(config.classify.extraction, ExtractionMode::Syntax);
        assert_eq!(config.runtime.max_call_depth, 64); // default
    }

    #[test]
    fn test_project_overrides_global_per_key() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global").join("config.toml");
        let project = dir.path().join("project").join("config.toml");
        write(
            &global,
            r#"
[runtime]
max_call_depth = 48

[log]
filter = "debug"
"#,
        );
        write(
            &project,
            r#"
[log]
filter = "info"
"#,
        );

        let (config, errors) = PureformConfig::load_layers(Some(&global), &project);
        assert!(errors.is_empty());
        assert_eq!(config.runtime.max_call_depth, 48);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_invalid_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        write(&global, "[runtime]\nmax_call_depth = 32\n");
        write(&project, "[classify]\nextraction = \"guess\"\n");

        let (config, errors) = PureformConfig::load_layers(Some(&global), &project);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ConfigError::Toml { .. }));
        assert_eq!(config.runtime.max_call_depth, 32);
        assert_eq!(config.classify.extraction, ExtractionMode::Pattern);
    }

    #[test]
    fn test_load_file_reports_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            PureformConfig::load_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.toml");
        write(&broken, "[classify");
        assert!(matches!(
            PureformConfig::load_file(&broken),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn test_realm_options() {
        let config = RuntimeConfig { max_call_depth: 10 };
        assert_eq!(config.realm_options().max_call_depth, 10);
    }
}
