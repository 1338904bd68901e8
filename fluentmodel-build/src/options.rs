//! Processing options and the optional `fluentmodel.toml` file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GenerateError;
use crate::names::QualifiedName;

/// Environment variable that turns on `debug`.
pub const DEBUG_ENV: &str = "FLUENTMODEL_DEBUG";

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE: &str = "fluentmodel.toml";

/// The only processing options: which classes to leave out of generation,
/// and whether to report extra notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Simple or qualified class names.
    pub skip: BTreeSet<String>,
    pub debug: bool,
}

impl Options {
    pub fn skips(&self, name: &QualifiedName) -> bool {
        self.skip.contains(name.as_str()) || self.skip.contains(name.simple_name())
    }

    /// Apply `FLUENTMODEL_DEBUG`.
    pub fn with_env(mut self) -> Self {
        if debug_from_env() {
            self.debug = true;
        }
        self
    }
}

fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV).is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes" | "on"))
}

/// Contents of `fluentmodel.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluentConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
}

/// The `[generator]` table. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub scan_paths: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub crate_name: Option<String>,
    pub skip: Vec<String>,
    pub debug: bool,
}

impl FluentConfig {
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = fs::read_to_string(path).map_err(|source| GenerateError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load `path` if it exists.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>, GenerateError> {
        if path.exists() { Self::load(path).map(Some) } else { Ok(None) }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, GenerateError> {
        toml::from_str(text).map_err(|source| GenerateError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_matches_simple_and_qualified_names() {
        let options = Options {
            skip: BTreeSet::from(["Draft".to_string(), "crate::shop::Item".to_string()]),
            debug: false,
        };
        assert!(options.skips(&"crate::library::Draft".into()));
        assert!(options.skips(&"crate::shop::Item".into()));
        assert!(!options.skips(&"crate::warehouse::Item".into()));
    }

    #[test]
    fn test_parse_config() {
        let config = FluentConfig::parse(
            r#"
            [generator]
            scan_paths = ["src/domain"]
            output_dir = "src/metamodel"
            skip = ["Draft"]
            debug = true
            "#,
            Path::new(CONFIG_FILE),
        )
        .unwrap();

        assert_eq!(config.generator.scan_paths, vec![PathBuf::from("src/domain")]);
        assert_eq!(config.generator.output_dir, Some(PathBuf::from("src/metamodel")));
        assert_eq!(config.generator.crate_name, None);
        assert_eq!(config.generator.skip, vec!["Draft".to_string()]);
        assert!(config.generator.debug);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = FluentConfig::parse("", Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config, FluentConfig::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let err = FluentConfig::parse("[generator]\ndebug = \"maybe\"", Path::new(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, GenerateError::Config { .. }));
    }

    #[test]
    fn test_missing_config_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(FluentConfig::load_if_present(&dir.path().join(CONFIG_FILE)).unwrap(), None);
    }
}
