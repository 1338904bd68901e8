use anyhow::{Context, Result};
use fluentmodel_build::FluentConfig;
use fluentmodel_build::options::CONFIG_FILE;
use std::path::{Path, PathBuf};

/// Project context for fluentmodel operations
pub struct ProjectContext {
    /// Root directory of the project (where Cargo.toml is)
    pub project_root: PathBuf,
    /// Path to the config file, which may not exist
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: Option<FluentConfig>,
}

impl ProjectContext {
    /// Find and load project context from current directory or ancestors.
    /// An explicit `config` path must exist.
    pub fn find(config: Option<&Path>) -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        match config {
            Some(path) => Self::from_config(&current_dir.join(path)),
            None => Self::find_from(&current_dir),
        }
    }

    /// Find project context starting from the given directory
    pub fn find_from(start: &Path) -> Result<Self> {
        let project_root = Self::find_project_root(start)?;
        let config_path = project_root.join(CONFIG_FILE);
        let config = FluentConfig::load_if_present(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        Ok(Self {
            project_root,
            config_path,
            config,
        })
    }

    /// Context for an explicit config file; its directory is the project root.
    pub fn from_config(config_path: &Path) -> Result<Self> {
        let config = FluentConfig::load(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        let project_root = config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            project_root,
            config_path: config_path.to_path_buf(),
            config: Some(config),
        })
    }

    /// Find project root by looking for Cargo.toml
    fn find_project_root(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(CONFIG_FILE).exists() || current.join("Cargo.toml").exists() {
                return Ok(current);
            }

            if !current.pop() {
                anyhow::bail!(
                    "Could not find Cargo.toml in {start:?} or any parent directory. \
                     Are you in a Rust project?"
                );
            }
        }
    }

    /// Switch into the project root, so relative paths in the config file and
    /// the generator's defaults resolve against it.
    pub fn enter(&self) -> Result<()> {
        std::env::set_current_dir(&self.project_root)
            .with_context(|| format!("Failed to enter {}", self.project_root.display()))
    }

    pub fn has_config(&self) -> bool {
        self.config.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_root_from_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
        let nested = dir.path().join("src/domain");
        fs::create_dir_all(&nested).unwrap();

        let ctx = ProjectContext::find_from(&nested).unwrap();
        assert_eq!(ctx.project_root, dir.path());
        assert!(!ctx.has_config());
    }

    #[test]
    fn test_loads_config_next_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"demo\"\n").unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[generator]\noutput_dir = \"src/model\"\nskip = [\"Draft\"]\n",
        )
        .unwrap();

        let ctx = ProjectContext::find_from(dir.path()).unwrap();
        let config = ctx.config.unwrap();
        assert_eq!(config.generator.output_dir, Some(PathBuf::from("src/model")));
        assert_eq!(config.generator.skip, vec!["Draft".to_string()]);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectContext::from_config(&dir.path().join("missing.toml")).is_err());
    }
}
