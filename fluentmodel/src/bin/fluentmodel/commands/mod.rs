pub mod generate;
pub mod inspect;

use anyhow::{Context, Result};
use clap::Args;
use fluentmodel_build::ModelGenerator;
use std::path::{Path, PathBuf};

use crate::context::ProjectContext;

/// Where to find mapped classes; shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory to scan for mapped classes (repeatable) [default: src/]
    #[arg(long = "scan-path", value_name = "DIR")]
    pub scan_paths: Vec<PathBuf>,

    /// Root segment of qualified names [default: crate]
    #[arg(long, value_name = "NAME")]
    pub crate_name: Option<String>,

    /// Leave a class (simple or qualified name) out of generation (repeatable)
    #[arg(long, value_name = "CLASS")]
    pub skip: Vec<String>,

    /// Report a note for every modeled class
    #[arg(long)]
    pub debug: bool,
}

impl SourceArgs {
    /// Builder with these flags applied over the project's config file.
    ///
    /// Paths given on the command line are made absolute here, before the
    /// command switches into the project root.
    pub fn generator(&self, ctx: &ProjectContext) -> Result<ModelGenerator> {
        let mut generator = ModelGenerator::new();
        if ctx.has_config() {
            generator = generator.config_file(&ctx.config_path);
        }
        for path in &self.scan_paths {
            generator = generator.scan_path(absolute(path)?);
        }
        if let Some(name) = &self.crate_name {
            generator = generator.crate_name(name);
        }
        for name in &self.skip {
            generator = generator.skip(name);
        }
        if self.debug {
            generator = generator.debug(true);
        }
        Ok(generator)
    }
}

pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("Invalid path {}", path.display()))
}
