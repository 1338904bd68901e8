//! Batch orchestration: scan, build, emit, write.

use anyhow::Context;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::builder::{BuildOutput, build_models};
use crate::diagnostic::{Diagnostic, Severity};
use crate::emitter::{EmitScope, GeneratedUnit, INDEX_FILE, emit_index, emit_unit};
use crate::error::GenerateError;
use crate::model::ModelSet;
use crate::names::QualifiedName;
use crate::options::{CONFIG_FILE, FluentConfig, Options};
use crate::output::{FsOutput, SourceOutput, WriteOutcome};
use crate::scanner::{ClassKind, ScanOutput, SourceScanner};

const DEFAULT_SCAN_PATH: &str = "src/";
const DEFAULT_OUTPUT_DIR: &str = "src/generated";
const DEFAULT_CRATE_NAME: &str = "crate";

/// One generation pass over a set of scanned classes.
///
/// The model memo lives inside the batch and is dropped with its result.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    options: Options,
}

impl Batch {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn run(&self, scan: ScanOutput) -> Result<BatchResult, GenerateError> {
        let BuildOutput {
            models,
            failed,
            diagnostics: build_diagnostics,
        } = build_models(&scan.classes);

        let mut diagnostics = scan.diagnostics;
        diagnostics.extend(build_diagnostics);

        let mut roots = BTreeSet::new();
        for model in models.iter().filter(|model| model.kind == ClassKind::Entity) {
            let name = &model.qualified_name;
            if model.skip || self.options.skips(name) {
                if self.options.debug {
                    diagnostics.push(Diagnostic::note(name, None, "skipped, no accessor generated"));
                }
                continue;
            }
            if !failed.contains(name) {
                roots.insert(name.clone());
            }
        }

        if self.options.debug {
            for model in models.iter() {
                let inherited = model
                    .attributes
                    .iter()
                    .filter(|attribute| attribute.declared_in != model.qualified_name)
                    .count();
                diagnostics.push(Diagnostic::note(
                    &model.qualified_name,
                    None,
                    format!(
                        "{} with {} attributes ({inherited} inherited)",
                        model.kind,
                        model.attributes.len()
                    ),
                ));
            }
        }

        let scope = EmitScope::new(&models, &roots);
        let mut units = Vec::with_capacity(roots.len());
        for root in &roots {
            let Some(model) = models.get(root) else { continue };
            let emission = emit_unit(&scope, model)?;
            debug!("emitted {} for {}", emission.unit.file_name, root);
            diagnostics.extend(emission.diagnostics);
            units.push(emission.unit);
        }
        let index = emit_index(&units);

        info!(
            "batch: {} classes, {} accessors, {} failed",
            models.len(),
            units.len(),
            failed.len()
        );

        Ok(BatchResult {
            models,
            failed,
            units,
            index,
            diagnostics,
        })
    }
}

/// Everything one batch produced, before it is written anywhere.
#[derive(Debug)]
pub struct BatchResult {
    pub models: ModelSet,
    pub failed: BTreeSet<QualifiedName>,
    pub units: Vec<GeneratedUnit>,
    /// Contents of `mod.rs`.
    pub index: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl BatchResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Hand every unit and the index to `output`, then let it prune.
    pub fn write(&self, output: &mut dyn SourceOutput) -> Result<Report, GenerateError> {
        let mut written = BTreeSet::new();
        let mut files = Vec::with_capacity(self.units.len() + 1);

        for unit in &self.units {
            let outcome = output.write_unit(&unit.file_name, &unit.contents)?;
            written.insert(unit.file_name.clone());
            files.push(FileReport {
                file_name: unit.file_name.clone(),
                entity: Some(unit.entity.clone()),
                outcome,
            });
        }

        let outcome = output.write_unit(INDEX_FILE, &self.index)?;
        written.insert(INDEX_FILE.to_string());
        files.push(FileReport {
            file_name: INDEX_FILE.to_string(),
            entity: None,
            outcome,
        });

        let removed = output.finish(&written)?;

        Ok(Report {
            files,
            removed,
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// What happened to one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    /// `None` for the index module.
    pub entity: Option<QualifiedName>,
    pub outcome: WriteOutcome,
}

/// Summary of a written batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub files: Vec<FileReport>,
    /// Stale generated files removed (or, when checking, that would be).
    pub removed: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    /// Files whose content differs from what was on disk.
    pub fn changed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome == WriteOutcome::Written).count()
    }

    /// True when writing would change nothing.
    pub fn is_up_to_date(&self) -> bool {
        self.changed() == 0 && self.removed.is_empty()
    }
}

/// Effective settings after merging builder calls, config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub scan_paths: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub crate_name: String,
    pub options: Options,
}

/// Builder for configuring and running the generator.
#[derive(Debug, Clone, Default)]
pub struct ModelGenerator {
    scan_paths: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    crate_name: Option<String>,
    skip: Vec<String>,
    debug: Option<bool>,
    config_file: Option<PathBuf>,
}

impl ModelGenerator {
    /// Create a new generator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to scan for mapped classes.
    ///
    /// Can be called multiple times. Default: `src/`
    pub fn scan_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scan_paths.push(path.into());
        self
    }

    /// Directory receiving one module per entity plus `mod.rs`.
    ///
    /// Default: `src/generated`
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Root segment of qualified names.
    ///
    /// Default: `crate`
    pub fn crate_name(mut self, name: impl Into<String>) -> Self {
        self.crate_name = Some(name.into());
        self
    }

    /// Leave a class (simple or qualified name) out of generation.
    pub fn skip(mut self, name: impl Into<String>) -> Self {
        self.skip.push(name.into());
        self
    }

    /// Report note diagnostics for every modeled class.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Read settings from this file instead of `./fluentmodel.toml`. Unlike
    /// the default file, an explicit one must exist.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn settings(&self) -> Result<Settings, GenerateError> {
        let config = match &self.config_file {
            Some(path) => FluentConfig::load(path)?,
            None => FluentConfig::load_if_present(Path::new(CONFIG_FILE))?.unwrap_or_default(),
        }
        .generator;

        let scan_paths = if !self.scan_paths.is_empty() {
            self.scan_paths.clone()
        } else if !config.scan_paths.is_empty() {
            config.scan_paths
        } else {
            vec![PathBuf::from(DEFAULT_SCAN_PATH)]
        };

        let mut skip: BTreeSet<String> = config.skip.into_iter().collect();
        skip.extend(self.skip.iter().cloned());

        let options = Options {
            skip,
            debug: self.debug.unwrap_or(config.debug),
        }
        .with_env();

        Ok(Settings {
            scan_paths,
            output_dir: self
                .output_dir
                .clone()
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            crate_name: self
                .crate_name
                .clone()
                .or(config.crate_name)
                .unwrap_or_else(|| DEFAULT_CRATE_NAME.to_string()),
            options,
        })
    }

    /// Scan and build without writing anything.
    pub fn inspect(&self) -> Result<BatchResult, GenerateError> {
        let settings = self.settings()?;
        Self::run_batch(&settings)
    }

    /// Generate into the configured output directory.
    pub fn generate(&self) -> Result<Report, GenerateError> {
        let settings = self.settings()?;
        let result = Self::run_batch(&settings)?;
        result.write(&mut FsOutput::new(&settings.output_dir))
    }

    /// Compare against the output directory without touching it.
    pub fn check(&self) -> Result<Report, GenerateError> {
        let settings = self.settings()?;
        let result = Self::run_batch(&settings)?;
        result.write(&mut FsOutput::new(&settings.output_dir).check_only())
    }

    /// Generate into any output.
    pub fn generate_into(&self, output: &mut dyn SourceOutput) -> Result<Report, GenerateError> {
        let settings = self.settings()?;
        Self::run_batch(&settings)?.write(output)
    }

    fn run_batch(settings: &Settings) -> Result<BatchResult, GenerateError> {
        let scanner = SourceScanner::new(settings.crate_name.clone()).exclude(&settings.output_dir);
        let scan = scanner.scan_paths(&settings.scan_paths)?;
        Batch::new(settings.options.clone()).run(scan)
    }

    /// Run from a build script.
    ///
    /// Diagnostics are printed as `cargo:warning=` lines. Fails when any
    /// error was reported, after writing the accessors that could be built.
    pub fn run(self) -> anyhow::Result<Report> {
        let settings = self.settings().context("failed to load fluentmodel settings")?;
        let report = Self::run_batch(&settings)
            .and_then(|result| result.write(&mut FsOutput::new(&settings.output_dir)))
            .with_context(|| format!("failed to generate into {}", settings.output_dir.display()))?;

        for diagnostic in &report.diagnostics {
            println!("cargo:warning={diagnostic}");
        }
        for path in &settings.scan_paths {
            println!("cargo:rerun-if-changed={}", path.display());
        }
        println!("cargo:rerun-if-env-changed={}", crate::options::DEBUG_ENV);

        if report.changed() > 0 || !report.removed.is_empty() {
            eprintln!(
                "fluentmodel-build: generated {} accessors in {}",
                report.files.len().saturating_sub(1),
                settings.output_dir.display()
            );
        }

        let errors = report.count(Severity::Error);
        if errors > 0 {
            anyhow::bail!("fluentmodel-build: {errors} mapped classes could not be modeled");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryOutput;
    use crate::scanner::{ClassDecl, Marker, MemberDecl, TypeRef};

    fn entity(name: &str) -> ClassDecl {
        ClassDecl::new(name, ClassKind::Entity).member(MemberDecl::new("id", TypeRef::named("i64")).marked(Marker::Id))
    }

    fn scan(classes: Vec<ClassDecl>) -> ScanOutput {
        ScanOutput {
            classes,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_batch_excludes_failed_and_skipped() {
        let classes = vec![
            entity("crate::Book"),
            entity("crate::Draft"),
            ClassDecl::new("crate::Broken", ClassKind::Entity),
            ClassDecl::new("crate::Address", ClassKind::Embeddable),
        ];
        let options = Options {
            skip: BTreeSet::from(["Draft".to_string()]),
            debug: false,
        };
        let result = Batch::new(options).run(scan(classes)).unwrap();

        let files: Vec<&str> = result.units.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(files, ["book_model.rs"]);
        assert!(result.has_errors());
        assert_eq!(result.models.len(), 4);
    }

    #[test]
    fn test_debug_adds_notes() {
        let options = Options {
            debug: true,
            ..Options::default()
        };
        let result = Batch::new(options).run(scan(vec![entity("crate::Book")])).unwrap();
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, Severity::Note);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_write_reports_outcomes() {
        let result = Batch::default().run(scan(vec![entity("crate::Book")])).unwrap();
        let mut output = MemoryOutput::new();

        let first = result.write(&mut output).unwrap();
        assert_eq!(first.changed(), 2);
        assert!(output.get("mod.rs").unwrap().contains("pub mod book_model;"));

        let second = result.write(&mut output).unwrap();
        assert!(second.is_up_to_date());
    }

    #[test]
    fn test_settings_merge_builder_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("custom.toml");
        std::fs::write(
            &config,
            "[generator]\nscan_paths = [\"domain\"]\noutput_dir = \"out\"\nskip = [\"Draft\"]\n",
        )
        .unwrap();

        let settings = ModelGenerator::new()
            .config_file(&config)
            .output_dir("elsewhere")
            .skip("Archive")
            .settings()
            .unwrap();

        assert_eq!(settings.scan_paths, vec![PathBuf::from("domain")]);
        assert_eq!(settings.output_dir, PathBuf::from("elsewhere"));
        assert_eq!(settings.crate_name, "crate");
        assert_eq!(
            settings.options.skip,
            BTreeSet::from(["Archive".to_string(), "Draft".to_string()])
        );
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelGenerator::new()
            .config_file(dir.path().join("missing.toml"))
            .settings()
            .unwrap_err();
        assert!(matches!(err, GenerateError::Read { .. }));
    }
}
