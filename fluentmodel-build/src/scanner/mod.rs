//! Structural scanning of mapped classes.
//!
//! This module provides functionality to:
//! - Discover Rust files under the configured scan paths
//! - Parse struct definitions deriving `Entity`, `MappedSuperclass` or `Embeddable`
//! - Record members, markers, supertypes and the file's imports as [`ClassDecl`]s

mod decl;
mod discovery;
mod parser;
mod types;

use log::{debug, trace};
use std::fs;
use std::path::{Path, PathBuf};

pub use decl::{ClassDecl, ClassKind, Import, Marker, MemberDecl};
pub use discovery::{SourceFile, compute_module_path, discover_sources};
pub use parser::parse_source;
pub use types::{ContainerShape, Plural, TypeRef, absolutize_path};

use crate::diagnostic::Diagnostic;
use crate::error::GenerateError;

/// Derive names that make a file worth parsing.
const DERIVE_NAMES: &[&str] = &["Entity", "MappedSuperclass", "Embeddable"];

/// Classes found in one or more sources, in scan order, plus warnings.
#[derive(Debug, Default, Clone)]
pub struct ScanOutput {
    pub classes: Vec<ClassDecl>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanOutput {
    pub fn extend(&mut self, other: ScanOutput) {
        self.classes.extend(other.classes);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Scans source trees into [`ClassDecl`] records.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    crate_name: String,
    exclude: Vec<PathBuf>,
}

impl SourceScanner {
    pub fn new(crate_name: impl Into<String>) -> Self {
        Self {
            crate_name: crate_name.into(),
            exclude: Vec::new(),
        }
    }

    /// Never descend into `path`; used for the output directory.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude.push(path.into());
        self
    }

    /// Scan every path in order. Classes keep discovery order, which is the
    /// order the optimistic resolution pass sees them in.
    pub fn scan_paths(&self, paths: &[PathBuf]) -> Result<ScanOutput, GenerateError> {
        let mut output = ScanOutput::default();
        for path in paths {
            output.extend(self.scan_path(path)?);
        }
        Ok(output)
    }

    pub fn scan_path(&self, root: &Path) -> Result<ScanOutput, GenerateError> {
        let mut output = ScanOutput::default();
        let files = discover_sources(root, &self.crate_name, &self.exclude)?;
        debug!("scanning {} source files under {}", files.len(), root.display());

        for file in files {
            let content = fs::read_to_string(&file.path).map_err(|source| GenerateError::Read {
                path: file.path.clone(),
                source,
            })?;
            self.scan_source(&content, &file.module_path, &file.relative_path, &mut output);
        }
        Ok(output)
    }

    /// Scan in-memory source text as the module `module_path`.
    pub fn scan_source(&self, content: &str, module_path: &str, source_file: &str, output: &mut ScanOutput) {
        if !DERIVE_NAMES.iter().any(|name| content.contains(name)) {
            trace!("{source_file}: no mapped derives");
            return;
        }

        let before = output.classes.len();
        if let Err(err) = parse_source(content, module_path, source_file, output) {
            output
                .diagnostics
                .push(Diagnostic::file_warning(source_file, format!("failed to parse, skipped: {err}")));
            return;
        }
        trace!("{source_file}: {} mapped classes", output.classes.len() - before);
    }
}

impl Default for SourceScanner {
    fn default() -> Self {
        Self::new("crate")
    }
}
