//! Where generated units go.

use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::emitter::GENERATED_MARKER;
use crate::error::GenerateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteOutcome {
    Written,
    Unchanged,
}

/// Receives generated source files.
pub trait SourceOutput {
    /// Store `contents` under `file_name` (a bare file name, e.g. `book_model.rs`).
    fn write_unit(&mut self, file_name: &str, contents: &str) -> Result<WriteOutcome, GenerateError>;

    /// Called once per batch with every file name written in it.
    fn finish(&mut self, _written: &BTreeSet<String>) -> Result<Vec<String>, GenerateError> {
        Ok(Vec::new())
    }
}

/// Writes into a directory, touching files only when their content changed
/// so Cargo does not rebuild needlessly.
#[derive(Debug, Clone)]
pub struct FsOutput {
    dir: PathBuf,
    check: bool,
}

impl FsOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            check: false,
        }
    }

    /// Compare against the directory without writing or deleting anything.
    pub fn check_only(mut self) -> Self {
        self.check = true;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SourceOutput for FsOutput {
    fn write_unit(&mut self, file_name: &str, contents: &str) -> Result<WriteOutcome, GenerateError> {
        let path = self.dir.join(file_name);

        // Only write if content has changed
        let unchanged = fs::read_to_string(&path).is_ok_and(|existing| existing == contents);
        if unchanged {
            return Ok(WriteOutcome::Unchanged);
        }
        if self.check {
            return Ok(WriteOutcome::Written);
        }

        fs::create_dir_all(&self.dir).map_err(|source| GenerateError::Write {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| GenerateError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("wrote {}", path.display());
        Ok(WriteOutcome::Written)
    }

    /// Remove generated modules left over from classes that no longer exist.
    /// Files without the generated marker are never touched.
    fn finish(&mut self, written: &BTreeSet<String>) -> Result<Vec<String>, GenerateError> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Ok(Vec::new());
        };

        let mut stale = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if !name.ends_with(".rs") || written.contains(&name) {
                continue;
            }
            let generated = fs::read_to_string(&path).is_ok_and(|content| content.contains(GENERATED_MARKER));
            if generated {
                stale.push(name);
            }
        }
        stale.sort();

        if !self.check {
            for name in &stale {
                let path = self.dir.join(name);
                fs::remove_file(&path).map_err(|source| GenerateError::Write { path, source })?;
                debug!("removed stale {name}");
            }
        }
        Ok(stale)
    }
}

/// Collects units in memory, keyed by file name.
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    files: BTreeMap<String, String>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }
}

impl SourceOutput for MemoryOutput {
    fn write_unit(&mut self, file_name: &str, contents: &str) -> Result<WriteOutcome, GenerateError> {
        match self.files.insert(file_name.to_string(), contents.to_string()) {
            Some(previous) if previous == contents => Ok(WriteOutcome::Unchanged),
            _ => Ok(WriteOutcome::Written),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_output_writes_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = FsOutput::new(dir.path().join("generated"));

        assert_eq!(output.write_unit("a.rs", "one").unwrap(), WriteOutcome::Written);
        assert_eq!(output.write_unit("a.rs", "one").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(output.write_unit("a.rs", "two").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(dir.path().join("generated/a.rs")).unwrap(), "two");
    }

    #[test]
    fn test_fs_output_prunes_only_generated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old_model.rs"), format!("//! {GENERATED_MARKER}\n")).unwrap();
        fs::write(dir.path().join("handwritten.rs"), "pub fn keep() {}\n").unwrap();

        let mut output = FsOutput::new(dir.path());
        output.write_unit("book_model.rs", &format!("//! {GENERATED_MARKER}\n")).unwrap();
        let removed = output.finish(&BTreeSet::from(["book_model.rs".to_string()])).unwrap();

        assert_eq!(removed, ["old_model.rs"]);
        assert!(!dir.path().join("old_model.rs").exists());
        assert!(dir.path().join("handwritten.rs").exists());
        assert!(dir.path().join("book_model.rs").exists());
    }

    #[test]
    fn test_check_only_leaves_directory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old_model.rs"), format!("//! {GENERATED_MARKER}\n")).unwrap();

        let mut output = FsOutput::new(dir.path()).check_only();
        assert_eq!(output.write_unit("book_model.rs", "new").unwrap(), WriteOutcome::Written);
        assert_eq!(output.finish(&BTreeSet::new()).unwrap(), ["old_model.rs"]);
        assert!(!dir.path().join("book_model.rs").exists());
        assert!(dir.path().join("old_model.rs").exists());
    }

    #[test]
    fn test_memory_output() {
        let mut output = MemoryOutput::new();
        assert_eq!(output.write_unit("a.rs", "x").unwrap(), WriteOutcome::Written);
        assert_eq!(output.write_unit("a.rs", "x").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(output.get("a.rs"), Some("x"));
    }
}
