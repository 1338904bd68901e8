//! File discovery for finding Rust sources under a scan path.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::GenerateError;

/// A source file found under a scan path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scan root, for diagnostics.
    pub relative_path: String,
    /// Module path of the file, e.g. `crate::library::books`.
    pub module_path: String,
}

/// Walk `root` recursively and return its `.rs` files sorted by relative path.
///
/// Hidden directories, `target/` and any path under `exclude` are skipped.
pub fn discover_sources(root: &Path, crate_name: &str, exclude: &[PathBuf]) -> Result<Vec<SourceFile>, GenerateError> {
    if !root.exists() {
        return Err(GenerateError::MissingScanPath(root.to_path_buf()));
    }

    let mut discovered = Vec::new();
    let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
        if entry.depth() == 0 {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') || (entry.file_type().is_dir() && name == "target") {
            return false;
        }
        !exclude.iter().any(|excluded| same_path(entry.path(), excluded))
    });

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }

        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        discovered.push(SourceFile {
            path: path.to_path_buf(),
            module_path: compute_module_path(path, root, crate_name),
            relative_path,
        });
    }

    discovered.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(discovered)
}

fn same_path(candidate: &Path, excluded: &Path) -> bool {
    if candidate == excluded {
        return true;
    }
    match (candidate.canonicalize(), excluded.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Compute the module path from a file path.
/// e.g. "src/library/books.rs" with base "src" -> "crate::library::books"
pub fn compute_module_path(file_path: &Path, base_path: &Path, crate_name: &str) -> String {
    let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);

    let without_extension = relative.with_extension("");
    let mut parts: Vec<&str> = without_extension
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    // mod.rs belongs to its directory, lib.rs and main.rs to the crate root
    if let Some(last) = parts.last()
        && (*last == "mod" || (parts.len() == 1 && (*last == "lib" || *last == "main")))
    {
        parts.pop();
    }

    if parts.is_empty() {
        crate_name.to_string()
    } else {
        format!("{}::{}", crate_name, parts.join("::"))
    }
}
