//! Qualified names and the naming transformations used by generated code.

use serde::Serialize;
use std::fmt;

/// Fully qualified path of a mapped class, e.g. `crate::library::Book`.
///
/// This is the identity key of a class within one batch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Join a module path and a type name.
    pub fn join(module_path: &str, name: &str) -> Self {
        if module_path.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{module_path}::{name}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn simple_name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// Everything before the last segment; empty for a bare name.
    pub fn module_path(&self) -> &str {
        match self.0.rfind("::") {
            Some(index) => &self.0[..index],
            None => "",
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split("::")
    }

    /// True when `suffix` names the trailing segments of this path.
    pub fn ends_with_segments(&self, suffix: &[String]) -> bool {
        let segments: Vec<&str> = self.segments().collect();
        suffix.len() <= segments.len()
            && segments[segments.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(a, b)| *a == b.as_str())
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for QualifiedName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Convert PascalCase to snake_case.
///
/// Acronym runs stay together: `HTTPRequest` becomes `http_request`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Convert snake_case (or a single lowercase word) to PascalCase.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Accessor type name for a generation root: `Book` becomes `BookModel`.
pub fn accessor_name(simple_name: &str) -> String {
    format!("{simple_name}Model")
}

/// Module (and file stem) for a generation root: `Book` becomes `book_model`.
pub fn module_name(simple_name: &str) -> String {
    format!("{}_model", to_snake_case(simple_name))
}

/// Inline accessor type name for an embeddable: `Address` becomes `AddressPath`.
pub fn embeddable_accessor_name(simple_name: &str) -> String {
    format!("{simple_name}Path")
}
