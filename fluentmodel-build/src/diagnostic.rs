//! Diagnostics reported while building and emitting models.

use serde::Serialize;
use std::fmt;

use crate::error::{ErrorKind, ModelError, location};
use crate::names::QualifiedName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A message tied to a mapped class and, where it applies, one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Set for errors only.
    pub kind: Option<ErrorKind>,
    /// `None` for file-level problems such as a parse failure.
    pub class: Option<QualifiedName>,
    pub member: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(class: &QualifiedName, member: Option<&str>, detail: impl fmt::Display) -> Self {
        Self::located(Severity::Warning, class, member, detail)
    }

    pub fn note(class: &QualifiedName, member: Option<&str>, detail: impl fmt::Display) -> Self {
        Self::located(Severity::Note, class, member, detail)
    }

    /// A warning about a source file rather than a class.
    pub fn file_warning(file: &str, detail: impl fmt::Display) -> Self {
        Self {
            severity: Severity::Warning,
            kind: None,
            class: None,
            member: None,
            message: format!("{file}: {detail}"),
        }
    }

    fn located(severity: Severity, class: &QualifiedName, member: Option<&str>, detail: impl fmt::Display) -> Self {
        let member = member.map(str::to_string);
        Self {
            severity,
            kind: None,
            message: format!("{}: {detail}", location(class, &member)),
            class: Some(class.clone()),
            member,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&ModelError> for Diagnostic {
    fn from(error: &ModelError) -> Self {
        Self {
            severity: Severity::Error,
            kind: Some(error.kind()),
            class: Some(error.class().clone()),
            member: error.member().map(str::to_string),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{}[{kind}]: {}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_diagnostic_display() {
        let error = ModelError::MissingIdentifier {
            class: QualifiedName::new("crate::Tag"),
        };
        let diagnostic = Diagnostic::from(&error);
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.kind, Some(ErrorKind::MissingIdentifier));
        assert_eq!(
            diagnostic.to_string(),
            "error[MissingIdentifier]: `crate::Tag`: entity declares no identifier attribute"
        );
    }

    #[test]
    fn test_warning_carries_location() {
        let class = QualifiedName::new("crate::Book");
        let diagnostic = Diagnostic::warning(&class, Some("shelf"), "defaults to basic");
        assert_eq!(diagnostic.to_string(), "warning: `crate::Book.shelf`: defaults to basic");
        assert_eq!(diagnostic.member.as_deref(), Some("shelf"));
        assert!(!diagnostic.is_error());
    }
}
