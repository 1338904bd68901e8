//! Error types for the generator.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::AttributeKind;
use crate::names::QualifiedName;
use crate::scanner::Marker;

/// Host failure that aborts a batch: I/O, configuration, rendering.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("scan path {} does not exist", .0.display())]
    MissingScanPath(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid configuration in {}: {source}", path.display())]
    Config { path: PathBuf, source: toml::de::Error },

    /// A declared type could not be rendered back into generated code.
    #[error("cannot render type `{ty}` of `{class}.{member}`: {source}")]
    InvalidType {
        class: QualifiedName,
        member: String,
        ty: String,
        source: syn::Error,
    },

    #[error("generated module {module} is not valid Rust: {source}")]
    Render { module: String, source: syn::Error },
}

/// Per-class modeling error. Never fatal to the batch; the class is excluded
/// from emission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("`{class}`: more than one identifier attribute ({})", join_names(.attributes))]
    AmbiguousIdentifier {
        class: QualifiedName,
        attributes: Vec<String>,
    },

    #[error("`{class}`: entity declares no identifier attribute")]
    MissingIdentifier { class: QualifiedName },

    #[error("{}: cannot resolve `{target}`: {reason}", location(.class, .member))]
    UnresolvedReference {
        class: QualifiedName,
        member: Option<String>,
        target: String,
        reason: String,
    },

    #[error("`{class}.{member}`: conflicting markers {}", marker_list(.markers))]
    ConflictingMarkers {
        class: QualifiedName,
        member: String,
        markers: Vec<Marker>,
    },

    #[error("`{class}.{member}`: redeclares an inherited {inherited} attribute as {declared}")]
    NameCollision {
        class: QualifiedName,
        member: String,
        inherited: AttributeKind,
        declared: AttributeKind,
    },

    #[error("{}: {reason}", location(.class, .member))]
    InvalidMarker {
        class: QualifiedName,
        member: Option<String>,
        reason: String,
    },

    #[error("`{class}`: inheritance cycle {}", chain_text(.chain))]
    InheritanceCycle {
        class: QualifiedName,
        chain: Vec<QualifiedName>,
    },

    #[error("`{class}`: a generic {kind} cannot have a concrete accessor")]
    GenericMappedType { class: QualifiedName, kind: &'static str },
}

/// Fieldless discriminant of [`ModelError`], used for reporting and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    AmbiguousIdentifier,
    MissingIdentifier,
    UnresolvedReference,
    ConflictingMarkers,
    NameCollision,
    InvalidMarker,
    InheritanceCycle,
    GenericMappedType,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::AmbiguousIdentifier { .. } => ErrorKind::AmbiguousIdentifier,
            ModelError::MissingIdentifier { .. } => ErrorKind::MissingIdentifier,
            ModelError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            ModelError::ConflictingMarkers { .. } => ErrorKind::ConflictingMarkers,
            ModelError::NameCollision { .. } => ErrorKind::NameCollision,
            ModelError::InvalidMarker { .. } => ErrorKind::InvalidMarker,
            ModelError::InheritanceCycle { .. } => ErrorKind::InheritanceCycle,
            ModelError::GenericMappedType { .. } => ErrorKind::GenericMappedType,
        }
    }

    pub fn class(&self) -> &QualifiedName {
        match self {
            ModelError::AmbiguousIdentifier { class, .. }
            | ModelError::MissingIdentifier { class }
            | ModelError::UnresolvedReference { class, .. }
            | ModelError::ConflictingMarkers { class, .. }
            | ModelError::NameCollision { class, .. }
            | ModelError::InvalidMarker { class, .. }
            | ModelError::InheritanceCycle { class, .. }
            | ModelError::GenericMappedType { class, .. } => class,
        }
    }

    pub fn member(&self) -> Option<&str> {
        match self {
            ModelError::UnresolvedReference { member, .. } | ModelError::InvalidMarker { member, .. } => {
                member.as_deref()
            }
            ModelError::ConflictingMarkers { member, .. } | ModelError::NameCollision { member, .. } => Some(member),
            _ => None,
        }
    }
}

pub(crate) fn location(class: &QualifiedName, member: &Option<String>) -> String {
    match member {
        Some(member) => format!("`{class}.{member}`"),
        None => format!("`{class}`"),
    }
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn chain_text(chain: &[QualifiedName]) -> String {
    chain.iter().map(QualifiedName::as_str).collect::<Vec<_>>().join(" -> ")
}

fn marker_list(markers: &[Marker]) -> String {
    markers.iter().map(|m| format!("`{m}`")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_messages() {
        let err = ModelError::AmbiguousIdentifier {
            class: QualifiedName::new("crate::library::Book"),
            attributes: vec!["id".into(), "isbn".into()],
        };
        assert_eq!(
            err.to_string(),
            "`crate::library::Book`: more than one identifier attribute (id, isbn)"
        );
        assert_eq!(err.kind(), ErrorKind::AmbiguousIdentifier);

        let err = ModelError::UnresolvedReference {
            class: QualifiedName::new("crate::library::Book"),
            member: Some("author".into()),
            target: "Writer".into(),
            reason: "no mapped class with that name".into(),
        };
        assert_eq!(
            err.to_string(),
            "`crate::library::Book.author`: cannot resolve `Writer`: no mapped class with that name"
        );
        assert_eq!(err.member(), Some("author"));
    }

    #[test]
    fn test_conflicting_markers_message() {
        let err = ModelError::ConflictingMarkers {
            class: QualifiedName::new("crate::Book"),
            member: "author".into(),
            markers: vec![Marker::Embedded, Marker::ManyToOne],
        };
        assert_eq!(
            err.to_string(),
            "`crate::Book.author`: conflicting markers `embedded`, `many_to_one`"
        );
    }
}
