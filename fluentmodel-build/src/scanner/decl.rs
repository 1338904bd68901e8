//! Structural records produced by the scanner.
//!
//! These are plain data: any front end that can describe a mapped class as a
//! [`ClassDecl`] can feed the rest of the pipeline.

use serde::Serialize;
use std::fmt;

use super::types::TypeRef;
use crate::names::QualifiedName;

/// Which derive made a struct a mapped class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ClassKind {
    Entity,
    MappedSuperclass,
    Embeddable,
}

impl ClassKind {
    pub fn from_derive(name: &str) -> Option<Self> {
        match name {
            "Entity" => Some(ClassKind::Entity),
            "MappedSuperclass" => Some(ClassKind::MappedSuperclass),
            "Embeddable" => Some(ClassKind::Embeddable),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClassKind::Entity => "entity",
            ClassKind::MappedSuperclass => "mapped superclass",
            ClassKind::Embeddable => "embeddable",
        }
    }

    pub fn with_article(self) -> &'static str {
        match self {
            ClassKind::Entity => "an entity",
            ClassKind::MappedSuperclass => "a mapped superclass",
            ClassKind::Embeddable => "an embeddable",
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persistence marker recognized on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Marker {
    Id,
    Embedded,
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    Transient,
}

impl Marker {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "id" => Some(Marker::Id),
            "embedded" => Some(Marker::Embedded),
            "one_to_one" => Some(Marker::OneToOne),
            "many_to_one" => Some(Marker::ManyToOne),
            "one_to_many" => Some(Marker::OneToMany),
            "many_to_many" => Some(Marker::ManyToMany),
            "transient" => Some(Marker::Transient),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Marker::Id => "id",
            Marker::Embedded => "embedded",
            Marker::OneToOne => "one_to_one",
            Marker::ManyToOne => "many_to_one",
            Marker::OneToMany => "one_to_many",
            Marker::ManyToMany => "many_to_many",
            Marker::Transient => "transient",
        }
    }

    pub fn is_to_one(self) -> bool {
        matches!(self, Marker::OneToOne | Marker::ManyToOne)
    }

    pub fn is_to_many(self) -> bool {
        matches!(self, Marker::OneToMany | Marker::ManyToMany)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A `use` binding visible in the file that declares a class.
///
/// `path` is absolute (`self`/`super` already resolved). A glob import keeps
/// `*` as its last segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Import {
    pub path: Vec<String>,
    pub alias: Option<String>,
}

impl Import {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.split("::").map(str::to_string).collect(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_glob(&self) -> bool {
        self.path.last().is_some_and(|segment| segment == "*")
    }

    /// The local name this import introduces, `None` for globs and `_`.
    pub fn binding(&self) -> Option<&str> {
        if self.is_glob() {
            return None;
        }
        let name = self.alias.as_deref().or(self.path.last().map(String::as_str))?;
        (name != "_").then_some(name)
    }

    /// Source text of the equivalent `use` item, without the trailing `;`.
    pub fn to_use_tree(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {alias}", self.path.join("::")),
            None => self.path.join("::"),
        }
    }
}

/// One declared member, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberDecl {
    pub name: String,
    pub declared_type: TypeRef,
    pub markers: Vec<Marker>,
}

impl MemberDecl {
    pub fn new(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            declared_type,
            markers: Vec::new(),
        }
    }

    pub fn marked(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn has(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// Flat structural description of one mapped class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDecl {
    pub qualified_name: QualifiedName,
    pub kind: ClassKind,
    pub type_params: Vec<String>,
    pub supertype: Option<TypeRef>,
    pub members: Vec<MemberDecl>,
    pub imports: Vec<Import>,
    /// Modeled, but no accessor is generated for it.
    pub skip: bool,
    /// Source file relative to its scan path, empty when not scanned from disk.
    pub source_file: String,
}

impl ClassDecl {
    pub fn new(qualified_name: impl Into<QualifiedName>, kind: ClassKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            type_params: Vec::new(),
            supertype: None,
            members: Vec::new(),
            imports: Vec::new(),
            skip: false,
            source_file: String::new(),
        }
    }

    pub fn extends(mut self, supertype: TypeRef) -> Self {
        self.supertype = Some(supertype);
        self
    }

    pub fn type_param(mut self, name: impl Into<String>) -> Self {
        self.type_params.push(name.into());
        self
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn simple_name(&self) -> &str {
        self.qualified_name.simple_name()
    }

    pub fn module_path(&self) -> &str {
        self.qualified_name.module_path()
    }
}
