use serde::Serialize;
use std::fmt;

/// Which derive a mapped class carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappedKind {
    Entity,
    MappedSuperclass,
    Embeddable,
}

impl MappedKind {
    /// Whether the generator emits an accessor module for this kind.
    pub fn is_generation_root(self) -> bool {
        self == MappedKind::Entity
    }
}

impl fmt::Display for MappedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappedKind::Entity => f.write_str("entity"),
            MappedKind::MappedSuperclass => f.write_str("mapped superclass"),
            MappedKind::Embeddable => f.write_str("embeddable"),
        }
    }
}

/// Marker written as `#[fluent(...)]` on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberMarker {
    Id,
    Embedded,
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// Compile-time shape of a mapped class, as seen by the derive.
#[derive(Debug, Clone, Serialize)]
pub struct MappedDescriptor {
    pub name: &'static str,
    pub kind: MappedKind,
    /// The `extends = ...` supertype as written.
    pub extends: Option<&'static str>,
    /// Left out of generation with `#[fluent(skip)]`.
    pub skip: bool,
    /// Declared members, transient ones excluded.
    pub members: Vec<MemberDescriptor>,
}

impl MappedDescriptor {
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|member| member.name == name)
    }

    /// Members marked `id`.
    pub fn identifiers(&self) -> impl Iterator<Item = &MemberDescriptor> {
        self.members
            .iter()
            .filter(|member| member.markers.contains(&MemberMarker::Id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDescriptor {
    pub name: &'static str,
    /// The declared type as written in source.
    pub ty: &'static str,
    pub markers: Vec<MemberMarker>,
}

/// Implemented by `#[derive(Entity)]`, `#[derive(MappedSuperclass)]` and
/// `#[derive(Embeddable)]`.
pub trait Mapped {
    const KIND: MappedKind;

    /// Simple name of the struct.
    const NAME: &'static str;

    fn descriptor() -> MappedDescriptor;
}
