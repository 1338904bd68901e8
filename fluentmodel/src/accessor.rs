//! Building blocks referenced by generated accessor modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::path::{JoinType, Path};
use crate::types::Mapped;

/// A value positioned at a [`Path`]. Every generated accessor implements this.
pub trait Navigable {
    fn at(path: Path) -> Self
    where
        Self: Sized;

    fn path(&self) -> &Path;
}

/// Accessor of an entity with its own generated module.
///
/// Generated code implements this and adds an inherent `model()` function to
/// the entity that calls [`EntityRoot::root`].
pub trait EntityRoot: Navigable + Sized {
    type Entity: Mapped;

    /// Root name used in paths, the entity's simple name.
    const ENTITY: &'static str;

    fn root() -> Self {
        Self::at(Path::root(Self::ENTITY))
    }
}

/// Flavor of a plural attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plural {
    List,
    Set,
    Map,
}

impl fmt::Display for Plural {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plural::List => f.write_str("list"),
            Plural::Set => f.write_str("set"),
            Plural::Map => f.write_str("map"),
        }
    }
}

/// A leaf attribute of value type `T`.
pub struct Attribute<T> {
    path: Path,
    _value: PhantomData<fn() -> T>,
}

impl<T> Attribute<T> {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The attribute's own name, empty for a bare root.
    pub fn name(&self) -> &str {
        self.path.last_name().unwrap_or_default()
    }
}

impl<T> Navigable for Attribute<T> {
    fn at(path: Path) -> Self {
        Self::new(path)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Clone for Attribute<T> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T> PartialEq for Attribute<T> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<T> Eq for Attribute<T> {}

impl<T> Hash for Attribute<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl<T> fmt::Debug for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("path", &self.path)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for Attribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, f)
    }
}

/// A collection-valued attribute whose elements are navigated through `E`.
///
/// `E` is an entity accessor for associations, or [`Attribute`] for element
/// collections.
pub struct Join<E> {
    parent: Path,
    name: String,
    plural: Plural,
    _element: PhantomData<fn() -> E>,
}

impl<E> Join<E> {
    pub fn new(parent: Path, name: &str, plural: Plural) -> Self {
        Self {
            parent,
            name: name.to_string(),
            plural,
            _element: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural(&self) -> Plural {
        self.plural
    }

    /// The collection itself, not joined.
    pub fn path(&self) -> Path {
        self.parent.get(&self.name)
    }

    /// Navigate into the elements with an inner join.
    pub fn join(&self) -> E
    where
        E: Navigable,
    {
        self.join_with(JoinType::Inner)
    }

    /// Navigate into the elements with a left join.
    pub fn left_join(&self) -> E
    where
        E: Navigable,
    {
        self.join_with(JoinType::Left)
    }

    pub fn join_with(&self, join: JoinType) -> E
    where
        E: Navigable,
    {
        E::at(self.parent.join_with(&self.name, join))
    }
}

impl<E> Clone for Join<E> {
    fn clone(&self) -> Self {
        Self::new(self.parent.clone(), &self.name, self.plural)
    }
}

impl<E> PartialEq for Join<E> {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.name == other.name && self.plural == other.plural
    }
}

impl<E> Eq for Join<E> {}

impl<E> fmt::Debug for Join<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Join")
            .field("path", &self.path())
            .field("plural", &self.plural)
            .finish()
    }
}

/// A keyed collection. Keys are leaf attributes of type `K`, values are
/// navigated through `E`.
pub struct MapJoin<K, E> {
    parent: Path,
    name: String,
    join: JoinType,
    _entry: PhantomData<fn() -> (K, E)>,
}

impl<K, E> MapJoin<K, E> {
    pub fn new(parent: Path, name: &str) -> Self {
        Self {
            parent,
            name: name.to_string(),
            join: JoinType::Inner,
            _entry: PhantomData,
        }
    }

    /// The same map, joined with a left join.
    pub fn left(mut self) -> Self {
        self.join = JoinType::Left;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural(&self) -> Plural {
        Plural::Map
    }

    /// The map itself, not joined.
    pub fn path(&self) -> Path {
        self.parent.get(&self.name)
    }

    pub fn key(&self) -> Attribute<K> {
        Attribute::new(self.joined().key())
    }

    pub fn value(&self) -> E
    where
        E: Navigable,
    {
        E::at(self.joined())
    }

    fn joined(&self) -> Path {
        self.parent.join_with(&self.name, self.join)
    }
}

impl<K, E> Clone for MapJoin<K, E> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            name: self.name.clone(),
            join: self.join,
            _entry: PhantomData,
        }
    }
}

impl<K, E> fmt::Debug for MapJoin<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapJoin")
            .field("path", &self.path())
            .field("join", &self.join)
            .finish()
    }
}
