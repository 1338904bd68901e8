//! Resolved entity models.
//!
//! Models are built once per batch and never mutated afterwards. References
//! between models (supertypes, association targets, embedded values) are
//! [`QualifiedName`] keys into the batch's [`ModelSet`], never copies.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::names::QualifiedName;
use crate::scanner::{ClassKind, Import, Plural, TypeRef};

/// Closed set of attribute kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AttributeKind {
    Identifier,
    Basic,
    Embedded,
    ToOne,
    ToMany,
    Collection,
    KeyedCollection,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeKind::Identifier => "identifier",
            AttributeKind::Basic => "basic",
            AttributeKind::Embedded => "embedded",
            AttributeKind::ToOne => "to-one",
            AttributeKind::ToMany => "to-many",
            AttributeKind::Collection => "collection",
            AttributeKind::KeyedCollection => "keyed collection",
        })
    }
}

/// Kind-specific payload of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeType {
    Identifier { value: TypeRef },
    Basic { value: TypeRef },
    Embedded { model: QualifiedName },
    ToOne { target: QualifiedName },
    ToMany { target: QualifiedName, plural: Plural },
    /// A container of basic values. `key` is set for keyed containers.
    Collection {
        element: TypeRef,
        key: Option<TypeRef>,
        plural: Plural,
    },
    KeyedCollection { key: TypeRef, target: QualifiedName },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeModel {
    pub name: String,
    pub declared_type: TypeRef,
    /// Class whose declaration contributed this attribute.
    pub declared_in: QualifiedName,
    #[serde(flatten)]
    pub ty: AttributeType,
}

impl AttributeModel {
    pub fn kind(&self) -> AttributeKind {
        match self.ty {
            AttributeType::Identifier { .. } => AttributeKind::Identifier,
            AttributeType::Basic { .. } => AttributeKind::Basic,
            AttributeType::Embedded { .. } => AttributeKind::Embedded,
            AttributeType::ToOne { .. } => AttributeKind::ToOne,
            AttributeType::ToMany { .. } => AttributeKind::ToMany,
            AttributeType::Collection { .. } => AttributeKind::Collection,
            AttributeType::KeyedCollection { .. } => AttributeKind::KeyedCollection,
        }
    }

    /// Association target or embedded value model, if any.
    pub fn target(&self) -> Option<&QualifiedName> {
        match &self.ty {
            AttributeType::Embedded { model } => Some(model),
            AttributeType::ToOne { target }
            | AttributeType::ToMany { target, .. }
            | AttributeType::KeyedCollection { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Bind a generic superclass's type parameters. Only value, element and
    /// key types can mention them; targets are concrete classes.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> AttributeModel {
        if bindings.is_empty() {
            return self.clone();
        }
        let ty = match &self.ty {
            AttributeType::Identifier { value } => AttributeType::Identifier {
                value: value.substitute(bindings),
            },
            AttributeType::Basic { value } => AttributeType::Basic {
                value: value.substitute(bindings),
            },
            AttributeType::Collection { element, key, plural } => AttributeType::Collection {
                element: element.substitute(bindings),
                key: key.as_ref().map(|key| key.substitute(bindings)),
                plural: *plural,
            },
            AttributeType::KeyedCollection { key, target } => AttributeType::KeyedCollection {
                key: key.substitute(bindings),
                target: target.clone(),
            },
            other => other.clone(),
        };
        AttributeModel {
            name: self.name.clone(),
            declared_type: self.declared_type.substitute(bindings),
            declared_in: self.declared_in.clone(),
            ty,
        }
    }
}

/// One mapped class with its flattened attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityModel {
    pub qualified_name: QualifiedName,
    pub simple_name: String,
    pub kind: ClassKind,
    /// Inherited attributes first (root-most superclass first), then own.
    pub attributes: Vec<AttributeModel>,
    pub super_model: Option<QualifiedName>,
    /// Entity subclasses at any depth, sorted.
    pub descendants: Vec<QualifiedName>,
    #[serde(skip)]
    pub imports: Vec<Import>,
    pub skip: bool,
}

impl EntityModel {
    pub fn attribute(&self, name: &str) -> Option<&AttributeModel> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|attribute| attribute.name.as_str()).collect()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &AttributeModel> {
        self.attributes
            .iter()
            .filter(|attribute| attribute.kind() == AttributeKind::Identifier)
    }

    pub fn module_path(&self) -> &str {
        self.qualified_name.module_path()
    }
}

/// Batch-scoped, write-once map from qualified name to model.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ModelSet {
    models: BTreeMap<QualifiedName, EntityModel>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a model. Returns `false` and keeps the existing model when the
    /// key is already present.
    pub fn insert(&mut self, model: EntityModel) -> bool {
        if self.models.contains_key(&model.qualified_name) {
            return false;
        }
        self.models.insert(model.qualified_name.clone(), model);
        true
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&EntityModel> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.models.contains_key(name)
    }

    /// All models in qualified-name order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Embeddable models reachable from `model` through embedded attributes,
    /// including nested embeddings, in qualified-name order.
    pub fn reachable_embeddables(&self, model: &EntityModel) -> BTreeSet<QualifiedName> {
        let mut reached = BTreeSet::new();
        let mut pending: Vec<&QualifiedName> = Vec::new();
        collect_embedded(model, &mut pending);
        while let Some(name) = pending.pop() {
            if reached.insert(name.clone())
                && let Some(embedded) = self.get(name)
            {
                collect_embedded(embedded, &mut pending);
            }
        }
        reached
    }
}

fn collect_embedded<'a>(model: &'a EntityModel, pending: &mut Vec<&'a QualifiedName>) {
    for attribute in &model.attributes {
        if let AttributeType::Embedded { model } = &attribute.ty {
            pending.push(model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddable(name: &str, embeds: &[(&str, &str)]) -> EntityModel {
        let qualified_name = QualifiedName::new(name);
        EntityModel {
            simple_name: qualified_name.simple_name().to_string(),
            kind: ClassKind::Embeddable,
            attributes: embeds
                .iter()
                .map(|(attr, target)| AttributeModel {
                    name: attr.to_string(),
                    declared_type: TypeRef::named(*target),
                    declared_in: qualified_name.clone(),
                    ty: AttributeType::Embedded {
                        model: QualifiedName::new(format!("crate::{target}")),
                    },
                })
                .collect(),
            qualified_name,
            super_model: None,
            descendants: Vec::new(),
            imports: Vec::new(),
            skip: false,
        }
    }

    #[test]
    fn test_model_set_is_write_once() {
        let mut set = ModelSet::new();
        assert!(set.insert(embeddable("crate::Address", &[])));
        assert!(!set.insert(embeddable("crate::Address", &[("zip", "ZipCode")])));
        assert!(set.get(&"crate::Address".into()).unwrap().attributes.is_empty());
    }

    #[test]
    fn test_reachable_embeddables_handles_cycles() {
        let mut set = ModelSet::new();
        set.insert(embeddable("crate::Address", &[("zip", "ZipCode")]));
        set.insert(embeddable("crate::ZipCode", &[("previous", "Address")]));
        let person = embeddable("crate::Person", &[("home", "Address")]);

        let reached: Vec<String> = set
            .reachable_embeddables(&person)
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(reached, ["crate::Address", "crate::ZipCode"]);
    }

    #[test]
    fn test_substitute_leaves_targets() {
        let attribute = AttributeModel {
            name: "id".into(),
            declared_type: TypeRef::named("K"),
            declared_in: QualifiedName::new("crate::Keyed"),
            ty: AttributeType::Identifier { value: TypeRef::named("K") },
        };
        let bindings = BTreeMap::from([("K".to_string(), TypeRef::named("u64"))]);
        let bound = attribute.substitute(&bindings);
        assert_eq!(bound.declared_type.to_string(), "u64");
        assert_eq!(bound.ty, AttributeType::Identifier { value: TypeRef::named("u64") });
        assert_eq!(bound.declared_in.as_str(), "crate::Keyed");
    }
}
