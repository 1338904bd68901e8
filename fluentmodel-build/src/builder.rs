//! Builds one [`EntityModel`] per mapped class.
//!
//! Members are resolved in two passes: optimistically while walking the
//! classes in scan order, then once more against the complete batch for
//! whatever the first pass deferred. Models are then built along each
//! inheritance chain, memoized by qualified name.

use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostic::Diagnostic;
use crate::error::ModelError;
use crate::model::{AttributeKind, AttributeModel, EntityModel, ModelSet};
use crate::names::QualifiedName;
use crate::resolver::{Lookup, Resolution, TypeResolver, Universe};
use crate::scanner::{ClassDecl, ClassKind, TypeRef};

/// Everything the builder produced for one batch.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub models: ModelSet,
    /// Classes with at least one error. They may still be modeled but are
    /// never emitted.
    pub failed: BTreeSet<QualifiedName>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build models for `classes`, given in scan order.
pub fn build_models(classes: &[ClassDecl]) -> BuildOutput {
    ModelBuilder::new(classes).build()
}

#[derive(Debug, Clone)]
struct SuperLink {
    target: QualifiedName,
    bindings: BTreeMap<String, TypeRef>,
}

pub struct ModelBuilder<'a> {
    order: Vec<&'a ClassDecl>,
    universe: Universe<'a>,
    own: BTreeMap<QualifiedName, Vec<AttributeModel>>,
    supers: BTreeMap<QualifiedName, SuperLink>,
    descendants: BTreeMap<QualifiedName, Vec<QualifiedName>>,
    errors: BTreeMap<QualifiedName, Vec<ModelError>>,
    /// Classes excluded because a superclass failed.
    blocked: BTreeSet<QualifiedName>,
    warnings: Vec<Diagnostic>,
    models: ModelSet,
    path: Vec<QualifiedName>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(classes: &'a [ClassDecl]) -> Self {
        let mut seen = BTreeSet::new();
        let mut order = Vec::with_capacity(classes.len());
        for class in classes {
            if seen.insert(&class.qualified_name) {
                order.push(class);
            } else {
                debug!("ignoring duplicate declaration of {}", class.qualified_name);
            }
        }

        Self {
            universe: Universe::complete(order.iter().copied()),
            order,
            own: BTreeMap::new(),
            supers: BTreeMap::new(),
            descendants: BTreeMap::new(),
            errors: BTreeMap::new(),
            blocked: BTreeSet::new(),
            warnings: Vec::new(),
            models: ModelSet::new(),
            path: Vec::new(),
        }
    }

    pub fn build(mut self) -> BuildOutput {
        self.resolve_members();
        self.link_supertypes();
        self.collect_descendants();

        let mut names: Vec<QualifiedName> = self.order.iter().map(|class| class.qualified_name.clone()).collect();
        names.sort();
        for name in &names {
            self.build_model(name);
        }

        self.lint_basic_attributes();
        self.finish()
    }

    fn resolve_members(&mut self) {
        let mut slots: BTreeMap<QualifiedName, Vec<Option<AttributeModel>>> = BTreeMap::new();
        let mut deferred: Vec<(&'a ClassDecl, usize)> = Vec::new();

        let mut partial = Universe::partial();
        for &class in &self.order {
            partial.insert(class);
            let resolver = TypeResolver::new(&partial);
            let mut row = Vec::with_capacity(class.members.len());
            for (index, member) in class.members.iter().enumerate() {
                match resolver.resolve(class, member) {
                    Resolution::Resolved(attribute) => row.push(Some(attribute)),
                    Resolution::Deferred { .. } => {
                        row.push(None);
                        deferred.push((class, index));
                    }
                    Resolution::Failed(error) => {
                        row.push(None);
                        self.errors.entry(class.qualified_name.clone()).or_default().push(error);
                    }
                }
            }
            slots.insert(class.qualified_name.clone(), row);
        }

        trace!("optimistic pass deferred {} members", deferred.len());

        let resolver = TypeResolver::new(&self.universe);
        for (class, index) in deferred {
            let member = &class.members[index];
            match resolver.resolve(class, member) {
                Resolution::Resolved(attribute) => {
                    if let Some(slot) = slots.get_mut(&class.qualified_name).and_then(|row| row.get_mut(index)) {
                        *slot = Some(attribute);
                    }
                }
                Resolution::Deferred { target, reason } => {
                    self.errors
                        .entry(class.qualified_name.clone())
                        .or_default()
                        .push(ModelError::UnresolvedReference {
                            class: class.qualified_name.clone(),
                            member: Some(member.name.clone()),
                            target,
                            reason,
                        });
                }
                Resolution::Failed(error) => {
                    self.errors.entry(class.qualified_name.clone()).or_default().push(error);
                }
            }
        }

        self.own = slots
            .into_iter()
            .map(|(name, row)| (name, row.into_iter().flatten().collect()))
            .collect();
    }

    fn link_supertypes(&mut self) {
        for &class in &self.order {
            let Some(supertype) = &class.supertype else { continue };
            let unresolved = |reason: String| ModelError::UnresolvedReference {
                class: class.qualified_name.clone(),
                member: None,
                target: supertype.to_string(),
                reason,
            };

            let error = match self.universe.lookup(supertype, class) {
                Lookup::Found(parent)
                    if parent.kind == ClassKind::Embeddable
                        || (class.kind == ClassKind::Embeddable && parent.kind == ClassKind::Entity) =>
                {
                    Some(ModelError::InvalidMarker {
                        class: class.qualified_name.clone(),
                        member: None,
                        reason: format!(
                            "{} cannot extend {} (`{}`)",
                            class.kind.with_article(),
                            parent.kind.with_article(),
                            parent.qualified_name
                        ),
                    })
                }
                Lookup::Found(parent) => {
                    let args = supertype.args();
                    let mismatch = (args.len() != parent.type_params.len()).then(|| ModelError::InvalidMarker {
                        class: class.qualified_name.clone(),
                        member: None,
                        reason: format!(
                            "`extends = {supertype}` passes {} type arguments, `{}` declares {}",
                            args.len(),
                            parent.qualified_name,
                            parent.type_params.len()
                        ),
                    });
                    let bindings = parent.type_params.iter().cloned().zip(args.iter().cloned()).collect();
                    self.supers.insert(
                        class.qualified_name.clone(),
                        SuperLink {
                            target: parent.qualified_name.clone(),
                            bindings,
                        },
                    );
                    mismatch
                }
                Lookup::NotFound => Some(unresolved("no mapped class with that name".to_string())),
                Lookup::Ambiguous(candidates) => Some(unresolved(format!(
                    "ambiguous between {}",
                    candidates.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ")
                ))),
            };

            if let Some(error) = error {
                self.errors.entry(class.qualified_name.clone()).or_default().push(error);
            }
        }
    }

    fn collect_descendants(&mut self) {
        for &class in &self.order {
            if class.kind != ClassKind::Entity {
                continue;
            }
            let mut seen = BTreeSet::from([class.qualified_name.clone()]);
            let mut current = self.supers.get(&class.qualified_name);
            while let Some(link) = current {
                if !seen.insert(link.target.clone()) {
                    break;
                }
                if self
                    .universe
                    .get(&link.target)
                    .is_some_and(|parent| parent.kind == ClassKind::Entity)
                {
                    self.descendants
                        .entry(link.target.clone())
                        .or_default()
                        .push(class.qualified_name.clone());
                }
                current = self.supers.get(&link.target);
            }
        }
        for list in self.descendants.values_mut() {
            list.sort();
            list.dedup();
        }
    }

    /// Build (or reuse) the model for `name`, building its superclass first.
    fn build_model(&mut self, name: &QualifiedName) {
        if self.models.contains(name) || self.path.contains(name) {
            return;
        }
        let Some(class) = self.universe.get(name) else {
            return;
        };
        self.path.push(name.clone());

        let mut attributes: Vec<AttributeModel> = Vec::new();
        let mut super_model = None;
        if let Some(link) = self.supers.get(name).cloned() {
            if let Some(chain) = self.inheritance_cycle(name) {
                self.record(ModelError::InheritanceCycle {
                    class: name.clone(),
                    chain,
                });
            } else {
                self.build_model(&link.target);
                if let Some(parent) = self.models.get(&link.target) {
                    attributes = parent
                        .attributes
                        .iter()
                        .map(|attribute| attribute.substitute(&link.bindings))
                        .collect();
                }
                if self.is_failed(&link.target) {
                    debug!("excluding `{name}`: superclass `{}` has errors", link.target);
                    self.blocked.insert(name.clone());
                }
                super_model = Some(link.target);
            }
        }

        let own = self.own.get(name).cloned().unwrap_or_default();
        for attribute in own {
            match attributes.iter().position(|existing| existing.name == attribute.name) {
                Some(index) if attributes[index].kind() == attribute.kind() => attributes[index] = attribute,
                Some(index) => {
                    let inherited = attributes[index].kind();
                    self.record(ModelError::NameCollision {
                        class: name.clone(),
                        member: attribute.name.clone(),
                        inherited,
                        declared: attribute.kind(),
                    });
                }
                None => attributes.push(attribute),
            }
        }

        // Identifier problems inherited from a failed superclass are reported there.
        if !self.blocked.contains(name) {
            self.check_identifiers(class, &attributes);
        }
        if !class.type_params.is_empty() && class.kind != ClassKind::MappedSuperclass {
            self.record(ModelError::GenericMappedType {
                class: name.clone(),
                kind: class.kind.label(),
            });
        }

        self.path.pop();

        debug!(
            "modeled {} `{}` with {} attributes",
            class.kind,
            name,
            attributes.len()
        );
        self.models.insert(EntityModel {
            qualified_name: name.clone(),
            simple_name: class.simple_name().to_string(),
            kind: class.kind,
            attributes,
            super_model,
            descendants: self.descendants.get(name).cloned().unwrap_or_default(),
            imports: class.imports.clone(),
            skip: class.skip,
        });
    }

    /// The supertype chain from `name` back to itself, if `name` is on a cycle.
    fn inheritance_cycle(&self, name: &QualifiedName) -> Option<Vec<QualifiedName>> {
        let mut chain = vec![name.clone()];
        let mut current = name;
        while let Some(link) = self.supers.get(current) {
            if &link.target == name {
                chain.push(link.target.clone());
                return Some(chain);
            }
            if chain.contains(&link.target) {
                return None;
            }
            chain.push(link.target.clone());
            current = &link.target;
        }
        None
    }

    fn check_identifiers(&mut self, class: &ClassDecl, attributes: &[AttributeModel]) {
        let identifiers: Vec<String> = attributes
            .iter()
            .filter(|attribute| attribute.kind() == AttributeKind::Identifier)
            .map(|attribute| attribute.name.clone())
            .collect();

        match class.kind {
            ClassKind::Entity if identifiers.is_empty() => self.record(ModelError::MissingIdentifier {
                class: class.qualified_name.clone(),
            }),
            ClassKind::Entity | ClassKind::MappedSuperclass if identifiers.len() > 1 => {
                self.record(ModelError::AmbiguousIdentifier {
                    class: class.qualified_name.clone(),
                    attributes: identifiers,
                })
            }
            _ => {}
        }
    }

    fn lint_basic_attributes(&mut self) {
        let resolver = TypeResolver::new(&self.universe);
        for &class in &self.order {
            let Some(attributes) = self.own.get(&class.qualified_name) else { continue };
            for attribute in attributes {
                if let Some(warning) = resolver.lint_basic(class, attribute) {
                    self.warnings.push(warning);
                }
            }
        }
    }

    fn is_failed(&self, name: &QualifiedName) -> bool {
        self.errors.contains_key(name) || self.blocked.contains(name)
    }

    fn record(&mut self, error: ModelError) {
        self.errors.entry(error.class().clone()).or_default().push(error);
    }

    fn finish(self) -> BuildOutput {
        let mut diagnostics = self.warnings;
        for errors in self.errors.values() {
            diagnostics.extend(errors.iter().map(Diagnostic::from));
        }
        for name in &self.blocked {
            if let Some(parent) = self.models.get(name).and_then(|model| model.super_model.as_ref()) {
                diagnostics.push(Diagnostic::note(
                    name,
                    None,
                    format!("not generated, superclass `{parent}` has errors"),
                ));
            }
        }
        let mut failed: BTreeSet<QualifiedName> = self.errors.into_keys().collect();
        failed.extend(self.blocked);
        BuildOutput {
            models: self.models,
            failed,
            diagnostics,
        }
    }
}
