//! Attribute kind resolution and name lookup against the batch universe.

use std::collections::BTreeMap;

use crate::diagnostic::Diagnostic;
use crate::error::ModelError;
use crate::model::{AttributeModel, AttributeType};
use crate::names::QualifiedName;
use crate::scanner::{ClassDecl, ClassKind, Marker, MemberDecl, TypeRef, absolutize_path};

/// The mapped classes a lookup can see.
///
/// A partial universe (the classes scanned so far) only answers lookups whose
/// result cannot change as more classes arrive. Glob imports and fallbacks by
/// simple name or path suffix wait for the complete universe.
#[derive(Debug, Default)]
pub struct Universe<'a> {
    classes: BTreeMap<QualifiedName, &'a ClassDecl>,
    by_simple_name: BTreeMap<String, Vec<QualifiedName>>,
    complete: bool,
}

/// Outcome of looking a declared type up by name.
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a ClassDecl),
    NotFound,
    Ambiguous(Vec<QualifiedName>),
}

impl<'a> Universe<'a> {
    pub fn partial() -> Self {
        Self::default()
    }

    pub fn complete(classes: impl IntoIterator<Item = &'a ClassDecl>) -> Self {
        let mut universe = Self::default();
        for class in classes {
            universe.insert(class);
        }
        universe.complete = true;
        universe
    }

    /// Add a class. The first declaration of a qualified name wins.
    pub fn insert(&mut self, class: &'a ClassDecl) -> bool {
        if self.classes.contains_key(&class.qualified_name) {
            return false;
        }
        self.classes.insert(class.qualified_name.clone(), class);
        let names = self.by_simple_name.entry(class.simple_name().to_string()).or_default();
        names.push(class.qualified_name.clone());
        names.sort();
        true
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&'a ClassDecl> {
        self.classes.get(name).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Look `ty` up as written inside `from`'s module.
    pub fn lookup(&self, ty: &TypeRef, from: &ClassDecl) -> Lookup<'a> {
        let segments = ty.segments();
        let Some(first) = segments.first() else {
            return Lookup::NotFound;
        };
        let module = from.module_path();

        if matches!(first.as_str(), "crate" | "self" | "super") {
            return self.exact(&absolutize_path(segments, module));
        }

        if let Some(import) = from.imports.iter().find(|import| import.binding() == Some(first.as_str())) {
            let mut path = import.path.clone();
            path.extend_from_slice(&segments[1..]);
            return self.exact(&path);
        }

        if segments.len() == 1 {
            if let Some(class) = self.get(&QualifiedName::join(module, first)) {
                return Lookup::Found(class);
            }
            // A local item declared later would shadow any glob import.
            if !self.complete {
                return Lookup::NotFound;
            }
            for glob in from.imports.iter().filter(|import| import.is_glob()) {
                let prefix = glob.path[..glob.path.len() - 1].join("::");
                if let Some(class) = self.get(&QualifiedName::join(&prefix, first)) {
                    return Lookup::Found(class);
                }
            }
            return match self.by_simple_name.get(first.as_str()).map(Vec::as_slice) {
                Some([only]) => self.exact_name(only),
                Some(many) if !many.is_empty() => Lookup::Ambiguous(many.to_vec()),
                _ => Lookup::NotFound,
            };
        }

        let mut relative: Vec<String> = module.split("::").map(str::to_string).collect();
        relative.extend_from_slice(segments);
        if let Lookup::Found(class) = self.exact(&relative) {
            return Lookup::Found(class);
        }
        if !self.complete {
            return Lookup::NotFound;
        }

        let candidates: Vec<QualifiedName> = self
            .classes
            .keys()
            .filter(|name| name.ends_with_segments(segments))
            .cloned()
            .collect();
        match candidates.as_slice() {
            [only] => self.exact_name(only),
            [] => Lookup::NotFound,
            _ => Lookup::Ambiguous(candidates),
        }
    }

    fn exact(&self, path: &[String]) -> Lookup<'a> {
        self.exact_name(&QualifiedName::new(path.join("::")))
    }

    fn exact_name(&self, name: &QualifiedName) -> Lookup<'a> {
        match self.get(name) {
            Some(class) => Lookup::Found(class),
            None => Lookup::NotFound,
        }
    }
}

/// Result of resolving one member.
#[derive(Debug)]
pub enum Resolution {
    Resolved(AttributeModel),
    /// The target is not visible yet; retry against the complete universe.
    Deferred { target: String, reason: String },
    Failed(ModelError),
}

/// Classifies members into attribute kinds.
pub struct TypeResolver<'u, 'a> {
    universe: &'u Universe<'a>,
}

impl<'u, 'a> TypeResolver<'u, 'a> {
    pub fn new(universe: &'u Universe<'a>) -> Self {
        Self { universe }
    }

    /// Classify `member` of `class`. The first matching rule wins: identifier,
    /// embedded, to-one, to-many on a keyed container, to-many, unmarked
    /// container, basic.
    pub fn resolve(&self, class: &ClassDecl, member: &MemberDecl) -> Resolution {
        let mut markers: Vec<Marker> = member
            .markers
            .iter()
            .copied()
            .filter(|marker| *marker != Marker::Transient)
            .collect();
        markers.sort();
        markers.dedup();
        if markers.len() > 1 {
            return Resolution::Failed(ModelError::ConflictingMarkers {
                class: class.qualified_name.clone(),
                member: member.name.clone(),
                markers,
            });
        }

        let declared = &member.declared_type;
        let peeled = declared.peel_wrappers();
        let container = peeled.container();
        let invalid = |reason: String| {
            Resolution::Failed(ModelError::InvalidMarker {
                class: class.qualified_name.clone(),
                member: Some(member.name.clone()),
                reason,
            })
        };
        let resolved = |ty: AttributeType| {
            Resolution::Resolved(AttributeModel {
                name: member.name.clone(),
                declared_type: declared.clone(),
                declared_in: class.qualified_name.clone(),
                ty,
            })
        };

        match markers.first().copied() {
            Some(Marker::Id) => {
                if class.kind == ClassKind::Embeddable {
                    return invalid("an embeddable has no identity, `id` is not allowed".to_string());
                }
                if container.is_some() {
                    return invalid(format!("`id` on container type `{declared}`"));
                }
                resolved(AttributeType::Identifier {
                    value: declared.strip_option().clone(),
                })
            }
            Some(Marker::Embedded) => {
                if container.is_some() {
                    return invalid(format!("`embedded` on container type `{declared}`"));
                }
                match self.target(class, member, peeled, ClassKind::Embeddable) {
                    Ok(model) => resolved(AttributeType::Embedded { model }),
                    Err(resolution) => resolution,
                }
            }
            Some(marker) if marker.is_to_one() => {
                if container.is_some() {
                    return invalid(format!(
                        "`{marker}` on container type `{declared}`, use `one_to_many` or `many_to_many`"
                    ));
                }
                match self.target(class, member, peeled, ClassKind::Entity) {
                    Ok(target) => resolved(AttributeType::ToOne { target }),
                    Err(resolution) => resolution,
                }
            }
            Some(marker) => {
                let Some(shape) = container else {
                    return invalid(format!("`{marker}` requires a container type, found `{declared}`"));
                };
                match self.target(class, member, shape.element.peel_wrappers(), ClassKind::Entity) {
                    Ok(target) => match shape.key {
                        Some(key) => resolved(AttributeType::KeyedCollection {
                            key: key.clone(),
                            target,
                        }),
                        None => resolved(AttributeType::ToMany {
                            target,
                            plural: shape.plural,
                        }),
                    },
                    Err(resolution) => resolution,
                }
            }
            None => match container {
                Some(shape) => resolved(AttributeType::Collection {
                    element: shape.element.clone(),
                    key: shape.key.cloned(),
                    plural: shape.plural,
                }),
                None => resolved(AttributeType::Basic {
                    value: declared.strip_option().clone(),
                }),
            },
        }
    }

    fn target(
        &self,
        class: &ClassDecl,
        member: &MemberDecl,
        ty: &TypeRef,
        expected: ClassKind,
    ) -> Result<QualifiedName, Resolution> {
        match self.universe.lookup(ty, class) {
            Lookup::Found(found) if found.kind == expected => Ok(found.qualified_name.clone()),
            Lookup::Found(found) => Err(Resolution::Failed(ModelError::UnresolvedReference {
                class: class.qualified_name.clone(),
                member: Some(member.name.clone()),
                target: ty.to_string(),
                reason: format!(
                    "`{}` is {}, expected {}",
                    found.qualified_name,
                    found.kind.with_article(),
                    expected.with_article()
                ),
            })),
            Lookup::NotFound => Err(Resolution::Deferred {
                target: ty.to_string(),
                reason: "no mapped class with that name".to_string(),
            }),
            Lookup::Ambiguous(candidates) => Err(Resolution::Deferred {
                target: ty.to_string(),
                reason: format!(
                    "ambiguous between {}",
                    candidates.iter().map(|c| format!("`{c}`")).collect::<Vec<_>>().join(", ")
                ),
            }),
        }
    }

    /// Warn when an unmarked basic attribute names a mapped class.
    pub fn lint_basic(&self, class: &ClassDecl, attribute: &AttributeModel) -> Option<Diagnostic> {
        let AttributeType::Basic { value } = &attribute.ty else {
            return None;
        };
        match self.universe.lookup(value.peel_wrappers(), class) {
            Lookup::Found(found) if found.kind != ClassKind::MappedSuperclass => Some(Diagnostic::warning(
                &class.qualified_name,
                Some(&attribute.name),
                format!(
                    "type `{value}` is {} (`{}`) but the member has no marker; defaults to basic",
                    found.kind.with_article(),
                    found.qualified_name
                ),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Import, Plural};

    fn ty(source: &str) -> TypeRef {
        TypeRef::parse(source).unwrap()
    }

    fn classes() -> Vec<ClassDecl> {
        vec![
            ClassDecl::new("crate::library::Book", ClassKind::Entity),
            ClassDecl::new("crate::people::Author", ClassKind::Entity),
            ClassDecl::new("crate::people::Address", ClassKind::Embeddable),
            ClassDecl::new("crate::shop::Tag", ClassKind::Entity),
            ClassDecl::new("crate::library::Tag", ClassKind::Entity),
        ]
    }

    fn resolve(universe: &Universe, class: &ClassDecl, member: MemberDecl) -> Resolution {
        TypeResolver::new(universe).resolve(class, &member)
    }

    fn resolved_type(resolution: Resolution) -> AttributeType {
        match resolution {
            Resolution::Resolved(attribute) => attribute.ty,
            other => panic!("expected a resolved attribute, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_rules() {
        let classes = classes();
        let universe = Universe::complete(&classes);
        let book = ClassDecl::new("crate::library::Book", ClassKind::Entity)
            .import(Import::new("crate::people::Author").with_alias("Writer"));

        let name_of = |lookup: Lookup| match lookup {
            Lookup::Found(class) => class.qualified_name.to_string(),
            other => format!("{other:?}"),
        };

        assert_eq!(name_of(universe.lookup(&ty("Writer"), &book)), "crate::people::Author");
        assert_eq!(name_of(universe.lookup(&ty("Tag"), &book)), "crate::library::Tag");
        assert_eq!(name_of(universe.lookup(&ty("Address"), &book)), "crate::people::Address");
        assert_eq!(name_of(universe.lookup(&ty("super::shop::Tag"), &book)), "crate::shop::Tag");
        assert_eq!(name_of(universe.lookup(&ty("people::Author"), &book)), "crate::people::Author");
        assert!(matches!(universe.lookup(&ty("Missing"), &book), Lookup::NotFound));

        let outsider = ClassDecl::new("crate::other::Report", ClassKind::Entity);
        assert!(matches!(universe.lookup(&ty("Tag"), &outsider), Lookup::Ambiguous(c) if c.len() == 2));
    }

    #[test]
    fn test_partial_universe_defers_fallbacks() {
        let classes = classes();
        let mut universe = Universe::partial();
        for class in &classes {
            universe.insert(class);
        }
        let book = &classes[0];
        assert!(matches!(universe.lookup(&ty("Author"), book), Lookup::NotFound));
        assert!(matches!(universe.lookup(&ty("Tag"), book), Lookup::Found(_)));
    }

    #[test]
    fn test_relative_path_resolves_from_declaring_module() {
        let classes = vec![
            ClassDecl::new("crate::library::Book", ClassKind::Entity),
            ClassDecl::new("crate::library::people::Author", ClassKind::Entity),
            ClassDecl::new("crate::people::Author", ClassKind::Entity),
        ];
        let universe = Universe::complete(&classes);
        let Lookup::Found(found) = universe.lookup(&ty("people::Author"), &classes[0]) else {
            panic!("relative path should resolve");
        };
        assert_eq!(found.qualified_name.as_str(), "crate::library::people::Author");
    }

    #[test]
    fn test_partial_universe_defers_glob_imports() {
        let classes = vec![
            ClassDecl::new("crate::b::Author", ClassKind::Entity),
            ClassDecl::new("crate::z::Sale", ClassKind::Entity).import(Import::new("crate::b::*")),
            ClassDecl::new("crate::z::Author", ClassKind::Entity),
        ];
        let mut partial = Universe::partial();
        partial.insert(&classes[0]);
        partial.insert(&classes[1]);
        assert!(matches!(partial.lookup(&ty("Author"), &classes[1]), Lookup::NotFound));

        let universe = Universe::complete(&classes);
        let Lookup::Found(found) = universe.lookup(&ty("Author"), &classes[1]) else {
            panic!("local class should resolve");
        };
        assert_eq!(found.qualified_name.as_str(), "crate::z::Author");

        let outsider = ClassDecl::new("crate::y::Report", ClassKind::Entity).import(Import::new("crate::b::*"));
        let Lookup::Found(found) = universe.lookup(&ty("Author"), &outsider) else {
            panic!("glob import should resolve");
        };
        assert_eq!(found.qualified_name.as_str(), "crate::b::Author");
    }

    #[test]
    fn test_resolution_order() {
        let classes = classes();
        let universe = Universe::complete(&classes);
        let author = &classes[1];

        assert_eq!(
            resolved_type(resolve(&universe, author, MemberDecl::new("id", ty("Option<i64>")).marked(Marker::Id))),
            AttributeType::Identifier { value: ty("i64") }
        );
        assert_eq!(
            resolved_type(resolve(
                &universe,
                author,
                MemberDecl::new("home", ty("Address")).marked(Marker::Embedded)
            )),
            AttributeType::Embedded {
                model: "crate::people::Address".into()
            }
        );
        assert_eq!(
            resolved_type(resolve(
                &universe,
                author,
                MemberDecl::new("favorite", ty("Option<Box<crate::library::Book>>")).marked(Marker::ManyToOne)
            )),
            AttributeType::ToOne {
                target: "crate::library::Book".into()
            }
        );
        assert_eq!(
            resolved_type(resolve(
                &universe,
                author,
                MemberDecl::new("books", ty("BTreeMap<String, crate::library::Book>")).marked(Marker::OneToMany)
            )),
            AttributeType::KeyedCollection {
                key: ty("String"),
                target: "crate::library::Book".into()
            }
        );
        assert_eq!(
            resolved_type(resolve(
                &universe,
                author,
                MemberDecl::new("tags", ty("HashSet<crate::shop::Tag>")).marked(Marker::ManyToMany)
            )),
            AttributeType::ToMany {
                target: "crate::shop::Tag".into(),
                plural: Plural::Set
            }
        );
        assert_eq!(
            resolved_type(resolve(&universe, author, MemberDecl::new("aliases", ty("Vec<String>")))),
            AttributeType::Collection {
                element: ty("String"),
                key: None,
                plural: Plural::List
            }
        );
        assert_eq!(
            resolved_type(resolve(&universe, author, MemberDecl::new("bio", ty("Option<String>")))),
            AttributeType::Basic { value: ty("String") }
        );
    }

    #[test]
    fn test_marker_misuse() {
        let classes = classes();
        let universe = Universe::complete(&classes);
        let author = &classes[1];
        let address = &classes[2];

        let conflicting = MemberDecl::new("home", ty("Address"))
            .marked(Marker::Embedded)
            .marked(Marker::ManyToOne);
        assert!(matches!(
            resolve(&universe, author, conflicting),
            Resolution::Failed(ModelError::ConflictingMarkers { .. })
        ));

        let to_many_scalar = MemberDecl::new("book", ty("crate::library::Book")).marked(Marker::OneToMany);
        assert!(matches!(
            resolve(&universe, author, to_many_scalar),
            Resolution::Failed(ModelError::InvalidMarker { .. })
        ));

        let id_in_embeddable = MemberDecl::new("id", ty("i64")).marked(Marker::Id);
        assert!(matches!(
            resolve(&universe, address, id_in_embeddable),
            Resolution::Failed(ModelError::InvalidMarker { .. })
        ));

        let wrong_kind = MemberDecl::new("home", ty("Address")).marked(Marker::ManyToOne);
        assert!(matches!(
            resolve(&universe, author, wrong_kind),
            Resolution::Failed(ModelError::UnresolvedReference { .. })
        ));

        let missing = MemberDecl::new("agent", ty("Agent")).marked(Marker::ManyToOne);
        assert!(matches!(resolve(&universe, author, missing), Resolution::Deferred { .. }));
    }

    #[test]
    fn test_lint_basic_mapped_type() {
        let classes = classes();
        let universe = Universe::complete(&classes);
        let author = &classes[1];
        let resolver = TypeResolver::new(&universe);

        let Resolution::Resolved(attribute) = resolver.resolve(author, &MemberDecl::new("home", ty("Address"))) else {
            panic!("unmarked member should resolve");
        };
        let warning = resolver.lint_basic(author, &attribute).unwrap();
        assert!(warning.message.contains("defaults to basic"));

        let Resolution::Resolved(attribute) = resolver.resolve(author, &MemberDecl::new("name", ty("String"))) else {
            panic!("unmarked member should resolve");
        };
        assert!(resolver.lint_basic(author, &attribute).is_none());
    }
}
