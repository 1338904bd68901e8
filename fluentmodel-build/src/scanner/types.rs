//! Declared type references as recorded by the scanner.

use quote::ToTokens;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use syn::visit::{self, Visit};
use syn::{GenericArgument, PathArguments, Type};

/// Smart pointers and optionality that are transparent to classification.
const WRAPPERS: &[&str] = &["Option", "Box", "Rc", "Arc"];
const ORDERED: &[&str] = &["Vec", "VecDeque", "LinkedList"];
const UNORDERED: &[&str] = &["HashSet", "BTreeSet", "IndexSet"];
const KEYED: &[&str] = &["HashMap", "BTreeMap", "IndexMap"];

/// A declared member or supertype, reduced to what resolution needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRef {
    /// A path type such as `Vec<Tag>` or `chrono::NaiveDate`. Generic
    /// arguments belong to the last segment.
    Path { segments: Vec<String>, args: Vec<TypeRef> },
    /// Anything else (references, tuples, arrays), kept as source text.
    Other(String),
}

/// Collection flavor of a container type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Plural {
    List,
    Set,
    Map,
}

/// A recognized container: its flavor, the element type and, for keyed
/// containers, the key type.
#[derive(Debug, Clone, Copy)]
pub struct ContainerShape<'a> {
    pub plural: Plural,
    pub key: Option<&'a TypeRef>,
    pub element: &'a TypeRef,
}

impl TypeRef {
    /// A single-segment type without arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Path {
            segments: vec![name.into()],
            args: Vec::new(),
        }
    }

    /// A `::`-separated path with the given generic arguments.
    pub fn path(path: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Path {
            segments: path.split("::").map(str::to_string).collect(),
            args,
        }
    }

    /// Parse a type from source text, e.g. `"Vec<Tag>"`.
    pub fn parse(source: &str) -> syn::Result<Self> {
        let ty: Type = syn::parse_str(source)?;
        Ok(Self::from_syn(&ty))
    }

    pub fn from_syn(ty: &Type) -> Self {
        match ty {
            Type::Paren(inner) => Self::from_syn(&inner.elem),
            Type::Group(inner) => Self::from_syn(&inner.elem),
            Type::Path(type_path) if type_path.qself.is_none() => {
                let path = &type_path.path;
                let last = path.segments.len().saturating_sub(1);
                let mut segments = Vec::with_capacity(path.segments.len());
                let mut args = Vec::new();
                for (index, segment) in path.segments.iter().enumerate() {
                    segments.push(segment.ident.to_string());
                    match &segment.arguments {
                        PathArguments::None => {}
                        PathArguments::AngleBracketed(angle) if index == last => {
                            for arg in &angle.args {
                                if let GenericArgument::Type(inner) = arg {
                                    args.push(Self::from_syn(inner));
                                }
                            }
                        }
                        _ => return TypeRef::Other(ty.to_token_stream().to_string()),
                    }
                }
                TypeRef::Path { segments, args }
            }
            _ => TypeRef::Other(ty.to_token_stream().to_string()),
        }
    }

    pub fn segments(&self) -> &[String] {
        match self {
            TypeRef::Path { segments, .. } => segments,
            TypeRef::Other(_) => &[],
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Path { args, .. } => args,
            TypeRef::Other(_) => &[],
        }
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments().last().map(String::as_str)
    }

    /// Remove `Option`, `Box`, `Rc` and `Arc` layers.
    pub fn peel_wrappers(&self) -> &TypeRef {
        let mut current = self;
        while let Some(name) = current.last_segment()
            && WRAPPERS.contains(&name)
            && current.args().len() == 1
        {
            current = &current.args()[0];
        }
        current
    }

    /// Remove only a top-level `Option`, keeping pointer types intact.
    pub fn strip_option(&self) -> &TypeRef {
        match self.last_segment() {
            Some("Option") if self.args().len() == 1 => &self.args()[0],
            _ => self,
        }
    }

    /// Classify this type as a container, if it is one.
    pub fn container(&self) -> Option<ContainerShape<'_>> {
        let name = self.last_segment()?;
        let args = self.args();
        if (ORDERED.contains(&name) || UNORDERED.contains(&name)) && args.len() == 1 {
            let plural = if ORDERED.contains(&name) { Plural::List } else { Plural::Set };
            return Some(ContainerShape {
                plural,
                key: None,
                element: &args[0],
            });
        }
        if KEYED.contains(&name) && args.len() >= 2 {
            return Some(ContainerShape {
                plural: Plural::Map,
                key: Some(&args[0]),
                element: &args[1],
            });
        }
        None
    }

    /// Replace type parameters by their bound arguments.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> TypeRef {
        match self {
            TypeRef::Path { segments, args } => {
                if segments.len() == 1
                    && args.is_empty()
                    && let Some(bound) = bindings.get(&segments[0])
                {
                    return bound.clone();
                }
                TypeRef::Path {
                    segments: segments.clone(),
                    args: args.iter().map(|arg| arg.substitute(bindings)).collect(),
                }
            }
            TypeRef::Other(text) => TypeRef::Other(text.clone()),
        }
    }

    /// Collect the first segment of every path this type names, including
    /// paths nested in tuples, arrays and references.
    pub fn collect_path_heads(&self, names: &mut BTreeSet<String>) {
        match self {
            TypeRef::Path { segments, args } => {
                if let Some(first) = segments.first() {
                    names.insert(first.clone());
                }
                for arg in args {
                    arg.collect_path_heads(names);
                }
            }
            TypeRef::Other(text) => {
                if let Ok(ty) = syn::parse_str::<Type>(text) {
                    PathHeads { names }.visit_type(&ty);
                }
            }
        }
    }
}

struct PathHeads<'n> {
    names: &'n mut BTreeSet<String>,
}

impl<'ast> Visit<'ast> for PathHeads<'_> {
    fn visit_path(&mut self, path: &'ast syn::Path) {
        if path.leading_colon.is_none()
            && let Some(first) = path.segments.first()
        {
            self.names.insert(first.ident.to_string());
        }
        visit::visit_path(self, path);
    }
}

/// Resolve a leading `self`, `super` or `crate` against the module that
/// contains the path. Other paths are returned unchanged.
pub fn absolutize_path(segments: &[String], module_path: &str) -> Vec<String> {
    let mut base: Vec<String> = module_path.split("::").map(str::to_string).collect();
    match segments.first().map(String::as_str) {
        Some("self") => {
            base.extend_from_slice(&segments[1..]);
            base
        }
        Some("super") => {
            let mut rest = segments;
            while rest.first().is_some_and(|s| s == "super") {
                if base.len() > 1 {
                    base.pop();
                }
                rest = &rest[1..];
            }
            base.extend_from_slice(rest);
            base
        }
        Some("crate") => {
            base.truncate(1);
            base.extend_from_slice(&segments[1..]);
            base
        }
        _ => segments.to_vec(),
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Path { segments, args } => {
                f.write_str(&segments.join("::"))?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Other(text) => f.write_str(text),
        }
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
