//! Renders entity models into fluent accessor modules.
//!
//! Output is a pure function of the model and the read-only batch view in
//! [`EmitScope`]: every collection walked here is ordered.

use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostic::Diagnostic;
use crate::error::GenerateError;
use crate::model::{AttributeModel, AttributeType, EntityModel, ModelSet};
use crate::names::{QualifiedName, accessor_name, embeddable_accessor_name, module_name, to_pascal_case, to_snake_case};
use crate::scanner::{Plural, TypeRef};

/// Marker line carried by every generated file; used to recognize stale
/// generated modules.
pub const GENERATED_MARKER: &str = "Generated by fluentmodel-build. Do not edit manually.";

/// File name of the index module.
pub const INDEX_FILE: &str = "mod.rs";

/// Module and accessor names of one generation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitName {
    pub module: String,
    pub accessor: String,
}

/// Read-only view of the batch while emitting: all models, and the names of
/// the generation roots.
pub struct EmitScope<'a> {
    models: &'a ModelSet,
    units: BTreeMap<QualifiedName, UnitName>,
}

impl<'a> EmitScope<'a> {
    /// Roots whose module names would clash are disambiguated by their
    /// module path, e.g. `crate::shop::Item` becomes `ShopItemModel` in
    /// `shop_item_model`. Clashes that remain get a numeric suffix.
    pub fn new(models: &'a ModelSet, roots: &BTreeSet<QualifiedName>) -> Self {
        let mut by_module: BTreeMap<String, usize> = BTreeMap::new();
        for root in roots {
            *by_module.entry(module_name(root.simple_name())).or_default() += 1;
        }

        let mut taken: BTreeSet<String> = BTreeSet::new();
        let mut units = BTreeMap::new();
        for root in roots {
            let stem = if by_module.get(&module_name(root.simple_name())).copied().unwrap_or(0) > 1 {
                disambiguated_name(root)
            } else {
                root.simple_name().to_string()
            };
            let mut base = stem.clone();
            let mut counter = 1;
            while taken.contains(&module_name(&base)) || taken.contains(&accessor_name(&base)) {
                counter += 1;
                base = format!("{stem}{counter}");
            }
            let unit = UnitName {
                module: module_name(&base),
                accessor: accessor_name(&base),
            };
            taken.insert(unit.module.clone());
            taken.insert(unit.accessor.clone());
            units.insert(root.clone(), unit);
        }

        Self { models, units }
    }

    pub fn unit(&self, name: &QualifiedName) -> Option<&UnitName> {
        self.units.get(name)
    }

    pub fn models(&self) -> &'a ModelSet {
        self.models
    }
}

/// `crate::shop::Item` -> `ShopItem`.
fn disambiguated_name(name: &QualifiedName) -> String {
    let mut base: String = name
        .module_path()
        .split("::")
        .skip(1)
        .map(to_pascal_case)
        .collect();
    base.push_str(name.simple_name());
    base
}

/// Source text of one generated module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub entity: QualifiedName,
    pub module: String,
    pub accessor: String,
    pub file_name: String,
    pub contents: String,
}

/// A generated unit plus the warnings raised while rendering it.
#[derive(Debug)]
pub struct Emission {
    pub unit: GeneratedUnit,
    pub diagnostics: Vec<Diagnostic>,
}

/// Render the accessor module for a generation root.
pub fn emit_unit(scope: &EmitScope<'_>, model: &EntityModel) -> Result<Emission, GenerateError> {
    let unit = scope.unit(&model.qualified_name).cloned().unwrap_or_else(|| UnitName {
        module: module_name(&model.simple_name),
        accessor: accessor_name(&model.simple_name),
    });

    let mut writer = UnitWriter {
        scope,
        root: model,
        diagnostics: Vec::new(),
        used_names: BTreeSet::new(),
        contributors: BTreeSet::from([model.qualified_name.clone()]),
        embeddables: BTreeMap::new(),
    };
    writer.name_embeddables();

    let accessor = format_ident!("{}", unit.accessor);
    let entity_path = path_tokens(model.qualified_name.as_str());
    let entity_name = &model.simple_name;

    let methods = writer.attribute_methods(model)?;
    let treats = writer.treat_methods(model);
    let embeddable_items = writer.embeddable_items()?;
    let uses = writer.use_items();

    let title = format!(" Fluent metamodel for [`{}`].", model.qualified_name);
    let marker = format!(" {GENERATED_MARKER}");
    let accessor_doc = format!(" Fluent accessor for [`{entity_name}`]({}).", model.qualified_name);

    let tokens = quote! {
        #![doc = #title]
        #![doc = ""]
        #![doc = #marker]
        #![allow(unused_imports, dead_code)]

        #(#uses)*

        #[doc = #accessor_doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct #accessor {
            path: ::fluentmodel::Path,
        }

        impl ::fluentmodel::Navigable for #accessor {
            fn at(path: ::fluentmodel::Path) -> Self {
                Self { path }
            }

            fn path(&self) -> &::fluentmodel::Path {
                &self.path
            }
        }

        impl ::fluentmodel::EntityRoot for #accessor {
            type Entity = #entity_path;
            const ENTITY: &'static str = #entity_name;
        }

        impl #entity_path {
            /// Start a fluent navigation rooted at this entity.
            pub fn model() -> #accessor {
                <#accessor as ::fluentmodel::EntityRoot>::root()
            }
        }

        impl #accessor {
            #(#methods)*
            #(#treats)*
        }

        #(#embeddable_items)*
    };

    let contents = render(&unit.module, tokens)?;
    Ok(Emission {
        unit: GeneratedUnit {
            entity: model.qualified_name.clone(),
            file_name: format!("{}.rs", unit.module),
            module: unit.module,
            accessor: unit.accessor,
            contents,
        },
        diagnostics: writer.diagnostics,
    })
}

/// Render the `mod.rs` index listing every unit.
pub fn emit_index(units: &[GeneratedUnit]) -> String {
    let mut sorted: Vec<&GeneratedUnit> = units.iter().collect();
    sorted.sort_by(|a, b| a.module.cmp(&b.module));

    let mut index = format!("//! Fluent metamodel accessors.\n//!\n//! {GENERATED_MARKER}\n");
    if !sorted.is_empty() {
        index.push('\n');
    }
    for unit in &sorted {
        index.push_str(&format!("pub mod {};\n", unit.module));
    }
    if !sorted.is_empty() {
        index.push('\n');
    }
    for unit in &sorted {
        index.push_str(&format!("pub use {}::{};\n", unit.module, unit.accessor));
    }
    index
}

fn render(module: &str, tokens: TokenStream) -> Result<String, GenerateError> {
    let file: syn::File = syn::parse2(tokens).map_err(|source| GenerateError::Render {
        module: module.to_string(),
        source,
    })?;
    Ok(prettyplease::unparse(&file))
}

struct UnitWriter<'s, 'a> {
    scope: &'s EmitScope<'a>,
    root: &'s EntityModel,
    diagnostics: Vec<Diagnostic>,
    /// First path segment of every type written into the unit.
    used_names: BTreeSet<String>,
    /// Classes whose declarations contributed types to the unit.
    contributors: BTreeSet<QualifiedName>,
    embeddables: BTreeMap<QualifiedName, Ident>,
}

impl<'s, 'a> UnitWriter<'s, 'a> {
    fn name_embeddables(&mut self) {
        let reached = self.scope.models().reachable_embeddables(self.root);
        let mut by_simple: BTreeMap<&str, usize> = BTreeMap::new();
        for name in &reached {
            *by_simple.entry(name.simple_name()).or_default() += 1;
        }
        for name in &reached {
            let base = if by_simple.get(name.simple_name()).copied().unwrap_or(0) > 1 {
                disambiguated_name(name)
            } else {
                name.simple_name().to_string()
            };
            self.embeddables
                .insert(name.clone(), format_ident!("{}", embeddable_accessor_name(&base)));
        }
    }

    fn attribute_methods(&mut self, owner: &EntityModel) -> Result<Vec<TokenStream>, GenerateError> {
        owner
            .attributes
            .iter()
            .map(|attribute| {
                self.contributors.insert(attribute.declared_in.clone());
                self.attribute_method(owner, attribute)
            })
            .collect()
    }

    fn attribute_method(&mut self, owner: &EntityModel, attribute: &AttributeModel) -> Result<TokenStream, GenerateError> {
        let method = method_ident(&attribute.name);
        let name = attribute.name.as_str();
        let doc = format!(" `{name}` ({}).", attribute.kind());

        let method = match &attribute.ty {
            AttributeType::Identifier { value } | AttributeType::Basic { value } => {
                let value = self.render_type(owner, attribute, value)?;
                quote! {
                    #[doc = #doc]
                    pub fn #method(&self) -> ::fluentmodel::Attribute<#value> {
                        ::fluentmodel::Attribute::new(self.path.get(#name))
                    }
                }
            }
            AttributeType::Embedded { model } => match self.embeddables.get(model).cloned() {
                Some(embedded) => quote! {
                    #[doc = #doc]
                    pub fn #method(&self) -> #embedded {
                        <#embedded as ::fluentmodel::Navigable>::at(self.path.get(#name))
                    }
                },
                None => self.degraded(owner, attribute, model)?,
            },
            AttributeType::ToOne { target } => match self.scope.unit(target) {
                Some(unit) => {
                    let accessor = unit_type(unit);
                    quote! {
                        #[doc = #doc]
                        pub fn #method(&self) -> #accessor {
                            <#accessor as ::fluentmodel::Navigable>::at(self.path.get(#name))
                        }
                    }
                }
                None => self.degraded(owner, attribute, target)?,
            },
            AttributeType::ToMany { target, plural } => {
                let element = self.target_element(owner, attribute, target)?;
                let plural = plural_tokens(*plural);
                quote! {
                    #[doc = #doc]
                    pub fn #method(&self) -> ::fluentmodel::Join<#element> {
                        ::fluentmodel::Join::new(self.path.clone(), #name, #plural)
                    }
                }
            }
            AttributeType::Collection { element, key, plural } => {
                let element = self.render_type(owner, attribute, element)?;
                match key {
                    Some(key) => {
                        let key = self.render_type(owner, attribute, key)?;
                        quote! {
                            #[doc = #doc]
                            pub fn #method(&self) -> ::fluentmodel::MapJoin<#key, ::fluentmodel::Attribute<#element>> {
                                ::fluentmodel::MapJoin::new(self.path.clone(), #name)
                            }
                        }
                    }
                    None => {
                        let plural = plural_tokens(*plural);
                        quote! {
                            #[doc = #doc]
                            pub fn #method(&self) -> ::fluentmodel::Join<::fluentmodel::Attribute<#element>> {
                                ::fluentmodel::Join::new(self.path.clone(), #name, #plural)
                            }
                        }
                    }
                }
            }
            AttributeType::KeyedCollection { key, target } => {
                let key = self.render_type(owner, attribute, key)?;
                let element = self.target_element(owner, attribute, target)?;
                quote! {
                    #[doc = #doc]
                    pub fn #method(&self) -> ::fluentmodel::MapJoin<#key, #element> {
                        ::fluentmodel::MapJoin::new(self.path.clone(), #name)
                    }
                }
            }
        };
        Ok(method)
    }

    /// Element accessor of a to-many or keyed association.
    fn target_element(
        &mut self,
        owner: &EntityModel,
        attribute: &AttributeModel,
        target: &QualifiedName,
    ) -> Result<TokenStream, GenerateError> {
        if let Some(unit) = self.scope.unit(target) {
            return Ok(unit_type(unit));
        }
        self.warn_degraded(owner, attribute, target);
        let element = self.render_type(owner, attribute, declared_target(&attribute.declared_type))?;
        Ok(quote!(::fluentmodel::Attribute<#element>))
    }

    /// Leaf attribute for an association or embedding whose target has no
    /// accessor of its own.
    fn degraded(
        &mut self,
        owner: &EntityModel,
        attribute: &AttributeModel,
        target: &QualifiedName,
    ) -> Result<TokenStream, GenerateError> {
        self.warn_degraded(owner, attribute, target);
        let method = method_ident(&attribute.name);
        let name = attribute.name.as_str();
        let doc = format!(" `{name}` ({}, no accessor for `{target}`).", attribute.kind());
        let value = self.render_type(owner, attribute, declared_target(&attribute.declared_type))?;
        Ok(quote! {
            #[doc = #doc]
            pub fn #method(&self) -> ::fluentmodel::Attribute<#value> {
                ::fluentmodel::Attribute::new(self.path.get(#name))
            }
        })
    }

    fn warn_degraded(&mut self, owner: &EntityModel, attribute: &AttributeModel, target: &QualifiedName) {
        self.diagnostics.push(Diagnostic::warning(
            &owner.qualified_name,
            Some(&attribute.name),
            format!("`{target}` has no generated accessor; navigation stops at a leaf attribute"),
        ));
    }

    fn treat_methods(&mut self, model: &EntityModel) -> Vec<TokenStream> {
        let mut methods = Vec::new();
        for descendant in &model.descendants {
            let Some(unit) = self.scope.unit(descendant) else {
                continue;
            };
            let name = format!("as_{}", to_snake_case(descendant.simple_name()));
            if model.attribute(&name).is_some() {
                self.diagnostics.push(Diagnostic::warning(
                    &model.qualified_name,
                    Some(&name),
                    format!("attribute shadows the downcast to `{descendant}`; downcast not generated"),
                ));
                continue;
            }
            let method = method_ident(&name);
            let accessor = unit_type(unit);
            let entity = descendant.simple_name();
            let doc = format!(" Downcast to [`{entity}`]({descendant}).");
            methods.push(quote! {
                #[doc = #doc]
                pub fn #method(&self) -> #accessor {
                    <#accessor as ::fluentmodel::Navigable>::at(self.path.treat(#entity))
                }
            });
        }
        methods
    }

    fn embeddable_items(&mut self) -> Result<Vec<TokenStream>, GenerateError> {
        let embeddables: Vec<(QualifiedName, Ident)> =
            self.embeddables.iter().map(|(name, ident)| (name.clone(), ident.clone())).collect();

        let mut items = Vec::with_capacity(embeddables.len());
        for (name, ident) in embeddables {
            let Some(model) = self.scope.models().get(&name) else {
                continue;
            };
            self.contributors.insert(name.clone());
            let methods = self.attribute_methods(model)?;
            let doc = format!(" Fluent accessor for the embedded [`{}`]({name}) value.", model.simple_name);
            items.push(quote! {
                #[doc = #doc]
                #[derive(Debug, Clone, PartialEq, Eq, Hash)]
                pub struct #ident {
                    path: ::fluentmodel::Path,
                }

                impl ::fluentmodel::Navigable for #ident {
                    fn at(path: ::fluentmodel::Path) -> Self {
                        Self { path }
                    }

                    fn path(&self) -> &::fluentmodel::Path {
                        &self.path
                    }
                }

                impl #ident {
                    #(#methods)*
                }
            });
        }
        Ok(items)
    }

    fn render_type(&mut self, owner: &EntityModel, attribute: &AttributeModel, ty: &TypeRef) -> Result<syn::Type, GenerateError> {
        ty.collect_path_heads(&mut self.used_names);
        syn::parse_str(&ty.to_string()).map_err(|source| GenerateError::InvalidType {
            class: owner.qualified_name.clone(),
            member: attribute.name.clone(),
            ty: ty.to_string(),
            source,
        })
    }

    /// `use` items: a glob of every contributing module, plus the
    /// contributors' own imports that bind a name the unit mentions.
    fn use_items(&self) -> Vec<TokenStream> {
        let mut trees: BTreeSet<String> = BTreeSet::new();
        let mut bound: BTreeMap<String, String> = BTreeMap::new();

        for contributor in &self.contributors {
            let module = contributor.module_path();
            if !module.is_empty() {
                trees.insert(format!("{module}::*"));
            }
            let Some(model) = self.scope.models().get(contributor) else {
                continue;
            };
            for import in &model.imports {
                match import.binding() {
                    None if import.is_glob() => {
                        trees.insert(import.to_use_tree());
                    }
                    Some(binding) if self.used_names.contains(binding) => {
                        bound.entry(binding.to_string()).or_insert_with(|| import.to_use_tree());
                    }
                    _ => {}
                }
            }
        }
        trees.extend(bound.into_values());

        trees
            .iter()
            .filter_map(|tree| syn::parse_str::<syn::UseTree>(tree).ok())
            .map(|tree| quote!(use #tree;))
            .collect()
    }
}

/// Method identifier for an attribute name, raw when it is a keyword.
fn method_ident(name: &str) -> Ident {
    syn::parse_str::<Ident>(name).unwrap_or_else(|_| Ident::new_raw(name, Span::call_site()))
}

fn path_tokens(path: &str) -> TokenStream {
    let segments = path.split("::").map(|segment| match segment {
        "crate" | "self" | "super" => Ident::new(segment, Span::call_site()),
        other => method_ident(other),
    });
    quote!(#(#segments)::*)
}

/// `super::book_model::BookModel`
fn unit_type(unit: &UnitName) -> TokenStream {
    let module = format_ident!("{}", unit.module);
    let accessor = format_ident!("{}", unit.accessor);
    quote!(super::#module::#accessor)
}

fn plural_tokens(plural: Plural) -> TokenStream {
    match plural {
        Plural::List => quote!(::fluentmodel::Plural::List),
        Plural::Set => quote!(::fluentmodel::Plural::Set),
        Plural::Map => quote!(::fluentmodel::Plural::Map),
    }
}

/// The entity or value type named by a declared member type, looking through
/// wrappers and, for containers, taking the element.
fn declared_target(declared: &TypeRef) -> &TypeRef {
    let peeled = declared.peel_wrappers();
    match peeled.container() {
        Some(shape) => shape.element.peel_wrappers(),
        None => peeled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_models;
    use crate::scanner::{ClassDecl, ClassKind, Import, Marker, MemberDecl};

    fn ty(source: &str) -> TypeRef {
        TypeRef::parse(source).unwrap()
    }

    /// Return type of `method` in the inherent impl of `self_ty`, with
    /// whitespace and trailing commas removed.
    fn return_type(code: &str, self_ty: &str, method: &str) -> String {
        use quote::ToTokens;
        use syn::ext::IdentExt;

        let file = syn::parse_file(code).unwrap();
        for item in file.items {
            let syn::Item::Impl(item_impl) = item else { continue };
            if item_impl.trait_.is_some() || item_impl.self_ty.to_token_stream().to_string().replace(' ', "") != self_ty {
                continue;
            }
            for impl_item in item_impl.items {
                if let syn::ImplItem::Fn(function) = impl_item
                    && function.sig.ident.unraw() == method
                {
                    return function
                        .sig
                        .output
                        .to_token_stream()
                        .to_string()
                        .replace(' ', "")
                        .replace(",>", ">");
                }
            }
        }
        panic!("no method {self_ty}::{method} in generated code:\n{code}");
    }

    fn emit(classes: &[ClassDecl], root: &str) -> Emission {
        let output = build_models(classes);
        assert!(output.failed.is_empty(), "{:?}", output.diagnostics);
        let roots: BTreeSet<QualifiedName> = output
            .models
            .iter()
            .filter(|model| model.kind == ClassKind::Entity && !model.skip)
            .map(|model| model.qualified_name.clone())
            .collect();
        let scope = EmitScope::new(&output.models, &roots);
        let model = output.models.get(&root.into()).unwrap();
        emit_unit(&scope, model).unwrap()
    }

    #[test]
    fn test_method_ident_escapes_keywords() {
        assert_eq!(method_ident("title").to_string(), "title");
        assert_eq!(method_ident("type").to_string(), "r#type");
    }

    #[test]
    fn test_duplicate_simple_names_are_disambiguated() {
        let models = ModelSet::new();
        let roots = BTreeSet::from([
            QualifiedName::new("crate::shop::Item"),
            QualifiedName::new("crate::warehouse::Item"),
            QualifiedName::new("crate::Book"),
        ]);
        let scope = EmitScope::new(&models, &roots);
        assert_eq!(
            scope.unit(&"crate::shop::Item".into()).unwrap(),
            &UnitName {
                module: "shop_item_model".into(),
                accessor: "ShopItemModel".into()
            }
        );
        assert_eq!(scope.unit(&"crate::Book".into()).unwrap().accessor, "BookModel");
    }

    #[test]
    fn test_names_differing_only_in_case_get_distinct_modules() {
        let models = ModelSet::new();
        let roots = BTreeSet::from([
            QualifiedName::new("crate::api::HTTPRequest"),
            QualifiedName::new("crate::net::HttpRequest"),
            QualifiedName::new("crate::x::Dup"),
            QualifiedName::new("crate::X::Dup"),
        ]);
        let scope = EmitScope::new(&models, &roots);
        let module = |name: &str| scope.unit(&name.into()).unwrap().module.clone();

        assert_eq!(module("crate::api::HTTPRequest"), "api_http_request_model");
        assert_eq!(module("crate::net::HttpRequest"), "net_http_request_model");
        assert_eq!(module("crate::X::Dup"), "x_dup_model");
        assert_eq!(module("crate::x::Dup"), "x_dup2_model");
    }

    #[test]
    fn test_keeps_imports_of_types_inside_tuples() {
        let classes = vec![
            ClassDecl::new("crate::domain::Slot", ClassKind::Entity)
                .import(Import::new("std::time::Duration"))
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id))
                .member(MemberDecl::new("window", ty("(Duration, Duration)"))),
        ];
        let emission = emit(&classes, "crate::domain::Slot");
        let code = &emission.unit.contents;

        assert_eq!(
            return_type(code, "SlotModel", "window"),
            "->::fluentmodel::Attribute<(Duration,Duration)>"
        );
        assert!(code.contains("use std::time::Duration;"));
    }

    #[test]
    fn test_emits_accessor_with_navigation() {
        let classes = vec![
            ClassDecl::new("crate::library::Book", ClassKind::Entity)
                .import(Import::new("chrono::NaiveDate"))
                .import(Import::new("std::collections::HashMap"))
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id))
                .member(MemberDecl::new("type", ty("String")))
                .member(MemberDecl::new("published", ty("Option<NaiveDate>")))
                .member(MemberDecl::new("author", ty("crate::people::Author")).marked(Marker::ManyToOne))
                .member(MemberDecl::new("tags", ty("Vec<crate::people::Tag>")).marked(Marker::ManyToMany)),
            ClassDecl::new("crate::people::Author", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id)),
            ClassDecl::new("crate::people::Tag", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id)),
        ];
        let emission = emit(&classes, "crate::library::Book");
        let code = &emission.unit.contents;

        assert_eq!(emission.unit.file_name, "book_model.rs");
        assert!(emission.diagnostics.is_empty());
        assert!(code.contains(GENERATED_MARKER));
        assert!(code.contains("pub struct BookModel"));
        assert!(code.contains("impl crate::library::Book"));
        assert_eq!(return_type(code, "BookModel", "type"), "->::fluentmodel::Attribute<String>");
        assert_eq!(return_type(code, "BookModel", "published"), "->::fluentmodel::Attribute<NaiveDate>");
        assert_eq!(return_type(code, "BookModel", "author"), "->super::author_model::AuthorModel");
        assert_eq!(
            return_type(code, "BookModel", "tags"),
            "->::fluentmodel::Join<super::tag_model::TagModel>"
        );
        assert_eq!(
            return_type(code, "crate::library::Book", "model"),
            "->BookModel"
        );
        assert!(code.contains("use chrono::NaiveDate;"));
        assert!(code.contains("use crate::library::*;"));
        assert!(!code.contains("use std::collections::HashMap;"));
    }

    #[test]
    fn test_embeddables_are_inlined() {
        let classes = vec![
            ClassDecl::new("crate::Person", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id))
                .member(MemberDecl::new("address", ty("Address")).marked(Marker::Embedded)),
            ClassDecl::new("crate::Address", ClassKind::Embeddable)
                .member(MemberDecl::new("street", ty("String")))
                .member(MemberDecl::new("zip", ty("ZipCode")).marked(Marker::Embedded)),
            ClassDecl::new("crate::ZipCode", ClassKind::Embeddable).member(MemberDecl::new("code", ty("String"))),
        ];
        let emission = emit(&classes, "crate::Person");
        let code = &emission.unit.contents;

        assert_eq!(return_type(code, "PersonModel", "address"), "->AddressPath");
        assert!(code.contains("pub struct AddressPath"));
        assert_eq!(return_type(code, "AddressPath", "zip"), "->ZipCodePath");
        assert!(code.contains("pub struct ZipCodePath"));
        assert_eq!(return_type(code, "AddressPath", "street"), "->::fluentmodel::Attribute<String>");
        assert_eq!(return_type(code, "ZipCodePath", "code"), "->::fluentmodel::Attribute<String>");
    }

    #[test]
    fn test_skipped_target_degrades_to_attribute() {
        let classes = vec![
            ClassDecl::new("crate::Order", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id))
                .member(MemberDecl::new("customer", ty("Customer")).marked(Marker::ManyToOne))
                .member(MemberDecl::new("lines", ty("Vec<Customer>")).marked(Marker::OneToMany)),
            ClassDecl::new("crate::Customer", ClassKind::Entity)
                .skipped()
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id)),
        ];
        let emission = emit(&classes, "crate::Order");
        let code = &emission.unit.contents;

        assert_eq!(return_type(code, "OrderModel", "customer"), "->::fluentmodel::Attribute<Customer>");
        assert_eq!(
            return_type(code, "OrderModel", "lines"),
            "->::fluentmodel::Join<::fluentmodel::Attribute<Customer>>"
        );
        assert_eq!(emission.diagnostics.len(), 2);
    }

    #[test]
    fn test_keyed_collections_and_downcasts() {
        let classes = vec![
            ClassDecl::new("crate::Publication", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id))
                .member(MemberDecl::new("chapters", ty("BTreeMap<u32, Chapter>")).marked(Marker::OneToMany))
                .member(MemberDecl::new("labels", ty("HashMap<String, String>"))),
            ClassDecl::new("crate::Chapter", ClassKind::Entity)
                .member(MemberDecl::new("id", ty("i64")).marked(Marker::Id)),
            ClassDecl::new("crate::EBook", ClassKind::Entity).extends(ty("Publication")),
        ];
        let emission = emit(&classes, "crate::Publication");
        let code = &emission.unit.contents;

        assert_eq!(
            return_type(code, "PublicationModel", "chapters"),
            "->::fluentmodel::MapJoin<u32,super::chapter_model::ChapterModel>"
        );
        assert_eq!(
            return_type(code, "PublicationModel", "labels"),
            "->::fluentmodel::MapJoin<String,::fluentmodel::Attribute<String>>"
        );
        assert_eq!(
            return_type(code, "PublicationModel", "as_e_book"),
            "->super::e_book_model::EBookModel"
        );
    }

    #[test]
    fn test_emit_index() {
        let unit = |module: &str, accessor: &str| GeneratedUnit {
            entity: QualifiedName::new("crate::X"),
            module: module.into(),
            accessor: accessor.into(),
            file_name: format!("{module}.rs"),
            contents: String::new(),
        };
        let index = emit_index(&[unit("tag_model", "TagModel"), unit("book_model", "BookModel")]);
        assert_eq!(
            index,
            format!(
                "//! Fluent metamodel accessors.\n//!\n//! {GENERATED_MARKER}\n\npub mod book_model;\npub mod tag_model;\n\npub use book_model::BookModel;\npub use tag_model::TagModel;\n"
            )
        );
    }
}
