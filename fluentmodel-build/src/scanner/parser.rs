//! Source parser using syn to extract mapped class declarations.

use proc_macro2::TokenStream;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{Attribute, Fields, Item, ItemStruct, LitStr, Token, Type, UseTree};

use super::ScanOutput;
use super::decl::{ClassDecl, ClassKind, Import, Marker, MemberDecl};
use super::types::{TypeRef, absolutize_path};
use crate::diagnostic::Diagnostic;
use crate::names::QualifiedName;

/// Parse one source file and append every mapped class it declares.
///
/// `module_path` is the path of the file's module, e.g. `crate::library`.
pub fn parse_source(content: &str, module_path: &str, source_file: &str, output: &mut ScanOutput) -> syn::Result<()> {
    let file = syn::parse_file(content)?;
    collect_items(&file.items, module_path, source_file, output);
    Ok(())
}

fn collect_items(items: &[Item], module_path: &str, source_file: &str, output: &mut ScanOutput) {
    let imports = collect_imports(items, module_path);

    for item in items {
        match item {
            Item::Struct(item_struct) => {
                if let Some(kind) = mapped_kind(&item_struct.attrs)
                    && let Some(class) = parse_struct(item_struct, kind, module_path, &imports, source_file, output)
                {
                    output.classes.push(class);
                }
            }
            Item::Mod(item_mod) if !is_cfg_test(&item_mod.attrs) => {
                if let Some((_, nested)) = &item_mod.content {
                    let nested_path = format!("{module_path}::{}", item_mod.ident.unraw());
                    collect_items(nested, &nested_path, source_file, output);
                }
            }
            _ => {}
        }
    }
}

/// Which mapped-class derive a struct carries, if any.
///
/// Accepts the bare derive name and the `fluentmodel::`-qualified form.
pub(crate) fn mapped_kind(attrs: &[Attribute]) -> Option<ClassKind> {
    for attr in attrs {
        if attr.path().is_ident("derive")
            && let Ok(nested) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
        {
            for path in nested {
                let qualified_ok = path.segments.len() == 1
                    || path.segments.first().is_some_and(|segment| segment.ident == "fluentmodel");
                if qualified_ok
                    && let Some(last) = path.segments.last()
                    && let Some(kind) = ClassKind::from_derive(&last.ident.to_string())
                {
                    return Some(kind);
                }
            }
        }
    }
    None
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && attr
                .meta
                .require_list()
                .is_ok_and(|list| list.tokens.to_string() == "test")
    })
}

fn parse_struct(
    item: &ItemStruct,
    kind: ClassKind,
    module_path: &str,
    imports: &[Import],
    source_file: &str,
    output: &mut ScanOutput,
) -> Option<ClassDecl> {
    let qualified_name = QualifiedName::join(module_path, &item.ident.unraw().to_string());

    let Fields::Named(fields) = &item.fields else {
        output.diagnostics.push(Diagnostic::warning(
            &qualified_name,
            None,
            format!("mapped {kind} must have named fields; skipped"),
        ));
        return None;
    };

    let mut class = ClassDecl::new(qualified_name, kind);
    class.source_file = source_file.to_string();
    class.imports = imports.to_vec();
    class.type_params = item.generics.type_params().map(|param| param.ident.to_string()).collect();
    parse_class_attrs(&item.attrs, &mut class, &mut output.diagnostics);

    for field in &fields.named {
        let Some(ident) = &field.ident else { continue };
        let name = ident.unraw().to_string();
        let markers = parse_member_markers(&field.attrs, &class.qualified_name, &name, &mut output.diagnostics);
        if markers.contains(&Marker::Transient) {
            continue;
        }
        let mut member = MemberDecl::new(name, TypeRef::from_syn(&field.ty));
        member.markers = markers;
        class.members.push(member);
    }

    Some(class)
}

/// Parse class-level `#[fluent(extends = Type, skip)]`.
fn parse_class_attrs(attrs: &[Attribute], class: &mut ClassDecl, diagnostics: &mut Vec<Diagnostic>) {
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("fluent")) {
        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("extends") {
                let value = meta.value()?;
                let ty: Type = if value.peek(LitStr) {
                    value.parse::<LitStr>()?.parse()?
                } else {
                    value.parse()?
                };
                class.supertype = Some(TypeRef::from_syn(&ty));
                return Ok(());
            }

            if meta.path.is_ident("skip") {
                class.skip = true;
                return Ok(());
            }

            Err(meta.error("unsupported class attribute, expected `extends = Type` or `skip`"))
        });

        if let Err(err) = result {
            diagnostics.push(Diagnostic::warning(
                &class.qualified_name,
                None,
                format!("ignoring `#[fluent]` attribute: {err}"),
            ));
        }
    }
}

/// Parse member-level `#[fluent(...)]` markers. Unknown words are reported and
/// otherwise ignored.
fn parse_member_markers(
    attrs: &[Attribute],
    class: &QualifiedName,
    member: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Marker> {
    let mut markers = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("fluent")) {
        let result = attr.parse_nested_meta(|meta| {
            let word = meta
                .path
                .get_ident()
                .map(|ident| ident.unraw().to_string())
                .unwrap_or_default();
            match Marker::from_keyword(&word) {
                Some(marker) => {
                    if !markers.contains(&marker) {
                        markers.push(marker);
                    }
                }
                None => diagnostics.push(Diagnostic::warning(
                    class,
                    Some(member),
                    format!("unknown marker `{}`", path_text(&meta.path)),
                )),
            }
            skip_meta_value(&meta)
        });

        if let Err(err) = result {
            diagnostics.push(Diagnostic::warning(
                class,
                Some(member),
                format!("ignoring malformed `#[fluent]` attribute: {err}"),
            ));
        }
    }
    markers
}

/// Consume `= value` or `(...)` after a marker word.
fn skip_meta_value(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<TokenStream>()?;
    }
    Ok(())
}

fn path_text(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| segment.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

fn collect_imports(items: &[Item], module_path: &str) -> Vec<Import> {
    let mut imports = Vec::new();
    for item in items {
        if let Item::Use(item_use) = item {
            flatten_use_tree(&item_use.tree, &mut Vec::new(), module_path, &mut imports);
        }
    }
    imports
}

fn flatten_use_tree(tree: &UseTree, prefix: &mut Vec<String>, module_path: &str, imports: &mut Vec<Import>) {
    match tree {
        UseTree::Path(use_path) => {
            prefix.push(use_path.ident.unraw().to_string());
            flatten_use_tree(&use_path.tree, prefix, module_path, imports);
            prefix.pop();
        }
        UseTree::Name(use_name) => {
            let path = joined(prefix, &use_name.ident);
            imports.push(Import {
                path: absolutize_path(&path, module_path),
                alias: None,
            });
        }
        UseTree::Rename(rename) => {
            let path = joined(prefix, &rename.ident);
            imports.push(Import {
                path: absolutize_path(&path, module_path),
                alias: Some(rename.rename.unraw().to_string()),
            });
        }
        UseTree::Glob(_) => {
            let mut path = absolutize_path(prefix, module_path);
            path.push("*".to_string());
            imports.push(Import { path, alias: None });
        }
        UseTree::Group(group) => {
            for nested in &group.items {
                flatten_use_tree(nested, prefix, module_path, imports);
            }
        }
    }
}

/// `prefix::ident`, where `{self}` in a group names the prefix itself.
fn joined(prefix: &[String], ident: &syn::Ident) -> Vec<String> {
    let mut path = prefix.to_vec();
    if ident != "self" || prefix.is_empty() {
        path.push(ident.unraw().to_string());
    }
    path
}
