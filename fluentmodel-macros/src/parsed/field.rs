use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Error, Field, Ident, Result, Type};

use super::type_text;

/// Field markers, one keyword each inside `#[fluent(...)]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldMarker {
    Id,
    Embedded,
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
    Transient,
}

impl FieldMarker {
    const KEYWORDS: &'static [(&'static str, FieldMarker)] = &[
        ("id", FieldMarker::Id),
        ("embedded", FieldMarker::Embedded),
        ("one_to_one", FieldMarker::OneToOne),
        ("many_to_one", FieldMarker::ManyToOne),
        ("one_to_many", FieldMarker::OneToMany),
        ("many_to_many", FieldMarker::ManyToMany),
        ("transient", FieldMarker::Transient),
    ];

    fn from_ident(ident: &Ident) -> Option<Self> {
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| ident == keyword)
            .map(|(_, marker)| *marker)
    }

    fn expected() -> String {
        Self::KEYWORDS
            .iter()
            .map(|(keyword, _)| format!("`{keyword}`"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn to_tokens(self) -> Option<TokenStream2> {
        let variant = match self {
            FieldMarker::Id => quote!(Id),
            FieldMarker::Embedded => quote!(Embedded),
            FieldMarker::OneToOne => quote!(OneToOne),
            FieldMarker::ManyToOne => quote!(ManyToOne),
            FieldMarker::OneToMany => quote!(OneToMany),
            FieldMarker::ManyToMany => quote!(ManyToMany),
            FieldMarker::Transient => return None,
        };
        Some(quote!(::fluentmodel::MemberMarker::#variant))
    }
}

pub(crate) struct ParsedField {
    name: String,
    ty: Type,
    markers: Vec<FieldMarker>,
}

impl ParsedField {
    pub(crate) fn from_field(field: &Field, derive: &str) -> Result<Self> {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), format!("{derive} requires named fields")))?;

        let mut markers = Vec::new();
        for attr in &field.attrs {
            if !attr.path().is_ident("fluent") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let Some(ident) = meta.path.get_ident() else {
                    return Err(meta.error(format!("expected one of {}", FieldMarker::expected())));
                };
                let Some(marker) = FieldMarker::from_ident(ident) else {
                    return Err(meta.error(format!(
                        "unknown fluent marker `{ident}`, expected one of {}",
                        FieldMarker::expected()
                    )));
                };
                if !meta.input.is_empty() && !meta.input.peek(syn::Token![,]) {
                    return Err(meta.error(format!("`{ident}` takes no arguments")));
                }
                if markers.contains(&marker) {
                    return Err(meta.error(format!("duplicate fluent marker `{ident}`")));
                }
                markers.push(marker);
                Ok(())
            })?;
        }

        Ok(Self {
            name: ident.unraw().to_string(),
            ty: field.ty.clone(),
            markers,
        })
    }

    pub(crate) fn is_transient(&self) -> bool {
        self.markers.contains(&FieldMarker::Transient)
    }

    pub(crate) fn to_tokens(&self) -> TokenStream2 {
        let name = &self.name;
        let ty = type_text(&self.ty);
        let markers = self.markers.iter().filter_map(|marker| marker.to_tokens());
        quote! {
            ::fluentmodel::MemberDescriptor {
                name: #name,
                ty: #ty,
                markers: ::std::vec![#(#markers),*],
            }
        }
    }
}
