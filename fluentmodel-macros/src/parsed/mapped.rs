use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Generics, Ident, LitStr, Result, Type};

use super::field::ParsedField;
use super::type_text;

#[derive(Clone, Copy)]
pub(crate) enum DerivedKind {
    Entity,
    MappedSuperclass,
    Embeddable,
}

impl DerivedKind {
    fn derive_name(self) -> &'static str {
        match self {
            DerivedKind::Entity => "Entity",
            DerivedKind::MappedSuperclass => "MappedSuperclass",
            DerivedKind::Embeddable => "Embeddable",
        }
    }

    fn to_tokens(self) -> TokenStream2 {
        match self {
            DerivedKind::Entity => quote!(::fluentmodel::MappedKind::Entity),
            DerivedKind::MappedSuperclass => quote!(::fluentmodel::MappedKind::MappedSuperclass),
            DerivedKind::Embeddable => quote!(::fluentmodel::MappedKind::Embeddable),
        }
    }
}

pub(crate) struct ParsedMapped {
    name: Ident,
    generics: Generics,
    kind: DerivedKind,
    extends: Option<String>,
    skip: bool,
    fields: Vec<ParsedField>,
}

impl ParsedMapped {
    pub(crate) fn from_input(input: &DeriveInput, kind: DerivedKind) -> Result<Self> {
        let derive = kind.derive_name();
        let mut extends = None;
        let mut skip = false;

        for attr in &input.attrs {
            if attr.path().is_ident("fluent") {
                Self::parse_container_attr(attr, &mut extends, &mut skip)?;
            }
        }

        let fields = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => {
                    let mut parsed = Vec::new();
                    for field in &named.named {
                        parsed.push(ParsedField::from_field(field, derive)?);
                    }
                    parsed
                }
                Fields::Unit => Vec::new(),
                Fields::Unnamed(_) => {
                    return Err(Error::new(input.ident.span(), format!("{derive} requires named fields")));
                }
            },
            _ => {
                return Err(Error::new(
                    input.ident.span(),
                    format!("{derive} can only be derived for structs"),
                ));
            }
        };

        Ok(Self {
            name: input.ident.clone(),
            generics: input.generics.clone(),
            kind,
            extends,
            skip,
            fields,
        })
    }

    fn parse_container_attr(attr: &Attribute, extends: &mut Option<String>, skip: &mut bool) -> Result<()> {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("extends") {
                if extends.is_some() {
                    return Err(meta.error("duplicate `extends`"));
                }
                let value = meta.value()?;
                // `extends = "Keyed<i64>"` or `extends = Keyed<i64>`
                let ty: Type = if value.peek(LitStr) {
                    let lit: LitStr = value.parse()?;
                    lit.parse()?
                } else {
                    value.parse()?
                };
                *extends = Some(type_text(&ty));
                Ok(())
            } else if meta.path.is_ident("skip") {
                *skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown fluent attribute, expected `extends = Type` or `skip`"))
            }
        })
    }

    pub(crate) fn emit(&self) -> TokenStream2 {
        let name = &self.name;
        let name_lit = name.to_string();
        let kind = self.kind.to_tokens();
        let skip = self.skip;
        let extends = match &self.extends {
            Some(ty) => quote!(::std::option::Option::Some(#ty)),
            None => quote!(::std::option::Option::None),
        };
        let members = self
            .fields
            .iter()
            .filter(|field| !field.is_transient())
            .map(ParsedField::to_tokens);
        let (impl_generics, ty_generics, where_clause) = self.generics.split_for_impl();

        quote! {
            impl #impl_generics ::fluentmodel::Mapped for #name #ty_generics #where_clause {
                const KIND: ::fluentmodel::MappedKind = #kind;
                const NAME: &'static str = #name_lit;

                fn descriptor() -> ::fluentmodel::MappedDescriptor {
                    ::fluentmodel::MappedDescriptor {
                        name: #name_lit,
                        kind: #kind,
                        extends: #extends,
                        skip: #skip,
                        members: ::std::vec![#(#members),*],
                    }
                }
            }
        }
    }
}
