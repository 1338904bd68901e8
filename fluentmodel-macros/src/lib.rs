use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod parsed;

use parsed::{DerivedKind, ParsedMapped};

/// Marks a struct as an entity: a mapped class with identity that gets its
/// own fluent accessor module.
///
/// # Example
///
/// ```text
/// #[derive(Entity)]
/// #[fluent(extends = Auditable)]
/// pub struct Book {
///     #[fluent(id)]
///     pub id: i64,
///     pub title: String,
///     #[fluent(many_to_one)]
///     pub author: Author,
///     #[fluent(many_to_many)]
///     pub tags: BTreeSet<Tag>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(fluent))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    derive_mapped(input, DerivedKind::Entity)
}

/// Marks a struct whose members are inherited by entities extending it. No
/// accessor is generated for it directly.
#[proc_macro_derive(MappedSuperclass, attributes(fluent))]
pub fn derive_mapped_superclass(input: TokenStream) -> TokenStream {
    derive_mapped(input, DerivedKind::MappedSuperclass)
}

/// Marks a value type without identity, composed into mapped classes with
/// `#[fluent(embedded)]`.
#[proc_macro_derive(Embeddable, attributes(fluent))]
pub fn derive_embeddable(input: TokenStream) -> TokenStream {
    derive_mapped(input, DerivedKind::Embeddable)
}

fn derive_mapped(input: TokenStream, kind: DerivedKind) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match ParsedMapped::from_input(&input, kind) {
        Ok(parsed) => parsed.emit().into(),
        Err(err) => err.to_compile_error().into(),
    }
}
