//! Runtime support for fluent entity metamodels.
//!
//! `fluentmodel-build` generates one accessor module per entity. The
//! generated code builds on the types here:
//!
//! ```ignore
//! let name = Book::model().author().name();
//! assert_eq!(name.to_string(), "Book.author.name");
//!
//! let label = Book::model().tags().left_join().label();
//! assert_eq!(label.to_string(), "Book.tags?.label");
//!
//! let recent = Book::model().year().at_least(1970);
//! assert_eq!(recent.to_string(), "Book.year >= 1970");
//! ```

extern crate self as fluentmodel;

pub mod accessor;
pub mod path;
pub mod predicate;
pub mod types;

pub use accessor::{Attribute, EntityRoot, Join, MapJoin, Navigable, Plural};
pub use fluentmodel_macros::{Embeddable, Entity, MappedSuperclass};
pub use path::{JoinType, Path, Step};
pub use predicate::{Comparison, Predicate};
pub use types::{Mapped, MappedDescriptor, MappedKind, MemberDescriptor, MemberMarker};
