//! Build-time generator for fluent entity metamodels.
//!
//! This crate scans your source files for structs deriving `Entity`,
//! `MappedSuperclass` or `Embeddable`, resolves each field into an attribute
//! kind, and writes one accessor module per entity so that query paths like
//! `Book::model().author().name()` are checked by the compiler.
//!
//! # Example
//!
//! In your `build.rs`:
//!
//! ```ignore
//! fn main() {
//!     fluentmodel_build::generate()
//!         .scan_path("src/")
//!         .output_dir("src/generated")
//!         .run()
//!         .expect("Failed to generate metamodel");
//! }
//! ```
//!
//! Then include the generated index from your crate root:
//!
//! ```ignore
//! mod generated;
//! pub use generated::*;
//! ```

pub mod builder;
pub mod diagnostic;
pub mod emitter;
pub mod error;
mod generator;
pub mod model;
pub mod names;
pub mod options;
pub mod output;
pub mod resolver;
pub mod scanner;

pub use builder::{BuildOutput, build_models};
pub use diagnostic::{Diagnostic, Severity};
pub use emitter::{EmitScope, GENERATED_MARKER, GeneratedUnit, emit_index, emit_unit};
pub use error::{ErrorKind, GenerateError, ModelError};
pub use generator::{Batch, BatchResult, FileReport, ModelGenerator, Report, Settings};
pub use model::{AttributeKind, AttributeModel, AttributeType, EntityModel, ModelSet};
pub use names::QualifiedName;
pub use options::{FluentConfig, GeneratorSettings, Options};
pub use output::{FsOutput, MemoryOutput, SourceOutput, WriteOutcome};
pub use scanner::{ClassDecl, ClassKind, Marker, MemberDecl, ScanOutput, SourceScanner, TypeRef};

/// Create a new generator with default settings.
///
/// # Example
///
/// ```ignore
/// fluentmodel_build::generate()
///     .scan_path("src/domain")
///     .skip("LegacyInvoice")
///     .run()
///     .expect("Failed to generate metamodel");
/// ```
pub fn generate() -> ModelGenerator {
    ModelGenerator::new()
}
