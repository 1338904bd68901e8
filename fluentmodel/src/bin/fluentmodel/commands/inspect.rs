use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use fluentmodel_build::scanner::Plural;
use fluentmodel_build::{AttributeModel, AttributeType, Diagnostic, EntityModel, QualifiedName, Severity};
use serde::Serialize;
use std::collections::BTreeSet;

use super::SourceArgs;
use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Inspect",
        commands: &[
            "fluentmodel inspect                          # Every resolved model",
            "fluentmodel inspect Book                     # One class, by simple or qualified name",
            "fluentmodel --output json inspect            # Models as JSON",
        ],
    },
];

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only show this class (simple or qualified name)
    pub class: Option<String>,
}

pub fn handle_inspect(args: InspectArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let generator = args.source.generator(ctx)?;
    ctx.enter()?;

    let result = generator.inspect().context("Failed to scan mapped classes")?;
    let models: Vec<&EntityModel> = result
        .models
        .iter()
        .filter(|model| args.class.as_deref().is_none_or(|class| matches_class(&model.qualified_name, class)))
        .collect();

    if let Some(class) = &args.class
        && models.is_empty()
    {
        anyhow::bail!("no mapped class named `{class}`");
    }

    let diagnostics: Vec<&Diagnostic> = result
        .diagnostics
        .iter()
        .filter(|diagnostic| {
            diagnostic
                .class
                .as_ref()
                .is_none_or(|class| models.iter().any(|model| &model.qualified_name == class))
        })
        .collect();

    if !output.is_json() {
        output.heading("Entity Models");
    }
    output.display(&Inspection {
        models,
        failed: &result.failed,
        diagnostics: &diagnostics,
    })?;
    if !output.is_json() {
        let owned: Vec<Diagnostic> = diagnostics.into_iter().cloned().collect();
        output.diagnostics(&owned);
        if owned.iter().any(|d| d.severity == Severity::Error) {
            output.info("Classes with errors are modeled but get no accessor");
        }
    }
    Ok(())
}

fn matches_class(name: &QualifiedName, wanted: &str) -> bool {
    name.as_str() == wanted || name.simple_name() == wanted
}

#[derive(Serialize)]
struct Inspection<'a> {
    models: Vec<&'a EntityModel>,
    failed: &'a BTreeSet<QualifiedName>,
    diagnostics: &'a [&'a Diagnostic],
}

impl TableDisplay for Inspection<'_> {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["Class", "Kind", "Attribute", "Attribute Kind", "Type", "Declared In"]);

        for model in &self.models {
            let mut class = model.qualified_name.to_string();
            if self.failed.contains(&model.qualified_name) {
                class.push_str(" (failed)");
            } else if model.skip {
                class.push_str(" (skipped)");
            }
            if model.attributes.is_empty() {
                table.add_row(vec![Cell::new(&class), Cell::new(model.kind.to_string())]);
                continue;
            }
            for (index, attribute) in model.attributes.iter().enumerate() {
                let (class, kind) = if index == 0 {
                    (class.clone(), model.kind.to_string())
                } else {
                    (String::new(), String::new())
                };
                let declared_in = if attribute.declared_in == model.qualified_name {
                    String::new()
                } else {
                    attribute.declared_in.simple_name().to_string()
                };
                table.add_row(vec![
                    Cell::new(class),
                    Cell::new(kind),
                    Cell::new(&attribute.name),
                    output.tinted(attribute.kind().to_string(), theme::attribute_kind(attribute.kind())),
                    Cell::new(type_summary(attribute)),
                    Cell::new(declared_in),
                ]);
            }
        }
        table
    }

    fn to_compact(&self) -> String {
        self.models
            .iter()
            .map(|model| format!("{} {} [{}]", model.qualified_name, model.kind, model.attribute_names().join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Value type, or target class for associations and embedded values.
fn type_summary(attribute: &AttributeModel) -> String {
    match &attribute.ty {
        AttributeType::Identifier { value } | AttributeType::Basic { value } => value.to_string(),
        AttributeType::Embedded { model } => model.simple_name().to_string(),
        AttributeType::ToOne { target } => target.simple_name().to_string(),
        AttributeType::ToMany { target, plural } => format!("{} of {}", plural_label(plural), target.simple_name()),
        AttributeType::Collection { element, key: Some(key), .. } => format!("map {key} => {element}"),
        AttributeType::Collection { element, key: None, plural } => format!("{} of {element}", plural_label(plural)),
        AttributeType::KeyedCollection { key, target } => format!("map {key} => {}", target.simple_name()),
    }
}

fn plural_label(plural: &Plural) -> &'static str {
    match plural {
        Plural::List => "list",
        Plural::Set => "set",
        Plural::Map => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentmodel_build::{Batch, ScanOutput, SourceScanner};

    #[test]
    fn test_type_summary() {
        let scanner = SourceScanner::default();
        let mut scan = ScanOutput::default();
        scanner.scan_source(
            r#"
            #[derive(Entity)]
            pub struct Book {
                #[fluent(id)]
                pub id: i64,
                #[fluent(one_to_many)]
                pub chapters: Vec<Chapter>,
                pub ratings: std::collections::BTreeMap<String, u8>,
            }

            #[derive(Entity)]
            pub struct Chapter {
                #[fluent(id)]
                pub id: i64,
            }
            "#,
            "crate",
            "lib.rs",
            &mut scan,
        );
        let result = Batch::default().run(scan).unwrap();
        let book = result.models.get(&QualifiedName::new("crate::Book")).unwrap();

        assert_eq!(type_summary(book.attribute("id").unwrap()), "i64");
        assert_eq!(type_summary(book.attribute("chapters").unwrap()), "list of Chapter");
        assert_eq!(type_summary(book.attribute("ratings").unwrap()), "map String => u8");
    }

    #[test]
    fn test_matches_simple_or_qualified_name() {
        let name = QualifiedName::new("crate::library::Book");
        assert!(matches_class(&name, "Book"));
        assert!(matches_class(&name, "crate::library::Book"));
        assert!(!matches_class(&name, "library::Book"));
    }
}
