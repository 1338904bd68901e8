use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use fluentmodel_build::{Report, Severity};
use std::path::PathBuf;

use super::{SourceArgs, absolute};
use crate::context::ProjectContext;
use crate::examples::ExampleGroup;
use crate::output::{OutputManager, TableDisplay};
use crate::theme::{self, Tone};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Generate",
        commands: &[
            "fluentmodel generate                            # Scan src/ and write src/generated",
            "fluentmodel generate --output-dir src/model     # Write accessors elsewhere",
            "fluentmodel generate --skip LegacyInvoice       # Leave a class out",
        ],
    },
    ExampleGroup {
        title: "Continuous Integration",
        commands: &[
            "fluentmodel generate --check                    # Fail if generated code is stale",
            "fluentmodel --output json generate --check      # Machine-readable report",
        ],
    },
];

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory receiving the accessor modules [default: src/generated]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Compare against the output directory without writing; fails when out of date
    #[arg(long)]
    pub check: bool,
}

pub fn handle_generate(args: GenerateArgs, ctx: &ProjectContext, output: &OutputManager) -> Result<()> {
    let mut generator = args.source.generator(ctx)?;
    if let Some(dir) = &args.output_dir {
        generator = generator.output_dir(absolute(dir)?);
    }
    ctx.enter()?;

    let settings = generator.settings()?;
    output.verbose(&format!("project root: {}", ctx.project_root.display()));
    for path in &settings.scan_paths {
        output.verbose(&format!("scanning {}", path.display()));
    }

    let report = if args.check { generator.check() } else { generator.generate() }
        .with_context(|| format!("Failed to generate into {}", settings.output_dir.display()))?;

    if !output.is_json() {
        output.heading(if args.check { "Checking Metamodel" } else { "Generating Metamodel" });
        output.key_value("Output", &settings.output_dir.display().to_string());
    }
    output.display(&CheckedReport {
        report: &report,
        check: args.check,
    })?;
    if !output.is_json() {
        output.diagnostics(&report.diagnostics);
    }

    let errors = report.count(Severity::Error);
    if errors > 0 {
        anyhow::bail!("{errors} mapped classes could not be modeled");
    }

    if args.check {
        if !report.is_up_to_date() {
            anyhow::bail!("generated sources are out of date, run `fluentmodel generate`");
        }
        output.success("Generated sources are up to date");
    } else if report.is_up_to_date() {
        output.info("Nothing to do, generated sources are up to date");
    } else {
        output.success(&format!(
            "Wrote {} files, removed {}",
            report.changed(),
            report.removed.len()
        ));
    }
    Ok(())
}

/// A report plus whether it came from a dry run.
#[derive(serde::Serialize)]
struct CheckedReport<'a> {
    #[serde(flatten)]
    report: &'a Report,
    check: bool,
}

impl TableDisplay for CheckedReport<'_> {
    fn to_table(&self, output: &OutputManager) -> Table {
        let mut table = output.create_table();
        output.add_table_header(&mut table, &["", "File", "Entity", "Status"]);

        for file in &self.report.files {
            let (tone, status) = theme::outcome(file.outcome, self.check);
            let entity = file.entity.as_ref().map(ToString::to_string).unwrap_or_default();
            table.add_row(vec![
                marker(output, tone),
                Cell::new(&file.file_name),
                Cell::new(entity),
                Cell::new(status),
            ]);
        }
        let removed = if self.check { "stale" } else { "removed" };
        for name in &self.report.removed {
            table.add_row(vec![
                marker(output, theme::REMOVED),
                Cell::new(name),
                Cell::new(""),
                Cell::new(removed),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "files={} changed={} removed={} errors={} warnings={}",
            self.report.files.len(),
            self.report.changed(),
            self.report.removed.len(),
            self.report.count(Severity::Error),
            self.report.count(Severity::Warning)
        )
    }
}

fn marker(output: &OutputManager, tone: Tone) -> Cell {
    output.tinted(tone.marker, theme::cell_color(tone.color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentmodel_build::{FileReport, WriteOutcome};

    fn report() -> Report {
        Report {
            files: vec![
                FileReport {
                    file_name: "book_model.rs".to_string(),
                    entity: Some("crate::Book".into()),
                    outcome: WriteOutcome::Written,
                },
                FileReport {
                    file_name: "mod.rs".to_string(),
                    entity: None,
                    outcome: WriteOutcome::Unchanged,
                },
            ],
            removed: vec!["stale_model.rs".to_string()],
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_compact_summary() {
        let report = report();
        let checked = CheckedReport {
            report: &report,
            check: false,
        };
        assert_eq!(checked.to_compact(), "files=2 changed=1 removed=1 errors=0 warnings=0");
    }

    #[test]
    fn test_json_flattens_report() {
        let report = report();
        let json = serde_json::to_value(CheckedReport {
            report: &report,
            check: true,
        })
        .unwrap();
        assert_eq!(json["check"], true);
        assert_eq!(json["removed"][0], "stale_model.rs");
        assert_eq!(json["files"][0]["outcome"], "Written");
    }
}
