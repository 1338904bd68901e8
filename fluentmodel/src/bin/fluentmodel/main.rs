mod commands;
mod context;
mod examples;
mod output;
mod theme;

use anyhow::Result;
use clap::{ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

use commands::{
    generate::{GenerateArgs, handle_generate},
    inspect::{InspectArgs, handle_inspect},
};
use context::ProjectContext;
use examples::command_examples;
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::USE_COLOR;

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("FLUENTMODEL_DEBUG", "Set to 1 to report a note for every modeled class"),
    ("RUST_LOG", "Log filter, e.g. fluentmodel_build=debug"),
];

#[derive(Parser)]
#[command(name = "fluentmodel")]
#[command(version = "0.1.0")]
#[command(
    about = "Fluent metamodel generator for mapped entity classes",
    long_about = r#"Fluent metamodel generator that:

• Scans structs deriving Entity, MappedSuperclass and Embeddable
• Resolves inheritance, embedding and associations into entity models
• Writes one typed accessor module per entity, deterministically

Commands:
  generate  Write (or check) the accessor modules
  inspect   Show the resolved entity models
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Config file [default: fluentmodel.toml in the project root]
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output and debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The clap command with styles, environment help and per-command examples.
fn build_cli_command() -> Command {
    let mut command = Cli::command()
        .styles(theme::help_styles())
        .color(if *USE_COLOR { ColorChoice::Auto } else { ColorChoice::Never })
        .after_long_help(environment_help());
    for example in command_examples() {
        command = command.mut_subcommand(example.name, |sub| sub.after_long_help(example.render()));
    }
    command
}

fn environment_help() -> String {
    let mut help = String::from("Environment Variables:\n");
    for (key, description) in ENVIRONMENT_VARIABLES {
        help.push_str(&format!("  {key:<18} {description}\n"));
    }
    help.push_str("\nUse 'fluentmodel <command> --help' for examples.");
    help
}

#[derive(Subcommand)]
enum Commands {
    /// Generate accessor modules, or check that they are up to date
    Generate(GenerateArgs),

    /// Show the resolved entity models
    Inspect(InspectArgs),
}

fn main() {
    let matches = build_cli_command().get_matches();
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = execute(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color || !*USE_COLOR,
    };

    let output = OutputManager::new(global_options);
    let ctx = ProjectContext::find(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate(args) => handle_generate(args, &ctx, &output)?,
        Commands::Inspect(args) => handle_inspect(args, &ctx, &output)?,
    }

    Ok(())
}
