use crate::commands::{generate, inspect};

#[derive(Clone, Copy)]
pub struct ExampleGroup {
    pub title: &'static str,
    pub commands: &'static [&'static str],
}

#[derive(Clone, Copy)]
pub struct CommandExample {
    pub name: &'static str,
    pub groups: &'static [ExampleGroup],
}

impl CommandExample {
    /// Plain text block listed after a subcommand's long help.
    pub fn render(&self) -> String {
        let mut text = String::from("Examples:");
        for group in self.groups {
            text.push_str(&format!("\n  {}:\n", group.title));
            for command in group.commands {
                text.push_str(&format!("    {command}\n"));
            }
        }
        text
    }
}

pub fn command_examples() -> &'static [CommandExample] {
    &[
        CommandExample {
            name: "generate",
            groups: generate::EXAMPLES,
        },
        CommandExample {
            name: "inspect",
            groups: inspect::EXAMPLES,
        },
    ]
}
