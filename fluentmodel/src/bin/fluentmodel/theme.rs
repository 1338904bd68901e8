//! Colors and markers for generator output.

use clap::builder::styling::{AnsiColor, Styles};
use colored::Color;
use comfy_table::Color as CellColor;
use fluentmodel_build::{AttributeKind, Severity, WriteOutcome};
use once_cell::sync::Lazy;

/// Whether stdout should be colored, decided once from the environment.
pub static USE_COLOR: Lazy<bool> = Lazy::new(|| colored::control::ShouldColorize::from_env().should_colorize());

/// A marker and the color it is printed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub marker: &'static str,
    pub color: Color,
}

pub const HEADING: Color = Color::BrightBlue;
pub const KEY: Color = Color::BrightCyan;
pub const MUTED: Color = Color::BrightBlack;
pub const SUCCESS: Tone = Tone {
    marker: "✓",
    color: Color::Green,
};
pub const INFO: Tone = Tone {
    marker: "ℹ",
    color: Color::Blue,
};
pub const TRACE: Tone = Tone {
    marker: "→",
    color: MUTED,
};

pub fn severity(severity: Severity) -> Tone {
    match severity {
        Severity::Error => Tone {
            marker: "✗",
            color: Color::Red,
        },
        Severity::Warning => Tone {
            marker: "⚠",
            color: Color::Yellow,
        },
        Severity::Note => TRACE,
    }
}

/// Marker and status label for a generated file. A dry run reports what
/// would be written as out of date.
pub fn outcome(outcome: WriteOutcome, check: bool) -> (Tone, &'static str) {
    let changed = Tone {
        marker: "~",
        color: Color::Yellow,
    };
    match (outcome, check) {
        (WriteOutcome::Unchanged, _) => (SUCCESS, "unchanged"),
        (WriteOutcome::Written, false) => (changed, "written"),
        (WriteOutcome::Written, true) => (changed, "out of date"),
    }
}

/// Marker for a file the generator deleted, or would delete.
pub const REMOVED: Tone = Tone {
    marker: "-",
    color: Color::Red,
};

/// Table color of an attribute row, grouping identifiers, plain values and
/// the association kinds.
pub fn attribute_kind(kind: AttributeKind) -> CellColor {
    match kind {
        AttributeKind::Identifier => CellColor::Yellow,
        AttributeKind::Basic => CellColor::Reset,
        AttributeKind::Embedded => CellColor::Magenta,
        AttributeKind::ToOne | AttributeKind::ToMany => CellColor::Cyan,
        AttributeKind::Collection | AttributeKind::KeyedCollection => CellColor::Blue,
    }
}

/// Table counterpart of a text color.
pub fn cell_color(color: Color) -> CellColor {
    match color {
        Color::Green => CellColor::Green,
        Color::Yellow => CellColor::Yellow,
        Color::Red => CellColor::Red,
        Color::Blue => CellColor::Blue,
        Color::BrightBlack => CellColor::DarkGrey,
        _ => CellColor::Reset,
    }
}

/// Help styles matching the palette above.
pub fn help_styles() -> Styles {
    Styles::styled()
        .usage(AnsiColor::BrightBlue.on_default().bold())
        .header(AnsiColor::BrightBlue.on_default().bold())
        .literal(AnsiColor::BrightCyan.on_default())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .error(AnsiColor::Red.on_default().bold())
}
