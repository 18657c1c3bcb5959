/*!
 * Tether CLI Style System
 *
 * Tables and themed messages for the `tether` command line.
 */

use crate::script::StepOutcome;
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, StyledObject};
use tether_spec::{ClassSpec, MemberKind, SpecRegistry};

/// Brand colors for consistent styling
pub struct Theme;

impl Theme {
    pub fn primary<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan()
    }

    pub fn success<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).green()
    }

    pub fn warning<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).yellow()
    }

    pub fn error<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).red()
    }

    pub fn muted<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).dim()
    }

    pub fn header<D: std::fmt::Display>(text: D) -> StyledObject<D> {
        style(text).cyan().bold()
    }
}

pub struct Icons;

impl Icons {
    pub const SUCCESS: &'static str = "✓";
    pub const ERROR: &'static str = "✗";
    pub const WARNING: &'static str = "⚠";
    pub const ARROW_RIGHT: &'static str = "→";
}

/// Create a styled data table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn kind_label(kind: MemberKind) -> &'static str {
    match kind {
        MemberKind::Method => "method",
        MemberKind::Property => "property",
        MemberKind::Scope => "scope",
    }
}

/// One row per declared class with its member count
pub fn classes_table(spec: &SpecRegistry) -> Table {
    let mut table = create_table();
    table.set_header(vec![header_cell("Class"), header_cell("Members")]);

    for class in spec.classes() {
        table.add_row(vec![
            Cell::new(&class.name),
            Cell::new(class.members.len()),
        ]);
    }

    table
}

/// One row per member of a class with its signature
pub fn members_table(class: &ClassSpec) -> Table {
    let mut table = create_table();
    table.set_header(vec![header_cell("Member"), header_cell("Kind"), header_cell("Signature")]);

    for (name, descriptor) in &class.members {
        let signature = class
            .signature(name)
            .map(|s| s.to_string())
            .unwrap_or_default();
        let kind = Cell::new(kind_label(descriptor.kind));
        let kind = if descriptor.is_scope() {
            kind.fg(Color::Yellow)
        } else {
            kind
        };
        table.add_row(vec![
            Cell::new(name),
            kind,
            Cell::new(signature).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// One line per completed script step
pub fn format_step(outcome: &StepOutcome) -> String {
    let mut line = format!(
        "{} {} {}.{} {} {}",
        Theme::success(Icons::SUCCESS),
        Theme::muted(format!("[{}]", outcome.step)),
        outcome.on,
        outcome.call,
        Theme::muted(Icons::ARROW_RIGHT),
        outcome.result
    );
    if let Some(name) = &outcome.bound {
        line.push_str(&format!(" {}", Theme::primary(format!("as {}", name))));
    }
    line
}

/// Print a section title
pub fn section_header(title: &str) {
    let line_len = 50 - title.len().min(40);
    println!(
        "\n{} {}",
        Theme::header(title),
        Theme::muted("─".repeat(line_len))
    );
}

/// Print a styled error message with an optional hint
pub fn print_error(message: &str, suggestion: Option<&str>) {
    eprintln!(
        "\n{} {}",
        Theme::error(format!("{} Error:", Icons::ERROR)),
        message
    );

    if let Some(hint) = suggestion {
        eprintln!(
            "  {} {}",
            Theme::muted(Icons::ARROW_RIGHT),
            Theme::muted(hint)
        );
    }
}

/// Print a styled warning message
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        Theme::warning(Icons::WARNING.to_string()),
        Theme::warning(message)
    );
}
