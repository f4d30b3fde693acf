use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use compliance_checkr::{ConditionSet, LicenseCondition, IMPLIES_PRIVATE, IMPLIES_SHARED};

use super::{ActionRow, ConflictRow, NodeRow, ShippedRow};

fn header(title: &str, quiet: bool) {
    if quiet {
        return;
    }
    println!(
        "\n {} v{}",
        "compliance-checkr".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" {}\n", title);
}

fn new_table(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn conditions_cell(conditions: ConditionSet) -> Cell {
    let color = if conditions.contains(LicenseCondition::NotAllowed) {
        Color::Magenta
    } else if conditions.matches_any(IMPLIES_SHARED) {
        Color::Red
    } else if conditions.matches_any(IMPLIES_PRIVATE) {
        Color::Yellow
    } else if conditions.is_empty() {
        Color::DarkGrey
    } else {
        Color::Green
    };
    let text = if conditions.is_empty() {
        "-".to_string()
    } else {
        conditions.names().join("\n")
    };
    Cell::new(text).fg(color)
}

pub fn render_nodes(rows: &[NodeRow], quiet: bool) {
    let shipped = rows.iter().filter(|r| r.shipped).count();
    let restricted = rows
        .iter()
        .filter(|r| r.conditions.matches_any(IMPLIES_SHARED))
        .count();

    if quiet {
        println!(
            "Nodes: {}  Shipped: {}  Source-sharing: {}",
            rows.len(),
            shipped,
            restricted.to_string().red()
        );
        return;
    }

    header("Resolved license conditions", quiet);
    let mut table = new_table(&["Target", "Package", "Conditions", "Shipped", "Aggregate"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.package),
            conditions_cell(row.conditions),
            Cell::new(if row.shipped { "yes" } else { "" }),
            Cell::new(if row.pure { "pure" } else { "" }),
        ]);
    }
    println!("{}", table);
}

pub fn render_shipped(rows: &[ShippedRow], quiet: bool) {
    if quiet {
        println!("Shipped: {}", rows.len());
        return;
    }

    header("Shipped targets", quiet);
    let mut table = new_table(&["Target", "Package", "Installed"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.package),
            Cell::new(row.installed.join("\n")),
        ]);
    }
    println!("{}", table);
}

pub fn render_actions(title: &str, rows: &[ActionRow], quiet: bool) {
    if quiet {
        println!("Actions: {}", rows.len());
        return;
    }

    header(title, quiet);
    if rows.is_empty() {
        println!(" {} Nothing to do.\n", "✓".green());
        return;
    }
    let mut table = new_table(&["Distributed", "Acts on", "Conditions", "License texts"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.attaches_to),
            Cell::new(&row.acts_on),
            conditions_cell(row.conditions),
            Cell::new(row.license_texts.join("\n")),
        ]);
    }
    println!("{}", table);
}

pub fn render_conflicts(rows: &[ConflictRow], quiet: bool) {
    if quiet {
        println!("Conflicts: {}", rows.len().to_string().red());
        return;
    }

    header("Policy conflicts", quiet);
    if rows.is_empty() {
        println!(" {} No conflicts.\n", "✓".green());
        return;
    }
    println!(" {} Targets requiring attention:\n", "[ERROR]".red().bold());
    for row in rows {
        println!("  {} {}", "✗".red(), row.description);
    }
    println!();
}
