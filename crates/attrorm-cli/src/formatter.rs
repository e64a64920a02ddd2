//! Output formatters for store rows.

use attrorm_core::Item;
use clap::ValueEnum;
use comfy_table::{Cell, Table};

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format a set of rows from one domain.
    fn format_items(&self, domain: &str, items: &[Item]) -> String;

    /// Format a list of domain names.
    fn format_domains(&self, domains: &[String]) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_items(&self, domain: &str, items: &[Item]) -> String {
        if items.is_empty() {
            return "No results".to_string();
        }

        let columns = attribute_columns(items);
        let mut table = Table::new();
        let mut header = vec![Cell::new("key")];
        header.extend(columns.iter().map(Cell::new));
        table.set_header(header);

        for item in items {
            let mut row = vec![Cell::new(&item.key)];
            row.extend(
                columns
                    .iter()
                    .map(|name| Cell::new(item.attribute(name).unwrap_or(""))),
            );
            table.add_row(row);
        }

        format!("{}\n{} row(s) in {}", table, items.len(), domain)
    }

    fn format_domains(&self, domains: &[String]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Domain"]);

        for domain in domains {
            table.add_row(vec![domain]);
        }

        table.to_string()
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_items(&self, _domain: &str, items: &[Item]) -> String {
        serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_domains(&self, domains: &[String]) -> String {
        serde_json::to_string_pretty(domains).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }
}

/// Union of attribute names across rows, in name order.
fn attribute_columns(items: &[Item]) -> Vec<String> {
    let mut names: Vec<String> = items
        .iter()
        .flat_map(|item| item.attributes.iter().map(|(name, _)| name.to_string()))
        .collect();
    names.sort();
    names.dedup();
    names
}
