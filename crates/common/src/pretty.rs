use crate::Row;
use tabled::{builder::Builder, settings::Style};

/// Render column headers and rows into a human-friendly table string.
pub fn render_rows(columns: &[String], rows: &[Row]) -> String {
    if columns.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());

    for row in rows {
        builder.push_record(row.iter().map(i64::to_string));
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

/// Render a single-column listing, e.g. for LIST TABLES.
pub fn render_names(header: &str, names: &[String]) -> String {
    if names.is_empty() {
        return "<empty>".into();
    }

    let mut builder = Builder::default();
    builder.push_record([header]);
    for name in names {
        builder.push_record([name.as_str()]);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}
