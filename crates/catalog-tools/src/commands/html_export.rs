use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{CatalogSchema, DeclarativeQuery, Strategy};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::utils::file as file_utils;

pub fn execute(
    input_file: &Path,
    output_file: Option<&Path>,
    schema: Arc<CatalogSchema>,
) -> Result<()> {
    let mut strategy = DeclarativeQuery::new(schema.clone());
    strategy
        .load(input_file)
        .with_context(|| format!("Failed to load catalog: {}", input_file.display()))?;
    let records = strategy.records().unwrap_or_default();

    let title = input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| schema.root().to_string());
    let html = generate_html(&schema, &title, records.iter().map(|r| r.values()))?;

    let output_path = match output_file {
        Some(path) => path.to_path_buf(),
        None => file_utils::sibling_with_extension(input_file, "html"),
    };

    std::fs::write(&output_path, html)
        .with_context(|| format!("Failed to write HTML to {}", output_path.display()))?;

    println!("✓ HTML exported to {}", output_path.display());

    Ok(())
}

#[derive(Serialize)]
struct Column {
    label: String,
    numeric: bool,
}

#[derive(Serialize)]
struct Row {
    position: usize,
    cells: Vec<String>,
}

/// Render one table row per record; `rows` yields field values in schema order
pub fn generate_html<'a>(
    schema: &CatalogSchema,
    title: &str,
    rows: impl Iterator<Item = &'a [String]>,
) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("catalog.html", HTML_TEMPLATE)
        .context("Failed to add HTML template")?;
    let template = env.get_template("catalog.html")?;

    let columns: Vec<Column> = schema
        .fields()
        .iter()
        .map(|spec| Column {
            label: spec.label.clone(),
            numeric: spec.kind == catalog::FieldKind::Number,
        })
        .collect();
    let rows: Vec<Row> = rows
        .enumerate()
        .map(|(i, values)| Row {
            position: i + 1,
            cells: values.to_vec(),
        })
        .collect();
    let version = env!("CARGO_PKG_VERSION");

    let html = template
        .render(context! {
            title,
            record_label => schema.label(),
            columns,
            rows,
            css_styles => CSS_STYLES,
            version,
        })
        .context("Failed to render HTML template")?;

    Ok(html)
}

const HTML_TEMPLATE: &str = include_str!("html_template.html.jinja");
const CSS_STYLES: &str = include_str!("style.css");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_escaped_rows() {
        let schema = CatalogSchema::discs();
        let values: Vec<String> = ["Live <1997>", "Bee Gees", "d", "Pop", "10.90", "1998"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let html = generate_html(&schema, "discs", std::iter::once(values.as_slice())).unwrap();
        assert!(html.contains("<title>discs</title>"));
        assert!(html.contains("<th>Artist</th>"));
        assert!(html.contains("Live &lt;1997&gt;"));
        assert!(html.contains("<td class=\"num\">10.90</td>"));
        assert!(html.contains("1 Disc"));
    }

    #[test]
    fn empty_catalog_has_placeholder() {
        let html = generate_html(&CatalogSchema::books(), "books", std::iter::empty()).unwrap();
        assert!(html.contains("No records found"));
        assert!(html.contains("0 Book"));
    }
}
