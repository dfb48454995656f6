use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{CatalogSchema, DeclarativeQuery, FieldKind, Filter, Strategy};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Debug, Serialize)]
pub struct CatalogInfo {
    pub source: String,
    pub root: String,
    pub record: String,
    pub records: usize,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub element: String,
    pub kind: FieldKind,
    pub filter_keys: Vec<String>,
    /// Distinct values across the whole catalog; only for browsable fields
    pub distinct: Option<usize>,
}

pub fn execute(file: &Path, schema: Arc<CatalogSchema>, format: OutputFormat) -> Result<()> {
    let info = collect(file, schema)?;

    match format {
        OutputFormat::Text => output_text(&info),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
    }
}

/// Load the catalog and summarize it with an unconstrained query
pub fn collect(file: &Path, schema: Arc<CatalogSchema>) -> Result<CatalogInfo> {
    let mut strategy = DeclarativeQuery::new(schema.clone());
    strategy
        .load(file)
        .with_context(|| format!("Failed to load catalog: {}", file.display()))?;
    let result = strategy.filter_by(&Filter::new(&schema))?;

    let fields = schema
        .fields()
        .iter()
        .map(|spec| FieldInfo {
            name: spec.name.clone(),
            element: spec.element.clone(),
            kind: spec.kind,
            filter_keys: spec.filter_keys(),
            distinct: result.distinct(&spec.name).map(|values| values.len()),
        })
        .collect();

    Ok(CatalogInfo {
        source: file.display().to_string(),
        root: schema.root().to_string(),
        record: schema.record().to_string(),
        records: result.matches,
        fields,
    })
}

fn output_text(info: &CatalogInfo) -> Result<()> {
    println!("{}", "Catalog Summary".bold());

    let mut summary = Table::new();
    summary.load_preset(UTF8_FULL_CONDENSED);
    summary.set_content_arrangement(ContentArrangement::Dynamic);
    for (name, value) in [
        ("Source", info.source.clone()),
        ("Root", info.root.clone()),
        ("Record", info.record.clone()),
        ("Records", info.records.to_string()),
    ] {
        summary.add_row(vec![Cell::new(name).fg(Color::Cyan), Cell::new(value)]);
    }
    println!("{summary}");

    println!();
    println!("{}", "Fields".bold());

    let mut fields = Table::new();
    fields.load_preset(UTF8_FULL_CONDENSED);
    fields.set_content_arrangement(ContentArrangement::Dynamic);
    fields.set_header(vec!["Field", "Element", "Kind", "Filter keys", "Distinct"]);
    for field in &info.fields {
        let kind = match field.kind {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
        };
        let distinct = field
            .distinct
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        fields.add_row(vec![
            Cell::new(&field.name).fg(Color::Cyan),
            Cell::new(&field.element),
            Cell::new(kind),
            Cell::new(field.filter_keys.join(", ")),
            Cell::new(distinct),
        ]);
    }
    println!("{fields}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn data(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../catalog/tests/data").join(name)
    }

    #[test]
    fn summarizes_disc_catalog() {
        let info = collect(&data("discs.xml"), Arc::new(CatalogSchema::discs())).unwrap();
        assert_eq!(info.root, "catalog");
        assert_eq!(info.record, "disc");
        assert_eq!(info.records, 5);

        let distinct: Vec<_> = info.fields.iter().map(|f| (f.name.as_str(), f.distinct)).collect();
        assert_eq!(
            distinct,
            [
                ("title", Some(5)),
                ("artist", Some(4)),
                ("description", None),
                ("genre", Some(3)),
                ("price", None),
                ("year", None),
            ]
        );
        assert_eq!(info.fields[4].filter_keys, ["priceFrom", "priceTo"]);
    }

    #[test]
    fn load_failure_names_the_file() {
        let err = collect(&data("missing.xml"), Arc::new(CatalogSchema::books())).unwrap_err();
        assert!(err.to_string().contains("missing.xml"));
    }
}
