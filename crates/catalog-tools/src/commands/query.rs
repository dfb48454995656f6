use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{CatalogSchema, QuerySession, ResultSet, StrategyKind};
use colored::Colorize;

use crate::OutputFormat;

/// Shown in place of an empty listing
pub const NO_RECORDS: &str = "No records found";

pub fn execute(
    file: &Path,
    schema: Arc<CatalogSchema>,
    strategy: StrategyKind,
    criteria: &[(String, String)],
    format: OutputFormat,
    suggestions: bool,
) -> Result<()> {
    let mut session = QuerySession::open(strategy, schema, file)
        .with_context(|| format!("Failed to load catalog: {}", file.display()))?;

    for (key, value) in criteria {
        session
            .set_field(key, value)
            .with_context(|| format!("Invalid filter {}={}", key, value))?;
    }

    let result = session
        .search()
        .with_context(|| format!("Query over {} failed", file.display()))?;
    log::info!(
        "{} strategy matched {} records",
        session.kind(),
        result.matches
    );

    let mut writer = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
        }
        OutputFormat::Text => {
            write_listing(&result, session.schema(), suggestions, &mut writer)?;
        }
    }

    Ok(())
}

/// Text rendering: the listing (or the placeholder) followed by the
/// suggestion lists when requested
pub fn write_listing<W: Write>(
    result: &ResultSet,
    schema: &CatalogSchema,
    suggestions: bool,
    mut writer: W,
) -> Result<()> {
    if result.is_empty() {
        writeln!(writer, "{}", NO_RECORDS.yellow())?;
    } else {
        write!(writer, "{}", result.listing)?;
    }

    if suggestions {
        for distinct in &result.distinct {
            let label = schema
                .fields()
                .iter()
                .find(|f| f.name == distinct.field)
                .map_or(distinct.field.as_str(), |f| f.label.as_str());
            writeln!(writer, "{} ({})", label.bold(), distinct.values.len())?;
            for value in &distinct.values {
                writeln!(writer, "  {}", value)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{DistinctField, ResultSet};

    fn render(result: &ResultSet, suggestions: bool) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_listing(result, &CatalogSchema::books(), suggestions, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_result_prints_placeholder() {
        assert_eq!(render(&ResultSet::default(), false), "No records found\n");
    }

    #[test]
    fn listing_is_printed_verbatim() {
        let result = ResultSet {
            listing: "Book No.1\nAuthor: A\n\n".to_string(),
            matches: 1,
            distinct: vec![DistinctField {
                field: "author".to_string(),
                values: vec!["A".to_string()],
            }],
        };
        assert_eq!(render(&result, false), "Book No.1\nAuthor: A\n\n");
        assert_eq!(
            render(&result, true),
            "Book No.1\nAuthor: A\n\nAuthor (1)\n  A\n"
        );
    }
}
