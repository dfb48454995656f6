use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use catalog::{CatalogSchema, Filter, ParseStrategy, ResultSet, Strategy, StrategyKind};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};

/// What one strategy produced for the shared filter
#[derive(Debug)]
pub struct Outcome {
    pub kind: StrategyKind,
    pub result: catalog::Result<ResultSet>,
}

pub fn execute(
    file: &Path,
    schema: Arc<CatalogSchema>,
    criteria: &[(String, String)],
) -> Result<()> {
    let mut filter = Filter::new(&schema);
    for (key, value) in criteria {
        filter.set_field(key, value)?;
    }

    let outcomes = run_all(file, &schema, &filter);
    if let Some(err) = all_failed(&outcomes) {
        bail!("No strategy could query {}: {}", file.display(), err);
    }

    let agree = agreement(&outcomes);
    print_table(&outcomes, agree);

    if !agree {
        bail!("Strategies disagree on {}", file.display());
    }
    println!("{}", "✓ All strategies agree".green());
    Ok(())
}

/// Load and query `file` once with every strategy
pub fn run_all(file: &Path, schema: &Arc<CatalogSchema>, filter: &Filter) -> Vec<Outcome> {
    StrategyKind::ALL
        .into_iter()
        .map(|kind| {
            let result = ParseStrategy::open(kind, schema.clone(), file)
                .and_then(|mut strategy| strategy.filter_by(filter));
            if let Err(e) = &result {
                log::warn!("{} strategy failed: {}", kind, e);
            }
            Outcome { kind, result }
        })
        .collect()
}

/// Every strategy succeeded with the same result
pub fn agreement(outcomes: &[Outcome]) -> bool {
    let mut results = outcomes.iter().map(|o| o.result.as_ref().ok());
    match results.next() {
        Some(Some(first)) => results.all(|r| r == Some(first)),
        _ => false,
    }
}

fn all_failed(outcomes: &[Outcome]) -> Option<&catalog::CatalogError> {
    let mut errors = outcomes.iter().map(|o| o.result.as_ref().err());
    let first = errors.next()??;
    errors.all(|e| e.is_some()).then_some(first)
}

fn print_table(outcomes: &[Outcome], agree: bool) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Strategy", "Matches", "Listing bytes", "Status"]);

    for outcome in outcomes {
        let row = match &outcome.result {
            Ok(result) => vec![
                Cell::new(outcome.kind).fg(Color::Cyan),
                Cell::new(result.matches),
                Cell::new(result.listing.len()),
                if agree {
                    Cell::new("ok").fg(Color::Green)
                } else {
                    Cell::new("differs").fg(Color::Yellow)
                },
            ],
            Err(e) => vec![
                Cell::new(outcome.kind).fg(Color::Cyan),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new(e).fg(Color::Red),
            ],
        };
        table.add_row(row);
    }

    println!("{table}");
}
