use clap::ValueEnum;

use catalog::{CatalogSchema, StrategyKind};

pub mod commands;
pub mod utils;

// Re-export catalog for external use
pub use catalog;

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which loading strategy answers the query
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Declarative,
    Tree,
    Streaming,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Declarative => StrategyKind::Declarative,
            StrategyArg::Tree => StrategyKind::Tree,
            StrategyArg::Streaming => StrategyKind::Streaming,
        }
    }
}

/// Built-in catalog schemas
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Books,
    Discs,
}

impl Preset {
    pub fn schema(&self) -> CatalogSchema {
        match self {
            Self::Books => CatalogSchema::books(),
            Self::Discs => CatalogSchema::discs(),
        }
    }
}

/// Parse a `KEY=VALUE` filter assignment. The value may be empty.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing filter key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
