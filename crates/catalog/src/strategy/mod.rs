//! Interchangeable load/query strategies.
//!
//! Every strategy follows the same contract:
//!
//! - [`Strategy::load`] reads the whole source and replaces whatever was
//!   loaded before. A failed load leaves the strategy unloaded.
//! - [`Strategy::filter_by`] fails with [`CatalogError::NotLoaded`] until a
//!   load has succeeded, visits records in source order and numbers matches
//!   from 1.
//!
//! Records are the element children of the root named by
//! [`CatalogSchema::record`]; fields are their element children named by
//! [`FieldSpec::element`](crate::FieldSpec). Anything else is ignored. A
//! record without every field rejects the whole load, in every strategy.

mod declarative;
mod streaming;
mod tree;

pub use declarative::DeclarativeQuery;
pub use streaming::StreamingForward;
pub use tree::TreeNavigation;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, CatalogSchema, Filter, Result, ResultSet};

/// Capability shared by all strategies
pub trait Strategy {
    fn kind(&self) -> StrategyKind;

    fn load(&mut self, path: &Path) -> Result<()>;

    fn filter_by(&mut self, filter: &Filter) -> Result<ResultSet>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Declarative,
    Tree,
    Streaming,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::Declarative, Self::Tree, Self::Streaming];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declarative => "declarative",
            Self::Tree => "tree",
            Self::Streaming => "streaming",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy '{}'", s))
    }
}

/// One of the three strategies, chosen at runtime
#[derive(Debug)]
pub enum ParseStrategy {
    Declarative(DeclarativeQuery),
    Tree(TreeNavigation),
    Streaming(StreamingForward),
}

impl ParseStrategy {
    pub fn new(kind: StrategyKind, schema: Arc<CatalogSchema>) -> Self {
        match kind {
            StrategyKind::Declarative => Self::Declarative(DeclarativeQuery::new(schema)),
            StrategyKind::Tree => Self::Tree(TreeNavigation::new(schema)),
            StrategyKind::Streaming => Self::Streaming(StreamingForward::new(schema)),
        }
    }

    /// Build a strategy and load `path` into it
    pub fn open(kind: StrategyKind, schema: Arc<CatalogSchema>, path: &Path) -> Result<Self> {
        let mut strategy = Self::new(kind, schema);
        strategy.load(path)?;
        Ok(strategy)
    }

    fn inner(&mut self) -> &mut dyn Strategy {
        match self {
            Self::Declarative(s) => s,
            Self::Tree(s) => s,
            Self::Streaming(s) => s,
        }
    }
}

impl Strategy for ParseStrategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Self::Declarative(_) => StrategyKind::Declarative,
            Self::Tree(_) => StrategyKind::Tree,
            Self::Streaming(_) => StrategyKind::Streaming,
        }
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.inner().load(path)
    }

    fn filter_by(&mut self, filter: &Filter) -> Result<ResultSet> {
        self.inner().filter_by(filter)
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_root(schema: &CatalogSchema, found: &str) -> Result<()> {
    if found != schema.root() {
        return Err(CatalogError::UnexpectedRoot {
            expected: schema.root().to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn check_filter(schema: &CatalogSchema, filter: &Filter) -> Result<()> {
    if !filter.fits(schema) {
        return Err(CatalogError::Schema(
            "filter was built for a different catalog schema".to_string(),
        ));
    }
    Ok(())
}

/// Concatenated text of every text node below `node`, in document order
fn inner_text(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
        assert_eq!("TREE".parse::<StrategyKind>().unwrap(), StrategyKind::Tree);
        assert!("sax".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn new_strategy_reports_kind() {
        let schema = Arc::new(CatalogSchema::books());
        for kind in StrategyKind::ALL {
            assert_eq!(ParseStrategy::new(kind, schema.clone()).kind(), kind);
        }
    }

    #[test]
    fn filter_before_load_fails() {
        let schema = Arc::new(CatalogSchema::books());
        let filter = Filter::new(&schema);
        for kind in StrategyKind::ALL {
            let mut strategy = ParseStrategy::new(kind, schema.clone());
            assert!(matches!(
                strategy.filter_by(&filter),
                Err(CatalogError::NotLoaded)
            ));
        }
    }
}
