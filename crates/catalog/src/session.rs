use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{CatalogSchema, Filter, ParseStrategy, Result, ResultSet, Strategy, StrategyKind};

/// One interactive query session over a catalog file.
///
/// Owns the current [`Filter`] and the active strategy. Callers edit the
/// filter key by key and run [`QuerySession::search`] whenever they want fresh
/// results.
#[derive(Debug)]
pub struct QuerySession {
    schema: Arc<CatalogSchema>,
    source: PathBuf,
    filter: Filter,
    strategy: ParseStrategy,
}

impl QuerySession {
    /// Create the strategy of the given kind and load `source` into it
    pub fn open(
        kind: StrategyKind,
        schema: Arc<CatalogSchema>,
        source: impl AsRef<Path>,
    ) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let strategy = ParseStrategy::open(kind, schema.clone(), &source)?;
        Ok(Self {
            filter: Filter::new(&schema),
            schema,
            source,
            strategy,
        })
    }

    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Update one filter criterion; see [`Filter::set_field`]
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<()> {
        self.filter.set_field(key, raw)
    }

    /// Run the current filter against the active strategy
    pub fn search(&mut self) -> Result<ResultSet> {
        self.strategy.filter_by(&self.filter)
    }

    /// Replace the filter with an unconstrained one and search again
    pub fn reset(&mut self) -> Result<ResultSet> {
        self.filter = Filter::new(&self.schema);
        self.search()
    }

    /// Load the source again and search with the current filter
    pub fn reload(&mut self) -> Result<ResultSet> {
        self.strategy.load(&self.source)?;
        self.search()
    }

    /// Swap in a freshly loaded strategy of another kind; the filter is kept.
    /// On failure the current strategy stays active.
    pub fn switch_strategy(&mut self, kind: StrategyKind) -> Result<()> {
        self.strategy = ParseStrategy::open(kind, self.schema.clone(), &self.source)?;
        log::debug!("session: switched to {} strategy", kind);
        Ok(())
    }
}
