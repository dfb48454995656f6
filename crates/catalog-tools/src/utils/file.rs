use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::CatalogSchema;

use crate::Preset;

/// Resolve the catalog schema: a TOML schema file wins over the preset
pub fn load_schema(schema_file: Option<&Path>, preset: Preset) -> Result<Arc<CatalogSchema>> {
    let schema = match schema_file {
        Some(path) => CatalogSchema::from_file(path)
            .with_context(|| format!("Failed to load schema: {}", path.display()))?,
        None => preset.schema(),
    };
    log::debug!(
        "Using schema {}/{} with {} fields",
        schema.root(),
        schema.record(),
        schema.len()
    );
    Ok(Arc::new(schema))
}

/// Default output path: the input with its extension replaced
pub fn sibling_with_extension(input: &Path, extension: &str) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension(extension);
    path
}
