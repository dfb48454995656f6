//! Catalog loading and attribute filtering.
//!
//! A catalog is an XML file with one root collection element wrapping record
//! elements, each of which carries one child text element per field:
//!
//! ```xml
//! <catalog>
//!   <book>
//!     <author>Gambardella, Matthew</author>
//!     <title>XML Developer's Guide</title>
//!     <genre>Computer</genre>
//!     <description>An in-depth look at creating applications with XML.</description>
//!     <price>44.95</price>
//!     <publishYear>2000</publishYear>
//!   </book>
//! </catalog>
//! ```
//!
//! The shape of a catalog is described by a [`CatalogSchema`]. Three
//! interchangeable strategies load the file and answer [`Filter`] queries
//! with a [`ResultSet`]:
//!
//! - [`DeclarativeQuery`] materializes a flat list of records and filters it
//!   with iterator adapters.
//! - [`TreeNavigation`] keeps an owned element tree and re-extracts fields
//!   on every query.
//! - [`StreamingForward`] keeps a forward-only cursor open and consumes it
//!   once per load.
//!
//! All three produce identical results for the same input.

mod distinct;
mod filter;
mod number;
mod record;
mod result;
mod schema;
mod session;
pub mod strategy;

pub use distinct::DistinctValues;
pub use filter::{Bound, Filter};
pub use number::parse_decimal;
pub use record::{Record, RecordBuilder};
pub use result::{DistinctField, ResultBuilder, ResultSet};
pub use schema::{CatalogSchema, FieldKind, FieldSpec};
pub use session::QuerySession;
pub use strategy::{
    DeclarativeQuery, ParseStrategy, Strategy, StrategyKind, StreamingForward, TreeNavigation,
};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("XML stream error: {0}")]
    Stream(#[from] quick_xml::Error),

    #[error("Ill-formed XML: {0}")]
    IllFormed(String),

    #[error("Expected root element '{expected}', found '{found}'")]
    UnexpectedRoot { expected: String, found: String },

    #[error("Record {record} is missing required field '{field}'")]
    MissingField { record: usize, field: String },

    #[error("Record {record} has non-numeric value {value:?} for field '{field}'")]
    InvalidNumber {
        record: usize,
        field: String,
        value: String,
    },

    #[error("No catalog loaded")]
    NotLoaded,

    #[error("Unknown filter key: {0}")]
    UnknownFilterKey(String),

    #[error("Invalid catalog schema: {0}")]
    Schema(String),

    #[error("Failed to parse catalog schema: {0}")]
    SchemaToml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = CatalogError::MissingField {
            record: 3,
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "Record 3 is missing required field 'price'");

        let err = CatalogError::UnexpectedRoot {
            expected: "catalog".to_string(),
            found: "library".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expected root element 'catalog', found 'library'"
        );
    }

    #[test]
    fn io_error_names_path() {
        let err = CatalogError::Io {
            path: PathBuf::from("missing.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.xml"));
    }
}
