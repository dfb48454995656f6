use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use roxmltree::{Document, Node};

use super::{Strategy, StrategyKind, check_filter, check_root, inner_text, read_source};
use crate::{CatalogError, CatalogSchema, Filter, Record, RecordBuilder, Result, ResultBuilder, ResultSet};

/// Loads every record up front; queries filter the list and project the
/// browsable fields.
#[derive(Debug)]
pub struct DeclarativeQuery {
    schema: Arc<CatalogSchema>,
    records: Option<Vec<Record>>,
}

impl DeclarativeQuery {
    pub fn new(schema: Arc<CatalogSchema>) -> Self {
        Self {
            schema,
            records: None,
        }
    }

    /// Records of the last successful load
    pub fn records(&self) -> Option<&[Record]> {
        self.records.as_deref()
    }
}

fn extract_record(schema: &CatalogSchema, node: Node, position: usize) -> Result<Record> {
    let mut builder = RecordBuilder::new(schema, position);
    for (field, spec) in schema.fields().iter().enumerate() {
        if let Some(child) = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == spec.element)
        {
            builder.set(field, inner_text(child));
        }
    }
    builder.finish(schema)
}

impl Strategy for DeclarativeQuery {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Declarative
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.records = None;
        let started = Instant::now();

        let xml = read_source(path)?;
        let doc = Document::parse(&xml)?;
        let root = doc.root_element();
        check_root(&self.schema, root.tag_name().name())?;

        let records = root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == self.schema.record())
            .enumerate()
            .map(|(i, node)| extract_record(&self.schema, node, i + 1))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "declarative: loaded {} records from {} in {:?}",
            records.len(),
            path.display(),
            started.elapsed()
        );
        self.records = Some(records);
        Ok(())
    }

    fn filter_by(&mut self, filter: &Filter) -> Result<ResultSet> {
        let records = self.records.as_ref().ok_or(CatalogError::NotLoaded)?;
        check_filter(&self.schema, filter)?;

        let matched = records
            .iter()
            .filter_map(|record| match filter.is_match(record) {
                Ok(true) => Some(Ok(record)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = ResultBuilder::new(&self.schema);
        for record in &matched {
            result.push_entry(record);
        }
        for field in self.schema.browsable() {
            for value in matched.iter().map(|r| r.value(field)) {
                result.observe(field, value);
            }
        }

        log::debug!("declarative: {} of {} records matched", matched.len(), records.len());
        Ok(result.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_uses_first_field_occurrence() {
        let schema = CatalogSchema::new(
            "catalog",
            "item",
            "Item",
            vec![crate::FieldSpec::text("name")],
        )
        .unwrap();
        let doc = Document::parse("<item><name>one</name><name>two</name></item>").unwrap();
        let record = extract_record(&schema, doc.root_element(), 1).unwrap();
        assert_eq!(record.value(0), "one");
    }

    #[test]
    fn extract_concatenates_nested_text() {
        let schema = CatalogSchema::new(
            "catalog",
            "item",
            "Item",
            vec![crate::FieldSpec::text("name")],
        )
        .unwrap();
        let doc =
            Document::parse("<item><name>a <b>bold</b> &amp; <![CDATA[<raw>]]></name></item>")
                .unwrap();
        let record = extract_record(&schema, doc.root_element(), 1).unwrap();
        assert_eq!(record.value(0), "a bold & <raw>");
    }
}
