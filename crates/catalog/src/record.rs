use crate::{CatalogError, CatalogSchema, Result};

/// One complete catalog entry: the raw text of every schema field, in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based position among the record elements of the source
    position: usize,
    values: Vec<String>,
}

impl Record {
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn value(&self, field: usize) -> &str {
        &self.values[field]
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Append the numbered listing entry for this record to `out`
    pub fn write_entry(&self, schema: &CatalogSchema, number: usize, out: &mut String) {
        out.push_str(&format!("{} No.{}\n", schema.label(), number));
        for (spec, value) in schema.fields().iter().zip(&self.values) {
            out.push_str(&spec.label);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
    }
}

/// Accumulates field values while a record element is being read.
///
/// Only [`RecordBuilder::finish`] produces a [`Record`], and it refuses to do
/// so until every field has been assigned.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    position: usize,
    values: Vec<Option<String>>,
}

impl RecordBuilder {
    pub fn new(schema: &CatalogSchema, position: usize) -> Self {
        Self {
            position,
            values: vec![None; schema.len()],
        }
    }

    /// Assign a field. The first assignment wins; returns `false` if the field
    /// already had a value.
    pub fn set(&mut self, field: usize, value: String) -> bool {
        let slot = &mut self.values[field];
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    pub fn is_set(&self, field: usize) -> bool {
        self.values[field].is_some()
    }

    pub fn finish(self, schema: &CatalogSchema) -> Result<Record> {
        let position = self.position;
        let values = self
            .values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                value.ok_or_else(|| CatalogError::MissingField {
                    record: position,
                    field: schema.field(i).name.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Record { position, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_builder(schema: &CatalogSchema) -> RecordBuilder {
        let mut builder = RecordBuilder::new(schema, 1);
        for (i, value) in ["Ralls, Kim", "Midnight Rain", "A former architect", "Fantasy", "5.95", "2000"]
            .into_iter()
            .enumerate()
        {
            builder.set(i, value.to_string());
        }
        builder
    }

    #[test]
    fn finish_complete_record() {
        let schema = CatalogSchema::books();
        let record = full_builder(&schema).finish(&schema).unwrap();
        assert_eq!(record.value(0), "Ralls, Kim");
        assert_eq!(record.value(5), "2000");
        assert_eq!(record.position(), 1);
    }

    #[test]
    fn finish_rejects_partial_record() {
        let schema = CatalogSchema::books();
        let mut builder = RecordBuilder::new(&schema, 4);
        builder.set(0, "Ralls, Kim".to_string());
        builder.set(1, "Midnight Rain".to_string());

        match builder.finish(&schema) {
            Err(CatalogError::MissingField { record, field }) => {
                assert_eq!(record, 4);
                assert_eq!(field, "description");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn first_assignment_wins() {
        let schema = CatalogSchema::books();
        let mut builder = RecordBuilder::new(&schema, 1);
        assert!(builder.set(1, "First".to_string()));
        assert!(!builder.set(1, "Second".to_string()));
        assert!(builder.is_set(1));
        assert!(!builder.is_set(0));
    }

    #[test]
    fn entry_format() {
        let schema = CatalogSchema::books();
        let record = full_builder(&schema).finish(&schema).unwrap();
        let mut out = String::new();
        record.write_entry(&schema, 2, &mut out);
        assert_eq!(
            out,
            "Book No.2\n\
             Author: Ralls, Kim\n\
             Title: Midnight Rain\n\
             Description: A former architect\n\
             Genre: Fantasy\n\
             Price: 5.95\n\
             Year: 2000\n\
             \n"
        );
    }
}
