use serde::Serialize;

use crate::{CatalogSchema, DistinctValues, Record};

/// Distinct values of one browsable field across the matching records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistinctField {
    pub field: String,
    pub values: Vec<String>,
}

/// Output of one query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResultSet {
    /// Numbered entries of every match, in traversal order; empty when nothing matched
    pub listing: String,
    pub matches: usize,
    /// One collection per browsable field, in schema order
    pub distinct: Vec<DistinctField>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.matches == 0
    }

    pub fn distinct(&self, field: &str) -> Option<&[String]> {
        self.distinct
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.values.as_slice())
    }
}

/// Assembles a [`ResultSet`] as matches are found
#[derive(Debug)]
pub struct ResultBuilder<'a> {
    schema: &'a CatalogSchema,
    listing: String,
    matches: usize,
    distinct: Vec<(usize, DistinctValues)>,
}

impl<'a> ResultBuilder<'a> {
    pub fn new(schema: &'a CatalogSchema) -> Self {
        Self {
            schema,
            listing: String::new(),
            matches: 0,
            distinct: schema
                .browsable()
                .map(|field| (field, DistinctValues::new()))
                .collect(),
        }
    }

    /// Number and format a matching record and collect its browsable values
    pub fn push(&mut self, record: &Record) {
        self.push_entry(record);
        for (field, values) in &mut self.distinct {
            values.insert(record.value(*field));
        }
    }

    /// Number and format a matching record without touching the suggestion lists
    pub fn push_entry(&mut self, record: &Record) {
        self.matches += 1;
        record.write_entry(self.schema, self.matches, &mut self.listing);
    }

    /// Add one value to the suggestion list of `field`; non-browsable fields are ignored
    pub fn observe(&mut self, field: usize, value: &str) {
        if let Some((_, values)) = self.distinct.iter_mut().find(|(f, _)| *f == field) {
            values.insert(value);
        }
    }

    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn finish(self) -> ResultSet {
        let schema = self.schema;
        ResultSet {
            listing: self.listing,
            matches: self.matches,
            distinct: self
                .distinct
                .into_iter()
                .map(|(field, values)| DistinctField {
                    field: schema.field(field).name.clone(),
                    values: values.into_vec(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordBuilder;

    fn book(schema: &CatalogSchema, position: usize, author: &str, genre: &str) -> Record {
        let mut builder = RecordBuilder::new(schema, position);
        for (i, value) in [author, "T", "D", genre, "1", "2000"].into_iter().enumerate() {
            builder.set(i, value.to_string());
        }
        builder.finish(schema).unwrap()
    }

    #[test]
    fn empty_result() {
        let schema = CatalogSchema::books();
        let result = ResultBuilder::new(&schema).finish();
        assert!(result.is_empty());
        assert_eq!(result.listing, "");
        assert_eq!(result.distinct("author"), Some(&[][..]));
        assert_eq!(result.distinct("description"), None);
    }

    #[test]
    fn numbering_and_distinct_order() {
        let schema = CatalogSchema::books();
        let mut builder = ResultBuilder::new(&schema);
        for (i, author) in ["A", "B", "A", "C"].into_iter().enumerate() {
            builder.push(&book(&schema, i + 1, author, "Fantasy"));
        }
        let result = builder.finish();

        assert_eq!(result.matches, 4);
        assert!(result.listing.starts_with("Book No.1\nAuthor: A\n"));
        assert!(result.listing.contains("Book No.4\nAuthor: C\n"));
        assert_eq!(result.distinct("author").unwrap(), ["A", "B", "C"]);
        assert_eq!(result.distinct("genre").unwrap(), ["Fantasy"]);
    }

    #[test]
    fn observe_ignores_non_browsable_fields() {
        let schema = CatalogSchema::books();
        let mut builder = ResultBuilder::new(&schema);
        builder.observe(2, "a description");
        builder.observe(3, "Horror");
        let result = builder.finish();
        assert_eq!(result.distinct("genre").unwrap(), ["Horror"]);
        assert_eq!(
            result.distinct.iter().map(|d| d.field.as_str()).collect::<Vec<_>>(),
            ["author", "title", "genre"]
        );
    }
}
