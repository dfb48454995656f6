use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use roxmltree::Document;

use super::{Strategy, StrategyKind, check_filter, check_root, read_source};
use crate::{CatalogError, CatalogSchema, Filter, RecordBuilder, Result, ResultBuilder, ResultSet};

/// Owned element tree, detached from the source text
#[derive(Debug, Clone, PartialEq)]
struct Element {
    name: String,
    children: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    fn from_node(node: roxmltree::Node) -> Self {
        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(Content::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|t| Content::Text(t.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            children,
        }
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Content::Element(e) => Some(e),
            Content::Text(_) => None,
        })
    }

    /// First child element called `name`
    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    fn inner_text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Content::Text(t) => out.push_str(t),
                Content::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Keeps the whole document as a tree and re-reads every record from it on
/// each query.
#[derive(Debug)]
pub struct TreeNavigation {
    schema: Arc<CatalogSchema>,
    root: Option<Element>,
}

impl TreeNavigation {
    pub fn new(schema: Arc<CatalogSchema>) -> Self {
        Self { schema, root: None }
    }

    fn records<'a>(schema: &'a CatalogSchema, root: &'a Element) -> impl Iterator<Item = &'a Element> {
        root.elements().filter(move |e| e.name == schema.record())
    }

    /// Every record must carry every field
    fn verify(schema: &CatalogSchema, root: &Element) -> Result<usize> {
        let mut count = 0;
        for (i, record) in Self::records(schema, root).enumerate() {
            if let Some(spec) = schema
                .fields()
                .iter()
                .find(|spec| record.child(&spec.element).is_none())
            {
                return Err(CatalogError::MissingField {
                    record: i + 1,
                    field: spec.name.clone(),
                });
            }
            count += 1;
        }
        Ok(count)
    }
}

impl Strategy for TreeNavigation {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Tree
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.root = None;
        let started = Instant::now();

        let xml = read_source(path)?;
        let doc = Document::parse(&xml)?;
        let root = Element::from_node(doc.root_element());
        check_root(&self.schema, &root.name)?;
        let count = Self::verify(&self.schema, &root)?;

        log::debug!(
            "tree: loaded {} records from {} in {:?}",
            count,
            path.display(),
            started.elapsed()
        );
        self.root = Some(root);
        Ok(())
    }

    fn filter_by(&mut self, filter: &Filter) -> Result<ResultSet> {
        let root = self.root.as_ref().ok_or(CatalogError::NotLoaded)?;
        check_filter(&self.schema, filter)?;

        let mut result = ResultBuilder::new(&self.schema);
        for (i, node) in Self::records(&self.schema, root).enumerate() {
            let mut builder = RecordBuilder::new(&self.schema, i + 1);
            for (field, spec) in self.schema.fields().iter().enumerate() {
                if let Some(child) = node.child(&spec.element) {
                    builder.set(field, child.inner_text());
                }
            }
            let record = builder.finish(&self.schema)?;
            if filter.is_match(&record)? {
                result.push(&record);
            }
        }

        log::debug!("tree: {} records matched", result.matches());
        Ok(result.finish())
    }
}
