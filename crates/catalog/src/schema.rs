use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, Result};

/// How a field's raw text is interpreted when filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Case-insensitive substring match
    #[default]
    Text,
    /// Inclusive numeric range, parsed with a `.` decimal separator
    Number,
}

/// One named field of a catalog record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    /// Child element of the record that holds this field's text
    pub element: String,
    /// Label used in the formatted listing
    pub label: String,
    pub kind: FieldKind,
    /// Whether distinct values are collected for suggestion lists
    pub browsable: bool,
}

impl FieldSpec {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            element: name.to_string(),
            label: capitalize(name),
            kind: FieldKind::Text,
            browsable: true,
        }
    }

    pub fn number(name: &str) -> Self {
        Self {
            kind: FieldKind::Number,
            browsable: false,
            ..Self::text(name)
        }
    }

    pub fn element(mut self, element: &str) -> Self {
        self.element = element.to_string();
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn browsable(mut self, browsable: bool) -> Self {
        self.browsable = browsable && self.kind == FieldKind::Text;
        self
    }

    /// Filter keys this field answers to: its name for text, `<name>From`
    /// and `<name>To` for numbers
    pub fn filter_keys(&self) -> Vec<String> {
        match self.kind {
            FieldKind::Text => vec![self.name.clone()],
            FieldKind::Number => vec![format!("{}From", self.name), format!("{}To", self.name)],
        }
    }
}

/// Shape of a catalog: where records live and which fields they carry.
///
/// Field order is significant: it is the order of the lines in a formatted
/// entry and the order of the distinct value collections in a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSchema {
    root: String,
    record: String,
    label: String,
    fields: Vec<FieldSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchema {
    #[serde(default = "default_root")]
    root: String,
    #[serde(default = "default_record")]
    record: String,
    label: Option<String>,
    fields: Vec<RawField>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawField {
    name: String,
    element: Option<String>,
    label: Option<String>,
    #[serde(default)]
    kind: FieldKind,
    browsable: Option<bool>,
}

fn default_root() -> String {
    "catalog".to_string()
}

fn default_record() -> String {
    "book".to_string()
}

impl CatalogSchema {
    pub fn new(root: &str, record: &str, label: &str, fields: Vec<FieldSpec>) -> Result<Self> {
        let schema = Self {
            root: root.to_string(),
            record: record.to_string(),
            label: label.to_string(),
            fields,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Book catalog: `catalog/book` with a `publishYear` element for the year
    pub fn books() -> Self {
        Self {
            root: "catalog".to_string(),
            record: "book".to_string(),
            label: "Book".to_string(),
            fields: vec![
                FieldSpec::text("author"),
                FieldSpec::text("title"),
                FieldSpec::text("description").browsable(false),
                FieldSpec::text("genre"),
                FieldSpec::number("price"),
                FieldSpec::number("year").element("publishYear"),
            ],
        }
    }

    /// Disc catalog: `catalog/disc`
    pub fn discs() -> Self {
        Self {
            root: "catalog".to_string(),
            record: "disc".to_string(),
            label: "Disc".to_string(),
            fields: vec![
                FieldSpec::text("title"),
                FieldSpec::text("artist"),
                FieldSpec::text("description").browsable(false),
                FieldSpec::text("genre"),
                FieldSpec::number("price"),
                FieldSpec::number("year"),
            ],
        }
    }

    /// Parse a schema from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawSchema = toml::from_str(content)?;
        let label = raw.label.unwrap_or_else(|| capitalize(&raw.record));
        let fields = raw
            .fields
            .into_iter()
            .map(|f| {
                let mut spec = match f.kind {
                    FieldKind::Text => FieldSpec::text(&f.name),
                    FieldKind::Number => FieldSpec::number(&f.name),
                };
                if let Some(element) = f.element {
                    spec = spec.element(&element);
                }
                if let Some(label) = f.label {
                    spec = spec.label(&label);
                }
                if let Some(browsable) = f.browsable {
                    spec = spec.browsable(browsable);
                }
                spec
            })
            .collect();
        Self::new(&raw.root, &raw.record, &label, fields)
    }

    /// Parse a schema from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.root.is_empty() || self.record.is_empty() {
            return Err(CatalogError::Schema(
                "root and record element names must not be empty".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(CatalogError::Schema(
                "a schema needs at least one field".to_string(),
            ));
        }

        let mut keys = HashSet::new();
        let mut names = HashSet::new();
        let mut elements = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() || field.element.is_empty() {
                return Err(CatalogError::Schema(
                    "field names and elements must not be empty".to_string(),
                ));
            }
            if !names.insert(field.name.to_ascii_lowercase()) {
                return Err(CatalogError::Schema(format!(
                    "field '{}' is defined more than once",
                    field.name
                )));
            }
            if !elements.insert(field.element.as_str()) {
                return Err(CatalogError::Schema(format!(
                    "element '{}' is used by more than one field",
                    field.element
                )));
            }
            for key in field.filter_keys() {
                if !keys.insert(key.to_ascii_lowercase()) {
                    return Err(CatalogError::Schema(format!(
                        "filter key '{}' is defined more than once",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> &FieldSpec {
        &self.fields[index]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Index of the field stored in `element`
    pub fn field_for_element(&self, element: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.element == element)
    }

    /// Indices of the fields that feed suggestion lists
    pub fn browsable(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.browsable)
            .map(|(i, _)| i)
    }
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self::books()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
