use crate::{CatalogError, CatalogSchema, FieldKind, Record, Result, parse_decimal};

/// One side of a numeric range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// No constraint on this side
    Open,
    /// Inclusive limit
    At(f64),
    /// Set from unparsable input; nothing satisfies it
    Never,
}

impl Bound {
    /// Empty input clears the bound, unparsable input closes it
    fn from_input(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Bound::Open;
        }
        match parse_decimal(raw) {
            Some(value) => Bound::At(value),
            None => Bound::Never,
        }
    }

    fn admits_from(self, value: f64) -> bool {
        match self {
            Bound::Open => true,
            Bound::At(limit) => value >= limit,
            Bound::Never => false,
        }
    }

    fn admits_to(self, value: f64) -> bool {
        match self {
            Bound::Open => true,
            Bound::At(limit) => value <= limit,
            Bound::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Criterion {
    /// Trimmed, lower-cased substring; empty matches anything
    Fragment(String),
    Range { from: Bound, to: Bound },
}

type Setter = fn(&mut Criterion, &str);

/// Filter key → (field, setter), built once per filter
#[derive(Debug, Clone)]
struct FilterEntry {
    key: String,
    field: usize,
    apply: Setter,
}

fn set_fragment(criterion: &mut Criterion, raw: &str) {
    if let Criterion::Fragment(fragment) = criterion {
        *fragment = raw.trim().to_lowercase();
    }
}

fn set_from(criterion: &mut Criterion, raw: &str) {
    if let Criterion::Range { from, .. } = criterion {
        *from = Bound::from_input(raw);
    }
}

fn set_to(criterion: &mut Criterion, raw: &str) {
    if let Criterion::Range { to, .. } = criterion {
        *to = Bound::from_input(raw);
    }
}

/// Query predicate over the fields of a [`Record`].
///
/// Text fields match by case-insensitive substring, number fields by an
/// inclusive range. Criteria are set by key: the field name for text fields
/// and `<name>From` / `<name>To` for number fields (keys are matched ignoring
/// ASCII case).
#[derive(Debug, Clone)]
pub struct Filter {
    names: Vec<String>,
    criteria: Vec<Criterion>,
    entries: Vec<FilterEntry>,
}

impl Filter {
    pub fn new(schema: &CatalogSchema) -> Self {
        let mut criteria = Vec::with_capacity(schema.len());
        let mut entries = Vec::new();

        for (field, spec) in schema.fields().iter().enumerate() {
            let setters: [Option<Setter>; 2] = match spec.kind {
                FieldKind::Text => {
                    criteria.push(Criterion::Fragment(String::new()));
                    [Some(set_fragment), None]
                }
                FieldKind::Number => {
                    criteria.push(Criterion::Range {
                        from: Bound::Open,
                        to: Bound::Open,
                    });
                    [Some(set_from), Some(set_to)]
                }
            };
            for (key, apply) in spec.filter_keys().into_iter().zip(setters.into_iter().flatten()) {
                entries.push(FilterEntry { key, field, apply });
            }
        }

        Self {
            names: schema.fields().iter().map(|f| f.name.clone()).collect(),
            criteria,
            entries,
        }
    }

    /// Update one criterion from raw user input.
    ///
    /// Input values never fail: text is normalized, an empty bound becomes
    /// [`Bound::Open`] and an unparsable bound becomes [`Bound::Never`]. Only
    /// a key the filter does not know is an error.
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<()> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .ok_or_else(|| CatalogError::UnknownFilterKey(key.to_string()))?;
        (entry.apply)(&mut self.criteria[entry.field], raw);
        log::trace!("filter {} = {:?}", entry.key, self.criteria[entry.field]);
        Ok(())
    }

    /// Check a record against every criterion.
    ///
    /// Text criteria are checked first. A number field whose record text does
    /// not parse is an error, not a mismatch.
    pub fn is_match(&self, record: &Record) -> Result<bool> {
        for (field, criterion) in self.criteria.iter().enumerate() {
            if let Criterion::Fragment(fragment) = criterion
                && !fragment.is_empty()
                && !record.value(field).to_lowercase().contains(fragment.as_str())
            {
                return Ok(false);
            }
        }

        for (field, criterion) in self.criteria.iter().enumerate() {
            if let Criterion::Range { from, to } = criterion {
                let raw = record.value(field);
                let value = parse_decimal(raw).ok_or_else(|| CatalogError::InvalidNumber {
                    record: record.position(),
                    field: self.names[field].clone(),
                    value: raw.to_string(),
                })?;
                if !from.admits_from(value) || !to.admits_to(value) {
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }

    /// Normalized fragment of a text field
    pub fn fragment(&self, name: &str) -> Option<&str> {
        match self.criterion(name)? {
            Criterion::Fragment(fragment) => Some(fragment),
            Criterion::Range { .. } => None,
        }
    }

    /// `(from, to)` of a number field
    pub fn bounds(&self, name: &str) -> Option<(Bound, Bound)> {
        match self.criterion(name)? {
            Criterion::Range { from, to } => Some((*from, *to)),
            Criterion::Fragment(_) => None,
        }
    }

    /// All keys accepted by [`Filter::set_field`]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// True when no criterion restricts anything
    pub fn is_unconstrained(&self) -> bool {
        self.criteria.iter().all(|c| match c {
            Criterion::Fragment(fragment) => fragment.is_empty(),
            Criterion::Range { from, to } => *from == Bound::Open && *to == Bound::Open,
        })
    }

    /// Whether this filter was built for `schema`
    pub fn fits(&self, schema: &CatalogSchema) -> bool {
        self.names.len() == schema.len()
            && schema
                .fields()
                .iter()
                .zip(&self.criteria)
                .zip(&self.names)
                .all(|((spec, criterion), name)| {
                    spec.name == *name
                        && matches!(
                            (spec.kind, criterion),
                            (FieldKind::Text, Criterion::Fragment(_))
                                | (FieldKind::Number, Criterion::Range { .. })
                        )
                })
    }

    fn criterion(&self, name: &str) -> Option<&Criterion> {
        let field = self.names.iter().position(|n| n == name)?;
        Some(&self.criteria[field])
    }
}
