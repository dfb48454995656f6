use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{Strategy, StrategyKind, check_filter};
use crate::{CatalogError, CatalogSchema, Filter, Record, RecordBuilder, Result, ResultBuilder, ResultSet};

/// Keeps a forward-only cursor over the source between `load` and `filter_by`.
///
/// The cursor is consumed by the first query after a load: a second
/// `filter_by` without a new `load` sees an exhausted cursor and returns an
/// empty result. `load` checks the whole file before arming the cursor, so
/// ill-formed markup and structural errors surface there just like in the
/// other strategies.
pub struct StreamingForward {
    schema: Arc<CatalogSchema>,
    cursor: Option<Cursor>,
}

impl StreamingForward {
    pub fn new(schema: Arc<CatalogSchema>) -> Self {
        Self {
            schema,
            cursor: None,
        }
    }

    /// True once the armed cursor has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.cursor.as_ref().is_some_and(|c| c.exhausted)
    }
}

impl fmt::Debug for StreamingForward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingForward")
            .field("schema", &self.schema)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl Strategy for StreamingForward {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Streaming
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        // Dropping the previous cursor closes its file
        self.cursor = None;
        let started = Instant::now();

        let mut count = 0;
        Cursor::open(path)?.run(&self.schema, |_, _| {
            count += 1;
            Ok(())
        })?;

        self.cursor = Some(Cursor::open(path)?);
        log::debug!(
            "streaming: checked {} records in {} in {:?}",
            count,
            path.display(),
            started.elapsed()
        );
        Ok(())
    }

    fn filter_by(&mut self, filter: &Filter) -> Result<ResultSet> {
        let cursor = self.cursor.as_mut().ok_or(CatalogError::NotLoaded)?;
        check_filter(&self.schema, filter)?;

        let mut result = ResultBuilder::new(&self.schema);
        cursor.run(&self.schema, |record, pending| {
            if filter.is_match(&record)? {
                result.push_entry(&record);
                for (field, value) in pending {
                    result.observe(*field, value);
                }
            }
            Ok(())
        })?;

        log::debug!("streaming: {} records matched", result.matches());
        Ok(result.finish())
    }
}

/// Open pull reader over the source file
struct Cursor {
    path: PathBuf,
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
    exhausted: bool,
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("path", &self.path)
            .field("position", &self.reader.buffer_position())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

impl Cursor {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        configure(&mut reader);

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            buf: Vec::new(),
            exhausted: false,
        })
    }

    /// Read to the end of the file, handing every completed record (and the
    /// browsable values seen while reading it) to `on_record`.
    fn run<F>(&mut self, schema: &CatalogSchema, mut on_record: F) -> Result<()>
    where
        F: FnMut(Record, &[(usize, String)]) -> Result<()>,
    {
        if self.exhausted {
            log::debug!("streaming: cursor over {} is exhausted", self.path.display());
            return Ok(());
        }
        self.exhausted = true;

        let mut machine = RecordMachine::new(schema);
        loop {
            let event = self.reader.read_event_into(&mut self.buf)?;
            if let Event::Eof = event {
                machine.finish()?;
                break;
            }
            if let Some(record) = machine.feed(event)? {
                on_record(record, &machine.pending)?;
                machine.pending.clear();
            }
            self.buf.clear();
        }
        Ok(())
    }
}

#[derive(Debug)]
enum State {
    /// Not inside a record element
    Outside,
    /// Inside a record, between fields
    Record(RecordBuilder),
    /// Inside a field element of a record, collecting its text
    Field {
        record: RecordBuilder,
        field: usize,
        text: String,
    },
}

fn configure<R>(reader: &mut Reader<R>) {
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    config.check_comments = true;
}

/// Turns reader events into records, rejecting anything that is not
/// well-formed XML along the way
struct RecordMachine<'a> {
    schema: &'a CatalogSchema,
    /// Number of currently open elements
    depth: usize,
    seen_root: bool,
    records: usize,
    state: State,
    /// Browsable values of the record being read
    pending: Vec<(usize, String)>,
    /// Namespace prefixes declared by each open element
    namespaces: Vec<Vec<String>>,
    events: usize,
}

impl<'a> RecordMachine<'a> {
    fn new(schema: &'a CatalogSchema) -> Self {
        Self {
            schema,
            depth: 0,
            seen_root: false,
            records: 0,
            state: State::Outside,
            pending: Vec::new(),
            namespaces: Vec::new(),
            events: 0,
        }
    }

    fn feed(&mut self, event: Event) -> Result<Option<Record>> {
        self.events += 1;
        match event {
            Event::Start(e) => {
                let qname = e.name();
                let name = utf8(qname.as_ref())?;
                self.enter(name, &e)?;
                self.open(local_part(name))?;
                Ok(None)
            }
            Event::End(e) => {
                let qname = e.name();
                let name = utf8(qname.as_ref())?;
                self.namespaces.pop();
                self.close(local_part(name))
            }
            Event::Text(e) => {
                let text = utf8(&e)?;
                if self.depth == 0 && !is_xml_whitespace(text) {
                    return Err(CatalogError::IllFormed(
                        "text outside of the root element".to_string(),
                    ));
                }
                if text.contains("]]>") {
                    return Err(CatalogError::IllFormed(
                        "']]>' is not allowed in text".to_string(),
                    ));
                }
                check_chars(text)?;
                self.push_text(&normalize_newlines(text));
                Ok(None)
            }
            Event::CData(e) => {
                self.inside_root("CDATA section")?;
                let text = utf8(&e)?;
                check_chars(text)?;
                self.push_text(&normalize_newlines(text));
                Ok(None)
            }
            Event::GeneralRef(e) => {
                self.inside_root("reference")?;
                let name = utf8(&e)?;
                let resolved = resolve_entities(&format!("&{};", name))?;
                self.push_text(&resolved);
                Ok(None)
            }
            Event::Comment(e) => {
                check_chars(utf8(&e)?)?;
                Ok(None)
            }
            Event::Decl(_) if self.events == 1 => Ok(None),
            Event::Decl(_) => Err(CatalogError::IllFormed(
                "XML declaration is only allowed at the start of the document".to_string(),
            )),
            Event::DocType(_) => Err(CatalogError::IllFormed(
                "DTD declarations are not supported".to_string(),
            )),
            _ => Ok(None),
        }
    }

    /// Check a start tag's name and attributes and record the namespace
    /// prefixes it declares
    fn enter(&mut self, name: &str, start: &BytesStart) -> Result<()> {
        check_name(name)?;

        let mut declared = Vec::new();
        let mut prefixed = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = utf8(attr.key.as_ref())?;
            check_name(key)?;

            let raw = utf8(&attr.value)?;
            if raw.contains('<') {
                return Err(CatalogError::IllFormed(format!(
                    "'<' in the value of attribute '{}'",
                    key
                )));
            }
            resolve_entities(raw)?;

            match key.split_once(':') {
                Some(("xmlns", prefix)) => declared.push(prefix.to_string()),
                Some(("xml", _)) => {}
                Some((prefix, _)) => prefixed.push(prefix.to_string()),
                None => {}
            }
        }
        self.namespaces.push(declared);

        if let Some((prefix, _)) = name.split_once(':') {
            prefixed.push(prefix.to_string());
        }
        for prefix in prefixed {
            if !self.namespaces.iter().flatten().any(|p| *p == prefix) {
                return Err(CatalogError::IllFormed(format!(
                    "unbound namespace prefix '{}'",
                    prefix
                )));
            }
        }
        Ok(())
    }

    fn inside_root(&self, what: &str) -> Result<()> {
        if self.depth == 0 {
            return Err(CatalogError::IllFormed(format!(
                "{} outside of the root element",
                what
            )));
        }
        Ok(())
    }

    fn open(&mut self, name: &str) -> Result<()> {
        match self.depth {
            0 => {
                if self.seen_root {
                    return Err(CatalogError::IllFormed(
                        "more than one root element".to_string(),
                    ));
                }
                self.seen_root = true;
                super::check_root(self.schema, name)?;
            }
            1 if name == self.schema.record() => {
                self.records += 1;
                self.state = State::Record(RecordBuilder::new(self.schema, self.records));
            }
            2 => {
                if let Some(field) = self.schema.field_for_element(name) {
                    let state = std::mem::replace(&mut self.state, State::Outside);
                    self.state = match state {
                        State::Record(record) => State::Field {
                            record,
                            field,
                            text: String::new(),
                        },
                        other => other,
                    };
                }
            }
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<Option<Record>> {
        self.depth = self.depth.saturating_sub(1);

        match (self.depth, std::mem::replace(&mut self.state, State::Outside)) {
            (
                2,
                State::Field {
                    mut record,
                    field,
                    text,
                },
            ) => {
                let browsable = self.schema.field(field).browsable;
                if !record.is_set(field) && browsable {
                    self.pending.push((field, text.clone()));
                }
                if !record.set(field, text) {
                    log::warn!(
                        "record {}: ignoring repeated <{}> element",
                        self.records,
                        name
                    );
                }
                self.state = State::Record(record);
                Ok(None)
            }
            (1, State::Record(record)) => Ok(Some(record.finish(self.schema)?)),
            (_, state) => {
                self.state = state;
                Ok(None)
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let State::Field { text: buf, .. } = &mut self.state {
            buf.push_str(text);
        }
    }

    fn finish(&self) -> Result<()> {
        if !self.seen_root {
            return Err(CatalogError::IllFormed("no root element".to_string()));
        }
        if self.depth != 0 {
            return Err(CatalogError::IllFormed(
                "unexpected end of file inside an element".to_string(),
            ));
        }
        Ok(())
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| CatalogError::IllFormed(e.to_string()))
}

/// Name after the namespace prefix, if any
fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// A qualified name: one or two non-empty name tokens separated by `:`
fn check_name(name: &str) -> Result<()> {
    let parts: Vec<&str> = name.split(':').collect();
    if parts.len() > 2 || !parts.iter().all(|p| is_name_token(p)) {
        return Err(CatalogError::IllFormed(format!("invalid name '{}'", name)));
    }
    Ok(())
}

fn is_name_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() || !first.is_ascii() => {
            chars.all(|c| matches!(c, '_' | '-' | '.') || c.is_alphanumeric() || !c.is_ascii())
        }
        _ => false,
    }
}

fn is_xml_whitespace(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

/// Characters allowed by the XML `Char` production
fn check_chars(text: &str) -> Result<()> {
    let invalid = text.chars().find(|&c| {
        !matches!(
            c,
            '\t' | '\n'
                | '\r'
                | '\u{20}'..='\u{D7FF}'
                | '\u{E000}'..='\u{FFFD}'
                | '\u{10000}'..='\u{10FFFF}'
        )
    });
    match invalid {
        Some(c) => Err(CatalogError::IllFormed(format!(
            "character U+{:04X} is not allowed in XML",
            c as u32
        ))),
        None => Ok(()),
    }
}

/// Resolve predefined entities and character references in `raw`
fn resolve_entities(raw: &str) -> Result<String> {
    let resolved = quick_xml::escape::unescape(raw)
        .map_err(|err| CatalogError::IllFormed(err.to_string()))?
        .into_owned();
    check_chars(&resolved)?;
    Ok(resolved)
}

/// XML end-of-line handling: `\r\n` and lone `\r` become `\n`
fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
