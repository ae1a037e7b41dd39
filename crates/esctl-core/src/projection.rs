// crates/esctl-core/src/projection.rs - Row/Entity Projection
//
// Every command ends the same way: a JSON document (or a list of them) comes
// back from the cluster and has to be shown either as a table (one row per
// document) or as a key/value view of a single document. This module does
// that projection with a declarative list of columns.
//
// CONTRACT:
// - Lookups are flat: `document[column.id]` by exact key. Nested structures
//   must be flattened first (see `flatten`).
// - Missing keys are normal and resolve to the configured default value.
// - Column order and row order are preserved, nothing is sorted implicitly.
// - Input documents are never mutated.
//
// EXAMPLE:
// ```text
// documents: [{"ip": "10.0.0.1", "disk.percent": "22"}]
// columns:   [("ip", "IP"), "disk.percent", "node"]
//
//   IP        | Disk % | Node
//   10.0.0.1  | 22     | null
// ```

use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

use crate::naming::display_name;
use crate::style::Tone;

/// Errors raised when the caller hands over data of the wrong shape
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Document #{index} is not a JSON object (found {found})")]
    NotAnObject { index: usize, found: &'static str },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

/// Result type for projection operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// A column (or entity field) to extract from a document
///
/// The label is optional: when absent it is derived from the id with the
/// namer. Both arities convert with `From`, so column lists read naturally:
///
/// ```
/// use esctl_core::projection::{columns, ColumnSpec};
///
/// let specs = columns([("ip", "IP")]);
/// assert_eq!(specs[0], ColumnSpec::labeled("ip", "IP"));
/// let specs = columns(["disk.percent"]);
/// assert_eq!(specs[0].label(true), "Disk %");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    id: String,
    label: Option<String>,
}

impl ColumnSpec {
    /// Column whose label is derived from its id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    /// Column with an explicit label
    pub fn labeled(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: Some(label.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Explicit label if any, otherwise the namer's rendering of the id
    pub fn label(&self, pretty: bool) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => display_name(&self.id, pretty),
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ColumnSpec {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<(&str, &str)> for ColumnSpec {
    fn from((id, label): (&str, &str)) -> Self {
        Self::labeled(id, label)
    }
}

/// Build a column list from anything convertible into `ColumnSpec`
pub fn columns<I, C>(specs: I) -> Vec<ColumnSpec>
where
    I: IntoIterator<Item = C>,
    C: Into<ColumnSpec>,
{
    specs.into_iter().map(Into::into).collect()
}

/// One column per key of the object, in the object's own order
pub fn fields_from_keys(document: &Map<String, Value>) -> Vec<ColumnSpec> {
    document.keys().map(|key| ColumnSpec::new(key.as_str())).collect()
}

/// Text form of a value as shown in a terminal
///
/// Strings lose their quotes and null becomes the empty string; everything
/// else is rendered as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Multi-row view: ordered headers and rows aligned on them
///
/// Cells may carry a highlight tone. Tones travel with their row through
/// `sort_by` and `select`, and only the renderer turns them into colour, so
/// sorting always sees the raw values.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    ids: Vec<String>,
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
    tones: Vec<Vec<Option<Tone>>>,
}

impl Table {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Highlight tone of every cell, aligned on `rows()`
    pub fn tones(&self) -> &[Vec<Option<Tone>>] {
        &self.tones
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tone cells from the documents the table was projected from
    ///
    /// `tones_of` names cells by column id. Ids that are not columns of the
    /// table are ignored.
    pub fn highlight<D>(&mut self, documents: &[D], tones_of: impl Fn(&D) -> Vec<(&'static str, Tone)>) {
        for (row, document) in documents.iter().enumerate().take(self.rows.len()) {
            for (id, tone) in tones_of(document) {
                for pos in positions_of(&self.ids, id) {
                    self.tones[row][pos] = Some(tone);
                }
            }
        }
    }

    /// Keep only the named columns, in the order they are requested
    pub fn select(&self, labels: &[String]) -> ProjectionResult<Table> {
        let positions = labels
            .iter()
            .map(|label| self.position(label))
            .collect::<ProjectionResult<Vec<_>>>()?;

        let pick = |row: &Vec<Value>| -> Vec<Value> { positions.iter().map(|&pos| row[pos].clone()).collect() };
        let tones = self
            .tones
            .iter()
            .map(|row| positions.iter().map(|&pos| row[pos]).collect())
            .collect();

        Ok(Table {
            ids: positions.iter().map(|&pos| self.ids[pos].clone()).collect(),
            headers: labels.to_vec(),
            rows: self.rows.iter().map(pick).collect(),
            tones,
        })
    }

    /// Stable sort of the rows on the named columns, first label first
    pub fn sort_by(&mut self, labels: &[String]) -> ProjectionResult<()> {
        let positions = labels
            .iter()
            .map(|label| self.position(label))
            .collect::<ProjectionResult<Vec<_>>>()?;

        let mut rows: Vec<_> = std::mem::take(&mut self.rows)
            .into_iter()
            .zip(std::mem::take(&mut self.tones))
            .collect();

        rows.sort_by(|(a, _), (b, _)| {
            positions
                .iter()
                .map(|&pos| compare_values(&a[pos], &b[pos]))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        (self.rows, self.tones) = rows.into_iter().unzip();
        Ok(())
    }

    /// Rows as label-keyed objects, the shape JSON and YAML outputs use
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    fn position(&self, label: &str) -> ProjectionResult<usize> {
        self.headers
            .iter()
            .position(|header| header == label)
            .ok_or_else(|| ProjectionError::UnknownColumn(label.to_string()))
    }
}

/// Single-document view: ordered keys and their values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    ids: Vec<String>,
    keys: Vec<String>,
    values: Vec<Value>,
    tones: Vec<Option<Tone>>,
}

impl Entity {
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn tones(&self) -> &[Option<Tone>] {
        &self.tones
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.keys.iter().zip(self.values.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Tone the field with this id, if the entity has it
    pub fn highlight(&mut self, id: &str, tone: Tone) {
        for pos in positions_of(&self.ids, id) {
            self.tones[pos] = Some(tone);
        }
    }

    /// Keep only the named keys, in the order they are requested
    pub fn select(&self, labels: &[String]) -> ProjectionResult<Entity> {
        let mut selected = Entity::default();
        for label in labels {
            let pos = self
                .keys
                .iter()
                .position(|key| key == label)
                .ok_or_else(|| ProjectionError::UnknownColumn(label.clone()))?;
            selected.ids.push(self.ids[pos].clone());
            selected.keys.push(label.clone());
            selected.values.push(self.values[pos].clone());
            selected.tones.push(self.tones[pos]);
        }

        Ok(selected)
    }

    pub fn to_record(&self) -> Map<String, Value> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Projects documents onto column lists
///
/// Two knobs: whether derived labels are pretty (`Disk %`) or raw
/// (`disk.percent`), and what a missing key resolves to.
#[derive(Debug, Clone)]
pub struct Projector {
    pretty: bool,
    missing: Value,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            pretty: true,
            missing: Value::Null,
        }
    }
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn missing_default(mut self, missing: Value) -> Self {
        self.missing = missing;
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    /// Lister view: one row per document, one value per column
    pub fn project(&self, documents: &[Value], columns: &[ColumnSpec]) -> ProjectionResult<Table> {
        let objects = documents
            .iter()
            .enumerate()
            .map(|(index, document)| as_object(document, index))
            .collect::<ProjectionResult<Vec<_>>>()?;

        Ok(self.table(objects.into_iter(), columns))
    }

    /// Same as `project` for callers that already hold objects
    pub fn project_objects(&self, documents: &[Map<String, Value>], columns: &[ColumnSpec]) -> Table {
        self.table(documents.iter(), columns)
    }

    /// Show-one view: the listed fields of a single document
    pub fn project_one(&self, document: &Value, fields: &[ColumnSpec]) -> ProjectionResult<Entity> {
        let object = as_object(document, 0)?;
        Ok(self.project_object(object, fields))
    }

    pub fn project_object(&self, document: &Map<String, Value>, fields: &[ColumnSpec]) -> Entity {
        Entity {
            ids: ids(fields),
            keys: self.labels(fields),
            values: self.row(document, fields),
            tones: vec![None; fields.len()],
        }
    }

    fn table<'a>(
        &self,
        documents: impl Iterator<Item = &'a Map<String, Value>>,
        columns: &[ColumnSpec],
    ) -> Table {
        let rows: Vec<_> = documents.map(|object| self.row(object, columns)).collect();
        Table {
            ids: ids(columns),
            headers: self.labels(columns),
            tones: vec![vec![None; columns.len()]; rows.len()],
            rows,
        }
    }

    fn labels(&self, columns: &[ColumnSpec]) -> Vec<String> {
        columns.iter().map(|c| c.label(self.pretty)).collect()
    }

    fn row(&self, document: &Map<String, Value>, columns: &[ColumnSpec]) -> Vec<Value> {
        columns
            .iter()
            .map(|column| {
                document
                    .get(column.id())
                    .cloned()
                    .unwrap_or_else(|| self.missing.clone())
            })
            .collect()
    }
}

fn ids(columns: &[ColumnSpec]) -> Vec<String> {
    columns.iter().map(|c| c.id().to_string()).collect()
}

fn positions_of<'a>(ids: &'a [String], id: &'a str) -> impl Iterator<Item = usize> + 'a {
    ids.iter()
        .enumerate()
        .filter(move |(_, candidate)| *candidate == id)
        .map(|(pos, _)| pos)
}

fn as_object(document: &Value, index: usize) -> ProjectionResult<&Map<String, Value>> {
    document.as_object().ok_or(ProjectionError::NotAnObject {
        index,
        found: kind_of(document),
    })
}

/// JSON type name used in error messages
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordering used by `--sort-column`
///
/// Cat APIs return numbers as strings, so anything that parses as a number
/// compares numerically. Nulls come first, then numbers, then text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (SortKey::of(a), SortKey::of(b)) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(&y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(&y),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

enum SortKey {
    Null,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: &Value) -> Self {
        if value.is_null() {
            return SortKey::Null;
        }
        let text = display_value(value);
        match text.parse::<f64>() {
            Ok(number) => SortKey::Number(number),
            Err(_) => SortKey::Text(text),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}
