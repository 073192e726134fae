//! # Spreadsheet Node Attributes
//!
//! Typed view over the `attrs` object of a spreadsheet node.
//!
//! Reading is lenient: a missing or malformed `data` attribute reads as the
//! 3×3 default grid, but the default is never written back on its own. Only
//! an [`AttributePatch`] (an actual edit) changes what is stored.

use crate::content::ContentNode;
use crate::schema::{DEFAULT_TITLE, NODE_NAME};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// Number of rows and columns of the default grid
pub const DEFAULT_GRID_SIZE: usize = 3;

/// Single cell: text, number or empty
///
/// Numbers compare by value, so `1` and `1.0` are the same cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(Number),
    Text(String),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => numbers_equal(a, b),
            _ => false,
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(CellValue::Null),
            Value::Number(n) => Some(CellValue::Number(n.clone())),
            Value::String(s) => Some(CellValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n.into())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// Rectangular grid of cells, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellMatrix(Vec<Vec<CellValue>>);

impl CellMatrix {
    /// Build from rows; `None` if the rows differ in length
    pub fn new(rows: Vec<Vec<CellValue>>) -> Option<Self> {
        let matrix = CellMatrix(rows);
        matrix.is_rectangular().then_some(matrix)
    }

    /// The 3×3 grid of empty strings used when a node has no usable data
    pub fn default_grid() -> Self {
        CellMatrix(vec![
            vec![CellValue::empty(); DEFAULT_GRID_SIZE];
            DEFAULT_GRID_SIZE
        ])
    }

    /// Strict read of a JSON value: array of equally long arrays of scalars
    pub fn from_json(value: &Value) -> Option<Self> {
        let rows = value.as_array()?;
        let rows = rows
            .iter()
            .map(|row| {
                row.as_array()?
                    .iter()
                    .map(CellValue::from_json)
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()?;
        CellMatrix::new(rows)
    }

    /// Lenient read: anything malformed or absent becomes the default grid
    pub fn normalize(value: Option<&Value>) -> Self {
        value.and_then(Self::from_json).unwrap_or_else(Self::default_grid)
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.0
    }

    pub fn row_count(&self) -> usize {
        self.0.len()
    }

    pub fn column_count(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.0.get(row)?.get(col)
    }

    /// Overwrite one cell; returns false when out of range
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        match self.0.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// "cols × rows" label shown in the widget header
    pub fn shape_label(&self) -> String {
        format!("{} × {}", self.column_count(), self.row_count())
    }

    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.0.iter().all(|row| row.len() == width)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .map(|row| {
                    Value::Array(
                        row.iter()
                            .map(|cell| match cell {
                                CellValue::Null => Value::Null,
                                CellValue::Number(n) => Value::Number(n.clone()),
                                CellValue::Text(s) => Value::String(s.clone()),
                            })
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.0
    }
}

impl Default for CellMatrix {
    fn default() -> Self {
        Self::default_grid()
    }
}

/// Named expression handed to the formula engine, e.g. `TAX_RATE = 0.2`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExpression {
    pub name: String,
    pub expression: ExpressionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionValue {
    Number(Number),
    Text(String),
}

/// Display options for the live grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    #[serde(default = "default_true")]
    pub col_headers: bool,

    #[serde(default = "default_true")]
    pub row_headers: bool,

    #[serde(default = "default_height")]
    pub height: Value,

    #[serde(default = "default_width")]
    pub width: Value,

    #[serde(default = "default_license_key")]
    pub license_key: String,

    /// Options this crate does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_height() -> Value {
    Value::String("auto".to_string())
}

fn default_width() -> Value {
    Value::String("100%".to_string())
}

fn default_license_key() -> String {
    "non-commercial-and-evaluation".to_string()
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            col_headers: true,
            row_headers: true,
            height: default_height(),
            width: default_width(),
            license_key: default_license_key(),
            extra: Map::new(),
        }
    }
}

impl TableConfig {
    /// Read a stored config one key at a time
    ///
    /// A recognized key with the wrong type falls back to its default and
    /// leaves the other keys alone; anything that is not an object reads as
    /// the default config.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            warn!("Spreadsheet config is not an object, using defaults");
            return Self::default();
        };

        let mut config = Self::default();
        for (key, value) in object {
            let applied = match key.as_str() {
                "colHeaders" => read_field(value, &mut config.col_headers),
                "rowHeaders" => read_field(value, &mut config.row_headers),
                "height" => read_field(value, &mut config.height),
                "width" => read_field(value, &mut config.width),
                "licenseKey" => read_field(value, &mut config.license_key),
                _ => {
                    config.extra.insert(key.clone(), value.clone());
                    true
                }
            };
            if !applied {
                warn!(key = %key, "Ignoring mistyped spreadsheet config value");
            }
        }
        config
    }
}

fn read_field<T: serde::de::DeserializeOwned>(value: &Value, field: &mut T) -> bool {
    match T::deserialize(value) {
        Ok(parsed) => {
            *field = parsed;
            true
        }
        Err(_) => false,
    }
}

/// Attributes of one spreadsheet node as read from the tree
///
/// `id`, `title` and `data` stay optional so callers can tell "absent"
/// from "default"; use the `*_or_default` accessors for display values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetAttrs {
    pub id: Option<String>,
    pub title: Option<String>,
    pub data: Option<Value>,
    pub formulas: Vec<Value>,
    pub named_expressions: Vec<NamedExpression>,
    pub config: TableConfig,
}

impl WidgetAttrs {
    /// Attributes for a freshly inserted node
    pub fn new_with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(DEFAULT_TITLE.to_string()),
            data: Some(CellMatrix::default_grid().to_json()),
            ..Default::default()
        }
    }

    /// Defaults for a node inserted by the user, with a fresh id
    pub fn default_for_insert() -> Self {
        Self::new_with_id(crate::id_generator::generate_id())
    }

    /// Read attributes from any node, tolerating missing or malformed fields
    pub fn from_node(node: &ContentNode) -> Self {
        let id = node
            .attr_str("id")
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let title = node
            .attr_str("title")
            .filter(|title| !title.is_empty())
            .map(str::to_string);

        let formulas = node
            .attr("formulas")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let config = node
            .attr("config")
            .map(TableConfig::from_value)
            .unwrap_or_default();

        Self {
            id,
            title,
            data: node.attr("data").filter(|v| !v.is_null()).cloned(),
            formulas,
            named_expressions: read_named_expressions(node.attr("namedExpressions")),
            config,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Cell data, normalized to the default grid when absent or malformed
    pub fn data_or_default(&self) -> CellMatrix {
        CellMatrix::normalize(self.data.as_ref())
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Full attribute object, suitable for a new node
    pub fn to_attrs_map(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        if let Some(id) = &self.id {
            attrs.insert("id".into(), Value::String(id.clone()));
        }
        attrs.insert("title".into(), Value::String(self.title_or_default().to_string()));
        attrs.insert("data".into(), self.data.clone().unwrap_or_else(|| CellMatrix::default_grid().to_json()));
        attrs.insert("formulas".into(), Value::Array(self.formulas.clone()));
        attrs.insert(
            "namedExpressions".into(),
            serde_json::to_value(&self.named_expressions).unwrap_or(Value::Array(Vec::new())),
        );
        attrs.insert(
            "config".into(),
            serde_json::to_value(&self.config).unwrap_or(Value::Object(Map::new())),
        );
        attrs
    }

    pub fn to_node(&self) -> ContentNode {
        ContentNode::new(NODE_NAME).with_attrs(self.to_attrs_map())
    }
}

/// Entries that fail to parse are dropped; later duplicates of a name are ignored
fn read_named_expressions(value: Option<&Value>) -> Vec<NamedExpression> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<NamedExpression>(item.clone()).ok())
        .filter(|expr| seen.insert(expr.name.clone()))
        .collect()
}

/// Partial attribute update sent through the host's patch channel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<CellMatrix>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formulas: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_expressions: Option<Vec<NamedExpression>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TableConfig>,
}

impl AttributePatch {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Patch written by a debounced commit
    pub fn commit(id: impl Into<String>, title: impl Into<String>, data: CellMatrix) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into an attribute object; fields not set in the patch are left alone
    pub fn apply_to(&self, attrs: &mut Map<String, Value>) {
        if let Some(id) = &self.id {
            attrs.insert("id".into(), Value::String(id.clone()));
        }
        if let Some(title) = &self.title {
            attrs.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(data) = &self.data {
            attrs.insert("data".into(), data.to_json());
        }
        if let Some(formulas) = &self.formulas {
            attrs.insert("formulas".into(), Value::Array(formulas.clone()));
        }
        if let Some(exprs) = &self.named_expressions {
            if let Ok(value) = serde_json::to_value(exprs) {
                attrs.insert("namedExpressions".into(), value);
            }
        }
        if let Some(config) = &self.config {
            if let Ok(value) = serde_json::to_value(config) {
                attrs.insert("config".into(), value);
            }
        }
    }
}
