//! Storage types for the node/edge property-graph schema and value type inference.
//!
//! Every annotated expression in the target AST carries exactly one [`DataType`]. Values bound
//! to literals and parameters are typed with [`infer_type`], which mirrors the width of the value
//! that produced them: an `i16` is an `int2`, an `i64` is an `int8`, and so on.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::errors::TypeError;

/// Physical table holding graph nodes.
pub const NODE_TABLE: &str = "node";
/// Physical table holding graph edges.
pub const EDGE_TABLE: &str = "edge";

pub const COLUMN_ID: &str = "id";
pub const COLUMN_KIND_IDS: &str = "kind_ids";
pub const COLUMN_KIND_ID: &str = "kind_id";
pub const COLUMN_PROPERTIES: &str = "properties";
pub const COLUMN_START_ID: &str = "start_id";
pub const COLUMN_END_ID: &str = "end_id";
pub const COLUMN_GRAPH_ID: &str = "graph_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DataType {
    Unknown,
    Null,
    Node,
    NodeArray,
    Edge,
    EdgeArray,
    Path,
    PathArray,
    Int2,
    Int2Array,
    Int4,
    Int4Array,
    Int8,
    Int8Array,
    Float4,
    Float4Array,
    Float8,
    Float8Array,
    Boolean,
    BooleanArray,
    Text,
    TextArray,
    Jsonb,
    Date,
    TimeWithTimeZone,
    TimeWithoutTimeZone,
    Interval,
    TimestampWithTimeZone,
    TimestampWithoutTimeZone,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Unknown => "UNKNOWN",
            DataType::Null => "NULL",
            DataType::Node => "nodeComposite",
            DataType::NodeArray => "nodeComposite[]",
            DataType::Edge => "edgeComposite",
            DataType::EdgeArray => "edgeComposite[]",
            DataType::Path => "pathComposite",
            DataType::PathArray => "pathComposite[]",
            DataType::Int2 => "int2",
            DataType::Int2Array => "int2[]",
            DataType::Int4 => "int4",
            DataType::Int4Array => "int4[]",
            DataType::Int8 => "int8",
            DataType::Int8Array => "int8[]",
            DataType::Float4 => "float4",
            DataType::Float4Array => "float4[]",
            DataType::Float8 => "float8",
            DataType::Float8Array => "float8[]",
            DataType::Boolean => "bool",
            DataType::BooleanArray => "bool[]",
            DataType::Text => "text",
            DataType::TextArray => "text[]",
            DataType::Jsonb => "jsonb",
            DataType::Date => "date",
            DataType::TimeWithTimeZone => "time with time zone",
            DataType::TimeWithoutTimeZone => "time without time zone",
            DataType::Interval => "interval",
            DataType::TimestampWithTimeZone => "timestamp with time zone",
            DataType::TimestampWithoutTimeZone => "timestamp without time zone",
        }
    }

    pub fn is_array_type(&self) -> bool {
        matches!(
            self,
            DataType::NodeArray
                | DataType::EdgeArray
                | DataType::PathArray
                | DataType::Int2Array
                | DataType::Int4Array
                | DataType::Int8Array
                | DataType::Float4Array
                | DataType::Float8Array
                | DataType::BooleanArray
                | DataType::TextArray
        )
    }

    /// Composite pseudo-types describe whole graph entities rather than scalar columns.
    pub fn is_composite(&self) -> bool {
        matches!(self, DataType::Node | DataType::Edge | DataType::Path)
    }

    /// Types that must be pulled out of a JSONB property bag as text before casting.
    pub fn requires_text_extraction(&self) -> bool {
        matches!(
            self,
            DataType::Text
                | DataType::Date
                | DataType::TimeWithTimeZone
                | DataType::TimeWithoutTimeZone
                | DataType::TimestampWithTimeZone
                | DataType::TimestampWithoutTimeZone
        )
    }

    pub fn array_base_type(&self) -> Result<DataType, TypeError> {
        match self {
            DataType::NodeArray => Ok(DataType::Node),
            DataType::EdgeArray => Ok(DataType::Edge),
            DataType::PathArray => Ok(DataType::Path),
            DataType::Int2Array => Ok(DataType::Int2),
            DataType::Int4Array => Ok(DataType::Int4),
            DataType::Int8Array => Ok(DataType::Int8),
            DataType::Float4Array => Ok(DataType::Float4),
            DataType::Float8Array => Ok(DataType::Float8),
            DataType::BooleanArray => Ok(DataType::Boolean),
            DataType::TextArray => Ok(DataType::Text),
            _ => Err(TypeError::NotAnArrayType(*self)),
        }
    }

    pub fn to_array_type(&self) -> Result<DataType, TypeError> {
        match self {
            DataType::Node => Ok(DataType::NodeArray),
            DataType::Edge => Ok(DataType::EdgeArray),
            DataType::Path => Ok(DataType::PathArray),
            DataType::Int2 => Ok(DataType::Int2Array),
            DataType::Int4 => Ok(DataType::Int4Array),
            DataType::Int8 => Ok(DataType::Int8Array),
            DataType::Float4 => Ok(DataType::Float4Array),
            DataType::Float8 => Ok(DataType::Float8Array),
            DataType::Boolean => Ok(DataType::BooleanArray),
            DataType::Text => Ok(DataType::TextArray),
            _ if self.is_array_type() => Ok(*self),
            _ => Err(TypeError::NoArrayForm(*self)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value bound to a literal or parameter.
///
/// Serializes to the JSON shape the storage driver binds for the parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Int16Array(Vec<i16>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    Float32Array(Vec<f32>),
    Float64Array(Vec<f64>),
    StringArray(Vec<String>),
    Timestamp(DateTime<FixedOffset>),
    /// Pre-encoded JSONB carrier.
    Jsonb(serde_json::Value),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Value::Int16(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<i16>> for Value {
    fn from(value: Vec<i16>) -> Self {
        Value::Int16Array(value)
    }
}

impl From<Vec<i32>> for Value {
    fn from(value: Vec<i32>) -> Self {
        Value::Int32Array(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::Int64Array(value)
    }
}

impl From<Vec<f32>> for Value {
    fn from(value: Vec<f32>) -> Self {
        Value::Float32Array(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(value: Vec<f64>) -> Self {
        Value::Float64Array(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::StringArray(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(value: Vec<&str>) -> Self {
        Value::StringArray(value.into_iter().map(str::to_string).collect())
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Jsonb(value)
    }
}

/// Resolve the storage type of a bound value.
///
/// Lists are typed element-wise: every non-null element must agree on one type, and the list
/// takes that type's array form. An empty or all-null list has no concrete type and resolves to
/// [`DataType::Unknown`] so the caller can pick a contextual default.
pub fn infer_type(value: &Value) -> Result<DataType, TypeError> {
    let data_type = match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Int16(_) => DataType::Int2,
        Value::Int32(_) => DataType::Int4,
        Value::Int64(_) => DataType::Int8,
        Value::Float32(_) => DataType::Float4,
        Value::Float64(_) => DataType::Float8,
        Value::String(_) => DataType::Text,
        Value::Int16Array(_) => DataType::Int2Array,
        Value::Int32Array(_) => DataType::Int4Array,
        Value::Int64Array(_) => DataType::Int8Array,
        Value::Float32Array(_) => DataType::Float4Array,
        Value::Float64Array(_) => DataType::Float8Array,
        Value::StringArray(_) => DataType::TextArray,
        Value::Timestamp(_) => DataType::TimestampWithTimeZone,
        Value::Jsonb(_) | Value::Map(_) => DataType::Jsonb,
        Value::List(values) => return infer_list_type(values.iter().map(infer_type)),
    };

    Ok(data_type)
}

/// Fold element types of a list into the list's array type.
pub fn infer_list_type<I>(element_types: I) -> Result<DataType, TypeError>
where
    I: IntoIterator<Item = Result<DataType, TypeError>>,
{
    let mut list_type: Option<DataType> = None;

    for element_type in element_types {
        let element_type = element_type?;

        if matches!(element_type, DataType::Null | DataType::Unknown) {
            continue;
        }

        match list_type {
            None => list_type = Some(element_type),
            Some(existing) if existing != element_type => {
                return Err(TypeError::MixedListTypes(existing, element_type));
            }
            Some(_) => {}
        }
    }

    match list_type {
        Some(element_type) => element_type.to_array_type(),
        None => Ok(DataType::Unknown),
    }
}
