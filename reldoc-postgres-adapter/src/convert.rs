//! Conversions between reldoc values and Postgres wire types.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use postgres::types::{ToSql, Type};
use postgres::Row as PgRow;

use reldoc::backend::Row;
use reldoc::{Document, ErrorKind, ReldocError, ReldocResult, Value};

/// An owned parameter ready for binding.
///
/// The driver borrows parameters as `&(dyn ToSql + Sync)`, so each
/// bound value needs a stable owner for the duration of the call.
#[derive(Debug)]
pub(crate) enum PgParam {
    Null(Option<String>),
    Bool(bool),
    Int8(i64),
    Float8(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
    TextArray(Vec<String>),
    Int8Array(Vec<i64>),
    Float8Array(Vec<f64>),
}

impl PgParam {
    pub(crate) fn as_tosql(&self) -> &(dyn ToSql + Sync) {
        match self {
            PgParam::Null(value) => value,
            PgParam::Bool(value) => value,
            PgParam::Int8(value) => value,
            PgParam::Float8(value) => value,
            PgParam::Text(value) => value,
            PgParam::Timestamp(value) => value,
            PgParam::Json(value) => value,
            PgParam::TextArray(value) => value,
            PgParam::Int8Array(value) => value,
            PgParam::Float8Array(value) => value,
        }
    }
}

/// Converts one bound value into its driver parameter.
///
/// Arrays must be homogeneous; they arrive from `in`/`containsAny`
/// conditions and bind as Postgres arrays for `ANY($n)`. Documents
/// bind as JSON.
pub(crate) fn value_to_param(value: &Value) -> ReldocResult<PgParam> {
    match value {
        Value::Null => Ok(PgParam::Null(None)),
        Value::Bool(b) => Ok(PgParam::Bool(*b)),
        Value::I64(i) => Ok(PgParam::Int8(*i)),
        Value::F64(f) => Ok(PgParam::Float8(*f)),
        Value::String(s) => Ok(PgParam::Text(s.clone())),
        Value::DateTime(dt) => Ok(PgParam::Timestamp(dt.naive_utc())),
        Value::Document(doc) => Ok(PgParam::Json(document_to_json(doc))),
        Value::Array(items) => array_to_param(items),
    }
}

fn array_to_param(items: &[Value]) -> ReldocResult<PgParam> {
    if items.iter().all(|item| matches!(item, Value::String(_))) {
        let texts = items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        return Ok(PgParam::TextArray(texts));
    }
    if items.iter().all(|item| matches!(item, Value::I64(_))) {
        return Ok(PgParam::Int8Array(
            items.iter().filter_map(Value::as_i64).collect(),
        ));
    }
    if items
        .iter()
        .all(|item| matches!(item, Value::I64(_) | Value::F64(_)))
    {
        return Ok(PgParam::Float8Array(
            items.iter().filter_map(Value::as_f64).collect(),
        ));
    }
    if items.is_empty() {
        // an empty containment list matches nothing either way
        return Ok(PgParam::TextArray(Vec::new()));
    }
    Err(ReldocError::new(
        "array parameters must be homogeneous strings or numbers",
        ErrorKind::InvalidDataType,
    ))
}

pub(crate) fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::I64(i) => serde_json::Value::from(*i),
        Value::F64(f) => serde_json::Value::from(*f),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Document(doc) => document_to_json(doc),
    }
}

pub(crate) fn document_to_json(document: &Document) -> serde_json::Value {
    serde_json::Value::Object(
        document
            .iter()
            .map(|(key, value)| (key.clone(), value_to_json(value)))
            .collect(),
    )
}

pub(crate) fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(number) => {
            if let Some(i) = number.as_i64() {
                Value::I64(i)
            } else {
                Value::F64(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => Value::Document(
            map.into_iter()
                .map(|(key, value)| (key, json_to_value(value)))
                .collect(),
        ),
    }
}

/// Decodes one driver row into a backend [Row], column by column.
pub(crate) fn decode_row(pg_row: &PgRow) -> ReldocResult<Row> {
    let mut row = Row::new();
    for (index, column) in pg_row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = match *ty {
            Type::BOOL => pg_row
                .try_get::<_, Option<bool>>(index)
                .map(|v| v.map(Value::Bool).unwrap_or(Value::Null)),
            Type::INT2 => pg_row
                .try_get::<_, Option<i16>>(index)
                .map(|v| v.map(|i| Value::I64(i as i64)).unwrap_or(Value::Null)),
            Type::INT4 => pg_row
                .try_get::<_, Option<i32>>(index)
                .map(|v| v.map(|i| Value::I64(i as i64)).unwrap_or(Value::Null)),
            Type::INT8 => pg_row
                .try_get::<_, Option<i64>>(index)
                .map(|v| v.map(Value::I64).unwrap_or(Value::Null)),
            Type::FLOAT4 => pg_row
                .try_get::<_, Option<f32>>(index)
                .map(|v| v.map(|f| Value::F64(f as f64)).unwrap_or(Value::Null)),
            Type::FLOAT8 => pg_row
                .try_get::<_, Option<f64>>(index)
                .map(|v| v.map(Value::F64).unwrap_or(Value::Null)),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR => pg_row
                .try_get::<_, Option<String>>(index)
                .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
            Type::TIMESTAMP => pg_row
                .try_get::<_, Option<NaiveDateTime>>(index)
                .map(|v| {
                    v.map(|naive| Value::DateTime(Utc.from_utc_datetime(&naive)))
                        .unwrap_or(Value::Null)
                }),
            Type::TIMESTAMPTZ => pg_row
                .try_get::<_, Option<DateTime<Utc>>>(index)
                .map(|v| v.map(Value::DateTime).unwrap_or(Value::Null)),
            Type::JSON | Type::JSONB => pg_row
                .try_get::<_, Option<serde_json::Value>>(index)
                .map(|v| v.map(json_to_value).unwrap_or(Value::Null)),
            _ => pg_row
                .try_get::<_, Option<String>>(index)
                .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
        }
        .map_err(|e| {
            ReldocError::new(
                format!("cannot decode column {} of type {}: {}", column.name(), ty, e),
                ErrorKind::BackendError,
            )
        })?;
        row.set(column.name(), value);
    }
    Ok(row)
}
