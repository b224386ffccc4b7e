// ABOUTME: Converts PostgreSQL result rows into JSON objects keyed by column name
// ABOUTME: Dispatches on the column type name and falls back to text, then null, for unknown types

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Decode, Postgres, Row as _, Type, TypeInfo};
use uuid::Uuid;

/// One result row, column name to value, in select-list order
pub type Row = Map<String, Value>;

/// Convert a Postgres row into a JSON object
///
/// Duplicate column names keep the last value.
#[must_use]
pub fn row_to_json(row: &PgRow) -> Row {
    let mut object = Map::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = column_value(row, index, column.type_info().name());
        object.insert(column.name().to_owned(), value);
    }
    object
}

fn column_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOL" => decode::<bool>(row, index).map(|v| v.map(Value::Bool)),
        "INT2" => decode::<i16>(row, index).map(|v| v.map(Value::from)),
        "INT4" => decode::<i32>(row, index).map(|v| v.map(Value::from)),
        "INT8" => decode::<i64>(row, index).map(|v| v.map(Value::from)),
        "FLOAT4" => decode::<f32>(row, index).map(|v| v.map(|f| float_value(f64::from(f)))),
        "FLOAT8" => decode::<f64>(row, index).map(|v| v.map(float_value)),
        "NUMERIC" => decode::<Decimal>(row, index).map(|v| v.map(numeric_value)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            decode::<String>(row, index).map(|v| v.map(Value::String))
        }
        "UUID" => decode::<Uuid>(row, index).map(|v| v.map(|u| Value::String(u.to_string()))),
        "JSON" | "JSONB" => decode::<Value>(row, index),
        "DATE" => decode::<NaiveDate>(row, index).map(|v| v.map(|d| Value::String(d.to_string()))),
        "TIME" => decode::<NaiveTime>(row, index).map(|v| v.map(|t| Value::String(t.to_string()))),
        "TIMESTAMP" => decode::<NaiveDateTime>(row, index).map(|v| {
            v.map(|ts| Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        }),
        "TIMESTAMPTZ" => {
            decode::<DateTime<Utc>>(row, index).map(|v| v.map(|ts| Value::String(ts.to_rfc3339())))
        }
        _ => None,
    };

    match decoded {
        Some(value) => value.unwrap_or(Value::Null),
        None => text_fallback(row, index),
    }
}

/// `Some(Some(v))` decoded, `Some(None)` SQL null, `None` decode failure
fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<Option<T>>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

fn text_fallback(row: &PgRow, index: usize) -> Value {
    row.try_get_unchecked::<Option<String>, _>(index)
        .ok()
        .flatten()
        .map_or(Value::Null, Value::String)
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn numeric_value(value: Decimal) -> Value {
    if value.scale() == 0 {
        if let Some(int) = value.to_i64() {
            return Value::from(int);
        }
    }
    value
        .to_f64()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(value.to_string()), Value::Number)
}
