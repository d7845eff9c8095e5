//! Arrow schema inference and record to Arrow conversion
//!
//! Normalized records are deeply nested and not uniform across a page: a
//! field that repeats in one record may occur once in the next, and an
//! element with attributes becomes an object where a bare one is a string.
//! Inference therefore merges structs field by field, widens a single value
//! to a list when the same field is a list elsewhere, and falls back to a
//! JSON string for anything else.

use crate::error::{Error, Result};
use crate::types::Record;
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray,
    StructArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::sync::Arc;

/// Infer an Arrow schema from a page of records
///
/// Fields keep first-seen order. Every field is nullable; fields that are
/// `null` in every record become strings.
pub fn infer_schema(records: &[Record]) -> Schema {
    let mut fields: Vec<(String, DataType)> = Vec::new();

    for record in records {
        for (key, value) in record {
            let inferred = infer_type(value);
            match fields.iter_mut().find(|(name, _)| name == key) {
                Some((_, existing)) => *existing = merge_types(existing, &inferred),
                None => fields.push((key.clone(), inferred)),
            }
        }
    }

    Schema::new(
        fields
            .into_iter()
            .map(|(name, dtype)| Field::new(name, resolve_nulls(dtype), true))
            .collect::<Vec<_>>(),
    )
}

/// Convert records to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data.
pub fn records_to_arrow(records: &[Record], schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(records),
    };
    let schema = Arc::new(schema);

    if records.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let values: Vec<Option<&Value>> =
                records.iter().map(|r| r.get(field.name())).collect();
            build_array(&values, field.data_type())
        })
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(schema, columns)
        .map_err(|e| Error::output(format!("Failed to create RecordBatch: {e}")))
}

fn item_field(data_type: DataType) -> Arc<Field> {
    Arc::new(Field::new("item", data_type, true))
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) if n.is_i64() => DataType::Int64,
        Value::Number(_) => DataType::Float64,
        Value::String(_) => DataType::Utf8,
        Value::Array(items) => {
            let element = items
                .iter()
                .map(infer_type)
                .fold(DataType::Null, |acc, t| merge_types(&acc, &t));
            DataType::List(item_field(element))
        }
        // an empty object carries no columns; it merges like a null
        Value::Object(obj) if obj.is_empty() => DataType::Null,
        Value::Object(obj) => DataType::Struct(
            obj.iter()
                .map(|(k, v)| Field::new(k, infer_type(v), true))
                .collect(),
        ),
    }
}

/// Merge two data types into a compatible type
fn merge_types(left: &DataType, right: &DataType) -> DataType {
    match (left, right) {
        (a, b) if a == b => a.clone(),

        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::Struct(a), DataType::Struct(b)) => DataType::Struct(merge_fields(a, b)),

        (DataType::List(a), DataType::List(b)) => {
            DataType::List(item_field(merge_types(a.data_type(), b.data_type())))
        }

        // a single occurrence next to a repeated one
        (DataType::List(items), single) | (single, DataType::List(items)) => {
            DataType::List(item_field(merge_types(items.data_type(), single)))
        }

        _ => DataType::Utf8,
    }
}

fn merge_fields(left: &Fields, right: &Fields) -> Fields {
    let mut merged: Vec<Field> = left.iter().map(|f| f.as_ref().clone()).collect();
    for field in right {
        match merged.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => {
                let data_type = merge_types(existing.data_type(), field.data_type());
                *existing = Field::new(existing.name(), data_type, true);
            }
            None => merged.push(field.as_ref().clone()),
        }
    }
    merged.into()
}

/// Replace remaining `Null` types with strings at every depth
fn resolve_nulls(data_type: DataType) -> DataType {
    match data_type {
        DataType::Null => DataType::Utf8,
        DataType::List(item) => DataType::List(item_field(resolve_nulls(item.data_type().clone()))),
        DataType::Struct(fields) => DataType::Struct(
            fields
                .iter()
                .map(|f| Field::new(f.name(), resolve_nulls(f.data_type().clone()), true))
                .collect(),
        ),
        other => other,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    present(*v).map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        other => Err(Error::output(format!("Unsupported column type {other}"))),
    }
}

/// Build a list array; a single non-list value becomes a one-item list
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];
    let mut validity: Vec<bool> = Vec::with_capacity(values.len());

    for value in values {
        match present(*value) {
            Some(Value::Array(arr)) => items.extend(arr.iter().map(Some)),
            Some(single) => items.push(Some(single)),
            None => {}
        }
        validity.push(present(*value).is_some());

        let offset = i32::try_from(items.len())
            .map_err(|_| Error::output("Array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&items, field.data_type())?;
    let list = ListArray::try_new(
        Arc::clone(field),
        OffsetBuffer::new(offsets.into()),
        items_array,
        Some(NullBuffer::from(validity)),
    )?;
    Ok(Arc::new(list))
}

/// Build a struct array from JSON objects; non-objects are null rows
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let objects: Vec<Option<&serde_json::Map<String, Value>>> = values
        .iter()
        .map(|v| present(*v).and_then(Value::as_object))
        .collect();

    let children = fields
        .iter()
        .map(|field| {
            let child_values: Vec<Option<&Value>> = objects
                .iter()
                .map(|obj| obj.and_then(|o| o.get(field.name())))
                .collect();
            build_array(&child_values, field.data_type())
        })
        .collect::<Result<Vec<_>>>()?;

    let validity = NullBuffer::from(objects.iter().map(Option::is_some).collect::<Vec<_>>());
    let array = StructArray::try_new(fields.clone(), children, Some(validity))?;
    Ok(Arc::new(array))
}

/// Convert an Arrow RecordBatch back to records
///
/// Returns one JSON object per row in the batch.
pub fn arrow_to_records(batch: &RecordBatch) -> Result<Vec<Record>> {
    let schema = batch.schema();
    (0..batch.num_rows())
        .map(|row| -> Result<Record> {
            schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, column)| -> Result<(String, Value)> {
                    Ok((field.name().clone(), value_at(column.as_ref(), row)?))
                })
                .collect()
        })
        .collect()
}

fn downcast<'a, T: 'static>(array: &'a dyn Array, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::output(format!("Failed to downcast to {name}")))
}

/// Convert a single array element to JSON
fn value_at(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),
        DataType::Boolean => Ok(Value::Bool(
            downcast::<BooleanArray>(array, "BooleanArray")?.value(row),
        )),
        DataType::Int64 => Ok(Value::Number(
            downcast::<Int64Array>(array, "Int64Array")?.value(row).into(),
        )),
        DataType::Float64 => {
            let value = downcast::<Float64Array>(array, "Float64Array")?.value(row);
            Ok(serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number))
        }
        DataType::Utf8 => Ok(Value::String(
            downcast::<StringArray>(array, "StringArray")?
                .value(row)
                .to_string(),
        )),
        DataType::List(_) => {
            let items = downcast::<ListArray>(array, "ListArray")?.value(row);
            (0..items.len())
                .map(|i| value_at(items.as_ref(), i))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        DataType::Struct(_) => {
            let arr = downcast::<StructArray>(array, "StructArray")?;
            arr.fields()
                .iter()
                .zip(arr.columns())
                .map(|(field, column)| -> Result<(String, Value)> {
                    Ok((field.name().clone(), value_at(column.as_ref(), row)?))
                })
                .collect::<Result<serde_json::Map<_, _>>>()
                .map(Value::Object)
        }
        other => Err(Error::output(format!("Unsupported column type {other}"))),
    }
}
