//! Conversions between stored BSON and the JSON documents handed to repositories.

use mongodb::bson::{self, Bson};
use serde_json::{Map, Number, Value};

use crate::dao::document::{Direction, Document, Query};

const ID_FIELD: &str = "_id";

pub fn json_to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(flag) => Bson::Boolean(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Bson::Int64(int),
            None => Bson::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => Bson::String(text),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(fields) => Bson::Document(fields_to_bson(fields)),
    }
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(flag) => Value::Bool(flag),
        Bson::Int32(int) => Value::from(int),
        Bson::Int64(int) => Value::from(int),
        Bson::Double(float) => Number::from_f64(float).map_or(Value::Null, Value::Number),
        Bson::String(text) => Value::String(text),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        Bson::Document(fields) => Value::Object(bson_to_fields(fields)),
        Bson::DateTime(at) => Value::from(at.timestamp_millis()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        other => Value::String(other.to_string()),
    }
}

pub fn fields_to_bson(fields: Document) -> bson::Document {
    let mut document = bson::Document::new();
    for (key, value) in fields {
        document.insert(key, json_to_bson(value));
    }
    document
}

fn bson_to_fields(document: bson::Document) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect::<Map<_, _>>()
}

/// Convert a stored document back, dropping the storage key.
pub fn from_stored(document: bson::Document) -> Document {
    let mut fields = bson_to_fields(document);
    fields.remove(ID_FIELD);
    fields
}

/// Convert a document for storage under `id`.
pub fn to_stored(id: &str, fields: Document) -> bson::Document {
    let mut document = fields_to_bson(fields);
    document.insert(ID_FIELD, id);
    document
}

pub fn id_filter(id: &str) -> bson::Document {
    let mut filter = bson::Document::new();
    filter.insert(ID_FIELD, id);
    filter
}

pub fn query_filter(query: &Query) -> bson::Document {
    let mut filter = bson::Document::new();
    for (field, value) in &query.filters {
        filter.insert(field.clone(), json_to_bson(value.clone()));
    }
    filter
}

pub fn query_sort(query: &Query) -> Option<bson::Document> {
    query.order.as_ref().map(|(field, direction)| {
        let mut sort = bson::Document::new();
        let order: i32 = match direction {
            Direction::Ascending => 1,
            Direction::Descending => -1,
        };
        sort.insert(field.clone(), order);
        sort
    })
}
