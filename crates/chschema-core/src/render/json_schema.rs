//! JSON Schema (draft 2020-12) documents

use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::resolver::{Int64Representation, MappedTable, MappingOptions};
use crate::types::{walk, AddressFamily, Leaf, TypeExpr, TypeVisitor};

use super::validate_tables;

pub const JSON_SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// One root schema document per table, keyed by declared name, in table order
pub fn json_schema_documents(tables: &[MappedTable]) -> Result<Vec<(String, Value)>> {
    validate_tables(tables)?;
    tables
        .iter()
        .map(|table| Ok((table.declared_name.clone(), table_document(table)?)))
        .collect()
}

/// All table documents as one pretty-printed JSON object keyed by declared name
pub fn render_json_schema(tables: &[MappedTable]) -> Result<String> {
    let documents: Map<String, Value> = json_schema_documents(tables)?.into_iter().collect();
    Ok(format!("{:#}\n", Value::Object(documents)))
}

fn table_document(table: &MappedTable) -> Result<Value> {
    let mut properties = Map::new();
    let mut required = Vec::with_capacity(table.columns.len());

    for column in &table.columns {
        let mut schema = type_schema(&column.resolved_type, &table.representation)?;
        if let Value::Object(fields) = &mut schema {
            fields.insert("$comment".to_string(), json!(column.raw_type_text));
            if let Some(comment) = &column.comment {
                fields.insert("description".to_string(), json!(comment));
            }
        }
        properties.insert(column.name.clone(), schema);
        required.push(json!(column.name));
    }

    let mut document = Map::new();
    document.insert("$schema".to_string(), json!(JSON_SCHEMA_DIALECT));
    document.insert("title".to_string(), json!(table.declared_name));
    if let Some(comment) = &table.meta.comment {
        document.insert("description".to_string(), json!(comment));
    }
    document.insert("type".to_string(), json!("object"));
    document.insert("properties".to_string(), Value::Object(properties));
    document.insert("required".to_string(), Value::Array(required));
    document.insert("additionalProperties".to_string(), json!(false));
    Ok(Value::Object(document))
}

pub(crate) fn type_schema(ty: &TypeExpr, options: &MappingOptions) -> Result<Value> {
    walk(&SchemaVisitor { options }, ty)
}

struct SchemaVisitor<'a> {
    options: &'a MappingOptions,
}

impl TypeVisitor for SchemaVisitor<'_> {
    type Output = Value;

    fn nullable(&self, inner: Value) -> Value {
        json!({ "anyOf": [inner, { "type": "null" }] })
    }

    fn array(&self, item: Value) -> Value {
        json!({ "type": "array", "items": item })
    }

    fn tuple(&self, items: Vec<Value>) -> Value {
        let names: Vec<String> = (0..items.len()).map(|i| format!("_{i}")).collect();
        let properties: Map<String, Value> = names.iter().cloned().zip(items).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": names,
            "additionalProperties": false,
        })
    }

    fn map(&self, value: Value) -> Value {
        json!({ "type": "object", "additionalProperties": value })
    }

    fn enumeration(&self, keys: &[&str]) -> Value {
        json!({ "type": "string", "enum": keys })
    }

    fn leaf(&self, leaf: Leaf) -> Value {
        match leaf {
            Leaf::Integer => json!({ "type": "integer" }),
            Leaf::WideInteger => match self.options.int64 {
                Int64Representation::WideInteger => json!({ "type": "integer" }),
                Int64Representation::String => json!({ "type": "string", "pattern": "^-?[0-9]+$" }),
            },
            Leaf::Float => json!({ "type": "number" }),
            Leaf::Boolean => json!({ "type": "boolean" }),
            // Decimals travel as strings in JSON under either representation
            Leaf::Decimal => json!({ "type": "string" }),
            Leaf::Text => json!({ "type": "string" }),
            Leaf::Address(AddressFamily::V4) => json!({ "type": "string", "format": "ipv4" }),
            Leaf::Address(AddressFamily::V6) => json!({ "type": "string", "format": "ipv6" }),
            Leaf::Date => json!({ "type": "string", "format": "date" }),
            Leaf::DateTime => json!({ "type": "string", "format": "date-time" }),
        }
    }

    // Resolution already applied the unknown-leaf policy; accept anything
    fn unknown(&self, _name: &str) -> Result<Value> {
        Ok(json!({}))
    }
}
