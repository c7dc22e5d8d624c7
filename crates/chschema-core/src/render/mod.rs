//! Output renderers for mapped tables.
//!
//! All renderers validate their whole input before producing any text, and
//! share the same [`walk`](crate::types::walk) over each column's resolved
//! type so nullability and structure agree between formats.

mod interface;
mod json_schema;
mod validator;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::limits::{ensure_within, MAX_COLUMNS, MAX_TABLES};
use crate::resolver::{quote_literal, MappedTable};

pub use interface::{render_interfaces, InterfaceOptions};
pub use json_schema::{json_schema_documents, render_json_schema, JSON_SCHEMA_DIALECT};

/// Reject tables that cannot be rendered
pub(crate) fn validate_tables(tables: &[MappedTable]) -> Result<()> {
    ensure_within("table count", tables.len(), MAX_TABLES)?;

    let mut declared: HashMap<&str, &str> = HashMap::with_capacity(tables.len());
    for table in tables {
        if table.declared_name.trim().is_empty() || table.source_name.trim().is_empty() {
            return Err(Error::validation(format!(
                "table '{}' has no declared name",
                table.source_name
            )));
        }
        if let Some(first) = declared.insert(&table.declared_name, &table.source_name) {
            return Err(Error::validation(format!(
                "tables '{}' and '{}' both render as '{}'",
                first, table.source_name, table.declared_name
            )));
        }
        ensure_within("column count", table.columns.len(), MAX_COLUMNS)?;

        let mut names: HashMap<&str, &str> = HashMap::with_capacity(table.columns.len());
        for column in &table.columns {
            if let Some(first) = names.insert(&column.name, &column.source_name) {
                return Err(Error::validation(format!(
                    "columns '{}' and '{}' of table '{}' both render as '{}'",
                    first, column.source_name, table.source_name, column.name
                )));
            }
            let problem = if column.name.trim().is_empty() {
                Some("an empty name")
            } else if column.resolved_type.is_placeholder() {
                Some("an unresolved type")
            } else if column.mapped_type.trim().is_empty() {
                Some("an empty mapped type")
            } else {
                None
            };
            if let Some(problem) = problem {
                return Err(Error::validation(format!(
                    "column '{}' of table '{}' has {}",
                    column.source_name, table.source_name, problem
                )));
            }
        }
    }
    Ok(())
}

/// Object key as written in generated code: bare when it is a valid
/// identifier, quoted otherwise
pub(crate) fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        quote_literal(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MappingOptions, ResolvedColumn, TableMeta};
    use crate::types::TypeExpr;

    pub(crate) fn table(name: &str, columns: &[(&str, TypeExpr, &str)]) -> MappedTable {
        MappedTable {
            declared_name: crate::resolver::to_pascal_case(name),
            source_name: name.to_string(),
            columns: columns
                .iter()
                .map(|(column, ty, mapped)| ResolvedColumn {
                    name: column.to_string(),
                    source_name: column.to_string(),
                    resolved_type: ty.clone(),
                    mapped_type: mapped.to_string(),
                    raw_type_text: ty.to_string(),
                    comment: None,
                })
                .collect(),
            meta: TableMeta::default(),
            representation: MappingOptions::default(),
        }
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("user_id"), "user_id");
        assert_eq!(property_key("$ref"), "$ref");
        assert_eq!(property_key("2nd"), "'2nd'");
        assert_eq!(property_key("a-b"), "'a-b'");
        assert_eq!(property_key(""), "''");
    }

    #[test]
    fn test_validation_rejects_unresolved_columns() {
        let bad = table("t", &[("x", TypeExpr::unknown(), "unknown")]);
        let err = validate_tables(&[bad]).unwrap_err();
        assert!(err.to_string().contains("an unresolved type"));

        let empty = table("t", &[("x", TypeExpr::text(), " ")]);
        assert!(matches!(
            validate_tables(&[empty]),
            Err(Error::Validation { .. })
        ));

        let mut nameless = table("t", &[]);
        nameless.declared_name.clear();
        assert!(validate_tables(&[nameless]).is_err());
    }

    #[test]
    fn test_validation_rejects_colliding_names() {
        let tables = [table("user_events", &[]), table("UserEvents", &[])];
        let err = validate_tables(&tables).unwrap_err();
        assert_eq!(
            err,
            Error::validation("tables 'user_events' and 'UserEvents' both render as 'UserEvents'")
        );

        let mut cased = table(
            "t",
            &[
                ("userId", TypeExpr::new("UInt8"), "number"),
                ("userId", TypeExpr::text(), "string"),
            ],
        );
        cased.columns[0].source_name = "user_id".to_string();
        let err = validate_tables(&[cased]).unwrap_err();
        assert!(err
            .to_string()
            .contains("columns 'user_id' and 'userId' of table 't' both render as 'userId'"));
    }
}
