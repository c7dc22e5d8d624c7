//! Type resolution: declarations in, mapped tables out.
//!
//! Resolution runs in three steps per call:
//!
//! 1. Validate the declarations handed in (names present, ceilings respected).
//! 2. Infer the column types of materialized views declared without columns,
//!    in declaration order, so later views can read from earlier ones.
//! 3. Map every column's type to its declaration-type string and apply the
//!    identifier casing.

mod casing;
mod inference;
mod mapping;
mod options;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::limits::{ensure_within, MAX_COLUMNS, MAX_TABLES};
use crate::schema::TableDecl;
use crate::types::TypeExpr;

pub use casing::{to_camel_case, to_pascal_case};
pub use options::{
    DateTimeRepresentation, DecimalRepresentation, IdentifierCasing, Int64Representation,
    MappingOptions, PluginContext, ResolveOptions, TypePlugin,
};

pub(crate) use mapping::quote_literal;

use inference::{infer_view_columns, SourceIndex};
use mapping::TypeMapper;

/// A table ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedTable {
    /// PascalCase name used for generated declarations
    pub declared_name: String,
    /// Table name as written in the DDL
    pub source_name: String,
    pub columns: Vec<ResolvedColumn>,
    pub meta: TableMeta,
    /// Representation options the columns were mapped with
    pub representation: MappingOptions,
}

/// Documentation-only table metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMeta {
    pub engine: Option<String>,
    pub partition_by: Option<String>,
    pub order_by: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    /// Output name, after casing
    pub name: String,
    /// Column name as written in the DDL
    pub source_name: String,
    /// Concrete type; never the `Unknown` placeholder
    pub resolved_type: TypeExpr,
    /// Declaration-type string, e.g. `string | null`
    pub mapped_type: String,
    pub raw_type_text: String,
    pub comment: Option<String>,
}

/// Resolve parsed declarations into mapped tables.
///
/// Materialized-view inference never fails; unresolvable columns become
/// `String`. Validation, depth and unknown-leaf errors abort the call.
pub fn resolve(tables: Vec<TableDecl>, options: &ResolveOptions) -> Result<Vec<MappedTable>> {
    ensure_within("table count", tables.len(), MAX_TABLES)?;
    for table in &tables {
        validate_declaration(table)?;
    }

    let mapping = options.mapping();
    let mut sources = SourceIndex::new(&tables);
    let mut mapped = Vec::with_capacity(tables.len());

    for mut table in tables {
        infer_view_columns(&mut table, &sources);
        sources.register(&table);
        mapped.push(map_table(table, options, &mapping)?);
    }

    Ok(mapped)
}

fn validate_declaration(table: &TableDecl) -> Result<()> {
    if table.name.trim().is_empty() {
        return Err(Error::validation("table with an empty name"));
    }
    ensure_within("column count", table.columns.len(), MAX_COLUMNS)?;
    if let Some(index) = table.columns.iter().position(|c| c.name.trim().is_empty()) {
        return Err(Error::validation(format!(
            "column {} of table '{}' has an empty name",
            index + 1,
            table.name
        )));
    }
    Ok(())
}

fn map_table(
    table: TableDecl,
    options: &ResolveOptions,
    mapping: &MappingOptions,
) -> Result<MappedTable> {
    let mut columns = Vec::with_capacity(table.columns.len());

    for column in table.columns {
        let (resolved_type, raw_type_text) = if column.ty.is_placeholder() {
            // Declared columns never carry the placeholder; views were inferred above
            warn!(table = %table.name, column = %column.name, "placeholder type left, using String");
            (TypeExpr::text(), TypeExpr::text().to_string())
        } else {
            (column.ty, column.raw_type_text)
        };

        let mapper = TypeMapper {
            options: mapping,
            plugins: &options.plugins,
            table: &table.name,
            column: &column.name,
        };
        let mapped_type = mapper.map(&resolved_type)?;
        debug!(table = %table.name, column = %column.name, %mapped_type, "mapped column");

        let name = match options.casing {
            IdentifierCasing::Preserve => column.name.clone(),
            IdentifierCasing::Camel => to_camel_case(&column.name),
        };
        columns.push(ResolvedColumn {
            name,
            source_name: column.name,
            resolved_type,
            mapped_type,
            raw_type_text,
            comment: column.comment,
        });
    }

    Ok(MappedTable {
        declared_name: to_pascal_case(&table.name),
        source_name: table.name,
        columns,
        meta: TableMeta {
            engine: table.engine,
            partition_by: table.partition_by,
            order_by: table.order_by,
            comment: table.comment,
        },
        representation: *mapping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::schema::ColumnDecl;
    use pretty_assertions::assert_eq;

    fn resolve_sql(sql: &str, options: &ResolveOptions) -> Result<Vec<MappedTable>> {
        resolve(parse(sql).unwrap(), options)
    }

    fn mapped_types(table: &MappedTable) -> Vec<(&str, &str)> {
        table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.mapped_type.as_str()))
            .collect()
    }

    #[test]
    fn test_resolve_basic_table() {
        let tables = resolve_sql(
            "CREATE TABLE user_events (id UInt64, name String COMMENT 'display name', at DateTime) \
             ENGINE = MergeTree ORDER BY id",
            &ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.declared_name, "UserEvents");
        assert_eq!(table.source_name, "user_events");
        assert_eq!(
            mapped_types(table),
            vec![("id", "bigint"), ("name", "string"), ("at", "string")]
        );
        assert_eq!(table.columns[1].comment.as_deref(), Some("display name"));
        assert_eq!(table.meta.order_by.as_deref(), Some("id"));
        assert_eq!(table.representation, MappingOptions::default());
    }

    #[test]
    fn test_camel_casing_keeps_lookups_on_source_names() {
        let options = ResolveOptions {
            casing: IdentifierCasing::Camel,
            ..Default::default()
        };
        let tables = resolve_sql(
            "CREATE TABLE base (user_id UInt32, created_at Date);
             CREATE MATERIALIZED VIEW mv AS SELECT user_id, created_at AS first_seen FROM base",
            &options,
        )
        .unwrap();

        assert_eq!(
            mapped_types(&tables[1]),
            vec![("userId", "number"), ("firstSeen", "string")]
        );
        assert_eq!(tables[1].columns[0].source_name, "user_id");
        assert_eq!(tables[1].columns[1].raw_type_text, "Date");
    }

    #[test]
    fn test_plugins_reach_the_mapper() {
        fn point(ty: &TypeExpr, ctx: &PluginContext<'_>) -> Option<String> {
            (ty.name == "Point" && ctx.table == "geo").then(|| "[number, number]".to_string())
        }
        let options = ResolveOptions::new().with_plugin(point);
        let tables = resolve_sql("CREATE TABLE geo (p Point, ps Array(Point))", &options).unwrap();
        assert_eq!(
            mapped_types(&tables[0]),
            vec![("p", "[number, number]"), ("ps", "[number, number][]")]
        );
    }

    #[test]
    fn test_unknown_leaf_is_fatal_when_requested() {
        let options = ResolveOptions {
            fail_on_unknown_leaf: true,
            ..Default::default()
        };
        let err = resolve_sql("CREATE TABLE t (a UInt8, g Polygon)", &options).unwrap_err();
        assert_eq!(
            err,
            Error::UnknownLeafType {
                name: "Polygon".to_string()
            }
        );
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let err = resolve(vec![TableDecl::new("  ")], &ResolveOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let mut table = TableDecl::new("t");
        table
            .columns
            .push(ColumnDecl::new("", TypeExpr::text(), "String"));
        let err = resolve(vec![table], &ResolveOptions::default()).unwrap_err();
        assert!(err.to_string().contains("column 1 of table 't'"));
    }

    #[test]
    fn test_column_ceiling() {
        let mut table = TableDecl::new("wide");
        table.columns = (0..=MAX_COLUMNS)
            .map(|i| ColumnDecl::new(format!("c{i}"), TypeExpr::new("UInt8"), "UInt8"))
            .collect();
        assert_eq!(
            resolve(vec![table], &ResolveOptions::default()),
            Err(Error::LimitExceeded {
                what: "column count",
                limit: MAX_COLUMNS
            })
        );
    }

    #[test]
    fn test_stray_placeholder_becomes_text() {
        let mut table = TableDecl::new("t");
        table
            .columns
            .push(ColumnDecl::new("x", TypeExpr::unknown(), "Unknown"));
        let tables = resolve(vec![table], &ResolveOptions::default()).unwrap();
        assert_eq!(tables[0].columns[0].resolved_type, TypeExpr::text());
        assert_eq!(tables[0].columns[0].mapped_type, "string");
    }

    #[test]
    fn test_representation_is_recorded() {
        let options = ResolveOptions {
            int64: Int64Representation::String,
            datetime: DateTimeRepresentation::DateType,
            ..Default::default()
        };
        let tables = resolve_sql("CREATE TABLE t (a Int64, b DateTime64(3))", &options).unwrap();
        assert_eq!(mapped_types(&tables[0]), vec![("a", "string"), ("b", "Date")]);
        assert_eq!(tables[0].representation.int64, Int64Representation::String);
    }
}
