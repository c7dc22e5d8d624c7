//! Column type inference for materialized views declared without columns

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::schema::{ColumnDecl, CteInfo, SelectItem, TableDecl};
use crate::types::TypeExpr;

/// Conversion functions whose result type is known from the name alone
const CONVERSION_PREFIXES: &[(&str, &str)] = &[
    ("tostartofday", "DateTime"),
    ("tofloat", "Float64"),
    ("todecimal", "Decimal"),
    ("touint", "UInt64"),
    ("toint", "Int64"),
];

/// Aggregates that always widen to a float
const WIDENING_AGGREGATES: &[&str] = &["sum", "avg", "count"];

/// Aggregates whose state keeps the argument's type
const PRESERVING_AGGREGATES: &[&str] = &["anylast", "max", "min", "argmin", "argmax"];

/// Tables visible as query sources, by name.
///
/// Materialized views are re-registered once their columns are inferred, so
/// a view reading from an earlier view sees concrete types.
#[derive(Debug, Default)]
pub(crate) struct SourceIndex {
    tables: IndexMap<String, TableDecl>,
}

impl SourceIndex {
    pub(crate) fn new(tables: &[TableDecl]) -> Self {
        let mut index = Self::default();
        for table in tables {
            index.register(table);
        }
        index
    }

    pub(crate) fn register(&mut self, table: &TableDecl) {
        self.tables.insert(table.name.clone(), table.clone());
    }

    fn get(&self, name: &str) -> Option<&TableDecl> {
        self.tables.get(name).or_else(|| {
            self.tables
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, table)| table)
        })
    }

    /// Concrete type of `table.column`, if both exist and the type is known
    fn column_type(&self, table: &str, column: &str) -> Option<&TypeExpr> {
        self.get(table)?
            .find_column(column)
            .map(|c| &c.ty)
            .filter(|ty| !ty.is_placeholder())
    }
}

/// Projection items keyed by the name they are visible under
struct ItemIndex<'a> {
    items: IndexMap<&'a str, &'a SelectItem>,
}

impl<'a> ItemIndex<'a> {
    fn new(items: &'a [SelectItem]) -> Self {
        let mut index = IndexMap::with_capacity(items.len());
        for item in items {
            // First occurrence wins, like column lookup in the source
            index.entry(item.output_name()).or_insert(item);
        }
        Self { items: index }
    }

    fn get(&self, name: &str) -> Option<&'a SelectItem> {
        self.items.get(name).copied().or_else(|| {
            self.items
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, item)| *item)
        })
    }
}

/// Replace every placeholder column type of a materialized view with an
/// inferred type. Unresolvable columns become `String`; this never fails.
pub(crate) fn infer_view_columns(table: &mut TableDecl, sources: &SourceIndex) {
    let Some(info) = table.materialized_view.as_ref() else {
        return;
    };
    if !table.columns.iter().any(|c| c.ty.is_placeholder()) {
        return;
    }

    let items = ItemIndex::new(&info.select_items);
    let inferred: Vec<Option<Option<TypeExpr>>> = match info.selected_cte() {
        Some(cte) => {
            let cte_items = ItemIndex::new(&cte.items);
            table
                .columns
                .iter()
                .map(|column| {
                    column.ty.is_placeholder().then(|| {
                        infer_through_cte(&column.name, &items, cte, &cte_items, sources)
                    })
                })
                .collect()
        }
        None => table
            .columns
            .iter()
            .map(|column| {
                column.ty.is_placeholder().then(|| {
                    infer_direct(&column.name, &items, info.source_table.as_deref(), sources)
                })
            })
            .collect(),
    };

    let view = table.name.clone();
    for (column, ty) in table.columns.iter_mut().zip(inferred) {
        let Some(ty) = ty else { continue };
        let ty = ty.unwrap_or_else(|| {
            warn!(view = %view, column = %column.name, "could not infer column type, using String");
            TypeExpr::text()
        });
        debug!(view = %view, column = %column.name, ty = %ty, "inferred column type");
        adopt(column, ty);
    }
}

fn adopt(column: &mut ColumnDecl, ty: TypeExpr) {
    column.raw_type_text = ty.to_string();
    column.ty = ty;
}

/// Direct source: follow the alias back to the source column and copy its type
fn infer_direct(
    output_name: &str,
    items: &ItemIndex<'_>,
    source_table: Option<&str>,
    sources: &SourceIndex,
) -> Option<TypeExpr> {
    let source_table = source_table?;
    let source_column = items
        .get(output_name)
        .map(|item| item.source_column.as_deref().unwrap_or(&item.name))
        .unwrap_or(output_name);
    sources.column_type(source_table, source_column).cloned()
}

/// Named sub-query: base type from the sub-query item, then the outer
/// function's return-type policy
fn infer_through_cte(
    output_name: &str,
    items: &ItemIndex<'_>,
    cte: &CteInfo,
    cte_items: &ItemIndex<'_>,
    sources: &SourceIndex,
) -> Option<TypeExpr> {
    let item = items.get(output_name)?;
    let Some(func) = item.aggregate_func.as_deref() else {
        // Bare passthrough of a sub-query column stays textual
        return Some(TypeExpr::text());
    };

    let base = item
        .source_column
        .as_deref()
        .and_then(|column| cte_base_type(column, cte, cte_items, sources));
    aggregate_return_type(func, base)
}

/// Type of a sub-query column: conversion function first, then its own source
fn cte_base_type(
    column: &str,
    cte: &CteInfo,
    cte_items: &ItemIndex<'_>,
    sources: &SourceIndex,
) -> Option<TypeExpr> {
    let source = cte.source_table.as_deref();
    let Some(item) = cte_items.get(column) else {
        return sources.column_type(source?, column).cloned();
    };

    if let Some(ty) = item.aggregate_func.as_deref().and_then(conversion_type) {
        return Some(ty);
    }
    let source_column = item.source_column.as_deref().unwrap_or(&item.name);
    sources.column_type(source?, source_column).cloned()
}

/// Result type of a known conversion function
pub(crate) fn conversion_type(func: &str) -> Option<TypeExpr> {
    let func = func.to_ascii_lowercase();
    CONVERSION_PREFIXES
        .iter()
        .find(|(prefix, _)| func.starts_with(prefix))
        .map(|(_, name)| TypeExpr::new(*name))
}

/// Return type of the outer function applied over a sub-query column
pub(crate) fn aggregate_return_type(func: &str, base: Option<TypeExpr>) -> Option<TypeExpr> {
    let func = func.to_ascii_lowercase();
    if func.starts_with("tostartofday") {
        return Some(TypeExpr::new("DateTime"));
    }
    if WIDENING_AGGREGATES.iter().any(|p| func.starts_with(p)) {
        return Some(TypeExpr::new("Float64"));
    }
    if !PRESERVING_AGGREGATES.iter().any(|p| func.starts_with(p)) {
        debug!(function = %func, "no return-type rule, keeping argument type");
    }
    base
}
