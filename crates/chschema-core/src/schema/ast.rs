//! Table and column declarations

use serde::{Deserialize, Serialize};

use crate::types::TypeExpr;

/// Kind of CREATE statement a declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    Table,
    MaterializedView,
}

/// One `CREATE TABLE` / `CREATE MATERIALIZED VIEW` declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableDecl {
    pub name: String,
    /// Database qualifier (`db.table`)
    pub database: Option<String>,
    pub kind: TableKind,
    pub columns: Vec<ColumnDecl>,
    pub engine: Option<String>,
    pub partition_by: Option<String>,
    pub order_by: Option<String>,
    pub primary_key: Option<String>,
    pub comment: Option<String>,
    /// Present for materialized views declared without a column list
    pub materialized_view: Option<MvInfo>,
}

impl TableDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a column by exact name, falling back to a case-insensitive match
    pub fn find_column(&self, name: &str) -> Option<&ColumnDecl> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    /// `database.name`, or just `name`
    pub fn qualified_name(&self) -> String {
        match &self.database {
            Some(db) => format!("{}.{}", db, self.name),
            None => self.name.clone(),
        }
    }
}

/// How a column's default expression is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DefaultKind {
    Default,
    Materialized,
    Alias,
    Ephemeral,
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDecl {
    pub name: String,
    pub ty: TypeExpr,
    /// Type exactly as written in the source
    pub raw_type_text: String,
    pub comment: Option<String>,
    pub default_expr: Option<String>,
    pub default_kind: Option<DefaultKind>,
}

impl ColumnDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr, raw_type_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            raw_type_text: raw_type_text.into(),
            comment: None,
            default_expr: None,
            default_kind: None,
        }
    }
}

/// Query information kept for materialized views without explicit columns
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MvInfo {
    /// Table named in the top-level `FROM`
    pub source_table: Option<String>,
    pub select_items: Vec<SelectItem>,
    pub cte: Option<CteInfo>,
}

impl MvInfo {
    /// The named sub-query, if the top-level `FROM` reads from it
    pub fn selected_cte(&self) -> Option<&CteInfo> {
        let cte = self.cte.as_ref()?;
        match &self.source_table {
            Some(source) if !source.eq_ignore_ascii_case(&cte.name) => None,
            _ => Some(cte),
        }
    }
}

/// Named sub-query (`WITH name AS (SELECT ... FROM src)`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CteInfo {
    pub name: String,
    pub source_table: Option<String>,
    pub items: Vec<SelectItem>,
}

/// One projection item of a SELECT list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectItem {
    /// Expression name: the column for plain references, the source text otherwise
    pub name: String,
    pub alias: Option<String>,
    /// First plain column referenced by the expression
    pub source_column: Option<String>,
    /// Outermost function applied, if any
    pub aggregate_func: Option<String>,
}

impl SelectItem {
    /// Name this item is visible under: the alias if present
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_column_falls_back_to_case_insensitive() {
        let mut table = TableDecl::new("base");
        table
            .columns
            .push(ColumnDecl::new("UserId", TypeExpr::new("UInt64"), "UInt64"));
        table
            .columns
            .push(ColumnDecl::new("userid", TypeExpr::text(), "String"));

        assert_eq!(table.find_column("userid").unwrap().raw_type_text, "String");
        assert_eq!(table.find_column("USERID").unwrap().raw_type_text, "UInt64");
        assert!(table.find_column("missing").is_none());
    }

    #[test]
    fn test_selected_cte_requires_from_to_name_it() {
        let cte = CteInfo {
            name: "agg".to_string(),
            ..Default::default()
        };
        let mut info = MvInfo {
            source_table: Some("AGG".to_string()),
            cte: Some(cte),
            ..Default::default()
        };
        assert!(info.selected_cte().is_some());

        info.source_table = Some("events".to_string());
        assert!(info.selected_cte().is_none());
    }

    #[test]
    fn test_output_name_prefers_alias() {
        let item = SelectItem {
            name: "name".to_string(),
            alias: Some("label".to_string()),
            ..Default::default()
        };
        assert_eq!(item.output_name(), "label");
    }
}
