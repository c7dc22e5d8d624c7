//! chschema-core: columnar-database DDL to typed artifacts
//!
//! The pipeline has three stages, each a pure function of its input:
//!
//! 1. [`parse`] splits DDL text into statements and parses every
//!    `CREATE TABLE` / `CREATE MATERIALIZED VIEW` into a [`TableDecl`].
//!    Statements that fail to parse are dropped, never fatal.
//! 2. [`resolve`] infers materialized-view column types and maps every
//!    column type into a [`MappedTable`].
//! 3. [`render_interfaces`] and [`render_json_schema`] turn mapped tables
//!    into TypeScript interfaces (optionally with zod validators) and
//!    JSON Schema documents.

pub mod error;
pub mod limits;
pub mod parser;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod types;

pub use error::{Diagnostic, DiagnosticKind, Error, Result, Severity, Span};
pub use parser::{parse, parse_with_diagnostics, split_statements, ParseOutput};
pub use render::{json_schema_documents, render_interfaces, render_json_schema, InterfaceOptions};
pub use resolver::{
    resolve, DateTimeRepresentation, DecimalRepresentation, IdentifierCasing,
    Int64Representation, MappedTable, MappingOptions, PluginContext, ResolveOptions,
    ResolvedColumn, TableMeta, TypePlugin,
};
pub use schema::{ColumnDecl, TableDecl, TableKind};
pub use types::{TypeArg, TypeExpr};
