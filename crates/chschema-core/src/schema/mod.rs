//! Parsed declarations (the AST handed from the parser to the resolver)

mod ast;

pub use ast::{ColumnDecl, CteInfo, DefaultKind, MvInfo, SelectItem, TableDecl, TableKind};
