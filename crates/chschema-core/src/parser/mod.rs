//! DDL parsing: tokenizer, statement splitter and recursive-descent parser

mod splitter;
mod statement;
mod tokenizer;

use tracing::{debug, warn};

use crate::error::{Diagnostic, DiagnosticKind, Error, Result, Span};
use crate::limits::{
    ensure_within, MAX_INPUT_LENGTH, MAX_STATEMENTS, MAX_STATEMENT_LENGTH, MAX_TABLES,
};
use crate::schema::TableDecl;

pub use splitter::split_statements;
pub use statement::Parser;
pub use tokenizer::{tokenize, Keyword, Token, TokenKind};

use splitter::{classify_statement, split_raw, RawStatement, StatementClass};

/// Declarations parsed from one input, plus what was dropped on the way
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub tables: Vec<TableDecl>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse DDL text into table declarations.
///
/// Statements that fail to parse are dropped; only safety-ceiling
/// violations abort the call.
pub fn parse(ddl: &str) -> Result<Vec<TableDecl>> {
    Ok(parse_with_diagnostics(ddl)?.tables)
}

/// Like [`parse`], also reporting every skipped or filtered statement
pub fn parse_with_diagnostics(ddl: &str) -> Result<ParseOutput> {
    ensure_within("input length", ddl.len(), MAX_INPUT_LENGTH)?;

    let statements = split_raw(ddl);
    ensure_within("statement count", statements.len(), MAX_STATEMENTS)?;

    let mut output = ParseOutput::default();
    for stmt in statements {
        ensure_within("statement length", stmt.text.len(), MAX_STATEMENT_LENGTH)?;

        match classify_statement(stmt.text) {
            StatementClass::Keep => {}
            class => {
                let reason = match class {
                    StatementClass::PlainView => "plain view",
                    _ => "materialized view routed with TO",
                };
                debug!(offset = stmt.offset, reason, "statement filtered");
                output.diagnostics.push(
                    Diagnostic::info(
                        DiagnosticKind::FilteredStatement,
                        format!("{reason} ignored"),
                    )
                    .with_span(locate(ddl, &stmt, None)),
                );
                continue;
            }
        }

        parse_statement_text(ddl, &stmt, &mut output)?;
    }

    Ok(output)
}

/// Parse every CREATE statement found in one statement slice
fn parse_statement_text(ddl: &str, stmt: &RawStatement<'_>, output: &mut ParseOutput) -> Result<()> {
    let tokens = tokenize(stmt.text);
    let mut position = 0;

    while let Some(start) = next_create(&tokens, position) {
        let mut parser = Parser::new(stmt.text, &tokens[start..]);
        match parser.parse_statement() {
            Ok(table) => {
                output.tables.push(table);
                ensure_within("table count", output.tables.len(), MAX_TABLES)?;
                position = start + parser.position().max(1);
            }
            Err(err) if err.is_recoverable() => {
                let (message, span) = match err {
                    Error::Parse { message, span } => (message, span),
                    other => (other.to_string(), None),
                };
                warn!(offset = stmt.offset, %message, "skipping unparseable statement");
                output.diagnostics.push(
                    Diagnostic::warning(DiagnosticKind::SkippedStatement, message)
                        .with_span(locate(ddl, stmt, span))
                        .with_help("the statement was dropped; the rest of the input was still processed"),
                );
                position = start + 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn next_create(tokens: &[Token], from: usize) -> Option<usize> {
    tokens
        .iter()
        .skip(from)
        .position(|t| t.is_keyword(Keyword::Create))
        .map(|i| from + i)
}

/// Translate a statement-relative span (or the statement itself) into input coordinates
fn locate(ddl: &str, stmt: &RawStatement<'_>, span: Option<Span>) -> Span {
    let local = span.unwrap_or(Span::new(0, stmt.text.len(), 1, 1));
    let before = &ddl[..stmt.offset];
    let base_line = before.matches('\n').count() + 1;
    let base_column = before.len() - before.rfind('\n').map_or(0, |i| i + 1) + 1;

    Span {
        offset: stmt.offset + local.offset,
        length: local.length,
        line: base_line + local.line - 1,
        column: if local.line == 1 {
            base_column + local.column - 1
        } else {
            local.column
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;

    #[test]
    fn test_parse_skips_bad_statements() {
        let sql = r#"
            CREATE TABLE good_a (id UInt64);
            CREATE TABLE broken (id);
            INSERT INTO good_a VALUES (1);
            CREATE FUNCTION f AS (x) -> x + 1;
            CREATE TABLE good_b (name String);
        "#;
        let output = parse_with_diagnostics(sql).unwrap();
        let names: Vec<_> = output.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["good_a", "good_b"]);

        let skipped: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::SkippedStatement)
            .collect();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].severity, Severity::Warning);
        assert_eq!(skipped[0].span.unwrap().line, 3);
    }

    #[test]
    fn test_filtered_statements_are_reported() {
        let sql = "CREATE VIEW v AS SELECT 1;\nCREATE MATERIALIZED VIEW m TO t AS SELECT a FROM s;";
        let output = parse_with_diagnostics(sql).unwrap();
        assert!(output.tables.is_empty());
        assert_eq!(output.diagnostics.len(), 2);
        assert!(output
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::FilteredStatement));
        assert_eq!(output.diagnostics[1].span.unwrap().line, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  -- nothing here\n").unwrap().is_empty());
    }

    #[test]
    fn test_input_length_ceiling() {
        let huge = " ".repeat(MAX_INPUT_LENGTH + 1);
        assert_eq!(
            parse(&huge),
            Err(Error::LimitExceeded {
                what: "input length",
                limit: MAX_INPUT_LENGTH
            })
        );
    }

    #[test]
    fn test_depth_errors_abort_the_call() {
        let deep = format!(
            "CREATE TABLE ok (a UInt8); CREATE TABLE t (a {}String{})",
            "Array(".repeat(25),
            ")".repeat(25)
        );
        assert!(matches!(parse(&deep), Err(Error::DepthExceeded { .. })));
    }

    #[test]
    fn test_locate_offsets_second_line() {
        let ddl = "SELECT 1;\n  CREATE TABLE t (a)";
        let stmts = split_raw(ddl);
        let span = locate(ddl, &stmts[1], Some(Span::new(16, 1, 1, 17)));
        assert_eq!(span.line, 2);
        assert_eq!(span.column, 19);
        assert_eq!(&ddl[span.offset..span.end()], "a");
    }
}
