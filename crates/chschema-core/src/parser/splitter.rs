//! Statement splitting and filtering

use super::tokenizer::{tokenize, Keyword, TokenKind};

/// A statement slice of the original input, trimmed and without its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawStatement<'a> {
    pub(crate) text: &'a str,
    /// Byte offset of `text` in the original input
    pub(crate) offset: usize,
}

/// Why a statement is kept or dropped before parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatementClass {
    Keep,
    /// `CREATE VIEW`: no column/type contract
    PlainView,
    /// `CREATE MATERIALIZED VIEW ... TO target`: writes into another table
    RoutedMaterializedView,
}

/// Split DDL text into statements, drop the kinds the parser does not model,
/// and re-terminate each kept statement with `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    split_raw(sql)
        .into_iter()
        .filter(|stmt| classify_statement(stmt.text) == StatementClass::Keep)
        .map(|stmt| format!("{};", stmt.text))
        .collect()
}

/// Split SQL text into individual statements by semicolons,
/// respecting string literals, quoted identifiers and comments.
pub(crate) fn split_raw(sql: &str) -> Vec<RawStatement<'_>> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < len {
                    if bytes[i] == b'\\' {
                        i += 2;
                    } else if bytes[i] == quote {
                        i += 1;
                        if i < len && bytes[i] == quote {
                            i += 1; // doubled quote
                        } else {
                            break;
                        }
                    } else {
                        i += 1;
                    }
                }
            }
            b'#' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i < len {
                    if i + 1 < len && bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                push_trimmed(&mut statements, sql, start, i);
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    // Last statement (without trailing semicolon)
    push_trimmed(&mut statements, sql, start, len.max(start));

    statements
}

fn push_trimmed<'a>(statements: &mut Vec<RawStatement<'a>>, sql: &'a str, start: usize, end: usize) {
    // A backslash escape right before the end can push `i` past `len`.
    let end = end.min(sql.len());
    let slice = &sql[start..end];
    let trimmed = slice.trim_start();
    let offset = start + (slice.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        statements.push(RawStatement {
            text: trimmed,
            offset,
        });
    }
}

/// Decide whether a statement reaches the parser
pub(crate) fn classify_statement(text: &str) -> StatementClass {
    let tokens = tokenize(text);
    let mut iter = tokens.iter().peekable();

    if !iter.next().is_some_and(|t| t.is_keyword(Keyword::Create)) {
        return StatementClass::Keep;
    }
    if iter.peek().is_some_and(|t| t.is_keyword(Keyword::Or)) {
        iter.next();
        if iter.peek().is_some_and(|t| t.is_keyword(Keyword::Replace)) {
            iter.next();
        }
    }

    match iter.next() {
        Some(t) if t.is_keyword(Keyword::View) => StatementClass::PlainView,
        Some(t) if t.is_keyword(Keyword::Materialized) => {
            // A `TO` before the top-level `AS` routes rows into another table
            let mut depth = 0usize;
            for token in iter {
                match token.kind {
                    TokenKind::LParen => depth += 1,
                    TokenKind::RParen => depth = depth.saturating_sub(1),
                    TokenKind::Keyword(Keyword::As) if depth == 0 => break,
                    TokenKind::Keyword(Keyword::To) if depth == 0 => {
                        return StatementClass::RoutedMaterializedView
                    }
                    _ => {}
                }
            }
            StatementClass::Keep
        }
        _ => StatementClass::Keep,
    }
}
