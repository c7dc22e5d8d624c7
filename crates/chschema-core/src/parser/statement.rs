//! Recursive-descent parser for one CREATE statement

use tracing::debug;

use crate::error::{Error, Result};
use crate::limits::{
    ensure_type_depth, ensure_within, StepBudget, MAX_COLUMNS, MAX_ENUM_MEMBERS, MAX_TUPLE_ARITY,
};
use crate::schema::{ColumnDecl, CteInfo, DefaultKind, MvInfo, SelectItem, TableDecl, TableKind};
use crate::types::{canonical_name, TypeArg, TypeExpr, UNKNOWN_TYPE};

use super::tokenizer::{Keyword, Token, TokenKind};

/// Parser state over the tokens of a single statement.
///
/// `source` is the statement text the token spans point into; raw
/// expressions and type text are sliced from it verbatim.
pub struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            source,
            tokens,
            position: 0,
        }
    }

    /// Number of tokens consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Parse `CREATE [MATERIALIZED] (TABLE|VIEW) ...` into a declaration
    pub fn parse_statement(&mut self) -> Result<TableDecl> {
        self.expect_keyword(Keyword::Create)?;
        if self.eat_keyword(Keyword::Or) {
            self.expect_keyword(Keyword::Replace)?;
        }
        self.eat_keyword(Keyword::Temporary);

        let kind = if self.eat_keyword(Keyword::Materialized) {
            self.expect_keyword(Keyword::View)?;
            TableKind::MaterializedView
        } else if self.eat_keyword(Keyword::Table) {
            TableKind::Table
        } else if self.check_keyword(Keyword::View) {
            return Err(self.error("plain views are not modeled"));
        } else {
            return Err(self.error("expected TABLE or MATERIALIZED VIEW after CREATE"));
        };

        if self.eat_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
        }

        let (database, name) = self.parse_qualified_name("table name")?;
        let mut table = TableDecl {
            name,
            database,
            kind,
            ..Default::default()
        };

        if self.eat_keyword(Keyword::On) {
            self.expect_keyword(Keyword::Cluster)?;
            self.parse_name_or_string("cluster name")?;
        }
        if self.check_keyword(Keyword::To) {
            return Err(self.error("materialized views routed with TO are not modeled"));
        }

        if self.check_kind(TokenKind::LParen) {
            table.columns = self.parse_column_list()?;
        }

        self.parse_table_clauses(&mut table)?;

        if table.columns.is_empty() {
            return Err(Error::parse(
                format!("'{}' declares no columns", table.qualified_name()),
                None,
            ));
        }

        debug!(
            table = %table.qualified_name(),
            columns = table.columns.len(),
            "parsed table declaration"
        );
        Ok(table)
    }

    // ---------------------------------------------------------------------
    // Columns
    // ---------------------------------------------------------------------

    fn parse_column_list(&mut self) -> Result<Vec<ColumnDecl>> {
        self.expect_kind(TokenKind::LParen, "'('")?;
        let mut columns = Vec::new();
        let mut budget = StepBudget::new("column list");

        loop {
            budget.tick()?;
            if self.eat_kind(TokenKind::RParen) {
                break;
            }

            if self.at_non_column_element() {
                self.capture_expression(|t| t.kind == TokenKind::Comma)?;
            } else {
                columns.push(self.parse_column_def()?);
                ensure_within("column count", columns.len(), MAX_COLUMNS)?;
            }

            if !self.eat_kind(TokenKind::Comma) {
                self.expect_kind(TokenKind::RParen, "',' or ')' in column list")?;
                break;
            }
        }

        Ok(columns)
    }

    /// INDEX / PROJECTION / CONSTRAINT entries share the column list
    fn at_non_column_element(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        match token.kind {
            TokenKind::Keyword(Keyword::Index) => {
                // `INDEX name expr TYPE kind ...`, as opposed to a column called `index`
                let mut depth = 0usize;
                for t in &self.tokens[self.position + 1..] {
                    match t.kind {
                        TokenKind::LParen => depth += 1,
                        TokenKind::RParen if depth == 0 => return false,
                        TokenKind::RParen => depth -= 1,
                        TokenKind::Comma if depth == 0 => return false,
                        TokenKind::Identifier if depth == 0 && t.text.eq_ignore_ascii_case("TYPE") => {
                            return true
                        }
                        _ => {}
                    }
                }
                false
            }
            TokenKind::Keyword(Keyword::Projection) => {
                self.peek_nth(2).is_some_and(|t| t.kind == TokenKind::LParen)
            }
            TokenKind::Keyword(Keyword::Constraint) => self.peek_nth(2).is_some_and(|t| {
                t.kind == TokenKind::Identifier
                    && (t.text.eq_ignore_ascii_case("CHECK") || t.text.eq_ignore_ascii_case("ASSUME"))
            }),
            _ => false,
        }
    }

    fn parse_column_def(&mut self) -> Result<ColumnDecl> {
        let name = self.expect_column_name()?;
        let type_start = self.position;
        let mut ty = self.parse_type(1)?;
        let raw_type_text = self.raw_text(type_start, self.position);

        let mut column = ColumnDecl::new(name, TypeExpr::unknown(), raw_type_text);
        let mut budget = StepBudget::new("column options");

        loop {
            budget.tick()?;
            let Some(token) = self.peek() else {
                break;
            };
            match token.kind {
                TokenKind::Keyword(Keyword::Null) => {
                    self.advance();
                    if ty.name != "Nullable" {
                        ty = TypeExpr::wrap("Nullable", ty);
                    }
                }
                TokenKind::Keyword(Keyword::Not) => {
                    self.advance();
                    self.expect_keyword(Keyword::Null)?;
                }
                TokenKind::Keyword(
                    keyword @ (Keyword::Default
                    | Keyword::Materialized
                    | Keyword::Alias
                    | Keyword::Ephemeral),
                ) => {
                    self.advance();
                    column.default_kind = Some(match keyword {
                        Keyword::Default => DefaultKind::Default,
                        Keyword::Materialized => DefaultKind::Materialized,
                        Keyword::Alias => DefaultKind::Alias,
                        _ => DefaultKind::Ephemeral,
                    });
                    column.default_expr = self.capture_expression(is_column_clause)?;
                }
                TokenKind::Keyword(Keyword::Comment) => {
                    self.advance();
                    column.comment = Some(self.expect_string("column comment")?);
                }
                TokenKind::Keyword(Keyword::Codec) => {
                    self.advance();
                    self.skip_balanced()?;
                }
                TokenKind::Keyword(Keyword::Ttl) => {
                    self.advance();
                    self.capture_expression(is_column_clause)?;
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                }
                _ => break,
            }
        }

        column.ty = ty;
        Ok(column)
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    /// Parse `Name` or `Name(arg, ...)`; `depth` is 1 for a column's outer type
    fn parse_type(&mut self, depth: usize) -> Result<TypeExpr> {
        ensure_type_depth(depth)?;

        let token = match self.peek() {
            Some(t) if matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier) => t,
            _ => return Err(self.error("expected a type name")),
        };
        let name = canonical_name(&token.text);
        self.advance();

        let mut args = Vec::new();
        if self.eat_kind(TokenKind::LParen) {
            let mut budget = StepBudget::new("type arguments");
            if !self.eat_kind(TokenKind::RParen) {
                loop {
                    budget.tick()?;
                    args.push(self.parse_type_arg(depth)?);
                    match name.as_str() {
                        "Tuple" => ensure_within("tuple arity", args.len(), MAX_TUPLE_ARITY)?,
                        "Enum" | "Enum8" | "Enum16" => {
                            ensure_within("enum member count", args.len(), MAX_ENUM_MEMBERS)?
                        }
                        _ => {}
                    }
                    if !self.eat_kind(TokenKind::Comma) {
                        self.expect_kind(TokenKind::RParen, "',' or ')' in type arguments")?;
                        break;
                    }
                }
            }
        }

        Ok(TypeExpr { name, args })
    }

    fn parse_type_arg(&mut self, depth: usize) -> Result<TypeArg> {
        let Some(token) = self.peek() else {
            return Err(self.error("unterminated type argument list"));
        };

        match token.kind {
            TokenKind::String => {
                let key = token.text.clone();
                self.advance();
                if self.eat_kind(TokenKind::Equals) {
                    let value = self.parse_signed_integer()?;
                    Ok(TypeArg::EnumMember { key, value })
                } else {
                    Ok(TypeArg::String { value: key })
                }
            }
            TokenKind::Number => {
                let value = token.text.clone();
                self.advance();
                Ok(TypeArg::Number { value })
            }
            TokenKind::Operator if token.text == "-" => {
                self.advance();
                let number = self.expect_kind(TokenKind::Number, "a number after '-'")?;
                Ok(TypeArg::Number {
                    value: format!("-{}", number.text),
                })
            }
            _ if token.is_name() => {
                // Named tuple element: `name Type`; the name is not kept
                if self.peek_nth(1).is_some_and(|t| {
                    matches!(t.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier)
                }) {
                    self.advance();
                }
                Ok(TypeArg::Type(self.parse_type(depth + 1)?))
            }
            _ => Err(self.error("unexpected token in type arguments")),
        }
    }

    fn parse_signed_integer(&mut self) -> Result<i64> {
        let negative = self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Operator && t.text == "-");
        if negative {
            self.advance();
        }
        let token = self.expect_kind(TokenKind::Number, "an integer enum value")?;
        let span = token.span;
        let value: i64 = token
            .text
            .parse()
            .map_err(|_| Error::parse(format!("invalid enum value '{}'", token.text), Some(span)))?;
        Ok(if negative { -value } else { value })
    }

    // ---------------------------------------------------------------------
    // Table clauses
    // ---------------------------------------------------------------------

    fn parse_table_clauses(&mut self, table: &mut TableDecl) -> Result<()> {
        let mut budget = StepBudget::new("table clauses");

        while let Some(token) = self.peek() {
            budget.tick()?;
            match token.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::Keyword(Keyword::Engine) => {
                    self.advance();
                    self.eat_kind(TokenKind::Equals);
                    let start = self.position;
                    self.expect_name("engine name")?;
                    if self.check_kind(TokenKind::LParen) {
                        self.skip_balanced()?;
                    }
                    table.engine = Some(self.raw_text(start, self.position));
                }
                TokenKind::Keyword(Keyword::Partition) => {
                    self.advance();
                    self.expect_keyword(Keyword::By)?;
                    table.partition_by = self.capture_expression(is_table_clause)?;
                }
                TokenKind::Keyword(Keyword::Order) => {
                    self.advance();
                    self.expect_keyword(Keyword::By)?;
                    table.order_by = self.capture_expression(is_table_clause)?;
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    table.primary_key = self.capture_expression(is_table_clause)?;
                }
                TokenKind::Keyword(Keyword::Sample) => {
                    self.advance();
                    self.expect_keyword(Keyword::By)?;
                    self.capture_expression(is_table_clause)?;
                }
                TokenKind::Keyword(Keyword::Ttl | Keyword::Settings) => {
                    self.advance();
                    self.capture_expression(is_table_clause)?;
                }
                TokenKind::Keyword(Keyword::Comment) => {
                    self.advance();
                    self.eat_kind(TokenKind::Equals);
                    table.comment = Some(self.expect_string("table comment")?);
                }
                TokenKind::Keyword(Keyword::Populate) => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::As) => {
                    self.advance();
                    self.parse_as_body(table)?;
                    break;
                }
                _ => return Err(self.error("unexpected token after column list")),
            }
        }

        Ok(())
    }

    /// Body after `AS`. Only materialized views without a column list
    /// derive their columns from it; everything else ignores the query.
    fn parse_as_body(&mut self, table: &mut TableDecl) -> Result<()> {
        if table.kind != TableKind::MaterializedView || !table.columns.is_empty() {
            self.position = self.tokens.len();
            return Ok(());
        }

        let cte = if self.eat_keyword(Keyword::With) {
            self.parse_with_clause()?
        } else {
            None
        };

        self.expect_keyword(Keyword::Select)?;
        let select_items = self.parse_select_list()?;
        self.expect_keyword(Keyword::From)?;
        let source_table = self.parse_from_source()?;
        self.position = self.tokens.len();

        ensure_within("column count", select_items.len(), MAX_COLUMNS)?;
        table.columns = select_items
            .iter()
            .map(|item| ColumnDecl::new(item.output_name(), TypeExpr::unknown(), UNKNOWN_TYPE))
            .collect();
        table.materialized_view = Some(MvInfo {
            source_table,
            select_items,
            cte,
        });
        Ok(())
    }

    /// `WITH name AS (SELECT ... FROM src ...)` is captured as a named
    /// sub-query; any other WITH content is skipped up to the main SELECT.
    fn parse_with_clause(&mut self) -> Result<Option<CteInfo>> {
        let is_named_subquery = self.peek().is_some_and(Token::is_name)
            && self.peek_nth(1).is_some_and(|t| t.is_keyword(Keyword::As))
            && self.peek_nth(2).is_some_and(|t| t.kind == TokenKind::LParen)
            && self.peek_nth(3).is_some_and(|t| t.is_keyword(Keyword::Select));

        let mut cte = None;
        if is_named_subquery {
            let name = self.expect_name("sub-query name")?;
            self.expect_keyword(Keyword::As)?;
            self.expect_kind(TokenKind::LParen, "'('")?;
            self.expect_keyword(Keyword::Select)?;
            let items = self.parse_select_list()?;
            self.expect_keyword(Keyword::From)?;
            let source_table = self.parse_from_source()?;
            self.skip_to_close()?;
            cte = Some(CteInfo {
                name,
                source_table,
                items,
            });
        }

        self.capture_expression(|t| t.is_keyword(Keyword::Select))?;
        Ok(cte)
    }

    /// Table named after FROM, or `None` for a sub-select
    fn parse_from_source(&mut self) -> Result<Option<String>> {
        if self.check_kind(TokenKind::LParen) {
            self.skip_balanced()?;
            return Ok(None);
        }
        let (_, name) = self.parse_qualified_name("source table")?;
        Ok(Some(name))
    }

    fn parse_select_list(&mut self) -> Result<Vec<SelectItem>> {
        let mut items = Vec::new();
        let mut budget = StepBudget::new("select list");

        loop {
            budget.tick()?;
            let start = self.position;
            self.capture_expression(|t| {
                t.kind == TokenKind::Comma || t.is_keyword(Keyword::From)
            })?;
            if let Some(item) = self.select_item(start, self.position)? {
                items.push(item);
            }
            if !self.eat_kind(TokenKind::Comma) {
                break;
            }
        }

        Ok(items)
    }

    /// Build one projection item from the tokens in `start..end`
    fn select_item(&self, start: usize, end: usize) -> Result<Option<SelectItem>> {
        let tokens = &self.tokens[start..end];
        if tokens.is_empty() {
            return Err(self.error("empty projection item"));
        }

        let (expr, alias) = match tokens {
            [expr @ .., as_kw, alias]
                if !expr.is_empty()
                    && as_kw.is_keyword(Keyword::As)
                    && matches!(
                        alias.kind,
                        TokenKind::Identifier | TokenKind::QuotedIdentifier | TokenKind::Keyword(_)
                    ) =>
            {
                (expr, Some(alias.text.clone()))
            }
            _ => (tokens, None),
        };

        if let [star] = expr {
            if star.kind == TokenKind::Star {
                debug!("wildcard projection item dropped");
                return Ok(None);
            }
        }

        let expr_end = start + expr.len();
        let item = if is_column_reference(expr) {
            let column = expr[expr.len() - 1].text.clone();
            SelectItem {
                name: column.clone(),
                alias,
                source_column: Some(column),
                aggregate_func: None,
            }
        } else if expr.len() > 1 && expr[0].is_name() && expr[1].kind == TokenKind::LParen {
            SelectItem {
                name: self.raw_text(start, expr_end),
                alias,
                source_column: first_plain_identifier(&expr[2..]),
                aggregate_func: Some(expr[0].text.clone()),
            }
        } else {
            SelectItem {
                name: self.raw_text(start, expr_end),
                alias,
                source_column: first_plain_identifier(expr),
                aggregate_func: None,
            }
        };
        Ok(Some(item))
    }

    // ---------------------------------------------------------------------
    // Token-level helpers
    // ---------------------------------------------------------------------

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.position + n)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.check_kind(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: TokenKind, what: &str) -> Result<&'a Token> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.position += 1;
                Ok(t)
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", keyword.as_str())))
        }
    }

    fn expect_name(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(t) if t.is_name() => {
                self.position += 1;
                Ok(t.text.clone())
            }
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    /// A type always follows a column name, so reserved keywords are allowed here
    fn expect_column_name(&mut self) -> Result<String> {
        match self.peek() {
            Some(t) if t.is_name() || matches!(t.kind, TokenKind::Keyword(_)) => {
                self.position += 1;
                Ok(t.text.clone())
            }
            _ => Err(self.error("expected column name")),
        }
    }

    fn expect_string(&mut self, what: &str) -> Result<String> {
        Ok(self.expect_kind(TokenKind::String, what)?.text.clone())
    }

    fn parse_name_or_string(&mut self, what: &str) -> Result<String> {
        if self.check_kind(TokenKind::String) {
            self.expect_string(what)
        } else {
            self.expect_name(what)
        }
    }

    /// `name` or `database.name`; longer chains keep their last two parts
    fn parse_qualified_name(&mut self, what: &str) -> Result<(Option<String>, String)> {
        let mut parts = vec![self.expect_name(what)?];
        let mut budget = StepBudget::new("qualified name");
        while self.eat_kind(TokenKind::Dot) {
            budget.tick()?;
            parts.push(self.expect_name(what)?);
        }
        let name = parts.pop().unwrap_or_default();
        Ok((parts.pop(), name))
    }

    /// Skip a parenthesized group starting at the current `(`
    fn skip_balanced(&mut self) -> Result<()> {
        self.expect_kind(TokenKind::LParen, "'('")?;
        self.skip_to_close()
    }

    /// Skip up to and including the `)` closing the group we are inside
    fn skip_to_close(&mut self) -> Result<()> {
        let mut depth = 0usize;
        let mut budget = StepBudget::new("balanced parentheses");
        while let Some(token) = self.advance() {
            budget.tick()?;
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => return Ok(()),
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
        }
        Err(Error::parse("unbalanced parentheses", None))
    }

    /// Consume tokens up to (not including) the first top-level token
    /// matching `stop`, a `;`, or a `)` closing an enclosing group.
    /// Returns the consumed source text, if any.
    fn capture_expression(&mut self, stop: impl Fn(&Token) -> bool) -> Result<Option<String>> {
        let start = self.position;
        let mut depth = 0usize;
        let mut budget = StepBudget::new("expression");

        while let Some(token) = self.peek() {
            budget.tick()?;
            match token.kind {
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::RParen if depth == 0 => break,
                _ if depth == 0 && stop(token) => break,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            self.position += 1;
        }

        if depth > 0 {
            return Err(Error::parse("unbalanced parentheses", None));
        }
        let text = self.raw_text(start, self.position);
        Ok((!text.is_empty()).then_some(text))
    }

    /// Source text covered by tokens `start..end`
    fn raw_text(&self, start: usize, end: usize) -> String {
        if start >= end {
            return String::new();
        }
        let from = self.tokens[start].span.offset;
        let to = self.tokens[end - 1].span.end();
        self.source[from..to].to_string()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let message = message.into();
        match self.peek() {
            Some(token) => Error::parse(
                format!("{message}, found '{}'", token.text),
                Some(token.span),
            ),
            None => Error::parse(format!("{message}, found end of statement"), None),
        }
    }
}

/// Keywords that end a column's default or TTL expression
fn is_column_clause(token: &Token) -> bool {
    token.kind == TokenKind::Comma
        || matches!(
            token.kind,
            TokenKind::Keyword(Keyword::Comment | Keyword::Codec | Keyword::Ttl)
        )
}

/// Keywords that start the next table-level clause
fn is_table_clause(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::Keyword(
            Keyword::Engine
                | Keyword::Partition
                | Keyword::Order
                | Keyword::Primary
                | Keyword::Sample
                | Keyword::Ttl
                | Keyword::Settings
                | Keyword::Comment
                | Keyword::Populate
                | Keyword::As
        )
    )
}

/// `col` or `t.col` (or `db.t.col`)
fn is_column_reference(tokens: &[Token]) -> bool {
    tokens.len() % 2 == 1
        && tokens.iter().enumerate().all(|(i, t)| {
            if i % 2 == 0 {
                t.is_name()
            } else {
                t.kind == TokenKind::Dot
            }
        })
}

/// First identifier that is neither a function name nor a qualifier
fn first_plain_identifier(tokens: &[Token]) -> Option<String> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let next = tokens.get(i + 1).map(|t| t.kind);
        let plain = matches!(token.kind, TokenKind::Identifier | TokenKind::QuotedIdentifier)
            && !matches!(next, Some(TokenKind::LParen | TokenKind::Dot));
        plain.then(|| token.text.clone())
    })
}
