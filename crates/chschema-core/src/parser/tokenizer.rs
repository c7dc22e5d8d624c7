//! Tokenizer for DDL text.
//!
//! Lexing never fails: characters that match no rule are dropped, so that
//! malformed input surfaces as a parse error of one statement instead of
//! aborting the whole input.

use serde::Serialize;

use crate::error::Span;

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Matched text; unquoted and unescaped for strings and quoted identifiers
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Whether this token can stand for a table, column or type name
    pub fn is_name(&self) -> bool {
        match self.kind {
            TokenKind::Identifier | TokenKind::QuotedIdentifier => true,
            TokenKind::Keyword(keyword) => !keyword.is_reserved(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier,
    QuotedIdentifier,
    String,
    Number,
    LParen,
    RParen,
    Comma,
    Dot,
    Equals,
    Semicolon,
    Star,
    /// Any other operator character (`+`, `-`, `<`, ...)
    Operator,
}

macro_rules! keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// Keywords recognized by the parser
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum Keyword {
            $($variant,)*
        }

        impl Keyword {
            /// Case-insensitive keyword lookup
            pub fn lookup(word: &str) -> Option<Keyword> {
                $(
                    if word.eq_ignore_ascii_case($text) {
                        return Some(Keyword::$variant);
                    }
                )*
                None
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}

keywords! {
    Alias => "ALIAS",
    As => "AS",
    By => "BY",
    Cluster => "CLUSTER",
    Codec => "CODEC",
    Comment => "COMMENT",
    Constraint => "CONSTRAINT",
    Create => "CREATE",
    Default => "DEFAULT",
    Engine => "ENGINE",
    Ephemeral => "EPHEMERAL",
    Exists => "EXISTS",
    From => "FROM",
    If => "IF",
    Index => "INDEX",
    Key => "KEY",
    Materialized => "MATERIALIZED",
    Not => "NOT",
    Null => "NULL",
    On => "ON",
    Or => "OR",
    Order => "ORDER",
    Partition => "PARTITION",
    Populate => "POPULATE",
    Primary => "PRIMARY",
    Projection => "PROJECTION",
    Replace => "REPLACE",
    Sample => "SAMPLE",
    Select => "SELECT",
    Settings => "SETTINGS",
    Table => "TABLE",
    Temporary => "TEMPORARY",
    To => "TO",
    Ttl => "TTL",
    View => "VIEW",
    With => "WITH",
}

impl Keyword {
    /// Reserved keywords never double as names
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Keyword::As
                | Keyword::By
                | Keyword::Create
                | Keyword::From
                | Keyword::Not
                | Keyword::Null
                | Keyword::On
                | Keyword::Or
                | Keyword::Order
                | Keyword::Select
                | Keyword::To
                | Keyword::With
        )
    }
}

/// Tokenize `source`, dropping whitespace, comments and unrecognized characters
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tokens
}

struct Lexer<'src> {
    source: &'src str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.position..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let c = self.peek()?;
            let (start, line, column) = (self.position, self.line, self.column);

            let kind = match c {
                c if c.is_whitespace() => {
                    self.advance();
                    continue;
                }
                '-' if self.peek_second() == Some('-') => {
                    self.advance_while(|c| c != '\n');
                    continue;
                }
                '#' => {
                    self.advance_while(|c| c != '\n');
                    continue;
                }
                '/' if self.peek_second() == Some('*') => {
                    self.skip_block_comment();
                    continue;
                }
                '\'' => {
                    let text = self.scan_quoted('\'');
                    return Some(self.token(TokenKind::String, text, start, line, column));
                }
                '`' | '"' => {
                    let text = self.scan_quoted(c);
                    return Some(self.token(
                        TokenKind::QuotedIdentifier,
                        text,
                        start,
                        line,
                        column,
                    ));
                }
                c if c.is_ascii_digit() => {
                    self.scan_number();
                    TokenKind::Number
                }
                c if c.is_alphabetic() || c == '_' => {
                    self.advance_while(|c| c.is_alphanumeric() || c == '_');
                    match Keyword::lookup(&self.source[start..self.position]) {
                        Some(keyword) => TokenKind::Keyword(keyword),
                        None => TokenKind::Identifier,
                    }
                }
                '(' | ')' | ',' | '.' | '=' | ';' | '*' => {
                    self.advance();
                    match c {
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        ',' => TokenKind::Comma,
                        '.' => TokenKind::Dot,
                        '=' => TokenKind::Equals,
                        ';' => TokenKind::Semicolon,
                        _ => TokenKind::Star,
                    }
                }
                '+' | '-' | '/' | '%' | '<' | '>' | '!' | '|' | ':' | '?' | '[' | ']' | '{'
                | '}' | '&' | '^' | '~' => {
                    self.advance();
                    TokenKind::Operator
                }
                _ => {
                    // Unrecognized character, dropped
                    self.advance();
                    continue;
                }
            };

            let text = self.source[start..self.position].to_string();
            return Some(self.token(kind, text, start, line, column));
        }
    }

    fn token(
        &self,
        kind: TokenKind,
        text: String,
        start: usize,
        line: usize,
        column: usize,
    ) -> Token {
        Token {
            kind,
            text,
            span: Span::new(start, self.position - start, line, column),
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();
        while let Some(c) = self.advance() {
            if c == '*' && self.peek() == Some('/') {
                self.advance();
                return;
            }
        }
    }

    /// Scan a quoted run, handling backslash escapes and doubled quotes.
    /// An unterminated run extends to the end of input.
    fn scan_quoted(&mut self, quote: char) -> String {
        self.advance();
        let mut value = String::new();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    if let Some(escaped) = self.advance() {
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                    }
                }
                c if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        value.push(quote);
                    } else {
                        break;
                    }
                }
                c => value.push(c),
            }
        }
        value
    }

    fn scan_number(&mut self) {
        self.advance_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let rest = &self.source[self.position + 1..];
            let mut chars = rest.chars();
            let exponent = match chars.next() {
                Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_before_identifiers() {
        let tokens = tokenize("create TABLE ascending");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Create));
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Table));
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].text, "ascending");
    }

    #[test]
    fn test_comments_and_whitespace_dropped() {
        let source = "a -- line comment\n /* block\n comment */ b # hash ( comment\nc";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].text, "b");
        assert_eq!(tokens[1].span.line, 3);
        assert_eq!(tokens[2].span.line, 4);
    }

    #[test]
    fn test_unrecognized_characters_are_skipped() {
        assert_eq!(
            kinds("a @ $ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn test_strings_and_quoted_identifiers() {
        let tokens = tokenize(r#"'it''s' 'a\'b' `weird name` "x""#);
        assert_eq!(tokens[0].text, "it's");
        assert_eq!(tokens[1].text, "a'b");
        assert_eq!(tokens[2].kind, TokenKind::QuotedIdentifier);
        assert_eq!(tokens[2].text, "weird name");
        assert_eq!(tokens[3].text, "x");
    }

    #[test]
    fn test_unterminated_string_consumes_rest() {
        let tokens = tokenize("'abc");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "abc");
    }

    #[test]
    fn test_numbers_and_punctuation() {
        assert_eq!(
            kinds("Decimal(38, 1.5e3) = -1;"),
            vec![
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::RParen,
                TokenKind::Equals,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_spans_cover_source_text() {
        let source = "CREATE TABLE t";
        let tokens = tokenize(source);
        let last = &tokens[2];
        assert_eq!(&source[last.span.offset..last.span.end()], "t");
        assert_eq!(last.span.column, 14);
    }

    #[test]
    fn test_soft_keywords_are_names() {
        let tokens = tokenize("key from");
        assert!(tokens[0].is_name());
        assert!(!tokens[1].is_name());
    }
}
