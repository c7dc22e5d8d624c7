//! Error and diagnostic types

use serde::{Deserialize, Serialize};

/// Result alias used throughout the pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            length,
            line,
            column,
        }
    }

    /// Byte offset one past the end of the span
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Fatal and recoverable pipeline errors.
///
/// `Parse` is swallowed per statement by the parse driver; every other
/// variant reaches the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    #[error("parse error: {message}")]
    #[diagnostic(code(chschema::parse))]
    Parse {
        message: String,
        span: Option<Span>,
    },

    #[error("validation error: {message}")]
    #[diagnostic(
        code(chschema::validation),
        help("the value handed to resolve/render violates its contract")
    )]
    Validation { message: String },

    #[error("{what} nesting exceeds the maximum depth of {limit}")]
    #[diagnostic(code(chschema::depth_exceeded))]
    DepthExceeded { what: &'static str, limit: usize },

    #[error("{what} exceeds the limit of {limit}")]
    #[diagnostic(code(chschema::limit_exceeded))]
    LimitExceeded { what: &'static str, limit: usize },

    #[error("unknown leaf type '{name}'")]
    #[diagnostic(
        code(chschema::unknown_leaf_type),
        help("disable fail_on_unknown_leaf or register a type plugin for this type")
    )]
    UnknownLeafType { name: String },
}

impl Error {
    pub fn parse(message: impl Into<String>, span: Option<Span>) -> Self {
        Error::Parse {
            message: message.into(),
            span,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Whether the parse driver may drop the offending statement and continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

/// Non-fatal finding reported alongside parse results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn info(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Info,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Get the code string (e.g., "W0001")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// W0001: Statement could not be parsed and was dropped
    SkippedStatement,
    /// W0002: Statement kind is not modeled (plain view, routed materialized view)
    FilteredStatement,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::SkippedStatement => "W0001",
            DiagnosticKind::FilteredStatement => "W0002",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::SkippedStatement => "skipped-statement",
            DiagnosticKind::FilteredStatement => "filtered-statement",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_parse_errors_are_recoverable() {
        assert!(Error::parse("boom", None).is_recoverable());
        assert!(!Error::validation("bad").is_recoverable());
        assert!(!Error::DepthExceeded {
            what: "type",
            limit: 20
        }
        .is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::LimitExceeded {
            what: "column count",
            limit: 2000,
        };
        assert_eq!(err.to_string(), "column count exceeds the limit of 2000");

        let err = Error::UnknownLeafType {
            name: "Geo".to_string(),
        };
        assert_eq!(err.to_string(), "unknown leaf type 'Geo'");
    }

    #[test]
    fn test_diagnostic_codes() {
        let diag = Diagnostic::warning(DiagnosticKind::SkippedStatement, "dropped");
        assert_eq!(diag.code(), "W0001");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(DiagnosticKind::FilteredStatement.name(), "filtered-statement");
    }
}
