//! Error types for query parsing and compilation.

use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// Lexer error with the byte position where scanning failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query syntax error at byte {position}: {message}")]
pub struct LexError {
    /// Error message.
    pub message: String,
    /// Byte position in input where the error occurred.
    pub position: usize,
    /// The original input string.
    pub input: String,
}

impl LexError {
    /// Creates a new lexer error.
    pub fn new(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

/// Parse error with the index of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message.
    pub message: String,
    /// Token index where the error occurred (if applicable).
    pub token_index: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(message: impl Into<String>, token_index: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token_index,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_index {
            Some(idx) => write!(f, "at token {idx}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ParseError {}

/// A malformed query, surfaced to the user instead of a result list.
///
/// Carries the original query string (when known) so the message can point at
/// the offending position.
#[derive(Debug, Clone)]
pub struct QueryError {
    /// The kind of error that occurred.
    pub kind: QueryErrorKind,
    /// The original query string (if available).
    pub query: Option<String>,
}

/// The specific kind of query error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Lexer error (tokenization failed).
    Lex {
        /// Error message.
        message: String,
        /// Byte position in input.
        position: usize,
    },
    /// Parser error (invalid syntax).
    Parse {
        /// Error message.
        message: String,
    },
    /// Compilation error (valid syntax, invalid semantics such as an unknown field).
    Compile {
        /// Error message.
        message: String,
    },
}

impl QueryError {
    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Parse {
                message: message.into(),
            },
            query: None,
        }
    }

    /// Creates a compile error.
    pub fn compile(message: impl Into<String>) -> Self {
        Self {
            kind: QueryErrorKind::Compile {
                message: message.into(),
            },
            query: None,
        }
    }

    /// Sets the query string for this error.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Returns the error message without context.
    pub fn message(&self) -> &str {
        match &self.kind {
            QueryErrorKind::Lex { message, .. }
            | QueryErrorKind::Parse { message }
            | QueryErrorKind::Compile { message } => message,
        }
    }

    /// Returns a hint for common mistakes.
    pub fn suggestion(&self) -> Option<&'static str> {
        let message = self.message();
        if message.contains("unclosed quote") {
            Some("add a closing quote (\") to complete the phrase")
        } else if message.contains("closing parenthesis") {
            Some("add a closing parenthesis ) to match the opening one")
        } else if message.contains("OR") || message.contains("AND") {
            Some("AND/OR need expressions on both sides, e.g. 'backup OR restore'")
        } else if message.contains("unknown field") {
            Some("searchable fields are: title, content, wiki, page_full_name, file_name")
        } else {
            None
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            QueryErrorKind::Lex { .. } | QueryErrorKind::Parse { .. } => "query syntax error",
            QueryErrorKind::Compile { .. } => "query error",
        };
        write!(f, "{prefix}: {}", self.message())?;

        if let Some(query) = &self.query {
            write!(f, "\n  {query}")?;
            if let QueryErrorKind::Lex { position, .. } = self.kind {
                write!(f, "\n  {}^", " ".repeat(position.min(query.len())))?;
            }
        }

        if let Some(hint) = self.suggestion() {
            write!(f, "\nhint: {hint}")?;
        }

        Ok(())
    }
}

impl StdError for QueryError {}

impl From<LexError> for QueryError {
    fn from(err: LexError) -> Self {
        Self {
            kind: QueryErrorKind::Lex {
                message: err.message,
                position: err.position,
            },
            query: Some(err.input),
        }
    }
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        Self::parse(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_points_at_position() {
        let err = QueryError::from(LexError::new("unclosed quote", 7, "backup \"release"));
        let display = err.to_string();
        assert!(display.contains("unclosed quote"));
        assert!(display.contains("backup \"release"));
        assert!(display.contains("       ^"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn parse_error_keeps_query() {
        let err = QueryError::parse("expected closing parenthesis").with_query("(backup");
        let display = err.to_string();
        assert!(display.starts_with("query syntax error"));
        assert!(display.contains("(backup"));
        assert!(!display.contains('^'));
    }

    #[test]
    fn compile_error_lists_fields() {
        let err = QueryError::compile("unknown field: author");
        assert_eq!(err.message(), "unknown field: author");
        assert!(err.to_string().contains("searchable fields are"));
    }

    #[test]
    fn parse_error_from_token_error() {
        let err: QueryError = ParseError::new("unexpected OR", Some(0)).into();
        assert!(matches!(err.kind, QueryErrorKind::Parse { .. }));
        assert!(err.suggestion().unwrap().contains("both sides"));
    }
}
