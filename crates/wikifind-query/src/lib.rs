//! Query parsing and AST for wikifind search.
//!
//! The query language accepted by the wiki search box:
//!
//! - **Terms**: `backup` - bare words, joined by the caller's default operator
//! - **Phrases**: `"release notes"` - exact sequences
//! - **Negation**: `-draft` - terms that must NOT appear
//! - **Required**: `+backup` - terms that must appear even in any-word searches
//! - **AND / OR**: `backup AND restore`, `backup OR restore` - explicit operators
//! - **Grouping**: `(a b) OR (c d)` - precedence control
//! - **Fields**: `title:install` - search a specific field
//! - **Boosting**: `backup^2.5` - adjust term importance
//!
//! Wildcards (`*`, `?`) are not supported and fail to lex.
//!
//! # Example
//!
//! ```
//! use wikifind_query::{DefaultOperator, parse};
//!
//! let expr = parse("title:install (linux OR windows) -draft", DefaultOperator::And).unwrap();
//! assert!(expr.is_some());
//! ```

#![warn(missing_docs)]

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{DefaultOperator, QueryExpr};
pub use error::{LexError, ParseError, QueryError, QueryErrorKind};
pub use lexer::{Token, tokenize};
pub use parser::parse;
