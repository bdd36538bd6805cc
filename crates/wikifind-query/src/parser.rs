//! Query parser.
//!
//! Parses a token stream into a query AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → or_expr
//! or_expr    → and_expr ("OR" and_expr)*
//! and_expr   → sequence ("AND" sequence)*
//! sequence   → unary+                      (joined by the default operator)
//! unary      → "-" unary | "+" unary | primary
//! primary    → (TERM | PHRASE | field_expr | "(" or_expr ")") BOOST?
//! field_expr → FIELD_PREFIX (TERM | PHRASE | "(" or_expr ")")
//! ```
//!
//! Adjacent clauses without an explicit operator bind tightest, so with an `Or`
//! default `a b AND c` reads as `(a OR b) AND c`.

use std::mem;

use crate::{
    ast::{DefaultOperator, QueryExpr},
    error::{ParseError, QueryError},
    lexer::{Token, tokenize},
};

/// Recursive descent parser for query expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
    /// Operator joining adjacent clauses.
    default_operator: DefaultOperator,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>, default_operator: DefaultOperator) -> Self {
        Self {
            tokens,
            position: 0,
            default_operator,
        }
    }

    /// Parses the token stream into a query expression.
    fn parse(mut self) -> Result<Option<QueryExpr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("unexpected token: {token:?}"),
                Some(self.position),
            ));
        }

        Ok(Some(expr))
    }

    /// Parses: or_expr → and_expr ("OR" and_expr)*
    fn parse_or_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut operands = vec![self.parse_and_expr()?];
        while self.check(&Token::Or) {
            self.advance();
            operands.push(self.parse_and_expr()?);
        }
        Ok(QueryExpr::or(operands))
    }

    /// Parses: and_expr → sequence ("AND" sequence)*
    fn parse_and_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut operands = vec![self.parse_sequence()?];
        while self.check(&Token::And) {
            self.advance();
            operands.push(self.parse_sequence()?);
        }
        Ok(QueryExpr::and(operands))
    }

    /// Parses: sequence → unary+
    fn parse_sequence(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = vec![self.parse_unary()?];
        while self.can_start_unary() {
            exprs.push(self.parse_unary()?);
        }
        Ok(QueryExpr::join(self.default_operator, exprs))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Term(_)
                    | Token::Phrase(_)
                    | Token::Not
                    | Token::Required
                    | Token::LParen
                    | Token::FieldPrefix(_)
            )
        )
    }

    /// Parses: unary → "-" unary | "+" unary | primary
    fn parse_unary(&mut self) -> Result<QueryExpr, ParseError> {
        match self.peek().cloned() {
            Some(Token::Not) => {
                self.advance();
                Ok(QueryExpr::Not(Box::new(self.parse_unary()?)))
            }
            Some(Token::Required) => {
                self.advance();
                Ok(QueryExpr::Required(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_primary(),
        }
    }

    /// Parses a primary expression and its optional boost suffix.
    fn parse_primary(&mut self) -> Result<QueryExpr, ParseError> {
        let expr = match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.parse_term_or_phrase()?,
            Some(Token::FieldPrefix(name)) => {
                self.advance();
                self.parse_field_expr(name)?
            }
            Some(Token::LParen) => self.parse_group("expected closing parenthesis")?,
            Some(Token::RParen) => {
                return Err(self.error("unexpected closing parenthesis"));
            }
            Some(Token::Or) => {
                return Err(self.error("unexpected OR (needs expression before it)"));
            }
            Some(Token::And) => {
                return Err(self.error("unexpected AND (needs expression before it)"));
            }
            Some(Token::Boost(_)) => {
                return Err(self.error("unexpected boost (needs expression before it)"));
            }
            Some(Token::Not | Token::Required) => {
                return Err(self.error("unexpected prefix operator"));
            }
            None => return Err(ParseError::new("unexpected end of query", None)),
        };

        if let Some(Token::Boost(factor)) = self.peek().cloned() {
            self.advance();
            return Ok(QueryExpr::boost(expr, factor));
        }
        Ok(expr)
    }

    /// Parses the expression after a field prefix.
    fn parse_field_expr(&mut self, name: String) -> Result<QueryExpr, ParseError> {
        let expr = match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_)) => self.parse_term_or_phrase()?,
            Some(Token::LParen) => {
                self.parse_group("expected closing parenthesis after field expression")?
            }
            _ => {
                return Err(self.error(format!(
                    "expected term, phrase, or group after '{name}:'"
                )));
            }
        };

        Ok(QueryExpr::Field {
            name,
            expr: Box::new(expr),
        })
    }

    /// Consumes a TERM or PHRASE token.
    fn parse_term_or_phrase(&mut self) -> Result<QueryExpr, ParseError> {
        let expr = match self.peek() {
            Some(Token::Term(text)) => QueryExpr::Term(text.clone()),
            Some(Token::Phrase(text)) => {
                QueryExpr::Phrase(text.split_whitespace().map(String::from).collect())
            }
            _ => return Err(self.error("expected term or phrase")),
        };
        self.advance();
        Ok(expr)
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self, missing_rparen_msg: &str) -> Result<QueryExpr, ParseError> {
        self.advance();
        let inner = self.parse_or_expr()?;

        if !self.check(&Token::RParen) {
            return Err(self.error(missing_rparen_msg));
        }
        self.advance();

        Ok(inner)
    }

    /// Builds an error located at the current token.
    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, Some(self.position))
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Checks if the current token has the same kind as `token`.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a query string into an AST.
///
/// Returns `Ok(None)` for empty queries, `Ok(Some(expr))` for valid queries,
/// or `Err(QueryError)` carrying the query text for invalid syntax.
pub fn parse(input: &str, default_operator: DefaultOperator) -> Result<Option<QueryExpr>, QueryError> {
    let tokens = tokenize(input)?;
    Parser::new(tokens, default_operator)
        .parse()
        .map_err(|err| QueryError::from(err).with_query(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> QueryExpr {
        QueryExpr::Term(s.into())
    }

    fn phrase(words: &[&str]) -> QueryExpr {
        QueryExpr::Phrase(words.iter().map(|s| s.to_string()).collect())
    }

    fn not(e: QueryExpr) -> QueryExpr {
        QueryExpr::Not(Box::new(e))
    }

    fn required(e: QueryExpr) -> QueryExpr {
        QueryExpr::Required(Box::new(e))
    }

    fn and(exprs: Vec<QueryExpr>) -> QueryExpr {
        QueryExpr::and(exprs)
    }

    fn or(exprs: Vec<QueryExpr>) -> QueryExpr {
        QueryExpr::or(exprs)
    }

    fn field(name: &str, e: QueryExpr) -> QueryExpr {
        QueryExpr::Field {
            name: name.into(),
            expr: Box::new(e),
        }
    }

    fn all(input: &str) -> Option<QueryExpr> {
        parse(input, DefaultOperator::And).unwrap()
    }

    fn any(input: &str) -> Option<QueryExpr> {
        parse(input, DefaultOperator::Or).unwrap()
    }

    #[test]
    fn empty_query() {
        assert_eq!(all(""), None);
        assert_eq!(any("   "), None);
    }

    #[test]
    fn single_term() {
        assert_eq!(all("backup"), Some(term("backup")));
        assert_eq!(any("backup"), Some(term("backup")));
    }

    #[test]
    fn adjacent_terms_follow_default_operator() {
        assert_eq!(
            all("alpha beta gamma"),
            Some(and(vec![term("alpha"), term("beta"), term("gamma")]))
        );
        assert_eq!(
            any("alpha beta gamma"),
            Some(or(vec![term("alpha"), term("beta"), term("gamma")]))
        );
    }

    #[test]
    fn explicit_or_in_all_words_mode() {
        assert_eq!(
            all("linux backup OR restore"),
            Some(or(vec![and(vec![term("linux"), term("backup")]), term("restore")]))
        );
    }

    #[test]
    fn explicit_and_in_any_word_mode() {
        assert_eq!(
            any("linux windows AND backup"),
            Some(and(vec![or(vec![term("linux"), term("windows")]), term("backup")]))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            any("a AND b OR c"),
            Some(or(vec![and(vec![term("a"), term("b")]), term("c")]))
        );
    }

    #[test]
    fn prefixes_in_any_word_mode() {
        assert_eq!(
            any("+backup linux -draft"),
            Some(or(vec![required(term("backup")), term("linux"), not(term("draft"))]))
        );
    }

    #[test]
    fn double_negation() {
        assert_eq!(all("--draft"), Some(not(not(term("draft")))));
    }

    #[test]
    fn phrase_with_terms() {
        assert_eq!(
            all("install \"release notes\""),
            Some(and(vec![term("install"), phrase(&["release", "notes"])]))
        );
    }

    #[test]
    fn grouping() {
        assert_eq!(
            all("(linux OR windows) backup"),
            Some(and(vec![or(vec![term("linux"), term("windows")]), term("backup")]))
        );
        assert_eq!(
            all("((a OR b) c)"),
            Some(and(vec![or(vec![term("a"), term("b")]), term("c")]))
        );
    }

    #[test]
    fn fields() {
        assert_eq!(all("title:install"), Some(field("title", term("install"))));
        assert_eq!(
            all("title:\"getting started\" backup"),
            Some(and(vec![
                field("title", phrase(&["getting", "started"])),
                term("backup")
            ]))
        );
        assert_eq!(
            any("content:(a b)"),
            Some(field("content", or(vec![term("a"), term("b")])))
        );
        assert_eq!(
            all("-title:draft"),
            Some(not(field("title", term("draft"))))
        );
    }

    #[test]
    fn boosts() {
        assert_eq!(
            all("backup^2.5 restore"),
            Some(and(vec![QueryExpr::boost(term("backup"), 2.5), term("restore")]))
        );
        assert_eq!(
            all("title:install^3"),
            Some(QueryExpr::boost(field("title", term("install")), 3.0))
        );
    }

    #[test]
    fn errors() {
        let cases = [
            ("(backup restore", "closing parenthesis"),
            ("backup)", "unexpected"),
            ("OR backup", "OR"),
            ("backup AND", "end of query"),
            ("title:", "expected"),
            ("\"unclosed", "unclosed"),
            ("^2 backup", "boost"),
            ("backup -", "end of query"),
        ];

        for (input, expected) in cases {
            let err = parse(input, DefaultOperator::And).unwrap_err();
            assert!(
                err.message().contains(expected),
                "{input:?} gave {:?}",
                err.message()
            );
            assert_eq!(err.query.as_deref(), Some(input));
        }
    }

    #[test]
    fn lowercase_keywords_are_terms() {
        assert_eq!(
            any("rock and roll"),
            Some(or(vec![term("rock"), term("and"), term("roll")]))
        );
    }
}
