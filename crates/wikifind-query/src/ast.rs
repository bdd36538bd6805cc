//! Query abstract syntax tree.
//!
//! Represents parsed query expressions before compilation to index queries.

use std::fmt;

/// Operator used to join adjacent clauses that have no explicit `AND`/`OR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultOperator {
    /// Every clause must match.
    #[default]
    And,
    /// At least one clause must match.
    Or,
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single search term.
    Term(String),

    /// An exact phrase (sequence of terms).
    Phrase(Vec<String>),

    /// Negation: results must NOT match this expression.
    Not(Box<Self>),

    /// Results must match this expression even inside a disjunction.
    Required(Box<Self>),

    /// Conjunction: all sub-expressions must match.
    And(Vec<Self>),

    /// Disjunction: at least one sub-expression must match.
    Or(Vec<Self>),

    /// Field-scoped query: search only within a specific field.
    Field {
        /// Field name (e.g., title, content).
        name: String,
        /// Expression to match within that field.
        expr: Box<Self>,
    },

    /// Boosted query: multiplies the score of the inner expression.
    Boost {
        /// The expression to boost.
        expr: Box<Self>,
        /// The boost factor (e.g., 2.5 means 2.5x the normal score).
        factor: f32,
    },
}

impl QueryExpr {
    /// Creates an And expression, flattening nested Ands.
    pub fn and(exprs: Vec<Self>) -> Self {
        let mut flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::And(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            1 => flattened.swap_remove(0),
            _ => Self::And(flattened),
        }
    }

    /// Creates an Or expression, flattening nested Ors.
    pub fn or(exprs: Vec<Self>) -> Self {
        let mut flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::Or(inner) => inner,
                other => vec![other],
            })
            .collect();

        match flattened.len() {
            1 => flattened.swap_remove(0),
            _ => Self::Or(flattened),
        }
    }

    /// Joins expressions with the given default operator.
    pub fn join(op: DefaultOperator, exprs: Vec<Self>) -> Self {
        match op {
            DefaultOperator::And => Self::and(exprs),
            DefaultOperator::Or => Self::or(exprs),
        }
    }

    /// Creates a boosted expression.
    pub fn boost(expr: Self, factor: f32) -> Self {
        Self::Boost {
            expr: Box::new(expr),
            factor,
        }
    }

    /// Returns the words of every term and phrase that is not negated.
    ///
    /// These are the words a highlighter should mark in matching documents.
    pub fn positive_words(&self) -> Vec<&str> {
        self.positive_words_where(|_| true)
    }

    /// Like [`Self::positive_words`], keeping only words whose field passes `keep`.
    ///
    /// `keep` receives the innermost `field:` scope of each word, or `None` for words
    /// searched in the caller's default fields.
    pub fn positive_words_where<F>(&self, keep: F) -> Vec<&str>
    where
        F: Fn(Option<&str>) -> bool,
    {
        let mut words = Vec::new();
        self.collect_positive_words(None, &keep, &mut words);
        words
    }

    /// Recursive helper for [`Self::positive_words_where`].
    fn collect_positive_words<'a, F>(
        &'a self,
        field: Option<&'a str>,
        keep: &F,
        words: &mut Vec<&'a str>,
    ) where
        F: Fn(Option<&str>) -> bool,
    {
        match self {
            Self::Term(text) => {
                if keep(field) {
                    words.push(text);
                }
            }
            Self::Phrase(parts) => {
                if keep(field) {
                    words.extend(parts.iter().map(String::as_str));
                }
            }
            Self::Not(_) => {}
            Self::Required(inner) => inner.collect_positive_words(field, keep, words),
            Self::And(exprs) | Self::Or(exprs) => {
                for expr in exprs {
                    expr.collect_positive_words(field, keep, words);
                }
            }
            Self::Field { name, expr } => {
                expr.collect_positive_words(Some(name.as_str()), keep, words);
            }
            Self::Boost { expr, .. } => expr.collect_positive_words(field, keep, words),
        }
    }

    /// Formats the expression as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(s) => writeln!(f, "{prefix}Term({s:?})"),
            Self::Phrase(words) => writeln!(f, "{prefix}Phrase({words:?})"),
            Self::Not(inner) => {
                writeln!(f, "{prefix}Not")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::Required(inner) => {
                writeln!(f, "{prefix}Required")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::And(exprs) => {
                writeln!(f, "{prefix}And")?;
                for expr in exprs {
                    expr.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Or(exprs) => {
                writeln!(f, "{prefix}Or")?;
                for expr in exprs {
                    expr.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Field { name, expr } => {
                writeln!(f, "{prefix}Field({name:?})")?;
                expr.fmt_tree(f, indent + 1)
            }
            Self::Boost { expr, factor } => {
                writeln!(f, "{prefix}Boost({factor})")?;
                expr.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Formats the expression as a query string with explicit operators.
    ///
    /// This produces output like: `backup^2.5 OR "release notes"^3`
    pub fn to_query_string(&self) -> String {
        match self {
            Self::Term(s) => s.clone(),
            Self::Phrase(words) => format!("\"{}\"", words.join(" ")),
            Self::Not(inner) => format!("-{}", inner.to_query_string()),
            Self::Required(inner) => format!("+{}", inner.to_query_string()),
            Self::And(exprs) => Self::join_query_strings(exprs, " AND "),
            Self::Or(exprs) => Self::join_query_strings(exprs, " OR "),
            Self::Field { name, expr } => format!("{}:{}", name, expr.to_query_string()),
            Self::Boost { expr, factor } => format!("{}^{}", expr.to_query_string(), factor),
        }
    }

    /// Joins sub-expressions with an operator, parenthesizing compound groups.
    fn join_query_strings(exprs: &[Self], separator: &str) -> String {
        match exprs {
            [] => String::new(),
            [single] => single.to_query_string(),
            _ => {
                let parts: Vec<String> = exprs.iter().map(Self::to_query_string).collect();
                format!("({})", parts.join(separator))
            }
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> QueryExpr {
        QueryExpr::Term(s.into())
    }

    #[test]
    fn and_flattens_nested() {
        let nested = QueryExpr::and(vec![
            term("a"),
            QueryExpr::And(vec![term("b"), term("c")]),
        ]);

        assert_eq!(nested, QueryExpr::And(vec![term("a"), term("b"), term("c")]));
    }

    #[test]
    fn and_single_element_unwraps() {
        assert_eq!(QueryExpr::and(vec![term("a")]), term("a"));
    }

    #[test]
    fn or_flattens_nested() {
        let nested = QueryExpr::or(vec![term("a"), QueryExpr::Or(vec![term("b"), term("c")])]);

        assert_eq!(nested, QueryExpr::Or(vec![term("a"), term("b"), term("c")]));
    }

    #[test]
    fn join_follows_default_operator() {
        let exprs = vec![term("a"), term("b")];
        assert_eq!(
            QueryExpr::join(DefaultOperator::Or, exprs.clone()),
            QueryExpr::Or(exprs.clone())
        );
        assert_eq!(
            QueryExpr::join(DefaultOperator::And, exprs.clone()),
            QueryExpr::And(exprs)
        );
    }

    #[test]
    fn positive_words_skip_negations() {
        let expr = QueryExpr::and(vec![
            term("backup"),
            QueryExpr::Not(Box::new(term("draft"))),
            QueryExpr::Field {
                name: "title".into(),
                expr: Box::new(QueryExpr::Phrase(vec!["release".into(), "notes".into()])),
            },
            QueryExpr::Required(Box::new(term("linux"))),
        ]);

        assert_eq!(
            expr.positive_words(),
            vec!["backup", "release", "notes", "linux"]
        );
    }

    #[test]
    fn positive_words_filtered_by_field() {
        let expr = QueryExpr::and(vec![
            term("backup"),
            QueryExpr::Field {
                name: "page_full_name".into(),
                expr: Box::new(term("Main.B")),
            },
            QueryExpr::Field {
                name: "title".into(),
                expr: Box::new(QueryExpr::Boost {
                    expr: Box::new(term("restore")),
                    factor: 2.0,
                }),
            },
        ]);

        let words = expr.positive_words_where(|field| field != Some("page_full_name"));
        assert_eq!(words, vec!["backup", "restore"]);
        assert_eq!(expr.positive_words().len(), 3);
    }

    #[test]
    fn query_string_uses_explicit_operators() {
        let expr = QueryExpr::or(vec![
            QueryExpr::and(vec![term("a"), term("b")]),
            QueryExpr::Not(Box::new(term("c"))),
        ]);
        assert_eq!(expr.to_query_string(), "((a AND b) OR -c)");
    }
}
