//! Query compiler.
//!
//! Compiles a parsed [`QueryExpr`] into a Tantivy query over a set of fields. Each
//! term becomes one clause per field in scope (any field may match), and those
//! per-term clauses are combined per the expression's operators.

use std::mem;

use tantivy::{
    Term,
    query::{AllQuery, BooleanQuery, BoostQuery, Occur, PhraseQuery, Query, TermQuery},
    schema::IndexRecordOption,
    tokenizer::TextAnalyzer,
};
use wikifind_query::{QueryError, QueryExpr};

use crate::{
    analyzer::tokenize,
    schema::{FieldIndexing, IndexSchema, SearchField},
};

/// A compiled clause, or `None` when the expression analyzed to nothing.
type Compiled = Result<Option<Box<dyn Query>>, QueryError>;

/// Compiles query AST nodes into Tantivy queries.
pub struct QueryCompiler {
    /// Index schema for field references.
    schema: IndexSchema,
    /// Analyzer for tokenized fields.
    analyzer: TextAnalyzer,
    /// Fields the expression currently being compiled is matched against.
    scope: Vec<SearchField>,
}

impl QueryCompiler {
    /// Creates a compiler searching `fields` by default.
    ///
    /// Fails if a field is not indexed.
    pub fn new(
        schema: IndexSchema,
        analyzer: TextAnalyzer,
        fields: &[SearchField],
    ) -> Result<Self, QueryError> {
        for field in fields {
            check_searchable(*field)?;
        }
        Ok(Self {
            schema,
            analyzer,
            scope: fields.to_vec(),
        })
    }

    /// Compiles a query expression into a Tantivy query.
    ///
    /// Returns `None` if nothing in the expression produced a searchable term.
    pub fn compile(&mut self, expr: &QueryExpr) -> Compiled {
        match expr {
            QueryExpr::Term(text) => Ok(self.compile_text(text)),
            QueryExpr::Phrase(words) => Ok(self.compile_text(&words.join(" "))),
            QueryExpr::Not(inner) => Ok(self
                .compile(inner)?
                .map(|q| exclude_from(vec![], vec![q]))),
            QueryExpr::Required(inner) => self.compile(inner),
            QueryExpr::And(exprs) => self.compile_group(exprs, Occur::Must),
            QueryExpr::Or(exprs) => self.compile_group(exprs, Occur::Should),
            QueryExpr::Field { name, expr } => self.compile_field(name, expr),
            QueryExpr::Boost { expr, factor } => Ok(self
                .compile(expr)?
                .map(|q| Box::new(BoostQuery::new(q, *factor)) as Box<dyn Query>)),
        }
    }

    /// Compiles a conjunction or disjunction.
    ///
    /// Negated members become `MustNot` and required members `Must` whatever the group's
    /// operator; the rest take `occur`. A group with only negated members excludes from
    /// the whole index.
    fn compile_group(&mut self, exprs: &[QueryExpr], occur: Occur) -> Compiled {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        let mut excluded: Vec<Box<dyn Query>> = Vec::new();

        for expr in exprs {
            match expr {
                QueryExpr::Not(inner) => excluded.extend(self.compile(inner)?),
                QueryExpr::Required(inner) => {
                    if let Some(q) = self.compile(inner)? {
                        clauses.push((Occur::Must, q));
                    }
                }
                other => {
                    if let Some(q) = self.compile(other)? {
                        clauses.push((occur, q));
                    }
                }
            }
        }

        if excluded.is_empty() {
            return Ok(match clauses.len() {
                0 => None,
                1 => clauses.pop().map(|(_, q)| q),
                _ => Some(Box::new(BooleanQuery::new(clauses))),
            });
        }
        Ok(Some(exclude_from(clauses, excluded)))
    }

    /// Compiles an expression scoped to a single named field.
    fn compile_field(&mut self, name: &str, expr: &QueryExpr) -> Compiled {
        let field = SearchField::from_name(name)
            .ok_or_else(|| QueryError::compile(format!("unknown field: {name}")))?;
        check_searchable(field)?;

        let outer = mem::replace(&mut self.scope, vec![field]);
        let compiled = self.compile(expr);
        self.scope = outer;
        compiled
    }

    /// Compiles free text against every field in scope.
    fn compile_text(&mut self, text: &str) -> Option<Box<dyn Query>> {
        let scope = self.scope.clone();
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = scope
            .into_iter()
            .filter_map(|field| self.field_clause(field, text))
            .map(|q| (Occur::Should, q))
            .collect();

        match clauses.len() {
            0 => None,
            1 => clauses.pop().map(|(_, q)| q),
            _ => Some(Box::new(BooleanQuery::new(clauses))),
        }
    }

    /// Builds the clause matching `text` in one field.
    ///
    /// Exact fields match the raw text. Tokenized fields match its analyzed terms, as a
    /// phrase when the text analyzes into several.
    fn field_clause(&mut self, field: SearchField, text: &str) -> Option<Box<dyn Query>> {
        let handle = self.schema.field(field);
        match field.indexing() {
            FieldIndexing::Exact => Some(Box::new(TermQuery::new(
                Term::from_field_text(handle, text),
                IndexRecordOption::Basic,
            ))),
            FieldIndexing::Tokenized => {
                let mut tokens = tokenize(&mut self.analyzer, text);
                match tokens.len() {
                    0 => None,
                    1 => tokens.pop().map(|token| {
                        Box::new(TermQuery::new(
                            Term::from_field_text(handle, &token.term),
                            IndexRecordOption::WithFreqs,
                        )) as Box<dyn Query>
                    }),
                    _ => {
                        let base = tokens[0].position;
                        let terms = tokens
                            .iter()
                            .map(|token| {
                                (
                                    token.position - base,
                                    Term::from_field_text(handle, &token.term),
                                )
                            })
                            .collect();
                        Some(Box::new(PhraseQuery::new_with_offset(terms)))
                    }
                }
            }
            FieldIndexing::NotIndexed => None,
        }
    }
}

/// Fails if `field` cannot be searched.
fn check_searchable(field: SearchField) -> Result<(), QueryError> {
    match field.indexing() {
        FieldIndexing::NotIndexed => Err(QueryError::compile(format!(
            "field '{field}' is stored for display only and cannot be searched"
        ))),
        FieldIndexing::Tokenized | FieldIndexing::Exact => Ok(()),
    }
}

/// Combines clauses with exclusions, matching everything when no clause is positive.
fn exclude_from(
    mut clauses: Vec<(Occur, Box<dyn Query>)>,
    excluded: Vec<Box<dyn Query>>,
) -> Box<dyn Query> {
    if clauses.iter().all(|(occur, _)| *occur == Occur::MustNot) {
        clauses.push((Occur::Must, Box::new(AllQuery)));
    }
    clauses.extend(excluded.into_iter().map(|q| (Occur::MustNot, q)));
    Box::new(BooleanQuery::new(clauses))
}
