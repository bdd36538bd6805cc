//! Query lexer.
//!
//! Converts a query string into a stream of tokens for the parser.

use std::{iter::Peekable, str::Chars};

use crate::error::LexError;

/// A token in the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word (search term).
    Term(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// The OR keyword.
    Or,

    /// The AND keyword.
    And,

    /// Negation prefix (`-`).
    Not,

    /// Required prefix (`+`).
    Required,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g., "title:" produces FieldPrefix("title")).
    FieldPrefix(String),

    /// Boost operator with factor (e.g., "^2.5" produces Boost(2.5)).
    Boost(f32),
}

/// Characters that end a bare word.
fn is_word_boundary(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '"' | '^')
}

/// Tokenizes a query string.
struct Lexer<'a> {
    /// The original input string.
    input: &'a str,
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Returns the next token, or None at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let single = match ch {
            '"' => return self.read_phrase(),
            '^' => return self.read_boost(),
            '(' => Token::LParen,
            ')' => Token::RParen,
            '-' => Token::Not,
            '+' => Token::Required,
            _ => return self.read_word(),
        };
        self.advance();
        Ok(Some(single))
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.position;
        self.advance();

        let mut content = String::new();
        while let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
            if ch == '"' {
                return Ok(Some(Token::Phrase(content)));
            }
            content.push(ch);
        }

        Err(LexError::new("unclosed quote", start, self.input))
    }

    /// Reads a term, an operator keyword, or a field prefix.
    ///
    /// Wildcards (`*`, `?`) are rejected rather than matched literally.
    fn read_word(&mut self) -> Result<Option<Token>, LexError> {
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if is_word_boundary(ch) {
                break;
            }
            if matches!(ch, '*' | '?') {
                return Err(LexError::new(
                    format!("wildcard '{ch}' is not supported"),
                    self.position,
                    self.input,
                ));
            }
            self.advance();

            if ch == ':' {
                if word.is_empty() {
                    continue;
                }
                return Ok(Some(Token::FieldPrefix(word)));
            }
            word.push(ch);
        }

        if word.is_empty() {
            return Ok(None);
        }

        // Operators are upper-case only so that "and"/"or" stay searchable words.
        Ok(Some(match word.as_str() {
            "OR" => Token::Or,
            "AND" => Token::And,
            _ => Token::Term(word),
        }))
    }

    /// Reads a boost operator (`^N` or `^N.N`).
    fn read_boost(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.position;
        self.advance();

        let mut number = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() || (ch == '.' && !number.contains('.')) {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if number.is_empty() {
            return Err(LexError::new("expected number after '^'", start, self.input));
        }

        number
            .parse::<f32>()
            .map(|factor| Some(Token::Boost(factor)))
            .map_err(|_| LexError::new(format!("invalid boost value: {number}"), start, self.input))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|ch| ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Tokenizes a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}
