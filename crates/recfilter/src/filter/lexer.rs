//! Lexer (tokenizer) for filter expressions.
//!
//! The lexer is lenient: characters that cannot start a token (stray
//! punctuation, commas, unmatched quotes) are skipped without error.

use tracing::trace;

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Opening parenthesis `(`.
    Open,

    /// Closing parenthesis `)`.
    Close,

    /// Opening bracket `[` of a list literal.
    OpenBracket,

    /// Closing bracket `]` of a list literal.
    CloseBracket,

    /// A run of word characters, possibly joined by `.`.
    ///
    /// Covers keywords, integers and property paths.
    Identifier(String),

    /// A double-quoted string with the quotes stripped.
    QuotedLiteral(String),

    /// A decimal number with a fractional part.
    NumericLiteral(String),
}

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// Lexer for tokenizing filter expressions.
///
/// Yields tokens lazily through its [`Iterator`] implementation.
pub struct Lexer<'a> {
    input: &'a str,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Returns the unconsumed input.
    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    /// Peeks at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Peeks at the character after the next one.
    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consumes word characters and returns how many bytes were read.
    fn consume_word(&mut self) -> usize {
        let start = self.position;
        while let Some(c) = self.peek() {
            if is_word_char(c) {
                self.next_char();
            } else {
                break;
            }
        }
        self.position - start
    }

    /// Consumes ASCII digits and returns how many were read.
    fn consume_digits(&mut self) -> usize {
        let start = self.position;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.next_char();
            } else {
                break;
            }
        }
        self.position - start
    }

    /// Reads a quoted string, or returns `None` if the quote is unmatched or empty.
    ///
    /// On `None` nothing is consumed.
    fn read_quoted(&mut self) -> Option<String> {
        let body = &self.rest()[1..];
        let end = body.find('"')?;
        if end == 0 {
            return None;
        }
        let text = body[..end].to_string();
        self.position += end + 2;
        Some(text)
    }

    /// Reads a decimal number (`digits.digits`) or, failing that, a word.
    fn read_number_or_word(&mut self, start: usize) -> Token {
        self.consume_digits();
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.next_char(); // consume '.'
            self.consume_digits();
            if !self.peek().is_some_and(is_word_char) {
                return Token::NumericLiteral(self.input[start..self.position].to_string());
            }
        }
        self.position = start;
        self.read_word(start)
    }

    /// Reads a run of word characters joined by single dots.
    fn read_word(&mut self, start: usize) -> Token {
        self.consume_word();
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_word_char) {
            self.next_char(); // consume '.'
            self.consume_word();
        }
        Token::Identifier(self.input[start..self.position].to_string())
    }

    /// Returns the next token with its position, or None if at end of input.
    pub fn next_token(&mut self) -> Option<PositionedToken> {
        loop {
            self.skip_whitespace();

            let c = self.peek()?;
            let token_start = self.position;

            let token = match c {
                '(' => {
                    self.next_char();
                    Token::Open
                }
                ')' => {
                    self.next_char();
                    Token::Close
                }
                '[' => {
                    self.next_char();
                    Token::OpenBracket
                }
                ']' => {
                    self.next_char();
                    Token::CloseBracket
                }
                '"' => match self.read_quoted() {
                    Some(text) => Token::QuotedLiteral(text),
                    None => {
                        self.skip_noise(c, token_start);
                        continue;
                    }
                },
                _ if c.is_ascii_digit() => self.read_number_or_word(token_start),
                _ if is_word_char(c) => self.read_word(token_start),
                _ => {
                    self.skip_noise(c, token_start);
                    continue;
                }
            };

            return Some(PositionedToken {
                token,
                position: token_start,
            });
        }
    }

    /// Skips a character that cannot start a token.
    fn skip_noise(&mut self, c: char, position: usize) {
        trace!(character = %c, position, "skipping unrecognized character");
        self.next_char();
    }

    /// Collects all tokens into a vector (without positions).
    #[cfg(test)]
    pub fn tokenize(self) -> Vec<Token> {
        self.map(|pt| pt.token).collect()
    }
}

impl Iterator for Lexer<'_> {
    type Item = PositionedToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Letters, digits and underscore.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
