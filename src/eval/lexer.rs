//! Lexer for restricted integer expressions
//!
//! Produces a flat [`Token`] stream for the evaluator's parser. Only integer
//! literals, identifiers (optionally with an element suffix such as `arr[i]`),
//! `+ - * /`, the six comparison operators and parentheses are recognized;
//! every other character is rejected.

use super::EvalError;
use crate::program::CompareOp;
use std::fmt;

/// Tokens of the expression grammar.
///
/// Every variant carries the 1-based column where it starts so errors can
/// point into the original expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    IntLiteral(i64, usize),
    Ident(String, usize),

    Plus(usize),  // +
    Minus(usize), // -
    Star(usize),  // *
    Slash(usize), // /

    Compare(CompareOp, usize),

    LParen(usize), // (
    RParen(usize), // )

    Eof(usize),
}

impl Token {
    pub fn column(&self) -> usize {
        match self {
            Token::IntLiteral(_, col)
            | Token::Ident(_, col)
            | Token::Plus(col)
            | Token::Minus(col)
            | Token::Star(col)
            | Token::Slash(col)
            | Token::Compare(_, col)
            | Token::LParen(col)
            | Token::RParen(col)
            | Token::Eof(col) => *col,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntLiteral(n, _) => write!(f, "integer {}", n),
            Token::Ident(name, _) => write!(f, "identifier '{}'", name),
            Token::Plus(_) => write!(f, "'+'"),
            Token::Minus(_) => write!(f, "'-'"),
            Token::Star(_) => write!(f, "'*'"),
            Token::Slash(_) => write!(f, "'/'"),
            Token::Compare(op, _) => write!(f, "'{}'", op),
            Token::LParen(_) => write!(f, "'('"),
            Token::RParen(_) => write!(f, "')'"),
            Token::Eof(_) => write!(f, "end of expression"),
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::Eof(self.column()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        let col = self.column();
        let ch = self.advance().ok_or(EvalError::UnexpectedEnd)?;

        match ch {
            '0'..='9' => self.number_literal(ch, col),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier(ch, col),

            '+' => Ok(Token::Plus(col)),
            '-' => Ok(Token::Minus(col)),
            '*' => Ok(Token::Star(col)),
            '/' => Ok(Token::Slash(col)),
            '(' => Ok(Token::LParen(col)),
            ')' => Ok(Token::RParen(col)),

            '<' | '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    let op = if ch == '<' { CompareOp::Le } else { CompareOp::Ge };
                    Ok(Token::Compare(op, col))
                } else {
                    let op = if ch == '<' { CompareOp::Lt } else { CompareOp::Gt };
                    Ok(Token::Compare(op, col))
                }
            }
            // A lone '=' or '!' is assignment/negation, neither of which is an expression here
            '=' | '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    let op = if ch == '=' { CompareOp::Eq } else { CompareOp::Ne };
                    Ok(Token::Compare(op, col))
                } else {
                    Err(EvalError::UnexpectedChar { ch, column: col })
                }
            }

            _ => Err(EvalError::UnexpectedChar { ch, column: col }),
        }
    }

    fn number_literal(&mut self, first: char, col: usize) -> Result<Token, EvalError> {
        let mut literal = String::from(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                literal.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // `12abc` is not a number followed by an identifier
        if let Some(ch) = self.peek() {
            if ch.is_ascii_alphabetic() || ch == '_' {
                return Err(EvalError::UnexpectedChar {
                    ch,
                    column: self.column(),
                });
            }
        }

        literal
            .parse::<i64>()
            .map(|n| Token::IntLiteral(n, col))
            .map_err(|_| EvalError::Overflow {
                operation: format!("literal {}", literal),
            })
    }

    fn identifier(&mut self, first: char, col: usize) -> Result<Token, EvalError> {
        let mut name = String::from(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Element references like `arr[i]` are a single name
        if self.peek() == Some('[') {
            let bracket_col = self.column();
            self.advance();
            let mut index = String::new();
            loop {
                match self.advance() {
                    Some(']') => break,
                    Some(ch) if ch.is_ascii_alphanumeric() || ch == '_' => index.push(ch),
                    Some(' ') => {}
                    Some(ch) => {
                        return Err(EvalError::UnexpectedChar {
                            ch,
                            column: self.column() - 1,
                        })
                    }
                    None => return Err(EvalError::UnexpectedEnd),
                }
            }
            if index.is_empty() {
                return Err(EvalError::UnexpectedChar {
                    ch: ']',
                    column: bracket_col + 1,
                });
            }
            name.push('[');
            name.push_str(&index);
            name.push(']');
        }

        Ok(Token::Ident(name, col))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn column(&self) -> usize {
        self.position + 1
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }
}
