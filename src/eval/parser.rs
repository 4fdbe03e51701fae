//! Expression parsing
//!
//! Recursive descent with one function per precedence level:
//!
//! ```text
//! comparison     := additive (CMP additive)?
//! additive       := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/') unary)*
//! unary          := '-' unary | primary
//! primary        := INT | IDENT | '(' comparison ')'
//! ```
//!
//! Comparisons do not chain; `1 < 2 < 3` is rejected.

use super::lexer::{Lexer, Token};
use super::EvalError;
use crate::program::CompareOp;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Var(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, EvalError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Parser {
            tokens,
            position: 0,
        })
    }

    /// Parse the whole input as one expression
    pub fn parse(mut self) -> Result<Expr, EvalError> {
        if matches!(self.peek(), Token::Eof(_)) {
            return Err(EvalError::UnexpectedEnd);
        }
        let expr = self.parse_comparison()?;
        match self.peek() {
            Token::Eof(_) => Ok(expr),
            token => Err(unexpected(token)),
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvalError> {
        let left = self.parse_additive()?;

        if let Token::Compare(op, _) = self.peek().clone() {
            self.advance();
            let right = self.parse_additive()?;
            if let Token::Compare(..) = self.peek() {
                return Err(unexpected(self.peek()));
            }
            return Ok(Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Token::Plus(_) => BinOp::Add,
                Token::Minus(_) => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Token::Star(_) => BinOp::Mul,
                Token::Slash(_) => BinOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        if let Token::Minus(_) = self.peek() {
            self.advance();
            let operand = self.parse_unary()?;
            // Fold negative literals into a single value
            if let Expr::Int(n) = operand {
                return n.checked_neg().map(Expr::Int).ok_or(EvalError::Overflow {
                    operation: format!("-{}", n),
                });
            }
            return Ok(Expr::Neg(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.advance() {
            Token::IntLiteral(n, _) => Ok(Expr::Int(n)),
            Token::Ident(name, _) => Ok(Expr::Var(name)),
            Token::LParen(_) => {
                let inner = self.parse_comparison()?;
                match self.advance() {
                    Token::RParen(_) => Ok(inner),
                    token => Err(unexpected(&token)),
                }
            }
            token => Err(unexpected(&token)),
        }
    }

    fn peek(&self) -> &Token {
        // tokenize() always ends with Eof, and advance() never moves past it
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token, Token::Eof(_)) {
            self.position += 1;
        }
        token
    }
}

fn unexpected(token: &Token) -> EvalError {
    match token {
        Token::Eof(_) => EvalError::UnexpectedEnd,
        other => EvalError::UnexpectedToken {
            found: other.to_string(),
            column: other.column(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Expr, EvalError> {
        Parser::new(src)?.parse()
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::Int(1)),
                right: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    left: Box::new(Expr::Int(2)),
                    right: Box::new(Expr::Int(3)),
                }),
            }
        );
    }

    #[test]
    fn test_negative_literal_folds() {
        assert_eq!(parse("-5").unwrap(), Expr::Int(-5));
        assert_eq!(
            parse("-n").unwrap(),
            Expr::Neg(Box::new(Expr::Var("n".to_string())))
        );
    }

    #[test]
    fn test_rejects_chained_comparison() {
        assert!(matches!(
            parse("1 < 2 < 3"),
            Err(EvalError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_rejects_call_syntax() {
        assert!(matches!(
            parse("f(3)"),
            Err(EvalError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_unbalanced_parens() {
        assert!(matches!(parse("(1 + 2"), Err(EvalError::UnexpectedEnd)));
        assert!(matches!(
            parse("1 + 2)"),
            Err(EvalError::UnexpectedToken { .. })
        ));
        assert!(matches!(parse(""), Err(EvalError::UnexpectedEnd)));
    }
}
