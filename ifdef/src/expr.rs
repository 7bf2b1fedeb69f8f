// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Conditional-expression AST and parser.
//!
//! The grammar is the fixed four-tier subset of the C preprocessor's
//! conditional language, tightest binding first:
//!
//! 1. atom: identifier, number, single-quoted string, `defined` atom,
//!    `defined ( expr )`, `!` atom, `( expr )`
//! 2. arithmetic/comparison: `+ == != >= <= > <`, left-associative
//! 3. `&&`, left-associative
//! 4. `||`, left-associative
//!
//! Macro values are never tracked, so numbers keep their original
//! spelling and arithmetic is never evaluated.

use std::iter::Peekable;
use std::str::CharIndices;

/// Binary operators of the arithmetic/comparison tier. They share one
/// precedence level and are never constant-folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Eq,
    NotEq,
    GtEq,
    LtEq,
    Gt,
    Lt,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::GtEq => ">=",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::Lt => "<",
        }
    }
}

/// Expression AST. `True` and `Undefined` are evaluation sentinels: they
/// never come out of the parser, only out of substitution, and stand for
/// a macro forced to be defined or forced to be undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    Number(String),
    StrLit(String),
    Defined(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    True,
    Undefined,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("{message} (column {pos})")]
pub struct ExprError {
    pub pos: usize,
    pub message: String,
}

impl ExprError {
    fn new(pos: usize, message: impl Into<String>) -> Self {
        ExprError {
            pos,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(String),
    Str(String),
    Defined,
    Not,
    LParen,
    RParen,
    AndAnd,
    OrOr,
    Bin(BinOp),
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn scan_ident(chars: &mut Peekable<CharIndices>, first: char) -> String {
    let mut ident = String::new();
    ident.push(first);
    while let Some((_, c)) = chars.peek() {
        if !is_ident_char(*c) {
            break;
        }
        ident.push(*c);
        chars.next();
    }
    ident
}

fn scan_number(chars: &mut Peekable<CharIndices>, first: char) -> String {
    let mut number = String::new();
    number.push(first);
    if first == '0' && matches!(chars.peek(), Some((_, 'x' | 'X'))) {
        number.push(chars.next().unwrap().1);
        while let Some((_, c)) = chars.peek() {
            if !c.is_ascii_hexdigit() {
                break;
            }
            number.push(*c);
            chars.next();
        }
    } else {
        while let Some((_, c)) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            number.push(*c);
            chars.next();
        }
    }
    number
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let token = match c {
            _ if c.is_whitespace() => continue,
            _ if is_ident_start(c) => {
                let ident = scan_ident(&mut chars, c);
                if ident == "defined" {
                    Token::Defined
                } else {
                    Token::Ident(ident)
                }
            }
            _ if c.is_ascii_digit() => Token::Number(scan_number(&mut chars, c)),
            '\'' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => text.push(c),
                        None => {
                            return Err(ExprError::new(pos, "unterminated string literal"));
                        }
                    }
                }
                Token::Str(text)
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '+' => Token::Bin(BinOp::Add),
            '!' => match chars.peek() {
                Some((_, '=')) => {
                    chars.next();
                    Token::Bin(BinOp::NotEq)
                }
                _ => Token::Not,
            },
            '=' => match chars.next() {
                Some((_, '=')) => Token::Bin(BinOp::Eq),
                _ => return Err(ExprError::new(pos, "expected `==`")),
            },
            '>' => match chars.peek() {
                Some((_, '=')) => {
                    chars.next();
                    Token::Bin(BinOp::GtEq)
                }
                _ => Token::Bin(BinOp::Gt),
            },
            '<' => match chars.peek() {
                Some((_, '=')) => {
                    chars.next();
                    Token::Bin(BinOp::LtEq)
                }
                _ => Token::Bin(BinOp::Lt),
            },
            '&' => match chars.next() {
                Some((_, '&')) => Token::AndAnd,
                _ => return Err(ExprError::new(pos, "expected `&&`")),
            },
            '|' => match chars.next() {
                Some((_, '|')) => Token::OrOr,
                _ => return Err(ExprError::new(pos, "expected `||`")),
            },
            _ => {
                return Err(ExprError::new(pos, format!("unexpected character `{c}`")));
            }
        };
        tokens.push((pos, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(p, _)| *p)
            .unwrap_or(self.end)
    }

    fn expect_rparen(&mut self) -> Result<(), ExprError> {
        match self.next() {
            Some((_, Token::RParen)) => Ok(()),
            Some((pos, _)) => Err(ExprError::new(pos, "expected `)`")),
            None => Err(ExprError::new(self.end, "expected `)`")),
        }
    }

    fn atom(&mut self) -> Result<Expr, ExprError> {
        match self.next() {
            Some((_, Token::Ident(name))) => Ok(Expr::Ident(name)),
            Some((_, Token::Number(text))) => Ok(Expr::Number(text)),
            Some((_, Token::Str(text))) => Ok(Expr::StrLit(text)),
            Some((_, Token::Defined)) => {
                let operand = if matches!(self.peek(), Some(Token::LParen)) {
                    self.next();
                    let operand = self.disjunction()?;
                    self.expect_rparen()?;
                    operand
                } else {
                    self.atom()?
                };
                Ok(Expr::Defined(Box::new(operand)))
            }
            Some((_, Token::Not)) => Ok(Expr::Not(Box::new(self.atom()?))),
            Some((_, Token::LParen)) => {
                let inner = self.disjunction()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            Some((pos, _)) => Err(ExprError::new(pos, "expected an operand")),
            None => Err(ExprError::new(self.end, "expected an operand")),
        }
    }

    fn comparison(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.atom()?;
        while let Some(Token::Bin(op)) = self.peek() {
            let op = *op;
            self.next();
            let rhs = self.atom()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn conjunction(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.comparison()?;
        while matches!(self.peek(), Some(Token::AndAnd)) {
            self.next();
            let rhs = self.comparison()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn disjunction(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.conjunction()?;
        while matches!(self.peek(), Some(Token::OrOr)) {
            self.next();
            let rhs = self.conjunction()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }
}

/// Parses a complete condition. Trailing input past a well-formed
/// expression is an error, not silently ignored.
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::new(0, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
    };
    let expr = parser.disjunction()?;
    match parser.next() {
        None => Ok(expr),
        Some((pos, _)) => Err(ExprError::new(pos, "unexpected trailing input")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn single_identifier() {
        assert_eq!(parse("FOO").unwrap(), ident("FOO"));
    }

    #[test]
    fn defined_with_and_without_parens() {
        let expected = Expr::Defined(Box::new(ident("FOO")));
        assert_eq!(parse("defined(FOO)").unwrap(), expected);
        assert_eq!(parse("defined FOO").unwrap(), expected);
        assert_eq!(parse("defined ( FOO )").unwrap(), expected);
    }

    #[test]
    fn not_defined() {
        assert_eq!(
            parse("!defined(FOO)").unwrap(),
            Expr::Not(Box::new(Expr::Defined(Box::new(ident("FOO")))))
        );
    }

    #[test]
    fn or_binds_looser_than_and() {
        assert_eq!(
            parse("A || B && C").unwrap(),
            Expr::Or(
                Box::new(ident("A")),
                Box::new(Expr::And(Box::new(ident("B")), Box::new(ident("C")))),
            )
        );
    }

    #[test]
    fn and_chain_is_left_associative() {
        assert_eq!(
            parse("A && B && C").unwrap(),
            Expr::And(
                Box::new(Expr::And(Box::new(ident("A")), Box::new(ident("B")))),
                Box::new(ident("C")),
            )
        );
    }

    #[test]
    fn comparison_binds_tighter_than_and() {
        assert_eq!(
            parse("A == 1 && B").unwrap(),
            Expr::And(
                Box::new(Expr::Binary(
                    BinOp::Eq,
                    Box::new(ident("A")),
                    Box::new(Expr::Number("1".to_string())),
                )),
                Box::new(ident("B")),
            )
        );
    }

    #[test]
    fn arithmetic_chain_is_left_associative() {
        assert_eq!(
            parse("A + B >= C").unwrap(),
            Expr::Binary(
                BinOp::GtEq,
                Box::new(Expr::Binary(
                    BinOp::Add,
                    Box::new(ident("A")),
                    Box::new(ident("B")),
                )),
                Box::new(ident("C")),
            )
        );
    }

    #[test]
    fn hex_number_keeps_spelling() {
        assert_eq!(
            parse("VERSION >= 0x10A").unwrap(),
            Expr::Binary(
                BinOp::GtEq,
                Box::new(ident("VERSION")),
                Box::new(Expr::Number("0x10A".to_string())),
            )
        );
    }

    #[test]
    fn string_literal() {
        assert_eq!(
            parse("OS == 'osx'").unwrap(),
            Expr::Binary(
                BinOp::Eq,
                Box::new(ident("OS")),
                Box::new(Expr::StrLit("osx".to_string())),
            )
        );
    }

    #[test]
    fn parenthesized_or_under_and() {
        assert_eq!(
            parse("(A || B) && C").unwrap(),
            Expr::And(
                Box::new(Expr::Or(Box::new(ident("A")), Box::new(ident("B")))),
                Box::new(ident("C")),
            )
        );
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert!(parse("A B").is_err());
        assert!(parse("A &&").is_err());
    }

    #[test]
    fn single_ampersand_is_an_error() {
        let err = parse("A & B").unwrap_err();
        assert_eq!(err.pos, 2);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(parse("'abc").is_err());
    }
}
