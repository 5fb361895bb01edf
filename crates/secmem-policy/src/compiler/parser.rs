// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Recursive-descent parser for policy expressions.
//!
//! ```text
//! expr   := concat ('|' expr)?
//! concat := rep ('.' concat)?
//! rep    := atom ('*' | '?')?
//! atom   := symbol | '(' expr ')'
//! symbol := [A-Za-z0-9]
//! ```
//!
//! The `.` operator never appears in source text; [`tokenize`] inserts it
//! between adjacent operands.

use crate::error::PolicyError;

const CONCAT: u8 = b'.';

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Ast {
    Symbol(u8),
    Star(Box<Ast>),
    Optional(Box<Ast>),
    Alternation(Box<Ast>, Box<Ast>),
    Concatenation(Box<Ast>, Box<Ast>),
}

#[derive(Debug, Clone, Copy)]
struct Token {
    byte: u8,
    /// Offset in the source expression. Inserted `.` markers carry the
    /// offset of the token that follows them.
    position: usize,
}

fn ends_operand(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b')' | b'*' | b'?')
}

fn continues_operand(byte: u8) -> bool {
    !matches!(byte, b')' | b'|' | b'*' | b'?')
}

fn tokenize(source: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(source.len() * 2);

    for (position, &byte) in source.iter().enumerate() {
        tokens.push(Token { byte, position });

        if let Some(&next) = source.get(position + 1) {
            if ends_operand(byte) && continues_operand(next) {
                tokens.push(Token {
                    byte: CONCAT,
                    position: position + 1,
                });
            }
        }
    }

    tokens
}

struct Parser {
    tokens: Vec<Token>,
    next: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.next).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        match self.peek() {
            Some(token) if token.byte == byte => {
                self.next += 1;
                true
            }
            _ => false,
        }
    }

    fn unexpected(&self, expected: &'static str) -> PolicyError {
        match self.peek() {
            Some(token) => PolicyError::UnexpectedByte {
                found: char::from(token.byte),
                position: token.position,
                expected,
            },
            None => PolicyError::UnexpectedEnd { expected },
        }
    }

    fn expr(&mut self) -> Result<Ast, PolicyError> {
        let left = self.concat()?;

        if self.eat(b'|') {
            let right = self.expr()?;
            return Ok(Ast::Alternation(Box::new(left), Box::new(right)));
        }

        Ok(left)
    }

    fn concat(&mut self) -> Result<Ast, PolicyError> {
        let left = self.rep()?;

        if self.eat(CONCAT) {
            let right = self.concat()?;
            return Ok(Ast::Concatenation(Box::new(left), Box::new(right)));
        }

        Ok(left)
    }

    fn rep(&mut self) -> Result<Ast, PolicyError> {
        let atom = self.atom()?;

        if self.eat(b'*') {
            Ok(Ast::Star(Box::new(atom)))
        } else if self.eat(b'?') {
            Ok(Ast::Optional(Box::new(atom)))
        } else {
            Ok(atom)
        }
    }

    fn atom(&mut self) -> Result<Ast, PolicyError> {
        if self.eat(b'(') {
            let inner = self.expr()?;
            if !self.eat(b')') {
                return Err(self.unexpected("')'"));
            }
            return Ok(inner);
        }

        self.symbol()
    }

    fn symbol(&mut self) -> Result<Ast, PolicyError> {
        match self.peek() {
            Some(token) if token.byte.is_ascii_alphanumeric() => {
                self.next += 1;
                Ok(Ast::Symbol(token.byte))
            }
            _ => Err(self.unexpected("alphanumeric symbol or '('")),
        }
    }
}

/// Parses `source` into an abstract syntax tree.
///
/// The whole input must be consumed; a partial parse is an error.
pub(crate) fn parse(source: &[u8]) -> Result<Ast, PolicyError> {
    if source.is_empty() {
        return Err(PolicyError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(source),
        next: 0,
    };

    let ast = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(PolicyError::TrailingInput {
            position: token.position,
        });
    }

    Ok(ast)
}
