// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Directive and expression printing.
//!
//! A `defined(X)` condition under an opening keyword prints back as
//! `#ifdef X` (and `!defined(X)` as `#ifndef X`); everything else prints
//! as infix text. Parentheses appear only where an `&&` subtree sits
//! under `||` or vice versa, and around non-atomic `!` operands.

use crate::expr::{self, Expr};
use crate::lexer::{Cond, Directive, Keyword};

pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Number(text) => text.clone(),
        Expr::StrLit(text) => format!("'{text}'"),
        Expr::True => "1".to_string(),
        Expr::Undefined => "0".to_string(),
        Expr::Defined(operand) => match operand.as_ref() {
            Expr::Ident(name) => format!("defined({name})"),
            other => format!("defined({})", render_expr(other)),
        },
        Expr::Not(operand) => {
            if is_atom(operand) {
                format!("!{}", render_expr(operand))
            } else {
                format!("!({})", render_expr(operand))
            }
        }
        Expr::And(lhs, rhs) => format!("{} && {}", and_side(lhs), and_side(rhs)),
        Expr::Or(lhs, rhs) => format!("{} || {}", or_side(lhs), or_side(rhs)),
        Expr::Binary(op, lhs, rhs) => {
            format!("{} {} {}", render_expr(lhs), op.as_str(), render_expr(rhs))
        }
    }
}

fn is_atom(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_)
            | Expr::Number(_)
            | Expr::StrLit(_)
            | Expr::Defined(_)
            | Expr::True
            | Expr::Undefined
    )
}

fn and_side(expr: &Expr) -> String {
    let text = render_expr(expr);
    if matches!(expr, Expr::Or(..)) {
        format!("({text})")
    } else {
        text
    }
}

fn or_side(expr: &Expr) -> String {
    let text = render_expr(expr);
    if matches!(expr, Expr::And(..)) {
        format!("({text})")
    } else {
        text
    }
}

/// `defined(X)` / `!defined(X)` with an identifier operand, the two
/// shapes that print as `ifdef` / `ifndef`.
fn defined_shape(expr: &Expr) -> Option<(bool, String)> {
    match expr {
        Expr::Defined(operand) => match operand.as_ref() {
            Expr::Ident(name) => Some((false, name.clone())),
            _ => None,
        },
        Expr::Not(inner) => match defined_shape(inner) {
            Some((false, name)) => Some((true, name)),
            _ => None,
        },
        _ => None,
    }
}

fn strip_defined(text: &str) -> Option<&str> {
    text.strip_prefix("defined(")?.strip_suffix(')')
}

fn strip_not_defined(text: &str) -> Option<&str> {
    text.strip_prefix("!defined(")?.strip_suffix(')')
}

/// Regenerates a directive line, without its terminator.
pub fn render_directive(d: &Directive) -> String {
    let mut keyword = d.keyword;
    let body = match &d.cond {
        Cond::Text(text) => match keyword {
            Keyword::Ifdef => strip_defined(text).unwrap_or(text).to_string(),
            Keyword::Ifndef => strip_not_defined(text).unwrap_or(text).to_string(),
            _ => text.clone(),
        },
        Cond::Ast(expr) => {
            if matches!(keyword, Keyword::If | Keyword::Ifdef | Keyword::Ifndef) {
                match defined_shape(expr) {
                    Some((false, name)) => {
                        keyword = Keyword::Ifdef;
                        name
                    }
                    Some((true, name)) => {
                        keyword = Keyword::Ifndef;
                        name
                    }
                    None => {
                        keyword = Keyword::If;
                        render_expr(expr)
                    }
                }
            } else {
                render_expr(expr)
            }
        }
    };

    let mut tail = format!("{body}{}", d.comment);
    if !tail.is_empty() && !tail.starts_with(' ') {
        tail.insert(0, ' ');
    }
    format!("{}{}{}", d.hash, keyword.as_str(), tail)
}

/// The condition of `d` as display text: the bare macro name for
/// `ifdef`/`ifndef`-shaped conditions, infix text otherwise.
fn pretty_condition(d: &Directive) -> String {
    match &d.cond {
        Cond::Ast(expr) => match defined_shape(expr) {
            Some((_, name)) => name,
            None => render_expr(expr),
        },
        Cond::Text(text) => match d.keyword {
            Keyword::Ifdef => strip_defined(text).unwrap_or(text).to_string(),
            Keyword::Ifndef => strip_not_defined(text).unwrap_or(text).to_string(),
            _ => match expr::parse(text) {
                Ok(expr) => match defined_shape(&expr) {
                    Some((_, name)) => name,
                    None => render_expr(&expr),
                },
                Err(_) => text.clone(),
            },
        },
    }
}

/// Generated trailing comment restating the condition that governs a
/// distant `else` or `endif` line; `ifndef` conditions are restated
/// negated.
pub fn condition_comment(d: &Directive) -> String {
    let text = pretty_condition(d);
    if d.keyword == Keyword::Ifndef {
        format!("// !({text})")
    } else {
        format!("// {text}")
    }
}
