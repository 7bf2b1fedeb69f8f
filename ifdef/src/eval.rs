// Copyright (c) 2026 Hemi Labs, Inc.
//
// This file is part of the ifdef-tools project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Substitution and three-valued partial evaluation.
//!
//! `substitute` pins a macro name to one of the two sentinels, and `fold`
//! then reduces the expression as far as the sentinels allow. Anything
//! the sentinels do not decide stays symbolic; in particular a bare
//! identifier under `defined` is never guessed, and the arithmetic and
//! comparison operators are never reduced to a constant even when both
//! operands are literals.

use std::collections::BTreeSet;

use crate::expr::Expr;

/// Replaces every identifier leaf named `name` (including occurrences
/// inside `defined(...)`) with `replacement`, rebuilding the tree.
/// Callers pass `Expr::True` or `Expr::Undefined`.
pub fn substitute(expr: &Expr, name: &str, replacement: &Expr) -> Expr {
    match expr {
        Expr::Ident(text) if text == name => replacement.clone(),
        Expr::Ident(_) | Expr::Number(_) | Expr::StrLit(_) | Expr::True | Expr::Undefined => {
            expr.clone()
        }
        Expr::Defined(operand) => {
            Expr::Defined(Box::new(substitute(operand, name, replacement)))
        }
        Expr::Not(operand) => Expr::Not(Box::new(substitute(operand, name, replacement))),
        Expr::And(lhs, rhs) => Expr::And(
            Box::new(substitute(lhs, name, replacement)),
            Box::new(substitute(rhs, name, replacement)),
        ),
        Expr::Or(lhs, rhs) => Expr::Or(
            Box::new(substitute(lhs, name, replacement)),
            Box::new(substitute(rhs, name, replacement)),
        ),
        Expr::Binary(op, lhs, rhs) => Expr::Binary(
            *op,
            Box::new(substitute(lhs, name, replacement)),
            Box::new(substitute(rhs, name, replacement)),
        ),
    }
}

/// Outcome of partial evaluation: a decided boolean, or the minimal
/// residual expression. "Known undefined" collapses into `Bool(false)`;
/// every consumer treats the two identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Folded {
    Bool(bool),
    Residual(Expr),
}

pub fn fold(expr: &Expr) -> Folded {
    match expr {
        Expr::True => Folded::Bool(true),
        Expr::Undefined => Folded::Bool(false),
        Expr::Or(lhs, rhs) => match (fold(lhs), fold(rhs)) {
            (Folded::Bool(true), _) | (_, Folded::Bool(true)) => Folded::Bool(true),
            (Folded::Bool(false), other) | (other, Folded::Bool(false)) => other,
            (Folded::Residual(l), Folded::Residual(r)) => {
                Folded::Residual(Expr::Or(Box::new(l), Box::new(r)))
            }
        },
        Expr::And(lhs, rhs) => match (fold(lhs), fold(rhs)) {
            (Folded::Bool(false), _) | (_, Folded::Bool(false)) => Folded::Bool(false),
            (Folded::Bool(true), other) | (other, Folded::Bool(true)) => other,
            (Folded::Residual(l), Folded::Residual(r)) => {
                Folded::Residual(Expr::And(Box::new(l), Box::new(r)))
            }
        },
        Expr::Not(operand) => match fold(operand) {
            Folded::Bool(value) => Folded::Bool(!value),
            Folded::Residual(inner) => Folded::Residual(Expr::Not(Box::new(inner))),
        },
        // `defined` resolves only against a sentinel operand; an
        // unresolved identifier stays symbolic.
        Expr::Defined(operand) => match operand.as_ref() {
            Expr::True => Folded::Bool(true),
            Expr::Undefined => Folded::Bool(false),
            _ => Folded::Residual(expr.clone()),
        },
        // Numeric values are never tracked, so comparisons and `+` keep
        // their node even with two literal operands.
        Expr::Binary(op, lhs, rhs) => Folded::Residual(Expr::Binary(
            *op,
            Box::new(fold_operand(lhs)),
            Box::new(fold_operand(rhs)),
        )),
        Expr::Ident(_) | Expr::Number(_) | Expr::StrLit(_) => Folded::Residual(expr.clone()),
    }
}

fn fold_operand(expr: &Expr) -> Expr {
    match fold(expr) {
        Folded::Bool(true) => Expr::True,
        Folded::Bool(false) => Expr::Undefined,
        Folded::Residual(inner) => inner,
    }
}

/// Collects the distinct identifier leaves of an expression, both bare
/// and inside `defined(...)`.
pub fn leaf_idents(expr: &Expr, out: &mut BTreeSet<String>) {
    match expr {
        Expr::Ident(name) => {
            out.insert(name.clone());
        }
        Expr::Number(_) | Expr::StrLit(_) | Expr::True | Expr::Undefined => {}
        Expr::Defined(operand) | Expr::Not(operand) => leaf_idents(operand, out),
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) | Expr::Binary(_, lhs, rhs) => {
            leaf_idents(lhs, out);
            leaf_idents(rhs, out);
        }
    }
}
