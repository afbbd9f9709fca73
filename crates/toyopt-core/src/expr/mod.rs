//! Integer arithmetic expressions
//!
//! The toy language's right-hand sides and index expressions are small
//! integer expressions over literals, variables, `+ - * /` and parentheses.
//! This module tokenizes and parses them into an [`Expr`] tree so that
//! substitution works on whole identifiers and evaluation follows the usual
//! precedence rules.

mod eval;
mod lexer;
mod parser;

pub use eval::evaluate;
pub use lexer::{is_ident_continue, is_ident_start, scan_identifiers, tokenize, Token};
pub use parser::parse;

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    #[error("integer literal out of range: {0}")]
    IntegerOverflow(String),

    #[error("unexpected token {0:?}")]
    UnexpectedToken(Token),

    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }

    /// Integer semantics of the toy runtime: checked 64-bit arithmetic,
    /// division truncating toward zero, division by zero has no value.
    pub fn apply(self, left: i64, right: i64) -> Option<i64> {
        match self {
            BinaryOp::Add => left.checked_add(right),
            BinaryOp::Subtract => left.checked_sub(right),
            BinaryOp::Multiply => left.checked_mul(right),
            BinaryOp::Divide => left.checked_div(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i64),
    Variable(String),
    Negate(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Variables referenced by the expression, first occurrence order,
    /// without duplicates.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables<'a>(&'a self, vars: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                if !vars.contains(&name.as_str()) {
                    vars.push(name);
                }
            }
            Expr::Negate(operand) => operand.collect_variables(vars),
            Expr::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
        }
    }

    /// True when the expression performs at least one operation, i.e. it is
    /// more than a bare literal or a bare variable.
    pub fn is_compound(&self) -> bool {
        matches!(self, Expr::Negate(_) | Expr::Binary(..))
    }

    /// Replace every variable for which `lookup` yields an expression. The
    /// replacement is spliced in as a subtree, so `x * 2` with `x -> 1 + 2`
    /// means `(1 + 2) * 2`. Replacements are not themselves re-substituted.
    pub fn substitute<F>(&self, lookup: &F) -> Expr
    where
        F: Fn(&str) -> Option<Expr>,
    {
        match self {
            Expr::Number(n) => Expr::Number(*n),
            Expr::Variable(name) => lookup(name).unwrap_or_else(|| Expr::Variable(name.clone())),
            Expr::Negate(operand) => Expr::Negate(Box::new(operand.substitute(lookup))),
            Expr::Binary(op, left, right) => Expr::Binary(
                *op,
                Box::new(left.substitute(lookup)),
                Box::new(right.substitute(lookup)),
            ),
        }
    }

    /// Evaluate a closed expression. Any remaining variable, overflow or
    /// division by zero yields `None`.
    pub fn eval(&self) -> Option<i64> {
        match self {
            Expr::Number(n) => Some(*n),
            Expr::Variable(_) => None,
            Expr::Negate(operand) => operand.eval()?.checked_neg(),
            Expr::Binary(op, left, right) => op.apply(left.eval()?, right.eval()?),
        }
    }

    fn fmt_with_precedence(&self, f: &mut fmt::Formatter<'_>, parent: u8, right_side: bool) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Negate(operand) => {
                write!(f, "-")?;
                operand.fmt_with_precedence(f, 3, false)
            }
            Expr::Binary(op, left, right) => {
                let prec = op.precedence();
                // `a - (b - c)` keeps its parentheses, `(a - b) - c` does not
                let parens = prec < parent || (right_side && prec == parent);
                if parens {
                    write!(f, "(")?;
                }
                left.fmt_with_precedence(f, prec, false)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_with_precedence(f, prec, true)?;
                if parens {
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_with_precedence(f, 0, false)
    }
}
