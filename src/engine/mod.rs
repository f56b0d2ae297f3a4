//! Algebra engine adapter
//!
//! `SymbolicEngine` implements the `AlgebraEngine` contract on top of the
//! `symb_anafis` computer algebra library. Parsing, simplification,
//! differentiation, evaluation and printing are the library's; this module
//! adds input limits, root finding and an antiderivative table on top of
//! the library's expression type.

pub mod error;
pub mod input;
pub mod integrate;
pub mod numeric;
pub mod solver;

pub use error::{EngineError, EngineResult};

use symb_anafis::{Diff, Expr, Simplify, symb};

use crate::core::traits::AlgebraEngine;
use input::{MAX_DEPTH, MAX_NODES, parse_expr};

pub const DEFAULT_PRECISION: usize = 15;

/// Largest precision an `f64` can carry
pub const MAX_PRECISION: usize = 17;

#[derive(Debug, Clone)]
pub struct SymbolicEngine {
    precision: usize,
}

impl SymbolicEngine {
    pub fn new() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }

    /// Significant digits printed by `evaluate` and numeric roots.
    pub fn with_precision(precision: usize) -> Self {
        Self {
            precision: precision.clamp(1, MAX_PRECISION),
        }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }
}

impl Default for SymbolicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgebraEngine for SymbolicEngine {
    fn solve(&self, lhs: &str, rhs: &str, variable: &str) -> EngineResult<String> {
        let lhs = parse_expr(lhs, variable)?;
        let rhs = parse_expr(rhs, variable)?;
        solver::solve(&lhs, &rhs, variable, self.precision)
    }

    fn simplify(&self, expr: &str) -> EngineResult<String> {
        let parsed = parse_expr(expr, "")?;
        Ok(simplified(&parsed)?.to_string())
    }

    fn differentiate(&self, expr: &str, variable: &str) -> EngineResult<String> {
        let parsed = parse_expr(expr, variable)?;
        Ok(derivative(&parsed, variable)?.to_string())
    }

    fn integrate(&self, expr: &str, variable: &str) -> EngineResult<String> {
        let parsed = parse_expr(expr, variable)?;
        Ok(integrate::integrate(&parsed, variable)?.to_string())
    }

    fn evaluate(&self, expr: &str) -> EngineResult<String> {
        let parsed = parse_expr(expr, "")?;
        numeric::evaluate(&parsed, self.precision)
    }
}

/// Library simplification under the engine's size limits
pub fn simplified(expr: &Expr) -> EngineResult<Expr> {
    Ok(Simplify::new()
        .max_depth(MAX_DEPTH)
        .max_nodes(MAX_NODES)
        .simplify(expr)?)
}

/// Library derivative, simplified, under the engine's size limits
pub fn derivative(expr: &Expr, var: &str) -> EngineResult<Expr> {
    Ok(Diff::new()
        .max_depth(MAX_DEPTH)
        .max_nodes(MAX_NODES)
        .differentiate(expr, &symb(var))?)
}
