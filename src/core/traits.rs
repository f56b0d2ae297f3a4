//! Core trait definitions for the query dispatcher
//!
//! The dispatcher never touches expression trees itself. Everything it
//! needs from a computer algebra system goes through `AlgebraEngine`, so the
//! bundled engine can be swapped for another implementation (or a test
//! double) without changing the dispatch logic.

use crate::engine::EngineResult;

/// Symbolic math operations reachable from user queries
///
/// Every method takes expression text exactly as the user typed it and
/// returns the engine's textual rendering of the result. Failures carry a
/// human readable description that ends up in the failure line.
pub trait AlgebraEngine {
    /// Solve `lhs = rhs`, preferring `variable` as the unknown when present
    fn solve(&self, lhs: &str, rhs: &str, variable: &str) -> EngineResult<String>;

    /// Simplify an expression
    fn simplify(&self, expr: &str) -> EngineResult<String>;

    /// Differentiate with respect to `variable`
    fn differentiate(&self, expr: &str, variable: &str) -> EngineResult<String>;

    /// Antiderivative with respect to `variable`, without the constant of
    /// integration
    fn integrate(&self, expr: &str, variable: &str) -> EngineResult<String>;

    /// Force numeric evaluation
    fn evaluate(&self, expr: &str) -> EngineResult<String>;
}

impl<E: AlgebraEngine + ?Sized> AlgebraEngine for &E {
    fn solve(&self, lhs: &str, rhs: &str, variable: &str) -> EngineResult<String> {
        (**self).solve(lhs, rhs, variable)
    }

    fn simplify(&self, expr: &str) -> EngineResult<String> {
        (**self).simplify(expr)
    }

    fn differentiate(&self, expr: &str, variable: &str) -> EngineResult<String> {
        (**self).differentiate(expr, variable)
    }

    fn integrate(&self, expr: &str, variable: &str) -> EngineResult<String> {
        (**self).integrate(expr, variable)
    }

    fn evaluate(&self, expr: &str) -> EngineResult<String> {
        (**self).evaluate(expr)
    }
}
