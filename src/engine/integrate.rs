//! Antiderivatives built from library expressions.
//!
//! Linearity, the power rule, a table of functions of linear arguments and
//! integration by parts. Every rule produces library `Expr` values and the
//! final result goes through the library simplifier.

use symb_anafis::Expr;
use symb_anafis::visitor::ExprView;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::input::{short_display, value_at};
use crate::engine::{derivative, simplified};

/// Deepest chain of integration by parts
pub const MAX_PARTS_DEPTH: usize = 16;

/// Antiderivative of `expr` with respect to `var`, without a constant.
///
/// The expression is tried as typed first, then in the simplifier's form.
pub fn integrate(expr: &Expr, var: &str) -> EngineResult<Expr> {
    let result = match integrate_at(expr, var, 0) {
        Ok(result) => result,
        Err(err) => {
            let rewritten = simplified(expr)?;
            integrate_at(&rewritten, var, 0).map_err(|_| err)?
        }
    };
    simplified(&result)
}

fn integrate_at(expr: &Expr, var: &str, depth: usize) -> EngineResult<Expr> {
    let x = Expr::symbol(var);
    if !expr.contains_var(var) {
        return Ok(Expr::product(vec![expr.clone(), x]));
    }

    match expr.view() {
        ExprView::Symbol(_) => Ok(Expr::div_expr(
            Expr::pow_static(x, Expr::number(2.0)),
            Expr::number(2.0),
        )),
        ExprView::Sum(terms) => {
            let parts = terms
                .iter()
                .map(|term| integrate_at(term, var, depth))
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(Expr::sum(parts))
        }
        ExprView::Product(factors) => {
            let (constant, dependent): (Vec<Expr>, Vec<Expr>) = factors
                .iter()
                .map(|f| (**f).clone())
                .partition(|f| !f.contains_var(var));
            let integral = match dependent.as_slice() {
                [single] => integrate_at(single, var, depth)?,
                [first, second] => {
                    let (u, dv) =
                        parts_order(first, second, var).ok_or_else(|| cannot_integrate(expr))?;
                    by_parts(u, dv, var, depth)?
                }
                _ => return Err(cannot_integrate(expr)),
            };
            Ok(scaled(constant, integral))
        }
        ExprView::Div(num, den) if !den.contains_var(var) => Ok(Expr::div_expr(
            integrate_at(num, var, depth)?,
            den.clone(),
        )),
        ExprView::Div(num, den) if !num.contains_var(var) => match slope(den, var)? {
            Some(a) => Ok(Expr::div_expr(
                Expr::product(vec![num.clone(), Expr::func("ln", den.clone())]),
                a,
            )),
            None => Err(cannot_integrate(expr)),
        },
        ExprView::Pow(base, exp) if !exp.contains_var(var) => {
            let Some(a) = slope(base, var)? else {
                return Err(cannot_integrate(expr));
            };
            if value_at(exp, var, 0.0) == Some(-1.0) {
                return Ok(Expr::div_expr(Expr::func("ln", base.clone()), a));
            }
            let raised = Expr::sum(vec![exp.clone(), Expr::number(1.0)]);
            Ok(Expr::div_expr(
                Expr::pow_static(base.clone(), raised.clone()),
                Expr::product(vec![a, raised]),
            ))
        }
        ExprView::Pow(base, exp) if !base.contains_var(var) => {
            let Some(a) = slope(exp, var)? else {
                return Err(cannot_integrate(expr));
            };
            Ok(Expr::div_expr(
                expr.clone(),
                Expr::product(vec![a, Expr::func("ln", base.clone())]),
            ))
        }
        ExprView::Function { name, args } if args.len() == 1 => {
            let u = args[0].as_ref();
            let Some(a) = slope(u, var)? else {
                return Err(cannot_integrate(expr));
            };
            let antiderivative = linear_table(name, u).ok_or_else(|| cannot_integrate(expr))?;
            tracing::trace!(function = name, "integrated from the table");
            Ok(Expr::div_expr(antiderivative, a))
        }
        _ => Err(cannot_integrate(expr)),
    }
}

/// Antiderivative of `f(u)` in `u` for the functions with a closed form
fn linear_table(name: &str, u: &Expr) -> Option<Expr> {
    let u = u.clone();
    let f = |name: &str, arg: Expr| Expr::func(name, arg);
    let result = match name {
        "sin" => f("cos", u).negate(),
        "cos" => f("sin", u),
        "exp" => f("exp", u),
        "sinh" => f("cosh", u),
        "cosh" => f("sinh", u),
        "tan" => f("ln", f("cos", u)).negate(),
        "ln" => Expr::sum(vec![
            Expr::product(vec![u.clone(), f("ln", u.clone())]),
            u.negate(),
        ]),
        "sqrt" => Expr::product(vec![
            Expr::div_expr(Expr::number(2.0), Expr::number(3.0)),
            Expr::pow_static(u, Expr::div_expr(Expr::number(3.0), Expr::number(2.0))),
        ]),
        _ => return None,
    };
    Some(result)
}

/// Pick `u` for integration by parts: a logarithm or inverse tangent/sine
/// first, otherwise a polynomial factor, so each step lowers its degree.
fn parts_order<'a>(
    first: &'a Expr,
    second: &'a Expr,
    var: &str,
) -> Option<(&'a Expr, &'a Expr)> {
    let orders = [(first, second), (second, first)];
    orders
        .into_iter()
        .find(|(u, _)| is_log_like(u))
        .or_else(|| orders.into_iter().find(|(u, _)| is_polynomial(u, var)))
}

fn is_log_like(expr: &Expr) -> bool {
    matches!(
        expr.view(),
        ExprView::Function { name: "ln" | "atan" | "asin" | "acos", .. }
    )
}

fn is_polynomial(expr: &Expr, var: &str) -> bool {
    if !expr.contains_var(var) {
        return true;
    }
    match expr.view() {
        ExprView::Symbol(_) => true,
        ExprView::Sum(parts) | ExprView::Product(parts) => {
            parts.iter().all(|part| is_polynomial(part, var))
        }
        ExprView::Pow(base, exp) => {
            exp.as_number().is_some_and(|n| n >= 1.0 && n.fract() == 0.0)
                && is_polynomial(base, var)
        }
        _ => false,
    }
}

/// `∫ u dv = u v - ∫ v du`, with `dv` integrated directly
fn by_parts(u: &Expr, dv: &Expr, var: &str, depth: usize) -> EngineResult<Expr> {
    if depth >= MAX_PARTS_DEPTH {
        return Err(EngineError::unsupported("integration by parts is nested too deeply"));
    }
    let v = integrate_at(dv, var, depth)?;
    let du = derivative(u, var)?;
    let rest = simplified(&Expr::product(vec![du, v.clone()]))?;
    let rest = integrate_at(&rest, var, depth + 1)?;
    tracing::trace!(depth, "integrated by parts");
    Ok(Expr::sum(vec![Expr::product(vec![u.clone(), v]), rest.negate()]))
}

/// Derivative of `u` when it is a nonzero constant, so `u` is linear
fn slope(u: &Expr, var: &str) -> EngineResult<Option<Expr>> {
    if !u.contains_var(var) {
        return Ok(None);
    }
    let a = derivative(u, var)?;
    Ok((!a.contains_var(var) && !a.is_zero_num()).then_some(a))
}

fn scaled(mut constant: Vec<Expr>, integral: Expr) -> Expr {
    if constant.is_empty() {
        return integral;
    }
    constant.push(integral);
    Expr::product(constant)
}

fn cannot_integrate(expr: &Expr) -> EngineError {
    EngineError::unsupported(format!("unable to integrate {}", short_display(expr)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::parse_expr;

    /// Differentiate the antiderivative back and compare with the
    /// integrand at a few points.
    fn assert_antiderivative(integrand: &str) {
        let expr = parse_expr(integrand, "x").unwrap();
        let integral = integrate(&expr, "x").unwrap();
        let back = derivative(&integral, "x").unwrap();
        for x in [0.3, 0.7, 1.3, 2.1] {
            let expected = value_at(&expr, "x", x).unwrap();
            let actual = value_at(&back, "x", x).unwrap();
            assert!(
                (expected - actual).abs() <= 1e-9 * (1.0 + expected.abs()),
                "{integrand}: d/dx({integral}) at {x} gave {actual}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_power_rule_and_linearity() {
        assert_antiderivative("x");
        assert_antiderivative("3*x^2 + 2*x + 1");
        assert_antiderivative("x^(1/2)");
        assert_antiderivative("(2*x + 1)^3");
        assert_antiderivative("5");
    }

    #[test]
    fn test_reciprocals_become_logarithms() {
        assert_antiderivative("1/x");
        assert_antiderivative("3/(2*x + 1)");
        assert_antiderivative("x^(-1)");
    }

    #[test]
    fn test_functions_of_linear_arguments() {
        assert_antiderivative("sin(x)");
        assert_antiderivative("cos(3*x)");
        assert_antiderivative("exp(2*x + 1)");
        assert_antiderivative("sinh(x) + cosh(x)");
        assert_antiderivative("tan(x)");
        assert_antiderivative("ln(x)");
        assert_antiderivative("sqrt(x + 1)");
        assert_antiderivative("2^x");
    }

    #[test]
    fn test_integration_by_parts() {
        assert_antiderivative("x*exp(x)");
        assert_antiderivative("x^2*sin(x)");
        assert_antiderivative("x*cos(2*x)");
    }

    #[test]
    fn test_constant_in_other_variable() {
        let expr = parse_expr("y", "x").unwrap();
        let integral = integrate(&expr, "x").unwrap();
        assert_eq!(value_at(&integral, "x", 2.0), None);
        assert!(integral.contains_var("x"));
        assert!(integral.contains_var("y"));
    }

    #[test]
    fn test_unsupported_integrand() {
        let expr = parse_expr("exp(x^2)", "x").unwrap();
        let err = integrate(&expr, "x").unwrap_err();
        assert!(err.to_string().starts_with("unable to integrate"));
    }
}
