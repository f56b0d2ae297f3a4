//! Roots of `lhs = rhs` for one unknown.
//!
//! The difference of both sides is brought to polynomial form by
//! multiplying out denominators that contain the unknown. Coefficients are
//! read off the library's derivatives at zero. Numeric coefficients go to a
//! companion matrix eigenvalue solve; symbolic ones are solved up to degree
//! two.

use std::collections::HashMap;

use nalgebra::DMatrix;
use nalgebra::linalg::Schur;
use num_complex::Complex64;
use symb_anafis::Expr;
use symb_anafis::visitor::ExprView;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::input::free_symbols;
use crate::engine::numeric::format_float;
use crate::engine::{derivative, simplified};

/// Highest polynomial degree the solver accepts
pub const MAX_DEGREE: usize = 64;

const SCHUR_ITERATIONS: usize = 10_000;
const NEWTON_STEPS: usize = 16;
const RESULT_ZERO_TOL: f64 = 1.0e-10;
const SNAP_TOL: f64 = 1.0e-9;
const DEDUP_TOL: f64 = 1.0e-7;

/// Solve `lhs = rhs` and render the roots as `[r1, r2, ...]`.
///
/// The unknown is `preferred` when it occurs in the equation, otherwise the
/// alphabetically first free symbol. An equation without symbols has no
/// unknown and yields an empty list.
pub fn solve(lhs: &Expr, rhs: &Expr, preferred: &str, digits: usize) -> EngineResult<String> {
    let difference = simplified(&(lhs.clone() - rhs.clone()))?;
    let symbols = free_symbols(&difference);
    let var = if symbols.contains(preferred) {
        preferred.to_string()
    } else {
        match symbols.into_iter().next() {
            Some(first) => first,
            None => return Ok(render(Vec::new())),
        }
    };

    let (numerator, denominators) = clear_denominators(&difference, &var);
    let degree = match degree(&numerator, &var) {
        Some(degree) if degree > MAX_DEGREE => {
            return Err(EngineError::unsupported(format!(
                "cannot solve equations of degree above {MAX_DEGREE}"
            )));
        }
        Some(degree) => degree,
        None => {
            return Err(EngineError::unsupported(format!(
                "cannot solve non-polynomial equation in {var}"
            )));
        }
    };
    tracing::debug!(unknown = %var, degree, "solving polynomial equation");

    let coefficients = taylor_coefficients(&numerator, &var, degree)?;
    let numeric: Option<Vec<f64>> = coefficients.iter().map(Expr::as_number).collect();
    match numeric {
        Some(coeffs) => {
            if coeffs.iter().all(|c| *c == 0.0) {
                return Err(identity(&var));
            }
            let mut roots = polynomial_roots(&coeffs)?;
            for den in &denominators {
                if let Some(den_coeffs) = numeric_polynomial(den, &var)? {
                    roots.retain(|root| !is_root(&den_coeffs, *root));
                }
            }
            sort_roots(&mut roots);
            Ok(render(roots.iter().map(|r| format_root(*r, digits)).collect()))
        }
        None => {
            tracing::debug!(unknown = %var, "symbolic coefficients");
            symbolic_roots(coefficients, &var).map(render)
        }
    }
}

fn render(roots: Vec<String>) -> String {
    format!("[{}]", roots.join(", "))
}

fn identity(var: &str) -> EngineError {
    EngineError::unsupported(format!("every value of {var} satisfies the equation"))
}

/// Multiply every term by the denominators it lacks. Returns the cleared
/// numerator and the distinct denominators that contain `var`.
fn clear_denominators(expr: &Expr, var: &str) -> (Expr, Vec<Expr>) {
    let terms: Vec<Expr> = match expr.view() {
        ExprView::Sum(terms) => terms.iter().map(|t| (**t).clone()).collect(),
        _ => vec![expr.clone()],
    };

    let split: Vec<(Expr, Vec<(Expr, u32)>)> =
        terms.iter().map(|term| split_term(term, var)).collect();

    let mut common: Vec<(Expr, u32)> = Vec::new();
    for (_, dens) in &split {
        for (base, power) in dens {
            match common.iter_mut().find(|(b, _)| b == base) {
                Some((_, existing)) => *existing = (*existing).max(*power),
                None => common.push((base.clone(), *power)),
            }
        }
    }

    let cleared = split
        .into_iter()
        .map(|(num, dens)| {
            let mut factors = vec![num];
            for (base, power) in &common {
                let own = dens
                    .iter()
                    .find(|(b, _)| b == base)
                    .map_or(0, |(_, p)| *p);
                if *power > own {
                    factors.push(Expr::pow_static(
                        base.clone(),
                        Expr::number(f64::from(power - own)),
                    ));
                }
            }
            Expr::product(factors)
        })
        .collect();

    let denominators = common.into_iter().map(|(base, _)| base).collect();
    (Expr::sum(cleared), denominators)
}

/// Split one term into a numerator and its denominators in `var`, each
/// with a multiplicity.
fn split_term(term: &Expr, var: &str) -> (Expr, Vec<(Expr, u32)>) {
    match term.view() {
        ExprView::Div(num, den) if den.contains_var(var) => {
            let (num, mut dens) = split_term(num, var);
            add_denominator(&mut dens, power_parts(den));
            (num, dens)
        }
        ExprView::Div(num, den) => {
            let (num, dens) = split_term(num, var);
            (Expr::div_expr(num, den.clone()), dens)
        }
        ExprView::Product(factors) => {
            let mut numerators = Vec::with_capacity(factors.len());
            let mut dens = Vec::new();
            for factor in factors.iter() {
                let (num, factor_dens) = split_term(factor, var);
                numerators.push(num);
                for den in factor_dens {
                    add_denominator(&mut dens, den);
                }
            }
            (Expr::product(numerators), dens)
        }
        ExprView::Pow(base, exp) if base.contains_var(var) => match negative_integer(exp) {
            Some(power) => (Expr::number(1.0), vec![(base.clone(), power)]),
            None => (term.clone(), Vec::new()),
        },
        _ => (term.clone(), Vec::new()),
    }
}

fn add_denominator(dens: &mut Vec<(Expr, u32)>, (base, power): (Expr, u32)) {
    match dens.iter_mut().find(|(b, _)| *b == base) {
        Some((_, existing)) => *existing += power,
        None => dens.push((base, power)),
    }
}

/// `b^n` with a positive integer `n` as `(b, n)`, anything else as `(e, 1)`
fn power_parts(expr: &Expr) -> (Expr, u32) {
    if let ExprView::Pow(base, exp) = expr.view()
        && let Some(n) = exp.as_number()
        && n >= 1.0
        && n.fract() == 0.0
        && n <= MAX_DEGREE as f64
    {
        return (base.clone(), n as u32);
    }
    (expr.clone(), 1)
}

fn negative_integer(expr: &Expr) -> Option<u32> {
    let n = expr.as_number()?;
    (n <= -1.0 && n.fract() == 0.0 && n >= -(MAX_DEGREE as f64)).then(|| (-n) as u32)
}

/// Polynomial degree of `expr` in `var`, or `None` when it is not a
/// polynomial. Degrees past `MAX_DEGREE` are reported as `MAX_DEGREE + 1`.
fn degree(expr: &Expr, var: &str) -> Option<usize> {
    if !expr.contains_var(var) {
        return Some(0);
    }
    let degree = match expr.view() {
        ExprView::Symbol(_) => 1,
        ExprView::Sum(terms) => {
            let mut highest = 0;
            for term in terms.iter() {
                highest = highest.max(degree(term, var)?);
            }
            highest
        }
        ExprView::Product(factors) => {
            let mut total = 0usize;
            for factor in factors.iter() {
                total = total.saturating_add(degree(factor, var)?);
            }
            total
        }
        ExprView::Div(num, den) if !den.contains_var(var) => degree(num, var)?,
        ExprView::Pow(base, exp) => {
            let n = exp.as_number()?;
            if n < 0.0 || n.fract() != 0.0 {
                return None;
            }
            let n = if n > MAX_DEGREE as f64 {
                MAX_DEGREE + 1
            } else {
                n as usize
            };
            degree(base, var)?.saturating_mul(n)
        }
        _ => return None,
    };
    Some(degree.min(MAX_DEGREE + 1))
}

/// Coefficients `c_0..=c_degree` as `p^(k)(0) / k!`
fn taylor_coefficients(poly: &Expr, var: &str, degree: usize) -> EngineResult<Vec<Expr>> {
    let at_zero = HashMap::from([(var, 0.0)]);
    let mut coefficients = Vec::with_capacity(degree + 1);
    let mut current = poly.clone();
    let mut factorial = 1.0;

    for k in 0..=degree {
        if k > 0 {
            factorial *= k as f64;
            current = derivative(&current, var)?;
        }
        if current.is_zero_num() {
            coefficients.resize(degree + 1, Expr::number(0.0));
            break;
        }
        let value = current.evaluate(&at_zero, &HashMap::new());
        let coefficient = match value.as_number() {
            Some(n) => Expr::number(n / factorial),
            None => simplified(&Expr::div_expr(value, Expr::number(factorial)))?,
        };
        coefficients.push(coefficient);
    }
    Ok(coefficients)
}

fn numeric_polynomial(expr: &Expr, var: &str) -> EngineResult<Option<Vec<f64>>> {
    let Some(degree) = degree(expr, var).filter(|d| *d <= MAX_DEGREE) else {
        return Ok(None);
    };
    let coefficients = taylor_coefficients(expr, var, degree)?;
    Ok(coefficients.iter().map(Expr::as_number).collect())
}

/// All complex roots of `c_0 + c_1 x + ... + c_n x^n`, not all zero
fn polynomial_roots(coeffs: &[f64]) -> EngineResult<Vec<Complex64>> {
    let top = coeffs.iter().rposition(|c| *c != 0.0).unwrap_or(0);
    let zeros = coeffs.iter().position(|c| *c != 0.0).unwrap_or(0);
    let reduced = &coeffs[zeros..=top];

    let mut roots = if zeros > 0 {
        vec![Complex64::new(0.0, 0.0)]
    } else {
        Vec::new()
    };
    match reduced.len() - 1 {
        0 => {}
        1 => roots.push(Complex64::new(-reduced[0] / reduced[1], 0.0)),
        2 => roots.extend(quadratic_roots(reduced[2], reduced[1], reduced[0])),
        degree => {
            for root in companion_roots(reduced, degree)? {
                roots.push(polish(reduced, root));
            }
        }
    }

    let mut roots: Vec<Complex64> = roots
        .into_iter()
        .map(|root| snap(coeffs, canonicalize_root(root)))
        .collect();
    sort_roots(&mut roots);
    roots.dedup_by(|a, b| (*a - *b).norm() <= DEDUP_TOL * (1.0 + b.norm()));
    Ok(roots)
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> [Complex64; 2] {
    let disc = Complex64::new(b * b - 4.0 * a * c, 0.0).sqrt();
    let q = if b >= 0.0 {
        (disc + b) * -0.5
    } else {
        (disc - b) * 0.5
    };
    if q.norm() == 0.0 {
        let root = Complex64::new(-b / (2.0 * a), 0.0);
        return [root, root];
    }
    [q / a, Complex64::new(c, 0.0) / q]
}

fn companion_roots(coeffs: &[f64], degree: usize) -> EngineResult<Vec<Complex64>> {
    let leading = coeffs[degree];
    let mut companion = DMatrix::<f64>::zeros(degree, degree);
    for row in 1..degree {
        companion[(row, row - 1)] = 1.0;
    }
    for column in 0..degree {
        companion[(0, column)] = -coeffs[degree - 1 - column] / leading;
    }

    let schur = Schur::try_new(companion, f64::EPSILON, SCHUR_ITERATIONS)
        .ok_or_else(|| EngineError::unsupported("root finding did not converge"))?;
    Ok(schur.complex_eigenvalues().iter().copied().collect())
}

fn eval_poly(coeffs: &[f64], z: Complex64) -> (Complex64, Complex64) {
    let mut value = Complex64::new(0.0, 0.0);
    let mut slope = Complex64::new(0.0, 0.0);
    for c in coeffs.iter().rev() {
        slope = slope * z + value;
        value = value * z + *c;
    }
    (value, slope)
}

/// Newton steps that are kept only while they shrink the residual
fn polish(coeffs: &[f64], mut root: Complex64) -> Complex64 {
    let mut residual = eval_poly(coeffs, root).0.norm();
    for _ in 0..NEWTON_STEPS {
        let (value, slope) = eval_poly(coeffs, root);
        if slope.norm() == 0.0 || residual == 0.0 {
            break;
        }
        let next = root - value / slope;
        let next_residual = eval_poly(coeffs, next).0.norm();
        if !(next_residual < residual) {
            break;
        }
        root = next;
        residual = next_residual;
    }
    root
}

fn canonicalize_root(z: Complex64) -> Complex64 {
    if !z.re.is_finite() || !z.im.is_finite() {
        return z;
    }
    let mut real = z.re;
    let mut imag = z.im;
    if imag.abs() <= RESULT_ZERO_TOL * (1.0 + real.abs()) {
        imag = 0.0;
    }
    if real.abs() <= RESULT_ZERO_TOL * (1.0 + imag.abs()) {
        real = 0.0;
    }
    Complex64::new(real, imag)
}

/// Replace a root by the nearby Gaussian integer when that one is exact
fn snap(coeffs: &[f64], z: Complex64) -> Complex64 {
    let candidate = Complex64::new(z.re.round(), z.im.round());
    if (z - candidate).norm() > 1.0e-6 * (1.0 + candidate.norm()) {
        return z;
    }
    if is_root(coeffs, candidate) { candidate } else { z }
}

fn is_root(coeffs: &[f64], z: Complex64) -> bool {
    let size = z.norm();
    let scale: f64 = coeffs
        .iter()
        .enumerate()
        .map(|(k, c)| c.abs() * size.powi(k as i32))
        .sum();
    eval_poly(coeffs, z).0.norm() <= SNAP_TOL * scale.max(f64::MIN_POSITIVE)
}

/// Real roots ascending, then complex roots by real and imaginary part
fn sort_roots(roots: &mut [Complex64]) {
    roots.sort_by(|a, b| {
        let a_complex = a.im != 0.0;
        let b_complex = b.im != 0.0;
        a_complex
            .cmp(&b_complex)
            .then_with(|| a.re.total_cmp(&b.re))
            .then_with(|| a.im.total_cmp(&b.im))
    });
}

fn format_number(value: f64, digits: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1.0e15 {
        format!("{}", value as i64)
    } else {
        format_float(value, digits)
    }
}

fn format_root(z: Complex64, digits: usize) -> String {
    if z.im == 0.0 {
        return format_number(z.re, digits);
    }
    let imag = if z.im.abs() == 1.0 {
        "I".to_string()
    } else {
        format!("{}*I", format_number(z.im.abs(), digits))
    };
    match (z.re == 0.0, z.im < 0.0) {
        (true, false) => imag,
        (true, true) => format!("-{imag}"),
        (false, false) => format!("{} + {imag}", format_number(z.re, digits)),
        (false, true) => format!("{} - {imag}", format_number(z.re, digits)),
    }
}

/// Closed forms for linear and quadratic equations with symbolic
/// coefficients
fn symbolic_roots(mut coefficients: Vec<Expr>, var: &str) -> EngineResult<Vec<String>> {
    while coefficients.len() > 1 && coefficients.last().is_some_and(Expr::is_zero_num) {
        coefficients.pop();
    }

    match coefficients.as_slice() {
        [c] if c.is_zero_num() => Err(identity(var)),
        [_] => Ok(Vec::new()),
        [c0, c1] => {
            let root = simplified(&Expr::div_expr(c0.clone().negate(), c1.clone()))?;
            Ok(vec![root.to_string()])
        }
        [c, b, a] => {
            let disc = Expr::pow_static(b.clone(), Expr::number(2.0))
                - Expr::number(4.0) * a.clone() * c.clone();
            let root_of_disc = Expr::func("sqrt", disc);
            let twice_a = Expr::number(2.0) * a.clone();
            let minus = simplified(&Expr::div_expr(
                b.clone().negate() - root_of_disc.clone(),
                twice_a.clone(),
            ))?;
            let plus = simplified(&Expr::div_expr(b.clone().negate() + root_of_disc, twice_a))?;

            let mut roots = vec![minus.to_string(), plus.to_string()];
            roots.dedup();
            Ok(roots)
        }
        _ => Err(EngineError::unsupported(format!(
            "cannot solve equations of degree {} in {var} with symbolic coefficients",
            coefficients.len() - 1
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::parse_expr;
    use std::time::{Duration, Instant};

    fn solve_text(equation: &str) -> EngineResult<String> {
        let (lhs, rhs) = equation.split_once('=').unwrap();
        solve(&parse_expr(lhs, "x")?, &parse_expr(rhs, "x")?, "x", 15)
    }

    #[test]
    fn test_integer_roots_are_exact() {
        assert_eq!(solve_text("x + 1 = 2").unwrap(), "[1]");
        assert_eq!(solve_text("x^2 - 4 = 0").unwrap(), "[-2, 2]");
        assert_eq!(solve_text("(x-1)*(x-2)*(x-3) = 0").unwrap(), "[1, 2, 3]");
        assert_eq!(solve_text("x^3 - x = 0").unwrap(), "[-1, 0, 1]");
        assert_eq!(solve_text("(x-1)^2 = 0").unwrap(), "[1]");
    }

    #[test]
    fn test_fractional_roots_and_denominators() {
        assert_eq!(solve_text("2*x = 1").unwrap(), "[0.5]");
        assert_eq!(solve_text("1/x = 2").unwrap(), "[0.5]");
        assert_eq!(solve_text("(x^2 - 1)/(x - 1) = 0").unwrap(), "[-1]");
    }

    #[test]
    fn test_complex_and_irrational_roots() {
        assert_eq!(solve_text("x^2 + 1 = 0").unwrap(), "[-I, I]");

        let roots = solve_text("x^3 = 2").unwrap();
        assert!(roots.starts_with("[1.2599210498948"), "{roots}");
        assert_eq!(roots.matches("*I").count(), 2, "{roots}");
    }

    #[test]
    fn test_large_coefficients_finish_quickly() {
        let start = Instant::now();
        let roots = solve_text("963761198400*x^3 + x = 963761198400").unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));

        let first = roots
            .trim_start_matches('[')
            .split(", ")
            .next()
            .and_then(|r| r.parse::<f64>().ok())
            .unwrap();
        assert!((first - 1.0).abs() < 1e-9, "{roots}");
    }

    #[test]
    fn test_unknown_selection() {
        assert_eq!(solve_text("y + 1 = 0").unwrap(), "[-1]");
        assert_eq!(solve_text("2 = 2").unwrap(), "[]");

        let roots = solve_text("a*x + b = 0").unwrap();
        assert!(roots.contains('a') && roots.contains('b'), "{roots}");
    }

    #[test]
    fn test_unsupported_equations() {
        assert!(matches!(solve_text("sin(x) = 0"), Err(EngineError::Unsupported(_))));
        assert!(matches!(solve_text("x^100 = 1"), Err(EngineError::Unsupported(_))));
    }

    #[test]
    fn test_format_root_forms() {
        assert_eq!(format_root(Complex64::new(2.0, 0.0), 15), "2");
        assert_eq!(format_root(Complex64::new(0.0, -1.0), 15), "-I");
        assert_eq!(format_root(Complex64::new(1.0, 2.0), 15), "1 + 2*I");
        assert_eq!(format_root(Complex64::new(-0.5, -1.5), 15), "-0.5 - 1.5*I");
    }
}
