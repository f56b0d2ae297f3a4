//! Turning query text into library expressions.
//!
//! The library parser is recursive, so the text is checked for nesting
//! before it is handed over. The parsed tree is then rebuilt once to map
//! one-argument `log` to the natural logarithm and to reject calls the
//! library could not evaluate.

use std::collections::{BTreeSet, HashMap, HashSet};

use symb_anafis::Expr;
use symb_anafis::visitor::ExprView;

use crate::engine::error::{EngineError, EngineResult, NESTED_TOO_DEEPLY, TOO_LARGE};

/// Deepest bracket, power and sign nesting accepted from text
pub const MAX_NESTING: usize = 64;

/// Tree limits handed to the library builders
pub const MAX_DEPTH: usize = 100;
pub const MAX_NODES: usize = 10_000;

const UNARY_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "cot", "sec", "csc", "asin", "acos", "atan", "sinh", "cosh", "tanh",
    "asinh", "acosh", "atanh", "exp", "ln", "log10", "log2", "sqrt", "cbrt", "abs",
];

const BINARY_FUNCTIONS: &[&str] = &["log", "atan2"];

const CONSTANTS: &[&str] = &["pi", "PI", "Pi", "e", "E"];

/// Parse `text`, treating `variable` as a single symbol even when it is
/// longer than one letter. An empty `variable` registers nothing.
pub fn parse_expr(text: &str, variable: &str) -> EngineResult<Expr> {
    check_nesting(text)?;

    let known: HashSet<String> = std::iter::once(variable)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    let functions: HashSet<String> = HashSet::new();
    let parsed = symb_anafis::parse(text, &known, &functions, None)?;

    if parsed.max_depth() > MAX_DEPTH {
        return Err(EngineError::parse(NESTED_TOO_DEEPLY));
    }
    if parsed.node_count() > MAX_NODES {
        return Err(EngineError::unsupported(TOO_LARGE));
    }
    rebuild(&parsed)
}

/// Reject text whose brackets, power chains or sign runs would nest deeper
/// than `MAX_NESTING`.
pub fn check_nesting(text: &str) -> EngineResult<()> {
    let opens = text.matches('(').count();
    let closes = text.matches(')').count();
    // unmatched closers are balanced by opening brackets at the front
    let leading = closes.saturating_sub(opens);
    if leading > MAX_NESTING {
        return Err(EngineError::parse(NESTED_TOO_DEEPLY));
    }

    // one counter per open bracket: powers and unary signs not yet closed
    // by a binary operator at that level
    let mut levels: Vec<usize> = vec![0; leading + 1];
    let mut after_operator = true;
    let mut chars = text.chars().filter(|c| !c.is_whitespace()).peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => {
                levels.push(0);
                after_operator = true;
            }
            ')' => {
                if levels.len() > 1 {
                    levels.pop();
                }
                after_operator = false;
            }
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                bump(&mut levels);
                after_operator = true;
            }
            '^' => {
                bump(&mut levels);
                after_operator = true;
            }
            '+' | '-' if after_operator => bump(&mut levels),
            '+' | '-' | '*' | '/' | ',' => {
                reset(&mut levels);
                after_operator = true;
            }
            _ => after_operator = false,
        }

        if levels.len() + levels.iter().sum::<usize>() > MAX_NESTING {
            return Err(EngineError::parse(NESTED_TOO_DEEPLY));
        }
    }
    Ok(())
}

fn bump(levels: &mut [usize]) {
    if let Some(top) = levels.last_mut() {
        *top += 1;
    }
}

fn reset(levels: &mut [usize]) {
    if let Some(top) = levels.last_mut() {
        *top = 0;
    }
}

fn rebuild(expr: &Expr) -> EngineResult<Expr> {
    let rebuilt = match expr.view() {
        ExprView::Number(n) => Expr::number(n),
        ExprView::Symbol(name) => Expr::symbol(&*name),
        ExprView::Function { name, args } => {
            let args = args
                .iter()
                .map(|arg| rebuild(arg))
                .collect::<EngineResult<Vec<_>>>()?;
            match (name, args.len()) {
                ("log", 1) => Expr::func_multi("ln", args),
                (name, 1) if UNARY_FUNCTIONS.contains(&name) => Expr::func_multi(name, args),
                (name, 2) if BINARY_FUNCTIONS.contains(&name) => Expr::func_multi(name, args),
                (name, count) => {
                    return Err(EngineError::parse(format!(
                        "unknown function {name} with {count} argument(s)"
                    )));
                }
            }
        }
        ExprView::Sum(terms) => Expr::sum(
            terms
                .iter()
                .map(|term| rebuild(term))
                .collect::<EngineResult<Vec<_>>>()?,
        ),
        ExprView::Product(factors) => Expr::product(
            factors
                .iter()
                .map(|factor| rebuild(factor))
                .collect::<EngineResult<Vec<_>>>()?,
        ),
        ExprView::Div(num, den) => Expr::div_expr(rebuild(num)?, rebuild(den)?),
        ExprView::Pow(base, exp) => Expr::pow_static(rebuild(base)?, rebuild(exp)?),
        ExprView::Derivative { .. } => {
            return Err(EngineError::parse("derivative notation is not supported"));
        }
    };
    Ok(rebuilt)
}

/// Symbols other than the named constants, in alphabetical order
pub fn free_symbols(expr: &Expr) -> BTreeSet<String> {
    expr.variables()
        .into_iter()
        .filter(|name| !CONSTANTS.contains(&name.as_str()))
        .collect()
}

/// Numeric value of `expr` with `var` set to `value`, if it has one
pub fn value_at(expr: &Expr, var: &str, value: f64) -> Option<f64> {
    let vars = HashMap::from([(var, value)]);
    expr.evaluate(&vars, &HashMap::new()).as_number()
}

/// `expr` printed for an error message, cut short when very long
pub fn short_display(expr: &Expr) -> String {
    const LIMIT: usize = 48;
    let text = expr.to_string();
    if text.chars().count() <= LIMIT {
        return text;
    }
    let head: String = text.chars().take(LIMIT).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_expressions() {
        let expr = parse_expr("x^2 + 2*x + 1", "x").unwrap();
        assert!(expr.contains_var("x"));
        assert_eq!(value_at(&expr, "x", 2.0), Some(9.0));
        assert_eq!(value_at(&parse_expr("2 ** 3", "x").unwrap(), "x", 0.0), Some(8.0));
    }

    #[test]
    fn test_single_argument_log_is_natural() {
        let expr = parse_expr("log(x)", "x").unwrap();
        let value = value_at(&expr, "x", std::f64::consts::E).unwrap();
        assert!((value - 1.0).abs() < 1e-12);

        let expr = parse_expr("log(2, 8)", "x").unwrap();
        let value = value_at(&expr, "x", 0.0).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_bad_input_is_a_parse_failure() {
        assert!(matches!(parse_expr("x+*", "x"), Err(EngineError::Parse(_))));
        assert!(matches!(parse_expr("", "x"), Err(EngineError::Parse(_))));
        assert!(matches!(parse_expr("x +", "x"), Err(EngineError::Parse(_))));
    }

    #[test]
    fn test_deep_nesting_is_rejected_before_parsing() {
        let deep = NESTED_TOO_DEEPLY.to_string();

        let parens = format!("{}x{}", "(".repeat(20_000), ")".repeat(20_000));
        assert_eq!(parse_expr(&parens, "x"), Err(EngineError::Parse(deep.clone())));

        let signs = format!("{}x", "-".repeat(50_000));
        assert_eq!(parse_expr(&signs, "x"), Err(EngineError::Parse(deep.clone())));

        let closers = format!("x{}", ")".repeat(20_000));
        assert_eq!(parse_expr(&closers, "x"), Err(EngineError::Parse(deep.clone())));

        let tower = vec!["x"; 1_000].join("^-");
        assert_eq!(parse_expr(&tower, "x"), Err(EngineError::Parse(deep)));
    }

    #[test]
    fn test_shallow_repetition_is_accepted() {
        let long_sum = vec!["x"; 500].join(" - ");
        assert!(check_nesting(&long_sum).is_ok());
        assert!(check_nesting("((x+1)*(x-1))^2 / -(x^-2)").is_ok());
        assert!(check_nesting(&"(x)+".repeat(1_000)).is_ok());
    }

    #[test]
    fn test_free_symbols_skip_constants() {
        let expr = parse_expr("pi*y + e + x", "x").unwrap();
        let symbols: Vec<String> = free_symbols(&expr).into_iter().collect();
        assert_eq!(symbols, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_short_display_truncates() {
        let expr = parse_expr(&vec!["x"; 100].join("*y*"), "x").unwrap();
        assert!(short_display(&expr).chars().count() <= 51);
    }
}
