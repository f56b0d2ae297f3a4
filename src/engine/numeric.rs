//! Numeric evaluation of parsed expressions.
//!
//! The library evaluator folds everything to an `f64`. When that overflows,
//! the magnitude is rebuilt in base-10 logarithms so values such as
//! `10^400` still print in exponent notation.

use std::collections::HashMap;
use std::f64::consts::LOG10_E;

use symb_anafis::Expr;
use symb_anafis::visitor::ExprView;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::input::{free_symbols, short_display};

/// Evaluate `expr` and format it with `digits` significant digits.
pub fn evaluate(expr: &Expr, digits: usize) -> EngineResult<String> {
    if let Some(symbol) = free_symbols(expr).into_iter().next() {
        return Err(EngineError::unsupported(format!(
            "cannot evaluate numerically: free symbol {}",
            symbol
        )));
    }

    if let Some(value) = numeric_value(expr)
        && value.is_finite()
    {
        return Ok(format_float(value, digits));
    }
    if divides_by_zero(expr) {
        return Err(EngineError::DivisionByZero);
    }
    match magnitude(expr) {
        Some(m) if m.log10 == f64::NEG_INFINITY => Ok(format_float(0.0, digits)),
        Some(m) if m.log10.is_finite() => Ok(m.format(digits)),
        _ => Err(EngineError::domain(format!(
            "{} has no finite real value",
            short_display(expr)
        ))),
    }
}

fn numeric_value(expr: &Expr) -> Option<f64> {
    expr.evaluate(&(), &HashMap::new()).as_number()
}

/// True when some division or negative power has a zero denominator
fn divides_by_zero(expr: &Expr) -> bool {
    match expr.view() {
        ExprView::Div(num, den) => {
            numeric_value(den) == Some(0.0) || divides_by_zero(num) || divides_by_zero(den)
        }
        ExprView::Pow(base, exp) => {
            let zero_base = numeric_value(base) == Some(0.0);
            let negative_exp = numeric_value(exp).is_some_and(|e| e < 0.0);
            (zero_base && negative_exp) || divides_by_zero(base) || divides_by_zero(exp)
        }
        ExprView::Sum(terms) | ExprView::Product(terms) => {
            terms.iter().any(|term| divides_by_zero(term))
        }
        ExprView::Function { args, .. } => args.iter().any(|arg| divides_by_zero(arg)),
        _ => false,
    }
}

/// Sign and base-10 logarithm of a real value. Zero has a log of -inf.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Magnitude {
    negative: bool,
    log10: f64,
}

impl Magnitude {
    fn of(value: f64) -> Self {
        Self {
            negative: value < 0.0,
            log10: value.abs().log10(),
        }
    }

    fn format(self, digits: usize) -> String {
        let mut exponent = self.log10.floor();
        // digits spent on a long exponent are lost from the mantissa
        let exponent_digits = exponent.abs().log10().floor().max(0.0) as usize + 1;
        let digits = digits.min(15usize.saturating_sub(exponent_digits)).max(1);

        let scale = 10f64.powi(digits as i32 - 1);
        let mut mantissa = (10f64.powf(self.log10 - exponent) * scale).round() / scale;
        if mantissa >= 10.0 {
            mantissa /= 10.0;
            exponent += 1.0;
        }
        let sign = if self.negative { "-" } else { "" };
        format!("{sign}{}e{}", format_float(mantissa, digits), exponent as i64)
    }
}

fn magnitude(expr: &Expr) -> Option<Magnitude> {
    if let Some(value) = numeric_value(expr)
        && value.is_finite()
    {
        return Some(Magnitude::of(value));
    }

    match expr.view() {
        ExprView::Product(factors) => {
            let mut total = Magnitude::of(1.0);
            for factor in factors.iter() {
                let m = magnitude(factor)?;
                total.negative ^= m.negative;
                total.log10 += m.log10;
            }
            Some(total)
        }
        ExprView::Div(num, den) => {
            let num = magnitude(num)?;
            let den = magnitude(den)?;
            Some(Magnitude {
                negative: num.negative ^ den.negative,
                log10: num.log10 - den.log10,
            })
        }
        ExprView::Pow(base, exp) => {
            let exp = numeric_value(exp).filter(|e| e.is_finite())?;
            let base = magnitude(base)?;
            let negative = if base.negative {
                if exp.fract() != 0.0 {
                    return None;
                }
                exp % 2.0 != 0.0
            } else {
                false
            };
            Some(Magnitude {
                negative,
                log10: exp * base.log10,
            })
        }
        ExprView::Function { name: "exp", args } if args.len() == 1 => {
            let power = numeric_value(&args[0]).filter(|p| p.is_finite())?;
            Some(Magnitude {
                negative: false,
                log10: power * LOG10_E,
            })
        }
        ExprView::Sum(terms) => {
            let parts = terms
                .iter()
                .map(|term| magnitude(term))
                .collect::<Option<Vec<_>>>()?;
            let largest = parts
                .iter()
                .map(|m| m.log10)
                .fold(f64::NEG_INFINITY, f64::max);
            if largest == f64::NEG_INFINITY {
                return Some(Magnitude::of(0.0));
            }
            if !largest.is_finite() {
                return None;
            }
            let scaled: f64 = parts
                .iter()
                .map(|m| {
                    let size = 10f64.powf(m.log10 - largest);
                    if m.negative { -size } else { size }
                })
                .sum();
            Some(Magnitude {
                negative: scaled < 0.0,
                log10: largest + scaled.abs().log10(),
            })
        }
        _ => None,
    }
}

/// Format `value` with `digits` significant digits. Trailing zeros are
/// dropped but at least one fractional digit is kept, so integers print as
/// `4.0`. Very large or very small magnitudes use exponent notation.
pub fn format_float(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let significant: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if exponent < -5 || exponent >= digits as i32 {
        let (head, tail) = significant.split_at(1);
        return format!("{sign}{head}.{}e{exponent}", fraction_digits(tail));
    }

    let (whole, fraction) = if exponent >= 0 {
        let split = (exponent as usize + 1).min(significant.len());
        let (whole, fraction) = significant.split_at(split);
        (whole.to_string(), fraction.to_string())
    } else {
        let zeros = "0".repeat((-exponent - 1) as usize);
        ("0".to_string(), format!("{zeros}{significant}"))
    };
    format!("{sign}{whole}.{}", fraction_digits(&fraction))
}

fn fraction_digits(digits: &str) -> &str {
    match digits.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    }
}
