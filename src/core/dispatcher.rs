//! Query dispatcher
//!
//! Classifies a line, forwards the operand to the matching engine
//! operation and wraps the outcome in a `Response`. Nothing raised by the
//! engine escapes `dispatch`: every failure becomes the failure line of its
//! action.

use std::fmt;

use crate::core::query::{Action, MatchMode, Query};
use crate::core::traits::AlgebraEngine;
use crate::engine::{EngineError, EngineResult};

pub const DEFAULT_VARIABLE: &str = "x";

pub const USAGE_HINT: &str =
    "⚠️ Please specify an action: solve, simplify, derivative, integral, or evaluate.";
pub const FAREWELL: &str = "👋 Goodbye!";

/// Marker appended to every antiderivative
pub const INTEGRATION_CONSTANT: &str = " + C";

/// Result of one dispatch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Answer {
        action: Action,
        outcome: Result<String, EngineError>,
    },
    UsageHint,
    Farewell,
}

impl Response {
    pub fn is_farewell(&self) -> bool {
        matches!(self, Response::Farewell)
    }

    /// True for failure lines and the usage hint
    pub fn is_failure(&self) -> bool {
        match self {
            Response::Answer { outcome, .. } => outcome.is_err(),
            Response::UsageHint => true,
            Response::Farewell => false,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Answer {
                action,
                outcome: Ok(value),
            } => {
                let suffix = if *action == Action::Integral {
                    INTEGRATION_CONSTANT
                } else {
                    ""
                };
                write!(f, "{}: {}{}", action.success_label(), value, suffix)
            }
            Response::Answer {
                action,
                outcome: Err(err),
            } => write!(f, "{}: {}", action.failure_label(), err),
            Response::UsageHint => f.write_str(USAGE_HINT),
            Response::Farewell => f.write_str(FAREWELL),
        }
    }
}

pub struct Dispatcher<E> {
    engine: E,
    variable: String,
    match_mode: MatchMode,
}

impl<E: AlgebraEngine> Dispatcher<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            variable: DEFAULT_VARIABLE.to_string(),
            match_mode: MatchMode::default(),
        }
    }

    /// Variable used for derivative and integral, and preferred by solve
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn dispatch(&self, line: &str) -> Response {
        match Query::classify(line, self.match_mode) {
            Query::Exit => Response::Farewell,
            Query::Unrecognized => {
                tracing::debug!(input = line.trim(), "no trigger keyword");
                Response::UsageHint
            }
            Query::Command { action, operand } => {
                tracing::debug!(%action, operand = %operand, "dispatching");
                let outcome = self.forward(action, &operand);
                if let Err(err) = &outcome {
                    tracing::debug!(%action, error = %err, "engine reported a failure");
                }
                Response::Answer { action, outcome }
            }
        }
    }

    /// Call the engine operation mapped to `action`
    pub fn forward(&self, action: Action, operand: &str) -> EngineResult<String> {
        match action {
            Action::Solve => {
                let (lhs, rhs) = split_equation(operand)?;
                self.engine.solve(lhs, rhs, &self.variable)
            }
            Action::Simplify => self.engine.simplify(operand),
            Action::Derivative => self.engine.differentiate(operand, &self.variable),
            Action::Integral => self.engine.integrate(operand, &self.variable),
            Action::Evaluate => self.engine.evaluate(operand),
        }
    }
}

/// Split an equation into its two sides. Exactly one `=` is required.
pub fn split_equation(operand: &str) -> EngineResult<(&str, &str)> {
    let count = operand.matches('=').count();
    if count != 1 {
        return Err(EngineError::Equation(format!(
            "expected exactly one '=' in equation, found {}",
            count
        )));
    }
    match operand.split_once('=') {
        Some(sides) => Ok(sides),
        None => Err(EngineError::Equation("missing '='".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every call and echoes its arguments back
    #[derive(Default)]
    struct RecordingEngine {
        calls: RefCell<Vec<String>>,
        fail_with: Option<EngineError>,
    }

    impl RecordingEngine {
        fn failing(err: EngineError) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_with: Some(err),
            }
        }

        fn record(&self, call: String) -> EngineResult<String> {
            self.calls.borrow_mut().push(call.clone());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(call),
            }
        }
    }

    impl AlgebraEngine for RecordingEngine {
        fn solve(&self, lhs: &str, rhs: &str, variable: &str) -> EngineResult<String> {
            self.record(format!("solve({lhs}|{rhs}|{variable})"))
        }

        fn simplify(&self, expr: &str) -> EngineResult<String> {
            self.record(format!("simplify({expr})"))
        }

        fn differentiate(&self, expr: &str, variable: &str) -> EngineResult<String> {
            self.record(format!("differentiate({expr}|{variable})"))
        }

        fn integrate(&self, expr: &str, variable: &str) -> EngineResult<String> {
            self.record(format!("integrate({expr}|{variable})"))
        }

        fn evaluate(&self, expr: &str) -> EngineResult<String> {
            self.record(format!("evaluate({expr})"))
        }
    }

    #[test]
    fn test_each_trigger_calls_its_operation() {
        let engine = RecordingEngine::default();
        let dispatcher = Dispatcher::new(&engine);

        let cases = [
            ("solve x+1=2", "Solution: solve(x+1|2|x)"),
            ("simplify x+x", "Simplified: simplify(x+x)"),
            ("derivative x^2", "Derivative: differentiate(x^2|x)"),
            ("integral x", "Integral: integrate(x|x) + C"),
            ("evaluate 2*3", "Evaluated: evaluate(2*3)"),
        ];
        for (input, expected) in cases {
            assert_eq!(dispatcher.dispatch(input).to_string(), expected);
        }
        assert_eq!(engine.calls.borrow().len(), 5);
    }

    #[test]
    fn test_only_one_action_fires() {
        let engine = RecordingEngine::default();
        let dispatcher = Dispatcher::new(&engine);

        dispatcher.dispatch("please simplify and derivative this");
        assert_eq!(
            *engine.calls.borrow(),
            vec!["simplify(please  and derivative this)".to_string()]
        );
    }

    #[test]
    fn test_failures_use_failure_format() {
        let engine = RecordingEngine::failing(EngineError::DivisionByZero);
        let dispatcher = Dispatcher::new(&engine);

        let response = dispatcher.dispatch("evaluate 1/0");
        assert!(response.is_failure());
        assert_eq!(response.to_string(), "Error evaluating expression: division by zero");

        let response = dispatcher.dispatch("integral 1/0");
        assert_eq!(response.to_string(), "Error computing integral: division by zero");
    }

    #[test]
    fn test_solve_requires_exactly_one_equals() {
        let engine = RecordingEngine::default();
        let dispatcher = Dispatcher::new(&engine);

        let response = dispatcher.dispatch("solve x+1");
        assert_eq!(
            response.to_string(),
            "Error solving equation: expected exactly one '=' in equation, found 0"
        );

        let response = dispatcher.dispatch("solve x=1=2");
        assert!(response.to_string().starts_with("Error solving equation:"));
        assert!(engine.calls.borrow().is_empty());
    }

    #[test]
    fn test_usage_hint_and_farewell() {
        let dispatcher = Dispatcher::new(RecordingEngine::default());

        assert_eq!(dispatcher.dispatch("hello there"), Response::UsageHint);
        assert_eq!(dispatcher.dispatch("hello there").to_string(), USAGE_HINT);
        assert!(dispatcher.dispatch("EXIT").is_farewell());
        assert_eq!(dispatcher.dispatch("Exit").to_string(), FAREWELL);
    }

    #[test]
    fn test_configured_variable_and_mode() {
        let engine = RecordingEngine::default();
        let dispatcher = Dispatcher::new(&engine)
            .with_variable("t")
            .with_match_mode(MatchMode::Strict);

        assert_eq!(
            dispatcher.dispatch("derivative t^2").to_string(),
            "Derivative: differentiate(t^2|t)"
        );
        assert_eq!(dispatcher.dispatch("the derivative of t"), Response::UsageHint);
    }

    #[test]
    fn test_split_equation() {
        assert_eq!(split_equation("x + 1 = 2").unwrap(), ("x + 1 ", " 2"));
        assert!(matches!(split_equation("x"), Err(EngineError::Equation(_))));
        assert!(matches!(split_equation("a=b=c"), Err(EngineError::Equation(_))));
    }
}
