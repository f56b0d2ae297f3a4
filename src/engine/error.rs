use symb_anafis::DiffError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

pub const NESTED_TOO_DEEPLY: &str = "expression is nested too deeply";
pub const TOO_LARGE: &str = "expression is too large";

/// Failures raised while parsing or manipulating an expression.
///
/// The `Display` text is what ends up after the colon in a failure line,
/// so messages are written for the person at the prompt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid expression: {0}")]
    Parse(String),

    #[error("{0}")]
    Equation(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Domain(String),
}

impl EngineError {
    pub fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        EngineError::Unsupported(message.into())
    }

    pub fn domain(message: impl Into<String>) -> Self {
        EngineError::Domain(message.into())
    }
}

impl From<DiffError> for EngineError {
    fn from(err: DiffError) -> Self {
        match err {
            DiffError::EmptyFormula => EngineError::parse("empty expression"),
            DiffError::MaxDepthExceeded => EngineError::parse(NESTED_TOO_DEEPLY),
            DiffError::MaxNodesExceeded => EngineError::unsupported(TOO_LARGE),
            DiffError::InvalidSyntax { .. }
            | DiffError::InvalidNumber { .. }
            | DiffError::InvalidToken { .. }
            | DiffError::UnexpectedToken { .. }
            | DiffError::UnexpectedEndOfInput
            | DiffError::InvalidFunctionCall { .. }
            | DiffError::AmbiguousSequence { .. } => EngineError::Parse(err.to_string()),
            other => EngineError::Unsupported(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_errors_are_mapped() {
        assert_eq!(
            EngineError::from(DiffError::EmptyFormula),
            EngineError::Parse("empty expression".to_string())
        );
        assert_eq!(
            EngineError::from(DiffError::MaxDepthExceeded).to_string(),
            "invalid expression: expression is nested too deeply"
        );
        assert_eq!(
            EngineError::from(DiffError::MaxNodesExceeded),
            EngineError::Unsupported(TOO_LARGE.to_string())
        );
        assert!(matches!(
            EngineError::from(DiffError::UnexpectedEndOfInput),
            EngineError::Parse(_)
        ));
    }
}
