use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failures raised while lexing or parsing a forcing-term expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("Malformed number literal: {0}")]
    MalformedNumber(String),

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Mismatched parenthesis")]
    MismatchedParenthesis,

    #[error("Operator is missing an operand")]
    MissingOperand,

    #[error("Operands are not separated by an operator")]
    DanglingOperand,

    #[error("Expression is empty")]
    EmptyExpression,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Mass must be nonzero")]
    ZeroMass,

    #[error("Invalid forcing term: {0}")]
    Parse(#[from] ParseError),

    #[error("Degenerate coefficient system: {what}")]
    NumericDegenerate { what: &'static str },

    #[error("Time value cannot be used as a sample key: {0}")]
    UnrepresentableTime(f64),

    #[error("Invalid time window: {what}")]
    InvalidWindow { what: &'static str },
}
