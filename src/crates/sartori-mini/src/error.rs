use crate::span::Span;
use std::fmt;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    UnexpectedEof {
        expected: String,
    },
    InvalidNumber {
        value: String,
        span: Span,
    },
    InvalidRepeat {
        count: f64,
        span: Span,
    },
    InvalidEuclid {
        pulses: f64,
        steps: f64,
        span: Span,
    },
    Custom {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn unexpected_token(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
        }
    }

    pub fn invalid_number(value: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidNumber {
            value: value.into(),
            span,
        }
    }

    pub fn custom(message: impl Into<String>, span: Option<Span>) -> Self {
        ParseError::Custom {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            ParseError::UnexpectedEof { .. } => None,
            ParseError::InvalidNumber { span, .. } => Some(*span),
            ParseError::InvalidRepeat { span, .. } => Some(*span),
            ParseError::InvalidEuclid { span, .. } => Some(*span),
            ParseError::Custom { span, .. } => *span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, span } => {
                write!(f, "Expected {}, found {} at {}", expected, found, span)
            }
            ParseError::UnexpectedEof { expected } => {
                write!(f, "Unexpected end of input, expected {}", expected)
            }
            ParseError::InvalidNumber { value, span } => {
                write!(f, "Invalid number '{}' at {}", value, span)
            }
            ParseError::InvalidRepeat { count, span } => {
                write!(f, "Repeat count must be a positive integer, got {} at {}", count, span)
            }
            ParseError::InvalidEuclid { pulses, steps, span } => {
                write!(f, "Invalid euclidean rhythm {}:{} at {}", pulses, steps, span)
            }
            ParseError::Custom { message, span } => {
                if let Some(span) = span {
                    write!(f, "{} at {}", message, span)
                } else {
                    write!(f, "{}", message)
                }
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<sartori_core::PatternError> for ParseError {
    fn from(err: sartori_core::PatternError) -> Self {
        ParseError::custom(err.to_string(), None)
    }
}
