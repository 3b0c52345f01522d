/// Errors raised while constructing patterns
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("{combinator}: factor must be a positive number, got {factor}")]
    InvalidFactor { combinator: String, factor: String },

    #[error("{combinator}: expected at least one value")]
    EmptyValues { combinator: String },

    #[error("euclid({pulses}, {steps}): pulses must lie between 0 and steps, and steps at most 1024")]
    InvalidEuclid { pulses: i64, steps: i64 },

    #[error("unknown combinator or operator '{0}'")]
    UnknownOperator(String),

    #[error("{combinator}: expected {expected} argument(s), got {found}")]
    Arity {
        combinator: String,
        expected: String,
        found: usize,
    },

    #[error("{combinator}: invalid argument {argument}")]
    InvalidArgument { combinator: String, argument: String },
}

impl PatternError {
    pub fn invalid_factor(combinator: impl Into<String>, factor: impl ToString) -> Self {
        PatternError::InvalidFactor {
            combinator: combinator.into(),
            factor: factor.to_string(),
        }
    }

    pub fn empty(combinator: impl Into<String>) -> Self {
        PatternError::EmptyValues {
            combinator: combinator.into(),
        }
    }

    pub fn arity(combinator: impl Into<String>, expected: impl Into<String>, found: usize) -> Self {
        PatternError::Arity {
            combinator: combinator.into(),
            expected: expected.into(),
            found,
        }
    }

    pub fn invalid_argument(combinator: impl Into<String>, argument: impl ToString) -> Self {
        PatternError::InvalidArgument {
            combinator: combinator.into(),
            argument: argument.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PatternError>;
