use crate::{TimeSpan, Value};

/// A Hap (happening) is a value active during a half-open span of cycles
#[derive(Debug, Clone, PartialEq)]
pub struct Hap {
    /// The span `[from, to)` this value occupies
    pub span: TimeSpan,

    /// The value of this event
    pub value: Value,
}

impl Hap {
    /// Create a new Hap with the given timespan and value
    pub fn new(span: TimeSpan, value: Value) -> Self {
        Hap { span, value }
    }

    /// Shorthand for `Hap::new(TimeSpan::new(from, to), value)`
    pub fn from_bounds(from: f64, to: f64, value: impl Into<Value>) -> Self {
        Hap::new(TimeSpan::new(from, to), value.into())
    }

    /// Start of the hap
    pub fn from(&self) -> f64 {
        self.span.begin
    }

    /// End of the hap
    pub fn to(&self) -> f64 {
        self.span.end
    }

    /// Return a new Hap with a transformed value
    pub fn with_value<F>(&self, func: F) -> Hap
    where
        F: FnOnce(&Value) -> Value,
    {
        Hap {
            span: self.span,
            value: func(&self.value),
        }
    }

    /// Return a new Hap with a transformed span
    pub fn with_span<F>(&self, func: F) -> Hap
    where
        F: FnOnce(&TimeSpan) -> TimeSpan,
    {
        Hap {
            span: func(&self.span),
            value: self.value.clone(),
        }
    }
}
