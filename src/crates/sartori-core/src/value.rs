use crate::Pattern;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a value carried by a hap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Number value
    Number(f64),
    /// String value (instrument names, sample names, etc.)
    String(String),
    /// Boolean value
    Bool(bool),
    /// List of values, e.g. the notes of a chord
    List(Vec<Value>),
    /// A nested pattern, expanded lazily over the hap's own span
    #[serde(skip)]
    Pattern(Pattern),
    /// Silence/rest
    Silence,
}

impl Value {
    /// Check if this value is silence
    pub fn is_silence(&self) -> bool {
        matches!(self, Value::Silence)
    }

    /// Try to extract a number. Booleans count as 1 and 0.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Try to extract a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to extract a nested pattern
    pub fn as_pattern(&self) -> Option<&Pattern> {
        match self {
            Value::Pattern(pattern) => Some(pattern),
            _ => None,
        }
    }

    /// Truthiness used by triggers and boolean combinators
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty() && s != "~",
            Value::Bool(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Pattern(_) => true,
            Value::Silence => false,
        }
    }

    /// Apply a numeric function, mapping over lists element-wise.
    /// Non-numeric values pass through untouched.
    pub fn map_number<F>(&self, func: F) -> Value
    where
        F: Fn(f64) -> f64 + Copy,
    {
        match self {
            Value::List(items) => Value::List(items.iter().map(|v| v.map_number(func)).collect()),
            other => match other.as_number() {
                Some(n) => Value::Number(func(n)),
                None => other.clone(),
            },
        }
    }

    /// Combine two values numerically, broadcasting over lists on either side
    pub fn zip_number<F>(&self, other: &Value, func: F) -> Value
    where
        F: Fn(f64, f64) -> f64 + Copy,
    {
        match (self, other) {
            (Value::List(items), _) => {
                Value::List(items.iter().map(|v| v.zip_number(other, func)).collect())
            }
            (_, Value::List(items)) => {
                Value::List(items.iter().map(|w| self.zip_number(w, func)).collect())
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => Value::Number(func(a, b)),
                _ => self.clone(),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Pattern(_) => write!(f, "<pattern>"),
            Value::Silence => write!(f, "~"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}

impl From<Pattern> for Value {
    fn from(pattern: Pattern) -> Self {
        Value::Pattern(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        let v1 = Value::from(42.0);
        assert_eq!(v1.as_number(), Some(42.0));

        let v2 = Value::from("bd");
        assert_eq!(v2.as_string(), Some("bd"));

        let v3 = Value::Silence;
        assert!(v3.is_silence());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from(42.0).to_string(), "42");
        assert_eq!(Value::from("bd").to_string(), "bd");
        assert_eq!(Value::from(vec![Value::from(60), Value::from(64)]).to_string(), "[60, 64]");
        assert_eq!(Value::Silence.to_string(), "~");
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::from(1).is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("~").is_truthy());
        assert!(Value::from("bd").is_truthy());
        assert!(!Value::Silence.is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_zip_number_broadcasts_over_chords() {
        let chord = Value::from(vec![Value::from(60), Value::from(64), Value::from(67)]);
        let shifted = chord.zip_number(&Value::from(12), |a, b| a + b);
        assert_eq!(
            shifted,
            Value::from(vec![Value::from(72), Value::from(76), Value::from(79)])
        );

        let word = Value::from("synth");
        assert_eq!(word.zip_number(&Value::from(1), |a, b| a + b), word);
    }

    #[test]
    fn test_serializes_plain() {
        let value = Value::from(vec![Value::from(1.5), Value::from("bd")]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[1.5,"bd"]"#);
    }
}
