//! Mini-notation inspection: validate, query and dump patterns

use sartori_core::{wrap, Hap, RandomSource, State, TimeSpan, Value};
use sartori_mini::{evaluate, parse, Node, ParseError};
use serde::Serialize;

use crate::script::Position;

/// A failure with its location in the pattern text
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct InspectError {
    pub message: String,
    pub location: Option<ErrorLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLocation {
    pub line: usize,
    pub column: usize,
    pub span_start: usize,
    pub span_end: usize,
}

impl InspectError {
    fn parse(source: &str, err: ParseError) -> Self {
        InspectError {
            message: err.to_string(),
            location: err.span().map(|span| {
                let Position { line, column } = Position::locate(source, span.start);
                ErrorLocation {
                    line,
                    column,
                    span_start: span.start,
                    span_end: span.end,
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerializableHap {
    pub from: f64,
    pub to: f64,
    pub value: Value,
}

impl From<Hap> for SerializableHap {
    fn from(hap: Hap) -> Self {
        SerializableHap {
            from: hap.from(),
            to: hap.to(),
            value: hap.value,
        }
    }
}

/// Parse without evaluating
pub fn parse_pattern(pattern: &str) -> Result<Node, InspectError> {
    parse(pattern).map_err(|err| InspectError::parse(pattern, err))
}

pub fn validate_pattern(pattern: &str) -> Result<(), InspectError> {
    evaluate(&parse_pattern(pattern)?).map_err(|err| InspectError {
        message: err.to_string(),
        location: None,
    })?;
    Ok(())
}

/// The haps of `pattern` over `[from, from + duration)`
pub fn evaluate_pattern(
    pattern: &str,
    from: f64,
    duration: f64,
    random: RandomSource,
) -> Result<Vec<SerializableHap>, InspectError> {
    let value = evaluate(&parse_pattern(pattern)?).map_err(|err| InspectError {
        message: err.to_string(),
        location: None,
    })?;
    let state = State::with_random(TimeSpan::new(from, from + duration), random);
    Ok(wrap(value)
        .query(&state)
        .into_iter()
        .map(SerializableHap::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_pattern() {
        let haps = evaluate_pattern("60 . 62 64 .", 0.0, 1.0, RandomSource::seeded(0)).unwrap();
        let spans: Vec<(f64, f64)> = haps.iter().map(|h| (h.from, h.to)).collect();
        assert_eq!(spans, vec![(0.0, 0.5), (0.5, 0.75), (0.75, 1.0)]);
        assert_eq!(haps[2].value, Value::from(64.0));
    }

    #[test]
    fn test_literal_repeats_each_cycle() {
        let haps = evaluate_pattern("7", 1.0, 2.0, RandomSource::seeded(0)).unwrap();
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[1].from, 2.0);
    }

    #[test]
    fn test_error_location() {
        let err = validate_pattern("1 2 ]").unwrap_err();
        let location = err.location.unwrap();
        assert_eq!((location.line, location.column), (1, 5));
        assert_eq!(location.span_start, 4);
    }

    #[test]
    fn test_parse_pattern_returns_tree() {
        let node = parse_pattern("1 2").unwrap();
        assert_eq!(node.items.len(), 2);
    }
}
