//! Mini-notation parser and evaluator for Sartori
//!
//! Mini-notation is a terse string syntax for rhythmic and melodic
//! patterns. A parsed string evaluates to exactly the pattern the
//! equivalent combinator calls would build.
//!
//! # Examples
//!
//! ```
//! use sartori_mini::{coerce, mini};
//! use sartori_core::Value;
//!
//! let pattern = mini("bd [1,2,3] Cma7").unwrap();
//! assert!(pattern.as_pattern().is_some());
//!
//! // Strings that do not parse stay literal
//! assert_eq!(coerce("not ) valid"), Value::from("not ) valid"));
//! ```
//!
//! # Syntax
//!
//! - Sequences: `a b c`
//! - Bars, one per cycle: `a b | c d`, with `|*N` repeating the previous bar
//! - Repeats: `a*4`
//! - Random choice: `a?b?c`
//! - Sub-sequences: `a . b c . d` or `a (b c)`
//! - Simultaneous numbers: `[60, 64, 67]`
//! - Euclidean rhythms: `3:8`
//! - Ranges: `60..72`, or `60..72?` for a random pick
//! - Notes: `C4` (= 60)
//! - Chords and scales: `Cma`, `Ebmi7`, `Clyd%8`, spread over time with
//!   `Cma..`, or one random note with `Cma?`

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod theory;

pub use ast::{Node, NodeKind};
pub use error::{ParseError, Result};
pub use evaluator::evaluate;
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser};
pub use span::Span;

use sartori_core::Value;
use tracing::debug;

/// Parse and evaluate a mini-notation string
pub fn mini(source: &str) -> Result<Value> {
    let node = parse(source)?;
    Ok(evaluate(&node)?)
}

/// Permissive entry point: the evaluated pattern, or the literal string
/// when `source` is not valid mini-notation
pub fn coerce(source: &str) -> Value {
    match mini(source) {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, source, "keeping literal string");
            Value::String(source.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coerce_literal_fallback() {
        assert_eq!(coerce("a ) b"), Value::from("a ) b"));
        assert_eq!(coerce(""), Value::from(""));
        assert_eq!(coerce("9:8"), Value::from("9:8"));
    }

    #[test]
    fn test_coerce_valid() {
        assert_eq!(coerce("7"), Value::from(7.0));
        assert!(coerce("bd sd").as_pattern().is_some());
    }

    proptest! {
        #[test]
        fn prop_coerce_never_panics(source in "\\PC{0,24}") {
            let _ = coerce(&source);
        }

        #[test]
        fn prop_number_sequences_have_one_item_per_number(numbers in proptest::collection::vec(-500i32..500, 2..12)) {
            let source: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
            let node = parse(&source.join(" ")).unwrap();
            prop_assert_eq!(node.kind, NodeKind::Seq);
            prop_assert_eq!(node.items.len(), numbers.len());
        }
    }
}
