//! Name-based dispatch over every combinator
//!
//! This is the table the script interpreter calls into. Arguments are
//! positional with the subject pattern last, so the method form `p.add(2)`
//! is `call("add", [2, p])`.

use crate::combinators::{cat, choose, fast, seq, set, silence, slow, stack, wrap};
use crate::control::{cache, count, cps, ctms, cts, current_cycle, every, falls_on_from, ifelse, toggle};
use crate::error::{PatternError, Result};
use crate::euclid::euclid;
use crate::math::{operate, MathOp};
use crate::ops;
use crate::probability::{coin, often, rarely, sometimes, weighted_coin};
use crate::signal::{waveform, Waveform};
use crate::{Pattern, Value};

/// Every builtin name other than the math operators
pub const COMBINATORS: &[&str] = &[
    "cat", "set", "seq", "choose", "stack", "fast", "slow", "add", "sub", "mul", "div", "mod", "lt",
    "gt", "eq", "neq", "and", "or", "xor", "not", "mtr", "scale", "clamp", "interp", "degrade", "saw",
    "range", "ramp", "sine", "cosine", "tri", "pulse", "square", "noise", "weightedCoin", "coin",
    "sometimes", "rarely", "often", "toggle", "count", "cache", "fallsOnFrom", "every", "ifelse",
    "ie", "c", "cps", "cts", "ctms", "euclid",
];

/// Whether `name` resolves to a builtin
pub fn is_builtin(name: &str) -> bool {
    COMBINATORS.contains(&name) || MathOp::from_name(name).is_some()
}

/// All builtin names, combinators first
pub fn names() -> impl Iterator<Item = &'static str> {
    COMBINATORS
        .iter()
        .copied()
        .chain(MathOp::ALL.iter().map(|op| op.name()))
}

fn exactly(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(PatternError::arity(name, expected.to_string(), args.len()));
    }
    Ok(())
}

/// Split `args` into leading modifiers and the trailing subject
fn subject(name: &str, mut args: Vec<Value>) -> Result<(Vec<Value>, Pattern)> {
    match args.pop() {
        Some(last) => Ok((args, wrap(last))),
        None => Err(PatternError::arity(name, "at least 1", 0)),
    }
}

fn binary(name: &str, args: Vec<Value>, op: fn(Value, Pattern) -> Pattern) -> Result<Pattern> {
    exactly(name, &args, 2)?;
    let (mut modifiers, pattern) = subject(name, args)?;
    Ok(op(modifiers.remove(0), pattern))
}

fn unary(name: &str, args: Vec<Value>) -> Result<Value> {
    exactly(name, &args, 1)?;
    let mut args = args;
    Ok(args.remove(0))
}

fn rhythm(args: &[Value]) -> Result<Pattern> {
    exactly("euclid", args, 2)?;
    let count = |value: &Value| {
        value
            .as_number()
            .filter(|n| n.is_finite() && n.abs() <= crate::euclid::MAX_STEPS as f64)
            .map(|n| n as i64)
            .ok_or_else(|| PatternError::invalid_argument("euclid", value))
    };
    let steps = euclid(count(&args[0])?, count(&args[1])?)?;
    if steps.is_empty() {
        return Ok(silence());
    }
    seq(steps
        .into_iter()
        .map(|pulse| Value::Number(if pulse { 1.0 } else { 0.0 }))
        .collect())
}

/// Call the builtin `name` with positional `args`
pub fn call(name: &str, args: Vec<Value>) -> Result<Value> {
    let pattern = match name {
        "cat" => cat(args)?,
        "set" => set(args)?,
        "seq" => seq(args)?,
        "choose" => choose(args)?,
        "stack" => stack(args)?,
        "fast" | "slow" => {
            exactly(name, &args, 2)?;
            let (mut factor, pattern) = subject(name, args)?;
            let factor = factor.remove(0);
            if name == "fast" {
                fast(factor, pattern)?
            } else {
                slow(factor, pattern)?
            }
        }
        "add" => binary(name, args, ops::add)?,
        "sub" => binary(name, args, ops::sub)?,
        "mul" => binary(name, args, ops::mul)?,
        "div" => binary(name, args, ops::div)?,
        "mod" => binary(name, args, ops::modulo)?,
        "lt" => binary(name, args, ops::lt)?,
        "gt" => binary(name, args, ops::gt)?,
        "eq" => binary(name, args, ops::eq)?,
        "neq" => binary(name, args, ops::neq)?,
        "and" => binary(name, args, ops::and)?,
        "or" => binary(name, args, ops::or)?,
        "xor" => binary(name, args, ops::xor)?,
        "interp" => binary(name, args, ops::interp)?,
        "degrade" => binary(name, args, ops::degrade)?,
        "not" => ops::not(wrap(unary(name, args)?)),
        "mtr" | "scale" => {
            let (bounds, pattern) = subject(name, args)?;
            ops::mtr(bounds, pattern)?
        }
        "clamp" => {
            let (bounds, pattern) = subject(name, args)?;
            ops::clamp(bounds, pattern)?
        }
        "weightedCoin" => weighted_coin(args.into_iter().next().unwrap_or(Value::Number(0.5))),
        "coin" => coin(),
        "sometimes" => sometimes(),
        "rarely" => rarely(),
        "often" => often(),
        "toggle" => toggle(unary(name, args)?),
        "count" => count(unary(name, args)?),
        "cache" => {
            if args.is_empty() || args.len() > 3 {
                return Err(PatternError::arity(name, "1 to 3", args.len()));
            }
            let mut args = args;
            let source = args.pop().unwrap_or(Value::Silence);
            let mut leading = args.into_iter();
            let size = leading.next().unwrap_or(Value::Number(0.0));
            cache(size, leading.next(), source)
        }
        "fallsOnFrom" => falls_on_from(wrap(unary(name, args)?)),
        "every" => every(unary(name, args)?)?,
        "ifelse" | "ie" => {
            exactly(name, &args, 3)?;
            let mut args = args.into_iter();
            let mut next = || args.next().unwrap_or(Value::Silence);
            let (then, otherwise, condition) = (next(), next(), next());
            ifelse(then, otherwise, condition)
        }
        "c" => current_cycle(),
        "cps" => cps(),
        "cts" => cts(unary(name, args)?),
        "ctms" => ctms(unary(name, args)?),
        "euclid" => rhythm(&args)?,
        other => {
            if let Some(kind) = Waveform::from_name(other) {
                waveform(kind, args)?
            } else if let Some(op) = MathOp::from_name(other) {
                operate(op, args)?
            } else {
                return Err(PatternError::UnknownOperator(other.to_string()));
            }
        }
    };
    Ok(Value::Pattern(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbers, state};

    fn query(value: Value, from: f64, to: f64) -> Vec<f64> {
        numbers(&value.as_pattern().unwrap().query(&state(from, to)))
    }

    fn n(values: &[f64]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_every_name_dispatches() {
        for name in names() {
            assert!(is_builtin(name), "{name}");
            if let Err(PatternError::UnknownOperator(_)) = call(name, n(&[1.0])) {
                panic!("{name} is listed but not dispatched");
            }
        }
    }

    #[test]
    fn test_subject_is_last() {
        let pattern = call("seq", n(&[5.0, 6.0])).unwrap();
        let shifted = call("sub", vec![Value::from(2.0), pattern]).unwrap();
        assert_eq!(query(shifted, 0.0, 1.0), vec![3.0, 4.0]);
    }

    #[test]
    fn test_raw_subject_is_wrapped() {
        let squared = call("pow", n(&[2.0, 3.0])).unwrap();
        assert_eq!(query(squared, 0.0, 1.0), vec![9.0]);
    }

    #[test]
    fn test_euclid_pattern() {
        let rhythm = call("euclid", n(&[3.0, 8.0])).unwrap();
        assert_eq!(query(rhythm, 0.0, 1.0), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_euclid_step_limit() {
        assert!(matches!(
            call("euclid", n(&[1.0, 1e12])),
            Err(PatternError::InvalidArgument { .. })
        ));
        assert!(matches!(
            call("euclid", n(&[1.0, 1025.0])),
            Err(PatternError::InvalidEuclid { .. })
        ));
        assert!(call("euclid", n(&[1.0, 1024.0])).is_ok());
    }

    #[test]
    fn test_cache_arguments() {
        let source = call("seq", n(&[1.0, 2.0])).unwrap();
        let cached = call("cache", vec![Value::from(2.0), source]).unwrap();
        assert_eq!(query(cached, 0.0, 1.0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(call("nope", vec![]).unwrap_err(), PatternError::UnknownOperator("nope".into()));
        assert!(matches!(call("add", n(&[1.0])), Err(PatternError::Arity { .. })));
        assert!(matches!(call("seq", vec![]), Err(PatternError::EmptyValues { .. })));
        assert!(matches!(call("fast", n(&[0.0, 1.0])), Err(PatternError::InvalidFactor { .. })));
    }
}
