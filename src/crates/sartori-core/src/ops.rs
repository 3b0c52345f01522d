//! Value transformations built on [`with_value`]
//!
//! Every operator takes its modifiers first and the subject pattern last,
//! so `sub(2, p)` subtracts 2 from each value of `p`.

use crate::error::{PatternError, Result};
use crate::pattern::sample;
use crate::{Hap, Pattern, State, TimeSpan, Value};

/// Rebuild every hap value of `subject` from the modifiers resolved over
/// that hap's own span.
pub fn with_value<F>(modifiers: Vec<Value>, subject: Pattern, callback: F) -> Pattern
where
    F: Fn(&[Value], &Value, &TimeSpan, &State) -> Value + Send + Sync + 'static,
{
    Pattern::new(move |state| {
        subject
            .query(state)
            .into_iter()
            .map(|hap| {
                let resolved: Vec<Value> = modifiers
                    .iter()
                    .map(|modifier| sample(modifier, state, hap.from(), hap.to()))
                    .collect();
                let value = callback(&resolved, &hap.value, &hap.span, state);
                Hap::new(hap.span, value)
            })
            .collect()
    })
}

fn binary(modifier: Value, subject: Pattern, func: fn(f64, f64) -> f64) -> Pattern {
    with_value(vec![modifier], subject, move |args, value, _, _| {
        value.zip_number(&args[0], func)
    })
}

fn flag(test: bool) -> Value {
    Value::Number(if test { 1.0 } else { 0.0 })
}

fn compare(modifier: Value, subject: Pattern, func: fn(&Value, &Value) -> bool) -> Pattern {
    with_value(vec![modifier], subject, move |args, value, _, _| {
        flag(func(value, &args[0]))
    })
}

fn numeric_cmp(a: &Value, b: &Value, func: fn(f64, f64) -> bool) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => func(x, y),
        _ => false,
    }
}

pub fn add(amount: Value, subject: Pattern) -> Pattern {
    binary(amount, subject, |v, x| v + x)
}

pub fn sub(amount: Value, subject: Pattern) -> Pattern {
    binary(amount, subject, |v, x| v - x)
}

pub fn mul(amount: Value, subject: Pattern) -> Pattern {
    binary(amount, subject, |v, x| v * x)
}

pub fn div(amount: Value, subject: Pattern) -> Pattern {
    binary(amount, subject, |v, x| v / x)
}

/// Remainder with the sign of the dividend
pub fn modulo(amount: Value, subject: Pattern) -> Pattern {
    binary(amount, subject, |v, x| v % x)
}

pub fn lt(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| numeric_cmp(v, w, |a, b| a < b))
}

pub fn gt(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| numeric_cmp(v, w, |a, b| a > b))
}

pub fn eq(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| match (v.as_number(), w.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => v == w,
    })
}

pub fn neq(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| match (v.as_number(), w.as_number()) {
        (Some(a), Some(b)) => a != b,
        _ => v != w,
    })
}

pub fn and(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| v.is_truthy() && w.is_truthy())
}

pub fn or(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| v.is_truthy() || w.is_truthy())
}

pub fn xor(other: Value, subject: Pattern) -> Pattern {
    compare(other, subject, |v, w| v.is_truthy() != w.is_truthy())
}

pub fn not(subject: Pattern) -> Pattern {
    with_value(Vec::new(), subject, |_, value, _, _| flag(!value.is_truthy()))
}

/// Map values from `[in_min, in_max]` (default `[0, 1]`) onto `[out_min, out_max]`
pub fn mtr(args: Vec<Value>, subject: Pattern) -> Result<Pattern> {
    if !(2..=4).contains(&args.len()) {
        return Err(PatternError::arity("mtr", "2 to 4 range bounds and a pattern", args.len() + 1));
    }
    Ok(with_value(args, subject, |bounds, value, _, _| {
        let bound = |i: usize, default: f64| bounds.get(i).and_then(Value::as_number).unwrap_or(default);
        let (out_min, out_max) = (bound(0, 0.0), bound(1, 1.0));
        let (in_min, in_max) = (bound(2, 0.0), bound(3, 1.0));
        value.map_number(|v| out_min + (out_max - out_min) * ((v - in_min) / (in_max - in_min)))
    }))
}

/// Clamp values to `[min, max]`, defaulting to `[0, 1]`
pub fn clamp(args: Vec<Value>, subject: Pattern) -> Result<Pattern> {
    if args.len() > 2 {
        return Err(PatternError::arity("clamp", "up to 2 bounds and a pattern", args.len() + 1));
    }
    Ok(with_value(args, subject, |bounds, value, _, _| {
        let min = bounds.first().and_then(Value::as_number).unwrap_or(0.0);
        let max = bounds.get(1).and_then(Value::as_number).unwrap_or(1.0);
        value.map_number(|v| v.max(min).min(max))
    }))
}

/// Blend from the modifier towards the subject by the hap's position in its cycle
pub fn interp(other: Value, subject: Pattern) -> Pattern {
    with_value(vec![other], subject, |args, value, span, _| {
        let position = span.midpoint().rem_euclid(1.0);
        args[0].zip_number(value, |v, w| v + (w - v) * position)
    })
}

/// Replace values with 0 with probability `amount`
pub fn degrade(amount: Value, subject: Pattern) -> Pattern {
    with_value(vec![amount], subject, |args, value, _, state| {
        let probability = args[0].as_number().unwrap_or(0.0);
        if state.random.next_f64() < probability {
            Value::Number(0.0)
        } else {
            value.clone()
        }
    })
}
