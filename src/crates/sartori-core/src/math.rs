//! Numeric functions from the f64 standard library, exposed as patterns
//!
//! Called with no arguments an operator is a per-cycle generator
//! (`random()`). Otherwise the last argument is the subject and the operator
//! is applied to each of its values, with any leading arguments resolved
//! over the hap span and passed as extra operands: `pow(2, p)` squares `p`.

use crate::combinators::{cycle, wrap};
use crate::error::{PatternError, Result};
use crate::ops::with_value;
use crate::{Hap, Pattern, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atanh,
    Atan2,
    Cbrt,
    Ceil,
    Clz32,
    Cos,
    Cosh,
    Exp,
    Expm1,
    Floor,
    Fround,
    Hypot,
    Imul,
    Log,
    Log1p,
    Log10,
    Log2,
    Max,
    Min,
    Pow,
    Random,
    Round,
    Sign,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
    Trunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operands {
    Unary,
    Binary,
    Variadic,
}

impl MathOp {
    pub const ALL: [MathOp; 35] = [
        MathOp::Abs,
        MathOp::Acos,
        MathOp::Acosh,
        MathOp::Asin,
        MathOp::Asinh,
        MathOp::Atan,
        MathOp::Atanh,
        MathOp::Atan2,
        MathOp::Cbrt,
        MathOp::Ceil,
        MathOp::Clz32,
        MathOp::Cos,
        MathOp::Cosh,
        MathOp::Exp,
        MathOp::Expm1,
        MathOp::Floor,
        MathOp::Fround,
        MathOp::Hypot,
        MathOp::Imul,
        MathOp::Log,
        MathOp::Log1p,
        MathOp::Log10,
        MathOp::Log2,
        MathOp::Max,
        MathOp::Min,
        MathOp::Pow,
        MathOp::Random,
        MathOp::Round,
        MathOp::Sign,
        MathOp::Sin,
        MathOp::Sinh,
        MathOp::Sqrt,
        MathOp::Tan,
        MathOp::Tanh,
        MathOp::Trunc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MathOp::Abs => "abs",
            MathOp::Acos => "acos",
            MathOp::Acosh => "acosh",
            MathOp::Asin => "asin",
            MathOp::Asinh => "asinh",
            MathOp::Atan => "atan",
            MathOp::Atanh => "atanh",
            MathOp::Atan2 => "atan2",
            MathOp::Cbrt => "cbrt",
            MathOp::Ceil => "ceil",
            MathOp::Clz32 => "clz32",
            MathOp::Cos => "cos",
            MathOp::Cosh => "cosh",
            MathOp::Exp => "exp",
            MathOp::Expm1 => "expm1",
            MathOp::Floor => "floor",
            MathOp::Fround => "fround",
            MathOp::Hypot => "hypot",
            MathOp::Imul => "imul",
            MathOp::Log => "log",
            MathOp::Log1p => "log1p",
            MathOp::Log10 => "log10",
            MathOp::Log2 => "log2",
            MathOp::Max => "max",
            MathOp::Min => "min",
            MathOp::Pow => "pow",
            MathOp::Random => "random",
            MathOp::Round => "round",
            MathOp::Sign => "sign",
            MathOp::Sin => "sin",
            MathOp::Sinh => "sinh",
            MathOp::Sqrt => "sqrt",
            MathOp::Tan => "tan",
            MathOp::Tanh => "tanh",
            MathOp::Trunc => "trunc",
        }
    }

    pub fn from_name(name: &str) -> Option<MathOp> {
        MathOp::ALL.iter().copied().find(|op| op.name() == name)
    }

    fn operands(self) -> Operands {
        match self {
            MathOp::Atan2 | MathOp::Imul | MathOp::Pow => Operands::Binary,
            MathOp::Hypot | MathOp::Max | MathOp::Min | MathOp::Random => Operands::Variadic,
            _ => Operands::Unary,
        }
    }

    /// Apply to `x` with extra operands; `Random` is handled by the caller
    fn apply(self, x: f64, rest: &[f64]) -> f64 {
        let y = rest.first().copied().unwrap_or(f64::NAN);
        match self {
            MathOp::Abs => x.abs(),
            MathOp::Acos => x.acos(),
            MathOp::Acosh => x.acosh(),
            MathOp::Asin => x.asin(),
            MathOp::Asinh => x.asinh(),
            MathOp::Atan => x.atan(),
            MathOp::Atanh => x.atanh(),
            MathOp::Atan2 => x.atan2(y),
            MathOp::Cbrt => x.cbrt(),
            MathOp::Ceil => x.ceil(),
            MathOp::Clz32 => to_uint32(x).leading_zeros() as f64,
            MathOp::Cos => x.cos(),
            MathOp::Cosh => x.cosh(),
            MathOp::Exp => x.exp(),
            MathOp::Expm1 => x.exp_m1(),
            MathOp::Floor => x.floor(),
            MathOp::Fround => x as f32 as f64,
            MathOp::Hypot => rest.iter().fold(x * x, |sum, v| sum + v * v).sqrt(),
            MathOp::Imul => (to_uint32(x) as i32).wrapping_mul(to_uint32(y) as i32) as f64,
            MathOp::Log => x.ln(),
            MathOp::Log1p => x.ln_1p(),
            MathOp::Log10 => x.log10(),
            MathOp::Log2 => x.log2(),
            MathOp::Max => rest.iter().fold(x, |acc, v| acc.max(*v)),
            MathOp::Min => rest.iter().fold(x, |acc, v| acc.min(*v)),
            MathOp::Pow => x.powf(y),
            MathOp::Random => x,
            // Halves round towards positive infinity
            MathOp::Round => (x + 0.5).floor(),
            MathOp::Sign => {
                if x > 0.0 {
                    1.0
                } else if x < 0.0 {
                    -1.0
                } else {
                    x
                }
            }
            MathOp::Sin => x.sin(),
            MathOp::Sinh => x.sinh(),
            MathOp::Sqrt => x.sqrt(),
            MathOp::Tan => x.tan(),
            MathOp::Tanh => x.tanh(),
            MathOp::Trunc => x.trunc(),
        }
    }
}

/// Modular conversion to a 32-bit unsigned integer
fn to_uint32(x: f64) -> u32 {
    if !x.is_finite() {
        return 0;
    }
    x.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Build the pattern for `op` called with `args`
pub fn operate(op: MathOp, mut args: Vec<Value>) -> Result<Pattern> {
    if op == MathOp::Random && args.is_empty() {
        return Ok(cycle(|_, state| {
            vec![Hap::new(state.span, Value::Number(state.random.next_f64()))]
        }));
    }

    let Some(subject) = args.pop() else {
        return Err(PatternError::arity(op.name(), "at least 1", 0));
    };
    let modifiers = args;
    match op.operands() {
        Operands::Unary if !modifiers.is_empty() => {
            return Err(PatternError::arity(op.name(), "1", modifiers.len() + 1));
        }
        Operands::Binary if modifiers.len() != 1 => {
            return Err(PatternError::arity(op.name(), "2", modifiers.len() + 1));
        }
        _ => {}
    }

    Ok(with_value(modifiers, wrap(subject), move |operands, value, _, state| match op {
        MathOp::Random => Value::Number(state.random.next_f64()),
        MathOp::Atan2 | MathOp::Imul | MathOp::Pow => {
            value.zip_number(&operands[0], |x, y| op.apply(x, &[y]))
        }
        _ => {
            let rest: Vec<f64> = operands.iter().filter_map(Value::as_number).collect();
            value.map_number(|x| op.apply(x, &rest))
        }
    }))
}
