//! The builtin functions visible to scripts

use sartori_core::library;
use sartori_core::{PatternError, Value};

/// Parses its string argument as mini-notation
pub const MINI: &str = "mini";

pub fn is_builtin(name: &str) -> bool {
    name == MINI || library::is_builtin(name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    std::iter::once(MINI).chain(library::names())
}

/// Call a builtin. String arguments are read as mini-notation first.
pub fn call(name: &str, args: Vec<Value>) -> Result<Value, PatternError> {
    if name == MINI {
        return match args.as_slice() {
            [Value::String(source)] => {
                sartori_mini::mini(source).map_err(|err| PatternError::invalid_argument(MINI, err))
            }
            [other] => Ok(other.clone()),
            _ => Err(PatternError::arity(MINI, "1", args.len())),
        };
    }

    let args = args
        .into_iter()
        .map(|arg| match arg {
            Value::String(source) => sartori_mini::coerce(&source),
            other => other,
        })
        .collect();
    library::call(name, args)
}
