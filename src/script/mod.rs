//! A small sandboxed script language for driving streams
//!
//! Scripts are a JavaScript-like subset: literals, `let`/`const`
//! bindings, calls, method chains, object literals and arithmetic. The
//! only free identifiers are the stream pool, `streams` and the builtin
//! combinators, so a script can describe patterns but cannot reach
//! anything else.
//!
//! ```
//! use sartori::script::run;
//! use sartori::stream::StreamPool;
//!
//! let mut pool = StreamPool::default();
//! run("s0.set({ e: '1 0 1 1', n: seq(60, 64).add(12) })", &mut pool).unwrap();
//! assert!(pool.get("s0").unwrap().contains("n"));
//! ```

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;

pub use interpreter::Interpreter;
pub use parser::parse_program;

use crate::stream::StreamPool;
use sartori_core::PatternError;
use std::fmt;

/// 1-based line and column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn locate(source: &str, offset: usize) -> Position {
        let offset = offset.min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Position {
            line,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: Position },

    #[error("unknown identifier '{name}' at {position}")]
    UnknownIdentifier { name: String, position: Position },

    #[error("{target} is not callable (at {position})")]
    NotCallable { target: String, position: Position },

    #[error("invalid operation at {position}: {message}")]
    InvalidOperation { message: String, position: Position },

    #[error("{error} (at {position})")]
    Pattern { error: PatternError, position: Position },
}

impl ScriptError {
    pub fn position(&self) -> Position {
        match self {
            ScriptError::Syntax { position, .. }
            | ScriptError::UnknownIdentifier { position, .. }
            | ScriptError::NotCallable { position, .. }
            | ScriptError::InvalidOperation { position, .. }
            | ScriptError::Pattern { position, .. } => *position,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// Parse and run `source` against `pool`
pub fn run(source: &str, pool: &mut StreamPool) -> Result<()> {
    let program = parse_program(source)?;
    Interpreter::new(source, pool).run(&program)
}
