//! Tree-walking evaluation of scripts against a [`StreamPool`]

use super::ast::{BinaryOp, Expr, ExprKind, Stmt, UnaryOp};
use super::{Position, Result, ScriptError};
use crate::builtins;
use crate::stream::StreamPool;
use sartori_core::{PatternError, Value};
use std::collections::HashMap;
use tracing::trace;

/// Everything an expression can evaluate to
#[derive(Debug, Clone)]
enum Binding {
    Value(Value),
    Stream(String),
    Streams,
    Builtin(String),
    Object(Vec<(String, Value)>),
    /// A property looked up for calling, e.g. `s0.set` or `pattern.fast`
    Method { receiver: Box<Binding>, name: String },
}

impl Binding {
    fn describe(&self) -> String {
        match self {
            Binding::Value(value) => value.to_string(),
            Binding::Stream(id) => id.clone(),
            Binding::Streams => "streams".to_string(),
            Binding::Builtin(name) => name.clone(),
            Binding::Object(_) => "object".to_string(),
            Binding::Method { receiver, name } => format!("{}.{}", receiver.describe(), name),
        }
    }
}

struct Variable {
    binding: Binding,
    constant: bool,
}

pub struct Interpreter<'a> {
    source: &'a str,
    pool: &'a mut StreamPool,
    scope: HashMap<String, Variable>,
}

impl<'a> Interpreter<'a> {
    pub fn new(source: &'a str, pool: &'a mut StreamPool) -> Self {
        Interpreter {
            source,
            pool,
            scope: HashMap::new(),
        }
    }

    pub fn run(&mut self, program: &[Stmt]) -> Result<()> {
        for stmt in program {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Declare {
                name,
                value,
                constant,
                offset,
            } => {
                if self.scope.contains_key(name) {
                    return Err(self.invalid(*offset, format!("'{name}' is already declared")));
                }
                let binding = self.eval(value)?;
                trace!(name, constant, "declare");
                self.scope.insert(
                    name.clone(),
                    Variable {
                        binding,
                        constant: *constant,
                    },
                );
            }
            Stmt::Assign {
                name,
                value,
                offset,
            } => {
                match self.scope.get(name) {
                    None => {
                        return Err(ScriptError::UnknownIdentifier {
                            name: name.clone(),
                            position: self.position(*offset),
                        })
                    }
                    Some(variable) if variable.constant => {
                        return Err(self.invalid(*offset, format!("assignment to constant '{name}'")))
                    }
                    Some(_) => {}
                }
                let binding = self.eval(value)?;
                if let Some(variable) = self.scope.get_mut(name) {
                    variable.binding = binding;
                }
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Binding> {
        let offset = expr.offset;
        Ok(match &expr.kind {
            ExprKind::Number(n) => Binding::Value(Value::Number(*n)),
            ExprKind::Str(s) => Binding::Value(Value::String(s.clone())),
            ExprKind::Bool(b) => Binding::Value(Value::Bool(*b)),
            ExprKind::Null => Binding::Value(Value::Silence),
            ExprKind::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval_value(item))
                    .collect::<Result<Vec<_>>>()?;
                Binding::Value(Value::List(values))
            }
            ExprKind::Object(fields) => {
                let mut object = Vec::with_capacity(fields.len());
                for (key, value) in fields {
                    object.push((key.clone(), self.eval_value(value)?));
                }
                Binding::Object(object)
            }
            ExprKind::Ident(name) => self.lookup(name, offset)?,
            ExprKind::Member { object, property } => {
                let object = self.eval(object)?;
                self.member(object, property, offset)?
            }
            ExprKind::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval_value(index)?;
                self.index(object, &index, offset)?
            }
            ExprKind::Call { callee, args } => {
                let target = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.call(target, args, offset)?
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval_value(operand)?;
                Binding::Value(match (op, value) {
                    (UnaryOp::Neg, Value::Number(n)) => Value::Number(-n),
                    (UnaryOp::Neg, other) => self.builtin("mul", vec![Value::Number(-1.0), other], offset)?,
                    (UnaryOp::Not, Value::Pattern(pattern)) => {
                        self.builtin("not", vec![Value::Pattern(pattern)], offset)?
                    }
                    (UnaryOp::Not, other) => Value::Bool(!other.is_truthy()),
                })
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_value(left)?;
                let right = self.eval_value(right)?;
                Binding::Value(self.binary(*op, left, right, offset)?)
            }
        })
    }

    fn eval_value(&mut self, expr: &Expr) -> Result<Value> {
        let binding = self.eval(expr)?;
        self.to_value(binding, expr.offset)
    }

    fn to_value(&self, binding: Binding, offset: usize) -> Result<Value> {
        match binding {
            Binding::Value(value) => Ok(value),
            other => Err(self.invalid(offset, format!("{} is not a value", other.describe()))),
        }
    }

    fn lookup(&self, name: &str, offset: usize) -> Result<Binding> {
        if let Some(variable) = self.scope.get(name) {
            return Ok(variable.binding.clone());
        }
        if self.pool.contains(name) {
            return Ok(Binding::Stream(name.to_string()));
        }
        if name == "streams" {
            return Ok(Binding::Streams);
        }
        if builtins::is_builtin(name) {
            return Ok(Binding::Builtin(name.to_string()));
        }
        Err(ScriptError::UnknownIdentifier {
            name: name.to_string(),
            position: self.position(offset),
        })
    }

    fn member(&self, object: Binding, property: &str, offset: usize) -> Result<Binding> {
        match object {
            Binding::Stream(id) => match property {
                "set" | "reset" => Ok(Binding::Method {
                    receiver: Box::new(Binding::Stream(id)),
                    name: property.to_string(),
                }),
                "id" => Ok(Binding::Value(Value::String(id))),
                key => {
                    let stream = self.pool.get(&id).map(|stream| stream.get(key));
                    Ok(Binding::Value(stream.map_or(Value::Silence, Value::Pattern)))
                }
            },
            Binding::Streams if property == "length" => {
                Ok(Binding::Value(Value::Number(self.pool.instruments().len() as f64)))
            }
            Binding::Object(fields) => Ok(fields
                .into_iter()
                .find(|(key, _)| key == property)
                .map_or(Binding::Value(Value::Silence), |(_, value)| Binding::Value(value))),
            Binding::Value(Value::List(items)) if property == "length" => {
                Ok(Binding::Value(Value::Number(items.len() as f64)))
            }
            Binding::Value(value) if builtins::is_builtin(property) => Ok(Binding::Method {
                receiver: Box::new(Binding::Value(value)),
                name: property.to_string(),
            }),
            other => Err(self.invalid(
                offset,
                format!("{} has no property '{property}'", other.describe()),
            )),
        }
    }

    fn index(&self, object: Binding, index: &Value, offset: usize) -> Result<Binding> {
        let position = index
            .as_number()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .map(|n| n as usize);
        match (object, position) {
            (Binding::Streams, Some(i)) => self
                .pool
                .instruments()
                .get(i)
                .map(|stream| Binding::Stream(stream.id().to_string()))
                .ok_or_else(|| self.invalid(offset, format!("no stream at index {i}"))),
            (Binding::Value(Value::List(items)), Some(i)) => {
                Ok(Binding::Value(items.get(i).cloned().unwrap_or(Value::Silence)))
            }
            (Binding::Object(fields), _) => {
                let key = index.to_string();
                self.member(Binding::Object(fields), &key, offset)
            }
            (other, _) => Err(self.invalid(offset, format!("cannot index {} with {index}", other.describe()))),
        }
    }

    fn call(&mut self, target: Binding, args: Vec<Binding>, offset: usize) -> Result<Binding> {
        match target {
            Binding::Builtin(name) => {
                let args = self.values(args, offset)?;
                Ok(Binding::Value(self.builtin(&name, args, offset)?))
            }
            Binding::Stream(id) => self.set_stream(&id, args, offset),
            Binding::Method { receiver, name } => match *receiver {
                Binding::Stream(id) if name == "set" => self.set_stream(&id, args, offset),
                Binding::Stream(id) => {
                    if let Some(stream) = self.pool.get_mut(&id) {
                        stream.reset();
                    }
                    Ok(Binding::Stream(id))
                }
                Binding::Value(subject) => {
                    let mut args = self.values(args, offset)?;
                    args.push(subject);
                    Ok(Binding::Value(self.builtin(&name, args, offset)?))
                }
                other => Err(ScriptError::NotCallable {
                    target: format!("{}.{name}", other.describe()),
                    position: self.position(offset),
                }),
            },
            other => Err(ScriptError::NotCallable {
                target: other.describe(),
                position: self.position(offset),
            }),
        }
    }

    /// `sN.set({...})` and its shorthand `sN({...})`
    fn set_stream(&mut self, id: &str, args: Vec<Binding>, offset: usize) -> Result<Binding> {
        let mut params = Vec::new();
        for arg in args {
            match arg {
                Binding::Object(fields) => params.extend(fields),
                other => {
                    return Err(self.invalid(
                        offset,
                        format!("{id}.set expects an object, got {}", other.describe()),
                    ))
                }
            }
        }
        trace!(stream = id, keys = params.len(), "set");
        let position = self.position(offset);
        if let Some(stream) = self.pool.get_mut(id) {
            stream
                .set(params)
                .map_err(|error| ScriptError::Pattern { error, position })?;
        }
        Ok(Binding::Stream(id.to_string()))
    }

    fn binary(&self, op: BinaryOp, left: Value, right: Value, offset: usize) -> Result<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(op.apply(a, b))),
            (Value::String(a), Value::String(b)) if op == BinaryOp::Add => Ok(Value::String(a + &b)),
            (left, right) => self.builtin(op.combinator(), vec![right, left], offset),
        }
    }

    fn builtin(&self, name: &str, args: Vec<Value>, offset: usize) -> Result<Value> {
        builtins::call(name, args).map_err(|error| self.pattern_error(error, offset))
    }

    fn values(&self, args: Vec<Binding>, offset: usize) -> Result<Vec<Value>> {
        args.into_iter()
            .map(|arg| self.to_value(arg, offset))
            .collect()
    }

    fn position(&self, offset: usize) -> Position {
        Position::locate(self.source, offset)
    }

    fn invalid(&self, offset: usize, message: String) -> ScriptError {
        ScriptError::InvalidOperation {
            message,
            position: self.position(offset),
        }
    }

    fn pattern_error(&self, error: PatternError, offset: usize) -> ScriptError {
        ScriptError::Pattern {
            error,
            position: self.position(offset),
        }
    }
}
