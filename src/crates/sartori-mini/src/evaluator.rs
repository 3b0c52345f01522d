//! Evaluator for the mini-notation tree
//!
//! Branch nodes are calls into the combinator library with their evaluated
//! items as arguments, so `"1 2 3"` builds exactly what `seq(1, 2, 3)` does.
use crate::ast::{Node, NodeKind};
use sartori_core::{library, Result, Value};

impl NodeKind {
    /// Library combinator a branch node calls, `None` for leaves
    pub fn combinator(&self) -> Option<&'static str> {
        match self {
            NodeKind::Seq | NodeKind::Spread => Some("seq"),
            NodeKind::Cat => Some("cat"),
            NodeKind::Choose => Some("choose"),
            NodeKind::Stack => Some("stack"),
            NodeKind::Number(_) | NodeKind::String(_) => None,
        }
    }
}

/// Evaluate a node bottom-up. Leaves become raw values.
pub fn evaluate(node: &Node) -> Result<Value> {
    match (&node.kind, node.kind.combinator()) {
        (NodeKind::Number(n), _) => Ok(Value::Number(*n)),
        (NodeKind::String(s), _) => Ok(Value::String(s.clone())),
        (_, Some(name)) => {
            let args = node.items.iter().map(evaluate).collect::<Result<Vec<_>>>()?;
            library::call(name, args)
        }
        (_, None) => Ok(Value::Silence),
    }
}
