use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Node kinds produced by the mini-notation parser.
///
/// Branch kinds name the combinator their items are passed to; leaf kinds
/// carry a raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Seq,
    Cat,
    Choose,
    Stack,
    /// Items laid out over time, evaluated like `Seq`
    Spread,
    Number(f64),
    String(String),
}

/// A node of the mini-notation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub items: Vec<Node>,
    pub span: Span,
}

impl Node {
    pub fn branch(kind: NodeKind, items: Vec<Node>, span: Span) -> Self {
        Node { kind, items, span }
    }

    pub fn number(value: f64, span: Span) -> Self {
        Node::branch(NodeKind::Number(value), Vec::new(), span)
    }

    pub fn string(value: impl Into<String>, span: Span) -> Self {
        Node::branch(NodeKind::String(value.into()), Vec::new(), span)
    }

    /// Leaf numbers laid out as a `kind` node, all sharing `span`
    pub fn numbers(kind: NodeKind, values: &[f64], span: Span) -> Self {
        let items = values.iter().map(|v| Node::number(*v, span)).collect();
        Node::branch(kind, items, span)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Number(_) | NodeKind::String(_))
    }

    /// Wrap `items` in a `kind` node unless there is only one
    pub fn collapse(kind: NodeKind, mut items: Vec<Node>) -> Self {
        if items.len() == 1 {
            if let Some(only) = items.pop() {
                return only;
            }
        }
        let span = match (items.first(), items.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::default(),
        };
        Node::branch(kind, items, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_single_item() {
        let only = Node::number(1.0, Span::new(0, 1));
        assert_eq!(Node::collapse(NodeKind::Seq, vec![only.clone()]), only);
    }

    #[test]
    fn test_collapse_merges_spans() {
        let node = Node::collapse(
            NodeKind::Seq,
            vec![Node::string("bd", Span::new(0, 2)), Node::string("sd", Span::new(3, 5))],
        );
        assert_eq!(node.kind, NodeKind::Seq);
        assert_eq!(node.span, Span::new(0, 5));
    }

    #[test]
    fn test_serialize_shape() {
        let node = Node::numbers(NodeKind::Stack, &[60.0, 64.0], Span::new(0, 3));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "stack");
        assert_eq!(json["items"][1]["type"]["number"], 64.0);
    }
}
