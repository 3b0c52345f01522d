/// An expression with the byte offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Ident(String),
    Member { object: Box<Expr>, property: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// The builtin that applies this operator to patterns
    pub fn combinator(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Mod => a % b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let`/`var` (mutable) or `const` binding
    Declare {
        name: String,
        value: Expr,
        constant: bool,
        offset: usize,
    },
    Assign {
        name: String,
        value: Expr,
        offset: usize,
    },
    Expr(Expr),
}

impl Expr {
    pub fn new(kind: ExprKind, offset: usize) -> Self {
        Expr { kind, offset }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match &self.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Member { object, property } => format!("{}.{}", object.describe(), property),
            ExprKind::Call { callee, .. } => format!("{}(...)", callee.describe()),
            ExprKind::Number(n) => n.to_string(),
            ExprKind::Str(s) => format!("'{s}'"),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Null => "null".to_string(),
            ExprKind::Array(_) => "array".to_string(),
            ExprKind::Object(_) => "object".to_string(),
            ExprKind::Index { object, .. } => format!("{}[...]", object.describe()),
            ExprKind::Unary { .. } | ExprKind::Binary { .. } => "expression".to_string(),
        }
    }
}
