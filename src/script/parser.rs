//! Recursive descent parser for scripts

use super::ast::{BinaryOp, Expr, ExprKind, Stmt, UnaryOp};
use super::lexer::{tokenize, Token};
use super::{Position, Result, ScriptError};
use std::ops::Range;

pub struct Parser<'source> {
    source: &'source str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Parser {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        let mut program = Vec::new();
        while !self.at_end() {
            if self.eat(&Token::Semicolon) {
                continue;
            }
            program.push(self.parse_statement()?);
        }
        Ok(program)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let offset = self.offset();
        let declaration = match self.peek() {
            Some(Token::Let) | Some(Token::Var) => Some(false),
            Some(Token::Const) => Some(true),
            _ => None,
        };

        if let Some(constant) = declaration {
            self.pos += 1;
            let name = self.expect_ident()?;
            self.expect(&Token::Assign)?;
            let value = self.parse_expr()?;
            self.end_statement()?;
            return Ok(Stmt::Declare {
                name,
                value,
                constant,
                offset,
            });
        }

        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.peek(), self.peek_nth(1)) {
            let name = name.clone();
            self.pos += 2;
            let value = self.parse_expr()?;
            self.end_statement()?;
            return Ok(Stmt::Assign {
                name,
                value,
                offset,
            });
        }

        let expr = self.parse_expr()?;
        self.end_statement()?;
        Ok(Stmt::Expr(expr))
    }

    fn end_statement(&mut self) -> Result<()> {
        self.eat(&Token::Semicolon);
        Ok(())
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Plus) => {
                self.pos += 1;
                return self.parse_unary();
            }
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            offset,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let offset = self.offset();
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    let property = self.expect_property()?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        offset,
                    );
                }
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.parse_list(&Token::RParen, Self::parse_expr)?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        offset,
                    );
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        offset,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some((token, _)) = self.tokens.get(self.pos).cloned() else {
            return Err(self.syntax("unexpected end of input"));
        };
        self.pos += 1;
        let kind = match token {
            Token::Number(n) => ExprKind::Number(n),
            Token::Str(s) => ExprKind::Str(s),
            Token::True => ExprKind::Bool(true),
            Token::False => ExprKind::Bool(false),
            Token::Null => ExprKind::Null,
            Token::Ident(name) => ExprKind::Ident(name),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Token::LBracket => ExprKind::Array(self.parse_list(&Token::RBracket, Self::parse_expr)?),
            Token::LBrace => ExprKind::Object(self.parse_list(&Token::RBrace, Self::parse_field)?),
            other => {
                self.pos -= 1;
                return Err(self.syntax(format!("unexpected '{other}'")));
            }
        };
        Ok(Expr::new(kind, offset))
    }

    /// `key: value` or the shorthand `key`
    fn parse_field(&mut self) -> Result<(String, Expr)> {
        let offset = self.offset();
        let key = match self.tokens.get(self.pos).map(|(token, _)| token.clone()) {
            Some(Token::Ident(name)) => name,
            Some(Token::Str(s)) => s,
            Some(Token::Number(n)) => n.to_string(),
            _ => return Err(self.syntax("expected a property name")),
        };
        self.pos += 1;
        if self.eat(&Token::Colon) {
            return Ok((key, self.parse_expr()?));
        }
        Ok((key.clone(), Expr::new(ExprKind::Ident(key), offset)))
    }

    /// Comma separated items up to `close`; a trailing comma is allowed
    fn parse_list<T>(&mut self, close: &Token, item: fn(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(item(self)?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.syntax("expected an identifier")),
        }
    }

    /// Property names may be keywords, as in `pattern.set`
    fn expect_property(&mut self) -> Result<String> {
        let name = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            Some(keyword @ (Token::Let | Token::Const | Token::Var | Token::True | Token::False | Token::Null)) => {
                keyword.to_string()
            }
            _ => return Err(self.syntax("expected a property name")),
        };
        self.pos += 1;
        Ok(name)
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(found) => format!("'{found}'"),
            None => "end of input".to_string(),
        };
        Err(self.syntax(format!("expected '{token}', found {found}")))
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |(_, span)| span.start)
    }

    fn syntax(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            message: message.into(),
            position: Position::locate(self.source, self.offset()),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let offset = left.offset;
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        offset,
    )
}

/// Parse a whole script
pub fn parse_program(source: &str) -> Result<Vec<Stmt>> {
    Parser::new(source).parse()
}
