use logos::{FilterResult, Logos};
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("let")]
    Let,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    #[token("undefined")]
    Null,

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", number)]
    #[regex(r"\.[0-9]+", number)]
    Number(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, string)]
    #[regex(r"'([^'\\\n]|\\.)*'", string)]
    #[regex(r"`([^`\\]|\\.)*`", string)]
    Str(String),

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    /// Skipped by its callback, never emitted
    #[token("/*", block_comment)]
    BlockComment,

    Error,
}

fn number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Consume up to and including the closing `*/`
fn block_comment(lex: &mut logos::Lexer<Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

/// Strip the quotes and resolve the common escapes
fn string(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Let => write!(f, "let"),
            Token::Const => write!(f, "const"),
            Token::Var => write!(f, "var"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Str(s) => write!(f, "'{s}'"),
            Token::Ident(name) => write!(f, "{name}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::BlockComment => write!(f, "/*"),
            Token::Error => write!(f, "invalid token"),
        }
    }
}

/// Lex the whole source up front; scripts are short
pub fn tokenize(source: &str) -> Vec<(Token, Range<usize>)> {
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| (token.unwrap_or(Token::Error), span))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|(token, _)| token).collect()
    }

    #[test]
    fn test_statement() {
        assert_eq!(
            tokens("s0.set({ e: '1 0' })"),
            vec![
                Token::Ident("s0".into()),
                Token::Dot,
                Token::Ident("set".into()),
                Token::LParen,
                Token::LBrace,
                Token::Ident("e".into()),
                Token::Colon,
                Token::Str("1 0".into()),
                Token::RBrace,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("1 // one\n/* two\n */ 3"),
            vec![Token::Number(1.0), Token::Number(3.0)]
        );
    }

    #[test]
    fn test_block_comments_with_stars() {
        assert_eq!(
            tokens("/**/ 1 /* a * b ** c */ * /*\n * doc\n **/ 2"),
            vec![Token::Number(1.0), Token::Star, Token::Number(2.0)]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(tokens("1 /* open"), vec![Token::Number(1.0), Token::Error]);
    }

    #[test]
    fn test_strings_and_numbers() {
        assert_eq!(
            tokens(r#""a\"b" `c d` .5 2e2"#),
            vec![
                Token::Str("a\"b".into()),
                Token::Str("c d".into()),
                Token::Number(0.5),
                Token::Number(200.0),
            ]
        );
    }

    #[test]
    fn test_keywords_and_spans() {
        let lexed = tokenize("let x = true");
        assert_eq!(lexed[0].0, Token::Let);
        assert_eq!(lexed[1], (Token::Ident("x".into()), 4..5));
        assert_eq!(lexed[3].0, Token::True);
    }

    #[test]
    fn test_invalid_character() {
        assert!(tokens("1 # 2").contains(&Token::Error));
    }
}
