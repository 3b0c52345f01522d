use crate::span::Span;
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    #[regex(r"-?[0-9]+(\.[0-9]+)?", parse_number, priority = 10)]
    Number(f64),

    // C4, D#3, Bb2
    #[regex(r"[A-G][#b]?[0-9]+", priority = 8)]
    Note,

    // Cma, Ebmi7, Clyd%8, Cma#11
    #[regex(r"[A-G][#b]?[a-z]+[0-9#b]*(%[0-9]+)?", priority = 6)]
    Chord,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_-]*(\.[a-zA-Z0-9_-]+)*")]
    Word,

    // 808bd, 080.wav
    #[regex(r"[0-9]+[a-zA-Z_-][a-zA-Z0-9_-]*(\.[a-zA-Z0-9_-]+)*")]
    #[regex(r"[0-9]+(\.[0-9]+)*\.[a-zA-Z_-][a-zA-Z0-9_-]*(\.[a-zA-Z0-9_-]+)*")]
    DigitWord,

    #[token("~")]
    Rest,

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("*")]
    Star,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,

    Error,
}

fn parse_number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

impl Token {
    /// Whether this token can begin a primary term
    pub fn starts_primary(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Note
                | Token::Chord
                | Token::Word
                | Token::DigitWord
                | Token::Rest
                | Token::LBracket
                | Token::LParen
                | Token::Dot
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Note => write!(f, "note"),
            Token::Chord => write!(f, "chord"),
            Token::Word | Token::DigitWord => write!(f, "word"),
            Token::Rest => write!(f, "~"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::Star => write!(f, "*"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::DotDot => write!(f, ".."),
            Token::Error => write!(f, "error"),
        }
    }
}

/// Lexer wrapper with one token of lookahead beyond the next
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Vec<(Token, Span)>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: Vec::new(),
        }
    }

    fn pull(&mut self) -> Option<(Token, Span)> {
        let token = self.inner.next()?;
        let span = Span::from(self.inner.span());
        Some((token.unwrap_or(Token::Error), span))
    }

    pub fn next_token(&mut self) -> Option<(Token, Span)> {
        if !self.peeked.is_empty() {
            return Some(self.peeked.remove(0));
        }
        self.pull()
    }

    /// Look `n` tokens ahead without consuming (`0` is the next token)
    pub fn peek_nth(&mut self, n: usize) -> Option<(Token, Span)> {
        while self.peeked.len() <= n {
            let token = self.pull()?;
            self.peeked.push(token);
        }
        self.peeked.get(n).cloned()
    }

    pub fn peek_token(&mut self) -> Option<(Token, Span)> {
        self.peek_nth(0)
    }

    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    pub fn slice(&self, span: Span) -> &'source str {
        span.slice(self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some((token, _)) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_lex_words() {
        assert_eq!(
            lex("bd 808bd 080.wav synth_1"),
            vec![Token::Word, Token::DigitWord, Token::DigitWord, Token::Word]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(
            lex("1 2.5 -3"),
            vec![Token::Number(1.0), Token::Number(2.5), Token::Number(-3.0)]
        );
    }

    #[test]
    fn test_lex_notes_and_chords() {
        assert_eq!(lex("C4 Bb2 Cma7 Clyd%8"), vec![Token::Note, Token::Note, Token::Chord, Token::Chord]);
        assert_eq!(lex("Cb4"), vec![Token::Note]);
        assert_eq!(lex("Amen_break"), vec![Token::Word]);
    }

    #[test]
    fn test_lex_operators() {
        assert_eq!(
            lex("1?2*4 3:8 | . 60..72"),
            vec![
                Token::Number(1.0),
                Token::Question,
                Token::Number(2.0),
                Token::Star,
                Token::Number(4.0),
                Token::Number(3.0),
                Token::Colon,
                Token::Number(8.0),
                Token::Pipe,
                Token::Dot,
                Token::Number(60.0),
                Token::DotDot,
                Token::Number(72.0),
            ]
        );
    }

    #[test]
    fn test_lex_spread_chord() {
        assert_eq!(lex("Cma.."), vec![Token::Chord, Token::DotDot]);
    }

    #[test]
    fn test_lex_unknown_character() {
        assert_eq!(lex("bd $"), vec![Token::Word, Token::Error]);
    }

    #[test]
    fn test_lexer_slice_and_peek() {
        let mut lexer = Lexer::new("bd sd cp");
        let (_, second) = lexer.peek_nth(1).unwrap();
        assert_eq!(lexer.slice(second), "sd");

        let (token, span) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Word);
        assert_eq!(lexer.slice(span), "bd");
        assert_eq!(lexer.next_token().map(|(_, s)| s), Some(second));
    }
}
