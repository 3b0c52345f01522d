use crate::ast::{Node, NodeKind};
use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token};
use crate::span::Span;
use crate::theory;
use sartori_core::euclid::euclid;

/// Upper bound on items produced by `*N`, `|*N` and `a..b`
pub const MAX_REPEAT: usize = 1024;

/// Recursive-descent parser for mini-notation
pub struct Parser<'source> {
    lexer: Lexer<'source>,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Parser {
            lexer: Lexer::new(source),
        }
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> Result<Node> {
        let node = self.parse_choice()?;
        if let Some((token, span)) = self.lexer.next_token() {
            return Err(ParseError::unexpected_token("end of input", token.to_string(), span));
        }
        Ok(node)
    }

    fn peek(&mut self) -> Option<Token> {
        self.lexer.peek_token().map(|(token, _)| token)
    }

    fn next(&mut self, expected: &str) -> Result<(Token, Span)> {
        self.lexer
            .next_token()
            .ok_or_else(|| ParseError::unexpected_eof(expected))
    }

    fn expect(&mut self, expected: Token) -> Result<Span> {
        let (token, span) = self.next(&expected.to_string())?;
        if token != expected {
            return Err(ParseError::unexpected_token(expected.to_string(), token.to_string(), span));
        }
        Ok(span)
    }

    /// Whether the token after the next one can begin a term here
    fn primary_follows(&mut self, inside_dots: bool) -> bool {
        match self.lexer.peek_nth(1) {
            Some((token, _)) => token.starts_primary() && !(inside_dots && token == Token::Dot),
            None => false,
        }
    }

    /// Bars separated by `|`, with `|*N` repeating the previous bar
    fn parse_choice(&mut self) -> Result<Node> {
        let mut bars = vec![self.parse_sequence(false)?];

        while self.peek() == Some(Token::Pipe) {
            self.next("|")?;

            let repeat = if self.peek() == Some(Token::Star) {
                self.next("*")?;
                Some(self.parse_count()?)
            } else {
                None
            };

            let next_bar = match self.peek() {
                Some(token) if token.starts_primary() => Some(self.parse_sequence(false)?),
                _ => None,
            };

            if let (Some(total), Some(previous)) = (repeat, bars.last().cloned()) {
                for _ in 1..total {
                    bars.push(previous.clone());
                }
            }
            bars.extend(next_bar);

            if bars.len() > MAX_REPEAT {
                return Err(ParseError::custom("too many bars", None));
            }
        }

        Ok(Node::collapse(NodeKind::Cat, bars))
    }

    /// Whitespace-separated terms. Inside `. … .` a dot ends the sequence.
    fn parse_sequence(&mut self, inside_dots: bool) -> Result<Node> {
        let mut terms = Vec::new();

        while let Some((token, _)) = self.lexer.peek_token() {
            if !token.starts_primary() || (inside_dots && token == Token::Dot) {
                break;
            }
            terms.push(self.parse_term(inside_dots)?);
        }

        if terms.is_empty() {
            return Err(match self.lexer.peek_token() {
                Some((token, span)) => ParseError::unexpected_token("a pattern", token.to_string(), span),
                None => ParseError::unexpected_eof("a pattern"),
            });
        }

        Ok(Node::collapse(NodeKind::Seq, terms))
    }

    /// `a?b?c` choices and `x*N` repeats
    fn parse_term(&mut self, inside_dots: bool) -> Result<Node> {
        let mut options = vec![self.parse_primary()?];
        while self.peek() == Some(Token::Question) && self.primary_follows(inside_dots) {
            self.next("?")?;
            options.push(self.parse_primary()?);
        }
        let base = Node::collapse(NodeKind::Choose, options);

        if self.peek() != Some(Token::Star) {
            return Ok(base);
        }
        self.next("*")?;
        let count = self.parse_count()?;
        let span = base.span;
        Ok(Node::branch(NodeKind::Seq, vec![base; count], span))
    }

    /// A positive integer count after `*`
    fn parse_count(&mut self) -> Result<usize> {
        let (token, span) = self.next("a repeat count")?;
        match token {
            Token::Number(n) if n >= 1.0 && n.fract() == 0.0 && n as usize <= MAX_REPEAT => Ok(n as usize),
            Token::Number(count) => Err(ParseError::InvalidRepeat { count, span }),
            other => Err(ParseError::unexpected_token("a repeat count", other.to_string(), span)),
        }
    }

    fn parse_number(&mut self, expected: &str) -> Result<(f64, Span)> {
        match self.next(expected)? {
            (Token::Number(n), span) => Ok((n, span)),
            (other, span) => Err(ParseError::unexpected_token(expected, other.to_string(), span)),
        }
    }

    fn parse_primary(&mut self) -> Result<Node> {
        let (token, span) = self.next("a pattern")?;
        let text = self.lexer.slice(span);

        match token {
            Token::Number(n) => match self.peek() {
                Some(Token::Colon) => self.parse_euclid(n, span),
                Some(Token::DotDot) if matches!(self.lexer.peek_nth(1), Some((Token::Number(_), _))) => {
                    self.parse_range(n, span)
                }
                _ => Ok(Node::number(n, span)),
            },
            Token::Note => Ok(note(text, span)),
            Token::Chord => self.parse_chord(text, span),
            Token::Word | Token::DigitWord | Token::Rest => Ok(Node::string(text, span)),
            Token::LBracket => self.parse_stack_array(span),
            Token::LParen => {
                let inner = self.parse_choice()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Dot => {
                let inner = self.parse_sequence(true)?;
                let end = self.expect(Token::Dot)?;
                let items = match inner.kind {
                    NodeKind::Seq => inner.items,
                    _ => vec![inner],
                };
                Ok(Node::branch(NodeKind::Seq, items, span.merge(end)))
            }
            other => Err(ParseError::unexpected_token("a pattern", other.to_string(), span)),
        }
    }

    /// `pulses:steps`
    fn parse_euclid(&mut self, pulses: f64, start: Span) -> Result<Node> {
        self.expect(Token::Colon)?;
        let (steps, end) = self.parse_number("a step count")?;
        let span = start.merge(end);
        let invalid = ParseError::InvalidEuclid { pulses, steps, span };

        if pulses.fract() != 0.0 || steps.fract() != 0.0 || steps < 1.0 || steps as usize > MAX_REPEAT {
            return Err(invalid);
        }
        let rhythm = euclid(pulses as i64, steps as i64).map_err(|_| invalid)?;
        let values: Vec<f64> = rhythm.into_iter().map(|p| if p { 1.0 } else { 0.0 }).collect();
        Ok(Node::numbers(NodeKind::Seq, &values, span))
    }

    /// `a..b`, inclusive and stepping by one in either direction
    fn parse_range(&mut self, from: f64, start: Span) -> Result<Node> {
        self.expect(Token::DotDot)?;
        let (to, end) = self.parse_number("a range end")?;
        let span = start.merge(end);

        if from.fract() != 0.0 || to.fract() != 0.0 {
            return Err(ParseError::invalid_number(span.slice(self.lexer.source()), span));
        }
        let length = (to - from).abs() + 1.0;
        if length > MAX_REPEAT as f64 {
            return Err(ParseError::custom("range too long", Some(span)));
        }
        let length = length as usize;
        let step = if to < from { -1.0 } else { 1.0 };
        let values: Vec<f64> = (0..length).map(|i| from + step * i as f64).collect();

        let kind = if self.take_random_modifier() {
            NodeKind::Choose
        } else {
            NodeKind::Spread
        };
        Ok(Node::numbers(kind, &values, span))
    }

    /// Chord or scale with optional `..` (spread) and `?` (random) modifiers.
    /// Symbols that do not name a known chord are plain words.
    fn parse_chord(&mut self, text: &str, span: Span) -> Result<Node> {
        let Some(notes) = chord_notes(text) else {
            return Ok(Node::string(text, span));
        };

        let spread = self.peek() == Some(Token::DotDot);
        let mut span = span;
        if spread {
            span = span.merge(self.expect(Token::DotDot)?);
        }

        let kind = if self.take_random_modifier() {
            NodeKind::Choose
        } else if spread {
            NodeKind::Spread
        } else {
            NodeKind::Stack
        };
        Ok(Node::numbers(kind, &notes, span))
    }

    /// Consume a `?` unless it introduces another choice
    fn take_random_modifier(&mut self) -> bool {
        if self.peek() == Some(Token::Question) && !self.primary_follows(false) {
            self.lexer.next_token();
            return true;
        }
        false
    }

    /// `[n, n, ...]` of numbers or notes
    fn parse_stack_array(&mut self, open: Span) -> Result<Node> {
        let mut values = Vec::new();
        loop {
            let (token, span) = self.next("a number")?;
            let value = match token {
                Token::Number(n) => n,
                Token::Note => match note(self.lexer.slice(span), span).kind {
                    NodeKind::Number(n) => n,
                    _ => return Err(ParseError::invalid_number(self.lexer.slice(span), span)),
                },
                other => return Err(ParseError::unexpected_token("a number", other.to_string(), span)),
            };
            values.push(value);

            let (token, span) = self.next("',' or ']'")?;
            match token {
                Token::Comma => continue,
                Token::RBracket => return Ok(Node::numbers(NodeKind::Stack, &values, open.merge(span))),
                other => return Err(ParseError::unexpected_token("',' or ']'", other.to_string(), span)),
            }
        }
    }
}

/// `C4` style note to its MIDI number; unknown names stay words
fn note(text: &str, span: Span) -> Node {
    let split = text.find(|c: char| c.is_ascii_digit()).unwrap_or(text.len());
    let (name, octave) = text.split_at(split);
    match octave.parse().ok().and_then(|octave| theory::midi_note(name, octave)) {
        Some(midi) => Node::number(midi, span),
        None => Node::string(text, span),
    }
}

/// Resolve a chord symbol such as `Ebmi7` or `Clyd%8` to MIDI notes
fn chord_notes(text: &str) -> Option<Vec<f64>> {
    let (symbol, length) = match text.split_once('%') {
        Some((symbol, n)) => (symbol, Some(n.parse::<usize>().ok().filter(|n| (1..=MAX_REPEAT).contains(n))?)),
        None => (text, None),
    };

    let has_accidental = matches!(symbol.as_bytes().get(1), Some(b'#' | b'b'));
    let root_lengths: &[usize] = if has_accidental { &[2, 1] } else { &[1] };

    let notes = root_lengths.iter().find_map(|&root_len| {
        let (root, tail) = symbol.split_at(root_len);
        let letters = tail.find(|c: char| !c.is_ascii_lowercase()).unwrap_or(tail.len());
        let (mut kind, mut ext) = tail.split_at(letters);

        // `mab9` reads as `ma` + `b9`
        if theory::intervals(kind).is_none() && kind.ends_with('b') && ext.starts_with(|c: char| c.is_ascii_digit()) {
            (kind, ext) = tail.split_at(letters - 1);
        }
        let ext = (!ext.is_empty()).then_some(ext);
        theory::chord(root, kind, ext)
    })?;

    Some(match length {
        Some(length) => theory::expand(&notes, length),
        None => notes,
    })
}

/// Parse a mini-notation string
pub fn parse(source: &str) -> Result<Node> {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(node: &Node) -> Vec<NodeKind> {
        node.items.iter().map(|item| item.kind.clone()).collect()
    }

    fn leaves(node: &Node) -> Vec<f64> {
        node.items
            .iter()
            .filter_map(|item| match item.kind {
                NodeKind::Number(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_single_number() {
        assert_eq!(parse("1").unwrap().kind, NodeKind::Number(1.0));
        assert_eq!(parse("-2.5").unwrap().kind, NodeKind::Number(-2.5));
    }

    #[test]
    fn test_parse_sequence() {
        let node = parse("1 2 3 4").unwrap();
        assert_eq!(node.kind, NodeKind::Seq);
        assert_eq!(leaves(&node), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_parse_words() {
        let node = parse("808bd hello 080.wav").unwrap();
        assert_eq!(
            kinds(&node),
            vec![
                NodeKind::String("808bd".into()),
                NodeKind::String("hello".into()),
                NodeKind::String("080.wav".into())
            ]
        );
    }

    #[test]
    fn test_parse_repeat() {
        let node = parse("1 2*3 1").unwrap();
        let repeated = &node.items[1];
        assert_eq!(repeated.kind, NodeKind::Seq);
        assert_eq!(leaves(repeated), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_parse_dot_group() {
        let node = parse("1 . 1 2 3 . 1").unwrap();
        assert_eq!(node.items.len(), 3);
        assert_eq!(leaves(&node.items[1]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_bars() {
        let node = parse("1 1 1 | 1 2 3").unwrap();
        assert_eq!(node.kind, NodeKind::Cat);
        assert_eq!(node.items.len(), 2);

        let repeated = parse("1 2 |*3 4").unwrap();
        assert_eq!(repeated.items.len(), 4);
        assert_eq!(repeated.items[2], repeated.items[0]);
        assert_eq!(repeated.items[3].kind, NodeKind::Number(4.0));
    }

    #[test]
    fn test_parse_choose() {
        let node = parse("1?2?3?4").unwrap();
        assert_eq!(node.kind, NodeKind::Choose);
        assert_eq!(leaves(&node), vec![1.0, 2.0, 3.0, 4.0]);

        let repeated = parse("1?2*4").unwrap();
        assert_eq!(repeated.kind, NodeKind::Seq);
        assert!(repeated.items.iter().all(|item| item.kind == NodeKind::Choose));
        assert_eq!(repeated.items.len(), 4);
    }

    #[test]
    fn test_parse_stack_array() {
        let node = parse("[1,2,3] [C4, E4]").unwrap();
        assert_eq!(leaves(&node.items[0]), vec![1.0, 2.0, 3.0]);
        assert_eq!(node.items[1].kind, NodeKind::Stack);
        assert_eq!(leaves(&node.items[1]), vec![60.0, 64.0]);
    }

    #[test]
    fn test_parse_notes() {
        assert_eq!(leaves(&parse("C4 D4 E4 F4").unwrap()), vec![60.0, 62.0, 64.0, 65.0]);
    }

    #[test]
    fn test_parse_chords() {
        let node = parse("Cma").unwrap();
        assert_eq!(node.kind, NodeKind::Stack);
        assert_eq!(leaves(&node), vec![60.0, 64.0, 67.0]);

        assert!(leaves(&parse("Cma7").unwrap()).contains(&71.0));
        assert_eq!(leaves(&parse("Ebmi").unwrap()), vec![63.0, 66.0, 70.0]);
        assert_eq!(leaves(&parse("Cmab9").unwrap()), vec![60.0, 64.0, 67.0, 61.0]);
        assert_eq!(leaves(&parse("Clyd%8").unwrap()), vec![60.0, 62.0, 64.0, 66.0, 67.0, 69.0, 71.0, 72.0]);
    }

    #[test]
    fn test_parse_chord_modifiers() {
        assert_eq!(parse("Cma..").unwrap().kind, NodeKind::Spread);
        assert_eq!(parse("Cma?").unwrap().kind, NodeKind::Choose);
        assert_eq!(parse("Cma..?").unwrap().kind, NodeKind::Choose);

        let choice = parse("Cma?Dmi").unwrap();
        assert_eq!(choice.kind, NodeKind::Choose);
        assert_eq!(kinds(&choice), vec![NodeKind::Stack, NodeKind::Stack]);
    }

    #[test]
    fn test_unknown_chord_is_a_word() {
        assert_eq!(parse("Bass").unwrap().kind, NodeKind::String("Bass".into()));
    }

    #[test]
    fn test_parse_euclid() {
        let node = parse("3:8").unwrap();
        assert_eq!(leaves(&node), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert!(matches!(parse("9:8"), Err(ParseError::InvalidEuclid { .. })));
        assert!(matches!(parse("1.5:8"), Err(ParseError::InvalidEuclid { .. })));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse("60..63").unwrap().kind, NodeKind::Spread);
        assert_eq!(leaves(&parse("60..63").unwrap()), vec![60.0, 61.0, 62.0, 63.0]);
        assert_eq!(leaves(&parse("3..1").unwrap()), vec![3.0, 2.0, 1.0]);
        assert_eq!(parse("60..72?").unwrap().kind, NodeKind::Choose);
    }

    #[test]
    fn test_parse_group() {
        let node = parse("1 (2 | 3)").unwrap();
        assert_eq!(node.items[1].kind, NodeKind::Cat);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(""), Err(ParseError::UnexpectedEof { .. })));
        assert!(matches!(parse("1*0"), Err(ParseError::InvalidRepeat { .. })));
        assert!(matches!(parse("1*2.5"), Err(ParseError::InvalidRepeat { .. })));
        assert!(matches!(parse("(1 2"), Err(ParseError::UnexpectedEof { .. })));
        assert!(matches!(parse("1 ]"), Err(ParseError::UnexpectedToken { .. })));
        assert!(parse("bd $").is_err());
    }
}
