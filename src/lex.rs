// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    OpenParen,
    CloseParen,

    // unsupported tokens
    XComma,
    XGreater,
    XLess,
    XEqual,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident | Self::Number | Self::Op(_) | Self::OpenParen | Self::CloseParen => false,

            // unsupported tokens
            Self::XComma
            | Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `-` following this token starts an operand rather than
    /// subtracting from one.
    const fn expects_operand(&self) -> bool {
        matches!(self, Self::Op(_) | Self::OpenParen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>, // last token yielded, decides what '-' means
    has_errored: bool,    // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Exp),
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '-' => {
                if self.prev.map_or(true, |prev| prev.expects_operand()) {
                    TokTyp::Op(OperatorTyp::Neg)
                } else {
                    TokTyp::Op(OperatorTyp::Sub)
                }
            }

            ',' => TokTyp::XComma,
            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '=' => TokTyp::XEqual,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        };
        self.cur.next(); // consume because we only peeked
        Some(Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), idx, 1),
        })
    }

    pub fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), next_idx, 0),
        };
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                tok.loc.shift_right(chr.len_utf8());
                self.cur.next();
            } else {
                break;
            }
        }
        if tok.loc.is_empty() {
            // there is no next token of type `typ`
            None
        } else {
            Some(tok)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let ret = if let Some(tok) = self.consume_unambiguous() {
            Ok(tok)
        } else if let Some(tok) =
            // parse identifiers
            self.consume_by(next_idx, TokTyp::Ident, |chr| chr.is_ascii_alphabetic())
        {
            Ok(tok)
        } else if let Some(tok) = self.consume_by(next_idx, TokTyp::Number, |chr| {
            chr.is_ascii_digit() || chr == '.'
        }) {
            // parse numbers
            Ok(tok)
        } else {
            Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: SubStr::new(Arc::clone(self.src), next_idx, next_chr.len_utf8()),
            })
        };

        let ret = match ret {
            Ok(tok) if tok.typ.is_unsupported() => Err(LexErr {
                typ: LexErrTyp::Unsupported(tok.typ),
                loc: tok.loc,
            }),
            other => other,
        };
        match ret {
            Ok(ref tok) => self.prev = Some(tok.typ),
            Err(_) => self.has_errored = true,
        }
        Some(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typs(src: &str) -> Vec<Result<TokTyp, LexErrTyp>> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| tok.map(|tok| tok.typ).map_err(|err| err.typ))
            .collect()
    }

    #[test]
    fn minus_is_negation_only_where_an_operand_is_expected() {
        use OperatorTyp::{Neg, Sub};
        assert_eq!(
            typs("-x-1"),
            vec![
                Ok(TokTyp::Op(Neg)),
                Ok(TokTyp::Ident),
                Ok(TokTyp::Op(Sub)),
                Ok(TokTyp::Number),
            ]
        );
        assert_eq!(
            typs("2*(-x) - -3"),
            vec![
                Ok(TokTyp::Number),
                Ok(TokTyp::Op(OperatorTyp::Mul)),
                Ok(TokTyp::OpenParen),
                Ok(TokTyp::Op(Neg)),
                Ok(TokTyp::Ident),
                Ok(TokTyp::CloseParen),
                Ok(TokTyp::Op(Sub)),
                Ok(TokTyp::Op(Neg)),
                Ok(TokTyp::Number),
            ]
        );
    }

    #[test]
    fn identifiers_and_numbers_are_maximal_runs() {
        let src = Arc::new(String::from("  sqrt(12.5)+Xx"));
        let toks: Vec<Tok> = Lexer::new(&src).map(Result::unwrap).collect();
        let texts: Vec<&str> = toks.iter().map(|tok| tok.loc.get()).collect();
        assert_eq!(texts, ["sqrt", "(", "12.5", ")", "+", "Xx"]);
        assert_eq!(toks[2].loc.start(), 7);
    }

    #[test]
    fn unsupported_and_invalid_characters_stop_the_lexer() {
        assert_eq!(
            typs("x = 2"),
            vec![Ok(TokTyp::Ident), Err(LexErrTyp::Unsupported(TokTyp::XEqual))]
        );
        assert_eq!(typs("1 # 2"), vec![Ok(TokTyp::Number), Err(LexErrTyp::InvalidChar)]);
    }

    #[test]
    fn non_ascii_error_spans_whole_character() {
        let src = Arc::new(String::from("x²"));
        let err = Lexer::new(&src).nth(1).unwrap().unwrap_err();
        assert_eq!(err.loc.get(), "²");
    }
}
