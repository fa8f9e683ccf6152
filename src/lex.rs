// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

/// A span of source text. Offsets are in bytes.
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

    /// Number of characters preceding the span, for aligning diagnostics.
    pub fn column(&self) -> usize {
        self.src[..self.start].chars().count()
    }

    /// Width of the span in characters.
    pub fn width(&self) -> usize {
        self.get().chars().count()
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }

    /// Span covering both `self` and `other`, which must share a source.
    pub fn join(&self, other: &Self) -> Self {
        let start = self.start.min(other.start);
        let end = (self.start + self.len).max(other.start + other.len);
        Self::new(self.src(), start, end - start)
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
    Imag, // number with an `i` suffix, like `4i`
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
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
            Self::Ident
            | Self::Number
            | Self::Imag
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            // unsupported tokens
            Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a `+` or `-` following this token is a prefix operator.
    const fn expects_operand(prev: Option<Self>) -> bool {
        matches!(
            prev,
            None | Some(Self::Op(_)) | Some(Self::Comma) | Some(Self::OpenParen)
        )
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
    prev: Option<TokTyp>, // decides between unary and binary `+`/`-`
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

    pub fn src(&self) -> Arc<String> {
        Arc::clone(self.src)
    }

    fn span(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
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
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

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
            loc: self.span(idx, chr.len_utf8()),
        })
    }

    /// Consumes the longest run of characters matching `predicate`.
    pub fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = Tok {
            typ,
            loc: self.span(next_idx, 0),
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

    /// Extends a just-lexed number by an exponent like `e-3` or `E12`. The
    /// `e` is left alone unless digits follow it.
    fn consume_exponent(&mut self, tok: &mut Tok) {
        let mut ahead = self.cur.clone();
        if !matches!(ahead.next(), Some((_, 'e' | 'E'))) {
            return;
        }
        let mut len = 1;
        if let Some((_, sign @ ('+' | '-'))) = ahead.peek().copied() {
            ahead.next();
            len += sign.len_utf8();
        }
        if !matches!(ahead.peek(), Some((_, chr)) if chr.is_ascii_digit()) {
            return;
        }
        while let Some((_, chr)) = ahead.peek().copied() {
            if chr.is_ascii_digit() {
                ahead.next();
                len += 1;
            } else {
                break;
            }
        }
        self.cur = ahead;
        tok.loc.shift_right(len);
    }

    /// Turns a just-lexed number into an imaginary literal if an `i` follows
    /// it directly and does not start a longer identifier.
    fn consume_imag_suffix(&mut self, tok: &mut Tok) {
        if let Some((_, 'i')) = self.cur.peek().copied() {
            let mut ahead = self.cur.clone();
            ahead.next();
            let ends_here = ahead
                .peek()
                .map(|(_, chr)| !chr.is_alphanumeric())
                .unwrap_or(true);
            if ends_here {
                self.cur.next();
                tok.typ = TokTyp::Imag;
                tok.loc.shift_right(1);
            }
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
        } else if next_chr == '-' || next_chr == '+' {
            // distinguish subtraction from negation
            self.cur.next();
            let prefix = TokTyp::expects_operand(self.prev);
            let typ = match (next_chr, prefix) {
                ('-', true) => TokTyp::Op(OperatorTyp::Neg),
                ('-', false) => TokTyp::Op(OperatorTyp::Sub),
                (_, true) => TokTyp::Op(OperatorTyp::Pos),
                (_, false) => TokTyp::Op(OperatorTyp::Add),
            };
            Ok(Tok {
                typ,
                loc: self.span(next_idx, 1),
            })
        } else if let Some(tok) =
            // parse identifiers
            self.consume_by(next_idx, TokTyp::Ident, char::is_alphabetic)
        {
            Ok(tok)
        } else if let Some(mut tok) = self.consume_by(next_idx, TokTyp::Number, |chr| {
            chr.is_ascii_digit() || chr == '.'
        }) {
            // parse numbers
            self.consume_exponent(&mut tok);
            self.consume_imag_suffix(&mut tok);
            Ok(tok)
        } else {
            Err(LexErr {
                typ: LexErrTyp::InvalidChar,
                loc: self.span(next_idx, next_chr.len_utf8()),
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
