// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Expression, Fun, Ident, Idents, Operation, OperationTyp, OperatorTyp},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    Complex, Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    NumOutOfRange,
    ParenMismatch,
    StrayComma,
    UndefinedIdent,
    Grouping {
        found: usize,
    },
    Arity {
        name: &'static str,
        min: usize,
        max: usize,
        found: usize,
    },
    Empty,
    MissingArgs {
        name: &'static str,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::NumOutOfRange => write!(f, "number is too large"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::StrayComma => write!(f, "comma outside of a function call"),
            Self::UndefinedIdent => write!(f, "undefined identifier"),

            Self::Grouping { found } => write!(
                f,
                "expected 1 expression inside parentheses but found {found}"
            ),

            Self::Arity {
                name,
                min,
                max,
                found,
            } => {
                let s = if *max == 1 { "" } else { "s" };
                if min == max {
                    write!(
                        f,
                        "function '{name}' takes {min} argument{s}, but found {found}"
                    )
                } else {
                    write!(
                        f,
                        "function '{name}' takes {min} to {max} argument{s}, but found {found}"
                    )
                }
            }

            Self::Empty => write!(f, "cannot compile empty expression"),

            Self::MissingArgs { name, arity, found } => write!(
                f,
                "'{name}' requires {arity} operand{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),

            Self::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} value{s} after evaluation but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.typ, self.loc)
    }
}

impl std::error::Error for ParseErr {}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun(Fun),
    OpenParen { args: usize },
}

#[derive(Clone, Debug)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    /// `None` for parentheses, which are never popped by precedence.
    fn precedence(&self) -> Option<i8> {
        match self.typ {
            ShuntOpTyp::Operator(op) => Some(op.precedence()),
            // see https://softwareengineering.stackexchange.com/questions/290043/precedence-of-function-in-shunting-yard-algorithm
            ShuntOpTyp::Fun(_) => Some(i8::MAX),
            ShuntOpTyp::OpenParen { .. } => None,
        }
    }

    const fn is_paren(&self) -> bool {
        matches!(self.typ, ShuntOpTyp::OpenParen { .. })
    }

    /// Output form of an operator left on the stack. A function reaching
    /// this point was written without parentheses, so it takes one argument.
    fn into_output(self) -> Result<Operation, ParseErr> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(op) => OperationTyp::Call {
                fun: op.fun(),
                argc: op.arity(),
            },
            ShuntOpTyp::Fun(fun) => call(fun, 1, &self.loc)?,
            ShuntOpTyp::OpenParen { .. } => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc: self.loc,
                })
            }
        };
        Ok(Operation { typ, loc: self.loc })
    }
}

fn call(fun: Fun, argc: usize, loc: &SubStr) -> Result<OperationTyp, ParseErr> {
    if fun.accepts(argc) {
        Ok(OperationTyp::Call { fun, argc })
    } else {
        Err(ParseErr {
            typ: ParseErrTyp::Arity {
                name: fun.name,
                min: fun.min_args,
                max: fun.max_args,
                found: argc,
            },
            loc: loc.clone(),
        })
    }
}

fn pop_while<P>(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>, pred: P) -> Result<(), ParseErr>
where
    P: Fn(&ShuntOp) -> bool,
{
    while ops.last().map_or(false, &pred) {
        if let Some(op) = ops.pop() {
            out.push(op.into_output()?);
        }
    }
    Ok(())
}

fn parse_literal(tok: &Tok) -> Result<Complex, ParseErr> {
    let text = tok.loc.get();
    let (digits, imag) = match tok.typ {
        TokTyp::Imag => (text.strip_suffix('i').unwrap_or(text), true),
        _ => (text, false),
    };
    let num: Number = digits.parse().map_err(|err| ParseErr {
        typ: ParseErrTyp::ParseNum(err),
        loc: tok.loc.clone(),
    })?;
    if !num.is_finite() {
        return Err(ParseErr {
            typ: ParseErrTyp::NumOutOfRange,
            loc: tok.loc.clone(),
        });
    }
    Ok(if imag {
        Complex::new(0.0, num)
    } else {
        Complex::new(num, 0.0)
    })
}

/// Simulates the stack depth of `ops` so malformed programs are rejected
/// before they are ever evaluated.
fn check(ops: &[Operation], src: &SubStr) -> Result<(), ParseErr> {
    if ops.is_empty() {
        return Err(ParseErr {
            typ: ParseErrTyp::Empty,
            loc: src.clone(),
        });
    }

    let mut depth: usize = 0;
    for op in ops {
        match op.typ {
            OperationTyp::Val(_) | OperationTyp::Var => depth += 1,
            OperationTyp::Call { fun, argc } => {
                if depth < argc {
                    return Err(ParseErr {
                        typ: ParseErrTyp::MissingArgs {
                            name: fun.name,
                            arity: argc,
                            found: depth,
                        },
                        loc: op.loc.clone(),
                    });
                }
                depth = depth - argc + 1;
            }
        }
    }

    if depth == 1 {
        Ok(())
    } else {
        Err(ParseErr {
            typ: ParseErrTyp::StackMismatch {
                expected: 1,
                found: depth,
            },
            loc: src.clone(),
        })
    }
}

pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Expression, ParseErr> {
    let src = lex.src();
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack
    let mut lex = lex.peekable();

    while let Some(tok) = lex.next() {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number | TokTyp::Imag => {
                let val = parse_literal(&tok)?;
                out.push(Operation {
                    typ: OperationTyp::Val(val),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => match idents.get(&tok.loc.clone().into()) {
                Some(Ident::Const(val)) => out.push(Operation {
                    typ: OperationTyp::Val(*val),
                    loc: tok.loc,
                }),
                Some(Ident::Var) => out.push(Operation {
                    typ: OperationTyp::Var,
                    loc: tok.loc,
                }),
                Some(Ident::Fun(fun)) => ops.push(ShuntOp {
                    typ: ShuntOpTyp::Fun(*fun),
                    loc: tok.loc,
                }),
                None => {
                    return Err(ParseErr {
                        typ: ParseErrTyp::UndefinedIdent,
                        loc: tok.loc,
                    })
                }
            },

            TokTyp::Op(o1) => {
                // a prefix operator has nothing on its left to bind
                if !o1.is_prefix() {
                    pop_while(&mut ops, &mut out, |o2| match o2.precedence() {
                        Some(p2) => {
                            (p2 > o1.precedence())
                                || ((p2 == o1.precedence())
                                    && (o1.associativity() == Associativity::Left))
                        }
                        None => false,
                    })?;
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::Comma => {
                pop_while(&mut ops, &mut out, |op| !op.is_paren())?;
                match ops.last_mut() {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::OpenParen { args },
                        ..
                    }) => *args += 1,
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::StrayComma,
                            loc: tok.loc,
                        })
                    }
                }
            }

            TokTyp::OpenParen => {
                let empty = matches!(
                    lex.peek(),
                    Some(Ok(Tok {
                        typ: TokTyp::CloseParen,
                        ..
                    }))
                );
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen {
                        args: if empty { 0 } else { 1 },
                    },
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                pop_while(&mut ops, &mut out, |op| !op.is_paren())?;

                let (args, open) = match ops.pop() {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::OpenParen { args },
                        loc,
                    }) => (args, loc),
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc,
                        })
                    }
                };

                // handle functions
                if let Some(ShuntOp {
                    typ: ShuntOpTyp::Fun(fun),
                    loc,
                }) = ops.last().cloned()
                {
                    ops.pop();
                    out.push(Operation {
                        typ: call(fun, args, &loc)?,
                        loc,
                    });
                } else if args != 1 {
                    return Err(ParseErr {
                        typ: ParseErrTyp::Grouping { found: args },
                        loc: open.join(&tok.loc),
                    });
                }
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => {
                return Err(ParseErr {
                    typ: ParseErrTyp::LexErr(LexErrTyp::Unsupported(tok.typ)),
                    loc: tok.loc,
                })
            }
        }
    }

    while let Some(op) = ops.pop() {
        out.push(op.into_output()?);
    }

    check(&out, &SubStr::all(std::sync::Arc::clone(&src)))?;
    Ok(Expression::new(src, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, stdlib};
    use std::sync::Arc;

    fn err(src: &str) -> ParseErr {
        compile(src).expect_err("compiled successfully")
    }

    #[test]
    fn rejects_dangling_paren() {
        let e = err("not an expression (");
        // identifiers are resolved before parentheses are matched
        assert!(matches!(e.typ, ParseErrTyp::UndefinedIdent), "{e}");
        assert_eq!(e.loc.get(), "not");

        let e = err("sin(z");
        assert!(matches!(e.typ, ParseErrTyp::ParenMismatch), "{e}");
        assert_eq!(e.loc.get(), "(");

        let e = err("z)");
        assert!(matches!(e.typ, ParseErrTyp::ParenMismatch), "{e}");
        assert_eq!(e.loc.get(), ")");
    }

    #[test]
    fn rejects_unknown_symbols() {
        let e = err("sinh(z) + foo(z)");
        assert!(matches!(e.typ, ParseErrTyp::UndefinedIdent), "{e}");
        assert_eq!(e.loc.get(), "foo");
        assert_eq!(e.loc.start(), 10);
    }

    #[test]
    fn checks_function_arity() {
        let e = err("sin(z, 2)");
        assert!(
            matches!(
                e.typ,
                ParseErrTyp::Arity {
                    name: "sin",
                    found: 2,
                    ..
                }
            ),
            "{e}"
        );
        let e = err("log()");
        assert!(matches!(e.typ, ParseErrTyp::Arity { found: 0, .. }), "{e}");
        assert!(compile("log(z, 10)").is_ok());
        assert!(compile("log(z)").is_ok());
    }

    #[test]
    fn checks_operands() {
        let e = err("z +");
        assert!(
            matches!(e.typ, ParseErrTyp::MissingArgs { name: "add", .. }),
            "{e}"
        );

        // implicit multiplication
        let e = err("2z");
        assert!(
            matches!(
                e.typ,
                ParseErrTyp::StackMismatch {
                    expected: 1,
                    found: 2
                }
            ),
            "{e}"
        );

        let e = err("   ");
        assert!(matches!(e.typ, ParseErrTyp::Empty), "{e}");
    }

    #[test]
    fn rejects_commas_outside_calls() {
        let e = err("z, 1");
        assert!(matches!(e.typ, ParseErrTyp::StrayComma), "{e}");

        let e = err("(z, 1)");
        assert!(matches!(e.typ, ParseErrTyp::Grouping { found: 2 }), "{e}");
        assert_eq!(e.loc.get(), "(z, 1)");
    }

    #[test]
    fn rejects_bad_numbers() {
        let e = err("1.2.3 * z");
        assert!(matches!(e.typ, ParseErrTyp::ParseNum(_)), "{e}");
        assert_eq!(e.loc.get(), "1.2.3");

        let huge = "9".repeat(400);
        let e = err(&huge);
        assert!(matches!(e.typ, ParseErrTyp::NumOutOfRange), "{e}");
    }

    #[test]
    fn lex_errors_surface_as_parse_errors() {
        let e = err("z = 1");
        assert!(
            matches!(
                e.typ,
                ParseErrTyp::LexErr(LexErrTyp::Unsupported(TokTyp::XEqual))
            ),
            "{e}"
        );
    }

    #[test]
    fn constants_need_no_variable() {
        let src = Arc::new(String::from("sqrt(3+4i)"));
        let expr =
            parse(Lexer::new(&src), &stdlib::constant_idents()).expect("compile failed");
        let val = expr.eval(Complex::new(0.0, 0.0)).expect("undefined");
        assert!((val - Complex::new(2.0, 1.0)).norm() < 1e-12, "{val}");

        let src = Arc::new(String::from("z + 1"));
        let e = parse(Lexer::new(&src), &stdlib::constant_idents())
            .expect_err("compiled successfully");
        assert!(matches!(e.typ, ParseErrTyp::UndefinedIdent), "{e}");
    }

    #[test]
    fn constants_fold_into_values() {
        let expr = compile("2*π").expect("compile failed");
        assert!(expr
            .ops()
            .all(|op| !matches!(op.typ, OperationTyp::Var)));
        assert_eq!(expr.ops().len(), 3);
    }
}
