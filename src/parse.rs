// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    stdlib::{self, Builtin},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Clone, Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    UndefinedIdent,
    MissingCallParen(Builtin),
    MissingOperand { name: &'static str },
    ExtraOperand,
    Empty,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::UndefinedIdent => write!(f, "undefined identifier"),
            Self::MissingCallParen(builtin) => {
                write!(f, "function '{}' must be followed by '('", builtin.name())
            }
            Self::MissingOperand { name } => write!(f, "'{name}' is missing an operand"),
            Self::ExtraOperand => write!(f, "value is not combined with the rest of the expression"),
            Self::Empty => write!(f, "empty expression"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_empty() {
            write!(f, "{}", self.typ)
        } else {
            write!(f, "{} at '{}'", self.typ, self.loc)
        }
    }
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Call(Builtin),
    OpenParen,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    fn precedence(&self) -> i8 {
        match self.typ {
            ShuntOpTyp::Operator(op) => op.precedence(),
            // a call is only ever below its own open paren, so this never
            // decides anything; bind tighter than every operator regardless
            ShuntOpTyp::Call(_) => i8::MAX,
            ShuntOpTyp::OpenParen => i8::MIN,
        }
    }

    fn into_output(self) -> Result<Operation, ParseErr> {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Call(builtin) => OperationTyp::Call(builtin),
            ShuntOpTyp::OpenParen => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc: self.loc,
                })
            }
        };
        Ok(Operation { typ, loc: self.loc })
    }
}

/// Pops operators into `out` until an open paren is on top of `ops`.
fn pop_until_paren(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) -> Result<(), ParseErr> {
    while let Some(op) = ops.pop() {
        if op.typ == ShuntOpTyp::OpenParen {
            ops.push(op);
            break;
        }
        out.push(op.into_output()?);
    }
    Ok(())
}

pub fn parse(lex: Lexer<'_>, src: &std::sync::Arc<String>) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack
    let mut lex = lex.peekable();

    while let Some(tok) = lex.next() {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => {
                let name = tok.loc.get();
                if name.eq_ignore_ascii_case(stdlib::X) {
                    out.push(Operation {
                        typ: OperationTyp::Var,
                        loc: tok.loc,
                    });
                } else if let Some(builtin) = Builtin::from_name(name) {
                    // lexer errors are left for the next iteration to report
                    let called = matches!(
                        lex.peek(),
                        Some(Ok(Tok {
                            typ: TokTyp::OpenParen,
                            ..
                        })) | Some(Err(_))
                    );
                    if !called {
                        return Err(ParseErr {
                            typ: ParseErrTyp::MissingCallParen(builtin),
                            loc: tok.loc,
                        });
                    }
                    ops.push(ShuntOp {
                        typ: ShuntOpTyp::Call(builtin),
                        loc: tok.loc,
                    });
                } else {
                    return Err(ParseErr {
                        typ: ParseErrTyp::UndefinedIdent,
                        loc: tok.loc,
                    });
                }
            }

            TokTyp::Op(o1) => {
                // a prefix operator has no left operand to steal from the stack
                while let Some(o2) = ops.last().cloned().filter(|_| !o1.is_prefix()) {
                    if (o2.typ != ShuntOpTyp::OpenParen)
                        && ((o2.precedence() > o1.precedence())
                            || ((o1.precedence() == o2.precedence())
                                && (o1.associativity() == Associativity::Left)))
                    {
                        ops.pop();
                        out.push(o2.into_output()?);
                    } else {
                        break;
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                pop_until_paren(&mut ops, &mut out)?;

                if ops.pop().is_none() {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                }

                // handle functions
                if matches!(ops.last().map(|op| op.typ), Some(ShuntOpTyp::Call(_))) {
                    if let Some(op) = ops.pop() {
                        out.push(op.into_output()?);
                    }
                }
            }

            TokTyp::XComma
            | TokTyp::XGreater
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

    let depth = check_stack(&out, src)?;
    Ok(Program::new(out, depth))
}

/// Walks the program as the evaluator would, tracking where each stack slot
/// came from, so malformed input is caught before any evaluation. Returns the
/// deepest the stack gets.
fn check_stack(out: &[Operation], src: &std::sync::Arc<String>) -> Result<usize, ParseErr> {
    let mut stack: Vec<&SubStr> = Vec::new();
    let mut depth = 0;

    for op in out {
        let arity = op.typ.arity();
        if stack.len() < arity {
            let name = match op.typ {
                OperationTyp::Operator(typ) => typ.fun().0,
                OperationTyp::Call(builtin) => builtin.name(),
                OperationTyp::Val(_) | OperationTyp::Var => stdlib::X,
            };
            return Err(ParseErr {
                typ: ParseErrTyp::MissingOperand { name },
                loc: op.loc.clone(),
            });
        }
        stack.truncate(stack.len() - arity);
        stack.push(&op.loc);
        depth = depth.max(stack.len());
    }

    match stack.as_slice() {
        [] => Err(ParseErr {
            typ: ParseErrTyp::Empty,
            loc: SubStr::all(std::sync::Arc::clone(src)),
        }),
        [_] => Ok(depth),
        [_, extra, ..] => Err(ParseErr {
            typ: ParseErrTyp::ExtraOperand,
            loc: (*extra).clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn compile(src: &str) -> Result<Program, ParseErr> {
        let src = Arc::new(src.to_string());
        parse(Lexer::new(&src), &src)
    }

    fn postfix(src: &str) -> String {
        let prog = compile(src).unwrap();
        prog.ops()
            .map(|op| match op.typ {
                OperationTyp::Val(val) => val.to_string(),
                OperationTyp::Var => String::from("x"),
                OperationTyp::Operator(typ) => typ.fun().0.to_string(),
                OperationTyp::Call(builtin) => builtin.name().to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn err_typ(src: &str) -> ParseErrTyp {
        compile(src).unwrap_err().typ
    }

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(postfix("1 + 2 * x"), "1 2 x mul add");
        assert_eq!(postfix("(1 + 2) * x"), "1 2 add x mul");
        assert_eq!(postfix("x - 1 - 2"), "x 1 sub 2 sub");
        assert_eq!(postfix("2 ^ 3 ^ x"), "2 3 x pow pow");
        assert_eq!(postfix("8 / 4 / 2"), "8 4 div 2 div");
    }

    #[test]
    fn negation_binds_looser_than_power() {
        assert_eq!(postfix("-x^2"), "x 2 pow neg");
        assert_eq!(postfix("2^-x"), "2 x neg pow");
        assert_eq!(postfix("-x*3"), "x neg 3 mul");
        assert_eq!(postfix("--x"), "x neg neg");
    }

    #[test]
    fn calls_wrap_their_argument() {
        assert_eq!(postfix("SIN(x) + 1"), "x sin 1 add");
        assert_eq!(postfix("sqrt(abs(x - 4))"), "x 4 sub abs sqrt");
        assert_eq!(postfix("2*ln(x)^2"), "2 x ln 2 pow mul");
    }

    #[test]
    fn reports_structural_errors() {
        assert!(matches!(err_typ("x+(1"), ParseErrTyp::ParenMismatch));
        assert!(matches!(err_typ("x+)1"), ParseErrTyp::ParenMismatch));
        assert!(matches!(err_typ("x+"), ParseErrTyp::MissingOperand { name: "add" }));
        assert!(matches!(err_typ("()"), ParseErrTyp::Empty));
        assert!(matches!(err_typ(""), ParseErrTyp::Empty));
        assert!(matches!(err_typ("1.2.3"), ParseErrTyp::ParseNum(_)));
        assert!(matches!(err_typ("y + 1"), ParseErrTyp::UndefinedIdent));
        assert!(matches!(
            err_typ("sin x"),
            ParseErrTyp::MissingCallParen(Builtin::Sin)
        ));
        assert!(matches!(
            err_typ("x, 2"),
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(TokTyp::XComma))
        ));
    }

    #[test]
    fn implicit_multiplication_points_at_second_operand() {
        let err = compile("2x").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ExtraOperand));
        assert_eq!(err.loc.get(), "x");
        assert_eq!(err.loc.start(), 1);
    }

    #[test]
    fn tracks_stack_depth() {
        assert_eq!(compile("x").unwrap().depth(), 1);
        assert_eq!(compile("1 + 2 * x").unwrap().depth(), 3);
    }
}
