// SPDX: CC0-1.0

use crate::{
    lex::SubStr,
    stdlib::{self, Builtin, MathErr},
    Number,
};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Exp => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Exp => Right,
        }
    }

    /// Prefix operators have nothing on their left to bind to.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg)
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Exp => ("pow", Fun::new(2, stdlib::pow)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Call(Builtin),
    Val(Number),
    Var,
}

impl OperationTyp {
    /// Operands popped from the stack by this operation.
    pub const fn arity(&self) -> usize {
        match self {
            Self::Operator(typ) => typ.fun().1.arity,
            Self::Call(builtin) => builtin.fun().arity,
            Self::Val(_) | Self::Var => 0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Var => write!(f, "push {}", stdlib::X),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Call(builtin) => write!(f, "call '{}'", builtin.name()),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
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
    DivByZero,
    OutOfDomain {
        name: &'static str,
        arg: Number,
    },
    NonFinite {
        val: Number,
    },
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} operation{s} on the stack but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::DivByZero => write!(f, "division by zero"),

            EvalErrTyp::OutOfDomain { name, arg } => {
                write!(f, "'{name}' is not defined for {arg}")
            }

            EvalErrTyp::NonFinite { val } => write!(f, "result is not a finite number ({val})"),
        }
    }
}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

#[derive(Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(&[Number]) -> Result<Number, MathErr>,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Result<Number, MathErr>) -> Self {
        Self { arity, fun }
    }
}

/// Postfix program compiled from an expression.
#[derive(Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
    pub(crate) depth: usize, // deepest the stack gets while evaluating
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>, depth: usize) -> Self {
        Self { ops, depth }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

pub fn eval(prog: &Program, x: Number, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
    fn eval_fun(
        stack: &mut Vec<Number>,
        op: &Operation,
        name: &'static str,
        fun: &Fun,
    ) -> Result<Number, EvalErr> {
        let len = stack.len();
        if len < fun.arity {
            return Err(EvalErr {
                typ: EvalErrTyp::MissingArgs {
                    name,
                    arity: fun.arity,
                    found: len,
                },
                op: Some(op.clone()),
            });
        }
        // stack: ...a, b, c, d
        //                 ^^^^ args if arity is 2
        let ret = (fun.fun)(&stack[len - fun.arity..]).map_err(|err| EvalErr {
            typ: match err {
                MathErr::DivByZero => EvalErrTyp::DivByZero,
                MathErr::OutOfDomain(arg) => EvalErrTyp::OutOfDomain { name, arg },
            },
            op: Some(op.clone()),
        })?;
        stack.truncate(len - fun.arity);
        Ok(ret)
    }

    if prog.ops.is_empty() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    for op in prog.ops() {
        let val = match op.typ {
            OperationTyp::Val(num) => num,
            OperationTyp::Var => x,
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                eval_fun(stack, op, name, &fun)?
            }
            OperationTyp::Call(builtin) => eval_fun(stack, op, builtin.name(), &builtin.fun())?,
        };
        stack.push(val);
    }

    match stack.as_slice() {
        &[val] if val.is_finite() => Ok(val),
        &[val] => Err(EvalErr {
            typ: EvalErrTyp::NonFinite { val },
            op: None,
        }),
        rest => Err(EvalErr {
            typ: EvalErrTyp::StackMismatch {
                expected: 1,
                found: rest.len(),
            },
            op: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn op(typ: OperationTyp) -> Operation {
        Operation {
            typ,
            loc: SubStr::all(Arc::new(String::from("?"))),
        }
    }

    #[test]
    fn runs_postfix_program() {
        // (x - 1) ^ 2
        let prog = Program::new(
            vec![
                op(OperationTyp::Var),
                op(OperationTyp::Val(1.0)),
                op(OperationTyp::Operator(OperatorTyp::Sub)),
                op(OperationTyp::Val(2.0)),
                op(OperationTyp::Operator(OperatorTyp::Exp)),
            ],
            2,
        );
        let mut stack = Vec::new();
        assert_eq!(eval(&prog, 4.0, &mut stack).unwrap(), 9.0);
        assert_eq!(eval(&prog, -1.0, &mut stack).unwrap(), 4.0);
    }

    #[test]
    fn reports_operation_that_failed() {
        let prog = Program::new(
            vec![
                op(OperationTyp::Var),
                op(OperationTyp::Call(Builtin::Sqrt)),
            ],
            1,
        );
        let err = eval(&prog, -4.0, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::OutOfDomain { name: "sqrt", arg } if arg == -4.0
        ));
        assert!(matches!(
            err.op.map(|op| op.typ),
            Some(OperationTyp::Call(Builtin::Sqrt))
        ));
    }

    #[test]
    fn rejects_bad_stack_shapes() {
        let err = eval(&Program::new(Vec::new(), 0), 0.0, &mut Vec::new()).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::Empty));

        let two = Program::new(vec![op(OperationTyp::Var), op(OperationTyp::Var)], 2);
        let err = eval(&two, 0.0, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::StackMismatch {
                expected: 1,
                found: 2
            }
        ));

        let dangling = Program::new(vec![op(OperationTyp::Operator(OperatorTyp::Add))], 0);
        let err = eval(&dangling, 0.0, &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::MissingArgs {
                name: "add",
                arity: 2,
                found: 0
            }
        ));
    }

    #[test]
    fn non_finite_result_is_a_failure() {
        let prog = Program::new(
            vec![
                op(OperationTyp::Val(10.0)),
                op(OperationTyp::Val(400.0)),
                op(OperationTyp::Operator(OperatorTyp::Exp)),
            ],
            2,
        );
        let err = eval(&prog, 0.0, &mut Vec::new()).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::NonFinite { .. }));
    }
}
