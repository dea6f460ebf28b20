// SPDX: CC0-1.0

use crate::{eval::Fun, Number}; // assumes Number = f64

/// The only variable an expression may reference.
pub const X: &str = "x";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MathErr {
    DivByZero,
    OutOfDomain(Number),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Abs,
    Log,
    Ln,
    Exp,
}

impl Builtin {
    pub const fn exhaustive() -> &'static [Builtin] {
        &[
            Self::Sqrt,
            Self::Sin,
            Self::Cos,
            Self::Tan,
            Self::Abs,
            Self::Log,
            Self::Ln,
            Self::Exp,
        ]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sqrt => "sqrt",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Abs => "abs",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Exp => "exp",
        }
    }

    pub const fn fun(&self) -> Fun {
        match self {
            Self::Sqrt => Fun::new(1, sqrt),
            Self::Sin => Fun::new(1, sin),
            Self::Cos => Fun::new(1, cos),
            Self::Tan => Fun::new(1, tan),
            Self::Abs => Fun::new(1, abs),
            Self::Log => Fun::new(1, log),
            Self::Ln => Fun::new(1, ln),
            Self::Exp => Fun::new(1, exp),
        }
    }

    /// Case-insensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::exhaustive()
            .iter()
            .find(|builtin| builtin.name().eq_ignore_ascii_case(name))
            .copied()
    }
}

fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    let mut ret = [Number::NAN; N];
    for (dst, src) in ret.iter_mut().zip(args) {
        *dst = *src;
    }
    ret
}

pub fn neg(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(-x)
}

pub fn add(args: &[Number]) -> Result<Number, MathErr> {
    let [x, y] = expect_n::<2>(args);
    Ok(x + y)
}

pub fn sub(args: &[Number]) -> Result<Number, MathErr> {
    let [x, y] = expect_n::<2>(args);
    Ok(x - y)
}

pub fn mul(args: &[Number]) -> Result<Number, MathErr> {
    let [x, y] = expect_n::<2>(args);
    Ok(x * y)
}

pub fn div(args: &[Number]) -> Result<Number, MathErr> {
    let [x, y] = expect_n::<2>(args);
    if y == 0.0 {
        Err(MathErr::DivByZero)
    } else {
        Ok(x / y)
    }
}

pub fn pow(args: &[Number]) -> Result<Number, MathErr> {
    let [x, exp] = expect_n::<2>(args);
    Ok(x.powf(exp))
}

pub fn sqrt(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    if x < 0.0 {
        Err(MathErr::OutOfDomain(x))
    } else {
        Ok(x.sqrt())
    }
}

pub fn abs(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(x.abs())
}

pub fn log(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        Err(MathErr::OutOfDomain(x))
    } else {
        Ok(x.log10())
    }
}

pub fn ln(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        Err(MathErr::OutOfDomain(x))
    } else {
        Ok(x.ln())
    }
}

pub fn exp(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(x.exp())
}

pub fn sin(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(x.sin())
}

pub fn cos(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(x.cos())
}

pub fn tan(args: &[Number]) -> Result<Number, MathErr> {
    let [x] = expect_n::<1>(args);
    Ok(x.tan())
}
