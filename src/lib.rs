// SPDX: CC0-1.0

pub mod eval;
pub mod intersect;
pub mod lex;
pub mod parse;
pub mod shell;
pub mod stdlib;
pub mod validate;

#[cfg(test)]
mod proptests;

pub use intersect::{find_intersections, Options};
pub use validate::{validate, Invalid, InvalidTyp};

use crate::{
    eval::{EvalErr, Program},
    lex::Lexer,
    parse::ParseErr,
};
use core::{fmt, ops::Range, str::FromStr};
use std::sync::Arc;

pub type Number = f64;

/// Sampling step used for drawable curves.
pub const DEFAULT_POLYLINE_STEP: Number = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl fmt::Display for Point<Number> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Debug)]
pub struct Window {
    pub x: Range<Number>,
    pub y: Range<Number>,
    pub step: Number, // polyline sampling step
}

impl Default for Window {
    fn default() -> Self {
        Self {
            x: -10.0..10.0,
            y: -10.0..10.0,
            step: DEFAULT_POLYLINE_STEP,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .field("step", &self.step)
            .finish()
    }
}

/// Rounds to 4 decimal places so emitted points print stably.
///
/// Values too large to scale are already whole and come back unchanged.
pub fn round4(val: Number) -> Number {
    let scaled = val * 1e4;
    if !scaled.is_finite() {
        return val;
    }
    let ret = scaled.round() / 1e4;
    if ret == 0.0 {
        0.0 // no negative zero
    } else {
        ret
    }
}

/// Sample positions `start, start + step, start + 2 step, ...` up to and
/// including `end`, accumulated one step at a time.
pub(crate) fn steps(start: Number, end: Number, step: Number) -> impl Iterator<Item = Number> {
    core::iter::successors(Some(start), move |x| Some(x + step)).take_while(move |x| *x <= end)
}

pub(crate) fn is_sample_range(start: Number, end: Number, step: Number) -> bool {
    start.is_finite() && end.is_finite() && step.is_finite() && step > 0.0
}

/// An expression compiled once, to be evaluated at many values of `x`.
#[derive(Debug)]
pub struct Expr {
    src: Arc<String>,
    prog: Program,
}

impl Expr {
    pub fn new(src: impl Into<String>) -> Result<Self, ParseErr> {
        let src = Arc::new(src.into());
        let prog = parse::parse(Lexer::new(&src), &src)?;
        Ok(Self { src, prog })
    }

    pub fn program(&self) -> &Program {
        &self.prog
    }

    pub fn eval(&self, x: Number) -> Result<Number, EvalErr> {
        let mut stack = Vec::with_capacity(self.prog.depth());
        self.eval_with(x, &mut stack)
    }

    /// Like [`Expr::eval`], reusing `stack` between calls.
    #[inline]
    pub fn eval_with(&self, x: Number, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
        eval::eval(&self.prog, x, stack)
    }

    /// Points of the curve over `x`, skipping values of `x` where the
    /// expression is undefined.
    pub fn polyline(&self, x: Range<Number>, step: Number) -> Vec<Point<Number>> {
        if !is_sample_range(x.start, x.end, step) {
            return Vec::new();
        }
        let mut stack = Vec::with_capacity(self.prog.depth());
        steps(x.start, x.end, step)
            .filter_map(|x| {
                let y = self.eval_with(x, &mut stack).ok()?;
                Some(Point {
                    x: round4(x),
                    y: round4(y),
                })
            })
            .collect()
    }
}

impl FromStr for Expr {
    type Err = ParseErr;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.src)
    }
}

/// Why an expression has no value at some `x`.
#[derive(Debug)]
pub enum Failure {
    Parse(ParseErr),
    Eval(EvalErr),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "parse error: {err}"),
            Self::Eval(err) => write!(f, "evaluation error: {err}"),
        }
    }
}

impl std::error::Error for Failure {}

impl From<ParseErr> for Failure {
    fn from(err: ParseErr) -> Self {
        Self::Parse(err)
    }
}

impl From<EvalErr> for Failure {
    fn from(err: EvalErr) -> Self {
        Self::Eval(err)
    }
}

/// Compiles and evaluates `expression` at `x`.
///
/// Prefer [`Expr`] when evaluating the same expression repeatedly.
pub fn evaluate(expression: &str, x: Number) -> Result<Number, Failure> {
    Ok(Expr::new(expression)?.eval(x)?)
}

/// Samples `expression` from `x_min` to `x_max` inclusive, every `step`.
///
/// Values of `x` where the expression is undefined are skipped, leaving gaps
/// for the caller to draw around. An expression that does not compile yields
/// no points.
pub fn sample_polyline(
    expression: &str,
    x_min: Number,
    x_max: Number,
    step: Number,
) -> Vec<Point<Number>> {
    match Expr::new(expression) {
        Ok(expr) => expr.polyline(x_min..x_max, step),
        Err(err) => {
            tracing::debug!(%err, "cannot sample expression");
            Vec::new()
        }
    }
}
