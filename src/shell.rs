// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Expr, Invalid, InvalidTyp, Number, Point};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetF,
    SetG,
    Eval,
    Cross,
    PrintProg,
    Plot,
    SetWin,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetF,
            Self::SetG,
            Self::Eval,
            Self::Cross,
            Self::Plot,
            Self::SetWin,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetF => "set the first function",
            Self::SetG => "set the second function",
            Self::Eval => "evaluate both functions at some x",
            Self::Cross => "list the points where the functions intersect",
            Self::PrintProg => "print programs compiled from the functions (for debugging)",
            Self::Plot => "plot both functions and their intersections",
            Self::SetWin => "set window parameters",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetF => "f",
            Self::SetG => "g",
            Self::Eval => "eval",
            Self::Cross => "cross",
            Self::PrintProg => "prog",
            Self::Plot => "plot",
            Self::SetWin => "window",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(mut out: W, expr: &Expr, title: fmt::Arguments) -> io::Result<()> {
    writeln!(out, "{title} = {expr}: ")?;
    if expr.program().ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in expr.program().ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

/// Writes `x y` rows, leaving a blank line wherever consecutive points are
/// further apart than `gap` so gnuplot breaks the curve there.
pub fn write_points<W: Write>(mut out: W, points: &[Point<Number>], gap: Number) -> io::Result<()> {
    let mut prev_x: Option<Number> = None;
    for Point { x, y } in points {
        if prev_x.is_some_and(|prev_x| x - prev_x > gap) {
            writeln!(out)?;
        }
        writeln!(out, "{x} {y}")?;
        prev_x = Some(*x);
    }
    Ok(())
}

/// Hints at what was meant by the character `validate` rejected.
pub fn invalid_note<W: Write>(mut out: W, invalid: &Invalid) -> io::Result<()> {
    if invalid.typ != InvalidTyp::DisallowedChar {
        return Ok(());
    }
    match invalid.loc.get() {
        ">" | "<" => writeln!(out, "note: expected an expression but found an inequality"),
        "=" => writeln!(out, "note: expected an expression but found an equation"),
        "|" => writeln!(out, "note: use the 'abs' function to compute absolute value"),
        "[" | "]" | "{" | "}" => writeln!(out, "note: only round parentheses group expressions"),
        _ => writeln!(
            out,
            "note: available tokens are numbers, function names, '{}', and symbols +-*/^()",
            stdlib::X
        ),
    }
}

pub fn expr_undefined<W: Write>(mut out: W, name: &str) -> io::Result<()> {
    writeln!(out, "error: function {name} is not defined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_round_trip_through_names() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>(), Ok(*c));
        }
        assert_eq!("plto".parse::<Command>(), Err(()));
    }

    #[test]
    fn underline_marks_span() {
        let src = Arc::new(String::from("x + y"));
        let mut out = Vec::new();
        underline(&mut out, &SubStr::new(src, 4, 1)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x + y\n    ^\n");
    }

    fn note_for(expression: &str) -> String {
        let invalid = crate::validate(expression).unwrap_err();
        let mut out = Vec::new();
        invalid_note(&mut out, &invalid).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn rejected_characters_get_notes() {
        assert!(note_for("x = 2").contains("equation"));
        assert!(note_for("x > 2").contains("inequality"));
        assert!(note_for("|x|").contains("'abs'"));
        assert!(note_for("[x + 1]").contains("round parentheses"));
        assert!(note_for("x # 2").contains("available tokens"));
        assert!(note_for("y").contains("available tokens"));
        assert_eq!(note_for("(x"), "");
        assert_eq!(note_for(" "), "");
    }

    #[test]
    fn curve_breaks_at_gaps() {
        let points = [
            Point { x: -1.0, y: 1.0 },
            Point { x: -0.5, y: 2.0 },
            Point { x: 0.5, y: 2.0 },
        ];
        let mut out = Vec::new();
        write_points(&mut out, &points, 0.75).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "-1 1\n-0.5 2\n\n0.5 2\n");
    }

    #[test]
    fn program_dump_lists_operations() {
        let expr = Expr::new("sqrt(x) - 1").unwrap();
        let mut out = Vec::new();
        dump_program(&mut out, &expr, format_args!("f")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "f = sqrt(x) - 1: \n  push x\n  call 'sqrt'\n  push 1\n  call 'sub'\n"
        );
    }
}
