// SPDX: CC0-1.0

//! Structural pre-check for user input.
//!
//! This is deliberately shallower than [`crate::parse`]: it only rejects
//! input that is obviously broken (nothing typed, stray characters, unbalanced
//! parentheses) so a front-end can give feedback on every keystroke. Passing
//! validation does not mean the expression compiles or evaluates.

use crate::{lex::SubStr, stdlib::Builtin};
use core::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvalidTyp {
    Empty,
    DisallowedChar,
    UnbalancedParens,
}

impl fmt::Display for InvalidTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "enter a function"),
            Self::DisallowedChar => write!(f, "disallowed character"),
            Self::UnbalancedParens => write!(f, "unbalanced parentheses"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invalid {
    pub typ: InvalidTyp,
    pub loc: SubStr,
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl std::error::Error for Invalid {}

fn is_allowed_symbol(chr: char) -> bool {
    matches!(
        chr,
        '0'..='9' | '+' | '-' | '*' | '/' | '^' | '(' | ')' | '.' | ','
    ) || chr.is_whitespace()
}

/// Length of the function name `rest` starts with, if any.
fn builtin_prefix(rest: &str) -> Option<usize> {
    Builtin::exhaustive()
        .iter()
        .map(|builtin| builtin.name())
        .find(|name| {
            rest.get(..name.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(name))
        })
        .map(str::len)
}

pub fn validate(expression: &str) -> Result<(), Invalid> {
    let src = Arc::new(expression.to_string());
    let invalid = |typ, start, len| Invalid {
        typ,
        loc: SubStr::new(Arc::clone(&src), start, len),
    };

    if expression.trim().is_empty() {
        return Err(invalid(InvalidTyp::Empty, 0, expression.len()));
    }

    let mut idx = 0;
    while let Some(chr) = expression[idx..].chars().next() {
        idx += if chr.is_ascii_alphabetic() {
            match builtin_prefix(&expression[idx..]) {
                Some(len) => len,
                None if chr.eq_ignore_ascii_case(&'x') => 1,
                None => return Err(invalid(InvalidTyp::DisallowedChar, idx, 1)),
            }
        } else if is_allowed_symbol(chr) {
            chr.len_utf8()
        } else {
            return Err(invalid(InvalidTyp::DisallowedChar, idx, chr.len_utf8()));
        };
    }

    // positions of parens that are still open
    let mut open = Vec::new();
    for (idx, chr) in expression.char_indices() {
        match chr {
            '(' => open.push(idx),
            ')' => {
                if open.pop().is_none() {
                    return Err(invalid(InvalidTyp::UnbalancedParens, idx, 1));
                }
            }
            _ => {}
        }
    }
    if let Some(idx) = open.pop() {
        return Err(invalid(InvalidTyp::UnbalancedParens, idx, 1));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(expression: &str) -> Option<InvalidTyp> {
        validate(expression).err().map(|err| err.typ)
    }

    #[test]
    fn accepts_well_formed_input() {
        for expression in [
            "x^2+1",
            "sqrt(x)",
            "SIN(X) * cos(x)",
            "ln(x) - log(x) + exp(-x) / abs(tan(x))",
            "  .5 * (x - 1.25)  ",
        ] {
            assert_eq!(reason(expression), None, "{expression}");
        }
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(reason(""), Some(InvalidTyp::Empty));
        assert_eq!(reason(" \t "), Some(InvalidTyp::Empty));
    }

    #[test]
    fn rejects_letters_outside_function_names() {
        assert_eq!(reason("y + 1"), Some(InvalidTyp::DisallowedChar));
        assert_eq!(reason("pi * x"), Some(InvalidTyp::DisallowedChar));
        assert_eq!(reason("x = 2"), Some(InvalidTyp::DisallowedChar));
        assert_eq!(reason("x²"), Some(InvalidTyp::DisallowedChar));

        let err = validate("sin(x) + q").unwrap_err();
        assert_eq!(err.loc.get(), "q");
        assert_eq!(err.loc.start(), 9);
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert_eq!(reason("x+(1"), Some(InvalidTyp::UnbalancedParens));
        assert_eq!(reason("x+)1"), Some(InvalidTyp::UnbalancedParens));
        assert_eq!(reason(")("), Some(InvalidTyp::UnbalancedParens));

        let err = validate("(x + (1)").unwrap_err();
        assert_eq!(err.loc.start(), 0);
    }

    #[test]
    fn does_not_guarantee_evaluability() {
        assert_eq!(reason("x +* 2"), None);
        assert_eq!(reason("sqrt(-1)"), None);

        // function names are not split from what follows them
        for expression in ["sinx", "xx"] {
            assert_eq!(reason(expression), None, "{expression}");
            assert!(
                matches!(
                    crate::evaluate(expression, 1.0),
                    Err(crate::Failure::Parse(crate::parse::ParseErr {
                        typ: crate::parse::ParseErrTyp::UndefinedIdent,
                        ..
                    }))
                ),
                "{expression}"
            );
        }
    }
}
