// SPDX: CC0-1.0

//! Intersections of two curves by sign-change bracketing and bisection.
//!
//! The difference `f(x) - g(x)` is sampled left to right. Wherever two
//! adjacent defined samples have opposite, nonzero signs the bracket between
//! them is narrowed by bisection. Roots where the difference only touches zero
//! without changing sign (tangent curves) are not found, and neither are
//! crossings that fall between a pair of samples in an even number.

use crate::{is_sample_range, round4, steps, Expr, Number, Point};
use core::{cmp::Ordering, ops::Range};
use tracing::{debug, instrument, trace};

#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    /// Distance between samples of the difference.
    pub step: Number,
    /// Two points closer than this on both axes are the same intersection.
    pub tolerance: Number,
    /// Bisection rounds per bracket.
    pub iterations: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            step: 0.01,
            tolerance: 0.01,
            iterations: 20,
        }
    }
}

/// `f(x) - g(x)`, sharing one evaluation stack.
struct Difference<'a> {
    f: &'a Expr,
    g: &'a Expr,
    stack: Vec<Number>,
}

impl<'a> Difference<'a> {
    fn new(f: &'a Expr, g: &'a Expr) -> Self {
        let depth = f.program().depth().max(g.program().depth());
        Self {
            f,
            g,
            stack: Vec::with_capacity(depth),
        }
    }

    fn at(&mut self, x: Number) -> Option<Number> {
        let y1 = self.f.eval_with(x, &mut self.stack).ok()?;
        let y2 = self.g.eval_with(x, &mut self.stack).ok()?;
        Some(y1 - y2)
    }
}

fn sign(val: Number) -> Ordering {
    val.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

/// Narrows `[left, right]`, whose ends have opposite signs, and returns its
/// midpoint. Stops early if the difference is undefined anywhere it looks.
fn bisect(d: &mut Difference<'_>, mut left: Number, mut right: Number, iterations: u32) -> Number {
    for _ in 0..iterations {
        let mid = (left + right) / 2.0;
        let (Some(at_left), Some(at_mid)) = (d.at(left), d.at(mid)) else {
            debug!(left, right, "difference undefined inside bracket, stopping early");
            break;
        };
        if sign(at_left) == sign(at_mid) {
            left = mid;
        } else {
            right = mid;
        }
    }
    (left + right) / 2.0
}

/// Finds where `f` and `g` cross on `x`, in increasing order of `x`.
///
/// Returns nothing for an empty or non-finite range, or for a step that is
/// not a positive finite number.
#[instrument(level = "debug", skip_all, fields(f = %f, g = %g))]
pub fn intersections(
    f: &Expr,
    g: &Expr,
    x: Range<Number>,
    opts: &Options,
) -> Vec<Point<Number>> {
    let mut found: Vec<Point<Number>> = Vec::new();
    if !(is_sample_range(x.start, x.end, opts.step) && x.start < x.end) {
        debug!(?x, step = opts.step, "nothing to sample");
        return found;
    }

    let mut d = Difference::new(f, g);
    let mut prev: Option<(Number, Ordering)> = None;

    for x in steps(x.start, x.end, opts.step) {
        let Some(diff) = d.at(x) else {
            // an undefined stretch must never bracket a root
            prev = None;
            continue;
        };
        let cur = sign(diff);

        if let Some((prev_x, prev_sign)) = prev {
            if prev_sign != Ordering::Equal && cur != Ordering::Equal && prev_sign != cur {
                trace!(left = prev_x, right = x, "sign change");
                let root = bisect(&mut d, prev_x, x, opts.iterations);
                match f.eval_with(root, &mut d.stack) {
                    Ok(y) => {
                        let point = Point {
                            x: round4(root),
                            y: round4(y),
                        };
                        let duplicate = found.iter().any(|p| {
                            (p.x - point.x).abs() < opts.tolerance
                                && (p.y - point.y).abs() < opts.tolerance
                        });
                        if duplicate {
                            debug!(%point, "dropping duplicate intersection");
                        } else {
                            found.push(point);
                        }
                    }
                    Err(err) => debug!(x = root, %err, "dropping crossing where f is undefined"),
                }
            }
        }

        prev = Some((x, cur));
    }

    debug!(count = found.len(), "intersection search done");
    found
}

/// Compiles both expressions and finds where they cross between `x_min` and
/// `x_max`, deduplicating points closer than `tolerance` on both axes.
///
/// Never fails: an expression that does not compile, or `x_min >= x_max`,
/// yields no points.
pub fn find_intersections(
    expr1: &str,
    expr2: &str,
    x_min: Number,
    x_max: Number,
    tolerance: Number,
) -> Vec<Point<Number>> {
    let (f, g) = match (Expr::new(expr1), Expr::new(expr2)) {
        (Ok(f), Ok(g)) => (f, g),
        (Err(err), _) | (_, Err(err)) => {
            debug!(%err, "cannot search for intersections");
            return Vec::new();
        }
    };
    let opts = Options {
        tolerance,
        ..Options::default()
    };
    intersections(&f, &g, x_min..x_max, &opts)
}
