// SPDX: CC0-1.0

//! Property-based tests for evaluation and intersection search.

use proptest::prelude::*;

use crate::{evaluate, find_intersections, sample_polyline, validate, Number};

// Strategy for finite inputs of a sensible magnitude
fn finite_x() -> impl Strategy<Value = Number> {
    -1.0e6..1.0e6
}

// Strategy for lines a*x + b with a nonzero slope
fn line() -> impl Strategy<Value = (i32, i32)> {
    (prop_oneof![-9i32..=-1, 1i32..=9], -20i32..=20)
}

proptest! {
    #[test]
    fn variable_evaluates_to_itself(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
        prop_assert_eq!(evaluate("x", x).unwrap(), x);
    }

    #[test]
    fn square_matches_multiplication(x in -1.0e3..1.0e3) {
        let val = evaluate("x^2", x).unwrap();
        prop_assert!((val - x * x).abs() <= 1e-9 * (x * x).max(1.0));
    }

    #[test]
    fn evaluation_never_panics(src in "[-+*/^().x0-9a-z ]{0,16}", x in finite_x()) {
        if let Ok(val) = evaluate(&src, x) {
            prop_assert!(val.is_finite());
        }
        let _ = validate(&src);
    }

    #[test]
    fn polyline_points_are_finite_and_ascending(x_min in -20.0..0.0, width in 0.5..20.0) {
        let points = sample_polyline("1/x + sqrt(x)", x_min, x_min + width, 0.1);
        prop_assert!(points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        prop_assert!(points.windows(2).all(|w| w[0].x < w[1].x));
    }

    #[test]
    fn lines_cross_once_where_expected((a, b) in line(), (c, d) in line()) {
        prop_assume!(a != c);
        let f = format!("{a}*x + {b}");
        let g = format!("{c}*x + {d}");
        let x = Number::from(d - b) / Number::from(a - c);
        prop_assume!((-9.0..9.0).contains(&x));

        let points = find_intersections(&f, &g, -10.0, 10.0, 0.01);
        prop_assert_eq!(points.len(), 1, "{:?}", points);
        prop_assert!((points[0].x - x).abs() < 1e-3);
    }

    #[test]
    fn intersections_are_sorted_distinct_and_repeatable(
        k in 1u8..6,
        shift in -3.0..3.0,
        tolerance in 0.001..2.0,
    ) {
        let f = format!("sin({k}*x)");
        let g = format!("x/10 + {shift}/10");
        let first = find_intersections(&f, &g, -10.0, 10.0, tolerance);
        let again = find_intersections(&f, &g, -10.0, 10.0, tolerance);
        prop_assert_eq!(&first, &again);

        prop_assert!(first.windows(2).all(|w| w[0].x < w[1].x));
        for (i, p) in first.iter().enumerate() {
            prop_assert!(p.x.is_finite() && p.y.is_finite());
            for q in &first[i + 1..] {
                prop_assert!(
                    (p.x - q.x).abs() >= tolerance || (p.y - q.y).abs() >= tolerance
                );
            }
        }
    }
}
