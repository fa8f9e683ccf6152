// SPDX: CC0-1.0

use complex_field::{
    compile,
    eval::DomainErr,
    parse::ParseErrTyp,
    sample,
    surface::{project, render, Projection, ViewMode},
    Complex, Window,
};
use core::{f64::consts::PI, num::NonZeroU16};

fn window(range: f64, n: u16) -> Window {
    Window::symmetric(range, NonZeroU16::new(n).expect("zero resolution"))
}

#[test]
fn malformed_expression_is_a_syntax_error() {
    assert!(compile("not an expression (").is_err());
    let err = compile("(z + 1").expect_err("compiled successfully");
    assert!(matches!(err.typ, ParseErrTyp::ParenMismatch));
}

#[test]
fn identity_over_small_grid() {
    let expr = compile("z").expect("compile failed");
    let sampled = sample(&expr, &window(1.0, 5));

    let x0 = sampled.xs.iter().position(|x| *x == 0.0).expect("no x = 0");
    let x1 = sampled.xs.iter().position(|x| *x == 1.0).expect("no x = 1");
    let y0 = sampled.ys.iter().position(|y| *y == 0.0).expect("no y = 0");
    assert_eq!(sampled.matrix[y0][x0], Some(Complex::new(0.0, 0.0)));
    assert_eq!(sampled.matrix[y0][x1], Some(Complex::new(1.0, 0.0)));
}

#[test]
fn reciprocal_at_origin_is_nan_everywhere() {
    let expr = compile("1/z").expect("compile failed");
    assert_eq!(expr.eval(Complex::new(0.0, 0.0)), Err(DomainErr::DivByZero));

    let sampled = sample(&expr, &window(1.0, 5));
    for mode in ViewMode::exhaustive() {
        for surface in render(&sampled, *mode).surfaces {
            assert!(surface.data[2][2].is_nan(), "{}", surface.name);
        }
    }
}

#[test]
fn resolution_sets_dimensions() {
    let expr = compile("exp(z) / (z^2 + 1)").expect("compile failed");
    for n in [1, 2, 7, 61] {
        let sampled = sample(&expr, &window(PI, n));
        let n = usize::from(n);
        assert_eq!(sampled.xs.len(), n);
        assert_eq!(sampled.ys.len(), n);
        assert_eq!(sampled.matrix.len(), n);
        assert!(sampled.matrix.iter().all(|row| row.len() == n));
        assert!(sampled.xs.windows(2).all(|w| w[0] < w[1]));
        assert!(sampled.ys.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn default_window_matches_sixty_intervals() {
    let win = Window::default();
    let xs = win.xs();
    assert_eq!(xs.len(), 61);
    assert_eq!(xs.first().copied(), Some(-2.0 * PI));
    assert_eq!(xs.last().copied(), Some(2.0 * PI));
    assert!((xs[1] - xs[0] - 4.0 * PI / 60.0).abs() < 1e-12);
}

#[test]
fn argument_surface_is_principal() {
    let expr = compile("sin(z) * log(z)").expect("compile failed");
    let sampled = sample(&expr, &Window::default());
    let surface = project(&sampled.matrix, Projection::Argument);
    assert!(surface
        .iter()
        .flatten()
        .filter(|val| !val.is_nan())
        .all(|val| *val > -PI && *val <= PI));
}

#[test]
fn vocabulary_from_keyboard() {
    for src in [
        "sin(z)", "cos(z)", "tan(z)", "exp(z)", "log(z)", "abs(z)", "arg(z)", "sqrt(z)",
        "π*z", "e^z", "Re(z)", "Im(z)", "z^2", "i*z", "(z+1)/(z-1)", "log(z, 2)",
    ] {
        assert!(compile(src).is_ok(), "{src}");
    }
}
