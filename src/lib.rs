// SPDX: CC0-1.0

pub mod eval;
pub mod gnuplot;
pub mod lex;
pub mod parse;
pub mod shell;
pub mod stdlib;
pub mod surface;

use crate::{eval::Expression, lex::Lexer, parse::ParseErr};
use core::{fmt, num::NonZeroU16, ops::RangeInclusive};
use std::sync::Arc;

pub type Number = f64;
pub type Complex = num_complex::Complex<Number>;

/// One sampled cell: `None` where the expression is undefined.
pub type Cell = Option<Complex>;

/// Row-major samples, `matrix[j][i]` is taken at `xs[i] + ys[j]·i`.
pub type Matrix = Vec<Vec<Cell>>;

/// Compiles `src` as a function of `z` with the standard vocabulary.
pub fn compile(src: &str) -> Result<Expression, ParseErr> {
    let src = Arc::new(String::from(src));
    parse::parse(Lexer::new(&src), &stdlib::standard_idents())
}

/// Rectangle of the complex plane to sample, endpoints included.
#[derive(Clone, Debug, PartialEq)]
pub struct Window {
    pub re: RangeInclusive<Number>,
    pub im: RangeInclusive<Number>,
    pub resolution: NonZeroU16,
}

impl Window {
    pub const DEFAULT_RANGE: Number = core::f64::consts::TAU;
    pub const DEFAULT_RESOLUTION: NonZeroU16 = match NonZeroU16::new(61) {
        Some(n) => n,
        None => panic!("resolution must be nonzero"),
    };

    /// Window over `re × im`, or `None` unless every bound is finite and each
    /// minimum lies below its maximum.
    pub fn new(
        re: RangeInclusive<Number>,
        im: RangeInclusive<Number>,
        resolution: NonZeroU16,
    ) -> Option<Self> {
        let valid = |r: &RangeInclusive<Number>| {
            r.start().is_finite() && r.end().is_finite() && r.start() < r.end()
        };
        (valid(&re) && valid(&im)).then_some(Self { re, im, resolution })
    }

    /// Square window covering `[-range, range]` on both axes.
    pub fn symmetric(range: Number, resolution: NonZeroU16) -> Self {
        Self {
            re: -range..=range,
            im: -range..=range,
            resolution,
        }
    }

    pub fn xs(&self) -> Vec<Number> {
        linspace(&self.re, self.resolution)
    }

    pub fn ys(&self) -> Vec<Number> {
        linspace(&self.im, self.resolution)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::symmetric(Self::DEFAULT_RANGE, Self::DEFAULT_RESOLUTION)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("re range", &self.re)
            .field("im range", &self.im)
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// `n` evenly spaced values from the start to the end of `range`, both
/// included. The last value is the range end exactly. A single value sits at
/// the midpoint.
pub fn linspace(range: &RangeInclusive<Number>, n: NonZeroU16) -> Vec<Number> {
    let (start, end) = (*range.start(), *range.end());
    let n = n.get();
    if n == 1 {
        return vec![start / 2.0 + end / 2.0];
    }
    let last = Number::from(n - 1);
    // weighted sum instead of `start + k * step`, `end - start` may overflow
    (0..n)
        .map(|k| {
            if k == n - 1 {
                end
            } else {
                let t = Number::from(k) / last;
                start * (1.0 - t) + end * t
            }
        })
        .collect()
}

#[derive(Clone, Debug)]
pub struct Sampled {
    pub xs: Vec<Number>,
    pub ys: Vec<Number>,
    pub matrix: Matrix,
}

impl Sampled {
    pub fn undefined_count(&self) -> usize {
        self.matrix
            .iter()
            .flatten()
            .filter(|cell| cell.is_none())
            .count()
    }
}

/// Calls `f` once per grid point, rows along the imaginary axis.
pub fn sample_with<F>(window: &Window, mut f: F) -> Sampled
where
    F: FnMut(Complex) -> Cell,
{
    let xs = window.xs();
    let ys = window.ys();
    let matrix: Matrix = ys
        .iter()
        .map(|&y| {
            xs.iter()
                .map(|&x| f(Complex::new(x, y)))
                .collect::<Vec<Cell>>()
        })
        .collect();
    Sampled { xs, ys, matrix }
}

/// Evaluates `expr` over the whole window. Points where evaluation fails
/// become `None`; sampling itself never fails.
#[cfg(not(feature = "parallel"))]
pub fn sample(expr: &Expression, window: &Window) -> Sampled {
    let mut stack: Vec<Complex> = Vec::new();
    sample_with(window, |z| eval::eval(expr, z, &mut stack).ok())
}

/// Evaluates `expr` over the whole window. Points where evaluation fails
/// become `None`; sampling itself never fails.
#[cfg(feature = "parallel")]
pub fn sample(expr: &Expression, window: &Window) -> Sampled {
    use rayon::prelude::*;

    let xs = window.xs();
    let ys = window.ys();
    let matrix: Matrix = ys
        .par_iter()
        .map_init(Vec::new, |stack, &y| {
            xs.iter()
                .map(|&x| eval::eval(expr, Complex::new(x, y), stack).ok())
                .collect::<Vec<Cell>>()
        })
        .collect();
    Sampled { xs, ys, matrix }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(n: u16) -> NonZeroU16 {
        NonZeroU16::new(n).expect("zero resolution")
    }

    #[test]
    fn linspace_pins_endpoints() {
        assert_eq!(
            linspace(&(-1.0..=1.0), res(5)),
            [-1.0, -0.5, 0.0, 0.5, 1.0]
        );

        let xs = Window::default().xs();
        assert_eq!(xs.len(), 61);
        assert_eq!(xs[0], -core::f64::consts::TAU);
        assert_eq!(xs[60], core::f64::consts::TAU);
    }

    #[test]
    fn single_point_is_midpoint() {
        assert_eq!(linspace(&(-3.0..=1.0), res(1)), [-1.0]);
    }

    #[test]
    fn widest_window_stays_finite() {
        let expr = compile("z").expect("compile failed");
        let sampled = sample(&expr, &Window::symmetric(f64::MAX, res(3)));
        assert_eq!(sampled.xs, [-f64::MAX, 0.0, f64::MAX]);
        assert!(sampled.xs.iter().all(|x| x.is_finite()));
        assert!(sampled.xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(sampled.undefined_count(), 0);
        assert_eq!(sampled.matrix[1][0], Some(Complex::new(-f64::MAX, 0.0)));

        let xs = linspace(&(-f64::MAX..=f64::MAX), res(61));
        assert!(xs.iter().all(|x| x.is_finite()));
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(linspace(&(-f64::MAX..=f64::MAX), res(1)), [0.0]);
    }

    #[test]
    fn window_rejects_bad_bounds() {
        assert!(Window::new(-1.0..=1.0, 0.0..=2.0, res(3)).is_some());
        assert!(Window::new(1.0..=1.0, 0.0..=2.0, res(3)).is_none());
        assert!(Window::new(-1.0..=1.0, 2.0..=0.0, res(3)).is_none());
        assert!(Window::new(-f64::INFINITY..=1.0, 0.0..=2.0, res(3)).is_none());
        assert!(Window::new(-1.0..=1.0, 0.0..=f64::NAN, res(3)).is_none());
    }

    #[test]
    fn sample_identity() {
        let expr = compile("z").expect("compile failed");
        let sampled = sample(&expr, &Window::symmetric(1.0, res(5)));
        assert_eq!(sampled.matrix.len(), 5);
        assert!(sampled.matrix.iter().all(|row| row.len() == 5));

        // row = y, column = x
        assert_eq!(sampled.matrix[2][2], Some(Complex::new(0.0, 0.0)));
        assert_eq!(sampled.matrix[2][4], Some(Complex::new(1.0, 0.0)));
        assert_eq!(sampled.matrix[0][2], Some(Complex::new(0.0, -1.0)));
        assert_eq!(sampled.undefined_count(), 0);
    }

    #[test]
    fn sample_marks_failures_per_cell() {
        let expr = compile("1/z").expect("compile failed");
        let sampled = sample(&expr, &Window::symmetric(1.0, res(5)));
        assert_eq!(sampled.matrix[2][2], None);
        assert_eq!(sampled.undefined_count(), 1);
    }

    #[test]
    fn sample_completes_when_everything_fails() {
        let expr = compile("1/(z - z)").expect("compile failed");
        let sampled = sample(&expr, &Window::symmetric(2.0, res(7)));
        assert_eq!(sampled.undefined_count(), 49);
    }

    #[test]
    fn sample_with_visits_rows_along_imaginary_axis() {
        let mut visited = Vec::new();
        let sampled = sample_with(&Window::symmetric(1.0, res(2)), |z| {
            visited.push(z);
            Some(z)
        });
        assert_eq!(
            visited,
            [
                Complex::new(-1.0, -1.0),
                Complex::new(1.0, -1.0),
                Complex::new(-1.0, 1.0),
                Complex::new(1.0, 1.0),
            ]
        );
        assert_eq!(sampled.xs, [-1.0, 1.0]);
    }
}
