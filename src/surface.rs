// SPDX: CC0-1.0

use crate::{stdlib, Complex, Matrix, Number, Sampled};
use core::{fmt, str::FromStr};
use serde::Serialize;

/// Real-valued samples laid out like the [`Matrix`] they came from.
pub type Surface = Vec<Vec<Number>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Projection {
    Real,
    Imaginary,
    Modulus,
    Argument,
}

impl Projection {
    /// The origin has no argument and projects to NaN.
    pub fn apply(&self, val: Complex) -> Number {
        match self {
            Self::Real => val.re,
            Self::Imaginary => val.im,
            Self::Modulus => val.norm(),
            Self::Argument => {
                if stdlib::is_zero(val) {
                    Number::NAN
                } else {
                    stdlib::principal_arg(val)
                }
            }
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Real => "Re(f(z))",
            Self::Imaginary => "Im(f(z))",
            Self::Modulus => "|f(z)|",
            Self::Argument => "arg(f(z))",
        }
    }
}

/// Undefined cells become NaN.
pub fn project(matrix: &Matrix, projection: Projection) -> Surface {
    matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.map_or(Number::NAN, |val| projection.apply(val)))
                .collect()
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Heatmaps of the real and imaginary parts.
    #[default]
    Flat,
    Modulus,
    Argument,
}

impl ViewMode {
    pub const fn exhaustive() -> &'static [ViewMode] {
        &[Self::Flat, Self::Modulus, Self::Argument]
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Flat => "2d",
            Self::Modulus => "3d-modulus",
            Self::Argument => "3d-argument",
        }
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Flat => "real and imaginary parts as heatmaps",
            Self::Modulus => "surface of the modulus |f(z)|",
            Self::Argument => "surface of the argument arg(f(z))",
        }
    }

    pub const fn projections(&self) -> &'static [Projection] {
        match self {
            Self::Flat => &[Projection::Real, Projection::Imaginary],
            Self::Modulus => &[Projection::Modulus],
            Self::Argument => &[Projection::Argument],
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownViewMode;

impl fmt::Display for UnknownViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown view mode, expected one of")?;
        for (idx, mode) in ViewMode::exhaustive().iter().enumerate() {
            let sep = if idx == 0 { " " } else { ", " };
            write!(f, "{sep}'{mode}'")?;
        }
        Ok(())
    }
}

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "3d-arg" {
            return Ok(Self::Argument);
        }
        ViewMode::exhaustive()
            .iter()
            .find(|mode| mode.name() == s)
            .copied()
            .ok_or(UnknownViewMode)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NamedSurface {
    pub name: &'static str,
    pub data: Surface,
}

/// Everything a renderer needs. NaN cells serialise as `null`.
#[derive(Clone, Debug, Serialize)]
pub struct PlotData {
    pub xs: Vec<Number>,
    pub ys: Vec<Number>,
    pub surfaces: Vec<NamedSurface>,
}

pub fn render(sampled: &Sampled, mode: ViewMode) -> PlotData {
    PlotData {
        xs: sampled.xs.clone(),
        ys: sampled.ys.clone(),
        surfaces: mode
            .projections()
            .iter()
            .map(|&projection| NamedSurface {
                name: projection.label(),
                data: project(&sampled.matrix, projection),
            })
            .collect(),
    }
}
