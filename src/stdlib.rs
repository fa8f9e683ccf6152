// SPDX: CC0-1.0

use crate::{eval::*, Complex, Number};
use core::f64::consts; // assumes Number = f64

pub const Z: &str = "z";

/// Every operator, function and constant, plus the free variable `z`.
pub fn standard_idents() -> Idents {
    let mut ret = constant_idents();
    ret.insert(Z.into(), Ident::Var);
    ret
}

/// Like [`standard_idents`] but without any variable, for expressions that
/// must evaluate to a single number.
pub fn constant_idents() -> Idents {
    let mut ret = Idents::new();

    // operators
    for op in [
        OperatorTyp::Neg,
        OperatorTyp::Pos,
        OperatorTyp::Add,
        OperatorTyp::Sub,
        OperatorTyp::Mul,
        OperatorTyp::Div,
        OperatorTyp::Pow,
    ] {
        let fun = op.fun();
        ret.insert(fun.name.into(), Ident::Fun(fun));
    }

    for fun in [
        Fun::new("exp", 1, exp),
        Fun::ranged("log", 1, 2, log),
        Fun::new("ln", 1, ln),
        Fun::new("sqrt", 1, sqrt),
        Fun::new("abs", 1, abs),
        Fun::new("arg", 1, arg),
        Fun::new("Re", 1, re),
        Fun::new("Im", 1, im),
        Fun::new("re", 1, re),
        Fun::new("im", 1, im),
        Fun::new("conj", 1, conj),
        // trig
        Fun::new("sin", 1, sin),
        Fun::new("cos", 1, cos),
        Fun::new("tan", 1, tan),
        Fun::new("asin", 1, arcsin),
        Fun::new("acos", 1, arccos),
        Fun::new("atan", 1, arctan),
        Fun::new("sinh", 1, sinh),
        Fun::new("cosh", 1, cosh),
        Fun::new("tanh", 1, tanh),
    ] {
        ret.insert(fun.name.into(), Ident::Fun(fun));
    }

    ret.insert("pi".into(), Ident::Const(real(consts::PI)));
    ret.insert("π".into(), Ident::Const(real(consts::PI)));
    ret.insert("tau".into(), Ident::Const(real(consts::TAU)));
    ret.insert("e".into(), Ident::Const(real(consts::E)));
    ret.insert("i".into(), Ident::Const(Complex::new(0.0, 1.0)));
    ret
}

const fn real(re: Number) -> Complex {
    Complex::new(re, 0.0)
}

pub fn is_zero(z: Complex) -> bool {
    z.re == 0.0 && z.im == 0.0
}

/// Angle of `z` in (-π, π]. A negative-zero imaginary part on the negative
/// real axis would give -π from `atan2`, so it is folded onto π.
pub fn principal_arg(z: Complex) -> Number {
    let angle = z.im.atan2(z.re);
    if angle == -consts::PI {
        consts::PI
    } else {
        angle
    }
}

fn expect_n<const N: usize>(args: &[Complex]) -> Result<[Complex; N], DomainErr> {
    args.try_into().map_err(|_| DomainErr::BadArgs)
}

pub fn neg(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(-x)
}

pub fn pos(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x)
}

pub fn add(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x, y] = expect_n::<2>(args)?;
    Ok(x + y)
}

pub fn sub(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x, y] = expect_n::<2>(args)?;
    Ok(x - y)
}

pub fn mul(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x, y] = expect_n::<2>(args)?;
    Ok(x * y)
}

pub fn div(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x, y] = expect_n::<2>(args)?;
    if is_zero(y) {
        Err(DomainErr::DivByZero)
    } else {
        Ok(x / y)
    }
}

pub fn pow(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x, exp] = expect_n::<2>(args)?;
    if is_zero(x) {
        return if is_zero(exp) {
            Ok(real(1.0))
        } else if exp.re > 0.0 {
            Ok(real(0.0))
        } else {
            // 0^w with re(w) <= 0 diverges
            Err(DomainErr::DivByZero)
        };
    }
    // integer powers by repeated multiplication stay exact on the axes
    if exp.im == 0.0 && exp.re.fract() == 0.0 && exp.re.abs() <= Number::from(i32::MAX) {
        Ok(x.powi(exp.re as i32))
    } else {
        Ok(x.powc(exp))
    }
}

fn ln_nonzero(x: Complex) -> Result<Complex, DomainErr> {
    if is_zero(x) {
        Err(DomainErr::LogOfZero)
    } else {
        Ok(x.ln())
    }
}

pub fn exp(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.exp())
}

/// Natural logarithm, or logarithm to the base given as second argument.
pub fn log(args: &[Complex]) -> Result<Complex, DomainErr> {
    match *args {
        [x] => ln_nonzero(x),
        [x, base] => {
            let num = ln_nonzero(x)?;
            let den = ln_nonzero(base)?;
            div(&[num, den])
        }
        _ => Err(DomainErr::BadArgs),
    }
}

pub fn ln(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    ln_nonzero(x)
}

pub fn sqrt(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.sqrt())
}

pub fn abs(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(real(x.norm()))
}

pub fn arg(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    if is_zero(x) {
        Err(DomainErr::ArgOfZero)
    } else {
        Ok(real(principal_arg(x)))
    }
}

pub fn re(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(real(x.re))
}

pub fn im(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(real(x.im))
}

pub fn conj(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.conj())
}

pub fn sin(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.sin())
}

pub fn cos(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.cos())
}

pub fn tan(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.tan())
}

pub fn arcsin(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.asin())
}

pub fn arccos(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.acos())
}

pub fn arctan(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.atan())
}

pub fn sinh(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.sinh())
}

pub fn cosh(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.cosh())
}

pub fn tanh(args: &[Complex]) -> Result<Complex, DomainErr> {
    let [x] = expect_n::<1>(args)?;
    Ok(x.tanh())
}
