// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Complex};
use core::fmt;
use std::{collections::HashMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Pos,
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Pos => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Pos => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Pow => Right,
        }
    }

    /// Prefix operators take their operand from the right only.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg | Self::Pos)
    }

    pub const fn arity(&self) -> usize {
        if self.is_prefix() {
            1
        } else {
            2
        }
    }

    pub const fn fun(&self) -> Fun {
        match self {
            Self::Neg => Fun::new("neg", 1, stdlib::neg),
            Self::Pos => Fun::new("pos", 1, stdlib::pos),
            Self::Add => Fun::new("add", 2, stdlib::add),
            Self::Sub => Fun::new("sub", 2, stdlib::sub),
            Self::Mul => Fun::new("mul", 2, stdlib::mul),
            Self::Div => Fun::new("div", 2, stdlib::div),
            Self::Pow => Fun::new("pow", 2, stdlib::pow),
        }
    }
}

/// Why a single evaluation produced no value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainErr {
    DivByZero,
    LogOfZero,
    ArgOfZero,
    NonFinite,
    BadArgs,
}

impl fmt::Display for DomainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivByZero => write!(f, "division by zero"),
            Self::LogOfZero => write!(f, "logarithm of zero"),
            Self::ArgOfZero => write!(f, "argument of zero is undefined"),
            Self::NonFinite => write!(f, "result is not finite"),
            Self::BadArgs => write!(f, "wrong number of arguments"),
        }
    }
}

impl std::error::Error for DomainErr {}

pub type FunPtr = fn(&[Complex]) -> Result<Complex, DomainErr>;

#[derive(Clone, Copy)]
pub struct Fun {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub fun: FunPtr,
}

impl Fun {
    pub const fn new(name: &'static str, arity: usize, fun: FunPtr) -> Self {
        Self::ranged(name, arity, arity, fun)
    }

    pub const fn ranged(name: &'static str, min_args: usize, max_args: usize, fun: FunPtr) -> Self {
        Self {
            name,
            min_args,
            max_args,
            fun,
        }
    }

    pub const fn accepts(&self, argc: usize) -> bool {
        self.min_args <= argc && argc <= self.max_args
    }
}

impl fmt::Debug for Fun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fun")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Val(Complex),
    Var,
    Call { fun: Fun, argc: usize },
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Var => write!(f, "load '{}'", self.loc.get()),
            OperationTyp::Call { fun, argc } => write!(
                f,
                "call '{name}' with {argc} argument{s}",
                name = fun.name,
                s = if argc == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Var,
    Const(Complex),
    Fun(Fun),
}

impl Ident {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Var => "variable",
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

#[derive(Clone, Debug, Eq)]
pub enum IdentKey {
    Arc(SubStr),
    Static(&'static str),
}

impl PartialEq for IdentKey {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl core::hash::Hash for IdentKey {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.get().hash(state)
    }
}

impl IdentKey {
    pub fn get(&self) -> &str {
        match self {
            Self::Arc(s) => s.get(),
            Self::Static(s) => s,
        }
    }
}

impl fmt::Display for IdentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arc(s) => write!(f, "{s}"),
            Self::Static(s) => write!(f, "{s}"),
        }
    }
}

impl From<SubStr> for IdentKey {
    fn from(s: SubStr) -> Self {
        Self::Arc(s)
    }
}

impl From<&'static str> for IdentKey {
    fn from(s: &'static str) -> Self {
        Self::Static(s)
    }
}

pub type Idents = HashMap<IdentKey, Ident>;

/// A compiled formula in postfix order. Symbols are already resolved, so
/// evaluating it needs nothing but the value of the free variable.
#[derive(Clone, Debug)]
pub struct Expression {
    src: Arc<String>,
    pub(crate) ops: Vec<Operation>,
}

impl Expression {
    #[inline]
    pub const fn new(src: Arc<String>, ops: Vec<Operation>) -> Self {
        Self { src, ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Evaluate at `z` with a fresh stack.
    pub fn eval(&self, z: Complex) -> Result<Complex, DomainErr> {
        eval(self, z, &mut Vec::with_capacity(self.ops.len()))
    }
}

pub fn is_finite(z: Complex) -> bool {
    z.re.is_finite() && z.im.is_finite()
}

/// Runs `expr` with its free variable bound to `z`. `stack` is scratch space
/// and is cleared first.
pub fn eval(expr: &Expression, z: Complex, stack: &mut Vec<Complex>) -> Result<Complex, DomainErr> {
    stack.clear();

    for op in expr.ops() {
        match op.typ {
            OperationTyp::Val(val) => stack.push(val),

            OperationTyp::Var => stack.push(z),

            OperationTyp::Call { fun, argc } => {
                // stack: ...a, b, c, d
                //                 ^^^^ args if argc is 2
                let base = stack.len().saturating_sub(argc);
                let val = (fun.fun)(&stack[base..])?;
                if !is_finite(val) {
                    return Err(DomainErr::NonFinite);
                }
                stack.truncate(base);
                stack.push(val);
            }
        }
    }

    match stack.as_slice() {
        // a bare `z` never went through a call
        [val] if !is_finite(*val) => Err(DomainErr::NonFinite),
        [val] => Ok(*val),
        // compilation guarantees a single result
        _ => Err(DomainErr::BadArgs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    fn c(re: f64, im: f64) -> Complex {
        Complex::new(re, im)
    }

    fn close(a: Complex, b: Complex) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn evaluates_polynomial() {
        let expr = compile("z^2 + 2*z + 1").expect("compile failed");
        let val = expr.eval(c(1.0, 1.0)).expect("undefined");
        // (1+i)^2 + 2(1+i) + 1 = 2i + 2 + 2i + 1
        assert!(close(val, c(3.0, 4.0)), "{val}");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let expr = compile("sin(z) * exp(-z) / (z - 3i)").expect("compile failed");
        let z = c(0.7, -1.3);
        let mut stack = Vec::new();
        let a = eval(&expr, z, &mut stack);
        let b = eval(&expr, z, &mut stack);
        assert_eq!(a, b);
        assert_eq!(a, expr.eval(z));
    }

    #[test]
    fn recompiling_is_equivalent() {
        let src = "log(z) + sqrt(z)*π";
        let a = compile(src).expect("compile failed");
        let b = compile(src).expect("compile failed");
        for z in [c(1.0, 0.0), c(-2.0, 0.5), c(0.0, -3.0)] {
            assert_eq!(a.eval(z), b.eval(z));
        }
    }

    #[test]
    fn domain_failures() {
        let recip = compile("1/z").expect("compile failed");
        assert_eq!(recip.eval(c(0.0, 0.0)), Err(DomainErr::DivByZero));
        assert!(close(recip.eval(c(0.0, 1.0)).expect("undefined"), c(0.0, -1.0)));

        let log = compile("log(z)").expect("compile failed");
        assert_eq!(log.eval(c(0.0, 0.0)), Err(DomainErr::LogOfZero));

        let overflow = compile("exp(exp(z))").expect("compile failed");
        assert_eq!(overflow.eval(c(10.0, 0.0)), Err(DomainErr::NonFinite));
    }

    #[test]
    fn non_finite_variable_is_undefined() {
        let ident = compile("z").expect("compile failed");
        assert_eq!(ident.eval(c(f64::NAN, 0.0)), Err(DomainErr::NonFinite));
        assert_eq!(ident.eval(c(0.0, f64::INFINITY)), Err(DomainErr::NonFinite));
        assert_eq!(ident.eval(c(1.0, -2.0)), Ok(c(1.0, -2.0)));
    }

    #[test]
    fn precedence_and_associativity() {
        let expr = compile("2^3^2").expect("compile failed");
        assert!(close(expr.eval(c(0.0, 0.0)).expect("undefined"), c(512.0, 0.0)));

        let expr = compile("-z^2").expect("compile failed");
        assert!(close(expr.eval(c(3.0, 0.0)).expect("undefined"), c(-9.0, 0.0)));

        let expr = compile("8 / 2 / 2 - 1 - 1").expect("compile failed");
        assert!(close(expr.eval(c(0.0, 0.0)).expect("undefined"), c(0.0, 0.0)));

        let expr = compile("2^-z").expect("compile failed");
        assert!(close(expr.eval(c(1.0, 0.0)).expect("undefined"), c(0.5, 0.0)));
    }

    #[test]
    fn exponent_literals() {
        let expr = compile("1e-3 * z + 2.5e2i").expect("compile failed");
        assert!(close(expr.eval(c(1000.0, 0.0)).expect("undefined"), c(1.0, 250.0)));
    }

    #[test]
    fn function_without_parentheses_binds_tightly() {
        let expr = compile("sin z + 1").expect("compile failed");
        let z = c(0.3, 0.2);
        assert!(close(expr.eval(z).expect("undefined"), z.sin() + 1.0));
    }

    #[test]
    fn display_operations() {
        let expr = compile("log(z, 2)").expect("compile failed");
        let dump: Vec<String> = expr.ops().map(ToString::to_string).collect();
        assert_eq!(
            dump,
            ["load 'z'", "push 2+0i", "call 'log' with 2 arguments"]
        );
    }
}
