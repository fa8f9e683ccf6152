// SPDX: CC0-1.0

use crate::{
    eval::{Expression, Ident, IdentKey, Idents},
    lex::SubStr,
};
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
    SetExpr,
    SetView,
    SetWin,
    Plot,
    Export,
    Calc,
    PrintProg,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetExpr,
            Self::SetView,
            Self::SetWin,
            Self::Plot,
            Self::Export,
            Self::Calc,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetExpr => "set expression f(z) to visualize",
            Self::SetView => "choose between real/imaginary heatmaps, modulus and argument",
            Self::SetWin => "set window parameters",
            Self::Plot => "plot the expression that has been set",
            Self::Export => "write the last plot as json",
            Self::Calc => "evaluate an expression without variables",
            Self::PrintProg => "print program compiled from the expression (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetExpr => "set",
            Self::SetView => "view",
            Self::SetWin => "window",
            Self::Plot => "plot",
            Self::Export => "export",
            Self::Calc => "calc",
            Self::PrintProg => "prog",
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

/// Prints the source of `span` with carets under the span. Columns count
/// characters, so spans after `π` still line up.
pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.column()),
        "^".repeat(span.width().max(1))
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Expression,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

/// Known identifier whose name is closest to `text`, if any is reasonably close.
pub fn similar_ident<'a>(idents: &'a Idents, text: &str) -> Option<(&'a IdentKey, &'a Ident)> {
    let text = text.to_lowercase();
    idents
        .iter()
        .map(|(k, v)| {
            (
                strsim::normalized_damerau_levenshtein(&text, &k.get().to_lowercase()),
                (k, v),
            )
        })
        .filter(|(sim, _)| *sim > 0.3)
        // ties go to the alphabetically first name so hints are stable
        .max_by(|(a_sim, (a_key, _)), (b_sim, (b_key, _))| {
            a_sim
                .total_cmp(b_sim)
                .then_with(|| b_key.get().cmp(a_key.get()))
        })
        .map(|(_, kv)| kv)
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}

pub fn prog_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no program is defined")
}

pub fn plot_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: nothing has been plotted yet")
}
