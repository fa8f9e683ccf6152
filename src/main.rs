// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use complex_field::{
    eval::{Expression, Idents},
    gnuplot::{self, ScriptOpts},
    lex::{LexErrTyp, Lexer, TokTyp},
    parse::{self, ParseErr, ParseErrTyp},
    sample,
    shell::{self, Command},
    stdlib,
    surface::{self, PlotData, ViewMode},
    Complex, Number, Window,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    num::NonZeroU16,
    process::{self, Child, ExitCode},
    sync::Arc,
};

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_filename(now: DateTime<Local>, ext: &str) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        ext
    )
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    expr: Option<Arc<String>>,
    prog: Option<Expression>, // compiled from `expr`, cleared when it changes
    idents: Idents,
    win: Window,
    view: ViewMode,
    last_plot: Option<PlotData>,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        expr: Some(Arc::new(String::from("sin(z)"))),
        prog: None,
        idents: stdlib::standard_idents(),
        win: Window::default(),
        view: ViewMode::default(),
        last_plot: None,
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        if let Some(ref expr) = state.expr {
            writeln!(stdout, "f(z) = {expr} [{}]", state.view)?;
        } else {
            writeln!(stdout, "f(z) is not set")?;
        }

        let try_cmd = shell::input(&mut stdout, "> ")?.to_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetExpr => set_expr(&mut stdout, &mut state)?,

                Command::SetView => set_view(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Plot => plot_expr(&mut stdout, &mut state)?,

                Command::Export => export_plot(&mut stdout, &state)?,

                Command::Calc => calc(&mut stdout)?,

                Command::PrintProg => {
                    compile_expr(&mut stdout, &mut state)?;
                    if let Some(ref prog) = state.prog {
                        shell::dump_program(&mut stdout, prog, format_args!("program"))?;
                    } else {
                        shell::prog_undefined(&mut stdout)?;
                    }
                }
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn set_view<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    for mode in ViewMode::exhaustive() {
        writeln!(out, "{name}: {help}", name = mode.name(), help = mode.help())?;
    }
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;
    match shell::read_fromstr::<_, ViewMode>(
        &mut out,
        format_args!("?view (is {cur}) = ", cur = state.view),
        true,
    )? {
        Ok(Some(new)) => state.view = new,
        Ok(None) | Err(_) => {}
    }
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let win = &state.win;
    let mut bounds = [
        ("re min", *win.re.start()),
        ("re max", *win.re.end()),
        ("im min", *win.im.start()),
        ("im max", *win.im.end()),
    ];
    for (name, dst) in bounds.iter_mut() {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    let [(_, re_min), (_, re_max), (_, im_min), (_, im_max)] = bounds;
    if Window::new(re_min..=re_max, im_min..=im_max, state.win.resolution).is_none() {
        writeln!(
            out,
            "error: bounds must be finite and each minimum less than its maximum"
        )?;
        return Ok(());
    }

    writeln!(out, "note: resolution is the number of samples per axis")?;
    let mut resolution = state.win.resolution;
    match shell::read_fromstr::<_, NonZeroU16>(
        &mut out,
        format_args!("?resolution (is {resolution}) = "),
        true,
    )? {
        Ok(Some(new)) => resolution = new,
        Ok(None) => {}
        Err(_) => return Ok(()),
    }

    if let Some(win) = Window::new(re_min..=re_max, im_min..=im_max, resolution) {
        state.win = win;
    }
    Ok(())
}

fn plot_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    compile_expr(&mut out, state)?;

    let (expr, prog) = if let Some(ref expr) = state.expr {
        if let Some(ref prog) = state.prog {
            (expr, prog)
        } else {
            shell::prog_undefined(&mut out)?;
            return Ok(());
        }
    } else {
        shell::expr_undefined(&mut out)?;
        return Ok(());
    };

    // a newer plot supersedes the previous window
    if let Some(old_child) = state.gnuplot.take() {
        gnuplot::stop(old_child).context("failed to stop previous gnuplot child")?;
    }

    // evaluate program
    let sampled = sample(prog, &state.win);
    let undefined = sampled.undefined_count();
    let total = sampled.xs.len() * sampled.ys.len();
    writeln!(out, "evaluation ok ({undefined} of {total} points undefined)")?;
    let data = surface::render(&sampled, state.view);

    let now = Local::now();
    let data_path = output_filename(now, "data");
    let gnuplot_path = output_filename(now, "gnuplot");
    let svg_path = output_filename(now, "svg");

    let mut data_file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );
    gnuplot::write_data(&mut data_file, &data).context("failed to write to output data file")?;
    data_file.flush()?;
    data_file.get_mut().sync_data()?;
    drop(data_file);

    let mut script = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );
    let title = format!("f(z) = {expr}");
    gnuplot::write_script(
        &mut script,
        &data,
        state.view,
        &state.win,
        &ScriptOpts {
            data_path: &data_path,
            svg_path: &svg_path,
            title: &title,
            size: OUTPUT_RES,
        },
    )
    .context("failed to write to output gnuplot file")?;
    // done with the file
    script.flush()?;
    script.get_mut().sync_data()?;
    drop(script);

    // spawn gnuplot and provide the path to the file
    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${{PATH}}?)")?;

    state.gnuplot = Some(child);
    state.last_plot = Some(data);
    Ok(())
}

fn export_plot<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let data = if let Some(ref data) = state.last_plot {
        data
    } else {
        shell::plot_undefined(&mut out)?;
        return Ok(());
    };

    let json_path = output_filename(Local::now(), "json");
    let mut json = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&json_path)
            .context("failed to open output json file")?,
    );
    serde_json::to_writer(&mut json, data).context("failed to write to output json file")?;
    json.flush()?;
    json.get_mut().sync_data()?;
    writeln!(out, "wrote {json_path}")?;
    Ok(())
}

fn calc<W: Write>(mut out: W) -> anyhow::Result<()> {
    let input = shell::input(&mut out, "= ")?;
    if input.is_empty() {
        return Ok(());
    }
    let input = Arc::new(input);
    let idents = stdlib::constant_idents();

    match parse::parse(Lexer::new(&input), &idents) {
        Ok(prog) => match prog.eval(Complex::new(0.0, 0.0)) {
            Ok(val) => writeln!(out, "{val}")?,
            Err(err) => writeln!(out, "undefined: {err}")?,
        },
        Err(err) => report_parse_err(&mut out, &err, &idents)?,
    }
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    // read input expression
    let input = shell::input(&mut out, "f(z) = ")?;
    if input.is_empty() {
        return Ok(());
    }

    state.prog = None;
    state.expr = Some(Arc::new(input));

    // lex, parse & compile input
    compile_expr(&mut out, state)?;

    Ok(())
}

fn compile_expr<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let input = if let Some(ref expr) = state.expr {
        expr
    } else {
        return Ok(());
    };

    // expression hasn't changed since the last compilation
    if state.prog.is_some() {
        return Ok(());
    }

    let lexer = Lexer::new(input);
    match parse::parse(lexer, &state.idents) {
        Ok(p) => {
            state.prog = Some(p);
        }

        Err(err) => report_parse_err(&mut out, &err, &state.idents)?,
    };

    Ok(())
}

fn report_parse_err<W: Write>(mut out: W, err: &ParseErr, idents: &Idents) -> anyhow::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, &err.loc)?;
    writeln!(out, "parse error: {}", err.typ)?;
    match err.typ {
        ParseErrTyp::LexErr(lex_err) => {
            match lex_err {
                LexErrTyp::InvalidChar => {
                    writeln!(
                        out,
                        "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/^,()"
                    )?;
                }
                LexErrTyp::Unsupported(typ) => match typ {
                    TokTyp::Ident
                    | TokTyp::Number
                    | TokTyp::Imag
                    | TokTyp::Op(_)
                    | TokTyp::Comma
                    | TokTyp::OpenParen
                    | TokTyp::CloseParen => {}

                    TokTyp::XGreater | TokTyp::XLess => {
                        writeln!(out, "note: expected an expression but found an inequality")?;
                    }
                    TokTyp::XEqual => {
                        writeln!(out, "note: expected an expression but found an equation")?;
                    }
                    TokTyp::XPipe => writeln!(
                        out,
                        "note: use the 'abs' function to compute the modulus"
                    )?,
                    TokTyp::XOpenSquareBracket
                    | TokTyp::XCloseSquareBracket
                    | TokTyp::XOpenCurly
                    | TokTyp::XCloseCurly => {
                        writeln!(out, "note: only parentheses can be used for grouping")?;
                    }
                },
            }
        }

        ParseErrTyp::ParseNum(_) | ParseErrTyp::NumOutOfRange => {
            writeln!(out, "note: parsing as floating point number")?
        }

        ParseErrTyp::StackMismatch { .. } => {
            writeln!(
                out,
                "note: implicit multiplication is not supported, so for example '5z' would be '5*z'",
            )?;
        }

        ParseErrTyp::UndefinedIdent => {
            if let Some((key, ident)) = shell::similar_ident(idents, err.loc.get()) {
                writeln!(out, "note: {} '{key}' has a similar name", ident.kind())?;
            }
        }

        ParseErrTyp::ParenMismatch
        | ParseErrTyp::StrayComma
        | ParseErrTyp::Grouping { .. }
        | ParseErrTyp::Arity { .. }
        | ParseErrTyp::Empty
        | ParseErrTyp::MissingArgs { .. } => {}
    }
    Ok(())
}
