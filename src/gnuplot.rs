// SPDX: CC0-1.0

use crate::{
    surface::{PlotData, ViewMode},
    Window,
};
use std::{
    io::{self, Write},
    process::{Child, ExitStatus},
};

#[derive(Clone, Debug)]
pub struct ScriptOpts<'a> {
    pub data_path: &'a str,
    pub svg_path: &'a str,
    pub title: &'a str,
    pub size: [u32; 2],
}

/// Writes each surface as one gnuplot data block of `x y value` lines, a
/// blank line after each row. Blocks are separated by two blank lines so
/// `index n` selects the n-th surface. Undefined cells are written as `NaN`.
pub fn write_data<W: Write>(mut out: W, data: &PlotData) -> io::Result<()> {
    for (idx, surface) in data.surfaces.iter().enumerate() {
        if idx != 0 {
            writeln!(out)?;
            writeln!(out)?;
        }
        writeln!(out, "# {}", surface.name)?;
        for (row, y) in surface.data.iter().zip(&data.ys) {
            for (val, x) in row.iter().zip(&data.xs) {
                writeln!(out, "{x} {y} {val}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Writes a script that renders to an svg file, then again to the default
/// terminal.
pub fn write_script<W: Write>(
    mut out: W,
    data: &PlotData,
    mode: ViewMode,
    win: &Window,
    opts: &ScriptOpts<'_>,
) -> io::Result<()> {
    writeln!(out, "reset")?;
    writeln!(out, "set term push")?;
    // set output info
    let [width, height] = opts.size;
    writeln!(out, "set terminal svg size {width},{height} enhanced")?;
    writeln!(out, "set output '{}'", opts.svg_path)?;

    // set window
    writeln!(
        out,
        "set xrange[{min}:{max}]",
        min = win.re.start(),
        max = win.re.end()
    )?;
    writeln!(
        out,
        "set yrange[{min}:{max}]",
        min = win.im.start(),
        max = win.im.end()
    )?;
    // (granularity determined by data)

    // configure appearence
    writeln!(out, r#"set xlabel "Re(z)""#)?;
    writeln!(out, r#"set ylabel "Im(z)""#)?;
    writeln!(out, "set tics out nomirror")?;
    writeln!(out, "set datafile missing NaN")?;
    match mode {
        ViewMode::Flat => {
            writeln!(out, "set view map")?;
            writeln!(
                out,
                "set palette defined (0 '#440154', 1 '#3b528b', 2 '#21918c', 3 '#5ec962', 4 '#fde725')"
            )?;
        }
        ViewMode::Modulus => {
            writeln!(out, "set view 60,30")?;
            writeln!(
                out,
                "set palette defined (0 '#440154', 1 '#3b528b', 2 '#21918c', 3 '#5ec962', 4 '#fde725')"
            )?;
        }
        ViewMode::Argument => {
            writeln!(out, "set view 60,30")?;
            // cyclic palette for phase
            writeln!(out, "set palette model HSV defined (0 0 1 1, 1 1 1 1)")?;
            writeln!(out, "set cbrange[-pi:pi]")?;
        }
    }

    write_plot(&mut out, data, mode, opts)?;

    // display window
    writeln!(out, "set output")?;
    writeln!(out, "set term pop")?;
    write_plot(&mut out, data, mode, opts)?;
    Ok(())
}

fn write_plot<W: Write>(
    mut out: W,
    data: &PlotData,
    mode: ViewMode,
    opts: &ScriptOpts<'_>,
) -> io::Result<()> {
    let data_path = opts.data_path;
    let title = opts.title;
    match mode {
        ViewMode::Flat => {
            let columns = data.surfaces.len().max(1);
            writeln!(
                out,
                r#"set multiplot layout 1,{columns} title "{title}" noenhanced"#
            )?;
            for (idx, surface) in data.surfaces.iter().enumerate() {
                writeln!(out, r#"set title "{}" noenhanced"#, surface.name)?;
                writeln!(
                    out,
                    "splot '{data_path}' index {idx} using 1:2:3 with pm3d notitle"
                )?;
            }
            writeln!(out, "unset multiplot")?;
        }
        ViewMode::Modulus | ViewMode::Argument => {
            writeln!(out, r#"set title "{title}" noenhanced"#)?;
            for (idx, surface) in data.surfaces.iter().enumerate() {
                writeln!(out, r#"set zlabel "{}" noenhanced"#, surface.name)?;
                writeln!(
                    out,
                    r#"splot '{data_path}' index {idx} using 1:2:3 with pm3d title "{}" noenhanced"#,
                    surface.name
                )?;
            }
        }
    }
    Ok(())
}

/// Kills a gnuplot window and reaps the process.
pub fn stop(mut child: Child) -> io::Result<ExitStatus> {
    child.kill()?;
    child.wait()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, sample, surface::render};
    use core::num::NonZeroU16;

    fn plot_data(src: &str, mode: ViewMode) -> (PlotData, Window) {
        let expr = compile(src).expect("compile failed");
        let win = Window::symmetric(1.0, NonZeroU16::new(2).expect("zero resolution"));
        (render(&sample(&expr, &win), mode), win)
    }

    #[test]
    fn data_blocks() {
        let (data, _) = plot_data("z", ViewMode::Flat);
        let mut out = Vec::new();
        write_data(&mut out, &data).expect("write failed");
        let text = String::from_utf8(out).expect("not utf-8");
        assert_eq!(
            text,
            "# Re(f(z))\n\
             -1 -1 -1\n\
             1 -1 1\n\
             \n\
             -1 1 -1\n\
             1 1 1\n\
             \n\
             \n\
             \n\
             # Im(f(z))\n\
             -1 -1 -1\n\
             1 -1 -1\n\
             \n\
             -1 1 1\n\
             1 1 1\n\
             \n"
        );
    }

    #[test]
    fn undefined_cells_are_written_as_nan() {
        let (data, _) = plot_data("1/(z - z)", ViewMode::Modulus);
        let mut out = Vec::new();
        write_data(&mut out, &data).expect("write failed");
        let text = String::from_utf8(out).expect("not utf-8");
        assert!(text.lines().skip(1).filter(|l| !l.is_empty()).all(|l| l.ends_with(" NaN")));
    }

    #[test]
    fn script_plots_every_surface_twice() {
        let (data, win) = plot_data("z", ViewMode::Flat);
        let opts = ScriptOpts {
            data_path: "out.data",
            svg_path: "out.svg",
            title: "f(z) = z",
            size: [800, 600],
        };
        let mut out = Vec::new();
        write_script(&mut out, &data, ViewMode::Flat, &win, &opts).expect("write failed");
        let text = String::from_utf8(out).expect("not utf-8");
        assert!(text.contains("set output 'out.svg'"));
        assert!(text.contains("set xrange[-1:1]"));
        assert_eq!(text.matches("index 0 using").count(), 2);
        assert_eq!(text.matches("index 1 using").count(), 2);
        assert!(text.contains("set view map"));
    }

    #[test]
    fn stopped_child_is_reaped() {
        let child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");
        let status = stop(child).expect("stop failed");
        // killed by a signal, not exited
        assert!(!status.success());
        assert_eq!(status.code(), None);
    }
}
