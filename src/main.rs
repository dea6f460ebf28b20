// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use graph_cross::{
    intersect::{self, Options},
    lex::{LexErrTyp, SubStr, TokTyp},
    parse::ParseErrTyp,
    shell::{self, Command},
    stdlib::{self, Builtin},
    validate, Expr, Number, Point, Window,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
};
use tracing_subscriber::EnvFilter;

const OUTPUT_RES: [u32; 2] = [1920, 1080];

fn output_filename(now: DateTime<Local>, what: &str, ext: &str) -> String {
    format!(
        "{}_{what}-{}.{ext}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(concat!(env!("CARGO_CRATE_NAME"), "=warn"))),
        )
        .with_writer(std::io::stderr)
        .init();

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

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    F,
    G,
}

impl Slot {
    const fn name(&self) -> &'static str {
        match self {
            Self::F => "f",
            Self::G => "g",
        }
    }
}

#[derive(Debug)]
struct State {
    f: Option<Expr>,
    g: Option<Expr>,
    win: Window,
    opts: Options,
    gnuplot: Option<Child>,
}

impl State {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Expr> {
        match slot {
            Slot::F => &mut self.f,
            Slot::G => &mut self.g,
        }
    }
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        f: Expr::new("x^2").ok(),
        g: Expr::new("4").ok(),
        win: Window::default(),
        opts: Options::default(),
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        for (slot, expr) in [(Slot::F, &state.f), (Slot::G, &state.g)] {
            if let Some(expr) = expr {
                writeln!(stdout, "{}(x) = {expr}", slot.name())?;
            } else {
                writeln!(stdout, "{}(x) is not set", slot.name())?;
            }
        }

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetF => set_expr(&mut stdout, &mut state, Slot::F)?,

                Command::SetG => set_expr(&mut stdout, &mut state, Slot::G)?,

                Command::Eval => eval_at(&mut stdout, &state)?,

                Command::Cross => {
                    if let Some(points) = cross(&mut stdout, &state)? {
                        if points.is_empty() {
                            writeln!(stdout, "no intersections on {:?}", state.win.x)?;
                        }
                        for point in points {
                            writeln!(stdout, "  {point}")?;
                        }
                    }
                }

                Command::Plot => plot(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::PrintProg => {
                    for (slot, expr) in [(Slot::F, &state.f), (Slot::G, &state.g)] {
                        if let Some(expr) = expr {
                            shell::dump_program(&mut stdout, expr, format_args!("{}", slot.name()))?;
                        } else {
                            shell::expr_undefined(&mut stdout, slot.name())?;
                        }
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

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {:#}", state.win)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("x min", &mut state.win.x.start),
        ("x max", &mut state.win.x.end),
        ("y min", &mut state.win.y.start),
        ("y max", &mut state.win.y.end),
        ("step", &mut state.win.step),
    ] {
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

    if !(state.win.x.start < state.win.x.end) {
        writeln!(out, "warning: x min must be less than x max, nothing will be sampled")?;
    }
    if !(state.win.step > 0.0) {
        writeln!(out, "warning: step must be positive, nothing will be sampled")?;
    }

    Ok(())
}

fn both(state: &State) -> Result<(&Expr, &Expr), Slot> {
    match (&state.f, &state.g) {
        (Some(f), Some(g)) => Ok((f, g)),
        (None, _) => Err(Slot::F),
        (_, None) => Err(Slot::G),
    }
}

fn eval_at<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let x = match shell::read_fromstr::<_, Number>(&mut out, "x = ", false)? {
        Ok(Some(x)) if x.is_finite() => x,
        Ok(_) => {
            writeln!(out, "error: x must be a finite number")?;
            return Ok(());
        }
        Err(_) => return Ok(()),
    };

    for (slot, expr) in [(Slot::F, &state.f), (Slot::G, &state.g)] {
        let name = slot.name();
        match expr {
            Some(expr) => match expr.eval(x) {
                Ok(y) => writeln!(out, "{name}({x}) = {y}")?,
                Err(err) => {
                    if let Some(op) = &err.op {
                        shell::underline(&mut out, &op.loc)?;
                    }
                    writeln!(out, "{name}({x}) is undefined: {err}")?;
                }
            },
            None => shell::expr_undefined(&mut out, name)?,
        }
    }
    Ok(())
}

fn cross<W: Write>(mut out: W, state: &State) -> anyhow::Result<Option<Vec<Point<Number>>>> {
    match both(state) {
        Ok((f, g)) => Ok(Some(intersect::intersections(
            f,
            g,
            state.win.x.clone(),
            &state.opts,
        ))),
        Err(slot) => {
            shell::expr_undefined(&mut out, slot.name())?;
            Ok(None)
        }
    }
}

fn write_data(
    now: DateTime<Local>,
    what: &str,
    points: &[Point<Number>],
    gap: Number,
) -> anyhow::Result<String> {
    let path = output_filename(now, what, "data");
    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("failed to open output data file '{path}'"))?,
    );
    shell::write_points(&mut data, points, gap).context("failed to write to output data file")?;
    data.flush()?;
    data.get_mut().sync_data()?;
    tracing::debug!(%path, count = points.len(), "wrote plot data");
    Ok(path)
}

fn plot<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(crossings) = cross(&mut out, state)? else {
        return Ok(());
    };
    let (f, g) = match both(state) {
        Ok(fg) => fg,
        Err(_) => return Ok(()),
    };

    let now = Local::now();
    let gnuplot_path = output_filename(now, "plot", "gnuplot");
    let svg_path = output_filename(now, "plot", "svg");

    let win = &state.win;
    let gap = 1.5 * win.step;
    let f_path = write_data(now, "f", &f.polyline(win.x.clone(), win.step), gap)?;
    let g_path = write_data(now, "g", &g.polyline(win.x.clone(), win.step), gap)?;
    let cross_path = write_data(now, "cross", &crossings, gap)?;

    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    // set output info
    let [width, height] = OUTPUT_RES;
    writeln!(gnuplot, "set terminal svg size {width},{height} enhanced")?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    // set window
    writeln!(
        gnuplot,
        "set xrange[{min}:{max}]",
        min = win.x.start,
        max = win.x.end
    )?;
    writeln!(
        gnuplot,
        "set yrange[{min}:{max}]",
        min = win.y.start,
        max = win.y.end
    )?;

    // configure appearence
    writeln!(gnuplot, "set grid")?;
    writeln!(gnuplot, "set xzeroaxis lt -1")?;
    writeln!(gnuplot, "set yzeroaxis lt -1")?;
    writeln!(gnuplot, r#"set xlabel "{}""#, stdlib::X)?;
    writeln!(gnuplot, "set tics out nomirror")?;
    writeln!(gnuplot, "set key out vertical top right")?;

    writeln!(gnuplot, r#"plot '{f_path}' using 1:2 with lines lc '#2563eb' title "f(x) = {f}" noenhanced, \"#)?;
    writeln!(gnuplot, r#"  '{g_path}' using 1:2 with lines lc '#dc2626' title "g(x) = {g}" noenhanced, \"#)?;
    writeln!(gnuplot, r#"  '{cross_path}' using 1:2 with points pt 7 lc '#16a34a' title "intersections""#)?;

    // display window
    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    // done with the file
    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }

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

    writeln!(out, "wrote {svg_path}")?;
    state.gnuplot = Some(child);
    Ok(())
}

fn set_expr<W: Write>(mut out: W, state: &mut State, slot: Slot) -> anyhow::Result<()> {
    // read input expression
    let input = shell::input(&mut out, format_args!("{}(x) = ", slot.name()))?;
    if input.is_empty() {
        return Ok(());
    }

    if let Err(invalid) = validate(&input) {
        writeln!(out)?;
        shell::underline(&mut out, &invalid.loc)?;
        writeln!(out, "invalid input: {invalid}")?;
        shell::invalid_note(&mut out, &invalid)?;
        return Ok(());
    }

    // lex, parse & compile input
    match Expr::new(input) {
        Ok(expr) => *state.slot_mut(slot) = Some(expr),

        Err(err) => {
            writeln!(out)?;
            shell::underline(&mut out, &err.loc)?;
            writeln!(out, "parse error: {}", err.typ)?;
            parse_note(&mut out, &err.typ, &err.loc)?;
        }
    }

    Ok(())
}

fn parse_note<W: Write>(mut out: W, typ: &ParseErrTyp, loc: &SubStr) -> anyhow::Result<()> {
    match typ {
        // other characters are rejected by `validate` before compiling
        ParseErrTyp::LexErr(LexErrTyp::Unsupported(TokTyp::XComma)) => {
            writeln!(out, "note: every function takes exactly one argument")?;
        }

        ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number")?,

        ParseErrTyp::ExtraOperand => writeln!(
            out,
            "note: implicit multiplication is not supported, so for example '5x' would be '5*x'",
        )?,

        ParseErrTyp::UndefinedIdent => {
            let text = loc.get().to_ascii_lowercase();
            let most_similar = Builtin::exhaustive()
                .iter()
                .map(|builtin| builtin.name())
                .chain([stdlib::X])
                .map(|name| (strsim::normalized_damerau_levenshtein(&text, name), name))
                .reduce(|acc, elem| if elem.0 > acc.0 { elem } else { acc });
            if let Some((sim, name)) = most_similar {
                if sim > 0.3 {
                    let kind = if name == stdlib::X {
                        "variable"
                    } else {
                        "function"
                    };
                    writeln!(out, "note: {kind} '{name}' has a similar name")?;
                }
            }
        }

        ParseErrTyp::LexErr(_)
        | ParseErrTyp::ParenMismatch
        | ParseErrTyp::MissingCallParen(_)
        | ParseErrTyp::MissingOperand { .. }
        | ParseErrTyp::Empty => {}
    }
    Ok(())
}
