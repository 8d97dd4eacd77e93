use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use siunitx::{angle, complex, keyval, number, render, unit, Error, Options, Session, Stage};

fn main() {
    if let Err(err) = Cli::parse().run() {
        if !err.is_empty() {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }
}

/// Tools for rendering siunitx quantities.
#[derive(Debug, Parser)]
#[command(
    name = "sitools",
    author = "The Texcraft Project",
    version = "0.1",
    about,
    long_about,
    max_term_width(100)
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Options applied to the session before running the subcommand,
    /// as in `\sisetup`. May be given more than once.
    #[arg(short = 's', long)]
    setup: Vec<String>,

    /// Declare a unit, written as `\name=symbol`. May be given more than once.
    #[arg(short = 'd', long)]
    declare: Vec<String>,
}

impl Cli {
    fn run(self) -> Result<(), String> {
        let mut session = Session::new();
        for setup in &self.setup {
            session
                .setup(setup)
                .map_err(|err| report(&err, "--setup", setup))?;
        }
        for declaration in &self.declare {
            let Some((name, symbol)) = declaration.split_once('=') else {
                return Err(format![
                    "the unit declaration `{declaration}` must be of the form `\\name=symbol`"
                ]);
            };
            session
                .declare_unit(name, symbol, "")
                .map_err(|err| report(&err, "--declare", declaration))?;
        }
        match self.command {
            Command::Render(render) => render.run(session),
            Command::Parse(parse) => parse.run(&session),
            Command::Trace(trace) => trace.run(&session),
            Command::Options(options) => options.run(&session),
        }
    }
}

#[derive(Clone, Debug, clap::Subcommand)]
enum Command {
    /// Render a command, or every command in a file, to TeX.
    ///
    /// A single command is given directly:
    ///
    ///     $ sitools render '\qty{1.23}{\kilo\metre\per\second}'
    ///
    /// With `--file`, every command in the file is replaced by the TeX it renders to
    ///     and the rest of the file is printed unchanged.
    /// Commands are run in order through one session,
    ///     so `\sisetup` and `\DeclareSIUnit` in the file apply to later commands.
    Render(Render),

    /// Parse a literal and print the pieces it is made of.
    Parse(Parse),

    /// Show a number after each post-processing stage.
    ///
    /// This is useful for working out which option is responsible for some output.
    Trace(Trace),

    /// List every option with its current value.
    Options(ListOptions),
}

/// Prints an error as a report pointing into the source, and returns an empty
/// message as the report has already been printed.
fn report(err: &Error, name: &str, source: &str) -> String {
    let cache = (name, ariadne::Source::from(source.to_string()));
    if err.ariadne_report(name).eprint(cache).is_err() {
        return err.to_string();
    }
    String::new()
}

#[derive(Clone, Debug, Parser)]
struct Render {
    /// The command to render, like `\num{1.2e3}`.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    command: Option<String>,

    /// Path to a file to expand.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

impl Render {
    fn run(self, mut session: Session) -> Result<(), String> {
        if let Some(path) = &self.file {
            let source = match std::fs::read_to_string(path) {
                Ok(source) => source,
                Err(err) => return Err(format!["failed to read file {path:?}: {err}"]),
            };
            let name = path.to_string_lossy();
            let output = session
                .expand(&source)
                .map_err(|err| report(&err, &name, &source))?;
            print!("{output}");
            return Ok(());
        }
        let command = self.command.unwrap_or_default();
        let node = session
            .invoke(&command)
            .map_err(|err| report(&err, "<command>", &command))?;
        println!("{}", node.to_tex());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum LiteralKind {
    Number,
    Unit,
    Angle,
    Complex,
}

#[derive(Clone, Debug, Parser)]
struct Parse {
    /// The literal to parse, like `1.23(4)e5`.
    literal: String,

    /// What kind of literal it is.
    #[arg(short, long, default_value = "number")]
    kind: LiteralKind,

    /// Options for this literal only.
    #[arg(short, long, default_value = "")]
    options: String,

    /// Print the pieces as JSON.
    #[arg(long)]
    json: bool,
}

impl Parse {
    fn run(self, session: &Session) -> Result<(), String> {
        let options = local_options(session, &self.options)?;
        let literal = &self.literal;
        let fail = |err: Error| report(&err, "<literal>", literal);
        let (debug, json) = match self.kind {
            LiteralKind::Number => {
                let piece = number::parse_number(literal, &options).map_err(fail)?;
                (format!["{piece:#?}"], serde_json::to_string_pretty(&piece))
            }
            LiteralKind::Unit => {
                let parsed =
                    unit::parse_unit(literal, &options, session.units()).map_err(fail)?;
                (
                    format!["{:#?}", parsed.pieces],
                    serde_json::to_string_pretty(&parsed.pieces),
                )
            }
            LiteralKind::Angle => {
                let angle = angle::parse_angle(literal, &options).map_err(fail)?;
                (format!["{angle:#?}"], serde_json::to_string_pretty(&angle))
            }
            LiteralKind::Complex => {
                let complex = complex::parse_complex(literal, &options).map_err(fail)?;
                (format!["{complex:#?}"], serde_json::to_string_pretty(&complex))
            }
        };
        if self.json {
            let json = json.map_err(|err| format!["failed to serialize the pieces: {err}"])?;
            println!("{json}");
        } else {
            println!("{debug}");
        }
        Ok(())
    }
}

fn local_options(session: &Session, source: &str) -> Result<Options, String> {
    keyval::parse(source)
        .and_then(|entries| session.options().with(&entries))
        .map_err(|err| report(&err, "--options", source))
}

#[derive(Clone, Debug, Parser)]
struct Trace {
    /// The number to trace.
    number: String,

    /// Options for this number only.
    #[arg(short, long, default_value = "")]
    options: String,
}

impl Trace {
    fn run(self, session: &Session) -> Result<(), String> {
        let options = local_options(session, &self.options)?;
        let fail = |err: Error| report(&err, "<number>", &self.number);
        let mut piece = number::parse_number(&self.number, &options).map_err(fail)?;
        let width = Stage::ALL
            .iter()
            .map(|stage| stage.name().len())
            .max()
            .unwrap_or(0);
        let line = |name: &str, tex: String, changed: bool| {
            let tex = if changed { tex.bright_green().bold() } else { tex.normal() };
            println!("{:>width$}  {tex}", name.bright_cyan());
        };
        let mut previous = render::render_number(&piece, &options).to_tex();
        line("parsed", previous.clone(), true);
        for stage in Stage::ALL {
            stage.apply(&mut piece, &options).map_err(fail)?;
            let current = render::render_number(&piece, &options).to_tex();
            let changed = current != previous;
            line(stage.name(), current.clone(), changed);
            previous = current;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Parser)]
struct ListOptions {
    /// Only list options whose key contains this text.
    filter: Option<String>,
}

impl ListOptions {
    fn run(self, session: &Session) -> Result<(), String> {
        let options = session.options();
        let filter = self.filter.unwrap_or_default();
        for key in Options::KEYS.iter().filter(|key| key.contains(&filter)) {
            let value = options.describe(key).unwrap_or_default();
            println!("{} = {}", key.bold(), value);
        }
        Ok(())
    }
}
