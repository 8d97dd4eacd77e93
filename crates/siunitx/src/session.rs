//! Sessions and the commands they run.
//!
//! A [Session] holds the state that outlives a single command: the options set
//!     with `\sisetup` and the units declared with `\DeclareSIUnit`.
//! Every other command only reads the session, so once the session is set up
//!     it can be shared between threads.
//!
//! ```
//! use siunitx::Session;
//!
//! let mut session = Session::new();
//! session.setup("per-mode=symbol").unwrap();
//! let node = session.invoke(r"\qty{9.81}{\metre\per\second\squared}").unwrap();
//! assert_eq!(node.to_tex(), r"9.81\,\mathrm{m}/\mathrm{s}^{2}");
//! ```

use crate::angle;
use crate::complex;
use crate::error::Error;
use crate::keyval::{self, KeyVal};
use crate::list::{self, Combinator, SharedUnit};
use crate::markup::Node;
use crate::number::{self, NumberPiece};
use crate::options::Options;
use crate::postprocess;
use crate::quantity;
use crate::render;
use crate::spellcheck;
use crate::token::{Argument, Lexer, Token};
use crate::unit::{self, ParsedUnit, UnitTable, UserUnit};
use crate::unitrender;

/// A command provided by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Num,
    Ang,
    Unit,
    Qty,
    ComplexNum,
    ComplexQty,
    NumList,
    NumProduct,
    NumRange,
    QtyList,
    QtyProduct,
    QtyRange,
    SiSetup,
    DeclareSiUnit,
}

impl Command {
    pub const ALL: [Command; 14] = [
        Command::Num,
        Command::Ang,
        Command::Unit,
        Command::Qty,
        Command::ComplexNum,
        Command::ComplexQty,
        Command::NumList,
        Command::NumProduct,
        Command::NumRange,
        Command::QtyList,
        Command::QtyProduct,
        Command::QtyRange,
        Command::SiSetup,
        Command::DeclareSiUnit,
    ];

    /// The name of the command including its backslash.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Num => r"\num",
            Command::Ang => r"\ang",
            Command::Unit => r"\unit",
            Command::Qty => r"\qty",
            Command::ComplexNum => r"\complexnum",
            Command::ComplexQty => r"\complexqty",
            Command::NumList => r"\numlist",
            Command::NumProduct => r"\numproduct",
            Command::NumRange => r"\numrange",
            Command::QtyList => r"\qtylist",
            Command::QtyProduct => r"\qtyproduct",
            Command::QtyRange => r"\qtyrange",
            Command::SiSetup => r"\sisetup",
            Command::DeclareSiUnit => r"\DeclareSIUnit",
        }
    }

    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.name() == name)
    }

    /// The number of required braced arguments.
    pub fn arity(&self) -> usize {
        match self {
            Command::Num
            | Command::Ang
            | Command::Unit
            | Command::ComplexNum
            | Command::NumList
            | Command::NumProduct
            | Command::SiSetup => 1,
            Command::Qty
            | Command::ComplexQty
            | Command::NumRange
            | Command::QtyList
            | Command::QtyProduct
            | Command::DeclareSiUnit => 2,
            Command::QtyRange => 3,
        }
    }
}

/// The `[...]` options of one invocation.
///
/// Entry spans are relative to the option list, which starts at `offset` in the source.
#[derive(Debug, Default)]
struct Overrides {
    entries: Vec<KeyVal>,
    offset: usize,
}

impl Overrides {
    fn parse(arg: Option<&Argument>) -> Result<Overrides, Error> {
        let Some(arg) = arg else {
            return Ok(Default::default());
        };
        let offset = arg.span.start;
        Ok(Overrides {
            entries: keyval::parse(arg.text).map_err(|err| err.shifted(offset))?,
            offset,
        })
    }

    fn apply(&self, options: &Options) -> Result<Options, Error> {
        options
            .with(&self.entries)
            .map_err(|err| err.shifted(self.offset))
    }
}

fn whole(text: &str) -> Argument<'_> {
    Argument {
        text,
        span: 0..text.len(),
    }
}

/// The state shared by the commands of one document.
#[derive(Debug, Clone, Default)]
pub struct Session {
    options: Options,
    units: UnitTable,
}

impl Session {
    pub fn new() -> Session {
        Default::default()
    }

    /// The options set for the session.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The units declared in the session.
    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Applies an option list to the session, like `\sisetup`.
    ///
    /// If any entry is invalid the session is unchanged.
    pub fn setup(&mut self, source: &str) -> Result<(), Error> {
        self.options.apply(&keyval::parse(source)?)
    }

    /// Declares a unit, like `\DeclareSIUnit[options]{\name}{symbol}`.
    ///
    /// The name may be given with or without its backslash.
    pub fn declare_unit(&mut self, name: &str, symbol: &str, options: &str) -> Result<(), Error> {
        self.declare(None, &whole(name), &whole(symbol), Some(&whole(options)))
    }

    fn declare(
        &mut self,
        command: Option<&str>,
        name: &Argument,
        symbol: &Argument,
        options: Option<&Argument>,
    ) -> Result<(), Error> {
        let entries = match options {
            None => vec![],
            Some(arg) => {
                Options::parse_overrides(arg.text).map_err(|err| err.shifted(arg.span.start))?
            }
        };
        let unit_name = name.text.trim().trim_start_matches('\\');
        if unit_name.is_empty() {
            return Err(Error::MissingArgument {
                command: command.unwrap_or(Command::DeclareSiUnit.name()).to_string(),
                span: name.span.clone(),
            });
        }
        if unit::is_unit_expression(symbol.text, &self.units) {
            unit::parse_unit(symbol.text, &self.options, &self.units)
                .map_err(|err| err.shifted(symbol.span.start))?;
        }
        self.units.declare(
            unit_name,
            UserUnit {
                symbol: symbol.text.trim().to_string(),
                options: entries,
            },
        );
        Ok(())
    }

    /// Renders `\num{number}`.
    pub fn num(&self, number: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::Num, overrides, &[number])
    }

    /// Renders `\ang{angle}`.
    pub fn ang(&self, angle: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::Ang, overrides, &[angle])
    }

    /// Renders `\unit{unit}`.
    pub fn unit(&self, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::Unit, overrides, &[unit])
    }

    /// Renders `\qty{number}{unit}`.
    pub fn qty(&self, number: &str, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::Qty, overrides, &[number, unit])
    }

    /// Renders `\complexnum{number}`.
    pub fn complexnum(&self, number: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::ComplexNum, overrides, &[number])
    }

    /// Renders `\complexqty{number}{unit}`.
    pub fn complexqty(&self, number: &str, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::ComplexQty, overrides, &[number, unit])
    }

    /// Renders `\numlist{numbers}` for semicolon-separated numbers.
    pub fn numlist(&self, numbers: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::NumList, overrides, &[numbers])
    }

    /// Renders `\numproduct{numbers}` for numbers separated by `x`.
    pub fn numproduct(&self, numbers: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::NumProduct, overrides, &[numbers])
    }

    /// Renders `\numrange{from}{to}`.
    pub fn numrange(&self, from: &str, to: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::NumRange, overrides, &[from, to])
    }

    /// Renders `\qtylist{numbers}{unit}`.
    pub fn qtylist(&self, numbers: &str, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::QtyList, overrides, &[numbers, unit])
    }

    /// Renders `\qtyproduct{numbers}{unit}`.
    pub fn qtyproduct(&self, numbers: &str, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::QtyProduct, overrides, &[numbers, unit])
    }

    /// Renders `\qtyrange{from}{to}{unit}`.
    pub fn qtyrange(&self, from: &str, to: &str, unit: &str, overrides: &str) -> Result<Node, Error> {
        self.render(Command::QtyRange, overrides, &[from, to, unit])
    }

    /// Renders a command that does not change the session.
    ///
    /// Error spans point into whichever argument the error came from.
    pub fn render(&self, command: Command, overrides: &str, args: &[&str]) -> Result<Node, Error> {
        if args.len() < command.arity() {
            return Err(Error::MissingArgument {
                command: command.name().to_string(),
                span: 0..0,
            });
        }
        let args: Vec<Argument> = args.iter().map(|a| whole(a)).collect();
        let overrides = Overrides::parse(Some(&whole(overrides)))?;
        self.run(command, &overrides, &args)
    }

    /// Reads and runs one command, like `\qty[per-mode=symbol]{1.2}{\metre\per\second}`.
    ///
    /// `\sisetup` and `\DeclareSIUnit` change the session and return an empty node.
    /// Anything after the command is ignored.
    pub fn invoke(&mut self, source: &str) -> Result<Node, Error> {
        let mut lexer = Lexer::new(source);
        self.invoke_next(&mut lexer)
    }

    /// Replaces every command in the text with the TeX it renders to.
    ///
    /// Other text is copied unchanged. The session is updated by each
    ///     `\sisetup` and `\DeclareSIUnit` as it is met.
    pub fn expand(&mut self, text: &str) -> Result<String, Error> {
        let mut out = String::with_capacity(text.len());
        let mut lexer = Lexer::new(text);
        let mut copied = 0;
        while let Some((token, span)) = lexer.peek() {
            match token {
                Token::ControlSequence(cs) if Command::from_name(cs).is_some() => {
                    out.push_str(&text[copied..span.start]);
                    out.push_str(&self.invoke_next(&mut lexer)?.to_tex());
                    copied = lexer.position();
                }
                _ => {
                    lexer.next_token();
                }
            }
        }
        out.push_str(&text[copied..]);
        Ok(out)
    }

    fn invoke_next(&mut self, lexer: &mut Lexer) -> Result<Node, Error> {
        let (name, span) = match lexer.next_token() {
            Some((Token::ControlSequence(cs), span)) => (cs.to_string(), span),
            Some((token, span)) => (token.text(), span),
            None => (String::new(), lexer.position()..lexer.position()),
        };
        let Some(command) = Command::from_name(&name) else {
            return Err(Error::UnknownCommand {
                suggestion: spellcheck::find_close_word(
                    Command::ALL.iter().map(Command::name),
                    &name,
                )
                .map(str::to_string),
                name,
                span,
            });
        };
        let optional = lexer.read_optional()?;
        let mut args = vec![];
        for _ in 0..command.arity() {
            let arg = if command == Command::DeclareSiUnit && args.is_empty() {
                lexer.read_argument()?
            } else {
                lexer.read_group()?
            };
            match arg {
                Some(arg) => args.push(arg),
                None => {
                    let end = lexer.position();
                    return Err(Error::MissingArgument {
                        command: name,
                        span: end..end,
                    });
                }
            }
        }
        match command {
            Command::SiSetup => {
                let overrides = Overrides::parse(Some(&args[0]))?;
                self.options = overrides.apply(&self.options)?;
            }
            Command::DeclareSiUnit => {
                self.declare(Some(name.as_str()), &args[0], &args[1], optional.as_ref())?;
            }
            _ => {
                let overrides = Overrides::parse(optional.as_ref())?;
                return self.run(command, &overrides, &args);
            }
        }
        Ok(Node::empty())
    }

    fn run(&self, command: Command, overrides: &Overrides, args: &[Argument]) -> Result<Node, Error> {
        match command {
            Command::Num => {
                let options = overrides.apply(&self.options)?;
                self.number(&args[0], &options)
            }
            Command::Ang => {
                let options = overrides.apply(&self.options)?;
                if !options.parse_numbers {
                    return Ok(verbatim(&args[0]));
                }
                let mut parsed =
                    angle::parse_angle(args[0].text, &options).map_err(shift(&args[0]))?;
                angle::process(&mut parsed, &options)?;
                Ok(angle::render_angle(&parsed, &options))
            }
            Command::Unit => {
                let (unit, options) = self.unit_options(&args[0], overrides)?;
                Ok(render_unit(unit.as_ref(), &args[0], &options))
            }
            Command::Qty => self.quantity(&args[0], &args[1], overrides),
            Command::ComplexNum => {
                let options = overrides.apply(&self.options)?;
                if !options.parse_numbers {
                    return Ok(verbatim(&args[0]));
                }
                let mut parsed =
                    complex::parse_complex(args[0].text, &options).map_err(shift(&args[0]))?;
                complex::process(&mut parsed, None, &options)?;
                Ok(complex::render_complex(&parsed, &options))
            }
            Command::ComplexQty => self.complex_quantity(&args[0], &args[1], overrides),
            Command::NumList => self.combination(Combinator::List, &split(&args[0], ';'), None, overrides),
            Command::NumProduct => {
                self.combination(Combinator::Product, &split(&args[0], 'x'), None, overrides)
            }
            Command::NumRange => self.combination(Combinator::Range, &args[..2], None, overrides),
            Command::QtyList => {
                self.combination(Combinator::List, &split(&args[0], ';'), Some(&args[1]), overrides)
            }
            Command::QtyProduct => self.combination(
                Combinator::Product,
                &split(&args[0], 'x'),
                Some(&args[1]),
                overrides,
            ),
            Command::QtyRange => {
                self.combination(Combinator::Range, &args[..2], Some(&args[2]), overrides)
            }
            Command::SiSetup | Command::DeclareSiUnit => Ok(Node::empty()),
        }
    }

    /// Parses a unit argument and layers the options.
    ///
    /// The options of user units used in the unit sit between the session options
    ///     and the options of the invocation.
    /// When `parse-units` is off no unit is returned and the argument is shown as written.
    fn unit_options(
        &self,
        arg: &Argument,
        overrides: &Overrides,
    ) -> Result<(Option<ParsedUnit>, Options), Error> {
        let options = overrides.apply(&self.options)?;
        if !options.parse_units {
            return Ok((None, options));
        }
        let parsed = unit::parse_unit(arg.text, &options, &self.units).map_err(shift(arg))?;
        if parsed.overrides.is_empty() {
            return Ok((Some(parsed), options));
        }
        let options = overrides.apply(&self.options.with(&parsed.overrides)?)?;
        Ok((Some(parsed), options))
    }

    fn number(&self, arg: &Argument, options: &Options) -> Result<Node, Error> {
        if !options.parse_numbers {
            return Ok(verbatim(arg).colored(options.effective_number_color()));
        }
        let mut piece = parse_number(arg, options)?;
        postprocess::process(&mut piece, options)?;
        Ok(render::render_number(&piece, options))
    }

    fn quantity(&self, number: &Argument, unit: &Argument, overrides: &Overrides) -> Result<Node, Error> {
        let (parsed, options) = self.unit_options(unit, overrides)?;
        let Some(mut parsed) = parsed else {
            let number = self.number(number, &options)?;
            return Ok(quantity::attach_unit(number, verbatim(unit), &options));
        };
        if !options.parse_numbers {
            let unit = unitrender::render_unit(&parsed.pieces, parsed.literal, &options);
            return Ok(quantity::attach_unit(verbatim(number), unit, &options));
        }
        let mut piece = parse_number(number, &options)?;
        quantity::apply_prefix_mode(std::slice::from_mut(&mut piece), &mut parsed.pieces, &options);
        postprocess::process(&mut piece, &options)?;
        Ok(quantity::render_quantity(
            &piece,
            &parsed.pieces,
            parsed.literal,
            &options,
        ))
    }

    fn complex_quantity(
        &self,
        number: &Argument,
        unit: &Argument,
        overrides: &Overrides,
    ) -> Result<Node, Error> {
        let (parsed, options) = self.unit_options(unit, overrides)?;
        if !options.parse_numbers {
            let unit = render_unit(parsed.as_ref(), unit, &options);
            return Ok(quantity::attach_unit(verbatim(number), unit, &options));
        }
        let mut value = complex::parse_complex(number.text, &options).map_err(shift(number))?;
        match parsed {
            None => {
                complex::process(&mut value, None, &options)?;
                Ok(quantity::attach_unit(
                    complex::render_complex(&value, &options),
                    verbatim(unit),
                    &options,
                ))
            }
            Some(mut parsed) => {
                complex::process(&mut value, Some(&mut parsed.pieces), &options)?;
                Ok(complex::render_complex_quantity(
                    &value,
                    &parsed.pieces,
                    parsed.literal,
                    &options,
                ))
            }
        }
    }

    fn combination(
        &self,
        combinator: Combinator,
        elements: &[Argument],
        unit: Option<&Argument>,
        overrides: &Overrides,
    ) -> Result<Node, Error> {
        let (parsed, options) = match unit {
            None => (None, overrides.apply(&self.options)?),
            Some(unit) => self.unit_options(unit, overrides)?,
        };
        let verbatim_unit = match (unit, &parsed) {
            (Some(unit), None) => Some(verbatim(unit)),
            _ => None,
        };
        if !options.parse_numbers {
            let mut row = vec![];
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    row.push(Node::tex(" "));
                }
                row.push(verbatim(element));
            }
            let unit = match &parsed {
                Some(parsed) => unitrender::render_unit(&parsed.pieces, parsed.literal, &options),
                None => verbatim_unit.unwrap_or_else(Node::empty),
            };
            return Ok(quantity::attach_unit(Node::row(row), unit, &options));
        }
        let numbers = elements
            .iter()
            .map(|element| parse_number(element, &options))
            .collect::<Result<Vec<NumberPiece>, Error>>()?;
        let shared = parsed.as_ref().map(|parsed| SharedUnit {
            pieces: &parsed.pieces,
            literal: parsed.literal,
        });
        let node = list::render_combination(combinator, numbers, shared, &options)?;
        Ok(match verbatim_unit {
            None => node,
            Some(unit) => quantity::attach_unit(node, unit, &options),
        })
    }
}

fn shift(arg: &Argument) -> impl Fn(Error) -> Error {
    let offset = arg.span.start;
    move |err| err.shifted(offset)
}

fn parse_number(arg: &Argument, options: &Options) -> Result<NumberPiece, Error> {
    number::parse_number(arg.text, options).map_err(shift(arg))
}

fn verbatim(arg: &Argument) -> Node {
    Node::tex(arg.text.trim())
}

fn render_unit(parsed: Option<&ParsedUnit>, arg: &Argument, options: &Options) -> Node {
    match parsed {
        Some(parsed) => unitrender::render_unit(&parsed.pieces, parsed.literal, options),
        None => verbatim(arg),
    }
}

/// Splits a list argument into one argument per element.
fn split<'a>(arg: &Argument<'a>, delimiter: char) -> Vec<Argument<'a>> {
    list::split_elements(arg.text, delimiter)
        .into_iter()
        .map(|(text, offset)| {
            let start = arg.span.start + offset;
            Argument {
                text,
                span: start..start + text.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        Session::new().invoke(source).unwrap().to_tex()
    }

    macro_rules! invoke_tests {
        ( $( ($name: ident, $source: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(run($source), $want);
            }
            )+
        };
    }

    invoke_tests!(
        (num, r"\num{12345.678}", r"12\,345.678"),
        (num_with_options, r"\num[round-mode=places, round-precision=1]{1.24}", "1.2"),
        (num_exponent, r"\num{1.2e3}", r"1.2\times10^{3}"),
        (num_uncertainty, r"\num{1.23(4)}", "1.23(4)"),
        (num_verbatim, r"\num[parse-numbers=false]{1,2;3}", "1,2;3"),
        (ang, r"\ang{1;2;3}", r"1\degree2'3''"),
        (unit, r"\unit{\kilo\metre\per\second}", r"\mathrm{km}\,\mathrm{s}^{-1}"),
        (unit_verbatim, r"\unit[parse-units=false]{kg m}", "kg m"),
        (qty, r"\qty{1.2}{\metre}", r"1.2\,\mathrm{m}"),
        (qty_literal_unit, r"\qty{3}{km/s}", r"3\,\mathrm{km}/\mathrm{s}"),
        (qty_prefix_mode, r"\qty[prefix-mode=extract-exponent]{5}{\kilo\metre}", r"5\times10^{3}\,\mathrm{m}"),
        (qty_unit_verbatim, r"\qty[parse-units=false]{2}{kg}", r"2\,kg"),
        (complexnum, r"\complexnum{1+2i}", r"1+2\mathrm{i}"),
        (complexqty, r"\complexqty{1+2i}{\ohm}", r"(1+2\mathrm{i})\,\mathrm{\Omega}"),
        (numlist, r"\numlist{1;2;3}", r"1\text{, }2\text{, and }3"),
        (numproduct, r"\numproduct{1 x 2}", r"1\times2"),
        (numrange, r"\numrange{1}{2}", r"1\text{ to }2"),
        (qtylist, r"\qtylist{1;2}{\metre}", r"1\,\mathrm{m}\text{ and }2\,\mathrm{m}"),
        (qtyproduct, r"\qtyproduct{1 x 2}{\metre}", r"1\,\mathrm{m}\times2\,\mathrm{m}"),
        (qtyrange, r"\qtyrange{1}{2}{\metre}", r"1\,\mathrm{m}\text{ to }2\,\mathrm{m}"),
        (qtyrange_bracket, r"\qtyrange[range-units=bracket]{1}{2}{\metre}", r"(1\text{ to }2)\,\mathrm{m}"),
        (sisetup_renders_nothing, r"\sisetup{per-mode=symbol}", ""),
    );

    #[test]
    fn sisetup_persists() {
        let mut session = Session::new();
        session.invoke(r"\sisetup{per-mode=symbol}").unwrap();
        let node = session.invoke(r"\unit{\metre\per\second}").unwrap();
        assert_eq!(node.to_tex(), r"\mathrm{m}/\mathrm{s}");
    }

    #[test]
    fn invocation_options_override_session_options() {
        let mut session = Session::new();
        session.setup("per-mode=symbol").unwrap();
        let node = session
            .unit(r"\metre\per\second", "per-mode=power")
            .unwrap();
        assert_eq!(node.to_tex(), r"\mathrm{m}\,\mathrm{s}^{-1}");
    }

    #[test]
    fn failed_setup_changes_nothing() {
        let mut session = Session::new();
        assert!(session.setup("per-mode=symbol, round-mode=nowhere").is_err());
        assert_eq!(session.options(), &Options::default());
        assert!(session.invoke(r"\sisetup{per-mode=symbol, per-mod=power}").is_err());
        assert_eq!(session.options(), &Options::default());
    }

    #[test]
    fn declared_unit() {
        let mut session = Session::new();
        session
            .invoke(r"\DeclareSIUnit{\parsec}{pc}")
            .unwrap();
        assert_eq!(session.units().len(), 1);
        let node = session.invoke(r"\qty{3}{\kilo\parsec}").unwrap();
        assert_eq!(node.to_tex(), r"3\,\mathrm{kpc}");
    }

    #[test]
    fn declared_unit_options_apply_where_it_is_used() {
        let mut session = Session::new();
        session
            .invoke(r"\DeclareSIUnit[quantity-product=~]{\rpm}{rpm}")
            .unwrap();
        assert_eq!(session.qty("10", r"\rpm", "").unwrap().to_tex(), r"10~\mathrm{rpm}");
        assert_eq!(
            session.qty("10", r"\rpm", r"quantity-product=\;").unwrap().to_tex(),
            r"10\;\mathrm{rpm}"
        );
        assert_eq!(session.qty("10", r"\metre", "").unwrap().to_tex(), r"10\,\mathrm{m}");
    }

    #[test]
    fn invalid_declared_symbol() {
        let mut session = Session::new();
        let source = r"\DeclareSIUnit{\foo}{\kilo\metrr}";
        let err = session.invoke(source).unwrap_err();
        assert!(matches!(err, Error::UnknownUnitMacro { .. }));
        assert_eq!(&source[err.span().unwrap()], r"\metrr");
        assert!(session.units().is_empty());

        session.invoke(r"\DeclareSIUnit{\kWh}{\kilo\watt\hour}").unwrap();
        session.invoke(r"\DeclareSIUnit{\area}{\mathcal{A}}").unwrap();
        assert_eq!(session.units().len(), 2);
    }

    #[test]
    fn declare_unit_api() {
        let mut session = Session::new();
        session.declare_unit("bar", "bar", "").unwrap();
        assert!(session.units().get("bar").is_some());
        assert!(session.declare_unit("", "x", "").is_err());
        assert!(session.declare_unit(r"\foo", "f", "no-such-option").is_err());
    }

    #[test]
    fn expand_replaces_commands() {
        let mut session = Session::new();
        let got = session
            .expand(r"g is \qty{9.81}{\metre\per\second\squared} and \sisetup{per-mode=symbol}v is \qty{3}{\metre\per\second}.")
            .unwrap();
        assert_eq!(
            got,
            r"g is 9.81\,\mathrm{m}\,\mathrm{s}^{-2} and v is 3\,\mathrm{m}/\mathrm{s}."
        );
    }

    #[test]
    fn expand_leaves_other_commands() {
        let mut session = Session::new();
        let got = session.expand(r"\emph{x} \num{1}").unwrap();
        assert_eq!(got, r"\emph{x} 1");
    }

    #[test]
    fn expand_errors_point_into_the_text() {
        let mut session = Session::new();
        let source = r"a \num{1} b \num{2q}";
        let err = session.expand(source).unwrap_err();
        assert_eq!(err.span(), Some(18..19));
    }

    #[test]
    fn option_errors_point_into_the_options() {
        let source = r"\num[round-mod=places]{1}";
        let err = Session::new().invoke(source).unwrap_err();
        let span = err.span().unwrap();
        assert_eq!(&source[span], "round-mod=places");
    }

    #[test]
    fn list_errors_point_into_the_element() {
        let source = r"\numlist{1;2;3q}";
        let err = Session::new().invoke(source).unwrap_err();
        let span = err.span().unwrap();
        assert_eq!(&source[span], "q");
    }

    #[test]
    fn unknown_command_suggests_a_command() {
        let err = Session::new().invoke(r"\qtyy{1}{\metre}").unwrap_err();
        assert_eq!(err.notes(), vec!["did you mean `\\qty`?".to_string()]);
    }

    #[test]
    fn render_checks_arity() {
        let err = Session::new().render(Command::Qty, "", &["1"]).unwrap_err();
        assert!(matches!(err, Error::MissingArgument { .. }));
    }

    #[test]
    fn command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn sessions_render_from_many_threads() {
        let mut session = Session::new();
        session.setup("round-mode=places, round-precision=1").unwrap();
        let session = &session;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| scope.spawn(move || session.num(&format!["{i}.24"], "").unwrap().to_tex()))
                .collect();
            let got: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(got, vec!["0.2", "1.2", "2.2", "3.2"]);
        });
    }
}
