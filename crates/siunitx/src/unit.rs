//! Units and the unit parser.
//!
//! A unit is written either with macros, like `\kilo\metre\per\second\squared`,
//!     or as literal text, like `km/s^2`.
//! Both forms are parsed into a flat list of [UnitPiece]s.
//!
//! In macro form every control sequence is, in order of priority, a modifier,
//!     a prefix, a user-declared unit, a built-in unit or a shortcut like `\km`.
//! Modifiers either apply to the next unit (`\square`, `\per`, `\cancel`, ...)
//!     or to the previous one (`\squared`, `\tothe{n}`, `\of{q}`).

use std::collections::HashMap;

use crate::error::{Error, Literal, Span};
use crate::keyval::KeyVal;
use crate::options::{Options, PerMode};
use crate::spellcheck;
use crate::token::{Lexer, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    Numerator,
    Denominator,
}

/// One unit symbol with its prefix, power and annotations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitPiece {
    pub symbol: String,
    pub prefix: String,
    pub position: Position,
    /// The power, which is always shown negated for units in the denominator.
    pub power: f64,
    pub qualifier: String,
    pub cancel: bool,
    /// A color, or empty.
    pub highlight: String,
}

impl Default for UnitPiece {
    fn default() -> Self {
        UnitPiece {
            symbol: String::new(),
            prefix: String::new(),
            position: Position::Numerator,
            power: 1.0,
            qualifier: String::new(),
            cancel: false,
            highlight: String::new(),
        }
    }
}

impl UnitPiece {
    pub fn new<S: Into<String>>(symbol: S) -> UnitPiece {
        UnitPiece {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// The power with the sign given by the position.
    pub fn signed_power(&self) -> f64 {
        match self.position {
            Position::Numerator => self.power,
            Position::Denominator => -self.power,
        }
    }
}

/// The result of parsing a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnit {
    pub pieces: Vec<UnitPiece>,
    /// Whether the unit was written as literal text.
    pub literal: bool,
    /// Options attached to the user-declared units that were used.
    pub overrides: Vec<KeyVal>,
}

/// SI and binary prefixes: name, symbol and, for SI prefixes, the power of ten.
const PREFIXES: &[(&str, &str, Option<i64>)] = &[
    ("quecto", "q", Some(-30)),
    ("ronto", "r", Some(-27)),
    ("yocto", "y", Some(-24)),
    ("zepto", "z", Some(-21)),
    ("atto", "a", Some(-18)),
    ("femto", "f", Some(-15)),
    ("pico", "p", Some(-12)),
    ("nano", "n", Some(-9)),
    ("micro", r"\mu", Some(-6)),
    ("milli", "m", Some(-3)),
    ("centi", "c", Some(-2)),
    ("deci", "d", Some(-1)),
    ("deca", "da", Some(1)),
    ("deka", "da", Some(1)),
    ("hecto", "h", Some(2)),
    ("kilo", "k", Some(3)),
    ("mega", "M", Some(6)),
    ("giga", "G", Some(9)),
    ("tera", "T", Some(12)),
    ("peta", "P", Some(15)),
    ("exa", "E", Some(18)),
    ("zetta", "Z", Some(21)),
    ("yotta", "Y", Some(24)),
    ("ronna", "R", Some(27)),
    ("quetta", "Q", Some(30)),
    ("kibi", "Ki", None),
    ("mebi", "Mi", None),
    ("gibi", "Gi", None),
    ("tebi", "Ti", None),
    ("pebi", "Pi", None),
    ("exbi", "Ei", None),
    ("zebi", "Zi", None),
    ("yobi", "Yi", None),
];

/// Built-in units: name and symbol.
const UNITS: &[(&str, &str)] = &[
    // SI base units
    ("ampere", "A"),
    ("candela", "cd"),
    ("gram", "g"),
    ("kelvin", "K"),
    ("metre", "m"),
    ("meter", "m"),
    ("mole", "mol"),
    ("second", "s"),
    // Derived units
    ("becquerel", "Bq"),
    ("coulomb", "C"),
    ("degreeCelsius", r"\degree C"),
    ("farad", "F"),
    ("gray", "Gy"),
    ("henry", "H"),
    ("hertz", "Hz"),
    ("joule", "J"),
    ("katal", "kat"),
    ("lumen", "lm"),
    ("lux", "lx"),
    ("newton", "N"),
    ("ohm", r"\Omega"),
    ("pascal", "Pa"),
    ("radian", "rad"),
    ("siemens", "S"),
    ("sievert", "Sv"),
    ("steradian", "sr"),
    ("tesla", "T"),
    ("volt", "V"),
    ("watt", "W"),
    ("weber", "Wb"),
    // Units accepted for use with the SI
    ("arcminute", r"'"),
    ("arcsecond", r"''"),
    ("astronomicalunit", "au"),
    ("bel", "B"),
    ("dalton", "Da"),
    ("day", "d"),
    ("degree", r"\degree"),
    ("electronvolt", "eV"),
    ("hectare", "ha"),
    ("hour", "h"),
    ("litre", "L"),
    ("liter", "L"),
    ("minute", "min"),
    ("neper", "Np"),
    ("tonne", "t"),
    // Other units
    ("angstrom", r"\AA"),
    ("bar", "bar"),
    ("barn", "b"),
    ("bohr", "a_{0}"),
    ("byte", "B"),
    ("clight", "c_{0}"),
    ("electronmass", "m_{e}"),
    ("elementarycharge", "e"),
    ("hartree", "E_{h}"),
    ("knot", "kn"),
    ("mmHg", "mmHg"),
    ("nauticalmile", "M"),
    ("percent", r"\%"),
    ("planckbar", r"\hbar"),
];

/// Abbreviations for common prefixed units: name, prefix symbol, unit symbol.
const SHORTCUTS: &[(&str, &str, &str)] = &[
    ("kilogram", "k", "g"),
    ("fg", "f", "g"),
    ("pg", "p", "g"),
    ("ng", "n", "g"),
    ("ug", r"\mu", "g"),
    ("mg", "m", "g"),
    ("g", "", "g"),
    ("kg", "k", "g"),
    ("pm", "p", "m"),
    ("nm", "n", "m"),
    ("um", r"\mu", "m"),
    ("mm", "m", "m"),
    ("cm", "c", "m"),
    ("dm", "d", "m"),
    ("m", "", "m"),
    ("km", "k", "m"),
    ("as", "a", "s"),
    ("fs", "f", "s"),
    ("ps", "p", "s"),
    ("ns", "n", "s"),
    ("us", r"\mu", "s"),
    ("ms", "m", "s"),
    ("s", "", "s"),
    ("fmol", "f", "mol"),
    ("pmol", "p", "mol"),
    ("nmol", "n", "mol"),
    ("umol", r"\mu", "mol"),
    ("mmol", "m", "mol"),
    ("mol", "", "mol"),
    ("kmol", "k", "mol"),
    ("pA", "p", "A"),
    ("nA", "n", "A"),
    ("uA", r"\mu", "A"),
    ("mA", "m", "A"),
    ("A", "", "A"),
    ("kA", "k", "A"),
    ("uL", r"\mu", "L"),
    ("mL", "m", "L"),
    ("L", "", "L"),
    ("hL", "h", "L"),
    ("mHz", "m", "Hz"),
    ("Hz", "", "Hz"),
    ("kHz", "k", "Hz"),
    ("MHz", "M", "Hz"),
    ("GHz", "G", "Hz"),
    ("THz", "T", "Hz"),
    ("mN", "m", "N"),
    ("N", "", "N"),
    ("kN", "k", "N"),
    ("MN", "M", "N"),
    ("Pa", "", "Pa"),
    ("kPa", "k", "Pa"),
    ("MPa", "M", "Pa"),
    ("GPa", "G", "Pa"),
    ("mohm", "m", r"\Omega"),
    ("kohm", "k", r"\Omega"),
    ("Mohm", "M", r"\Omega"),
    ("pV", "p", "V"),
    ("nV", "n", "V"),
    ("uV", r"\mu", "V"),
    ("mV", "m", "V"),
    ("V", "", "V"),
    ("kV", "k", "V"),
    ("W", "", "W"),
    ("uW", r"\mu", "W"),
    ("mW", "m", "W"),
    ("kW", "k", "W"),
    ("MW", "M", "W"),
    ("GW", "G", "W"),
    ("J", "", "J"),
    ("uJ", r"\mu", "J"),
    ("mJ", "m", "J"),
    ("kJ", "k", "J"),
    ("eV", "", "eV"),
    ("meV", "m", "eV"),
    ("keV", "k", "eV"),
    ("MeV", "M", "eV"),
    ("GeV", "G", "eV"),
    ("TeV", "T", "eV"),
    ("F", "", "F"),
    ("fF", "f", "F"),
    ("pF", "p", "F"),
    ("K", "", "K"),
    ("dB", "d", "B"),
];

const MODIFIERS: &[&str] = &[
    "square", "cubic", "squared", "cubed", "tothe", "raiseto", "per", "of", "cancel",
    "highlight",
];

/// The power of ten of an SI prefix symbol, like 3 for `k`.
pub fn prefix_power(symbol: &str) -> Option<i64> {
    PREFIXES
        .iter()
        .find(|(_, s, _)| *s == symbol)
        .and_then(|(_, _, power)| *power)
}

/// The SI prefix symbol for a power of ten, if there is one.
pub fn prefix_for_power(power: i64) -> Option<&'static str> {
    if power == 0 {
        return Some("");
    }
    PREFIXES
        .iter()
        .find(|(_, _, p)| *p == Some(power))
        .map(|(_, symbol, _)| *symbol)
}

/// A unit declared during a session.
#[derive(Debug, Clone, PartialEq)]
pub struct UserUnit {
    /// The symbol, which may itself be written with unit macros.
    pub symbol: String,
    /// Options that apply wherever the unit is used.
    pub options: Vec<KeyVal>,
}

/// The units declared during a session.
#[derive(Debug, Clone, Default)]
pub struct UnitTable {
    units: HashMap<String, UserUnit>,
}

impl UnitTable {
    /// Declares a unit. The name is given without its backslash.
    ///
    /// Redeclaring a unit replaces it.
    pub fn declare<S: Into<String>>(&mut self, name: S, unit: UserUnit) {
        self.units.insert(name.into(), unit);
    }

    pub fn get(&self, name: &str) -> Option<&UserUnit> {
        self.units.get(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }
}

/// Whether a declared symbol is written with unit macros, like `\kilo\watt\hour`.
///
/// Other symbols, like `\mathcal{A}` or `pc`, are used as they are.
pub fn is_unit_expression(symbol: &str, units: &UnitTable) -> bool {
    let Some((Token::ControlSequence(cs), _)) = Lexer::new(symbol).next_token() else {
        return false;
    };
    let name = &cs[1..];
    PREFIXES.iter().any(|(n, _, _)| *n == name)
        || UNITS.iter().any(|(n, _)| *n == name)
        || SHORTCUTS.iter().any(|(n, _, _)| *n == name)
        || MODIFIERS.contains(&name)
        || units.get(name).is_some()
}

/// User units may be defined in terms of other user units; this bounds the depth.
const MAX_EXPANSION_DEPTH: usize = 16;

/// Parses a unit.
pub fn parse_unit(text: &str, options: &Options, units: &UnitTable) -> Result<ParsedUnit, Error> {
    if !text.contains('\\') {
        if options.forbid_literal_units {
            return Err(Error::LiteralUnitsForbidden {
                literal: text.trim().to_string(),
            });
        }
        return Ok(ParsedUnit {
            pieces: parse_literal(text, units),
            literal: true,
            overrides: vec![],
        });
    }
    let mut parser = MacroParser {
        options,
        units,
        pieces: vec![],
        pending: Default::default(),
        overrides: vec![],
        depth: 0,
    };
    parser.parse(text)?;
    Ok(ParsedUnit {
        pieces: parser.pieces,
        literal: false,
        overrides: parser.overrides,
    })
}

struct MacroParser<'a> {
    options: &'a Options,
    units: &'a UnitTable,
    pieces: Vec<UnitPiece>,
    /// Modifiers waiting for the next unit.
    pending: UnitPiece,
    overrides: Vec<KeyVal>,
    depth: usize,
}

impl<'a> MacroParser<'a> {
    fn parse(&mut self, text: &str) -> Result<(), Error> {
        let mut lexer = Lexer::new(text);
        while let Some((token, span)) = lexer.next_token() {
            let Token::ControlSequence(cs) = token else {
                return Err(Error::UnexpectedToken {
                    token: token.text(),
                    literal: Literal::Unit,
                    span,
                });
            };
            self.control_sequence(cs, span, &mut lexer)?;
        }
        Ok(())
    }

    fn control_sequence(&mut self, cs: &str, span: Span, lexer: &mut Lexer) -> Result<(), Error> {
        let name = &cs[1..];
        let units = self.units;
        match name {
            "square" => self.pending.power = 2.0,
            "cubic" => self.pending.power = 3.0,
            "per" => self.pending.position = Position::Denominator,
            "cancel" => self.pending.cancel = true,
            "highlight" => self.pending.highlight = argument(cs, &span, lexer)?.0,
            "raiseto" => {
                let (value, arg_span) = argument(cs, &span, lexer)?;
                self.pending.power = parse_power(&value, arg_span)?;
            }
            "squared" => self.previous(cs, span)?.power = 2.0,
            "cubed" => self.previous(cs, span)?.power = 3.0,
            "tothe" => {
                let (value, arg_span) = argument(cs, &span, lexer)?;
                let power = parse_power(&value, arg_span)?;
                self.previous(cs, span)?.power = power;
            }
            "of" => {
                let (value, _) = argument(cs, &span, lexer)?;
                self.previous(cs, span)?.qualifier = value;
            }
            _ => {
                if let Some((_, symbol, _)) = PREFIXES.iter().find(|(n, _, _)| *n == name) {
                    self.pending.prefix = symbol.to_string();
                } else if let Some(unit) = units.get(name) {
                    self.overrides.extend(unit.options.iter().cloned());
                    self.user_unit(cs, &unit.symbol, span)?;
                } else if let Some((_, symbol)) = UNITS.iter().find(|(n, _)| *n == name) {
                    self.push(UnitPiece::new(*symbol));
                } else if let Some((_, prefix, symbol)) =
                    SHORTCUTS.iter().find(|(n, _, _)| *n == name)
                {
                    self.push(UnitPiece {
                        prefix: prefix.to_string(),
                        ..UnitPiece::new(*symbol)
                    });
                } else {
                    return Err(self.unknown(cs, span));
                }
            }
        }
        Ok(())
    }

    /// The most recently pushed unit, for modifiers that apply backwards.
    fn previous(&mut self, cs: &str, span: Span) -> Result<&mut UnitPiece, Error> {
        self.pieces
            .last_mut()
            .ok_or_else(|| Error::MissingPreviousUnit {
                modifier: cs.to_string(),
                span,
            })
    }

    /// Adds a unit with the pending modifiers applied.
    fn push(&mut self, unit: UnitPiece) {
        let pending = std::mem::take(&mut self.pending);
        self.pieces.push(UnitPiece {
            symbol: unit.symbol,
            prefix: if pending.prefix.is_empty() {
                unit.prefix
            } else {
                pending.prefix
            },
            power: pending.power * unit.power,
            qualifier: unit.qualifier,
            ..pending
        });
        let sticky =
            self.options.sticky_per || self.options.per_mode == PerMode::RepeatedSymbol;
        if sticky && self.pieces.last().map(|p| p.position) == Some(Position::Denominator) {
            self.pending.position = Position::Denominator;
        }
    }

    /// Adds a user-declared unit.
    ///
    /// If its symbol is itself a unit expression the units it contains are added,
    ///     with the pending modifiers applying to all of them.
    fn user_unit(&mut self, cs: &str, symbol: &str, span: Span) -> Result<(), Error> {
        if is_unit_expression(symbol, self.units) && self.depth < MAX_EXPANSION_DEPTH {
            let mut inner = MacroParser {
                options: self.options,
                units: self.units,
                pieces: vec![],
                pending: Default::default(),
                overrides: vec![],
                depth: self.depth + 1,
            };
            inner
                .parse(symbol)
                .map_err(|err| Error::InvalidDeclaredUnit {
                    name: cs.to_string(),
                    symbol: symbol.to_string(),
                    reason: err.message(),
                    span,
                })?;
            if !inner.pieces.is_empty() {
                self.overrides.extend(inner.overrides);
                let pending = std::mem::take(&mut self.pending);
                for (i, mut piece) in inner.pieces.into_iter().enumerate() {
                    if i == 0 && !pending.prefix.is_empty() {
                        piece.prefix = pending.prefix.clone();
                    }
                    if pending.position == Position::Denominator {
                        piece.position = match piece.position {
                            Position::Numerator => Position::Denominator,
                            Position::Denominator => Position::Numerator,
                        };
                    }
                    piece.power *= pending.power;
                    piece.cancel |= pending.cancel;
                    if piece.highlight.is_empty() {
                        piece.highlight = pending.highlight.clone();
                    }
                    self.pieces.push(piece);
                }
                return Ok(());
            }
        }
        self.push(UnitPiece::new(symbol));
        Ok(())
    }

    fn unknown(&self, cs: &str, span: Span) -> Error {
        let names: Vec<String> = PREFIXES
            .iter()
            .map(|(n, _, _)| *n)
            .chain(UNITS.iter().map(|(n, _)| *n))
            .chain(SHORTCUTS.iter().map(|(n, _, _)| *n))
            .chain(MODIFIERS.iter().copied())
            .chain(self.units.names())
            .map(|n| format!["\\{n}"])
            .collect();
        Error::UnknownUnitMacro {
            name: cs.to_string(),
            span,
            suggestion: spellcheck::find_close_word(names.iter().map(String::as_str), cs)
                .map(str::to_string),
        }
    }
}

/// Reads the braced argument of a modifier.
fn argument(cs: &str, span: &Span, lexer: &mut Lexer) -> Result<(String, Span), Error> {
    match lexer.read_argument()? {
        Some(arg) => Ok((arg.text.trim().to_string(), arg.span)),
        None => Err(Error::MissingArgument {
            command: cs.to_string(),
            span: span.clone(),
        }),
    }
}

/// Parses a power like `2`, `-1`, `0.5` or `1/2`.
fn parse_power(value: &str, span: Span) -> Result<f64, Error> {
    let invalid = || Error::InvalidPower {
        value: value.to_string(),
        span: span.clone(),
    };
    let power = match value.split_once('/') {
        None => value.trim().parse::<f64>().map_err(|_| invalid())?,
        Some((n, d)) => {
            let n: f64 = n.trim().parse().map_err(|_| invalid())?;
            let d: f64 = d.trim().parse().map_err(|_| invalid())?;
            n / d
        }
    };
    if power.is_finite() {
        Ok(power)
    } else {
        Err(invalid())
    }
}

/// Parses a unit written as literal text, like `kg.m/s^2`.
fn parse_literal(text: &str, units: &UnitTable) -> Vec<UnitPiece> {
    let mut pieces: Vec<UnitPiece> = vec![];
    let mut position = Position::Numerator;
    let mut symbol = String::new();
    let mut chars = text.chars().peekable();
    let finish = |symbol: &mut String, pieces: &mut Vec<UnitPiece>, position: Position| {
        if symbol.is_empty() {
            return;
        }
        let (prefix, unit) = split_prefix(symbol, units);
        pieces.push(UnitPiece {
            prefix: prefix.to_string(),
            symbol: unit.to_string(),
            position,
            ..Default::default()
        });
        symbol.clear();
    };
    while let Some(c) = chars.next() {
        match c {
            '~' | '.' => finish(&mut symbol, &mut pieces, position),
            c if c.is_whitespace() => finish(&mut symbol, &mut pieces, position),
            '/' => {
                finish(&mut symbol, &mut pieces, position);
                position = Position::Denominator;
            }
            '^' | '_' => {
                finish(&mut symbol, &mut pieces, position);
                let script = if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut script = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        script.push(c);
                    }
                    script
                } else if c == '^' {
                    let mut script = String::new();
                    while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '-' || *c == '.') {
                        script.push(c);
                    }
                    script
                } else {
                    chars.next().map(String::from).unwrap_or_default()
                };
                if let Some(last) = pieces.last_mut() {
                    if c == '_' {
                        last.qualifier = script;
                    } else if let Ok(power) = script.trim().parse::<f64>() {
                        last.power = power;
                    }
                }
            }
            c => symbol.push(c),
        }
    }
    finish(&mut symbol, &mut pieces, position);
    pieces
}

/// Splits literal text into a prefix and a unit symbol.
///
/// A known unit symbol is never split, so `mol` is moles and not milli-ol.
/// Otherwise the longest prefix that leaves a known unit symbol is used.
fn split_prefix<'t>(text: &'t str, units: &UnitTable) -> (&'t str, &'t str) {
    let is_unit = |s: &str| {
        UNITS.iter().any(|(_, symbol)| *symbol == s)
            || units.units.values().any(|unit| unit.symbol == s)
    };
    if is_unit(text) {
        return ("", text);
    }
    PREFIXES
        .iter()
        .map(|(_, symbol, _)| *symbol)
        .filter(|prefix| text.len() > prefix.len() && text.starts_with(prefix))
        .filter(|prefix| is_unit(&text[prefix.len()..]))
        .max_by_key(|prefix| prefix.len())
        .map(|prefix| (&text[..prefix.len()], &text[prefix.len()..]))
        .unwrap_or(("", text))
}
