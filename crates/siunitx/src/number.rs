//! Numbers and the number parser.
//!
//! The parser has no fixed grammar.
//! Instead each token of the input is classified using the `input-*` options
//!     (which tokens are digits, signs, decimal markers and so on) and then
//!     applied to the number being built.
//! Tokens apply to the *current target*: the most recent uncertainty if there
//!     is one, and otherwise the number itself.

use std::collections::HashMap;

use crate::decimal;
use crate::error::{Error, Literal, Span};
use crate::options::Options;
use crate::token::{self, Lexer, Token};

/// Largest exponent magnitude a number may be written with.
///
/// Post-processing moves the decimal point by the exponent, so it bounds the
///     length of the digit strings.
pub const EXPONENT_LIMIT: i64 = 10_000;

/// A number split into its textual parts.
///
/// All digit strings are kept as text so that no precision is lost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumberPiece {
    /// Comparator before the number, like `<` or `\approx`.
    pub prefix: String,
    pub sign: String,
    pub whole: String,
    /// The decimal marker, or empty if the number has none.
    pub decimal: String,
    pub fractional: String,
    pub exponent_marker: String,
    pub exponent_sign: String,
    pub exponent: String,
    pub uncertainty: Vec<Uncertainty>,
}

/// How an uncertainty was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UncertaintyKind {
    /// Like `1.23(4)`.
    /// Unless the uncertainty has its own decimal marker, its digits line up with
    ///     the last digits of the number.
    Bracket,
    /// Like `1.23 \pm 0.04`.
    PlusMinus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Uncertainty {
    pub kind: UncertaintyKind,
    /// Whether a bracket uncertainty has been closed.
    pub completed: bool,
    /// The value of the uncertainty. Its own uncertainty list is always empty.
    pub value: NumberPiece,
}

impl Uncertainty {
    pub fn new(kind: UncertaintyKind) -> Uncertainty {
        Uncertainty {
            kind,
            completed: false,
            value: Default::default(),
        }
    }
}

impl Uncertainty {
    /// Whether the digits line up with the last digits of the number, as in
    /// `1.23(4)`.
    pub fn is_aligned(&self) -> bool {
        self.kind == UncertaintyKind::Bracket && self.value.decimal.is_empty()
    }
}

impl NumberPiece {
    /// Rewrites every uncertainty as a value in its own right: `12.34(5)`
    /// becomes `12.34 \pm 0.05`.
    pub fn uncertainty_to_plus_minus(&mut self) {
        let fractional_len = self.fractional.len();
        for u in &mut self.uncertainty {
            if u.is_aligned() {
                let mut digits = u.value.whole.clone();
                if digits.len() <= fractional_len {
                    digits.insert_str(0, &"0".repeat(fractional_len + 1 - digits.len()));
                }
                u.value.fractional = digits.split_off(digits.len() - fractional_len);
                u.value.whole = decimal::trim_leading_zeros(&digits);
                if !u.value.fractional.is_empty() {
                    u.value.decimal = ".".into();
                }
            }
            u.kind = UncertaintyKind::PlusMinus;
        }
    }

    /// Rewrites every uncertainty as digits lined up with the last digits of the
    /// number: `12.34 \pm 0.05` becomes `12.34(5)`.
    ///
    /// An uncertainty more precise than the number cannot be lined up and keeps
    /// its decimal marker.
    pub fn uncertainty_to_bracket(&mut self) {
        let fractional_len = self.fractional.len();
        for u in &mut self.uncertainty {
            if !u.is_aligned() && u.value.fractional.len() <= fractional_len {
                let digits = format![
                    "{}{}{}",
                    u.value.whole,
                    u.value.fractional,
                    "0".repeat(fractional_len - u.value.fractional.len())
                ];
                let digits = decimal::trim_leading_zeros(&digits);
                u.value.whole = if digits.is_empty() { "0".into() } else { digits };
                u.value.fractional.clear();
                u.value.decimal.clear();
            }
            u.kind = UncertaintyKind::Bracket;
        }
    }

    /// Whether the mantissa is zero.
    pub fn is_zero(&self) -> bool {
        self.whole
            .chars()
            .chain(self.fractional.chars())
            .all(|c| c == '0')
    }

    /// The exponent as an integer; zero if there is no exponent.
    ///
    /// The parser rejects exponents beyond [EXPONENT_LIMIT]; larger values set
    ///     by hand are saturated to it.
    pub fn exponent_value(&self) -> i64 {
        let magnitude = if self.exponent.is_empty() {
            0
        } else {
            self.exponent
                .parse::<i64>()
                .map_or(EXPONENT_LIMIT, |n| n.min(EXPONENT_LIMIT))
        };
        if self.exponent_sign == "-" {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Sets the exponent, adding an exponent marker if the number has none.
    pub fn set_exponent_value(&mut self, exponent: i64) {
        self.exponent = exponent.unsigned_abs().to_string();
        self.exponent_sign = if exponent < 0 { "-".into() } else { "".into() };
        if self.exponent_marker.is_empty() {
            self.exponent_marker = "e".into();
        }
    }

    pub fn clear_exponent(&mut self) {
        self.exponent_marker.clear();
        self.exponent_sign.clear();
        self.exponent.clear();
    }

    /// The number as a plain decimal literal like `-1.25e-3`, without uncertainties.
    pub fn to_plain_string(&self) -> String {
        let mut s = String::new();
        if self.sign == "-" {
            s.push('-');
        }
        s.push_str(if self.whole.is_empty() { "0" } else { &self.whole });
        if !self.fractional.is_empty() {
            s.push('.');
            s.push_str(&self.fractional);
        }
        if !self.exponent.is_empty() {
            s.push('e');
            if self.exponent_sign == "-" {
                s.push('-');
            }
            s.push_str(&self.exponent);
        }
        s
    }

    /// The number as a float, for conversions that need trigonometry.
    pub fn to_f64(&self) -> f64 {
        self.to_plain_string().parse().unwrap_or(0.0)
    }

    /// Builds a number from a float in plain decimal notation.
    ///
    /// Infinities and NaN have no decimal digits and are an error.
    pub fn from_f64(value: f64, literal: Literal) -> Result<NumberPiece, Error> {
        if !value.is_finite() {
            return Err(Error::NonFiniteValue { literal });
        }
        let mut piece = NumberPiece::default();
        if value < 0.0 {
            piece.sign = "-".into();
        }
        let text = format!["{}", value.abs()];
        match text.split_once('.') {
            None => piece.whole = text,
            Some((whole, fractional)) => {
                piece.whole = whole.into();
                piece.decimal = ".".into();
                piece.fractional = fractional.into();
            }
        }
        Ok(piece)
    }
}

/// What a token means to the number parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Comparator,
    Sign,
    Digit,
    DecimalMarker,
    OpenUncertainty,
    CloseUncertainty,
    UncertaintySign,
    /// In both `input-signs` and `input-uncertainty-signs`.
    SignOrUncertainty,
    ExponentMarker,
    Ignore,
}

/// The token classes of a resolved option set.
struct Classes<'a> {
    map: HashMap<&'a str, TokenClass>,
}

impl<'a> Classes<'a> {
    fn new(options: &'a Options) -> Result<Classes<'a>, Error> {
        use TokenClass::*;
        let classes: [(&'static str, &'a str, TokenClass); 9] = [
            ("input-comparators", &options.input_comparators, Comparator),
            ("input-signs", &options.input_signs, Sign),
            ("input-digits", &options.input_digits, Digit),
            ("input-decimal-markers", &options.input_decimal_markers, DecimalMarker),
            ("input-open-uncertainty", &options.input_open_uncertainty, OpenUncertainty),
            ("input-close-uncertainty", &options.input_close_uncertainty, CloseUncertainty),
            ("input-uncertainty-signs", &options.input_uncertainty_signs, UncertaintySign),
            ("input-exponent-markers", &options.input_exponent_markers, ExponentMarker),
            ("input-ignore", &options.input_ignore, Ignore),
        ];
        let mut map = HashMap::new();
        for (key, value, class) in classes {
            if token::ends_with_unescaped_backslash(value) {
                return Err(Error::BadOptionChars { key });
            }
            for token in token::class_tokens(value) {
                let class = match (map.get(token), class) {
                    (Some(Sign), UncertaintySign) => SignOrUncertainty,
                    _ => class,
                };
                map.insert(token, class);
            }
        }
        Ok(Classes { map })
    }

    fn get(&self, token: &str) -> Option<TokenClass> {
        self.map.get(token).copied()
    }
}

/// Two-character shorthands that are read as a single control sequence.
const DIGRAPHS: [(&str, &str); 5] = [
    ("<<", r"\ll"),
    (">>", r"\gg"),
    ("<=", r"\le"),
    (">=", r"\ge"),
    ("+-", r"\pm"),
];

struct Builder {
    piece: NumberPiece,
    /// The number of uncertainties when the exponent marker was read.
    exponent_at: Option<usize>,
    /// The source of the exponent, from its marker to its last token.
    exponent_span: Option<Span>,
}

impl Builder {
    fn target(&mut self) -> &mut NumberPiece {
        if self.piece.uncertainty.is_empty() {
            return &mut self.piece;
        }
        let last = self.piece.uncertainty.len() - 1;
        &mut self.piece.uncertainty[last].value
    }

    /// Whether tokens are being read into the exponent of the number.
    ///
    /// This stops as soon as an uncertainty is opened after the exponent marker.
    fn in_exponent(&self) -> bool {
        self.exponent_at == Some(self.piece.uncertainty.len())
    }

    fn extend_exponent(&mut self, span: &Span) {
        if let Some(exponent) = &mut self.exponent_span {
            exponent.end = span.end;
        }
    }

    /// Whether a sign-or-uncertainty token would be the first thing in its target.
    fn at_start(&mut self) -> bool {
        if self.in_exponent() {
            return self.piece.exponent.is_empty();
        }
        let target = self.target();
        target.whole.is_empty() && target.decimal.is_empty()
    }

    fn apply(&mut self, class: TokenClass, text: &str, span: Span) -> Result<(), Error> {
        use TokenClass::*;
        match class {
            Digit => {
                if self.in_exponent() {
                    self.piece.exponent.push_str(text);
                    self.extend_exponent(&span);
                } else {
                    let target = self.target();
                    if target.decimal.is_empty() {
                        target.whole.push_str(text);
                    } else {
                        target.fractional.push_str(text);
                    }
                }
            }
            DecimalMarker => {
                if self.in_exponent() || !self.target().decimal.is_empty() {
                    return Err(unexpected(text, span));
                }
                self.target().decimal = text.to_string();
            }
            Comparator => {
                let target = self.target();
                if !target.prefix.is_empty() {
                    return Err(Error::ComparatorAlreadySet {
                        existing: target.prefix.clone(),
                        token: text.to_string(),
                        span,
                    });
                }
                target.prefix = text.to_string();
            }
            ExponentMarker => {
                if self.exponent_at.is_some() {
                    return Err(unexpected(text, span));
                }
                self.piece.exponent_marker = text.to_string();
                self.exponent_at = Some(self.piece.uncertainty.len());
                self.exponent_span = Some(span);
            }
            Sign => {
                if self.in_exponent() {
                    self.piece.exponent_sign.push_str(text);
                    self.extend_exponent(&span);
                } else {
                    self.target().sign.push_str(text);
                }
            }
            OpenUncertainty => {
                if let Some(last) = self.piece.uncertainty.last() {
                    if last.kind == UncertaintyKind::Bracket && !last.completed {
                        return Err(Error::NestedUncertainty { span });
                    }
                }
                self.piece
                    .uncertainty
                    .push(Uncertainty::new(UncertaintyKind::Bracket));
            }
            CloseUncertainty => match self.piece.uncertainty.last_mut() {
                Some(last) if last.kind == UncertaintyKind::Bracket => {
                    if last.completed {
                        return Err(Error::UncertaintyAlreadyClosed { span });
                    }
                    last.completed = true;
                }
                _ => return Err(Error::NoUncertaintyToClose { span }),
            },
            UncertaintySign => {
                self.piece
                    .uncertainty
                    .push(Uncertainty::new(UncertaintyKind::PlusMinus));
            }
            SignOrUncertainty => {
                let class = if self.at_start() { Sign } else { UncertaintySign };
                self.apply(class, text, span)?;
            }
            Ignore => {}
        }
        Ok(())
    }
}

fn unexpected(text: &str, span: Span) -> Error {
    Error::UnexpectedToken {
        token: text.to_string(),
        literal: Literal::Number,
        span,
    }
}

/// Parses a number literal.
pub fn parse_number(text: &str, options: &Options) -> Result<NumberPiece, Error> {
    parse_literal(text, options, Literal::Number)
}

pub(crate) fn parse_literal(
    text: &str,
    options: &Options,
    literal: Literal,
) -> Result<NumberPiece, Error> {
    let classes = Classes::new(options)?;
    let mut builder = Builder {
        piece: Default::default(),
        exponent_at: None,
        exponent_span: None,
    };
    let mut lexer = Lexer::new(text);
    while let Some((token, span)) = lexer.next_token() {
        let (text, span) = match token {
            Token::Char(c) => match DIGRAPHS
                .iter()
                .find(|(digraph, _)| text[span.start..].starts_with(digraph))
            {
                Some((digraph, replacement)) => {
                    let span = span.start..span.start + digraph.len();
                    while lexer.position() < span.end {
                        lexer.next_token();
                    }
                    (replacement.to_string(), span)
                }
                None => (c.to_string(), span),
            },
            token => (token.text(), span),
        };
        let Some(class) = classes.get(&text) else {
            return Err(Error::UnexpectedToken {
                token: text,
                literal,
                span,
            });
        };
        builder.apply(class, &text, span)?;
    }
    let mut piece = builder.piece;
    let exponent = piece.exponent.trim_start_matches('0');
    if exponent.len() > 18 || exponent.parse::<i64>().map_or(false, |n| n > EXPONENT_LIMIT) {
        return Err(Error::ExponentOutOfRange {
            exponent: format!["{}{}", piece.exponent_sign, piece.exponent],
            span: builder.exponent_span.unwrap_or(0..0),
        });
    }

    if !options.retain_explicit_decimal_marker && piece.fractional.is_empty() {
        piece.decimal.clear();
    }
    if !options.retain_explicit_plus && piece.sign == "+" {
        piece.sign.clear();
    }
    let zero = piece.is_zero() && !(piece.whole.is_empty() && !piece.exponent.is_empty());
    if !options.retain_negative_zero && piece.sign == "-" && zero {
        piece.sign.clear();
    }
    if !options.retain_zero_uncertainty {
        piece.uncertainty.retain(|u| !u.value.is_zero());
    }
    Ok(piece)
}
