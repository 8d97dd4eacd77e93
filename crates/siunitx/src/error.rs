use std::ops::Range;

/// Byte range into the text an error was raised against.
pub type Span = Range<usize>;

/// Broad classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Malformed input at the character level, before any parsing.
    Lexical,
    /// Input that could not be interpreted as a number, angle or unit.
    Parse,
    /// Unknown option keys and wrongly-typed option values.
    Option,
    /// Input that parsed but cannot be given a meaning.
    Semantic,
}

/// The kind of literal being parsed when an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Number,
    Angle,
    Complex,
    Unit,
}

impl Literal {
    fn name(&self) -> &'static str {
        match self {
            Literal::Number => "number",
            Literal::Angle => "angle",
            Literal::Complex => "complex number",
            Literal::Unit => "unit",
        }
    }
}

/// Error encountered when parsing or rendering a quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An input character class option ends with an unescaped backslash.
    BadOptionChars { key: &'static str },

    /// A `{` is never closed.
    UnterminatedGroup { open: Span },

    /// A `}` appears without a matching `{`.
    UnmatchedCloseBrace { span: Span },

    /// A `[` starting an option list is never closed.
    UnterminatedOptions { open: Span },

    /// A token that has no meaning in the literal being parsed.
    UnexpectedToken {
        token: String,
        literal: Literal,
        span: Span,
    },

    /// Two comparators were given for the same number.
    ComparatorAlreadySet {
        existing: String,
        token: String,
        span: Span,
    },

    /// An uncertainty bracket was opened while another was still open.
    NestedUncertainty { span: Span },

    /// An uncertainty bracket was closed but none was open.
    NoUncertaintyToClose { span: Span },

    /// An uncertainty bracket was closed twice.
    UncertaintyAlreadyClosed { span: Span },

    /// A control sequence in a unit that is not a prefix, unit or modifier.
    UnknownUnitMacro {
        name: String,
        span: Span,
        suggestion: Option<String>,
    },

    /// A command or modifier is missing a required braced argument.
    MissingArgument { command: String, span: Span },

    /// A command that this engine does not provide.
    UnknownCommand {
        name: String,
        span: Span,
        suggestion: Option<String>,
    },

    /// An angle has more than three semicolon-separated parts.
    ExtraSemicolon { span: Span },

    /// No option with this key exists.
    UnknownOption {
        key: String,
        span: Span,
        suggestion: Option<String>,
    },

    /// An option value has the wrong type.
    InvalidOptionValue {
        key: String,
        expected: String,
        value: String,
        span: Span,
    },

    /// A modifier like `\squared` with no unit before it.
    MissingPreviousUnit { modifier: String, span: Span },

    /// A unit was written without macros while `forbid-literal-units` is set.
    LiteralUnitsForbidden { literal: String },

    /// The `exponent-thresholds` option is not of the form `min:max`.
    ExponentThresholds { value: String },

    /// A unit power that is not a number.
    InvalidPower { value: String, span: Span },

    /// An exponent larger than [crate::number::EXPONENT_LIMIT].
    ExponentOutOfRange { exponent: String, span: Span },

    /// A converted value, like the magnitude of a complex number, is not finite.
    NonFiniteValue { literal: Literal },

    /// A declared unit whose symbol is a unit expression that does not parse.
    InvalidDeclaredUnit {
        name: String,
        symbol: String,
        reason: String,
        span: Span,
    },
}

impl Error {
    pub fn kind(&self) -> Kind {
        use Error::*;
        match self {
            BadOptionChars { .. }
            | UnterminatedGroup { .. }
            | UnmatchedCloseBrace { .. }
            | UnterminatedOptions { .. } => Kind::Lexical,
            UnexpectedToken { .. }
            | ComparatorAlreadySet { .. }
            | NestedUncertainty { .. }
            | NoUncertaintyToClose { .. }
            | UncertaintyAlreadyClosed { .. }
            | UnknownUnitMacro { .. }
            | MissingArgument { .. }
            | UnknownCommand { .. }
            | ExtraSemicolon { .. } => Kind::Parse,
            UnknownOption { .. } | InvalidOptionValue { .. } => Kind::Option,
            MissingPreviousUnit { .. }
            | LiteralUnitsForbidden { .. }
            | ExponentThresholds { .. }
            | InvalidPower { .. }
            | ExponentOutOfRange { .. }
            | NonFiniteValue { .. }
            | InvalidDeclaredUnit { .. } => Kind::Semantic,
        }
    }

    pub fn message(&self) -> String {
        use Error::*;
        match self {
            BadOptionChars { key } => {
                format!["The `{key}` option ends with an unescaped backslash"]
            }
            UnterminatedGroup { .. } => "A `{` is never closed".into(),
            UnmatchedCloseBrace { .. } => "A `}` appears without a matching `{`".into(),
            UnterminatedOptions { .. } => "An option list is missing its closing `]`".into(),
            UnexpectedToken { token, literal, .. } => {
                format!["Invalid {} argument: unexpected `{token}`", literal.name()]
            }
            ComparatorAlreadySet {
                existing, token, ..
            } => {
                format!["Comparator `{existing}` is already set; cannot add `{token}`"]
            }
            NestedUncertainty { .. } => {
                "An uncertainty was opened while another is still open".into()
            }
            NoUncertaintyToClose { .. } => {
                "Trying to close an uncertainty that doesn't exist".into()
            }
            UncertaintyAlreadyClosed { .. } => "Uncertainty was already closed".into(),
            UnknownUnitMacro { name, .. } => {
                format!["No interpretation for the unit macro `{name}`"]
            }
            MissingArgument { command, .. } => {
                format!["`{command}` is missing a required argument"]
            }
            UnknownCommand { name, .. } => format!["Unknown command `{name}`"],
            ExtraSemicolon { .. } => "An angle can have at most two semicolons".into(),
            UnknownOption { key, .. } => format!["Unknown option `{key}`"],
            InvalidOptionValue { key, expected, .. } => {
                format!["The `{key}` option must be {expected}"]
            }
            MissingPreviousUnit { modifier, .. } => {
                format!["There is no previous unit for `{modifier}` to modify"]
            }
            LiteralUnitsForbidden { literal } => {
                format!["Literal units are forbidden: `{literal}`"]
            }
            ExponentThresholds { value } => {
                format!["Invalid exponent thresholds `{value}`; expected `min:max`"]
            }
            InvalidPower { value, .. } => format!["The power `{value}` is not a number"],
            ExponentOutOfRange { exponent, .. } => {
                format!["The exponent `{exponent}` is out of range"]
            }
            NonFiniteValue { literal } => {
                format!["The converted {} is too large to write out", literal.name()]
            }
            InvalidDeclaredUnit { name, symbol, .. } => {
                format!["The unit `{name}` is declared as `{symbol}`, which is not a valid unit"]
            }
        }
    }

    /// The span of the source that the error primarily refers to, if known.
    pub fn span(&self) -> Option<Span> {
        use Error::*;
        match self {
            BadOptionChars { .. }
            | LiteralUnitsForbidden { .. }
            | ExponentThresholds { .. }
            | NonFiniteValue { .. } => None,
            UnterminatedGroup { open } | UnterminatedOptions { open } => Some(open.clone()),
            UnmatchedCloseBrace { span }
            | UnexpectedToken { span, .. }
            | ComparatorAlreadySet { span, .. }
            | NestedUncertainty { span }
            | NoUncertaintyToClose { span }
            | UncertaintyAlreadyClosed { span }
            | UnknownUnitMacro { span, .. }
            | MissingArgument { span, .. }
            | UnknownCommand { span, .. }
            | ExtraSemicolon { span }
            | UnknownOption { span, .. }
            | InvalidOptionValue { span, .. }
            | MissingPreviousUnit { span, .. }
            | InvalidPower { span, .. }
            | ExponentOutOfRange { span, .. }
            | InvalidDeclaredUnit { span, .. } => Some(span.clone()),
        }
    }

    fn span_mut(&mut self) -> Option<&mut Span> {
        use Error::*;
        match self {
            BadOptionChars { .. }
            | LiteralUnitsForbidden { .. }
            | ExponentThresholds { .. }
            | NonFiniteValue { .. } => None,
            UnterminatedGroup { open } | UnterminatedOptions { open } => Some(open),
            UnmatchedCloseBrace { span }
            | UnexpectedToken { span, .. }
            | ComparatorAlreadySet { span, .. }
            | NestedUncertainty { span }
            | NoUncertaintyToClose { span }
            | UncertaintyAlreadyClosed { span }
            | UnknownUnitMacro { span, .. }
            | MissingArgument { span, .. }
            | UnknownCommand { span, .. }
            | ExtraSemicolon { span }
            | UnknownOption { span, .. }
            | InvalidOptionValue { span, .. }
            | MissingPreviousUnit { span, .. }
            | InvalidPower { span, .. }
            | ExponentOutOfRange { span, .. }
            | InvalidDeclaredUnit { span, .. } => Some(span),
        }
    }

    /// Moves the span of this error by `offset` bytes.
    ///
    /// Literals are parsed on their own, so their errors carry spans relative to
    /// the literal. When the literal came from a larger source the caller shifts the
    /// error so that the span points into that source.
    pub fn shifted(mut self, offset: usize) -> Error {
        if let Some(span) = self.span_mut() {
            *span = span.start + offset..span.end + offset;
        }
        self
    }

    pub fn labels(&self) -> Vec<ErrorLabel> {
        use Error::*;
        let Some(span) = self.span() else {
            return vec![];
        };
        let text = match self {
            UnterminatedGroup { .. } => "the group opens here".to_string(),
            UnmatchedCloseBrace { .. } => "this brace closes nothing".to_string(),
            UnterminatedOptions { .. } => "the option list opens here".to_string(),
            UnexpectedToken { literal, .. } => {
                format!["this token is not valid in a {}", literal.name()]
            }
            ComparatorAlreadySet { .. } => "the second comparator appears here".to_string(),
            NestedUncertainty { .. } => "the second uncertainty opens here".to_string(),
            NoUncertaintyToClose { .. } | UncertaintyAlreadyClosed { .. } => {
                "the uncertainty is closed here".to_string()
            }
            UnknownUnitMacro { .. } => "unknown unit macro".to_string(),
            MissingArgument { .. } => "expected a braced argument after this".to_string(),
            UnknownCommand { .. } => "unknown command".to_string(),
            ExtraSemicolon { .. } => "the third semicolon appears here".to_string(),
            UnknownOption { .. } => "unknown option key".to_string(),
            InvalidOptionValue { value, .. } => format!["the provided value is `{value}`"],
            MissingPreviousUnit { .. } => "this modifies the unit before it".to_string(),
            InvalidPower { .. } => "the power appears here".to_string(),
            ExponentOutOfRange { .. } => "the exponent appears here".to_string(),
            InvalidDeclaredUnit { .. } => "the unit is used here".to_string(),
            BadOptionChars { .. }
            | LiteralUnitsForbidden { .. }
            | ExponentThresholds { .. }
            | NonFiniteValue { .. } => {
                return vec![];
            }
        };
        vec![ErrorLabel { span, text }]
    }

    pub fn notes(&self) -> Vec<String> {
        use Error::*;
        match self {
            BadOptionChars { .. } => {
                vec!["a backslash must be followed by a control sequence name".to_string()]
            }
            UnknownUnitMacro { suggestion, .. }
            | UnknownCommand { suggestion, .. }
            | UnknownOption { suggestion, .. } => match suggestion {
                None => vec![],
                Some(suggestion) => vec![format!["did you mean `{suggestion}`?"]],
            },
            LiteralUnitsForbidden { .. } => {
                vec!["write the unit with macros, for example `\\metre\\per\\second`".to_string()]
            }
            ExponentThresholds { .. } => {
                vec!["for example `exponent-thresholds = -3:3`".to_string()]
            }
            ExponentOutOfRange { .. } => {
                let limit = crate::number::EXPONENT_LIMIT;
                vec![format!["exponents must be between -{limit} and {limit}"]]
            }
            InvalidDeclaredUnit { reason, .. } => vec![reason.clone()],
            UnterminatedGroup { .. }
            | UnmatchedCloseBrace { .. }
            | UnterminatedOptions { .. }
            | UnexpectedToken { .. }
            | ComparatorAlreadySet { .. }
            | NestedUncertainty { .. }
            | NoUncertaintyToClose { .. }
            | UncertaintyAlreadyClosed { .. }
            | MissingArgument { .. }
            | ExtraSemicolon { .. }
            | InvalidOptionValue { .. }
            | MissingPreviousUnit { .. }
            | InvalidPower { .. }
            | NonFiniteValue { .. } => vec![],
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())?;
        for note in self.notes() {
            write!(f, " ({note})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// Label on an error message.
///
/// A label identifies a particular piece of source code and some
/// information about it.
pub struct ErrorLabel {
    pub span: Span,
    pub text: String,
}

impl Error {
    #[cfg(feature = "ariadne")]
    pub fn ariadne_report<'a>(
        &self,
        file_name: &'a str,
    ) -> ariadne::Report<'static, (&'a str, std::ops::Range<usize>)> {
        let mut report = ariadne::Report::build(
            ariadne::ReportKind::Error,
            (file_name, self.span().unwrap_or(0..0)),
        )
        .with_message(self.message());
        let mut color = ariadne::Color::BrightRed;
        for label in self.labels() {
            report = report.with_label(
                ariadne::Label::new((file_name, label.span))
                    .with_message(label.text)
                    .with_color(color),
            );
            color = ariadne::Color::BrightYellow;
        }
        for note in self.notes() {
            report = report.with_note(note);
        }
        report.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_err(source: &str) -> Error {
        let mut session = crate::Session::new();
        session.invoke(source).unwrap_err()
    }

    macro_rules! error_tests {
        ( $(
            ($name: ident, $source: expr, Error:: $want_variant: ident, Kind:: $want_kind: ident,),
        )+ ) => {
            $(
            #[test]
            fn $name() {
                let source = $source;
                let err = get_err(source);
                println!["got: {err:?}"];
                assert!(matches!(err, Error::$want_variant {..}));
                assert_eq!(err.kind(), Kind::$want_kind);
            }
            )+
        };
    }

    error_tests!(
        (
            unterminated_group,
            r"\num{1.2",
            Error::UnterminatedGroup,
            Kind::Lexical,
        ),
        (
            unterminated_options,
            r"\num[round-mode=places{1.2}",
            Error::UnterminatedOptions,
            Kind::Lexical,
        ),
        (
            invalid_number_token,
            r"\num{1.2q}",
            Error::UnexpectedToken,
            Kind::Parse,
        ),
        (
            second_comparator,
            r"\num{<>1}",
            Error::ComparatorAlreadySet,
            Kind::Parse,
        ),
        (
            close_without_open,
            r"\num{1.2)}",
            Error::NoUncertaintyToClose,
            Kind::Parse,
        ),
        (
            close_twice,
            r"\num{1.2(3))}",
            Error::UncertaintyAlreadyClosed,
            Kind::Parse,
        ),
        (
            nested_uncertainty,
            r"\num{1.2(3(4)}",
            Error::NestedUncertainty,
            Kind::Parse,
        ),
        (
            unknown_unit_macro,
            r"\unit{\metrr}",
            Error::UnknownUnitMacro,
            Kind::Parse,
        ),
        (
            unknown_command,
            r"\nmu{1}",
            Error::UnknownCommand,
            Kind::Parse,
        ),
        (
            missing_argument,
            r"\qty{1}",
            Error::MissingArgument,
            Kind::Parse,
        ),
        (
            extra_semicolon,
            r"\ang{1;2;3;4}",
            Error::ExtraSemicolon,
            Kind::Parse,
        ),
        (
            unknown_option,
            r"\num[round-mod=places]{1}",
            Error::UnknownOption,
            Kind::Option,
        ),
        (
            invalid_option_value,
            r"\num[round-precision=two]{1}",
            Error::InvalidOptionValue,
            Kind::Option,
        ),
        (
            invalid_choice_value,
            r"\num[round-mode=sideways]{1}",
            Error::InvalidOptionValue,
            Kind::Option,
        ),
        (
            missing_previous_unit,
            r"\unit{\squared\metre}",
            Error::MissingPreviousUnit,
            Kind::Semantic,
        ),
        (
            literal_units_forbidden,
            r"\unit[forbid-literal-units]{m/s}",
            Error::LiteralUnitsForbidden,
            Kind::Semantic,
        ),
        (
            bad_thresholds,
            r"\num[exponent-mode=threshold, exponent-thresholds=3]{1}",
            Error::ExponentThresholds,
            Kind::Semantic,
        ),
        (
            invalid_power,
            r"\unit{\metre\tothe{x}}",
            Error::InvalidPower,
            Kind::Semantic,
        ),
        (
            exponent_out_of_range,
            r"\num{1e99999999999999999999}",
            Error::ExponentOutOfRange,
            Kind::Semantic,
        ),
        (
            non_finite_value,
            r"\complexnum[complex-mode=polar]{1e10000+1e10000i}",
            Error::NonFiniteValue,
            Kind::Semantic,
        ),
    );

    #[test]
    fn spans_point_into_the_command() {
        let source = r"\num{1.2q}";
        let err = get_err(source);
        assert_eq!(err.span(), Some(8..9));
        assert_eq!(&source[8..9], "q");
    }

    #[test]
    fn unknown_option_suggests_a_key() {
        let err = get_err(r"\num[round-mod=places]{1}");
        assert_eq!(err.notes(), vec!["did you mean `round-mode`?".to_string()]);
    }

    #[test]
    fn unknown_unit_suggests_a_macro() {
        let err = get_err(r"\unit{\metrr}");
        assert_eq!(err.notes(), vec!["did you mean `\\metre`?".to_string()]);
    }
}
