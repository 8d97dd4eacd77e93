//! The option set.
//!
//! Every setting is a typed field of [Options].
//! Settings are changed by applying `key=value` lists (see [crate::keyval]);
//!     each value is checked against the type of its field.
//! Numeric options also accept numeric-looking strings, which is how every number
//!     arrives from an option list.
//!
//! Options are layered by value:
//!     a session holds the defaults plus `\sisetup` overrides,
//!     and each invocation works on a copy with its local overrides applied.
//! Applying a list is all-or-nothing; if any entry is invalid the options are
//!     left as they were.

use crate::error::Error;
use crate::keyval::{self, KeyVal, Value};
use crate::spellcheck;

/// Types that can be the value of an option.
pub trait OptionValue: Sized {
    /// Description of the accepted values, used in error messages.
    fn expected() -> String;

    fn from_value(value: &Value) -> Option<Self>;

    /// The value as it would be written in an option list.
    fn describe(&self) -> String;
}

impl OptionValue for bool {
    fn expected() -> String {
        "a boolean (`true` or `false`)".into()
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Text(_) => None,
        }
    }
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl OptionValue for String {
    fn expected() -> String {
        "a string".into()
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => None,
            Value::Text(s) => Some(s.clone()),
        }
    }
    fn describe(&self) -> String {
        format!["{{{self}}}"]
    }
}

/// Largest magnitude accepted for an integer option.
///
/// Integer options size digit strings, so they are kept well away from the
///     limits of the integer types.
pub const INTEGER_LIMIT: i64 = 1000;

/// Parses a numeric-looking string into an integer.
///
/// Values like `3.0` and `+2` are accepted; values with a non-zero fractional
///     part, or outside `±INTEGER_LIMIT`, are not.
fn coerce_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let n = match s.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            let f = s.parse::<f64>().ok()?;
            if !(f.is_finite() && f.fract() == 0.0 && f.abs() <= INTEGER_LIMIT as f64) {
                return None;
            }
            f as i64
        }
    };
    if (-INTEGER_LIMIT..=INTEGER_LIMIT).contains(&n) {
        Some(n)
    } else {
        None
    }
}

impl OptionValue for i64 {
    fn expected() -> String {
        format!["an integer between -{INTEGER_LIMIT} and {INTEGER_LIMIT}"]
    }
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => None,
            Value::Text(s) => coerce_integer(s),
        }
    }
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl OptionValue for usize {
    fn expected() -> String {
        format!["an integer between 0 and {INTEGER_LIMIT}"]
    }
    fn from_value(value: &Value) -> Option<Self> {
        let n = i64::from_value(value)?;
        usize::try_from(n).ok()
    }
    fn describe(&self) -> String {
        self.to_string()
    }
}

macro_rules! choice {
    (
        $( #[$meta: meta] )*
        $name: ident {
            $( $variant: ident => $text: literal, )+
        }
    ) => {
        $( #[$meta] )*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl OptionValue for $name {
            fn expected() -> String {
                let names: Vec<String> = $name::ALL
                    .iter()
                    .map(|v| format!["`{}`", v.name()])
                    .collect();
                format!["one of {}", names.join(", ")]
            }
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Text(s) => $name::ALL.iter().copied().find(|v| v.name() == s.trim()),
                    Value::Bool(_) => None,
                }
            }
            fn describe(&self) -> String {
                self.name().to_string()
            }
        }
    };
}

choice!(
    /// How the exponent of a number is chosen.
    ExponentMode {
        Input => "input",
        Fixed => "fixed",
        Engineering => "engineering",
        Scientific => "scientific",
        Threshold => "threshold",
    }
);

choice!(
    /// Which rounding, if any, is applied to numbers.
    RoundMode {
        None => "none",
        Figures => "figures",
        Places => "places",
        Uncertainty => "uncertainty",
    }
);

choice!(
    /// Tie breaking rule when rounding.
    RoundHalf {
        Up => "up",
        Even => "even",
    }
);

choice!(
    /// Which parts of a number have their digits grouped.
    GroupDigits {
        All => "all",
        None => "none",
        Decimal => "decimal",
        Integer => "integer",
    }
);

choice!(
    /// How uncertainties are printed.
    UncertaintyMode {
        Separate => "separate",
        Compact => "compact",
        Full => "full",
        CompactMarker => "compact-marker",
    }
);

choice!(
    /// How units in the denominator are printed.
    PerMode {
        Power => "power",
        Fraction => "fraction",
        Symbol => "symbol",
        PowerPositiveFirst => "power-positive-first",
        RepeatedSymbol => "repeated-symbol",
        SingleSymbol => "single-symbol",
    }
);

choice!(
    /// How unit qualifiers like `\of{salt}` are printed.
    QualifierMode {
        Subscript => "subscript",
        Bracket => "bracket",
        Combine => "combine",
        Phrase => "phrase",
    }
);

choice!(
    /// How angles are converted before printing.
    AngleMode {
        Input => "input",
        Arc => "arc",
        Decimal => "decimal",
    }
);

choice!(
    /// How the exponent of a quantity interacts with the prefix of its unit.
    PrefixMode {
        Input => "input",
        CombineExponent => "combine-exponent",
        ExtractExponent => "extract-exponent",
    }
);

choice!(
    /// How units are attached to a quantity with a separate uncertainty.
    SeparateUncertaintyUnits {
        Bracket => "bracket",
        Repeat => "repeat",
        Single => "single",
    }
);

choice!(
    /// How complex numbers are printed.
    ComplexMode {
        Input => "input",
        Cartesian => "cartesian",
        Polar => "polar",
    }
);

choice!(
    /// Unit of the angle of a complex number in polar form.
    ComplexAngleUnit {
        Degrees => "degrees",
        Radians => "radians",
    }
);

choice!(
    /// Where the imaginary root is placed relative to the imaginary part.
    RootPosition {
        BeforeNumber => "before-number",
        AfterNumber => "after-number",
    }
);

choice!(
    /// Whether the elements of a list, range or product share one exponent.
    ExponentsMode {
        Individual => "individual",
        Combine => "combine",
        CombineBracket => "combine-bracket",
    }
);

choice!(
    /// How units are attached to the elements of a list, range or product.
    UnitsMode {
        Repeat => "repeat",
        Single => "single",
        Bracket => "bracket",
        Power => "power",
        BracketPower => "bracket-power",
    }
);

choice!(
    /// Whether products are joined with a symbol or a phrase.
    ProductMode {
        Symbol => "symbol",
        Phrase => "phrase",
    }
);

macro_rules! options {
    ( $( $key: literal $field: ident : $ty: ty = $default: expr ; )+ ) => {
        /// The complete set of options.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Options {
            $( pub $field: $ty, )+
        }

        impl Default for Options {
            fn default() -> Self {
                Options {
                    $( $field: $default, )+
                }
            }
        }

        impl Options {
            /// The keys of all options, in declaration order.
            pub const KEYS: &'static [&'static str] = &[ $( $key, )+ ];

            fn set_value(&mut self, key: &str, value: &Value) -> Result<(), String> {
                match key {
                    $(
                    $key => {
                        self.$field = <$ty as OptionValue>::from_value(value)
                            .ok_or_else(<$ty as OptionValue>::expected)?;
                    }
                    )+
                    _ => unreachable!("keys are checked before values are set"),
                }
                Ok(())
            }

            /// The current value of an option, as it would be written in an option list.
            pub fn describe(&self, key: &str) -> Option<String> {
                match key {
                    $( $key => Some(self.$field.describe()), )+
                    _ => None,
                }
            }
        }
    };
}

options!(
    // Number parsing
    "input-close-uncertainty" input_close_uncertainty: String = ")".into();
    "input-comparators" input_comparators: String = r"<=>\approx\ge\geq\gg\le\leq\ll\sim".into();
    "input-decimal-markers" input_decimal_markers: String = ".,".into();
    "input-digits" input_digits: String = "0123456789".into();
    "input-exponent-markers" input_exponent_markers: String = "dDeE".into();
    "input-ignore" input_ignore: String = "".into();
    "input-open-uncertainty" input_open_uncertainty: String = "(".into();
    "input-signs" input_signs: String = r"+-\pm\mp".into();
    "input-uncertainty-signs" input_uncertainty_signs: String = r"\pm\mp".into();
    "parse-numbers" parse_numbers: bool = true;
    "retain-explicit-decimal-marker" retain_explicit_decimal_marker: bool = false;
    "retain-explicit-plus" retain_explicit_plus: bool = false;
    "retain-negative-zero" retain_negative_zero: bool = false;
    "retain-zero-uncertainty" retain_zero_uncertainty: bool = false;

    // Number post-processing
    "drop-exponent" drop_exponent: bool = false;
    "drop-uncertainty" drop_uncertainty: bool = false;
    "drop-zero-decimal" drop_zero_decimal: bool = false;
    "exponent-mode" exponent_mode: ExponentMode = ExponentMode::Input;
    "exponent-thresholds" exponent_thresholds: String = "-3:3".into();
    "fixed-exponent" fixed_exponent: i64 = 0;
    "minimum-integer-digits" minimum_integer_digits: usize = 0;
    "minimum-decimal-digits" minimum_decimal_digits: usize = 0;
    "round-half" round_half: RoundHalf = RoundHalf::Up;
    "round-minimum" round_minimum: String = "0".into();
    "round-mode" round_mode: RoundMode = RoundMode::None;
    "round-pad" round_pad: bool = true;
    "round-precision" round_precision: i64 = 2;
    "round-zero-positive" round_zero_positive: bool = true;

    // Number output
    "bracket-negative-numbers" bracket_negative_numbers: bool = false;
    "digit-group-size" digit_group_size: usize = 3;
    "digit-group-first-size" digit_group_first_size: i64 = -1;
    "digit-group-other-size" digit_group_other_size: i64 = -1;
    "exponent-base" exponent_base: String = "10".into();
    "exponent-product" exponent_product: String = r"\times".into();
    "group-digits" group_digits: GroupDigits = GroupDigits::All;
    "group-minimum-digits" group_minimum_digits: usize = 5;
    "group-separator" group_separator: String = r"\,".into();
    "negative-color" negative_color: String = "".into();
    "output-close-uncertainty" output_close_uncertainty: String = ")".into();
    "output-decimal-marker" output_decimal_marker: String = ".".into();
    "output-exponent-marker" output_exponent_marker: String = "".into();
    "output-open-uncertainty" output_open_uncertainty: String = "(".into();
    "print-implicit-plus" print_implicit_plus: bool = false;
    "print-unity-mantissa" print_unity_mantissa: bool = true;
    "print-zero-exponent" print_zero_exponent: bool = false;
    "print-zero-integer" print_zero_integer: bool = true;
    "tight-spacing" tight_spacing: bool = false;
    "uncertainty-mode" uncertainty_mode: UncertaintyMode = UncertaintyMode::Compact;
    "uncertainty-separator" uncertainty_separator: String = "".into();
    "zero-decimal-as-symbol" zero_decimal_as_symbol: bool = false;
    "zero-symbol" zero_symbol: String = r"\mbox{---}".into();

    // Units
    "bracket-unit-denominator" bracket_unit_denominator: bool = true;
    "forbid-literal-units" forbid_literal_units: bool = false;
    "fraction-command" fraction_command: String = r"\frac".into();
    "inter-unit-product" inter_unit_product: String = r"\,".into();
    "parse-units" parse_units: bool = true;
    "per-mode" per_mode: PerMode = PerMode::Power;
    "per-symbol" per_symbol: String = "/".into();
    "per-symbol-script-correction" per_symbol_script_correction: String = r"\!".into();
    "power-half-as-sqrt" power_half_as_sqrt: bool = false;
    "qualifier-mode" qualifier_mode: QualifierMode = QualifierMode::Subscript;
    "qualifier-phrase" qualifier_phrase: String = "".into();
    "sticky-per" sticky_per: bool = false;
    "unit-font-command" unit_font_command: String = r"\mathrm".into();

    // Angles
    "angle-mode" angle_mode: AngleMode = AngleMode::Input;
    "angle-separator" angle_separator: String = "".into();
    "angle-symbol-degree" angle_symbol_degree: String = r"\degree".into();
    "angle-symbol-minute" angle_symbol_minute: String = "'".into();
    "angle-symbol-over-decimal" angle_symbol_over_decimal: bool = false;
    "angle-symbol-second" angle_symbol_second: String = "''".into();
    "fill-angle-degrees" fill_angle_degrees: bool = false;
    "fill-angle-minutes" fill_angle_minutes: bool = false;
    "fill-angle-seconds" fill_angle_seconds: bool = false;
    "number-angle-product" number_angle_product: String = "".into();

    // Quantities
    "extract-mass-in-kilograms" extract_mass_in_kilograms: bool = true;
    "prefix-mode" prefix_mode: PrefixMode = PrefixMode::Input;
    "quantity-product" quantity_product: String = r"\,".into();
    "separate-uncertainty-units" separate_uncertainty_units: SeparateUncertaintyUnits =
        SeparateUncertaintyUnits::Bracket;

    // Complex numbers
    "complex-angle-unit" complex_angle_unit: ComplexAngleUnit = ComplexAngleUnit::Degrees;
    "complex-mode" complex_mode: ComplexMode = ComplexMode::Input;
    "complex-root-position" complex_root_position: RootPosition = RootPosition::AfterNumber;
    "complex-symbol-angle" complex_symbol_angle: String = r"\angle".into();
    "complex-symbol-degree" complex_symbol_degree: String = r"\degree".into();
    "input-complex-root" input_complex_root: String = "ij".into();
    "output-complex-root" output_complex_root: String = r"\mathrm{i}".into();
    "print-complex-unity" print_complex_unity: bool = false;

    // Colors
    "color" color: String = "".into();
    "number-color" number_color: String = "".into();
    "unit-color" unit_color: String = "".into();

    // Lists, ranges and products
    "list-close-bracket" list_close_bracket: String = ")".into();
    "list-exponents" list_exponents: ExponentsMode = ExponentsMode::Individual;
    "list-final-separator" list_final_separator: String = ", and ".into();
    "list-open-bracket" list_open_bracket: String = "(".into();
    "list-pair-separator" list_pair_separator: String = " and ".into();
    "list-separator" list_separator: String = ", ".into();
    "list-units" list_units: UnitsMode = UnitsMode::Repeat;
    "product-close-bracket" product_close_bracket: String = ")".into();
    "product-exponents" product_exponents: ExponentsMode = ExponentsMode::Individual;
    "product-mode" product_mode: ProductMode = ProductMode::Symbol;
    "product-open-bracket" product_open_bracket: String = "(".into();
    "product-phrase" product_phrase: String = " by ".into();
    "product-symbol" product_symbol: String = r"\times".into();
    "product-units" product_units: UnitsMode = UnitsMode::Repeat;
    "range-close-bracket" range_close_bracket: String = ")".into();
    "range-exponents" range_exponents: ExponentsMode = ExponentsMode::Individual;
    "range-open-bracket" range_open_bracket: String = "(".into();
    "range-phrase" range_phrase: String = " to ".into();
    "range-units" range_units: UnitsMode = UnitsMode::Repeat;
);

impl Options {
    /// Applies a list of overrides.
    ///
    /// Either every entry is applied or, on error, none are.
    pub fn apply(&mut self, entries: &[KeyVal]) -> Result<(), Error> {
        *self = self.with(entries)?;
        Ok(())
    }

    /// Returns a copy of these options with the overrides applied.
    pub fn with(&self, entries: &[KeyVal]) -> Result<Options, Error> {
        let mut options = self.clone();
        for entry in entries {
            options.set(entry)?;
        }
        Ok(options)
    }

    fn set(&mut self, entry: &KeyVal) -> Result<(), Error> {
        if !Options::KEYS.contains(&entry.key.as_str()) {
            return Err(Error::UnknownOption {
                key: entry.key.clone(),
                span: entry.span.clone(),
                suggestion: spellcheck::find_close_word(
                    Options::KEYS.iter().copied(),
                    &entry.key,
                )
                .map(str::to_string),
            });
        }
        self.set_value(&entry.key, &entry.value)
            .map_err(|expected| Error::InvalidOptionValue {
                key: entry.key.clone(),
                expected,
                value: entry.value.to_string(),
                span: entry.span.clone(),
            })
    }

    /// Parses an option list and checks every entry against the option types.
    ///
    /// The returned entries can later be applied to any options without error.
    pub fn parse_overrides(source: &str) -> Result<Vec<KeyVal>, Error> {
        let entries = keyval::parse(source)?;
        Options::default().with(&entries)?;
        Ok(entries)
    }

    /// The color for numbers, if any.
    pub fn effective_number_color(&self) -> Option<&str> {
        [&self.number_color, &self.color]
            .into_iter()
            .find(|c| !c.is_empty())
            .map(String::as_str)
    }

    /// The color for units, if any.
    pub fn effective_unit_color(&self) -> Option<&str> {
        [&self.unit_color, &self.color]
            .into_iter()
            .find(|c| !c.is_empty())
            .map(String::as_str)
    }
}
