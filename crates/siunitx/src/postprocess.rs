//! The post-processing pipeline.
//!
//! A parsed number goes through a fixed sequence of stages before it is
//!     rendered; each stage is a no-op unless its options ask for something.
//! The stages are exposed as [Stage] so that tools can show the number after
//!     each one.

use crate::decimal;
use crate::error::Error;
use crate::number::{parse_number, NumberPiece};
use crate::options::{ExponentMode, Options, RoundMode};

/// A post-processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pads the fractional part to the length of the first uncertainty's.
    PadToUncertainty,
    /// Applies `drop-uncertainty` and `drop-exponent`.
    Drop,
    Round,
    DropZeroDecimal,
    /// Applies `minimum-integer-digits` and `minimum-decimal-digits`.
    MinimumDigits,
    ExponentMode,
    /// Removes an explicit `+` from the exponent.
    TidyExponent,
}

impl Stage {
    /// All stages in the order they run.
    pub const ALL: [Stage; 7] = [
        Stage::PadToUncertainty,
        Stage::Drop,
        Stage::Round,
        Stage::DropZeroDecimal,
        Stage::MinimumDigits,
        Stage::ExponentMode,
        Stage::TidyExponent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::PadToUncertainty => "pad-to-uncertainty",
            Stage::Drop => "drop",
            Stage::Round => "round",
            Stage::DropZeroDecimal => "drop-zero-decimal",
            Stage::MinimumDigits => "minimum-digits",
            Stage::ExponentMode => "exponent-mode",
            Stage::TidyExponent => "tidy-exponent",
        }
    }

    pub fn apply(&self, piece: &mut NumberPiece, options: &Options) -> Result<(), Error> {
        match self {
            Stage::PadToUncertainty => pad_to_uncertainty(piece),
            Stage::Drop => {
                if options.drop_uncertainty {
                    piece.uncertainty.clear();
                }
                if options.drop_exponent {
                    piece.clear_exponent();
                }
            }
            Stage::Round => round(piece, options)?,
            Stage::DropZeroDecimal => {
                if options.drop_zero_decimal && decimal::is_zero(&piece.fractional) {
                    piece.fractional.clear();
                    piece.decimal.clear();
                }
            }
            Stage::MinimumDigits => {
                let missing = options.minimum_integer_digits.saturating_sub(piece.whole.len());
                piece.whole.insert_str(0, &"0".repeat(missing));
                let missing = options
                    .minimum_decimal_digits
                    .saturating_sub(piece.fractional.len());
                piece.fractional.push_str(&"0".repeat(missing));
                fix_decimal_marker(piece);
            }
            Stage::ExponentMode => exponent_mode(piece, options)?,
            Stage::TidyExponent => {
                if piece.exponent_sign == "+" {
                    piece.exponent_sign.clear();
                }
            }
        }
        Ok(())
    }
}

/// Runs every stage on the number.
pub fn process(piece: &mut NumberPiece, options: &Options) -> Result<(), Error> {
    for stage in Stage::ALL {
        stage.apply(piece, options)?;
    }
    Ok(())
}

/// Adds a decimal marker if there are fractional digits, and removes it if not.
fn fix_decimal_marker(piece: &mut NumberPiece) {
    if piece.fractional.is_empty() {
        piece.decimal.clear();
    } else if piece.decimal.is_empty() {
        piece.decimal = ".".into();
    }
}

fn pad_to_uncertainty(piece: &mut NumberPiece) {
    let Some(first) = piece.uncertainty.first() else {
        return;
    };
    let wanted = first.value.fractional.len();
    if wanted > piece.fractional.len() {
        let missing = wanted - piece.fractional.len();
        piece.fractional.push_str(&"0".repeat(missing));
        fix_decimal_marker(piece);
    }
}

fn round(piece: &mut NumberPiece, options: &Options) -> Result<(), Error> {
    let half = options.round_half;
    let pad = options.round_pad;
    let precision = options.round_precision;
    let (whole, fractional) = match options.round_mode {
        RoundMode::None => return Ok(()),
        RoundMode::Uncertainty => {
            round_to_uncertainty(piece, options);
            return Ok(());
        }
        // The uncertainty already says how precise the number is.
        _ if !piece.uncertainty.is_empty() => return Ok(()),
        RoundMode::Places => {
            decimal::round_places(&piece.whole, &piece.fractional, precision, half, pad)
        }
        RoundMode::Figures => {
            decimal::round_figures(&piece.whole, &piece.fractional, precision, half, pad)
        }
    };
    piece.whole = whole;
    piece.fractional = fractional;
    fix_decimal_marker(piece);

    if !piece.is_zero() {
        return Ok(());
    }
    let minimum = round_minimum(options)?;
    if !minimum.is_zero() {
        // The number is replaced outright, sign included.
        *piece = NumberPiece {
            prefix: r"\lt".into(),
            ..minimum
        };
    } else if options.round_zero_positive {
        piece.sign.clear();
    }
    Ok(())
}

/// Parses `round-minimum` as a number.
fn round_minimum(options: &Options) -> Result<NumberPiece, Error> {
    parse_number(&options.round_minimum, options).map_err(|_| Error::InvalidOptionValue {
        key: "round-minimum".into(),
        expected: "a number".into(),
        value: options.round_minimum.clone(),
        span: 0..0,
    })
}

/// A non-negative value as a digit string times a power of ten.
struct Scaled {
    digits: String,
    exponent: i64,
}

impl Scaled {
    /// Rounds to a number of significant figures.
    fn round_figures(self, figures: i64, options: &Options) -> Scaled {
        let digits = self.digits.trim_start_matches('0').to_string();
        let figures = std::cmp::max(figures, 1) as usize;
        if digits.len() <= figures {
            return Scaled {
                digits,
                exponent: self.exponent,
            };
        }
        let drop = digits.len() - figures;
        let (mut rounded, _) = decimal::round_off(&digits, "", drop, options.round_half);
        rounded.truncate(rounded.len() - drop);
        let mut exponent = self.exponent + drop as i64;
        if rounded.len() > figures {
            rounded.pop();
            exponent += 1;
        }
        Scaled {
            digits: rounded,
            exponent,
        }
    }

    /// Rounds away any digits below `10^last`.
    fn round_to(self, last: i64, options: &Options) -> Scaled {
        if self.exponent >= last {
            return self;
        }
        let drop = (last - self.exponent) as usize;
        let (mut rounded, _) = decimal::round_off(&self.digits, "", drop, options.round_half);
        rounded.truncate(rounded.len().saturating_sub(drop));
        Scaled {
            digits: rounded,
            exponent: last,
        }
    }

    /// Writes the value with its last digit at `10^last`.
    fn place(&self, last: i64) -> (String, String) {
        let mut all = self.aligned(last);
        let fractional_len = (-last).max(0) as usize;
        if all.len() <= fractional_len {
            all.insert_str(0, &"0".repeat(fractional_len + 1 - all.len()));
        }
        let fractional = all.split_off(all.len() - fractional_len);
        (decimal::trim_leading_zeros(&all), fractional)
    }

    /// The digits of the value counted in units of `10^last`.
    fn aligned(&self, last: i64) -> String {
        let zeros = (self.exponent - last).max(0) as usize;
        let aligned = format!["{}{}", self.digits, "0".repeat(zeros)];
        if aligned.is_empty() {
            "0".into()
        } else {
            decimal::trim_leading_zeros(&aligned)
        }
    }
}

/// Rounds every uncertainty to `round-precision` significant figures, and the
/// number to the precision of the least precise uncertainty.
fn round_to_uncertainty(piece: &mut NumberPiece, options: &Options) {
    let main_last = -(piece.fractional.len() as i64);
    let scaled: Vec<Scaled> = piece
        .uncertainty
        .iter()
        .map(|u| {
            let exponent = if u.is_aligned() {
                main_last
            } else {
                -(u.value.fractional.len() as i64)
            };
            Scaled {
                digits: format!["{}{}", u.value.whole, u.value.fractional],
                exponent,
            }
            .round_figures(options.round_precision, options)
        })
        .collect();
    let Some(target) = scaled
        .iter()
        .filter(|s| !s.digits.is_empty())
        .map(|s| s.exponent)
        .max()
    else {
        return;
    };

    let drop = target - main_last;
    if drop > 0 {
        let (whole, fractional) = decimal::round_off(
            &piece.whole,
            &piece.fractional,
            drop as usize,
            options.round_half,
        );
        piece.whole = whole;
        piece.fractional = fractional;
    } else {
        piece.fractional.push_str(&"0".repeat((-drop) as usize));
    }
    fix_decimal_marker(piece);

    let last = std::cmp::min(target, 0);
    for (u, s) in piece.uncertainty.iter_mut().zip(scaled) {
        if s.digits.is_empty() {
            continue;
        }
        let s = s.round_to(last, options);
        if u.is_aligned() {
            u.value.whole = s.aligned(last);
            u.value.fractional.clear();
        } else {
            let (whole, fractional) = s.place(last);
            u.value.whole = whole;
            u.value.fractional = fractional;
            fix_decimal_marker(&mut u.value);
        }
    }
}

/// Parses `exponent-thresholds`.
pub(crate) fn parse_thresholds(value: &str) -> Result<(i64, i64), Error> {
    let err = || Error::ExponentThresholds {
        value: value.to_string(),
    };
    let (min, max) = value.split_once(':').ok_or_else(err)?;
    let min: i64 = min.trim().parse().map_err(|_| err())?;
    let max: i64 = max.trim().parse().map_err(|_| err())?;
    Ok((min, max))
}

/// The exponent the number would have in scientific notation, or [None] for zero.
pub(crate) fn scientific_exponent(piece: &NumberPiece) -> Option<i64> {
    let lead = piece
        .whole
        .bytes()
        .chain(piece.fractional.bytes())
        .position(|b| b != b'0')?;
    Some(piece.exponent_value() + piece.whole.len() as i64 - lead as i64 - 1)
}

/// Rewrites the number, and its uncertainties, to have the given exponent.
pub(crate) fn move_to_exponent(piece: &mut NumberPiece, target: i64) {
    // The mantissa is multiplied by 10^shift.
    let shift = piece.exponent_value() - target;
    let old_fractional_len = piece.fractional.len() as i64;
    let (whole, fractional) = decimal::shift(&piece.whole, &piece.fractional, shift);
    piece.whole = whole;
    piece.fractional = fractional;
    let new_fractional_len = piece.fractional.len() as i64;
    for u in &mut piece.uncertainty {
        if u.is_aligned() {
            let zeros = (shift - old_fractional_len + new_fractional_len).max(0) as usize;
            u.value.whole.push_str(&"0".repeat(zeros));
        } else {
            let (whole, fractional) = decimal::shift(&u.value.whole, &u.value.fractional, shift);
            u.value.whole = whole;
            u.value.fractional = fractional;
            fix_decimal_marker(&mut u.value);
        }
    }
    fix_decimal_marker(piece);
    piece.set_exponent_value(target);
}

fn exponent_mode(piece: &mut NumberPiece, options: &Options) -> Result<(), Error> {
    match options.exponent_mode {
        ExponentMode::Input => {}
        ExponentMode::Fixed => move_to_exponent(piece, options.fixed_exponent),
        ExponentMode::Scientific | ExponentMode::Engineering => {
            match scientific_exponent(piece) {
                None => {
                    piece.whole = "0".into();
                    piece.set_exponent_value(0);
                }
                Some(exponent) => {
                    let target = if options.exponent_mode == ExponentMode::Engineering {
                        exponent.div_euclid(3) * 3
                    } else {
                        exponent
                    };
                    move_to_exponent(piece, target);
                }
            }
        }
        ExponentMode::Threshold => {
            let (min, max) = parse_thresholds(&options.exponent_thresholds)?;
            match scientific_exponent(piece) {
                Some(exponent) if exponent < min || exponent > max => {
                    move_to_exponent(piece, exponent);
                }
                _ => {
                    move_to_exponent(piece, 0);
                    piece.clear_exponent();
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyval;
    use crate::number::UncertaintyKind;

    fn show(piece: &NumberPiece) -> String {
        let mut s = format![
            "{}{}{}{}{}",
            piece.prefix, piece.sign, piece.whole, piece.decimal, piece.fractional
        ];
        for u in &piece.uncertainty {
            let value = format!["{}{}{}", u.value.whole, u.value.decimal, u.value.fractional];
            match u.kind {
                UncertaintyKind::Bracket => s.push_str(&format!["({value})"]),
                UncertaintyKind::PlusMinus => s.push_str(&format![" \\pm {value}"]),
            }
        }
        if !piece.exponent_marker.is_empty() {
            s.push_str(&format!["e{}{}", piece.exponent_sign, piece.exponent]);
        }
        s
    }

    fn run(input: &str, options: &str) -> Result<String, Error> {
        let options = Options::default().with(&keyval::parse(options).unwrap())?;
        let mut piece = parse_number(input, &options)?;
        process(&mut piece, &options)?;
        Ok(show(&piece))
    }

    macro_rules! process_tests {
        ( $( ($name: ident, $input: expr, $options: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(run($input, $options).unwrap(), $want);
            }
            )+
        };
    }

    process_tests!(
        (no_options, "1.234", "", "1.234"),
        (pad_to_uncertainty, r"1 \pm 0.05", "", r"1.00 \pm 0.05"),
        (drop_uncertainty, "1.2(3)", "drop-uncertainty", "1.2"),
        (drop_exponent, "1.2e3", "drop-exponent", "1.2"),
        (places_carry, "1.996", "round-mode=places", "2.00"),
        (places_half_even, "0.125", "round-mode=places, round-half=even", "0.12"),
        (places_half_up, "0.125", "round-mode=places", "0.13"),
        (places_to_whole, "12.5", "round-mode=places, round-precision=0", "13"),
        (figures_carry, "1.999", "round-mode=figures", "2.0"),
        (figures_pad, "1", "round-mode=figures, round-precision=3", "1.00"),
        (figures_no_pad, "1", "round-mode=figures, round-precision=3, round-pad=false", "1"),
        (figures_skip_with_uncertainty, "1.234(5)", "round-mode=figures", "1.234(5)"),
        (round_minimum, "0.001", "round-mode=places, round-minimum=0.01", r"\lt0.01"),
        (round_minimum_negative, "-0.001", "round-mode=places, round-minimum=0.01", r"\lt0.01"),
        (round_minimum_signed, "0.001", "round-mode=places, round-minimum=-0.01", r"\lt-0.01"),
        (round_minimum_exponent, "0.0001", "round-mode=places, round-minimum=1e-2", r"\lt1e-2"),
        (round_minimum_zero_is_off, "0.001", "round-mode=places, round-minimum=0.00", "0.00"),
        (round_zero_positive, "-0.001", "round-mode=places", "0.00"),
        (round_zero_negative, "-0.001", "round-mode=places, round-zero-positive=false", "-0.00"),
        (uncertainty_plus_minus, r"1.23456 \pm 0.0123", "round-mode=uncertainty, round-precision=1", r"1.23 \pm 0.01"),
        (uncertainty_bracket_whole, "1234(56)", "round-mode=uncertainty, round-precision=1", "1230(60)"),
        (uncertainty_bracket_clears_decimal, "1.2(34)", "round-mode=uncertainty, round-precision=1", "1(3)"),
        (uncertainty_already_rounded, "12.34(5)", "round-mode=uncertainty", "12.34(5)"),
        (uncertainty_least_precise_wins, r"1.2345 \pm 0.01 \pm 0.0012", "round-mode=uncertainty, round-precision=1", r"1.23 \pm 0.01 \pm 0.00"),
        (drop_zero_decimal, "1.00", "drop-zero-decimal", "1"),
        (drop_zero_decimal_keeps_non_zero, "1.05", "drop-zero-decimal", "1.05"),
        (minimum_digits, "1.5", "minimum-integer-digits=3, minimum-decimal-digits=3", "001.500"),
        (scientific, "1234.5", "exponent-mode=scientific", "1.2345e3"),
        (scientific_small, "0.00120", "exponent-mode=scientific", "1.20e-3"),
        (scientific_with_exponent, "123e4", "exponent-mode=scientific", "1.23e6"),
        (scientific_zero, "0", "exponent-mode=scientific", "0e0"),
        (scientific_plus_minus, r"1200 \pm 30", "exponent-mode=scientific", r"1.200 \pm 0.030e3"),
        (scientific_bracket, "1234(5)", "exponent-mode=scientific", "1.234(5)e3"),
        (fixed, "1.2", "exponent-mode=fixed, fixed-exponent=-3", "1200e-3"),
        (fixed_bracket, "1.2(3)", "exponent-mode=fixed, fixed-exponent=-3", "1200(300)e-3"),
        (fixed_from_exponent, "1.5e3", "exponent-mode=fixed, fixed-exponent=2", "15e2"),
        (engineering, "12345", "exponent-mode=engineering", "12.345e3"),
        (engineering_negative, "0.00012", "exponent-mode=engineering", "120e-6"),
        (threshold_inside, "1234", "exponent-mode=threshold", "1234"),
        (threshold_edge, "0.001", "exponent-mode=threshold", "0.001"),
        (threshold_above, "12345", "exponent-mode=threshold", "1.2345e4"),
        (threshold_below, "0.0001", "exponent-mode=threshold", "1e-4"),
        (threshold_removes_exponent, "1.5e2", "exponent-mode=threshold", "150"),
        (tidy_exponent_sign, "1e+3", "", "1e3"),
    );

    #[test]
    fn bad_thresholds() {
        assert_eq!(
            run("1", "exponent-mode=threshold, exponent-thresholds=3"),
            Err(Error::ExponentThresholds { value: "3".into() })
        );
        assert!(parse_thresholds("a:2").is_err());
        assert_eq!(parse_thresholds(" -2 : 4 "), Ok((-2, 4)));
    }

    #[test]
    fn bad_round_minimum() {
        assert!(matches!(
            run("0.001", "round-mode=places, round-minimum=abc"),
            Err(Error::InvalidOptionValue { ref key, .. }) if key == "round-minimum"
        ));
    }

    #[test]
    fn huge_precision_is_rejected() {
        assert!(matches!(
            run("1.5", "round-mode=places, round-precision=-9223372036854775808"),
            Err(Error::InvalidOptionValue { ref key, .. }) if key == "round-precision"
        ));
    }

    #[test]
    fn stages_run_in_order() {
        let options = Options::default()
            .with(&keyval::parse("round-mode=figures, round-precision=1, exponent-mode=scientific").unwrap())
            .unwrap();
        let mut piece = parse_number("0.0951", &options).unwrap();
        let mut seen = vec![];
        for stage in Stage::ALL {
            stage.apply(&mut piece, &options).unwrap();
            seen.push((stage.name(), show(&piece)));
        }
        assert_eq!(seen[2], ("round", "0.1".to_string()));
        assert_eq!(seen[5], ("exponent-mode", "1e-1".to_string()));
    }
}
