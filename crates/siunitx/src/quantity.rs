//! Quantities: a number followed by a unit.
//!
//! Before the number is post-processed, `prefix-mode` may move powers of ten
//!     between the number and the prefix of the unit.

use crate::markup::Node;
use crate::number::{NumberPiece, Uncertainty};
use crate::options::{Options, PrefixMode, SeparateUncertaintyUnits, UncertaintyMode};
use crate::postprocess;
use crate::render;
use crate::unit::{self, UnitPiece};
use crate::unitrender;

/// Applies `prefix-mode` to the numbers of a quantity and its unit.
///
/// All of the numbers share the unit, so they are all rescaled by the same
///     power of ten. Complex quantities pass both of their parts.
pub fn apply_prefix_mode(numbers: &mut [NumberPiece], units: &mut [UnitPiece], options: &Options) {
    match options.prefix_mode {
        PrefixMode::Input => {}
        PrefixMode::CombineExponent => combine_exponent(numbers, units),
        PrefixMode::ExtractExponent => {
            extract_exponent(numbers, units, options.extract_mass_in_kilograms)
        }
    }
}

fn has_digits(piece: &NumberPiece) -> bool {
    !piece.whole.is_empty() || !piece.fractional.is_empty()
}

fn integer_power(piece: &UnitPiece) -> Option<i64> {
    let power = piece.signed_power();
    if power == 0.0 || power.fract() != 0.0 {
        None
    } else {
        Some(power as i64)
    }
}

/// The power of ten of a prefix; the empty prefix is zero and binary prefixes have none.
fn decimal_prefix_power(prefix: &str) -> Option<i64> {
    if prefix.is_empty() {
        Some(0)
    } else {
        unit::prefix_power(prefix)
    }
}

/// Moves the exponent of the number into the prefix of the first unit.
///
/// The prefix chosen is the one with the smallest power of ten that is at
///     least the scientific exponent of the number.
fn combine_exponent(numbers: &mut [NumberPiece], units: &mut [UnitPiece]) {
    let Some(first) = units.first_mut() else {
        return;
    };
    let Some(power) = integer_power(first) else {
        return;
    };
    let Some(current) = decimal_prefix_power(&first.prefix) else {
        return;
    };
    let Some(exponent) = numbers
        .iter()
        .filter(|n| has_digits(n))
        .find_map(postprocess::scientific_exponent)
    else {
        return;
    };
    let exponent = exponent + current * power;
    let Some((symbol, total)) = (-30..=30)
        .filter_map(|p| unit::prefix_for_power(p).map(|symbol| (symbol, p * power)))
        .filter(|(_, total)| *total >= exponent)
        .min_by_key(|(_, total)| *total)
    else {
        return;
    };
    first.prefix = symbol.to_string();
    for number in numbers.iter_mut().filter(|n| has_digits(n)) {
        let whole_only = number.fractional.is_empty();
        let aligned = number.uncertainty.iter().any(Uncertainty::is_aligned);
        postprocess::move_to_exponent(number, total - current * power);
        number.clear_exponent();
        // Zeros moved out of the whole part were only placeholders.
        if whole_only && !aligned {
            let kept = number.fractional.trim_end_matches('0').len();
            number.fractional.truncate(kept);
            if number.fractional.is_empty() {
                number.decimal.clear();
            }
        }
    }
}

/// Moves every decimal prefix of the unit into the exponent of the number.
///
/// With `mass_in_kilograms` grams are rescaled to kilograms instead of losing
///     their prefix.
fn extract_exponent(numbers: &mut [NumberPiece], units: &mut [UnitPiece], mass_in_kilograms: bool) {
    let mut shift = 0_i64;
    for piece in units.iter_mut() {
        let Some(power) = integer_power(piece) else {
            continue;
        };
        let Some(prefix) = decimal_prefix_power(&piece.prefix) else {
            continue;
        };
        let mass = mass_in_kilograms && piece.symbol == "g";
        let (base, base_symbol) = if mass { (3, "k") } else { (0, "") };
        if prefix == base {
            continue;
        }
        shift += (prefix - base) * power;
        piece.prefix = base_symbol.to_string();
    }
    if shift == 0 {
        return;
    }
    for number in numbers.iter_mut().filter(|n| has_digits(n)) {
        let exponent = number.exponent_value() + shift;
        number.set_exponent_value(exponent);
    }
}

/// Places `quantity-product` between a rendered number and unit.
pub(crate) fn attach_unit(number: Node, unit: Node, options: &Options) -> Node {
    if unit.is_empty() {
        return number;
    }
    Node::row([number, Node::tex(options.quantity_product.clone()), unit])
}

/// Renders a post-processed number followed by its unit.
pub fn render_quantity(
    piece: &NumberPiece,
    units: &[UnitPiece],
    literal: bool,
    options: &Options,
) -> Node {
    let unit = unitrender::render_unit(units, literal, options);
    let separate =
        !piece.uncertainty.is_empty() && options.uncertainty_mode == UncertaintyMode::Separate;
    if !separate || unit.is_empty() {
        return attach_unit(render::render_number(piece, options), unit, options);
    }
    match options.separate_uncertainty_units {
        SeparateUncertaintyUnits::Single => {
            attach_unit(render::render_number(piece, options), unit, options)
        }
        SeparateUncertaintyUnits::Bracket => attach_unit(
            Node::row([
                Node::tex(options.output_open_uncertainty.clone()),
                render::render_number(piece, options),
                Node::tex(options.output_close_uncertainty.clone()),
            ]),
            unit,
            options,
        ),
        SeparateUncertaintyUnits::Repeat => {
            let mut piece = piece.clone();
            piece.uncertainty_to_plus_minus();
            let uncertainties = std::mem::take(&mut piece.uncertainty);
            let mut nodes = vec![attach_unit(
                render::render_number(&piece, options),
                unit.clone(),
                options,
            )];
            for u in uncertainties {
                let mut value = u.value;
                value.exponent_marker = piece.exponent_marker.clone();
                value.exponent_sign = piece.exponent_sign.clone();
                value.exponent = piece.exponent.clone();
                nodes.push(Node::Operator(r"\pm".into()));
                nodes.push(attach_unit(
                    render::render_number(&value, options),
                    unit.clone(),
                    options,
                ));
            }
            Node::row(nodes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyval;
    use crate::number::parse_number;
    use crate::unit::{parse_unit, UnitTable};

    fn qty(number: &str, unit: &str, options: &str) -> String {
        let options = Options::default()
            .with(&keyval::parse(options).unwrap())
            .unwrap();
        let mut piece = parse_number(number, &options).unwrap();
        let mut parsed = parse_unit(unit, &options, &UnitTable::default()).unwrap();
        apply_prefix_mode(std::slice::from_mut(&mut piece), &mut parsed.pieces, &options);
        postprocess::process(&mut piece, &options).unwrap();
        render_quantity(&piece, &parsed.pieces, parsed.literal, &options).to_tex()
    }

    macro_rules! quantity_tests {
        ( $( ($name: ident, $number: expr, $unit: expr, $options: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(qty($number, $unit, $options), $want);
            }
            )+
        };
    }

    quantity_tests!(
        (plain, "1.5", r"\metre", "", r"1.5\,\mathrm{m}"),
        (empty_unit, "1.5", "", "", "1.5"),
        (quantity_product, "1.5", r"\metre", "quantity-product=~", r"1.5~\mathrm{m}"),
        (extract_kilo, "5", r"\kilo\metre", "prefix-mode=extract-exponent", r"5\times10^{3}\,\mathrm{m}"),
        (extract_adds_to_exponent, "5e2", r"\kilo\metre", "prefix-mode=extract-exponent", r"5\times10^{5}\,\mathrm{m}"),
        (extract_denominator, "5", r"\metre\per\milli\second", "prefix-mode=extract-exponent", r"5\times10^{3}\,\mathrm{m}\,\mathrm{s}^{-1}"),
        (extract_squared, "5", r"\centi\metre\squared", "prefix-mode=extract-exponent", r"5\times10^{-4}\,\mathrm{m}^{2}"),
        (extract_gram_to_kilogram, "5", r"\gram", "prefix-mode=extract-exponent", r"5\times10^{-3}\,\mathrm{kg}"),
        (extract_kilogram_unchanged, "5", r"\kilo\gram", "prefix-mode=extract-exponent", r"5\,\mathrm{kg}"),
        (extract_gram_absolute, "5", r"\milli\gram", "prefix-mode=extract-exponent, extract-mass-in-kilograms=false", r"5\times10^{-3}\,\mathrm{g}"),
        (combine_exact, "5e3", r"\metre", "prefix-mode=combine-exponent", r"5\,\mathrm{km}"),
        (combine_whole_zeros, "5000", r"\metre", "prefix-mode=combine-exponent", r"5\,\mathrm{km}"),
        (combine_partial_zeros, "1200", r"\metre", "prefix-mode=combine-exponent", r"1.2\,\mathrm{km}"),
        (combine_mantissa_zeros, "50e2", r"\metre", "prefix-mode=combine-exponent", r"5\,\mathrm{km}"),
        (combine_keeps_input_zeros, "5000.0", r"\metre", "prefix-mode=combine-exponent", r"5.0000\,\mathrm{km}"),
        (combine_keeps_aligned_uncertainty, "5000(20)", r"\metre", "prefix-mode=combine-exponent", r"5.000(20)\,\mathrm{km}"),
        (combine_plain_number, "1234", r"\metre", "prefix-mode=combine-exponent", r"1.234\,\mathrm{km}"),
        (combine_small, "2e-3", r"\metre", "prefix-mode=combine-exponent", r"2\,\mathrm{mm}"),
        (combine_with_prefix, "3e3", r"\kilo\metre", "prefix-mode=combine-exponent", r"3\,\mathrm{Mm}"),
        (combine_without_prefix_symbol, "4e1", r"\metre", "prefix-mode=combine-exponent", r"4\,\mathrm{dam}"),
        (separate_single, "1.2(3)", r"\metre", "uncertainty-mode=separate, separate-uncertainty-units=single", r"1.2\pm0.3\,\mathrm{m}"),
        (separate_bracket, "1.2(3)", r"\metre", "uncertainty-mode=separate, separate-uncertainty-units=bracket", r"(1.2\pm0.3)\,\mathrm{m}"),
        (separate_repeat, "1.2(3)", r"\metre", "uncertainty-mode=separate, separate-uncertainty-units=repeat", r"1.2\,\mathrm{m}\pm0.3\,\mathrm{m}"),
        (compact_ignores_separate_units, "1.2(3)", r"\metre", "separate-uncertainty-units=repeat", r"1.2(3)\,\mathrm{m}"),
    );
}
