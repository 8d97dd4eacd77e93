//! Lists, ranges and products of numbers and quantities.

use crate::error::Error;
use crate::markup::Node;
use crate::number::NumberPiece;
use crate::options::{ExponentMode, ExponentsMode, Options, ProductMode, UnitsMode};
use crate::postprocess;
use crate::quantity;
use crate::render;
use crate::token::{Lexer, Token};
use crate::unit::UnitPiece;
use crate::unitrender;

/// The ways numbers can be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `1, 2, and 3`
    List,
    /// `1 to 2`
    Range,
    /// `1 x 2 x 3`
    Product,
}

impl Combinator {
    fn exponents(&self, options: &Options) -> ExponentsMode {
        match self {
            Combinator::List => options.list_exponents,
            Combinator::Range => options.range_exponents,
            Combinator::Product => options.product_exponents,
        }
    }

    fn units(&self, options: &Options) -> UnitsMode {
        match self {
            Combinator::List => options.list_units,
            Combinator::Range => options.range_units,
            Combinator::Product => options.product_units,
        }
    }

    fn brackets<'a>(&self, options: &'a Options) -> (&'a str, &'a str) {
        let (open, close) = match self {
            Combinator::List => (&options.list_open_bracket, &options.list_close_bracket),
            Combinator::Range => (&options.range_open_bracket, &options.range_close_bracket),
            Combinator::Product => (&options.product_open_bracket, &options.product_close_bracket),
        };
        (open.as_str(), close.as_str())
    }

    /// The separator placed before the element at `index`, for `index >= 1`.
    fn separator(&self, index: usize, count: usize, options: &Options) -> Node {
        match self {
            Combinator::List if count == 2 => Node::Text(options.list_pair_separator.clone()),
            Combinator::List if index == count - 1 => {
                Node::Text(options.list_final_separator.clone())
            }
            Combinator::List => Node::Text(options.list_separator.clone()),
            Combinator::Range => Node::Text(options.range_phrase.clone()),
            Combinator::Product => match options.product_mode {
                ProductMode::Symbol => Node::Operator(options.product_symbol.clone()),
                ProductMode::Phrase => Node::Text(options.product_phrase.clone()),
            },
        }
    }
}

/// Splits a list argument at every top-level `delimiter` character.
///
/// Each element is returned with its byte offset in `text`.
pub fn split_elements(text: &str, delimiter: char) -> Vec<(&str, usize)> {
    let mut elements = vec![];
    let mut lexer = Lexer::new(text);
    let mut start = 0;
    let mut depth = 0_usize;
    while let Some((token, span)) = lexer.next_token() {
        match token {
            Token::BeginGroup => depth += 1,
            Token::EndGroup => depth = depth.saturating_sub(1),
            Token::Char(c) if c == delimiter && depth == 0 => {
                elements.push((&text[start..span.start], start));
                start = span.end;
            }
            _ => {}
        }
    }
    elements.push((&text[start..], start));
    elements
}

/// The unit shared by every element of a list of quantities.
#[derive(Debug, Clone, Copy)]
pub struct SharedUnit<'a> {
    pub pieces: &'a [UnitPiece],
    pub literal: bool,
}

/// Post-processes the elements.
///
/// When the elements share an exponent, every element after the first is moved
///     to the exponent of the first.
fn process(numbers: &mut [NumberPiece], exponents: ExponentsMode, options: &Options) -> Result<(), Error> {
    let Some((first, rest)) = numbers.split_first_mut() else {
        return Ok(());
    };
    postprocess::process(first, options)?;
    if exponents == ExponentsMode::Individual {
        for number in rest {
            postprocess::process(number, options)?;
        }
        return Ok(());
    }
    let mut fixed = options.clone();
    fixed.exponent_mode = ExponentMode::Fixed;
    fixed.fixed_exponent = first.exponent_value();
    for number in rest {
        postprocess::process(number, &fixed)?;
    }
    Ok(())
}

/// Post-processes and renders a list, range or product.
pub fn render_combination(
    combinator: Combinator,
    mut numbers: Vec<NumberPiece>,
    unit: Option<SharedUnit>,
    options: &Options,
) -> Result<Node, Error> {
    let mut exponents = combinator.exponents(options);
    let units_mode = combinator.units(options);
    if unit.is_some() && units_mode == UnitsMode::Repeat {
        exponents = ExponentsMode::Individual;
    }
    process(&mut numbers, exponents, options)?;
    if numbers.len() == 1 {
        return Ok(match unit {
            None => render::render_number(&numbers[0], options),
            Some(unit) => {
                quantity::render_quantity(&numbers[0], unit.pieces, unit.literal, options)
            }
        });
    }

    let mut trailing = Node::empty();
    if exponents != ExponentsMode::Individual {
        trailing = render::render_exponent(&numbers[0], options, true);
        for number in &mut numbers {
            number.clear_exponent();
        }
    }

    let count = numbers.len();
    let mut elements = vec![];
    for (i, number) in numbers.iter().enumerate() {
        if i > 0 {
            elements.push(combinator.separator(i, count, options));
        }
        elements.push(match unit {
            Some(unit) if units_mode == UnitsMode::Repeat => {
                quantity::render_quantity(number, unit.pieces, unit.literal, options)
            }
            _ => render::render_number(number, options),
        });
    }

    let shared_unit = match unit {
        Some(unit) if units_mode != UnitsMode::Repeat => {
            let mut pieces = unit.pieces.to_vec();
            let power = matches!(units_mode, UnitsMode::Power | UnitsMode::BracketPower);
            if power && combinator == Combinator::Product {
                for piece in &mut pieces {
                    piece.power *= count as f64;
                }
            }
            unitrender::render_unit(&pieces, unit.literal, options)
        }
        _ => Node::empty(),
    };
    let bracket_units = !shared_unit.is_empty()
        && matches!(units_mode, UnitsMode::Bracket | UnitsMode::BracketPower);
    let bracket_exponent = exponents == ExponentsMode::CombineBracket && !trailing.is_empty();

    let (open, close) = combinator.brackets(options);
    let mut row = vec![];
    if bracket_units || bracket_exponent {
        row.push(Node::tex(open));
    }
    row.extend(elements);
    if bracket_exponent {
        row.push(Node::tex(close));
        row.push(trailing);
    } else {
        row.push(trailing);
        if bracket_units {
            row.push(Node::tex(close));
        }
    }
    Ok(quantity::attach_unit(Node::row(row), shared_unit, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyval;
    use crate::number::parse_number;
    use crate::unit::{parse_unit, UnitTable};

    fn run(combinator: Combinator, numbers: &[&str], unit: Option<&str>, options: &str) -> String {
        let options = Options::default()
            .with(&keyval::parse(options).unwrap())
            .unwrap();
        let numbers: Vec<NumberPiece> = numbers
            .iter()
            .map(|n| parse_number(n, &options).unwrap())
            .collect();
        let parsed = unit.map(|u| parse_unit(u, &options, &UnitTable::default()).unwrap());
        let shared = parsed.as_ref().map(|p| SharedUnit {
            pieces: &p.pieces,
            literal: p.literal,
        });
        render_combination(combinator, numbers, shared, &options)
            .unwrap()
            .to_tex()
    }

    macro_rules! combination_tests {
        ( $( ($name: ident, $combinator: ident, $numbers: expr, $unit: expr, $options: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(run(Combinator::$combinator, &$numbers, $unit, $options), $want);
            }
            )+
        };
    }

    combination_tests!(
        (single_element, List, ["1.5"], None, "", "1.5"),
        (pair, List, ["1", "2"], None, "", r"1\text{ and }2"),
        (three, List, ["1", "2", "3"], None, "", r"1\text{, }2\text{, and }3"),
        (four, List, ["1", "2", "3", "4"], None, "", r"1\text{, }2\text{, }3\text{, and }4"),
        (custom_separators, List, ["1", "2", "3"], None, "list-separator={; }, list-final-separator={; }", r"1\text{; }2\text{; }3"),
        (individual_exponents, List, ["1.2e3", "3.4e3"], None, "", r"1.2\times10^{3}\text{ and }3.4\times10^{3}"),
        (combined_exponents, List, ["1.2e3", "3.4e3"], None, "list-exponents=combine", r"1.2\text{ and }3.4\times10^{3}"),
        (combined_rescaled, List, ["1e3", "2e4"], None, "list-exponents=combine", r"1\text{ and }20\times10^{3}"),
        (combined_bracket, List, ["1.2e3", "3.4e3"], None, "list-exponents=combine-bracket", r"(1.2\text{ and }3.4)\times10^{3}"),
        (combined_bracket_no_exponent, List, ["1", "2"], None, "list-exponents=combine-bracket", r"1\text{ and }2"),
        (range, Range, ["1", "2"], None, "", r"1\text{ to }2"),
        (range_combined, Range, ["1e3", "2e3"], None, "range-exponents=combine", r"1\text{ to }2\times10^{3}"),
        (product, Product, ["1", "2", "3"], None, "", r"1\times2\times3"),
        (product_phrase, Product, ["1", "2"], None, "product-mode=phrase", r"1\text{ by }2"),
        (units_repeat, List, ["1", "2"], Some(r"\metre"), "", r"1\,\mathrm{m}\text{ and }2\,\mathrm{m}"),
        (units_repeat_forces_individual, List, ["1e3", "2e3"], Some(r"\metre"), "list-exponents=combine", r"1\times10^{3}\,\mathrm{m}\text{ and }2\times10^{3}\,\mathrm{m}"),
        (units_single, List, ["1", "2"], Some(r"\metre"), "list-units=single", r"1\text{ and }2\,\mathrm{m}"),
        (units_bracket, List, ["1", "2"], Some(r"\metre"), "list-units=bracket", r"(1\text{ and }2)\,\mathrm{m}"),
        (units_bracket_combined, List, ["1e3", "2e3"], Some(r"\metre"), "list-units=bracket, list-exponents=combine", r"(1\text{ and }2\times10^{3})\,\mathrm{m}"),
        (units_bracket_combine_bracket, List, ["1e3", "2e3"], Some(r"\metre"), "list-units=bracket, list-exponents=combine-bracket", r"(1\text{ and }2)\times10^{3}\,\mathrm{m}"),
        (range_units_bracket, Range, ["1", "2"], Some(r"\metre"), "range-units=bracket", r"(1\text{ to }2)\,\mathrm{m}"),
        (product_units_power, Product, ["2", "3"], Some(r"\metre"), "product-units=power", r"2\times3\,\mathrm{m}^{2}"),
        (product_units_bracket_power, Product, ["2", "3"], Some(r"\metre"), "product-units=bracket-power", r"(2\times3)\,\mathrm{m}^{2}"),
        (list_units_power_is_single, List, ["2", "3"], Some(r"\metre"), "list-units=power", r"2\text{ and }3\,\mathrm{m}"),
        (single_quantity, List, ["2"], Some(r"\metre"), "list-units=bracket", r"2\,\mathrm{m}"),
    );

    #[test]
    fn split_at_top_level() {
        assert_eq!(
            split_elements("1;2 ; 3", ';'),
            vec![("1", 0), ("2 ", 2), (" 3", 5)]
        );
        assert_eq!(split_elements("{1;2};3", ';'), vec![("{1;2}", 0), ("3", 6)]);
    }

    #[test]
    fn split_ignores_control_sequences() {
        assert_eq!(
            split_elements(r"\approx 1 x 2", 'x'),
            vec![(r"\approx 1 ", 0), (" 2", 11)]
        );
    }
}
