//! Rendering of numbers.

use crate::decimal;
use crate::markup::Node;
use crate::number::NumberPiece;
use crate::options::{GroupDigits, Options, UncertaintyMode};

/// Renders a post-processed number.
pub fn render_number(piece: &NumberPiece, options: &Options) -> Node {
    render_number_with_marker(piece, options, None)
}

/// Renders a number, optionally replacing its decimal marker.
pub(crate) fn render_number_with_marker(
    piece: &NumberPiece,
    options: &Options,
    marker: Option<Node>,
) -> Node {
    let negative = piece.sign == "-";
    let bracket = negative && options.bracket_negative_numbers;
    let show_mantissa = shows_mantissa(piece, options)
        && !(piece.whole.is_empty() && piece.fractional.is_empty());
    let mut nodes = vec![Node::Operator(piece.prefix.clone())];
    if bracket {
        nodes.push(Node::tex("("));
    } else {
        nodes.push(render_sign(piece, options));
    }
    if show_mantissa {
        nodes.push(render_mantissa(piece, options, marker));
    }
    nodes.push(render_uncertainty(piece, options));
    if bracket {
        nodes.push(Node::tex(")"));
    }
    nodes.push(render_exponent(piece, options, show_mantissa));
    let color = if negative && !options.negative_color.is_empty() {
        Some(options.negative_color.as_str())
    } else {
        options.effective_number_color()
    };
    Node::row(nodes).colored(color)
}

fn render_sign(piece: &NumberPiece, options: &Options) -> Node {
    if piece.sign.is_empty() && options.print_implicit_plus {
        Node::Operator("+".into())
    } else {
        Node::Operator(piece.sign.clone())
    }
}

/// Whether the exponent of the number is printed.
pub(crate) fn shows_exponent(piece: &NumberPiece, options: &Options) -> bool {
    !piece.exponent_marker.is_empty()
        && (piece.exponent_value() != 0 || options.print_zero_exponent)
}

fn shows_mantissa(piece: &NumberPiece, options: &Options) -> bool {
    options.print_unity_mantissa
        || !(piece.whole == "1" && piece.fractional.is_empty() && shows_exponent(piece, options))
}

/// Renders the digits of the number: whole part, decimal marker, fractional part.
pub(crate) fn render_mantissa(piece: &NumberPiece, options: &Options, marker: Option<Node>) -> Node {
    let mut nodes = vec![];
    let whole_is_zero = !piece.whole.is_empty() && decimal::is_zero(&piece.whole);
    if piece.whole.is_empty() {
        if options.print_zero_integer && !piece.fractional.is_empty() {
            nodes.push(Node::Number("0".into()));
        }
    } else if !(whole_is_zero && !piece.fractional.is_empty() && !options.print_zero_integer) {
        let grouped = matches!(options.group_digits, GroupDigits::All | GroupDigits::Integer);
        nodes.push(group(&piece.whole, grouped, true, options));
    }
    if !piece.decimal.is_empty() || !piece.fractional.is_empty() {
        nodes.push(marker.unwrap_or_else(|| Node::Number(options.output_decimal_marker.clone())));
    }
    if !piece.fractional.is_empty() {
        if options.zero_decimal_as_symbol && decimal::is_zero(&piece.fractional) {
            nodes.push(Node::tex(options.zero_symbol.clone()));
        } else {
            let grouped = matches!(options.group_digits, GroupDigits::All | GroupDigits::Decimal);
            nodes.push(group(&piece.fractional, grouped, false, options));
        }
    }
    Node::row(nodes)
}

/// Splits digits into groups separated by `group-separator`.
///
/// The whole part is grouped from the decimal marker leftwards, and the
///     fractional part from the decimal marker rightwards.
fn group(digits: &str, grouped: bool, whole: bool, options: &Options) -> Node {
    let size = |option: i64| -> usize {
        if option > 0 {
            option as usize
        } else {
            options.digit_group_size
        }
    };
    let first = size(options.digit_group_first_size);
    let other = size(options.digit_group_other_size);
    if !grouped || digits.len() < options.group_minimum_digits || first == 0 || other == 0 {
        return Node::Number(digits.into());
    }
    let mut chunks: Vec<&str> = vec![];
    let mut rest = digits;
    let mut size = first;
    while rest.len() > size {
        let (chunk, remaining) = if whole {
            let (remaining, chunk) = rest.split_at(rest.len() - size);
            (chunk, remaining)
        } else {
            rest.split_at(size)
        };
        chunks.push(chunk);
        rest = remaining;
        size = other;
    }
    chunks.push(rest);
    if whole {
        chunks.reverse();
    }
    let mut nodes = vec![];
    for (i, chunk) in chunks.into_iter().enumerate() {
        if i > 0 {
            nodes.push(Node::tex(options.group_separator.clone()));
        }
        nodes.push(Node::Number(chunk.into()));
    }
    Node::Row(nodes)
}

/// Renders the uncertainties of the number in the configured `uncertainty-mode`.
pub(crate) fn render_uncertainty(piece: &NumberPiece, options: &Options) -> Node {
    if piece.uncertainty.is_empty() {
        return Node::empty();
    }
    let mut piece = piece.clone();
    let mut nodes = vec![];
    match options.uncertainty_mode {
        UncertaintyMode::Separate => {
            piece.uncertainty_to_plus_minus();
            for u in &piece.uncertainty {
                nodes.push(Node::Operator(r"\pm".into()));
                nodes.push(render_mantissa(&u.value, options, None));
            }
        }
        UncertaintyMode::Full => {
            piece.uncertainty_to_plus_minus();
            for u in &piece.uncertainty {
                nodes.push(bracketed(render_mantissa(&u.value, options, None), options));
            }
        }
        UncertaintyMode::Compact | UncertaintyMode::CompactMarker => {
            piece.uncertainty_to_bracket();
            let fractional_len = piece.fractional.len();
            for u in &piece.uncertainty {
                let body = if !u.is_aligned() {
                    render_mantissa(&u.value, options, None)
                } else if options.uncertainty_mode == UncertaintyMode::CompactMarker
                    && fractional_len > 0
                    && u.value.whole.len() > fractional_len
                {
                    let (whole, fractional) =
                        u.value.whole.split_at(u.value.whole.len() - fractional_len);
                    Node::row([
                        Node::Number(whole.into()),
                        Node::Number(options.output_decimal_marker.clone()),
                        Node::Number(fractional.into()),
                    ])
                } else {
                    Node::Number(u.value.whole.clone())
                };
                nodes.push(bracketed(body, options));
            }
        }
    }
    Node::row(nodes)
}

fn bracketed(body: Node, options: &Options) -> Node {
    Node::row([
        Node::tex(options.uncertainty_separator.clone()),
        Node::tex(options.output_open_uncertainty.clone()),
        body,
        Node::tex(options.output_close_uncertainty.clone()),
    ])
}

/// Renders the exponent, like `\times 10^{3}`.
///
/// The exponent product is only printed if something precedes the exponent.
pub(crate) fn render_exponent(piece: &NumberPiece, options: &Options, with_product: bool) -> Node {
    if !shows_exponent(piece, options) {
        return Node::empty();
    }
    let exponent = Node::row([
        Node::Operator(piece.exponent_sign.clone()),
        Node::Number(piece.exponent.clone()),
    ]);
    if !options.output_exponent_marker.is_empty() {
        return Node::row([Node::tex(options.output_exponent_marker.clone()), exponent]);
    }
    let power = Node::superscript(Node::Number(options.exponent_base.clone()), exponent);
    if !with_product {
        return power;
    }
    let product = if options.tight_spacing {
        format!["{{{}}}", options.exponent_product]
    } else {
        options.exponent_product.clone()
    };
    Node::row([Node::tex(product), power])
}
