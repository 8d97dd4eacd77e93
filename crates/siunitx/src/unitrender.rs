//! Rendering of units.

use crate::markup::Node;
use crate::options::{Options, PerMode, QualifierMode};
use crate::unit::{Position, UnitPiece};

/// Renders a parsed unit.
pub fn render_unit(pieces: &[UnitPiece], literal: bool, options: &Options) -> Node {
    let node = if literal {
        render_literal(pieces, options)
    } else {
        match options.per_mode {
            PerMode::Power => render_powers(pieces, options),
            PerMode::PowerPositiveFirst => {
                let mut sorted = pieces.to_vec();
                sorted.sort_by(|a, b| b.signed_power().total_cmp(&a.signed_power()));
                render_powers(&sorted, options)
            }
            PerMode::Fraction => {
                let (numerator, denominator) = split(pieces);
                if denominator.is_empty() {
                    render_powers(pieces, options)
                } else {
                    Node::command(
                        options.fraction_command.clone(),
                        vec![
                            join_or_one(&numerator, options),
                            join(&denominator, options),
                        ],
                    )
                }
            }
            PerMode::Symbol | PerMode::RepeatedSymbol | PerMode::SingleSymbol => {
                render_symbol(pieces, options)
            }
        }
    };
    node.colored(options.effective_unit_color())
}

/// Every unit in order, with denominators shown as negative powers.
fn render_powers(pieces: &[UnitPiece], options: &Options) -> Node {
    let rendered: Vec<Node> = pieces
        .iter()
        .map(|p| render_piece(p, p.signed_power(), options))
        .collect();
    separated(rendered, options)
}

fn split(pieces: &[UnitPiece]) -> (Vec<&UnitPiece>, Vec<&UnitPiece>) {
    pieces
        .iter()
        .partition(|p| p.position == Position::Numerator)
}

fn join(pieces: &[&UnitPiece], options: &Options) -> Node {
    let rendered: Vec<Node> = pieces
        .iter()
        .map(|p| render_piece(p, p.power, options))
        .collect();
    separated(rendered, options)
}

fn join_or_one(pieces: &[&UnitPiece], options: &Options) -> Node {
    if pieces.is_empty() {
        Node::Number("1".into())
    } else {
        join(pieces, options)
    }
}

fn separated(nodes: Vec<Node>, options: &Options) -> Node {
    let mut row = vec![];
    for (i, node) in nodes.into_iter().enumerate() {
        if i > 0 {
            row.push(Node::tex(options.inter_unit_product.clone()));
        }
        row.push(node);
    }
    Node::row(row)
}

fn has_superscript(piece: &UnitPiece, options: &Options) -> bool {
    piece.power != 1.0 && !(options.power_half_as_sqrt && piece.power == 0.5)
}

/// The `symbol`, `repeated-symbol` and `single-symbol` modes.
fn render_symbol(pieces: &[UnitPiece], options: &Options) -> Node {
    let (numerator, denominator) = split(pieces);
    if denominator.is_empty()
        || (options.per_mode == PerMode::SingleSymbol && denominator.len() > 1)
    {
        return render_powers(pieces, options);
    }
    let mut row = vec![join_or_one(&numerator, options)];
    let per = |previous: Option<&&UnitPiece>| -> Node {
        let correction = match previous {
            Some(p) if has_superscript(p, options) => {
                Node::tex(options.per_symbol_script_correction.clone())
            }
            _ => Node::empty(),
        };
        Node::row([correction, Node::tex(options.per_symbol.clone())])
    };
    row.push(per(numerator.last()));
    if options.per_mode == PerMode::RepeatedSymbol {
        for (i, piece) in denominator.iter().enumerate() {
            if i > 0 {
                row.push(per(denominator.get(i - 1)));
            }
            row.push(render_piece(piece, piece.power, options));
        }
    } else if options.bracket_unit_denominator && denominator.len() > 1 {
        row.push(Node::tex("("));
        row.push(join(&denominator, options));
        row.push(Node::tex(")"));
    } else {
        row.push(join(&denominator, options));
    }
    Node::row(row)
}

/// Literal units are shown as written, with a `/` before the denominator.
fn render_literal(pieces: &[UnitPiece], options: &Options) -> Node {
    let (numerator, denominator) = split(pieces);
    if denominator.is_empty() {
        return join(&numerator, options);
    }
    Node::row([
        join_or_one(&numerator, options),
        Node::tex("/"),
        join(&denominator, options),
    ])
}

/// Renders one unit with the given power.
fn render_piece(piece: &UnitPiece, power: f64, options: &Options) -> Node {
    let font = |body: Node| Node::command(options.unit_font_command.clone(), vec![body]);
    let mut body = vec![
        Node::tex(piece.prefix.clone()),
        Node::tex(piece.symbol.clone()),
    ];
    let mut subscript = None;
    if !piece.qualifier.is_empty() {
        let qualifier = Node::tex(piece.qualifier.clone());
        match options.qualifier_mode {
            QualifierMode::Subscript => subscript = Some(font(qualifier)),
            QualifierMode::Bracket => {
                body.extend([Node::tex("("), qualifier, Node::tex(")")]);
            }
            QualifierMode::Combine => body.push(qualifier),
            QualifierMode::Phrase => {
                body.extend([Node::tex(options.qualifier_phrase.clone()), qualifier]);
            }
        }
    }
    let mut node = font(Node::row(body));
    if let Some(subscript) = subscript {
        node = Node::subscript(node, subscript);
    }
    if options.power_half_as_sqrt && power.abs() == 0.5 {
        node = Node::command(r"\sqrt", vec![node]);
        if power < 0.0 {
            node = Node::superscript(node, Node::Number("-1".into()));
        }
    } else if power != 1.0 {
        node = Node::superscript(node, Node::Number(format!["{power}"]));
    }
    if piece.cancel {
        node = Node::command(r"\cancel", vec![node]);
    }
    if piece.highlight.is_empty() {
        node
    } else {
        node.colored(Some(&piece.highlight))
    }
}
