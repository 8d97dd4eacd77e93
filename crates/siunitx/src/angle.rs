//! Angles, written as decimal degrees `12.5` or in arc form `12;30;0`.

use crate::decimal;
use crate::error::{Error, Literal};
use crate::list;
use crate::markup::Node;
use crate::number::{self, NumberPiece};
use crate::options::{AngleMode, Options};
use crate::postprocess;
use crate::render;

/// A parsed angle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle {
    pub degrees: NumberPiece,
    pub minutes: NumberPiece,
    pub seconds: NumberPiece,
    /// Whether the angle is in degree, minute and second form.
    pub arc: bool,
}

fn has_digits(piece: &NumberPiece) -> bool {
    !piece.whole.is_empty() || !piece.fractional.is_empty()
}

/// Parses an angle.
pub fn parse_angle(text: &str, options: &Options) -> Result<Angle, Error> {
    let parts = list::split_elements(text, ';');
    if let Some((_, offset)) = parts.get(3) {
        return Err(Error::ExtraSemicolon {
            span: offset - 1..*offset,
        });
    }
    let mut pieces = vec![];
    for (part, offset) in &parts {
        pieces.push(
            number::parse_literal(part, options, Literal::Angle)
                .map_err(|err| err.shifted(*offset))?,
        );
    }
    let mut pieces = pieces.into_iter();
    Ok(Angle {
        degrees: pieces.next().unwrap_or_default(),
        minutes: pieces.next().unwrap_or_default(),
        seconds: pieces.next().unwrap_or_default(),
        arc: parts.len() > 1,
    })
}

/// Converts the angle according to `angle-mode` and post-processes each part.
pub fn process(angle: &mut Angle, options: &Options) -> Result<(), Error> {
    match options.angle_mode {
        AngleMode::Input => {}
        AngleMode::Arc => to_arc(angle),
        AngleMode::Decimal => to_decimal(angle)?,
    }
    for piece in [&mut angle.degrees, &mut angle.minutes, &mut angle.seconds] {
        if has_digits(piece) {
            postprocess::process(piece, options)?;
        }
    }
    Ok(())
}

/// Splits the fractional degrees into minutes and seconds.
///
/// The conversion is exact; a fractional part remains only on the seconds.
fn to_arc(angle: &mut Angle) {
    if angle.arc {
        return;
    }
    angle.arc = true;
    let degrees = &mut angle.degrees;
    let fraction = std::mem::take(&mut degrees.fractional);
    degrees.decimal.clear();
    if degrees.whole.is_empty() {
        degrees.whole = "0".into();
    }
    if decimal::is_zero(&fraction) {
        return;
    }
    let (minutes, fraction) = decimal::multiply("0", &fraction, 60);
    angle.minutes.whole = minutes;
    if decimal::is_zero(&fraction) {
        return;
    }
    let (seconds, fraction) = decimal::multiply("0", &fraction, 60);
    angle.seconds.whole = seconds;
    angle.seconds.fractional = fraction.trim_end_matches('0').to_string();
    if !angle.seconds.fractional.is_empty() {
        angle.seconds.decimal = ".".into();
    }
}

/// Folds minutes and seconds into decimal degrees.
fn to_decimal(angle: &mut Angle) -> Result<(), Error> {
    if !angle.arc {
        return Ok(());
    }
    let parts = [&angle.degrees, &angle.minutes, &angle.seconds];
    let negative = parts.iter().any(|p| p.sign == "-");
    let value = angle.degrees.to_f64().abs()
        + angle.minutes.to_f64().abs() / 60.0
        + angle.seconds.to_f64().abs() / 3600.0;
    let mut degrees = NumberPiece::from_f64(value, Literal::Angle)?;
    if negative {
        degrees.sign = "-".into();
    }
    *angle = Angle {
        degrees,
        ..Default::default()
    };
    Ok(())
}

/// Fills empty parts with zero where the fill options ask for it.
fn fill(angle: &mut Angle, options: &Options) {
    if !angle.arc {
        if !has_digits(&angle.degrees) && options.fill_angle_degrees {
            angle.degrees.whole = "0".into();
        }
        return;
    }
    if !has_digits(&angle.degrees) && options.fill_angle_degrees {
        angle.degrees.whole = "0".into();
        for lower in [&mut angle.minutes, &mut angle.seconds] {
            if lower.sign == "-" {
                angle.degrees.sign = std::mem::take(&mut lower.sign);
                break;
            }
        }
    }
    if !has_digits(&angle.minutes) && options.fill_angle_minutes {
        angle.minutes.whole = "0".into();
        if !has_digits(&angle.degrees) && angle.seconds.sign == "-" {
            angle.minutes.sign = std::mem::take(&mut angle.seconds.sign);
        }
    }
    if !has_digits(&angle.seconds) && options.fill_angle_seconds {
        angle.seconds.whole = "0".into();
    }
}

fn render_part(piece: &NumberPiece, symbol: &str, options: &Options) -> Node {
    if options.angle_symbol_over_decimal && !piece.fractional.is_empty() {
        let marker = Node::command(
            r"\overset",
            vec![
                Node::tex(symbol),
                Node::Number(options.output_decimal_marker.clone()),
            ],
        );
        return render::render_number_with_marker(piece, options, Some(marker));
    }
    Node::row([
        render::render_number(piece, options),
        Node::tex(options.number_angle_product.clone()),
        Node::tex(symbol),
    ])
}

/// Renders a processed angle.
pub fn render_angle(angle: &Angle, options: &Options) -> Node {
    let mut angle = angle.clone();
    fill(&mut angle, options);
    let parts = [
        (&angle.degrees, &options.angle_symbol_degree),
        (&angle.minutes, &options.angle_symbol_minute),
        (&angle.seconds, &options.angle_symbol_second),
    ];
    let mut row = vec![];
    for (piece, symbol) in parts {
        if !has_digits(piece) {
            continue;
        }
        if !row.is_empty() {
            row.push(Node::tex(options.angle_separator.clone()));
        }
        row.push(render_part(piece, symbol, options));
    }
    Node::row(row)
}
