//! Complex numbers in cartesian form `1+2i` or polar form `2:45`.

use crate::error::{Error, Literal};
use crate::list;
use crate::markup::Node;
use crate::number::{self, NumberPiece};
use crate::options::{ComplexAngleUnit, ComplexMode, Options, RootPosition};
use crate::postprocess;
use crate::quantity;
use crate::render;
use crate::token::{self, Lexer};
use crate::unit::UnitPiece;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Form {
    Cartesian,
    Polar,
}

/// A complex number.
///
/// In polar form `real` holds the magnitude and `imaginary` the angle.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Complex {
    pub real: NumberPiece,
    pub imaginary: NumberPiece,
    pub form: Form,
}

fn has_digits(piece: &NumberPiece) -> bool {
    !piece.whole.is_empty() || !piece.fractional.is_empty()
}

fn parse_part(text: &str, offset: usize, options: &Options) -> Result<NumberPiece, Error> {
    number::parse_literal(text, options, Literal::Complex).map_err(|err| err.shifted(offset))
}

/// Parses a complex number.
pub fn parse_complex(text: &str, options: &Options) -> Result<Complex, Error> {
    let polar = list::split_elements(text, ':');
    if let &[(magnitude, m), (angle, a)] = polar.as_slice() {
        return Ok(Complex {
            real: parse_part(magnitude, m, options)?,
            imaginary: parse_part(angle, a, options)?,
            form: Form::Polar,
        });
    }

    let roots = token::class_tokens(&options.input_complex_root);
    let markers = token::class_tokens(&options.input_exponent_markers);
    let mut lexer = Lexer::new(text);
    let mut tokens = vec![];
    while let Some((token, span)) = lexer.next_token() {
        tokens.push((token.text(), span));
    }
    let is_root = |t: &str| roots.contains(&t);
    if !tokens.iter().any(|(t, _)| is_root(t.as_str())) {
        return Ok(Complex {
            real: parse_part(text, 0, options)?,
            imaginary: NumberPiece::default(),
            form: Form::Cartesian,
        });
    }

    // The imaginary part starts at the last sign that is not the sign of an exponent.
    let split = tokens
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|(i, (t, _))| {
            (t == "+" || t == "-") && !markers.contains(&tokens[i - 1].0.as_str())
        })
        .map(|(_, (_, span))| span.start);
    let (real, start) = match split {
        None => (NumberPiece::default(), 0),
        Some(start) => (parse_part(&text[..start], 0, options)?, start),
    };
    // Roots are blanked out so that offsets into the imaginary part stay valid.
    let mut imaginary = text[start..].to_string();
    for (t, span) in &tokens {
        if span.start >= start && is_root(t.as_str()) {
            let blank = " ".repeat(span.len());
            imaginary.replace_range(span.start - start..span.end - start, &blank);
        }
    }
    if imaginary
        .chars()
        .all(|c| c.is_whitespace() || c == '+' || c == '-')
    {
        imaginary.push('1');
    }
    Ok(Complex {
        real,
        imaginary: parse_part(&imaginary, start, options)?,
        form: Form::Cartesian,
    })
}

/// Converts the number to the form given by `complex-mode`.
fn convert(complex: &mut Complex, options: &Options) -> Result<(), Error> {
    let degrees = options.complex_angle_unit == ComplexAngleUnit::Degrees;
    let from_f64 = |value: f64| NumberPiece::from_f64(value, Literal::Complex);
    match (options.complex_mode, complex.form) {
        (ComplexMode::Polar, Form::Cartesian) => {
            let x = complex.real.to_f64();
            let y = complex.imaginary.to_f64();
            let angle = y.atan2(x);
            complex.real = from_f64(x.hypot(y))?;
            complex.imaginary = from_f64(if degrees { angle.to_degrees() } else { angle })?;
            complex.form = Form::Polar;
        }
        (ComplexMode::Cartesian, Form::Polar) => {
            let r = complex.real.to_f64();
            let angle = complex.imaginary.to_f64();
            let angle = if degrees { angle.to_radians() } else { angle };
            complex.real = from_f64(r * angle.cos())?;
            complex.imaginary = from_f64(r * angle.sin())?;
            complex.form = Form::Cartesian;
        }
        _ => {}
    }
    Ok(())
}

/// Converts the number per `complex-mode`, applies `prefix-mode` if there is a
/// unit, and post-processes both parts.
///
/// The angle of a polar number is never rescaled by the prefix.
pub fn process(
    complex: &mut Complex,
    units: Option<&mut [UnitPiece]>,
    options: &Options,
) -> Result<(), Error> {
    convert(complex, options)?;
    if let Some(units) = units {
        match complex.form {
            Form::Polar => {
                quantity::apply_prefix_mode(std::slice::from_mut(&mut complex.real), units, options)
            }
            Form::Cartesian => {
                let mut parts = [
                    std::mem::take(&mut complex.real),
                    std::mem::take(&mut complex.imaginary),
                ];
                quantity::apply_prefix_mode(&mut parts, units, options);
                let [real, imaginary] = parts;
                complex.real = real;
                complex.imaginary = imaginary;
            }
        }
    }
    for piece in [&mut complex.real, &mut complex.imaginary] {
        if has_digits(piece) {
            postprocess::process(piece, options)?;
        }
    }
    Ok(())
}

fn is_unity(piece: &NumberPiece) -> bool {
    piece.prefix.is_empty() && piece.uncertainty.is_empty() && piece.to_plain_string() == "1"
}

/// Renders a processed complex number.
pub fn render_complex(complex: &Complex, options: &Options) -> Node {
    let show_real = has_digits(&complex.real);
    let show_imaginary = has_digits(&complex.imaginary) && !complex.imaginary.is_zero();
    let mut row = vec![];
    if show_real || !show_imaginary {
        row.push(render::render_number(&complex.real, options));
    }
    if !show_imaginary {
        return Node::row(row);
    }
    match complex.form {
        Form::Polar => {
            row.push(Node::tex(options.complex_symbol_angle.clone()));
            row.push(render::render_number(&complex.imaginary, options));
            if options.complex_angle_unit == ComplexAngleUnit::Degrees {
                row.push(Node::tex(options.complex_symbol_degree.clone()));
            }
        }
        Form::Cartesian => {
            let mut imaginary = complex.imaginary.clone();
            if std::mem::take(&mut imaginary.sign) == "-" {
                row.push(Node::Operator("-".into()));
            } else if show_real {
                row.push(Node::Operator("+".into()));
            }
            let root = Node::tex(options.output_complex_root.clone());
            let number = if is_unity(&imaginary) && !options.print_complex_unity {
                Node::empty()
            } else {
                render::render_number(&imaginary, options)
            };
            match options.complex_root_position {
                RootPosition::BeforeNumber => row.extend([root, number]),
                RootPosition::AfterNumber => row.extend([number, root]),
            }
        }
    }
    Node::row(row)
}

/// Renders a processed complex number followed by its unit.
///
/// A cartesian number with both parts is bracketed so the unit applies to the whole.
pub fn render_complex_quantity(
    complex: &Complex,
    units: &[UnitPiece],
    literal: bool,
    options: &Options,
) -> Node {
    let unit = crate::unitrender::render_unit(units, literal, options);
    let mut number = render_complex(complex, options);
    let both_parts = has_digits(&complex.real)
        && has_digits(&complex.imaginary)
        && !complex.imaginary.is_zero();
    if complex.form == Form::Cartesian && both_parts && !unit.is_empty() {
        number = Node::row([Node::tex("("), number, Node::tex(")")]);
    }
    quantity::attach_unit(number, unit, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyval;
    use crate::unit::{parse_unit, UnitTable};

    fn options(source: &str) -> Options {
        Options::default()
            .with(&keyval::parse(source).unwrap())
            .unwrap()
    }

    fn complexnum(text: &str, source: &str) -> String {
        let options = options(source);
        let mut complex = parse_complex(text, &options).unwrap();
        process(&mut complex, None, &options).unwrap();
        render_complex(&complex, &options).to_tex()
    }

    fn complexqty(text: &str, unit: &str, source: &str) -> String {
        let options = options(source);
        let mut complex = parse_complex(text, &options).unwrap();
        let mut parsed = parse_unit(unit, &options, &UnitTable::default()).unwrap();
        process(&mut complex, Some(&mut parsed.pieces), &options).unwrap();
        render_complex_quantity(&complex, &parsed.pieces, parsed.literal, &options).to_tex()
    }

    macro_rules! complex_tests {
        ( $( ($name: ident, $text: expr, $options: expr, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(complexnum($text, $options), $want);
            }
            )+
        };
    }

    complex_tests!(
        (cartesian, "1+2i", "", r"1+2\mathrm{i}"),
        (cartesian_negative, "1-2i", "", r"1-2\mathrm{i}"),
        (imaginary_only, "2i", "", r"2\mathrm{i}"),
        (negative_unit_root, "-i", "", r"-\mathrm{i}"),
        (unity_hidden, "1+i", "", r"1+\mathrm{i}"),
        (unity_shown, "1+i", "print-complex-unity", r"1+1\mathrm{i}"),
        (real_only, "3", "", "3"),
        (j_root, "1+2j", "", r"1+2\mathrm{i}"),
        (root_before, "1+2i", "complex-root-position=before-number", r"1+\mathrm{i}2"),
        (output_root, "1+2i", "output-complex-root=j", "1+2j"),
        (exponent_sign_is_not_a_split, "1+2e-3i", "", r"1+2\times10^{-3}\mathrm{i}"),
        (polar, "1:45", "", r"1\angle45\degree"),
        (polar_radians, "1:0.5", "complex-angle-unit=radians", r"1\angle0.5"),
        (polar_zero_angle, "2:0", "", "2"),
        (to_polar, "1+1i", "complex-mode=polar, round-mode=places, round-precision=2", r"1.41\angle45.00\degree"),
        (to_cartesian, "2:90", "complex-mode=cartesian, round-mode=places, round-precision=2", r"0.00+2.00\mathrm{i}"),
        (input_form_kept, "2:90", "complex-mode=input", r"2\angle90\degree"),
    );

    #[test]
    fn quantity_brackets_both_parts() {
        assert_eq!(complexqty("1+2i", r"\volt", ""), r"(1+2\mathrm{i})\,\mathrm{V}");
        assert_eq!(complexqty("2i", r"\volt", ""), r"2\mathrm{i}\,\mathrm{V}");
    }

    #[test]
    fn quantity_prefix_applies_to_both_parts() {
        assert_eq!(
            complexqty("1+2i", r"\kilo\volt", "prefix-mode=extract-exponent"),
            r"(1\times10^{3}+2\times10^{3}\mathrm{i})\,\mathrm{V}"
        );
    }

    #[test]
    fn quantity_prefix_skips_polar_angle() {
        assert_eq!(
            complexqty("1:45", r"\kilo\volt", "prefix-mode=extract-exponent"),
            r"1\times10^{3}\angle45\degree\,\mathrm{V}"
        );
    }

    #[test]
    fn errors_point_into_the_literal() {
        let err = parse_complex("1+2qi", &Options::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedToken {
                literal: Literal::Complex,
                ..
            }
        ));
        assert_eq!(err.span(), Some(3..4));
    }

    #[test]
    fn imaginary_errors_keep_their_position() {
        for text in ["1 + 2 q i", "1 + i 2q", "1 +   2   q"] {
            let err = parse_complex(text, &Options::default()).unwrap_err();
            assert_eq!(err.span().map(|span| &text[span]), Some("q"), "{text}");
        }
    }

    #[test]
    fn huge_values_cannot_be_converted() {
        let options = options("complex-mode=polar");
        let mut complex = parse_complex("1e10000+1e10000i", &options).unwrap();
        assert_eq!(
            process(&mut complex, None, &options),
            Err(Error::NonFiniteValue {
                literal: Literal::Complex
            })
        );
    }
}
