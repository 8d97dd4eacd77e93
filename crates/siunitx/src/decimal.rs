//! Arithmetic on decimal digit strings.
//!
//! Numbers are never converted to floats for rounding or for moving the decimal
//!     point. Every function here works on a whole part and a fractional part,
//!     each a string of ASCII digits.

use crate::options::RoundHalf;

fn to_digits(whole: &str, fractional: &str) -> Vec<u8> {
    whole
        .bytes()
        .chain(fractional.bytes())
        .map(|b| b.wrapping_sub(b'0'))
        .collect()
}

fn to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Adds one to the last digit, carrying as needed.
///
/// Returns true if the carry ran off the front and a new leading `1` was added.
fn increment(digits: &mut Vec<u8>) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return false;
        }
    }
    digits.insert(0, 1);
    true
}

pub fn is_zero(digits: &str) -> bool {
    digits.bytes().all(|b| b == b'0')
}

/// Strips leading zeros, keeping a single `0` if nothing else is left.
pub fn trim_leading_zeros(whole: &str) -> String {
    let trimmed = whole.trim_start_matches('0');
    if trimmed.is_empty() && !whole.is_empty() {
        "0".into()
    } else {
        trimmed.into()
    }
}

/// Removes the last `drop` digits of the number, rounding the digits that remain.
///
/// If more digits are dropped than the fractional part has, the dropped whole
///     digits are replaced by zeros: rounding `1234` with `drop = 2` gives `1200`.
pub fn round_off(whole: &str, fractional: &str, drop: usize, half: RoundHalf) -> (String, String) {
    if drop == 0 {
        return (whole.into(), fractional.into());
    }
    let mut digits = to_digits(whole, fractional);
    // At least one digit must survive so that a round up has somewhere to go.
    let pad = (drop + 1).saturating_sub(digits.len());
    digits.splice(0..0, std::iter::repeat(0).take(pad));

    let keep = digits.len() - drop;
    let dropped = digits.split_off(keep);
    let rest_non_zero = dropped[1..].iter().any(|d| *d != 0);
    let round_up = match dropped[0].cmp(&5) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => {
            rest_non_zero
                || match half {
                    RoundHalf::Up => true,
                    RoundHalf::Even => digits.last().map_or(false, |d| d % 2 == 1),
                }
        }
    };
    if round_up {
        increment(&mut digits);
    }
    digits.extend(std::iter::repeat(0).take(drop.saturating_sub(fractional.len())));
    let fractional_len = fractional.len().saturating_sub(drop);
    let split = digits.len() - fractional_len;
    let mut new_whole = to_string(&digits[..split]);
    let new_fractional = to_string(&digits[split..]);

    let leading = new_whole.bytes().take_while(|b| *b == b'0').count();
    let strip = pad.min(leading).min(new_whole.len().saturating_sub(1));
    new_whole.drain(..strip);
    (new_whole, new_fractional)
}

/// Rounds to `places` decimal places. Negative places round into the whole part.
///
/// With `pad` a short fractional part is extended with zeros.
pub fn round_places(
    whole: &str,
    fractional: &str,
    places: i64,
    half: RoundHalf,
    pad: bool,
) -> (String, String) {
    let drop = (fractional.len() as i64).saturating_sub(places);
    if drop > 0 {
        return round_off(whole, fractional, drop as usize, half);
    }
    let mut fractional = fractional.to_string();
    if pad {
        fractional.extend(std::iter::repeat('0').take(drop.unsigned_abs() as usize));
    }
    (whole.into(), fractional)
}

/// Rounds to `figures` significant figures.
///
/// Zero is taken to have as many significant figures as it has fractional
///     digits, and at least one.
pub fn round_figures(
    whole: &str,
    fractional: &str,
    figures: i64,
    half: RoundHalf,
    pad: bool,
) -> (String, String) {
    if figures < 1 {
        return (whole.into(), fractional.into());
    }
    let figures = figures as usize;
    let digits = to_digits(whole, fractional);
    let significant = match digits.iter().position(|d| *d != 0) {
        None => std::cmp::max(1, fractional.len()),
        Some(lead) => digits.len() - lead,
    };
    if significant > figures {
        let (new_whole, mut new_fractional) =
            round_off(whole, fractional, significant - figures, half);
        // A carry like 9.96 -> 10.0 adds a figure; give it back.
        let new_digits = to_digits(&new_whole, &new_fractional);
        let lead = new_digits.iter().position(|d| *d != 0).unwrap_or(0);
        if new_digits.len() - lead > figures && !new_fractional.is_empty() {
            new_fractional.pop();
        }
        return (new_whole, new_fractional);
    }
    let mut fractional = fractional.to_string();
    if pad && significant < figures {
        fractional.extend(std::iter::repeat('0').take(figures - significant));
    }
    (whole.into(), fractional)
}

/// Moves the decimal point so that there is exactly one non-zero whole digit.
///
/// Returns the new parts and the power of ten the value was divided by.
/// Trailing zeros are kept since they are significant.
/// Zero becomes `0` with a shift of zero.
pub fn to_scientific(whole: &str, fractional: &str) -> (String, String, i64) {
    let digits = to_digits(whole, fractional);
    let Some(lead) = digits.iter().position(|d| *d != 0) else {
        return ("0".into(), fractional.into(), 0);
    };
    let shift = whole.len() as i64 - lead as i64 - 1;
    (
        to_string(&digits[lead..lead + 1]),
        to_string(&digits[lead + 1..]),
        shift,
    )
}

/// Multiplies the number by `10^places`.
pub fn shift(whole: &str, fractional: &str, places: i64) -> (String, String) {
    let mut whole = whole.to_string();
    let mut fractional = fractional.to_string();
    if places >= 0 {
        let places = places as usize;
        if fractional.len() < places {
            fractional.extend(std::iter::repeat('0').take(places - fractional.len()));
        }
        let rest = fractional.split_off(places);
        whole.push_str(&fractional);
        fractional = rest;
    } else {
        let places = places.unsigned_abs() as usize;
        if whole.len() < places {
            whole.insert_str(0, &"0".repeat(places - whole.len()));
        }
        let moved = whole.split_off(whole.len() - places);
        fractional.insert_str(0, &moved);
    }
    let whole = trim_leading_zeros(&whole);
    (if whole.is_empty() { "0".into() } else { whole }, fractional)
}

/// Multiplies the number by a small integer.
pub fn multiply(whole: &str, fractional: &str, factor: u32) -> (String, String) {
    let mut carry = 0_u32;
    let mut digits = to_digits(whole, fractional);
    for d in digits.iter_mut().rev() {
        let product = *d as u32 * factor + carry;
        *d = (product % 10) as u8;
        carry = product / 10;
    }
    let mut prefix = vec![];
    while carry > 0 {
        prefix.insert(0, (carry % 10) as u8);
        carry /= 10;
    }
    prefix.extend(digits);
    let split = prefix.len() - fractional.len();
    let whole = trim_leading_zeros(&to_string(&prefix[..split]));
    (
        if whole.is_empty() { "0".into() } else { whole },
        to_string(&prefix[split..]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn joined((whole, fractional): (String, String)) -> String {
        if fractional.is_empty() {
            whole
        } else {
            format!["{whole}.{fractional}"]
        }
    }

    macro_rules! rounding_tests {
        ( $( ($name: ident, $f: ident, $whole: expr, $fractional: expr, $n: expr, $half: ident, $want: expr), )+ ) => {
            $(
            #[test]
            fn $name() {
                let got = joined($f($whole, $fractional, $n, RoundHalf::$half, true));
                assert_eq!(got, $want);
            }
            )+
        };
    }

    rounding_tests!(
        (places_half_even_tie, round_places, "0", "125", 2, Even, "0.12"),
        (places_half_up_tie, round_places, "0", "125", 2, Up, "0.13"),
        (places_even_odd_tie, round_places, "0", "135", 2, Even, "0.14"),
        (places_tie_with_rest, round_places, "0", "1251", 2, Even, "0.13"),
        (places_carry, round_places, "1", "996", 2, Up, "2.00"),
        (places_carry_into_new_digit, round_places, "99", "96", 1, Up, "100.0"),
        (places_pad, round_places, "1", "5", 3, Up, "1.500"),
        (places_zero, round_places, "12", "5", 0, Up, "13"),
        (places_negative, round_places, "1234", "5", -2, Up, "1200"),
        (places_negative_carry, round_places, "96", "", -1, Up, "100"),
        (places_small_to_zero, round_places, "0", "004", 2, Up, "0.00"),
        (places_tiny_whole, round_places, "4", "", -2, Up, "0"),
        (places_up_from_nothing, round_places, "", "5", 0, Up, "1"),
        (figures_carry, round_figures, "1", "999", 2, Up, "2.0"),
        (figures_carry_new_digit, round_figures, "9", "96", 2, Up, "10"),
        (figures_leading_zeros, round_figures, "0", "012345", 3, Up, "0.0123"),
        (figures_whole, round_figures, "123456", "", 2, Up, "120000"),
        (figures_pad, round_figures, "1", "2", 4, Up, "1.200"),
        (figures_zero_pad, round_figures, "0", "", 3, Up, "0.00"),
        (figures_non_positive, round_figures, "1", "2345", 0, Up, "1.2345"),
    );

    #[test]
    fn places_at_the_integer_limits() {
        assert_eq!(
            joined(round_places("1", "5", i64::MAX, RoundHalf::Up, false)),
            "1.5"
        );
    }

    #[test]
    fn figures_without_pad() {
        assert_eq!(
            joined(round_figures("1", "2", 4, RoundHalf::Up, false)),
            "1.2"
        );
    }

    #[test]
    fn scientific() {
        assert_eq!(
            to_scientific("1234", "5"),
            ("1".into(), "2345".into(), 3)
        );
        assert_eq!(to_scientific("0", "00120"), ("1".into(), "20".into(), -3));
        assert_eq!(to_scientific("", "5"), ("5".into(), "".into(), -1));
        assert_eq!(to_scientific("0", "0"), ("0".into(), "0".into(), 0));
    }

    #[test]
    fn shifting() {
        assert_eq!(shift("1", "2345", 3), ("1234".into(), "5".into()));
        assert_eq!(shift("1", "2", 3), ("1200".into(), "".into()));
        assert_eq!(shift("12", "", -3), ("0".into(), "012".into()));
        assert_eq!(shift("1234", "", -2), ("12".into(), "34".into()));
        assert_eq!(shift("5", "", 0), ("5".into(), "".into()));
    }

    #[test]
    fn multiplying() {
        assert_eq!(multiply("0", "5", 60), ("30".into(), "0".into()));
        assert_eq!(multiply("0", "25", 60), ("15".into(), "00".into()));
        assert_eq!(multiply("", "123", 60), ("7".into(), "380".into()));
    }

    #[test]
    fn trimming() {
        assert_eq!(trim_leading_zeros("007"), "7");
        assert_eq!(trim_leading_zeros("000"), "0");
        assert_eq!(trim_leading_zeros(""), "");
    }

    #[test]
    fn rounding_is_idempotent() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let digits = |rng: &mut rand::rngs::ThreadRng| -> String {
                (0..rng.gen_range(0..7))
                    .map(|_| char::from(b'0' + rng.gen_range(0..10)))
                    .collect()
            };
            let mut whole = digits(&mut rng);
            if whole.is_empty() {
                whole.push('0');
            }
            let fractional = digits(&mut rng);
            let n = rng.gen_range(1..6);
            let half = [RoundHalf::Up, RoundHalf::Even][rng.gen_range(0..2)];
            let pad = rng.gen_bool(0.5);

            let once = round_figures(&whole, &fractional, n, half, pad);
            let twice = round_figures(&once.0, &once.1, n, half, pad);
            assert_eq!(once, twice, "figures {whole}.{fractional} to {n}");

            let once = round_places(&whole, &fractional, n - 2, half, pad);
            let twice = round_places(&once.0, &once.1, n - 2, half, pad);
            assert_eq!(once, twice, "places {whole}.{fractional} to {}", n - 2);
        }
    }
}
