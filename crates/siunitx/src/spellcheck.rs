//! Spell checking using Levenshtein distance
//!
//! Used to attach "did you mean" notes to errors about unknown option keys,
//!     unit macros and commands.
//! Only the distance is needed here, so the calculation keeps two rows of the
//!     dynamic programming matrix rather than the full diff.

/// Find the word in the dictionary closest to the search word.
///
/// Returns [None] if no word is close enough to be a plausible typo.
/// A word is close enough if at most a third of its characters (and at least one)
///     need to be edited.
pub fn find_close_word<'a, I>(dictionary: I, word: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let threshold = std::cmp::max(1, word.chars().count() / 3);
    let mut best: Option<(usize, &'a str)> = None;
    for candidate in dictionary {
        let distance = levenshtein_distance(word, candidate);
        if distance > threshold {
            continue;
        }
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, candidate)),
        }
    }
    best.map(|(_, candidate)| candidate)
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, a_i) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_j) in b.iter().enumerate() {
            current[j + 1] = if a_i == b_j {
                previous[j]
            } else {
                1 + std::cmp::min(previous[j], std::cmp::min(previous[j + 1], current[j]))
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! levenshtein_tests {
        ($( ($name: ident, $a: expr, $b: expr, $want: expr), )+) => {
            $(
            #[test]
            fn $name() {
                assert_eq!(levenshtein_distance($a, $b), $want);
                assert_eq!(levenshtein_distance($b, $a), $want);
            }
            )+
        };
    }

    levenshtein_tests!(
        (same, "metre", "metre", 0),
        (empty, "", "abc", 3),
        (one_modify, "metre", "metra", 1),
        (one_add, "round-mod", "round-mode", 1),
        (kitten_sitting, "kitten", "sitting", 3),
    );

    #[test]
    fn closest_word_wins() {
        let dictionary = ["round-mode", "round-half", "round-pad"];
        assert_eq!(
            find_close_word(dictionary, "round-mod"),
            Some("round-mode")
        );
    }

    #[test]
    fn distant_words_are_not_suggested() {
        let dictionary = ["metre", "second"];
        assert_eq!(find_close_word(dictionary, "furlong"), None);
    }
}
