//! Generate short class name tokens.
//!
//! Tokens are the successive values of a counter rendered in base 34 (`0-9`
//! then `a-x`). Renderings that are not valid CSS identifiers, or that already
//! appear as a class in the original stylesheet, are skipped.

use std::collections::HashSet;

use regex::Regex;

/// Digits of the base used to render tokens.
const ALPHABET: &[u8; 34] = b"0123456789abcdefghijklmnopqrstuvwx";

/// Generator of unique class name tokens.
///
/// The generator never returns the same token twice, so the set of tokens it
/// produced does not need to be stored.
#[derive(Debug, Default)]
pub struct TokenGenerator {
    /// Next counter value to try.
    counter: u64,

    /// Words following a `.` in the original stylesheet.
    taken: HashSet<String>,
}

impl TokenGenerator {
    /// Create a generator that avoids class names present in `css`.
    pub fn new(css: impl AsRef<str>) -> Self {
        Self {
            counter: 0,
            taken: class_words(css.as_ref()),
        }
    }

    /// Return the next available token.
    pub fn succ(&mut self) -> String {
        loop {
            let candidate = to_base34(self.counter);
            self.counter += 1;
            if is_identifier(&candidate) && !self.taken.contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Return the current counter value.
    pub fn counter(&self) -> u64 {
        self.counter
    }
}

/// Render a number in base 34.
pub fn to_base34(mut value: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[(value % 34) as usize]);
        value /= 34;
        if value == 0 {
            break;
        }
    }
    digits.reverse();
    // Only ASCII bytes from `ALPHABET`
    digits.into_iter().map(char::from).collect()
}

/// Check whether a string can be used as a class name without escaping.
///
/// An identifier must not be empty, must not start with a digit, and must not
/// start with a hyphen followed by a digit.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), _) if c.is_ascii_digit() => false,
        (Some('-'), Some(c)) if c.is_ascii_digit() => false,
        _ => s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
    }
}

/// Collect every word that directly follows a `.` in a stylesheet.
///
/// A token `t` collides with the stylesheet when `\.t\b` matches, which is the
/// case exactly when `t` is one of these words.
fn class_words(css: &str) -> HashSet<String> {
    // The pattern is a valid constant
    let re = Regex::new(r"\.([0-9A-Za-z_]+)").unwrap();
    re.captures_iter(css)
        .map(|captures| captures[1].to_owned())
        .collect()
}
