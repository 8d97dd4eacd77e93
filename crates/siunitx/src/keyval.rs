//! Parsing of `key=value` option lists.
//!
//! Entries are separated by commas.
//! Commas and equals signs inside braces do not split, and one layer of braces
//!     around a value is removed, so `list-separator = {, }` sets the value `, `.
//! A key with no value means `true`, and the unbraced values `true` and `false`
//!     are booleans.

use crate::error::{Error, Span};
use crate::token;

/// A value in an option list before it is checked against the option's type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    Text(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One entry of an option list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVal {
    pub key: String,
    pub value: Value,
    pub span: Span,
}

/// Parses an option list.
pub fn parse(source: &str) -> Result<Vec<KeyVal>, Error> {
    let mut entries = vec![];
    for span in split_top_level(source, ',', 0..source.len())? {
        let entry = &source[span.clone()];
        if entry.trim().is_empty() {
            continue;
        }
        let mut parts = split_top_level(source, '=', span.clone())?.into_iter();
        let key_span = parts.next().unwrap_or(span.clone());
        let key = source[key_span.clone()].trim().to_string();
        let value = match parts.next() {
            None => Value::Bool(true),
            Some(value_span) => {
                // Only the first `=` separates the key from the value.
                let raw = &source[value_span.start..span.end];
                match raw.trim() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::Text(token::strip_braces(raw).to_string()),
                }
            }
        };
        let trimmed_start = key_span.start + (source[key_span.clone()].len()
            - source[key_span.clone()].trim_start().len());
        entries.push(KeyVal {
            key,
            value,
            span: trimmed_start..span.end - (entry.len() - entry.trim_end().len()),
        });
    }
    Ok(entries)
}

/// Splits the range of the source on a separator that is not inside braces.
fn split_top_level(source: &str, separator: char, range: Span) -> Result<Vec<Span>, Error> {
    let mut parts = vec![];
    let mut start = range.start;
    let mut opens: Vec<usize> = vec![];
    let mut chars = source[range.clone()].char_indices();
    while let Some((i, c)) = chars.next() {
        let i = range.start + i;
        match c {
            '\\' => {
                chars.next();
            }
            '{' => opens.push(i),
            '}' => {
                if opens.pop().is_none() {
                    return Err(Error::UnmatchedCloseBrace { span: i..i + 1 });
                }
            }
            c if c == separator && opens.is_empty() => {
                parts.push(start..i);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if let Some(open) = opens.first() {
        return Err(Error::UnterminatedGroup {
            open: *open..*open + 1,
        });
    }
    parts.push(start..range.end);
    Ok(parts)
}
