//! Lexing of command arguments.
//!
//! Literals are written in TeX notation, so the lexer understands just enough
//!     TeX to split them up: control sequences (`\pm`, `\,`), braced groups
//!     and single characters.
//! Whitespace between tokens is insignificant and skipped.

use crate::error::{Error, Span};

/// A token in a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A control sequence including its leading backslash, like `\pm` or `\,`.
    ControlSequence(&'a str),
    /// A character other than a brace or backslash.
    Char(char),
    /// The `{` character.
    BeginGroup,
    /// The `}` character.
    EndGroup,
}

impl<'a> Token<'a> {
    /// The source text of the token.
    pub fn text(&self) -> String {
        match self {
            Token::ControlSequence(cs) => cs.to_string(),
            Token::Char(c) => c.to_string(),
            Token::BeginGroup => "{".to_string(),
            Token::EndGroup => "}".to_string(),
        }
    }
}

/// An argument read from the source along with its position.
///
/// For braced arguments the text and span exclude the braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument<'a> {
    pub text: &'a str,
    pub span: Span,
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer { source, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The source that has not been consumed yet.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.remaining().trim_start();
        self.pos = self.source.len() - trimmed.len();
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        self.skip_whitespace();
        lex_one(self.source, self.pos)
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Option<(Token<'a>, Span)> {
        let (token, span) = self.peek()?;
        self.pos = span.end;
        Some((token, span))
    }

    /// Reads a braced group if the next token begins one.
    pub fn read_group(&mut self) -> Result<Option<Argument<'a>>, Error> {
        match self.peek() {
            Some((Token::BeginGroup, open)) => {
                let close = find_group_end(self.source, open.clone())?;
                self.pos = close + 1;
                Ok(Some(Argument {
                    text: &self.source[open.end..close],
                    span: open.end..close,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Reads an undelimited argument: either a braced group or a single token.
    pub fn read_argument(&mut self) -> Result<Option<Argument<'a>>, Error> {
        if let Some(group) = self.read_group()? {
            return Ok(Some(group));
        }
        match self.next_token() {
            None => Ok(None),
            Some((Token::EndGroup, span)) => Err(Error::UnmatchedCloseBrace { span }),
            Some((_, span)) => Ok(Some(Argument {
                text: &self.source[span.clone()],
                span,
            })),
        }
    }

    /// Reads a `[...]` option list if the next character begins one.
    pub fn read_optional(&mut self) -> Result<Option<Argument<'a>>, Error> {
        self.skip_whitespace();
        if !self.remaining().starts_with('[') {
            return Ok(None);
        }
        let open = self.pos..self.pos + 1;
        let mut depth = 0_usize;
        let mut chars = self.source[open.end..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                ']' if depth == 0 => {
                    let close = open.end + i;
                    self.pos = close + 1;
                    return Ok(Some(Argument {
                        text: &self.source[open.end..close],
                        span: open.end..close,
                    }));
                }
                _ => {}
            }
        }
        Err(Error::UnterminatedOptions { open })
    }
}

fn lex_one(source: &str, pos: usize) -> Option<(Token<'_>, Span)> {
    let mut chars = source[pos..].chars();
    let c = chars.next()?;
    let end = pos + c.len_utf8();
    let token = match c {
        '{' => Token::BeginGroup,
        '}' => Token::EndGroup,
        '\\' => {
            let rest = &source[end..];
            let letters = rest
                .char_indices()
                .find(|(_, c)| !c.is_ascii_alphabetic())
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let cs_end = if letters > 0 {
                end + letters
            } else {
                end + rest.chars().next().map(char::len_utf8).unwrap_or(0)
            };
            return Some((Token::ControlSequence(&source[pos..cs_end]), pos..cs_end));
        }
        c => Token::Char(c),
    };
    Some((token, pos..end))
}

/// Returns the byte index of the `}` closing the group opened at `open`.
fn find_group_end(source: &str, open: Span) -> Result<usize, Error> {
    let mut depth = 1_usize;
    let mut chars = source[open.end..].char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open.end + i);
                }
            }
            _ => {}
        }
    }
    Err(Error::UnterminatedGroup { open })
}

/// Splits an input character class option into its tokens.
///
/// Each token is either a control sequence or a single non-whitespace character.
pub fn class_tokens(class: &str) -> Vec<&str> {
    let mut tokens = vec![];
    let mut pos = 0;
    while let Some((_, span)) = lex_one(class, pos) {
        pos = span.end;
        let text = &class[span];
        if text.chars().all(char::is_whitespace) || text == "\\" {
            continue;
        }
        tokens.push(text);
    }
    tokens
}

/// Whether the string ends with a backslash that does not escape anything.
pub fn ends_with_unescaped_backslash(s: &str) -> bool {
    s.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Removes one layer of braces if they enclose the entire string.
pub fn strip_braces(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.starts_with('{') {
        if let Ok(close) = find_group_end(trimmed, 0..1) {
            if close + 1 == trimmed.len() {
                return &trimmed[1..close];
            }
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = vec![];
        while let Some((token, _)) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn lex_number() {
        assert_eq!(
            lex_all(r"1.2 \pm 0.3"),
            vec![
                Token::Char('1'),
                Token::Char('.'),
                Token::Char('2'),
                Token::ControlSequence(r"\pm"),
                Token::Char('0'),
                Token::Char('.'),
                Token::Char('3'),
            ]
        );
    }

    #[test]
    fn lex_control_symbol() {
        assert_eq!(
            lex_all(r"\,\%a"),
            vec![
                Token::ControlSequence(r"\,"),
                Token::ControlSequence(r"\%"),
                Token::Char('a'),
            ]
        );
    }

    #[test]
    fn read_nested_group() {
        let mut lexer = Lexer::new(r"{a{b}c}d");
        let arg = lexer.read_argument().unwrap().unwrap();
        assert_eq!(arg.text, "a{b}c");
        assert_eq!(arg.span, 1..6);
        assert_eq!(lexer.remaining(), "d");
    }

    #[test]
    fn escaped_braces_do_not_close_groups() {
        let mut lexer = Lexer::new(r"{\}}");
        let arg = lexer.read_group().unwrap().unwrap();
        assert_eq!(arg.text, r"\}");
    }

    #[test]
    fn unterminated_group() {
        let mut lexer = Lexer::new("{abc");
        assert_eq!(
            lexer.read_group(),
            Err(Error::UnterminatedGroup { open: 0..1 })
        );
    }

    #[test]
    fn read_optional_with_brackets_in_braces() {
        let mut lexer = Lexer::new("[a={]}, b] rest");
        let arg = lexer.read_optional().unwrap().unwrap();
        assert_eq!(arg.text, "a={]}, b");
        assert_eq!(lexer.remaining(), " rest");
    }

    #[test]
    fn no_optional() {
        let mut lexer = Lexer::new("{1}");
        assert_eq!(lexer.read_optional(), Ok(None));
    }

    #[test]
    fn class_tokens_splits_macros() {
        assert_eq!(
            class_tokens(r"+-\pm\mp"),
            vec!["+", "-", r"\pm", r"\mp"]
        );
        assert_eq!(class_tokens("d D"), vec!["d", "D"]);
    }

    #[test]
    fn trailing_backslashes() {
        assert!(ends_with_unescaped_backslash(r"abc\"));
        assert!(!ends_with_unescaped_backslash(r"abc\\"));
        assert!(!ends_with_unescaped_backslash(r"abc"));
    }

    #[test]
    fn strip_outer_braces() {
        assert_eq!(strip_braces("{, }"), ", ");
        assert_eq!(strip_braces(" {a}{b} "), "{a}{b}");
        assert_eq!(strip_braces("abc"), "abc");
    }
}
