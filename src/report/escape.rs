//! Backslash-escape reversal for report failure messages
//!
//! The runner stores failure messages that went through one extra round of
//! escaping, so a stack trace arrives as `line1\nline2` with a literal
//! backslash. [`unescape`] reverses exactly one layer of that encoding.
//!
//! Recognised sequences: `\\`, `\'`, `\"`, `\a`, `\b`, `\f`, `\n`, `\r`,
//! `\t`, `\v`, up to three octal digits, `\xHH`, `\uHHHH`, `\UHHHHHHHH`, and a
//! backslash before a line break (line continuation, removed). Any other
//! backslash pair is kept as written. Characters outside escapes pass through
//! untouched, including non-ASCII text.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

/// Why an escape sequence could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    #[error("trailing backslash at position {0}")]
    TrailingBackslash(usize),

    #[error("truncated \\{kind} escape at position {position}: expected {expected} hex digits")]
    Truncated {
        kind: char,
        position: usize,
        expected: usize,
    },

    #[error("escape at position {position} is not a valid character (U+{value:04X})")]
    InvalidCodePoint { position: usize, value: u32 },

    #[error("named unicode escape at position {0} is not supported")]
    NamedEscape(usize),
}

/// Reverse one layer of backslash escaping in `input`
pub fn unescape(input: &str) -> Result<String, EscapeError> {
    if !input.contains('\\') {
        return Ok(input.to_string());
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some((_, escape)) = chars.next() else {
            return Err(EscapeError::TrailingBackslash(position));
        };

        match escape {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|(_, d)| d.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.push(code_point(value, position)?);
            }
            'x' => out.push(hex_escape(&mut chars, 'x', 2, position)?),
            'u' => out.push(hex_escape(&mut chars, 'u', 4, position)?),
            'U' => out.push(hex_escape(&mut chars, 'U', 8, position)?),
            'N' => return Err(EscapeError::NamedEscape(position)),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn hex_escape(
    chars: &mut Peekable<CharIndices<'_>>,
    kind: char,
    digits: usize,
    position: usize,
) -> Result<char, EscapeError> {
    let mut value: u32 = 0;
    for _ in 0..digits {
        let digit = chars
            .peek()
            .and_then(|(_, c)| c.to_digit(16))
            .ok_or(EscapeError::Truncated {
                kind,
                position,
                expected: digits,
            })?;
        chars.next();
        value = value.saturating_mul(16).saturating_add(digit);
    }
    code_point(value, position)
}

fn code_point(value: u32, position: usize) -> Result<char, EscapeError> {
    char::from_u32(value).ok_or(EscapeError::InvalidCodePoint { position, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(unescape("expected true").unwrap(), "expected true");
        assert_eq!(unescape("").unwrap(), "");
    }

    #[test]
    fn test_newlines_and_quotes() {
        assert_eq!(unescape(r"line1\nline2").unwrap(), "line1\nline2");
        assert_eq!(
            unescape(r#"Expected \"Welcome\"\tgot \'Login\'"#).unwrap(),
            "Expected \"Welcome\"\tgot 'Login'"
        );
        assert_eq!(unescape(r"a\\nb").unwrap(), "a\\nb");
    }

    #[test]
    fn test_numeric_escapes() {
        assert_eq!(unescape(r"\x41\u00e9\U0001F600").unwrap(), "A\u{e9}\u{1F600}");
        assert_eq!(unescape(r"\101\0").unwrap(), "A\0");
        assert_eq!(unescape(r"\1018").unwrap(), "A8");
        assert_eq!(unescape(r"\u001b[31mred").unwrap(), "\u{1b}[31mred");
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        assert_eq!(unescape(r"C:\temp\q").unwrap(), "C:\temp\\q");
        assert_eq!(unescape(r"\d+").unwrap(), "\\d+");
    }

    #[test]
    fn test_line_continuation_removed() {
        assert_eq!(unescape("first \\\nsecond").unwrap(), "first second");
    }

    #[test]
    fn test_non_ascii_preserved() {
        assert_eq!(unescape(r"요소를 찾을 수 없음\n다시 시도").unwrap(), "요소를 찾을 수 없음\n다시 시도");
    }

    #[test]
    fn test_malformed_escapes_fail() {
        assert_eq!(unescape("oops\\"), Err(EscapeError::TrailingBackslash(4)));
        assert!(matches!(
            unescape(r"\x4"),
            Err(EscapeError::Truncated { kind: 'x', expected: 2, .. })
        ));
        assert!(matches!(
            unescape(r"\u12g4"),
            Err(EscapeError::Truncated { kind: 'u', .. })
        ));
        assert!(matches!(
            unescape(r"\ud800"),
            Err(EscapeError::InvalidCodePoint { value: 0xD800, .. })
        ));
        assert!(matches!(
            unescape(r"\UFFFFFFFF"),
            Err(EscapeError::InvalidCodePoint { .. })
        ));
        assert_eq!(unescape(r"\N{BULLET}"), Err(EscapeError::NamedEscape(0)));
    }
}
