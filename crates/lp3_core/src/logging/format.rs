//! Positional message formatting
//!
//! Log call sites use printf/boost style format strings:
//!
//! - `%%` is a literal percent sign
//! - `%N%` substitutes the N-th argument (1-based) and may repeat
//! - `%[flags][width][.precision][length]conv` substitutes the next argument,
//!   where `conv` is one of `d i u s f F g G e E x X o c p`
//! - `%N$[flags][width][.precision][length]conv` substitutes the N-th argument
//!
//! Arguments are rendered with `Display`. Width, precision and the `-`, `0`,
//! `+` and space flags are honored. The `#` flag and the length modifiers
//! (`h`, `l`, `ll`, `z`, `j`, `t`, `L`) are accepted and ignored, and the
//! conversion letter only marks the end of the placeholder. Every argument
//! must be consumed.

use std::fmt::{self, Display, Write};

use thiserror::Error;

const CONVERSIONS: &str = "diusfFgGeExXocp";
const NUMERIC_CONVERSIONS: &str = "diufFgGeE";
const LENGTH_MODIFIERS: &[u8] = b"hlzjtL";

/// Why a format string could not be rendered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The format string ends in the middle of a placeholder
    #[error("unterminated placeholder at byte {offset}")]
    DanglingPercent {
        /// Byte offset of the `%`
        offset: usize,
    },

    /// A placeholder ends with an unsupported character
    #[error("unknown conversion '{conversion}' at byte {offset}")]
    UnknownConversion {
        /// The offending character
        conversion: char,
        /// Byte offset of the `%`
        offset: usize,
    },

    /// A positional reference used index 0
    #[error("positional index must start at 1 (byte {offset})")]
    BadPositional {
        /// Byte offset of the `%`
        offset: usize,
    },

    /// Fewer arguments than placeholders
    #[error("expected {needed} argument(s), got {supplied}")]
    TooFewArguments {
        /// Arguments referenced by the format string
        needed: usize,
        /// Arguments passed
        supplied: usize,
    },

    /// More arguments than placeholders
    #[error("only {needed} argument(s) used, got {supplied}")]
    TooManyArguments {
        /// Arguments referenced by the format string
        needed: usize,
        /// Arguments passed
        supplied: usize,
    },
}

#[derive(Debug, Default, Clone, Copy)]
struct FieldFormat {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    numeric: bool,
    width: usize,
    precision: Option<usize>,
}

enum Placeholder {
    Percent,
    Positional(usize, FieldFormat),
    Next(FieldFormat),
}

/// Substitute `args` into `format`
///
/// # Errors
/// Returns a [`FormatError`] if the format string is malformed or the number
/// of arguments does not match its placeholders.
pub fn format_message(format: &str, args: &[&dyn Display]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(format.len() + args.len() * 8);
    let mut next = 0;
    let mut needed = 0;
    let mut rest = format;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let offset = format.len() - rest.len() + start;
        let (placeholder, consumed) = parse_placeholder(&rest[start + 1..], offset)?;
        rest = &rest[start + 1 + consumed..];

        match placeholder {
            Placeholder::Percent => out.push('%'),
            Placeholder::Positional(index, field) => {
                needed = needed.max(index);
                if let Some(arg) = args.get(index - 1) {
                    render(&mut out, *arg, field);
                }
            }
            Placeholder::Next(field) => {
                next += 1;
                needed = needed.max(next);
                if let Some(arg) = args.get(next - 1) {
                    render(&mut out, *arg, field);
                }
            }
        }
    }
    out.push_str(rest);

    match needed.cmp(&args.len()) {
        std::cmp::Ordering::Greater => {
            Err(FormatError::TooFewArguments { needed, supplied: args.len() })
        }
        std::cmp::Ordering::Less => {
            Err(FormatError::TooManyArguments { needed, supplied: args.len() })
        }
        std::cmp::Ordering::Equal => Ok(out),
    }
}

/// Substitute `args` into `format`, falling back to the raw format string
/// with an error marker if that fails
pub fn format_or_degrade(format: &str, args: &[&dyn Display]) -> String {
    format_message(format, args).unwrap_or_else(|err| degraded(format, &err))
}

/// Best-effort line used when formatting fails
pub fn degraded(format: &str, err: &FormatError) -> String {
    format!("{format} [format error: {err}]")
}

/// Parse the text after a `%`, returning the placeholder and the number of
/// bytes it spans.
fn parse_placeholder(text: &str, offset: usize) -> Result<(Placeholder, usize), FormatError> {
    let bytes = text.as_bytes();
    let mut pos = 0;

    match bytes.first() {
        None => return Err(FormatError::DanglingPercent { offset }),
        Some(b'%') => return Ok((Placeholder::Percent, 1)),
        _ => {}
    }

    let mut position = None;
    if let Some(index) = take_number(bytes, &mut pos) {
        match bytes.get(pos) {
            Some(b'%' | b'$') if index == 0 => {
                return Err(FormatError::BadPositional { offset });
            }
            Some(b'%') => {
                return Ok((Placeholder::Positional(index, FieldFormat::default()), pos + 1));
            }
            Some(b'$') => {
                position = Some(index);
                pos += 1;
            }
            _ => pos = 0,
        }
    }

    let mut field = FieldFormat::default();
    while let Some(&flag) = bytes.get(pos) {
        match flag {
            b'-' => field.left = true,
            b'0' => field.zero = true,
            b'+' => field.plus = true,
            b' ' => field.space = true,
            b'#' => {}
            _ => break,
        }
        pos += 1;
    }
    field.width = take_number(bytes, &mut pos).unwrap_or(0);

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        field.precision = Some(take_number(bytes, &mut pos).unwrap_or(0));
    }

    while bytes.get(pos).is_some_and(|b| LENGTH_MODIFIERS.contains(b)) {
        pos += 1;
    }

    match text[pos..].chars().next() {
        None => Err(FormatError::DanglingPercent { offset }),
        Some(conversion) if CONVERSIONS.contains(conversion) => {
            field.numeric = NUMERIC_CONVERSIONS.contains(conversion);
            let consumed = pos + conversion.len_utf8();
            let placeholder = match position {
                Some(index) => Placeholder::Positional(index, field),
                None => Placeholder::Next(field),
            };
            Ok((placeholder, consumed))
        }
        Some(conversion) => Err(FormatError::UnknownConversion { conversion, offset }),
    }
}

fn take_number(bytes: &[u8], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    let mut value: usize = 0;
    while let Some(digit) = bytes.get(*pos).filter(|b| b.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add(usize::from(digit - b'0'));
        *pos += 1;
    }
    (*pos > start).then_some(value)
}

fn render(out: &mut String, arg: &dyn Display, field: FieldFormat) {
    let mut text = String::new();
    // A Display impl that errors just leaves its partial output behind.
    let _: fmt::Result = match (field.plus, field.precision) {
        (false, None) => write!(text, "{arg}"),
        (true, None) => write!(text, "{arg:+}"),
        (false, Some(p)) => write!(text, "{arg:.p$}"),
        (true, Some(p)) => write!(text, "{arg:+.p$}"),
    };
    if field.space && field.numeric && !text.starts_with(['+', '-']) {
        text.insert(0, ' ');
    }

    let fill = field.width.saturating_sub(text.chars().count());
    if field.left {
        out.push_str(&text);
        pad(out, ' ', fill);
    } else if field.zero {
        let sign = usize::from(text.starts_with(['+', '-', ' ']));
        out.push_str(&text[..sign]);
        pad(out, '0', fill);
        out.push_str(&text[sign..]);
    } else {
        pad(out, ' ', fill);
        out.push_str(&text);
    }
}

fn pad(out: &mut String, fill: char, count: usize) {
    for _ in 0..count {
        out.push(fill);
    }
}

/// Render `value` with `Display`, keeping whatever it wrote if it fails
pub fn display_lossy(value: &dyn Display) -> String {
    let mut text = String::new();
    let _: fmt::Result = write!(text, "{value}");
    text
}
