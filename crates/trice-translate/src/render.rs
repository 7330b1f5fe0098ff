//! Format-string substitution.
//!
//! Decoded values are substituted positionally into the registry
//! entry's `%` directives. Format strings arrive exactly as written in
//! the firmware source, so C escape sequences (`\n`, `\t`, `\"`,
//! `\\`) are interpreted here as well.

use crate::error::{Result, TranslateError};
use crate::value::ParamValue;

/// Substitute `values` into the `%` directives of `fmt`, in order.
pub fn render(fmt: &str, values: &[ParamValue]) -> Result<String> {
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut next = values.iter();
    let unescaped = unescape(fmt);
    let mut chars = unescaped.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        // Find the conversion character, skipping flags/width/length.
        let mut conversion = None;
        for d in chars.by_ref() {
            if d.is_ascii_alphabetic() && !matches!(d, 'l' | 'h' | 'z' | 'j' | 't') {
                conversion = Some(d);
                break;
            }
            if !(d.is_ascii_digit() || matches!(d, '-' | '+' | ' ' | '#' | '.' | 'l' | 'h' | 'z' | 'j' | 't')) {
                out.push('%');
                out.push(d);
                break;
            }
        }
        let Some(conversion) = conversion else {
            continue;
        };
        let value = next.next().ok_or_else(|| TranslateError::MissingValue {
            fmt: fmt.to_string(),
        })?;
        out.push_str(&render_one(conversion, value));
    }
    Ok(out)
}

fn render_one(conversion: char, value: &ParamValue) -> String {
    match (conversion, value) {
        ('d' | 'i' | 'u', ParamValue::Signed(v)) => format!("{v}"),
        ('d' | 'i' | 'u', ParamValue::Unsigned(v)) => format!("{v}"),
        ('x', ParamValue::Unsigned(v)) => format!("{v:x}"),
        ('x', ParamValue::Signed(v)) => format!("{v:x}"),
        ('X', ParamValue::Unsigned(v)) => format!("{v:X}"),
        ('X', ParamValue::Signed(v)) => format!("{v:X}"),
        ('o', ParamValue::Unsigned(v)) => format!("{v:o}"),
        ('b', ParamValue::Unsigned(v)) => format!("{v:b}"),
        ('c', ParamValue::Unsigned(v)) => char::from_u32(*v as u32)
            .map(String::from)
            .unwrap_or_else(|| "\u{FFFD}".to_string()),
        ('f', ParamValue::Float(v)) => format!("{v}"),
        ('s', ParamValue::Text(s)) => s.clone(),
        // Kind mismatch between registry layout and directive: render
        // what we decoded rather than dropping the line.
        (_, ParamValue::Unsigned(v)) => format!("{v}"),
        (_, ParamValue::Signed(v)) => format!("{v}"),
        (_, ParamValue::Float(v)) => format!("{v}"),
        (_, ParamValue::Text(s)) => s.clone(),
    }
}

/// Interpret the C escape sequences a firmware format string carries.
fn unescape(fmt: &str) -> String {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_substitution() {
        let line = render(
            "x=%d y=%u hex=%x",
            &[
                ParamValue::Signed(-5),
                ParamValue::Unsigned(7),
                ParamValue::Unsigned(255),
            ],
        )
        .unwrap();
        assert_eq!(line, "x=-5 y=7 hex=ff");
    }

    #[test]
    fn percent_escape_consumes_no_value() {
        assert_eq!(render("100%% done", &[]).unwrap(), "100% done");
    }

    #[test]
    fn missing_value_is_an_error() {
        assert!(matches!(
            render("a=%d b=%d", &[ParamValue::Signed(1)]),
            Err(TranslateError::MissingValue { .. })
        ));
    }

    #[test]
    fn c_escapes_interpreted() {
        let line = render("tab\\there\\n", &[]).unwrap();
        assert_eq!(line, "tab\there\n");
    }

    #[test]
    fn string_float_and_char() {
        let line = render(
            "%s at %f [%c]",
            &[
                ParamValue::Text("motor".into()),
                ParamValue::Float(2.5),
                ParamValue::Unsigned(b'A' as u64),
            ],
        )
        .unwrap();
        assert_eq!(line, "motor at 2.5 [A]");
    }

    #[test]
    fn width_flags_tolerated() {
        // Width/flags are accepted but not honored.
        let line = render("%08x", &[ParamValue::Unsigned(0xAB)]).unwrap();
        assert_eq!(line, "ab");
    }
}
