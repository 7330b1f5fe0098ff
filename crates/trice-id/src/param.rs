//! Parameter layout descriptors and their inference from call sites.
//!
//! A registry entry carries an ordered `ParamSpec`: the typed slots the
//! firmware packs behind one ID. Width comes from the macro name
//! (`TRICE16_2` packs two 16-bit values), signedness from the format
//! directive (`%d` signed, `%u`/`%x` unsigned). The translator trusts
//! this layout strictly and never infers widths from payload size.

use serde::{Deserialize, Serialize};

use crate::error::{IdError, Result};

/// One typed slot of a parameter layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSlot {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    /// u8-length-prefixed byte string.
    Str,
}

impl ParamSlot {
    /// Packed payload bytes this slot consumes, `None` for
    /// variable-length slots.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            ParamSlot::U8 | ParamSlot::I8 => Some(1),
            ParamSlot::U16 | ParamSlot::I16 => Some(2),
            ParamSlot::U32 | ParamSlot::I32 | ParamSlot::F32 => Some(4),
            ParamSlot::U64 | ParamSlot::I64 => Some(8),
            ParamSlot::Str => None,
        }
    }
}

impl std::fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParamSlot::U8 => "u8",
            ParamSlot::I8 => "i8",
            ParamSlot::U16 => "u16",
            ParamSlot::I16 => "i16",
            ParamSlot::U32 => "u32",
            ParamSlot::I32 => "i32",
            ParamSlot::U64 => "u64",
            ParamSlot::I64 => "i64",
            ParamSlot::F32 => "f32",
            ParamSlot::Str => "str",
        };
        write!(f, "{s}")
    }
}

/// Parsed trace macro name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    /// `TRICE0`: format string only, no parameters.
    Plain,
    /// `TRICE{8,16,32,64}_{n}`: `count` values of `width` bits.
    Packed { width: u8, count: u8 },
    /// `TRICE_S`: one runtime string.
    Stringy,
}

impl MacroKind {
    /// Parse a macro name as matched by the call-site scanner.
    pub fn parse(name: &str) -> Option<MacroKind> {
        if name == "TRICE0" {
            return Some(MacroKind::Plain);
        }
        if name == "TRICE_S" {
            return Some(MacroKind::Stringy);
        }
        let rest = name.strip_prefix("TRICE")?;
        let (width, count) = rest.split_once('_')?;
        let width: u8 = width.parse().ok()?;
        let count: u8 = count.parse().ok()?;
        if ![8, 16, 32, 64].contains(&width) || !(1..=8).contains(&count) {
            return None;
        }
        Some(MacroKind::Packed { width, count })
    }
}

/// Conversion characters of the `%` directives in a format string,
/// in order. `%%` escapes are skipped; flags, width, and precision
/// prefixes are tolerated and ignored.
pub fn format_directives(fmt: &str) -> Vec<char> {
    let mut out = Vec::new();
    let mut chars = fmt.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            continue;
        }
        // Skip flags, field width, precision, and length modifiers up
        // to the conversion character.
        for d in chars.by_ref() {
            if d.is_ascii_alphabetic() && !matches!(d, 'l' | 'h' | 'z' | 'j' | 't') {
                out.push(d);
                break;
            }
            if !(d.is_ascii_digit() || matches!(d, '-' | '+' | ' ' | '#' | '.' | 'l' | 'h' | 'z' | 'j' | 't')) {
                break; // malformed directive, not a parameter
            }
        }
    }
    out
}

/// Infer the parameter layout for a call site from its macro name and
/// format string.
pub fn infer_spec(macro_name: &str, fmt: &str) -> Result<Vec<ParamSlot>> {
    let kind = MacroKind::parse(macro_name).ok_or_else(|| IdError::SpecMismatch {
        macro_name: macro_name.to_string(),
        fmt: fmt.to_string(),
        detail: "unknown trace macro".to_string(),
    })?;
    let directives = format_directives(fmt);
    let mismatch = |detail: String| IdError::SpecMismatch {
        macro_name: macro_name.to_string(),
        fmt: fmt.to_string(),
        detail,
    };

    match kind {
        MacroKind::Plain => {
            if !directives.is_empty() {
                return Err(mismatch("TRICE0 takes no parameters".to_string()));
            }
            Ok(Vec::new())
        }
        MacroKind::Stringy => {
            if directives != ['s'] {
                return Err(mismatch("TRICE_S takes exactly one %s".to_string()));
            }
            Ok(vec![ParamSlot::Str])
        }
        MacroKind::Packed { width, count } => {
            if directives.len() != count as usize {
                return Err(mismatch(format!(
                    "{} directives for {count} packed values",
                    directives.len()
                )));
            }
            directives
                .iter()
                .map(|&d| slot_for(width, d).ok_or_else(|| mismatch(format!("directive %{d} unsupported at width {width}"))))
                .collect()
        }
    }
}

fn slot_for(width: u8, directive: char) -> Option<ParamSlot> {
    match directive {
        'd' | 'i' => Some(match width {
            8 => ParamSlot::I8,
            16 => ParamSlot::I16,
            32 => ParamSlot::I32,
            64 => ParamSlot::I64,
            _ => return None,
        }),
        'u' | 'x' | 'X' | 'o' | 'b' | 'c' => Some(match width {
            8 => ParamSlot::U8,
            16 => ParamSlot::U16,
            32 => ParamSlot::U32,
            64 => ParamSlot::U64,
            _ => return None,
        }),
        'f' => (width == 32).then_some(ParamSlot::F32),
        _ => None,
    }
}
