//! Line sinks and line composition.
//!
//! `LineWriter` is the single seam every destination implements: the
//! local terminal, a test buffer, or the remote display client. The
//! composer turns a decoded trice into the final text line using the
//! immutable per-run configuration (prefix, suffix, color handling) —
//! passed in at construction, never read from global state.

use std::io::Write;

use trice_translate::Decoded;

use crate::error::Result;

/// Destination for rendered log lines.
pub trait LineWriter: Send {
    /// Deliver one complete line (no trailing newline).
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Color handling policy.
///
/// Palette rendering itself lives outside the core; this value only
/// decides what happens to a leading `channel:` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Keep the channel tag for a downstream renderer.
    Default,
    /// Strip the channel tag, keep the message.
    None,
    /// Pass lines through untouched.
    Off,
}

impl ColorMode {
    /// Parse the CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(ColorMode::Default),
            "none" => Some(ColorMode::None),
            "off" => Some(ColorMode::Off),
            _ => None,
        }
    }
}

/// Immutable per-run emit configuration.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Text prepended to every line.
    pub prefix: String,
    /// Text appended to every line.
    pub suffix: String,
    pub color: ColorMode,
}

impl Default for EmitConfig {
    fn default() -> Self {
        EmitConfig {
            prefix: String::new(),
            suffix: String::new(),
            color: ColorMode::Default,
        }
    }
}

/// Compose the final text line for a decoded trice.
pub fn compose(cfg: &EmitConfig, decoded: &Decoded) -> String {
    let body = match cfg.color {
        ColorMode::None => strip_channel(&decoded.line),
        ColorMode::Default | ColorMode::Off => decoded.line.as_str(),
    };
    let mut out = String::with_capacity(body.len() + 24);
    out.push_str(&cfg.prefix);
    if let Some(ts) = &decoded.timestamp {
        out.push_str(ts);
        out.push(' ');
    }
    out.push_str(body);
    out.push_str(&cfg.suffix);
    out
}

/// Strip a leading `channel:` tag (short lowercase word) if present.
fn strip_channel(line: &str) -> &str {
    if let Some((tag, rest)) = line.split_once(':') {
        let is_tag = !tag.is_empty()
            && tag.len() <= 8
            && tag.chars().all(|c| c.is_ascii_lowercase());
        if is_tag {
            return rest;
        }
    }
    line
}

/// Sink writing lines to any `io::Write` destination.
pub struct LocalDisplay<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> LocalDisplay<W> {
    pub fn new(out: W) -> Self {
        LocalDisplay { out }
    }

    /// Give back the underlying writer, for tests.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> LineWriter for LocalDisplay<W> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}
