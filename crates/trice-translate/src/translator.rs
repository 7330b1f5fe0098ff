//! The translator: atoms + registry → decoded log lines.

use log::debug;

use trice_id::IdRegistry;
use trice_wire::Atom;

use crate::error::{Result, TranslateError};
use crate::render::render;
use crate::value::decode_params;

/// Host timestamp policy for decoded lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampMode {
    /// No timestamp.
    Off,
    /// Fixed placeholder, for diff-stable output.
    Zero,
    /// UTC wall clock at decode time.
    Utc,
}

impl TimestampMode {
    /// Parse the CLI spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" | "none" => Some(TimestampMode::Off),
            "zero" => Some(TimestampMode::Zero),
            "utc" => Some(TimestampMode::Utc),
            _ => None,
        }
    }

    fn stamp(&self) -> Option<String> {
        match self {
            TimestampMode::Off => None,
            TimestampMode::Zero => Some("0000-00-00T00:00:00Z".to_string()),
            TimestampMode::Utc => Some(trice_id::registry::now_iso8601()),
        }
    }
}

/// A decoded trice: terminal artifact of the decode pipeline,
/// immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Originating atom ID.
    pub id: u16,
    /// Host timestamp, per the configured mode.
    pub timestamp: Option<String>,
    /// Rendered log line, trailing newline trimmed.
    pub line: String,
}

/// Largest payload one logical message may reassemble to. A hostile
/// stream that never clears the MORE flag is cut off here instead of
/// growing the buffer without bound.
pub const MAX_REASSEMBLY: usize = 4096;

/// Stateful atom-to-line translator.
///
/// Owns the registry (loaded once, read-only for the process lifetime)
/// and the reassembly buffer for multi-atom messages: fragments (MORE
/// flag set) accumulate payload until a terminal atom carries the ID
/// that completes the message.
#[derive(Debug)]
pub struct Translator {
    registry: IdRegistry,
    ts: TimestampMode,
    pending: Vec<u8>,
}

impl Translator {
    /// Create a translator over a loaded registry.
    pub fn new(registry: IdRegistry, ts: TimestampMode) -> Self {
        Translator {
            registry,
            ts,
            pending: Vec::new(),
        }
    }

    /// Consume one atom.
    ///
    /// Returns `Ok(None)` for a fragment (message still accumulating),
    /// `Ok(Some(_))` for a completed line. Errors are localized to the
    /// message that failed: any partially accumulated payload is
    /// dropped and the translator is ready for the next atom.
    pub fn translate(&mut self, atom: &Atom) -> Result<Option<Decoded>> {
        if atom.is_fragment() {
            if self.pending.len() + atom.payload.len() > MAX_REASSEMBLY {
                self.pending.clear();
                return Err(TranslateError::ReassemblyOverflow {
                    limit: MAX_REASSEMBLY,
                });
            }
            self.pending.extend_from_slice(&atom.payload);
            debug!("fragment buffered, {} bytes pending", self.pending.len());
            return Ok(None);
        }
        let mut payload = std::mem::take(&mut self.pending);
        payload.extend_from_slice(&atom.payload);

        let entry = self
            .registry
            .lookup(atom.id as u32)
            .ok_or(TranslateError::UnknownId { id: atom.id })?;
        let values = decode_params(&payload, &entry.spec)?;
        let text = render(&entry.fmt, &values)?;
        Ok(Some(Decoded {
            id: atom.id,
            timestamp: self.ts.stamp(),
            line: text.trim_end_matches(['\n', '\r']).to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trice_id::ParamSlot;

    fn registry() -> IdRegistry {
        let mut reg = IdRegistry::new();
        reg.allocate(Some(4242), "Hello %d\\n", vec![ParamSlot::I16], None)
            .unwrap();
        reg.allocate(Some(4300), "blob %s\\n", vec![ParamSlot::Str], None)
            .unwrap();
        reg.allocate(Some(4400), "boot\\n", vec![], None).unwrap();
        reg
    }

    #[test]
    fn renders_registered_atom() {
        let mut t = Translator::new(registry(), TimestampMode::Off);
        let atom = Atom::new(4242, 42i16.to_le_bytes().to_vec(), false);
        let decoded = t.translate(&atom).unwrap().unwrap();
        assert_eq!(decoded.line, "Hello 42");
        assert_eq!(decoded.id, 4242);
        assert!(decoded.timestamp.is_none());
    }

    #[test]
    fn unknown_id_is_localized() {
        let mut t = Translator::new(registry(), TimestampMode::Off);
        let unknown = Atom::new(9999, vec![], false);
        assert!(matches!(
            t.translate(&unknown),
            Err(TranslateError::UnknownId { id: 9999 })
        ));
        // The stream continues: the next atom decodes normally.
        let atom = Atom::new(4242, 7i16.to_le_bytes().to_vec(), false);
        assert_eq!(t.translate(&atom).unwrap().unwrap().line, "Hello 7");
    }

    #[test]
    fn continuation_atoms_reassemble() {
        let mut t = Translator::new(registry(), TimestampMode::Off);
        // "engineering" split across two fragments plus the terminal atom.
        let text = b"engineering";
        let mut full = vec![text.len() as u8];
        full.extend_from_slice(text);
        let (a, rest) = full.split_at(5);
        let (b, c) = rest.split_at(4);

        assert!(t.translate(&Atom::fragment(a.to_vec())).unwrap().is_none());
        assert!(t.translate(&Atom::fragment(b.to_vec())).unwrap().is_none());
        let done = t
            .translate(&Atom::new(4300, c.to_vec(), false))
            .unwrap()
            .unwrap();
        assert_eq!(done.line, "blob engineering");
    }

    #[test]
    fn runaway_fragments_hit_the_reassembly_limit() {
        let mut t = Translator::new(registry(), TimestampMode::Off);
        // A stream that never clears MORE must error instead of
        // buffering forever.
        let mut overflowed = false;
        for _ in 0..1000 {
            match t.translate(&Atom::fragment(vec![0xAA; 31])) {
                Ok(None) => {}
                Err(TranslateError::ReassemblyOverflow { limit }) => {
                    assert_eq!(limit, MAX_REASSEMBLY);
                    overflowed = true;
                    break;
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert!(overflowed, "fragments accumulated past the limit");
        // The overflow is localized: the next message decodes.
        let atom = Atom::new(4242, 9i16.to_le_bytes().to_vec(), false);
        assert_eq!(t.translate(&atom).unwrap().unwrap().line, "Hello 9");
    }

    #[test]
    fn short_payload_drops_partial_message_only() {
        let mut t = Translator::new(registry(), TimestampMode::Off);
        let short = Atom::new(4242, vec![42], false); // needs 2 bytes
        assert!(matches!(
            t.translate(&short),
            Err(TranslateError::ShortPayload { .. })
        ));
        let ok = Atom::new(4400, vec![], false);
        assert_eq!(t.translate(&ok).unwrap().unwrap().line, "boot");
    }

    #[test]
    fn zero_timestamp_is_stable() {
        let mut t = Translator::new(registry(), TimestampMode::Zero);
        let atom = Atom::new(4400, vec![], false);
        let a = t.translate(&atom).unwrap().unwrap();
        let b = t.translate(&atom).unwrap().unwrap();
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.timestamp.as_deref(), Some("0000-00-00T00:00:00Z"));
    }

    #[test]
    fn timestamp_mode_parsing() {
        assert_eq!(TimestampMode::parse("off"), Some(TimestampMode::Off));
        assert_eq!(TimestampMode::parse("none"), Some(TimestampMode::Off));
        assert_eq!(TimestampMode::parse("zero"), Some(TimestampMode::Zero));
        assert_eq!(TimestampMode::parse("utc"), Some(TimestampMode::Utc));
        assert_eq!(TimestampMode::parse("local"), None);
    }
}
