//! The trice atom: the smallest decodable unit of the wire protocol.
//!
//! An atom is `[id: u16 BE][disc: u8][payload: 0..=31 bytes]`. The
//! discriminator byte carries the payload length in its low five bits
//! and the MORE flag ("more data follows") in bit 7; bits 5 and 6 are
//! reserved and must be zero. Atoms travel in one of two framing
//! families selected per transport: *bare* (self-delimiting after a
//! sync sentinel) or *wrap* (a length/checksum envelope for noisy
//! links).

use crate::error::{Result, WireError};

/// Bare-mode sync sentinel the firmware emits to establish alignment.
pub const SYNC_SENTINEL: [u8; 4] = [0x16, 0x16, 0x16, 0x16];

/// Wrap-mode envelope start marker.
pub const WRAP_MARKER: u8 = 0xEB;

/// Size of an atom header (id + discriminator).
pub const HEADER_SIZE: usize = 3;

/// Largest payload a single atom can carry.
pub const MAX_PAYLOAD: usize = 31;

const MORE_BIT: u8 = 0x80;
const RESERVED_BITS: u8 = 0x60;
const LEN_BITS: u8 = 0x1F;

/// Framing family of a byte stream.
///
/// Carried as an explicit tagged variant rather than inferred from raw
/// bytes: each variant owns its own validation rules in the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Self-delimiting atoms after a sync sentinel.
    Bare,
    /// Length/checksum envelope around each atom.
    Wrap,
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::Bare => write!(f, "bare"),
            Framing::Wrap => write!(f, "wrap"),
        }
    }
}

/// Decoded discriminator byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disc {
    len: u8,
    more: bool,
}

impl Disc {
    /// Build a discriminator for a payload length and continuation flag.
    ///
    /// # Panics
    ///
    /// Panics if `len > MAX_PAYLOAD`; callers encode only payloads the
    /// protocol can carry.
    pub fn new(len: usize, more: bool) -> Self {
        assert!(len <= MAX_PAYLOAD, "payload exceeds atom capacity");
        Disc {
            len: len as u8,
            more,
        }
    }

    /// Parse a raw discriminator byte, rejecting reserved bits.
    pub fn from_byte(b: u8) -> Result<Self> {
        if b & RESERVED_BITS != 0 {
            return Err(WireError::InvalidDisc { disc: b });
        }
        Ok(Disc {
            len: b & LEN_BITS,
            more: b & MORE_BIT != 0,
        })
    }

    /// Declared payload length.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the declared payload length is zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether more atoms follow before the logical message completes.
    pub fn more(&self) -> bool {
        self.more
    }

    /// Raw wire byte.
    pub fn to_byte(&self) -> u8 {
        self.len | if self.more { MORE_BIT } else { 0 }
    }
}

/// A validated protocol atom.
///
/// Invariant: `payload.len() == disc.len()`. Enforced by [`Atom::new`]
/// and by the framer, which never emits an atom whose declared length
/// disagrees with the bytes present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Numeric ID resolved against the ID registry. Zero on
    /// continuation fragments.
    pub id: u16,
    /// Length/type discriminator.
    pub disc: Disc,
    /// Packed parameter bytes.
    pub payload: Vec<u8>,
}

impl Atom {
    /// Create an atom, deriving the discriminator from the payload.
    pub fn new(id: u16, payload: Vec<u8>, more: bool) -> Self {
        let disc = Disc::new(payload.len(), more);
        Atom { id, disc, payload }
    }

    /// A continuation fragment carrying payload bytes only.
    pub fn fragment(payload: Vec<u8>) -> Self {
        Atom::new(0, payload, true)
    }

    /// Whether this atom continues into a following atom.
    pub fn is_fragment(&self) -> bool {
        self.disc.more()
    }

    /// Serialize without any outer framing (header + payload).
    pub fn to_bare_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.id.to_be_bytes());
        out.push(self.disc.to_byte());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Serialize inside a wrap envelope (marker + length + checksum).
    pub fn to_wrap_bytes(&self) -> Vec<u8> {
        let inner = self.to_bare_bytes();
        let mut out = Vec::with_capacity(3 + inner.len());
        out.push(WRAP_MARKER);
        out.push(inner.len() as u8);
        out.push(xor_checksum(&inner));
        out.extend_from_slice(&inner);
        out
    }

    /// Parse one atom from the start of `bytes`.
    ///
    /// Returns the atom and the number of bytes consumed. Fails if the
    /// header is invalid or `bytes` holds fewer payload bytes than the
    /// discriminator declares.
    pub fn from_bare_bytes(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(WireError::LengthMismatch {
                declared: HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let id = u16::from_be_bytes([bytes[0], bytes[1]]);
        let disc = Disc::from_byte(bytes[2])?;
        let total = HEADER_SIZE + disc.len();
        if bytes.len() < total {
            return Err(WireError::LengthMismatch {
                declared: disc.len(),
                actual: bytes.len() - HEADER_SIZE,
            });
        }
        let payload = bytes[HEADER_SIZE..total].to_vec();
        Ok((Atom { id, disc, payload }, total))
    }
}

/// XOR checksum over the inner atom bytes of a wrap envelope.
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_round_trip() {
        let d = Disc::new(17, true);
        let parsed = Disc::from_byte(d.to_byte()).unwrap();
        assert_eq!(parsed.len(), 17);
        assert!(parsed.more());
    }

    #[test]
    fn disc_rejects_reserved_bits() {
        assert!(Disc::from_byte(0x20).is_err());
        assert!(Disc::from_byte(0x40).is_err());
        // MORE + max length is fine.
        assert!(Disc::from_byte(0x9F).is_ok());
    }

    #[test]
    fn bare_round_trip() {
        let atom = Atom::new(4242, vec![1, 2, 3, 4], false);
        let bytes = atom.to_bare_bytes();
        let (parsed, consumed) = Atom::from_bare_bytes(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(parsed, atom);
    }

    #[test]
    fn bare_truncated_payload_rejected() {
        let atom = Atom::new(7, vec![9; 10], false);
        let bytes = atom.to_bare_bytes();
        let result = Atom::from_bare_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(WireError::LengthMismatch { .. })));
    }

    #[test]
    fn wrap_envelope_layout() {
        let atom = Atom::new(300, vec![0xAA, 0xBB], false);
        let wire = atom.to_wrap_bytes();
        assert_eq!(wire[0], WRAP_MARKER);
        assert_eq!(wire[1] as usize, HEADER_SIZE + 2);
        assert_eq!(wire[2], xor_checksum(&wire[3..]));
    }

    #[test]
    fn fragment_has_more_set_and_zero_id() {
        let frag = Atom::fragment(vec![1, 2]);
        assert!(frag.is_fragment());
        assert_eq!(frag.id, 0);
    }
}
