//! Resynchronizing atom framer.
//!
//! A push-based state machine that turns an untrusted byte stream into
//! validated atoms. Feed it chunks as the transport delivers them; it
//! buffers an incomplete atom across chunk boundaries and resumes when
//! more bytes arrive, so a stream that ends mid-atom simply parks the
//! framer until the transport produces the rest.
//!
//! Corruption recovery is local and cheap: any validation failure
//! discards exactly one byte and rescans, so a finite corrupted input
//! is always consumed in time proportional to its length and no atom
//! is ever emitted twice.

use log::debug;

use crate::atom::{self, Atom, Disc, Framing, SYNC_SENTINEL, WRAP_MARKER};

/// Stateful scanner producing atoms from raw bytes.
#[derive(Debug)]
pub struct Framer {
    framing: Framing,
    buf: Vec<u8>,
    /// Bare mode only: whether the sync sentinel has been seen and no
    /// corruption observed since.
    synced: bool,
    resyncs: u64,
}

impl Framer {
    /// Create a framer for the given framing family.
    pub fn new(framing: Framing) -> Self {
        Framer {
            framing,
            buf: Vec::new(),
            synced: false,
            resyncs: 0,
        }
    }

    /// Feed a chunk of raw bytes, returning every atom that completed.
    ///
    /// Returns an empty vector when the chunk left the framer mid-atom
    /// or still seeking alignment; the buffered prefix is retained for
    /// the next call.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Atom> {
        self.buf.extend_from_slice(bytes);
        let mut out = Vec::new();
        match self.framing {
            Framing::Bare => self.drain_bare(&mut out),
            Framing::Wrap => self.drain_wrap(&mut out),
        }
        out
    }

    /// How many byte-discarding resynchronizations have occurred.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Bare mode: whether stream alignment is currently established.
    pub fn synced(&self) -> bool {
        self.synced
    }

    /// Bytes buffered toward an incomplete atom or pending alignment.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn drain_bare(&mut self, out: &mut Vec<Atom>) {
        loop {
            if !self.synced {
                // SEEKING_SYNC: discard until the sentinel sits at the
                // current offset.
                while self.buf.len() >= SYNC_SENTINEL.len() {
                    if self.buf[..4] == SYNC_SENTINEL {
                        self.buf.drain(..4);
                        self.synced = true;
                        break;
                    }
                    self.buf.drain(..1);
                }
                if !self.synced {
                    return;
                }
            }

            // Periodic sentinels between atoms are consumed silently.
            // A 3-byte all-0x16 prefix is ambiguous (sentinel prefix vs
            // atom header), so wait for the deciding byte.
            if self.buf.len() >= 4 && self.buf[..4] == SYNC_SENTINEL {
                self.buf.drain(..4);
                continue;
            }
            if self.buf.len() < 4 && self.buf.iter().all(|&b| b == 0x16) && !self.buf.is_empty() {
                return;
            }

            if self.buf.len() < atom::HEADER_SIZE {
                return; // ACCUMULATING: header incomplete.
            }
            let disc = match Disc::from_byte(self.buf[2]) {
                Ok(d) => d,
                Err(e) => {
                    debug!("bare framer desync: {e}");
                    self.step_resync();
                    continue;
                }
            };
            let total = atom::HEADER_SIZE + disc.len();
            if self.buf.len() < total {
                return; // ACCUMULATING: payload incomplete.
            }
            // ATOM_READY: header valid and payload fully present.
            let id = u16::from_be_bytes([self.buf[0], self.buf[1]]);
            let payload = self.buf[atom::HEADER_SIZE..total].to_vec();
            self.buf.drain(..total);
            out.push(Atom { id, disc, payload });
        }
    }

    fn drain_wrap(&mut self, out: &mut Vec<Atom>) {
        loop {
            // SEEKING_SYNC: discard until the envelope marker sits at
            // the current offset.
            while !self.buf.is_empty() && self.buf[0] != WRAP_MARKER {
                self.buf.drain(..1);
            }
            if self.buf.len() < 3 {
                return; // marker + length + checksum incomplete.
            }
            let len = self.buf[1] as usize;
            if len < atom::HEADER_SIZE || len > atom::HEADER_SIZE + atom::MAX_PAYLOAD {
                self.step_resync();
                continue;
            }
            let total = 3 + len;
            if self.buf.len() < total {
                return; // ACCUMULATING.
            }
            // ATOM_READY: validate checksum, then the inner atom.
            let inner = &self.buf[3..total];
            let crc = atom::xor_checksum(inner);
            if crc != self.buf[2] {
                debug!(
                    "wrap envelope checksum mismatch: expected 0x{:02x}, got 0x{crc:02x}",
                    self.buf[2]
                );
                self.step_resync();
                continue;
            }
            match Atom::from_bare_bytes(inner) {
                Ok((a, consumed)) if consumed == len => {
                    self.buf.drain(..total);
                    out.push(a);
                }
                _ => {
                    // Declared envelope length disagrees with the inner
                    // atom's own length, or the header is invalid.
                    self.step_resync();
                }
            }
        }
    }

    /// ERROR_RESYNC: discard one byte and rescan. The single-byte step
    /// is what guarantees forward progress under arbitrary corruption.
    fn step_resync(&mut self) {
        self.buf.drain(..1);
        self.synced = false;
        self.resyncs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_stream(atoms: &[Atom]) -> Vec<u8> {
        let mut v = SYNC_SENTINEL.to_vec();
        for a in atoms {
            v.extend_from_slice(&a.to_bare_bytes());
        }
        v
    }

    #[test]
    fn bare_single_atom() {
        let atom = Atom::new(4242, vec![0, 42], false);
        let mut framer = Framer::new(Framing::Bare);
        let got = framer.push(&bare_stream(std::slice::from_ref(&atom)));
        assert_eq!(got, vec![atom]);
    }

    #[test]
    fn bare_requires_sentinel_first() {
        let atom = Atom::new(4242, vec![1], false);
        let mut framer = Framer::new(Framing::Bare);
        // No sentinel: nothing may be emitted.
        let got = framer.push(&atom.to_bare_bytes());
        assert!(got.is_empty());
        assert!(!framer.synced());
    }

    #[test]
    fn bare_atoms_across_chunk_boundary() {
        let atom = Atom::new(1000, vec![1, 2, 3, 4, 5], false);
        let stream = bare_stream(std::slice::from_ref(&atom));
        let mut framer = Framer::new(Framing::Bare);
        // Deliver one byte at a time; the atom completes exactly once.
        let mut got = Vec::new();
        for b in &stream {
            got.extend(framer.push(std::slice::from_ref(b)));
        }
        assert_eq!(got, vec![atom]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn bare_parks_mid_atom() {
        let atom = Atom::new(1000, vec![9; 8], false);
        let stream = bare_stream(std::slice::from_ref(&atom));
        let mut framer = Framer::new(Framing::Bare);
        let cut = stream.len() - 3;
        assert!(framer.push(&stream[..cut]).is_empty());
        assert!(framer.pending() > 0);
        let got = framer.push(&stream[cut..]);
        assert_eq!(got, vec![atom]);
    }

    #[test]
    fn bare_leading_garbage_then_sync() {
        let atom = Atom::new(777, vec![0xAB], false);
        let mut stream = vec![1, 1, 1, 1];
        stream.extend_from_slice(&bare_stream(std::slice::from_ref(&atom)));
        let mut framer = Framer::new(Framing::Bare);
        let got = framer.push(&stream);
        assert_eq!(got, vec![atom]);
    }

    #[test]
    fn bare_corrupt_header_resyncs_on_next_sentinel() {
        let good = Atom::new(300, vec![7, 7], false);
        let mut stream = SYNC_SENTINEL.to_vec();
        stream.extend_from_slice(&[0x01, 0x02, 0x7F]); // reserved bits set
        stream.extend_from_slice(&bare_stream(std::slice::from_ref(&good)));
        let mut framer = Framer::new(Framing::Bare);
        let got = framer.push(&stream);
        assert_eq!(got, vec![good]);
        assert!(framer.resyncs() > 0);
    }

    #[test]
    fn bare_periodic_sentinels_consumed() {
        let a = Atom::new(258, vec![], false);
        let b = Atom::new(259, vec![5], false);
        let mut stream = bare_stream(std::slice::from_ref(&a));
        stream.extend_from_slice(&SYNC_SENTINEL);
        stream.extend_from_slice(&b.to_bare_bytes());
        let mut framer = Framer::new(Framing::Bare);
        let got = framer.push(&stream);
        assert_eq!(got, vec![a, b]);
    }

    #[test]
    fn resync_terminates_on_arbitrary_garbage() {
        // Pseudo-random finite garbage must be fully consumed with the
        // framer left seeking, never looping or hoarding bytes.
        let mut garbage = Vec::with_capacity(4096);
        let mut x: u32 = 0x2545_F491;
        for _ in 0..4096 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            garbage.push((x & 0xFF) as u8);
        }
        for framing in [Framing::Bare, Framing::Wrap] {
            let mut framer = Framer::new(framing);
            let _ = framer.push(&garbage);
            // Whatever remains buffered is smaller than one max atom.
            assert!(framer.pending() <= 3 + atom::HEADER_SIZE + atom::MAX_PAYLOAD);
        }
    }

    #[test]
    fn wrap_single_atom() {
        let atom = Atom::new(4242, vec![0, 42], false);
        let mut framer = Framer::new(Framing::Wrap);
        let got = framer.push(&atom.to_wrap_bytes());
        assert_eq!(got, vec![atom]);
    }

    #[test]
    fn wrap_bad_checksum_dropped_next_envelope_survives() {
        let bad = Atom::new(100, vec![1, 2, 3], false);
        let good = Atom::new(200, vec![4, 5], false);
        let mut stream = bad.to_wrap_bytes();
        stream[2] ^= 0xFF; // corrupt the checksum
        stream.extend_from_slice(&good.to_wrap_bytes());
        let mut framer = Framer::new(Framing::Wrap);
        let got = framer.push(&stream);
        assert_eq!(got, vec![good]);
        assert!(framer.resyncs() > 0);
    }

    #[test]
    fn wrap_parks_mid_envelope() {
        let atom = Atom::new(100, vec![1, 2, 3, 4], false);
        let wire = atom.to_wrap_bytes();
        let mut framer = Framer::new(Framing::Wrap);
        assert!(framer.push(&wire[..5]).is_empty());
        let got = framer.push(&wire[5..]);
        assert_eq!(got, vec![atom]);
    }

    #[test]
    fn wrap_interleaved_garbage() {
        let a = Atom::new(300, vec![1], false);
        let b = Atom::new(301, vec![2], false);
        let mut stream = vec![0x00, 0xFF, 0x17];
        stream.extend_from_slice(&a.to_wrap_bytes());
        stream.extend_from_slice(&[0xEB, 0x00]); // bogus short envelope
        stream.extend_from_slice(&b.to_wrap_bytes());
        let mut framer = Framer::new(Framing::Wrap);
        let got = framer.push(&stream);
        assert_eq!(got, vec![a, b]);
    }
}
