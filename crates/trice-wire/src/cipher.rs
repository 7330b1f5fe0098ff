//! Optional XTEA block decryption ahead of the framer.
//!
//! Firmware builds that encrypt their trace stream apply XTEA (32
//! rounds, 8-byte blocks, little-endian word lanes) per block. The
//! 128-bit key is derived from an operator passphrase: the first 16
//! bytes of SHA-256 over the passphrase text. A passphrase of `"none"`
//! means no cipher layer at all.
//!
//! Decryption is streaming: a trailing partial block is buffered until
//! the transport delivers the rest, never discarded. Block alignment
//! problems are therefore invisible here; any resulting garbage plain
//! text is the framer's to resynchronize over.

use sha2::{Digest, Sha256};

use log::info;

const DELTA: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;
const BLOCK: usize = 8;

/// Streaming XTEA decryptor.
#[derive(Debug, Clone)]
pub struct Xtea {
    key: [u32; 4],
    pending: Vec<u8>,
}

impl Xtea {
    /// Derive a cipher from an operator passphrase.
    ///
    /// Returns `None` for the reserved passphrase `"none"` (cipher
    /// layer disabled). With `show_key` the derived key is emitted once
    /// to the diagnostic log.
    pub fn from_passphrase(passphrase: &str, show_key: bool) -> Option<Self> {
        if passphrase == "none" {
            return None;
        }
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u32; 4];
        for (i, lane) in key.iter_mut().enumerate() {
            *lane = u32::from_le_bytes(digest[i * 4..i * 4 + 4].try_into().unwrap());
        }
        let cipher = Xtea {
            key,
            pending: Vec::new(),
        };
        if show_key {
            info!("derived XTEA key: {}", cipher.key_hex());
        }
        Some(cipher)
    }

    /// Hex rendering of the derived key, for `show_key` diagnostics.
    pub fn key_hex(&self) -> String {
        self.key
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Decrypt every complete block in `input`, buffering the rest.
    ///
    /// Bytes held back from a previous call are prepended, so the
    /// plaintext comes out in stream order with no gaps.
    pub fn decrypt(&mut self, input: &[u8]) -> Vec<u8> {
        self.pending.extend_from_slice(input);
        let whole = self.pending.len() / BLOCK * BLOCK;
        let mut out = Vec::with_capacity(whole);
        for chunk in self.pending[..whole].chunks_exact(BLOCK) {
            let v = [
                u32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                u32::from_le_bytes(chunk[4..8].try_into().unwrap()),
            ];
            let p = self.decipher(v);
            out.extend_from_slice(&p[0].to_le_bytes());
            out.extend_from_slice(&p[1].to_le_bytes());
        }
        self.pending.drain(..whole);
        out
    }

    /// Bytes buffered toward an incomplete trailing block.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Encrypt block-aligned data. Used by tests and the synthetic
    /// source to produce streams the decryptor must invert.
    pub fn encrypt_blocks(&self, data: &[u8]) -> Vec<u8> {
        assert!(data.len() % BLOCK == 0, "encrypt input must be block aligned");
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks_exact(BLOCK) {
            let v = [
                u32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                u32::from_le_bytes(chunk[4..8].try_into().unwrap()),
            ];
            let c = self.encipher(v);
            out.extend_from_slice(&c[0].to_le_bytes());
            out.extend_from_slice(&c[1].to_le_bytes());
        }
        out
    }

    fn encipher(&self, v: [u32; 2]) -> [u32; 2] {
        let k = &self.key;
        let (mut v0, mut v1) = (v[0], v[1]);
        let mut sum: u32 = 0;
        for _ in 0..ROUNDS {
            v0 = v0.wrapping_add(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(k[(sum & 3) as usize])),
            );
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(k[((sum >> 11) & 3) as usize])),
            );
        }
        [v0, v1]
    }

    fn decipher(&self, v: [u32; 2]) -> [u32; 2] {
        let k = &self.key;
        let (mut v0, mut v1) = (v[0], v[1]);
        let mut sum = DELTA.wrapping_mul(ROUNDS);
        for _ in 0..ROUNDS {
            v1 = v1.wrapping_sub(
                (((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0))
                    ^ (sum.wrapping_add(k[((sum >> 11) & 3) as usize])),
            );
            sum = sum.wrapping_sub(DELTA);
            v0 = v0.wrapping_sub(
                (((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1))
                    ^ (sum.wrapping_add(k[(sum & 3) as usize])),
            );
        }
        [v0, v1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_passphrase_disables_cipher() {
        assert!(Xtea::from_passphrase("none", false).is_none());
    }

    #[test]
    fn block_round_trip() {
        let cipher = Xtea::from_passphrase("secret", false).unwrap();
        let plain: Vec<u8> = (0u8..32).collect();
        let wire = cipher.encrypt_blocks(&plain);
        assert_ne!(wire, plain);
        let mut rx = cipher.clone();
        assert_eq!(rx.decrypt(&wire), plain);
    }

    #[test]
    fn partial_block_buffered_until_complete() {
        let cipher = Xtea::from_passphrase("secret", false).unwrap();
        let plain: Vec<u8> = (0u8..16).collect();
        let wire = cipher.encrypt_blocks(&plain);

        let mut rx = cipher.clone();
        // First 11 bytes: one whole block decrypts, 3 bytes held back.
        let first = rx.decrypt(&wire[..11]);
        assert_eq!(first, plain[..8]);
        assert_eq!(rx.pending(), 3);
        let rest = rx.decrypt(&wire[11..]);
        assert_eq!(rest, plain[8..]);
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn key_is_deterministic_per_passphrase() {
        let a = Xtea::from_passphrase("alpha", false).unwrap();
        let b = Xtea::from_passphrase("alpha", false).unwrap();
        let c = Xtea::from_passphrase("beta", false).unwrap();
        assert_eq!(a.key_hex(), b.key_hex());
        assert_ne!(a.key_hex(), c.key_hex());
        assert_eq!(a.key_hex().len(), 32);
    }
}
