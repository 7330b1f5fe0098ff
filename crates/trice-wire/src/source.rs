//! Synthetic byte source.
//!
//! Transports are anything implementing `std::io::Read`: a file,
//! stdin, a TCP stream, a debug-probe pipe. `SimSource` is the
//! in-process variant used by tests and the `sim` source of the CLI:
//! it replays a fixed byte script, optionally in small chunks so the
//! framer's mid-atom parking gets exercised.

use std::io::{self, Read};

/// Replays a byte script as a transport, then signals end-of-stream.
#[derive(Debug)]
pub struct SimSource {
    script: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl SimSource {
    /// Source delivering `script` as fast as the reader pulls it.
    pub fn new(script: Vec<u8>) -> Self {
        SimSource {
            script,
            pos: 0,
            chunk: usize::MAX,
        }
    }

    /// Source delivering at most `chunk` bytes per read call.
    pub fn chunked(script: Vec<u8>, chunk: usize) -> Self {
        assert!(chunk > 0, "chunk size must be nonzero");
        SimSource {
            script,
            pos: 0,
            chunk,
        }
    }
}

impl Read for SimSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.script.len() {
            return Ok(0);
        }
        let n = buf
            .len()
            .min(self.chunk)
            .min(self.script.len() - self.pos);
        buf[..n].copy_from_slice(&self.script[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_then_eof() {
        let mut src = SimSource::new(vec![1, 2, 3]);
        let mut out = Vec::new();
        src.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
        let mut buf = [0u8; 4];
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn chunked_delivery() {
        let mut src = SimSource::chunked(vec![0; 10], 3);
        let mut buf = [0u8; 8];
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(src.read(&mut buf).unwrap(), 3);
        assert_eq!(src.read(&mut buf).unwrap(), 1);
        assert_eq!(src.read(&mut buf).unwrap(), 0);
    }
}
