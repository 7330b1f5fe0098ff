//! Display connection wire protocol.
//!
//! One frame per message: `[tag: u8][len: u32 BE][payload: len bytes]`.
//! Tag `L` carries a rendered line (UTF-8), tag `Q` the out-of-band
//! shutdown command (empty payload). Lines never exceed
//! [`MAX_LINE_BYTES`]; oversized claims are a protocol error, which
//! keeps a corrupt peer from forcing unbounded allocation.

use std::io::{Read, Write};

use crate::error::{EmitError, Result};

/// A rendered line follows.
pub const TAG_LINE: u8 = b'L';

/// Shutdown command.
pub const TAG_SHUTDOWN: u8 = b'Q';

/// Upper bound on one line's encoded size.
pub const MAX_LINE_BYTES: usize = 1 << 16;

/// One received display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    Shutdown,
}

/// Write one frame.
pub fn write_frame<W: Write>(w: &mut W, tag: u8, payload: &[u8]) -> Result<()> {
    w.write_all(&[tag])?;
    w.write_all(&(payload.len() as u32).to_be_bytes())?;
    w.write_all(payload)?;
    w.flush()?;
    Ok(())
}

/// Read one frame, `Ok(None)` on clean end-of-stream.
pub fn read_frame<R: Read>(r: &mut R) -> Result<Option<Frame>> {
    let mut header = [0u8; 5];
    match r.read_exact(&mut header) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let tag = header[0];
    let len = u32::from_be_bytes(header[1..5].try_into().unwrap()) as usize;
    if len > MAX_LINE_BYTES {
        return Err(EmitError::Protocol {
            detail: format!("frame claims {len} bytes"),
        });
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload)?;
    match tag {
        TAG_LINE => {
            let line = String::from_utf8(payload).map_err(|_| EmitError::Protocol {
                detail: "line frame is not UTF-8".to_string(),
            })?;
            Ok(Some(Frame::Line(line)))
        }
        TAG_SHUTDOWN => Ok(Some(Frame::Shutdown)),
        other => Err(EmitError::Protocol {
            detail: format!("unknown frame tag 0x{other:02x}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, TAG_LINE, "Hello 42".as_bytes()).unwrap();
        write_frame(&mut buf, TAG_SHUTDOWN, &[]).unwrap();

        let mut r = buf.as_slice();
        assert_eq!(read_frame(&mut r).unwrap(), Some(Frame::Line("Hello 42".into())));
        assert_eq!(read_frame(&mut r).unwrap(), Some(Frame::Shutdown));
        assert_eq!(read_frame(&mut r).unwrap(), None);
    }

    #[test]
    fn oversized_claim_rejected() {
        let mut buf = vec![TAG_LINE];
        buf.extend_from_slice(&u32::MAX.to_be_bytes());
        let result = read_frame(&mut buf.as_slice());
        assert!(matches!(result, Err(EmitError::Protocol { .. })));
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b'Z', &[]).unwrap();
        let result = read_frame(&mut buf.as_slice());
        assert!(matches!(result, Err(EmitError::Protocol { .. })));
    }
}
