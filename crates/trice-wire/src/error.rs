//! Wire layer error types.

/// Errors that can occur while parsing atoms.
///
/// Deliberately small: the framer recovers from corruption internally
/// (one discarded byte per step) and the cipher layer buffers rather
/// than fails, so only atom-level parsing surfaces errors.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Discriminator byte has reserved bits set.
    #[error("invalid discriminator byte 0x{disc:02x}: reserved bits set")]
    InvalidDisc { disc: u8 },

    /// Declared payload length does not match the bytes present.
    #[error("atom payload length mismatch: declared {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },
}

/// Result type alias for wire layer operations.
pub type Result<T> = std::result::Result<T, WireError>;
