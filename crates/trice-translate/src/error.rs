//! Translation error types.

/// Errors that can occur while translating one atom.
///
/// All of these are localized to the offending atom; the decode
/// pipeline reports them and continues with the next atom.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Atom ID absent from the registry.
    #[error("unknown ID {id}: not in the ID list")]
    UnknownId { id: u16 },

    /// Payload shorter than the parameter layout requires.
    #[error("payload too short for {slot}: need {need} more bytes, have {have}")]
    ShortPayload {
        slot: String,
        need: usize,
        have: usize,
    },

    /// Payload bytes left over after all slots were decoded.
    #[error("{0} trailing payload bytes after the declared parameters")]
    TrailingPayload(usize),

    /// Embedded string parameter is not valid UTF-8.
    #[error("string parameter is not valid UTF-8")]
    BadString,

    /// Format string has more directives than decoded values.
    #[error("format string {fmt:?} expects more parameters than the layout provides")]
    MissingValue { fmt: String },

    /// Continuation fragments exceeded the reassembly limit.
    #[error("message exceeds the {limit}-byte reassembly limit")]
    ReassemblyOverflow { limit: usize },
}

/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, TranslateError>;
