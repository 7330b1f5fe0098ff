//! ID registry and allocation engine error types.

use std::path::PathBuf;

/// Errors that can occur during registry and allocation operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// ID list file exists but is not a structurally valid registry.
    #[error("invalid ID list {path}: {detail}")]
    InvalidIdList { path: PathBuf, detail: String },

    /// No free ID remains in the allocatable range.
    #[error("ID space exhausted: no free ID in {floor}..={ceil}", floor = crate::ID_FLOOR, ceil = crate::ID_CEIL)]
    Exhausted,

    /// Format string and macro arity disagree.
    #[error("format string {fmt:?} does not fit macro {macro_name}: {detail}")]
    SpecMismatch {
        macro_name: String,
        fmt: String,
        detail: String,
    },

    /// Zero mode invoked without an explicit source tree.
    #[error("zero mode requires an explicit, non-empty source tree argument")]
    EmptySourceTree,

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Atomic persist failed mid-rename.
    #[error("failed to persist ID list to {path}: {detail}")]
    Persist { path: PathBuf, detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, IdError>;
