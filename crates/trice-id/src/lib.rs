//! ID registry and allocation engine for trice.
//!
//! The registry is the single source of truth translating numeric
//! trace IDs to meaning: each entry holds the format string and the
//! ordered parameter layout for one ID. The decode side loads it once
//! per process and treats it as read-only; the offline allocation
//! engine scans firmware source trees for trace call sites, assigns
//! globally-unique IDs, rewrites the call sites in place, and persists
//! the updated list.
//!
//! Concurrent allocation runs against one ID list are externally
//! serialized by the operator; this crate takes no lock and documents
//! last-writer-wins as unacceptable only because such runs must not
//! happen at all.

pub mod error;
pub mod param;
pub mod registry;
pub mod scan;
pub mod update;
pub mod zero;

pub use error::{IdError, Result};
pub use param::{infer_spec, MacroKind, ParamSlot};
pub use registry::{IdRegistry, RegistryEntry, ID_CEIL, ID_FLOOR, SYNC_ID};
pub use scan::{scan_tree, CallSite};
pub use update::{update_tree, PlannedChange, UpdateReport};
pub use zero::{zero_tree, ZeroReport};
