//! Wire protocol layer for trice.
//!
//! Converts an untrusted, possibly encrypted byte stream into validated
//! trice atoms. Three pieces:
//! - **Cipher layer** — optional XTEA block decryption before framing.
//! - **Atom framer** — resynchronizing state machine over raw bytes.
//! - **Atom model** — the smallest decodable protocol unit, in two
//!   framing families (bare and wrap).
//!
//! The framer is push-based: feed it byte chunks as the transport
//! delivers them and collect the atoms that complete. It never blocks
//! and never panics on corrupt input; a malformed region costs one
//! discarded byte per step, guaranteeing forward progress.

pub mod atom;
pub mod cipher;
pub mod error;
pub mod framer;
pub mod source;

pub use atom::{Atom, Disc, Framing, SYNC_SENTINEL, WRAP_MARKER};
pub use cipher::Xtea;
pub use error::{Result, WireError};
pub use framer::Framer;
pub use source::SimSource;
