//! Translation of validated atoms into rendered log lines.
//!
//! Given an atom and the ID registry, the translator resolves the
//! atom's ID to a registry entry, decodes the packed payload according
//! to the entry's parameter layout, and substitutes the decoded values
//! into the format string positionally. Multi-atom logical messages
//! are reassembled via the MORE flag in the atom discriminator.
//!
//! Registry misses and payload decode failures are localized to one
//! atom: they surface as reported gaps, never stop the stream.

pub mod error;
pub mod render;
pub mod translator;
pub mod value;

pub use error::{Result, TranslateError};
pub use translator::{Decoded, TimestampMode, Translator, MAX_REASSEMBLY};
pub use value::{decode_params, encode_params, ParamValue};
