//! Display distribution and the online decode pipeline.
//!
//! Decoded lines either go to the local process's own text sink or
//! across a TCP connection to a separate, possibly long-lived display
//! server process. The pipeline module wires transport, cipher,
//! framer, and translator together as a producer/consumer chain over
//! bounded queues, so a slow display applies backpressure to framing
//! instead of dropping lines.

pub mod error;
pub mod line;
pub mod net;
pub mod pipeline;
pub mod remote;
pub mod server;

pub use error::{EmitError, Result};
pub use line::{compose, ColorMode, EmitConfig, LineWriter, LocalDisplay};
pub use pipeline::{run_pipeline, PipelineReport};
pub use remote::{send_shutdown, RemoteDisplay};
pub use server::DisplayServer;
