//! The online decode pipeline.
//!
//! Three stages connected by bounded queues:
//!
//! ```text
//! transport read + decrypt + frame  ->  translate + compose  ->  sink
//!        (reader thread)                (translator thread)    (caller)
//! ```
//!
//! Bounded queues make backpressure structural: a slow sink stalls the
//! translator, which stalls the reader, which stops pulling from the
//! transport. Nothing is dropped between stages. Per-message decode
//! failures (unknown ID, short payload) are counted and logged, never
//! fatal; transport and sink failures end the run.

use std::io::{ErrorKind, Read};
use std::sync::mpsc::sync_channel;
use std::thread;

use log::{debug, warn};

use trice_translate::{TranslateError, Translator};
use trice_wire::{Framer, Framing, Xtea};

use crate::error::{EmitError, Result};
use crate::line::{compose, EmitConfig, LineWriter};

/// Capacity of each inter-stage queue, in items.
const QUEUE_DEPTH: usize = 64;

/// Transport read chunk size.
const READ_CHUNK: usize = 4096;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Atoms the framer produced.
    pub atoms: u64,
    /// Lines delivered to the sink.
    pub lines: u64,
    /// Framer resynchronizations (corruption events).
    pub resyncs: u64,
    /// Atoms whose ID the registry does not know.
    pub registry_misses: u64,
    /// Atoms that failed payload decoding or rendering.
    pub decode_errors: u64,
}

struct ReaderStats {
    atoms: u64,
    resyncs: u64,
}

/// Run the full decode pipeline until the transport reaches
/// end-of-stream, delivering every line to `sink` in stream order.
pub fn run_pipeline<R: Read + Send + 'static>(
    mut source: R,
    framing: Framing,
    mut cipher: Option<Xtea>,
    mut translator: Translator,
    sink: &mut dyn LineWriter,
    cfg: &EmitConfig,
) -> Result<PipelineReport> {
    let (atom_tx, atom_rx) = sync_channel(QUEUE_DEPTH);
    let (line_tx, line_rx) = sync_channel::<String>(QUEUE_DEPTH);
    let cfg = cfg.clone();

    let reader = thread::spawn(move || -> Result<ReaderStats> {
        let mut framer = Framer::new(framing);
        let mut atoms = 0u64;
        let mut buf = [0u8; READ_CHUNK];
        'transport: loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let plain = match cipher.as_mut() {
                Some(c) => c.decrypt(&buf[..n]),
                None => buf[..n].to_vec(),
            };
            for atom in framer.push(&plain) {
                atoms += 1;
                if atom_tx.send(atom).is_err() {
                    // Downstream gone; a sink failure is already being
                    // reported on the caller's side.
                    break 'transport;
                }
            }
        }
        debug!("transport drained: {atoms} atoms, {} resyncs", framer.resyncs());
        Ok(ReaderStats {
            atoms,
            resyncs: framer.resyncs(),
        })
    });

    let translate = thread::spawn(move || -> (u64, u64) {
        let mut misses = 0u64;
        let mut decode_errors = 0u64;
        for atom in atom_rx {
            match translator.translate(&atom) {
                Ok(Some(decoded)) => {
                    if line_tx.send(compose(&cfg, &decoded)).is_err() {
                        break;
                    }
                }
                Ok(None) => {} // fragment, message still accumulating
                Err(TranslateError::UnknownId { id }) => {
                    misses += 1;
                    warn!("atom with unregistered ID {id} skipped");
                }
                Err(e) => {
                    decode_errors += 1;
                    warn!("atom {} undecodable: {e}", atom.id);
                }
            }
        }
        (misses, decode_errors)
    });

    let mut lines = 0u64;
    let mut sink_err = None;
    for line in line_rx {
        match sink.write_line(&line) {
            Ok(()) => lines += 1,
            Err(e) => {
                sink_err = Some(e);
                break;
            }
        }
    }
    // Leaving the loop drops the receiver, which unwinds the upstream
    // stages through their failed sends.

    let stats = reader
        .join()
        .map_err(|_| EmitError::StagePanicked { stage: "reader" })??;
    let (registry_misses, decode_errors) = translate
        .join()
        .map_err(|_| EmitError::StagePanicked { stage: "translator" })?;
    if let Some(e) = sink_err {
        return Err(e);
    }

    Ok(PipelineReport {
        atoms: stats.atoms,
        lines,
        resyncs: stats.resyncs,
        registry_misses,
        decode_errors,
    })
}
