//! `trice log` — decode a trace stream and display it.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use trice_emit::{
    run_pipeline, ColorMode, EmitConfig, LocalDisplay, PipelineReport, RemoteDisplay,
};
use trice_id::IdRegistry;
use trice_translate::{TimestampMode, Translator};
use trice_wire::atom::MAX_PAYLOAD;
use trice_wire::{Atom, Framing, SimSource, Xtea, SYNC_SENTINEL};

/// Everything `trice log` needs for one run.
pub struct LogOptions {
    pub source: String,
    pub encoding: String,
    pub idlist: PathBuf,
    pub password: String,
    pub show_key: bool,
    pub ts: String,
    pub prefix: String,
    pub suffix: String,
    pub color: String,
    pub ds: bool,
    pub autostart: bool,
    pub ipa: String,
    pub ipp: String,
}

pub fn run(opts: LogOptions) -> Result<()> {
    let framing = parse_framing(&opts.encoding)?;
    let ts = match TimestampMode::parse(&opts.ts) {
        Some(ts) => ts,
        None => bail!("unknown timestamp mode: {} (expected off, zero, utc)", opts.ts),
    };
    let color = match ColorMode::parse(&opts.color) {
        Some(c) => c,
        None => bail!("unknown color mode: {} (expected default, none, off)", opts.color),
    };

    // An ID list of "none" runs registry-less.
    let idlist = (opts.idlist.as_os_str() != "none").then_some(opts.idlist.as_path());
    let registry = IdRegistry::load(idlist)
        .with_context(|| format!("loading {}", opts.idlist.display()))?;
    if registry.is_empty() {
        warn!(
            "{} holds no IDs; every atom will miss the registry",
            opts.idlist.display()
        );
    }
    let cipher = Xtea::from_passphrase(&opts.password, opts.show_key);

    let source: Box<dyn Read + Send> = match opts.source.as_str() {
        "stdin" => Box::new(io::stdin()),
        "sim" => Box::new(SimSource::chunked(
            sim_script(framing, &registry, cipher.as_ref()),
            7,
        )),
        path => Box::new(File::open(path).with_context(|| format!("opening {path}"))?),
    };

    let translator = Translator::new(registry, ts);
    let cfg = EmitConfig {
        prefix: opts.prefix,
        suffix: opts.suffix,
        color,
    };

    let report = if opts.ds || opts.autostart {
        let addr = format!("{}:{}", opts.ipa, opts.ipp);
        let mut sink = if opts.autostart {
            RemoteDisplay::connect_or_spawn(&addr, &opts.ipa, &opts.ipp)?
        } else {
            RemoteDisplay::connect(&addr)?
        };
        run_pipeline(source, framing, cipher, translator, &mut sink, &cfg)?
    } else {
        let mut sink = LocalDisplay::new(io::stdout());
        run_pipeline(source, framing, cipher, translator, &mut sink, &cfg)?
    };

    summarize(&report);
    Ok(())
}

fn parse_framing(s: &str) -> Result<Framing> {
    match s {
        "bare" => Ok(Framing::Bare),
        "wrap" => Ok(Framing::Wrap),
        other => bail!("unknown encoding: {other} (expected bare, wrap)"),
    }
}

fn summarize(report: &PipelineReport) {
    info!(
        "stream finished: {} atoms, {} lines, {} resyncs, {} unknown IDs, {} decode errors",
        report.atoms, report.lines, report.resyncs, report.registry_misses, report.decode_errors
    );
}

/// Synthesize one message per registered ID, with zeroed numeric
/// parameters and a fixed token for string parameters. Oversized
/// payloads are split into continuation fragments, so the sim stream
/// also exercises reassembly.
fn sim_script(framing: Framing, registry: &IdRegistry, cipher: Option<&Xtea>) -> Vec<u8> {
    let mut script = match framing {
        Framing::Bare => SYNC_SENTINEL.to_vec(),
        Framing::Wrap => Vec::new(),
    };

    for (id, entry) in registry.iter() {
        let mut payload = Vec::new();
        for slot in &entry.spec {
            match slot.fixed_size() {
                Some(n) => payload.extend(std::iter::repeat(0u8).take(n)),
                None => {
                    payload.push(3);
                    payload.extend_from_slice(b"sim");
                }
            }
        }

        let mut atoms = Vec::new();
        if payload.len() <= MAX_PAYLOAD {
            atoms.push(Atom::new(id as u16, payload, false));
        } else {
            let terminal_at = (payload.len() - 1) / MAX_PAYLOAD * MAX_PAYLOAD;
            for chunk in payload[..terminal_at].chunks(MAX_PAYLOAD) {
                atoms.push(Atom::fragment(chunk.to_vec()));
            }
            atoms.push(Atom::new(id as u16, payload[terminal_at..].to_vec(), false));
        }
        for atom in &atoms {
            match framing {
                Framing::Bare => script.extend_from_slice(&atom.to_bare_bytes()),
                Framing::Wrap => script.extend_from_slice(&atom.to_wrap_bytes()),
            }
        }
    }

    if let Some(c) = cipher {
        // Pad to block alignment with sync bytes; both framers skip
        // them harmlessly at end of stream.
        while script.len() % 8 != 0 {
            script.push(0x16);
        }
        script = c.encrypt_blocks(&script);
    }
    script
}
