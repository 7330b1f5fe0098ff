//! `trice display-server` — standalone line display process.

use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use trice_emit::{ColorMode, DisplayServer, LineWriter, LocalDisplay};

pub fn run(ipa: &str, ipp: &str, color: &str) -> Result<()> {
    // Carried for parity with `log`; validated so typos surface here
    // instead of silently changing nothing.
    if ColorMode::parse(color).is_none() {
        bail!("unknown color mode: {color} (expected default, none, off)");
    }

    let addr = format!("{ipa}:{ipp}");
    let server = DisplayServer::bind(&addr)?;
    println!("display server listening on {}", server.local_addr()?);

    let sink: Arc<Mutex<dyn LineWriter>> =
        Arc::new(Mutex::new(LocalDisplay::new(io::stdout())));
    server.run(sink)?;
    Ok(())
}
