//! `trice shutdown` — stop a running display server.

use anyhow::Result;

use trice_emit::send_shutdown;

pub fn run(ipa: &str, ipp: &str) -> Result<()> {
    let addr = format!("{ipa}:{ipp}");
    if send_shutdown(&addr)? {
        println!("display server at {addr} asked to stop");
    } else {
        println!("no display server at {addr}");
    }
    Ok(())
}
