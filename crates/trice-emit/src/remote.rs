//! Client side of the display connection.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::error::{EmitError, Result};
use crate::line::LineWriter;
use crate::net::{write_frame, TAG_LINE, TAG_SHUTDOWN};

/// How long autostart waits for the spawned server to come up.
const AUTOSTART_ATTEMPTS: u32 = 20;
const AUTOSTART_BACKOFF: Duration = Duration::from_millis(100);

/// Sink forwarding lines to a display server over TCP.
///
/// Any failure on the connection is fatal for the sink. Losing lines
/// silently would defeat the point of remote display, so errors
/// propagate to the pipeline instead of being retried here.
pub struct RemoteDisplay {
    stream: TcpStream,
    addr: String,
}

impl RemoteDisplay {
    /// Connect to a display server already listening on `addr`.
    pub fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| EmitError::ConnectFailed {
            addr: addr.to_string(),
            detail: e.to_string(),
        })?;
        debug!("connected to display server at {addr}");
        Ok(RemoteDisplay {
            stream,
            addr: addr.to_string(),
        })
    }

    /// Connect to `addr`, spawning a detached display server process
    /// first if nothing answers there.
    ///
    /// The server is this same executable invoked with the
    /// display-server subcommand, so one binary serves both roles.
    pub fn connect_or_spawn(addr: &str, ipa: &str, ipp: &str) -> Result<Self> {
        if let Ok(remote) = Self::connect(addr) {
            return Ok(remote);
        }

        let exe = std::env::current_exe()?;
        info!("no display server at {addr}, starting one");
        Command::new(exe)
            .args(["display-server", "--ipa", ipa, "--ipp", ipp])
            .stdin(Stdio::null())
            .spawn()?;

        let mut last = None;
        for _ in 0..AUTOSTART_ATTEMPTS {
            match Self::connect(addr) {
                Ok(remote) => return Ok(remote),
                Err(e) => last = Some(e),
            }
            thread::sleep(AUTOSTART_BACKOFF);
        }
        Err(last.unwrap_or(EmitError::ConnectFailed {
            addr: addr.to_string(),
            detail: "spawned server never came up".to_string(),
        }))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl LineWriter for RemoteDisplay {
    fn write_line(&mut self, line: &str) -> Result<()> {
        write_frame(&mut self.stream, TAG_LINE, line.as_bytes()).map_err(|e| match e {
            EmitError::Io(ref io)
                if io.kind() == ErrorKind::BrokenPipe
                    || io.kind() == ErrorKind::ConnectionReset =>
            {
                EmitError::PeerClosed
            }
            other => other,
        })
    }
}

/// Ask the display server at `addr` to shut down.
///
/// Returns `Ok(true)` if the command was delivered and `Ok(false)` if
/// nothing is listening there, so shutting down an already-stopped
/// server is not an error.
pub fn send_shutdown(addr: &str) -> Result<bool> {
    let mut stream = match TcpStream::connect(addr) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
            debug!("no display server at {addr}");
            return Ok(false);
        }
        Err(e) => {
            return Err(EmitError::ConnectFailed {
                addr: addr.to_string(),
                detail: e.to_string(),
            })
        }
    };
    write_frame(&mut stream, TAG_SHUTDOWN, &[])?;
    info!("shutdown sent to {addr}");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::server::DisplayServer;

    struct SharedBuf(Arc<Mutex<Vec<String>>>);

    impl LineWriter for SharedBuf {
        fn write_line(&mut self, line: &str) -> Result<()> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn remote_lines_reach_server_sink() {
        let server = DisplayServer::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap().to_string();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink: Arc<Mutex<dyn LineWriter>> =
            Arc::new(Mutex::new(SharedBuf(Arc::clone(&lines))));
        let runner = thread::spawn(move || server.run(sink));

        let mut remote = RemoteDisplay::connect(&addr).unwrap();
        remote.write_line("over the wire").unwrap();
        drop(remote);

        assert!(send_shutdown(&addr).unwrap());
        runner.join().unwrap().unwrap();
        assert_eq!(*lines.lock().unwrap(), vec!["over the wire".to_string()]);
    }

    #[test]
    fn shutdown_without_server_is_not_an_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().to_string()
        };
        assert!(!send_shutdown(&addr).unwrap());
    }

    #[test]
    fn connect_to_dead_port_fails() {
        let addr = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().to_string()
        };
        assert!(matches!(
            RemoteDisplay::connect(&addr),
            Err(EmitError::ConnectFailed { .. })
        ));
    }
}
