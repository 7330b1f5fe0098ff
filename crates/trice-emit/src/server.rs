//! Standalone display server.
//!
//! Accepts any number of concurrent log clients and serializes their
//! lines onto one sink. A `Q` frame from any client stops the accept
//! loop; in-flight connections drain their remaining frames before the
//! server returns, so lines sent before the shutdown are never lost.

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info, warn};

use crate::error::{EmitError, Result};
use crate::line::LineWriter;
use crate::net::{read_frame, Frame};

/// TCP server that renders lines from remote log processes.
pub struct DisplayServer {
    listener: TcpListener,
    stop: Arc<AtomicBool>,
}

impl DisplayServer {
    /// Bind to `addr`. Use port 0 to let the OS pick a free port.
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| EmitError::ConnectFailed {
            addr: addr.to_string(),
            detail: e.to_string(),
        })?;
        Ok(DisplayServer {
            listener,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The address the server actually listens on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients until one of them sends the shutdown frame.
    ///
    /// Blocks the calling thread. Each connection is handled on its
    /// own thread; `sink` access is serialized through the mutex so
    /// interleaved clients still produce whole lines.
    pub fn run(&self, sink: Arc<Mutex<dyn LineWriter>>) -> Result<()> {
        let addr = self.local_addr()?;
        info!("display server listening on {addr}");
        let mut handlers = Vec::new();

        for stream in self.listener.incoming() {
            if self.stop.load(Ordering::SeqCst) {
                break;
            }
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    warn!("accept failed: {e}");
                    continue;
                }
            };
            let sink = Arc::clone(&sink);
            let stop = Arc::clone(&self.stop);
            handlers.push(thread::spawn(move || {
                if let Err(e) = serve_client(stream, sink, stop, addr) {
                    warn!("display client failed: {e}");
                }
            }));
        }

        for h in handlers {
            let _ = h.join();
        }
        info!("display server stopped");
        Ok(())
    }
}

fn serve_client(
    stream: TcpStream,
    sink: Arc<Mutex<dyn LineWriter>>,
    stop: Arc<AtomicBool>,
    server_addr: SocketAddr,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    debug!("display client connected: {peer}");
    let mut reader = BufReader::new(stream);

    while let Some(frame) = read_frame(&mut reader)? {
        match frame {
            Frame::Line(line) => {
                let mut sink = sink.lock().map_err(|_| EmitError::StagePanicked {
                    stage: "display sink",
                })?;
                sink.write_line(&line)?;
            }
            Frame::Shutdown => {
                info!("shutdown requested by {peer}");
                stop.store(true, Ordering::SeqCst);
                // The accept loop only observes the flag on its next
                // wakeup; a throwaway self-connection provides one.
                let _ = TcpStream::connect(server_addr);
                return Ok(());
            }
        }
    }
    debug!("display client disconnected: {peer}");
    Ok(())
}
