/*!
 * Connection object
 *
 * One `Connection` per accepted socket. Owns the socket, the inbound/
 * outbound buffers, the in-flight parse state (`parsed`/`argv`/
 * `argnum`), and the last-activity timestamp used for idle eviction.
 *
 * The socket and the idle timer live here; the event loop (`net.rs`)
 * is the only thing that drives reads/writes and calls `on_idle_tick`.
 */

use bytes::BytesMut;
use mio::net::TcpStream;
use std::time::{Duration, Instant};

/// A single client connection.
///
/// Invariants (see SPEC_FULL.md §3):
/// - `0 <= parsed <= inbound.len()`
/// - `argnum == 0` iff no command is currently in flight, in which case `argv` is empty.
pub struct Connection {
    /// Session id: unique for the server's lifetime.
    pub sid: u64,
    pub(crate) stream: TcpStream,
    pub(crate) inbound: BytesMut,
    pub(crate) parsed: usize,
    pub(crate) argv: Vec<Vec<u8>>,
    pub(crate) argnum: usize,
    pub(crate) last_active: Instant,
    pub(crate) outbound: BytesMut,
}

impl Connection {
    pub(crate) fn new(sid: u64, stream: TcpStream) -> Self {
        Connection {
            sid,
            stream,
            inbound: BytesMut::with_capacity(4096),
            parsed: 0,
            argv: Vec::new(),
            argnum: 0,
            last_active: Instant::now(),
            outbound: BytesMut::new(),
        }
    }

    /// Append freshly-read bytes to the inbound buffer and bump `last_active`.
    pub(crate) fn append_bytes(&mut self, bytes: &[u8]) {
        self.inbound.extend_from_slice(bytes);
        self.last_active = Instant::now();
    }

    /// Returns `false` once the connection has been idle for longer than
    /// `idle_close`. Re-arming the recurring check is the event loop's job.
    pub(crate) fn on_idle_tick(&self, idle_close: Duration) -> bool {
        self.last_active.elapsed() <= idle_close
    }

    /// Disable Nagle's algorithm; best-effort, logged on failure by the caller.
    pub(crate) fn set_socket_options(&mut self) -> std::io::Result<()> {
        self.stream.set_nodelay(true)
    }

    /// Bytes queued to be written to the peer but not yet flushed.
    pub fn pending_write(&self) -> usize {
        self.outbound.len()
    }
}
