/*!
 * Connection manager / event loop
 *
 * The accept loop, per-connection read/write handling, and the idle
 * eviction sweep, all on a single thread driving one `mio::Poll`.
 * Handlers run synchronously from inside the read callback (§5) — this
 * module never blocks on anything but `poll.poll`.
 */

use crate::conn::Connection;
use crate::config::ServerConfig;
use crate::directory::ConnectionDirectory;
use crate::error::CoreResult;
use crate::protocol;
use crate::registry::Registry;
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::{HashMap, HashSet};
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

const LISTENER: Token = Token(usize::MAX);

/// Why a connection was evicted; distinguishable in logs (§4.6, §10.1/§10.5).
#[derive(Debug, Clone, Copy)]
enum EvictReason {
    Eof,
    Error,
    Timeout,
    Explicit,
}

impl std::fmt::Display for EvictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EvictReason::Eof => "eof",
            EvictReason::Error => "error",
            EvictReason::Timeout => "timeout",
            EvictReason::Explicit => "explicit",
        };
        f.write_str(s)
    }
}

/// Owns the `sid -> Connection` map and the directory-handle bookkeeping
/// (§9's "explicit handle" in place of the source's raw back-pointer).
struct Connections {
    map: HashMap<u64, Connection>,
    pending_close: HashSet<u64>,
    /// sid of the connection currently pulled out of `map` for dispatch,
    /// if any. Not reachable through `find_connection` by design.
    current: Option<u64>,
}

impl Connections {
    fn new() -> Self {
        Connections {
            map: HashMap::new(),
            pending_close: HashSet::new(),
            current: None,
        }
    }
}

impl ConnectionDirectory for Connections {
    fn find_connection(&mut self, sid: u64) -> Option<&mut Connection> {
        self.map.get_mut(&sid)
    }

    fn close_connection(&mut self, sid: u64) -> bool {
        let known = self.map.contains_key(&sid) || self.current == Some(sid);
        self.pending_close.insert(sid);
        known
    }
}

#[inline]
fn would_block(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

/// Bind a listening socket: non-blocking, address-reusable, with the
/// configured backlog (the teacher's `bind_reuseport` left this as a TODO).
pub(crate) fn bind_listener(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog as i32)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener))
}

/// Run the event loop until the process is killed. Blocks the calling
/// thread — `Server::start` spawns a dedicated worker for this.
pub(crate) fn run(mut listener: TcpListener, registry: Registry, config: ServerConfig) -> CoreResult<()> {
    let mut poll = Poll::new()?;
    let mut events = Events::with_capacity(1024);
    poll.registry()
        .register(&mut listener, LISTENER, Interest::READABLE)?;

    let mut connections = Connections::new();
    let mut next_sid: u64 = 1000;
    let tick = config.tick_interval();
    let mut last_sweep = Instant::now();
    let mut read_buf = vec![0u8; config.read_chunk];

    loop {
        let timeout = tick.saturating_sub(last_sweep.elapsed());
        poll.poll(&mut events, Some(timeout))?;

        for ev in events.iter() {
            match ev.token() {
                LISTENER => accept_all(&mut listener, &poll, &mut connections, &mut next_sid),
                Token(raw) => {
                    let sid = raw as u64;
                    handle_client_event(sid, &mut connections, &poll, &registry, &mut read_buf);
                }
            }
        }

        if last_sweep.elapsed() >= tick {
            sweep_idle(&mut connections, &poll, config.idle_close());
            last_sweep = Instant::now();
        }
    }
}

fn accept_all(listener: &mut TcpListener, poll: &Poll, connections: &mut Connections, next_sid: &mut u64) {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                let sid = *next_sid;
                *next_sid += 1;
                let mut conn = Connection::new(sid, stream);
                if let Err(e) = conn.set_socket_options() {
                    log::warn!("sid={} failed to set socket options: {}", sid, e);
                }
                if let Err(e) = poll.registry().register(
                    &mut conn.stream,
                    Token(sid as usize),
                    Interest::READABLE | Interest::WRITABLE,
                ) {
                    log::warn!("sid={} failed to register with poller: {}", sid, e);
                    continue;
                }
                log::debug!("sid={} accepted from {}", sid, peer);
                connections.map.insert(sid, conn);
            }
            Err(ref e) if would_block(e) => break,
            Err(e) => {
                log::warn!("accept error: {}", e);
                break;
            }
        }
    }
}

/// Drain the socket, drive the parser/dispatcher, flush the outbound
/// buffer, and evict on EOF/error/explicit close.
fn handle_client_event(
    sid: u64,
    connections: &mut Connections,
    poll: &Poll,
    registry: &Registry,
    read_buf: &mut [u8],
) {
    let mut conn = match connections.map.remove(&sid) {
        Some(c) => c,
        None => return,
    };
    connections.current = Some(sid);

    let mut evict: Option<EvictReason> = None;

    loop {
        match conn.stream.read(read_buf) {
            Ok(0) => {
                evict = Some(EvictReason::Eof);
                break;
            }
            Ok(n) => conn.append_bytes(&read_buf[..n]),
            Err(ref e) if would_block(e) => break,
            Err(_) => {
                evict = Some(EvictReason::Error);
                break;
            }
        }
    }

    if evict.is_none() {
        if let Err(e) = protocol::drive(&mut conn, registry, connections) {
            log::warn!("sid={} framing error: {}", sid, e);
        }
        if !flush(&mut conn) {
            evict = Some(EvictReason::Error);
        }
    }

    connections.current = None;

    // A handler may have asked to close itself or any other connection
    // while it ran; apply every such request now that the map is whole again.
    let pending_closes: Vec<u64> = connections.pending_close.drain().collect();
    for closed_sid in pending_closes {
        if closed_sid == sid {
            if evict.is_none() {
                evict = Some(EvictReason::Explicit);
            }
        } else if let Some(other) = connections.map.remove(&closed_sid) {
            evict_connection(closed_sid, other, poll, EvictReason::Explicit);
        }
    }

    match evict {
        Some(reason) => evict_connection(sid, conn, poll, reason),
        None => {
            connections.map.insert(sid, conn);
        }
    }
}

/// Non-blocking best-effort flush of `conn.outbound`. Returns `false` on a
/// hard write error (caller should evict); leftover bytes on `WouldBlock`
/// are retried on the next writable event.
fn flush(conn: &mut Connection) -> bool {
    while !conn.outbound.is_empty() {
        match conn.stream.write(&conn.outbound) {
            Ok(0) => return false,
            Ok(n) => {
                let _ = conn.outbound.split_to(n);
            }
            Err(ref e) if would_block(e) => break,
            Err(_) => return false,
        }
    }
    true
}

fn sweep_idle(connections: &mut Connections, poll: &Poll, idle_close: Duration) {
    let expired: Vec<u64> = connections
        .map
        .iter()
        .filter(|(_, c)| !c.on_idle_tick(idle_close))
        .map(|(sid, _)| *sid)
        .collect();
    for sid in expired {
        if let Some(conn) = connections.map.remove(&sid) {
            evict_connection(sid, conn, poll, EvictReason::Timeout);
        }
    }
}

fn evict_connection(sid: u64, mut conn: Connection, poll: &Poll, reason: EvictReason) {
    log::debug!("sid={} evicted: {}", sid, reason);
    let _ = poll.registry().deregister(&mut conn.stream);
    // Connection's Drop closes the underlying fd.
}
