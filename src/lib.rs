//! Resumable RESP request parser and connection core.
//!
//! `respcore` owns the hard part of speaking the Redis protocol over
//! TCP: a per-connection parser that survives arbitrary fragmentation,
//! the connection lifecycle around it (accept, read, idle-eviction),
//! and a small handler registry an embedder fills in with its own
//! commands. It does not know what GET or SET mean — see `demos/` and
//! `src/bin/respcored.rs` for an embedder built on top of it.

pub mod conn; // Connection object: socket, buffers, parse state, idle clock
pub mod config; // ServerConfig: operational knobs and their defaults
pub mod directory; // ConnectionDirectory: handle for reaching other connections
pub mod dispatch; // Command dispatcher: registry lookup + unknown-command reply
pub mod error; // CoreError / CoreResult
pub mod net; // Connection manager / event loop
pub mod protocol; // RESP request parser
pub mod registry; // Handler registry
pub mod reply; // RESP reply encoder

pub use conn::Connection;
pub use config::ServerConfig;
pub use directory::ConnectionDirectory;
pub use error::{CoreError, CoreResult};
pub use protocol::ParseError;
pub use registry::{Handler, Registry};

use std::net::{SocketAddr, ToSocketAddrs};
use std::thread;

/// Default bind address, Redis-compatible port.
pub const DEFAULT_ADDR: &str = "0.0.0.0:6399";

/// Embedder-facing entry point: register handlers, then start.
///
/// `Server` itself never runs on more than the single event-loop thread
/// spawned by `start` — the registry is filled in before that thread
/// exists, so no synchronization is needed for `register`.
pub struct Server {
    registry: Registry,
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Server {
            registry: Registry::new(config.registry_capacity),
            config,
        }
    }

    /// Register a command handler. Returns `false` if `name` is empty
    /// or the registry is already at capacity (§4.5).
    pub fn register(&mut self, name: &str, handler: Handler) -> bool {
        self.registry.register(name, handler)
    }

    /// Bind `(ip, port)` and launch the event loop on a dedicated
    /// worker thread. Returns the bound address (useful when `port`
    /// is 0) once the listener is live; the loop itself runs forever
    /// on its own thread.
    pub fn start(self, ip: &str, port: u16) -> CoreResult<SocketAddr> {
        let addr = (ip, port)
            .to_socket_addrs()
            .map_err(|source| CoreError::Bind {
                addr: format!("{ip}:{port}"),
                source,
            })?
            .next()
            .ok_or_else(|| CoreError::Bind {
                addr: format!("{ip}:{port}"),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no address resolved"),
            })?;

        let listener = net::bind_listener(addr, self.config.backlog).map_err(|source| CoreError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let bound = listener.local_addr().map_err(CoreError::Io)?;

        let registry = self.registry;
        let config = self.config;
        thread::Builder::new()
            .name("respcore-loop".into())
            .spawn(move || {
                if let Err(e) = net::run(listener, registry, config) {
                    log::error!("event loop exited: {e}");
                }
            })
            .map_err(CoreError::Io)?;

        Ok(bound)
    }
}
