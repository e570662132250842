/*!
 * Core error types
 *
 * Typed errors for the programmer-facing surface (bind, registration,
 * explicit connection lookup). Malformed client bytes never reach this
 * type — they are parser-level stalls handled entirely inside the
 * parse loop (see `protocol::ParseError`).
 */

use thiserror::Error;

/// Errors returned by the public embedder-facing API.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Binding the listening socket failed (address in use, permission denied, ...).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A registry operation was rejected (full, or an empty name/handler).
    #[error("handler registration rejected: {0}")]
    RegistryRejected(&'static str),

    /// `find_connection`/`close_connection` referenced a session id that
    /// does not (or no longer) exist.
    #[error("connection {0} not found")]
    ConnectionNotFound(u64),

    /// Any other I/O failure surfaced while driving the event loop.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
