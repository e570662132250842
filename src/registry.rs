/*!
 * Handler registry
 *
 * A fixed-capacity table of `{name, handler}` pairs, filled once via
 * `register` before the server starts and never mutated afterward.
 * Lookup (§4.4) is a case-insensitive linear scan, first match wins —
 * the source's `GetCmdProcessFun` does the same over its sentinel-
 * terminated C array, and command sets here are small enough that a
 * hash map would be pure overhead.
 */

use crate::conn::Connection;
use crate::directory::ConnectionDirectory;
use smol_str::SmolStr;
use std::sync::Arc;

/// A registered command handler.
///
/// Receives the connection that sent the command, its argument vector
/// (argv\[0\] is the command name), and a directory handle for reaching
/// *other* connections. Must not retain the connection or argv past the call.
pub type Handler =
    Arc<dyn Fn(&mut Connection, &[Vec<u8>], &mut dyn ConnectionDirectory) + Send + Sync>;

struct Entry {
    name: SmolStr,
    handler: Handler,
}

/// Closed, bounded dispatch table. Read-only once the server starts serving.
pub struct Registry {
    entries: Vec<Entry>,
    capacity: usize,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Registry {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Register a command handler. Fails if `name` is empty or the
    /// registry is already at capacity. Names are not deduplicated —
    /// the first-registered entry wins on lookup.
    pub fn register(&mut self, name: &str, handler: Handler) -> bool {
        if name.is_empty() || self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push(Entry {
            name: SmolStr::new(name),
            handler,
        });
        true
    }

    /// Case-insensitive linear scan over registered entries; first match wins.
    pub fn lookup(&self, name: &[u8]) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|e| e.name.as_bytes().eq_ignore_ascii_case(name))
            .map(|e| &e.handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
