/*!
 * Server configuration knobs
 *
 * Plain data, directly constructed by the embedder. The core does not
 * parse CLI flags or configuration files — loading a `ServerConfig`
 * from the environment (or anywhere else) is the embedder's concern.
 */

use std::time::Duration;

/// Operational knobs for a [`crate::Server`], with the defaults from
/// the design's §6 "Defaults" table.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Seconds of inactivity after which a connection is evicted.
    pub idle_close_secs: u64,
    /// How often the idle sweep runs (also the event-loop poll timeout).
    pub tick_interval_secs: u64,
    /// Backlog passed to `listen(2)`.
    pub backlog: u32,
    /// Maximum number of distinct command names the registry can hold.
    pub registry_capacity: usize,
    /// Size of the per-read scratch buffer used to drain the socket.
    pub read_chunk: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            idle_close_secs: 3600,
            tick_interval_secs: 600,
            backlog: 128,
            registry_capacity: 1024,
            read_chunk: 4096,
        }
    }
}

impl ServerConfig {
    pub fn idle_close(&self) -> Duration {
        Duration::from_secs(self.idle_close_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}
