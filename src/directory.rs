/*!
 * Connection directory handle
 *
 * The design note in SPEC_FULL.md §9 calls for an explicit,
 * non-owning handle in place of the source's raw pointer back-reference
 * from a connection to its server. A handler is invoked with the
 * `Connection` it was dispatched for *and* a `&mut dyn ConnectionDirectory`
 * so it can look up or close a *different* connection by sid (e.g. to
 * reply to a connection asynchronously from another's command). The
 * currently-dispatching connection is deliberately not reachable through
 * the directory — it is already passed by `&mut` to the handler.
 */

use crate::conn::Connection;

pub trait ConnectionDirectory {
    /// Look up another connection by session id.
    fn find_connection(&mut self, sid: u64) -> Option<&mut Connection>;

    /// Request that a connection be evicted once the current dispatch
    /// returns. Returns `true` if `sid` was known at the time of the call.
    fn close_connection(&mut self, sid: u64) -> bool;
}
