/*!
 * Command dispatcher
 *
 * Looks up `argv[0]` in the handler registry (case-insensitive, first
 * match wins) and either runs the handler or writes an unknown-command
 * error. The argv passed in is already fully decoded and owned by the
 * caller (`protocol::drive`); this module only borrows it for the
 * duration of the call, satisfying the "must not retain argv" rule.
 */

use crate::conn::Connection;
use crate::directory::ConnectionDirectory;
use crate::registry::Registry;
use crate::reply;

/// Dispatch one fully-parsed command. `argv` is guaranteed non-empty by
/// the parser (a completed command always has at least `argv[0]`).
pub(crate) fn dispatch(
    conn: &mut Connection,
    argv: &[Vec<u8>],
    registry: &Registry,
    directory: &mut dyn ConnectionDirectory,
) {
    debug_assert!(!argv.is_empty());
    let name = &argv[0];
    match registry.lookup(name) {
        Some(handler) => {
            log::debug!(
                "sid={} dispatch cmd={}",
                conn.sid,
                String::from_utf8_lossy(name)
            );
            handler(conn, argv, directory);
        }
        None => {
            let name_str = String::from_utf8_lossy(name);
            log::warn!("sid={} unknown command {}", conn.sid, name_str);
            reply::error(conn, &name_str, "not suport");
        }
    }
}
