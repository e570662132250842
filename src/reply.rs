/*!
 * RESP reply encoder
 *
 * Stateless formatters that append RESP-encoded replies to a
 * connection's outbound buffer. None of these validate their input
 * (a `status` containing `\r` would corrupt the stream) — callers are
 * expected to honor the wire grammar.
 */

use crate::conn::Connection;

/// `+<str>\r\n` — caller must ensure `str` has no embedded CR/LF.
pub fn status(conn: &mut Connection, s: &str) -> usize {
    let before = conn.outbound.len();
    conn.outbound.extend_from_slice(b"+");
    conn.outbound.extend_from_slice(s.as_bytes());
    conn.outbound.extend_from_slice(b"\r\n");
    conn.outbound.len() - before
}

/// `-<kind> <message>\r\n`
pub fn error(conn: &mut Connection, kind: &str, message: &str) -> usize {
    let before = conn.outbound.len();
    conn.outbound.extend_from_slice(b"-");
    conn.outbound.extend_from_slice(kind.as_bytes());
    conn.outbound.extend_from_slice(b" ");
    conn.outbound.extend_from_slice(message.as_bytes());
    conn.outbound.extend_from_slice(b"\r\n");
    conn.outbound.len() - before
}

/// `$-1\r\n`
pub fn null(conn: &mut Connection) -> usize {
    conn.outbound.extend_from_slice(b"$-1\r\n");
    5
}

/// `:<decimal>\r\n`
pub fn integer(conn: &mut Connection, n: i64) -> usize {
    let before = conn.outbound.len();
    conn.outbound
        .extend_from_slice(format!(":{}\r\n", n).as_bytes());
    conn.outbound.len() - before
}

/// `$<len>\r\n<bytes>\r\n` — binary safe.
pub fn bulk(conn: &mut Connection, bytes: &[u8]) -> usize {
    let before = conn.outbound.len();
    conn.outbound
        .extend_from_slice(format!("${}\r\n", bytes.len()).as_bytes());
    conn.outbound.extend_from_slice(bytes);
    conn.outbound.extend_from_slice(b"\r\n");
    conn.outbound.len() - before
}

/// `*<n>\r\n<bulk_1>...<bulk_n>` — each element encoded as a bulk.
pub fn multi_bulk(conn: &mut Connection, items: &[Vec<u8>]) -> usize {
    let before = conn.outbound.len();
    conn.outbound
        .extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
    for item in items {
        bulk(conn, item);
    }
    conn.outbound.len() - before
}
