/*!
 * RESP request parser
 *
 * Consumes bytes from a connection's inbound buffer and completes as
 * many commands as are fully buffered, dispatching each one the
 * instant it is complete. Resumable: a read that delivers only part of
 * a header or argument body leaves the connection's `parsed`/`argv`/
 * `argnum` state exactly where a later read can pick it back up,
 * without re-copying or re-examining bytes already consumed.
 *
 * Mirrors the source's `ParaseLength` / `ParaseData` / `ProcessCmd`
 * trio, but commits are explicit (`BytesMut::split_to`) rather than a
 * `std::string::erase` on every call.
 */

use crate::conn::Connection;
use crate::directory::ConnectionDirectory;
use crate::registry::Registry;
use crate::{dispatch, reply};
use std::time::Instant;
use thiserror::Error;

/// Header digit runs longer than this are rejected rather than silently
/// truncated (source scratch-buffers the header into `char[11]` without
/// a bounds check; see SPEC_FULL.md §9 item 3).
const MAX_HEADER_DIGITS: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("protocol error: expected '*', got {0:#04x}")]
    ExpectedArray(u8),
    #[error("protocol error: expected '$', got {0:#04x}")]
    ExpectedBulk(u8),
    #[error("protocol error: header line exceeds {0} digits")]
    HeaderTooLong(usize),
    #[error("protocol error: malformed length header")]
    InvalidLength,
}

/// Parse a `<count|length>\r\n` (or `\n`-terminated) header that starts
/// immediately after the `*`/`$` marker.
///
/// Returns `Ok(None)` if the terminating `\n` hasn't arrived yet,
/// `Ok(Some((bytes_consumed, value)))` on success.
fn read_header(data: &[u8]) -> Result<Option<(usize, i64)>, ParseError> {
    let mut digits: Vec<u8> = Vec::new();
    let mut i = 0;
    loop {
        if i >= data.len() {
            return Ok(None);
        }
        let b = data[i];
        i += 1;
        if b == b'\n' {
            break;
        }
        if b != b'\r' {
            digits.push(b);
            if digits.len() > MAX_HEADER_DIGITS {
                return Err(ParseError::HeaderTooLong(MAX_HEADER_DIGITS));
            }
        }
    }
    let text = std::str::from_utf8(&digits).map_err(|_| ParseError::InvalidLength)?;
    let value: i64 = text.parse().map_err(|_| ParseError::InvalidLength)?;
    Ok(Some((i, value)))
}

/// Advance the connection's parse state by at most one command.
///
/// `Ok(true)`: a full command is sitting in `conn.argv`, ready to dispatch.
/// `Ok(false)`: insufficient bytes buffered; state is unchanged beyond
/// whatever arguments were already fully decoded before the stall.
/// `Err`: a framing error; state is left exactly as it was on entry.
fn advance(conn: &mut Connection) -> Result<bool, ParseError> {
    if conn.argnum == 0 {
        let data = &conn.inbound[conn.parsed..];
        if data.is_empty() {
            return Ok(false);
        }
        if data[0] != b'*' {
            return Err(ParseError::ExpectedArray(data[0]));
        }
        match read_header(&data[1..])? {
            None => return Ok(false),
            Some((consumed, count)) => {
                // `*0\r\n` (or a negative count) is treated as a stall, matching
                // the source's `if (0==head_count) return 0;` — see DESIGN.md.
                if count <= 0 {
                    return Ok(false);
                }
                conn.parsed += 1 + consumed;
                conn.argnum = count as usize;
                conn.argv = Vec::with_capacity(conn.argnum);
            }
        }
    }

    while conn.argnum > 0 {
        let data = &conn.inbound[conn.parsed..];
        if data.is_empty() {
            return Ok(false);
        }
        if data[0] != b'$' {
            return Err(ParseError::ExpectedBulk(data[0]));
        }
        match read_header(&data[1..])? {
            None => return Ok(false),
            Some((consumed, len)) => {
                if len < 0 {
                    return Err(ParseError::InvalidLength);
                }
                let len = len as usize;
                let header_len = 1 + consumed;
                let need = header_len + len + 2;
                if data.len() < need {
                    return Ok(false);
                }
                conn.argv.push(data[header_len..header_len + len].to_vec());
                conn.parsed += need;
                conn.argnum -= 1;
            }
        }
    }

    Ok(true)
}

/// Drive the parser until it stalls or hits a framing error, dispatching
/// every command it completes along the way. This is the entry point
/// the event loop calls from its read handler (§4.6).
pub fn drive(
    conn: &mut Connection,
    registry: &Registry,
    directory: &mut dyn ConnectionDirectory,
) -> Result<(), ParseError> {
    loop {
        match advance(conn)? {
            false => return Ok(()),
            true => {
                conn.last_active = Instant::now();
                let argv = std::mem::take(&mut conn.argv);
                dispatch::dispatch(conn, &argv, registry, directory);
                conn.argnum = 0;
                let _ = conn.inbound.split_to(conn.parsed);
                conn.parsed = 0;
            }
        }
    }
}

/// Send a protocol-error reply for a framing error surfaced by `drive`.
/// The connection is not evicted here; the caller decides (see net.rs).
pub fn reply_framing_error(conn: &mut Connection, err: &ParseError) {
    reply::error(conn, "ERR", &format!("{err}"));
}
