//! Incremental RESP2 reply parser.
//!
//! [`parse`] takes a byte buffer and returns `Ok((Reply, bytes_consumed))`
//! or `Err(Incomplete)` when more data is needed, or `Err(Protocol(…))` on
//! malformed input. Bytes after the first complete reply are left alone, so
//! pipelined replies can be consumed one at a time.
//!
//! The parser uses `Bytes` (ref-counted) buffers to enable zero-copy
//! extraction of bulk strings via `buf.slice()`.

use crate::error::{Error, Result};
use crate::resp::types::Reply;
use bytes::Bytes;
use memchr::memchr;

/// Parse one RESP reply from the front of `buf`.
///
/// Returns `(reply, bytes_consumed)` on success.
/// Returns `Err(Incomplete)` when the buffer is too short;
/// callers should read more data and retry.
pub fn parse(buf: &Bytes) -> Result<(Reply, usize)> {
    if buf.is_empty() {
        return Err(Error::Incomplete);
    }

    match buf[0] {
        b'+' => parse_status(buf),
        b'-' => parse_error(buf),
        b':' => parse_integer(buf),
        b'$' => parse_bulk(buf),
        b'*' => parse_array(buf),
        other => Err(Error::Protocol(format!(
            "unknown RESP type byte: 0x{other:02x}"
        ))),
    }
}

/// Convenience wrapper: parse from a byte slice (copies into `Bytes` first).
pub fn parse_slice(buf: &[u8]) -> Result<(Reply, usize)> {
    parse(&Bytes::copy_from_slice(buf))
}

// ── Helpers ────────────────────────────────────────────────────────

/// Find the next `\r\n` in `buf` starting at `offset`.
/// Returns the index of `\r`.
#[inline]
fn find_crlf(buf: &[u8], offset: usize) -> Result<usize> {
    match memchr(b'\r', &buf[offset..]) {
        Some(pos) => {
            let abs = offset + pos;
            if abs + 1 >= buf.len() {
                Err(Error::Incomplete)
            } else if buf[abs + 1] == b'\n' {
                Ok(abs)
            } else {
                Err(Error::Protocol("expected \\n after \\r".into()))
            }
        }
        None => Err(Error::Incomplete),
    }
}

/// Read the line starting at `buf[offset]` up to `\r\n`.
/// Returns `(line_bytes, index_after_crlf)`.
#[inline]
fn read_line(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let cr = find_crlf(buf, offset)?;
    Ok((&buf[offset..cr], cr + 2))
}

/// Parse a signed decimal integer from a byte slice (no allocations).
fn parse_int(bytes: &[u8]) -> Result<i64> {
    let (negative, digits) = match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    };

    if digits.is_empty() {
        return Err(Error::Protocol("integer has no digits".into()));
    }

    // Accumulate as negative so i64::MIN does not overflow.
    let mut n: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(Error::Protocol(format!("invalid byte in integer: 0x{b:02x}")));
        }
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_sub(i64::from(b - b'0')))
            .ok_or_else(|| Error::Protocol("integer overflow".into()))?;
    }

    if negative {
        Ok(n)
    } else {
        n.checked_neg()
            .ok_or_else(|| Error::Protocol("integer overflow".into()))
    }
}

/// Parse a `$`/`*` header length: `-1` means nil, anything else must be >= 0.
fn parse_len(line: &[u8], what: &str) -> Result<Option<usize>> {
    match parse_int(line)? {
        -1 => Ok(None),
        n if n < 0 => Err(Error::Protocol(format!("negative {what} length: {n}"))),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| Error::Protocol(format!("{what} length too large: {n}"))),
    }
}

fn utf8_line(line: &[u8], what: &str) -> Result<String> {
    std::str::from_utf8(line)
        .map(str::to_string)
        .map_err(|e| Error::Protocol(format!("invalid UTF-8 in {what}: {e}")))
}

// ── Type parsers ──────────────────────────────────────────────────

/// `+<string>\r\n`
fn parse_status(buf: &Bytes) -> Result<(Reply, usize)> {
    let (line, next) = read_line(buf, 1)?;
    let s = match line {
        b"OK" => "OK".to_string(),
        b"PONG" => "PONG".to_string(),
        _ => utf8_line(line, "status")?,
    };
    Ok((Reply::Status(s), next))
}

/// `-<error message>\r\n`
fn parse_error(buf: &Bytes) -> Result<(Reply, usize)> {
    let (line, next) = read_line(buf, 1)?;
    Ok((Reply::Error(utf8_line(line, "error")?), next))
}

/// `:<integer>\r\n`
fn parse_integer(buf: &Bytes) -> Result<(Reply, usize)> {
    let (line, next) = read_line(buf, 1)?;
    Ok((Reply::Integer(parse_int(line)?), next))
}

/// `$<length>\r\n<data>\r\n`  or  `$-1\r\n`
fn parse_bulk(buf: &Bytes) -> Result<(Reply, usize)> {
    let (line, next) = read_line(buf, 1)?;
    let len = match parse_len(line, "bulk string")? {
        Some(len) => len,
        None => return Ok((Reply::Nil, next)),
    };

    let data_end = next
        .checked_add(len)
        .ok_or_else(|| Error::Protocol("bulk string length too large".into()))?;
    // Need data + \r\n
    if buf.len() < data_end + 2 {
        return Err(Error::Incomplete);
    }
    if buf[data_end] != b'\r' || buf[data_end + 1] != b'\n' {
        return Err(Error::Protocol("bulk string not terminated by \\r\\n".into()));
    }

    Ok((Reply::Bulk(buf.slice(next..data_end)), data_end + 2))
}

/// `*<count>\r\n<elements>`  or  `*-1\r\n`
fn parse_array(buf: &Bytes) -> Result<(Reply, usize)> {
    let (line, mut next) = read_line(buf, 1)?;
    let count = match parse_len(line, "array")? {
        Some(count) => count,
        None => return Ok((Reply::NilArray, next)),
    };

    // Every element takes at least 3 bytes; don't trust the header for capacity.
    let mut elements = Vec::with_capacity(count.min((buf.len() - next) / 3));
    for _ in 0..count {
        let sub = buf.slice(next..);
        let (val, consumed) = parse(&sub)?;
        elements.push(val);
        next += consumed;
    }
    Ok((Reply::Array(elements), next))
}

// ── Tests ──────────────────────────────────────────────────────────
