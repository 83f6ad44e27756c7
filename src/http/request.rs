//! Request line reading and parsing.
//!
//! # Responsibilities
//! - Read CRLF-terminated lines from the client without unbounded buffering
//! - Split the request line into method, target and version
//!
//! # Design Decisions
//! - A line longer than the cap is consumed through its `\n` and truncated, so the
//!   excess never reads as a line of its own
//! - Parsing never fails: missing fields come back empty and the caller decides

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Read one line (up to and including `\n`), keeping at most `max_len` bytes.
///
/// An over-long line is still consumed to its end; the kept prefix gets the
/// line's terminator back so callers always see whole lines. Returns an empty
/// buffer at EOF.
pub async fn read_line<R>(reader: &mut R, max_len: usize) -> io::Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut truncated = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(line);
        }

        let (used, complete) = match available.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        let room = max_len.saturating_sub(line.len());
        truncated |= used > room;
        line.extend_from_slice(&available[..used.min(room)]);
        reader.consume(used);

        if complete {
            break;
        }
    }

    if truncated {
        line.truncate(max_len.saturating_sub(2));
        line.extend_from_slice(b"\r\n");
    }
    Ok(line)
}

/// First line of an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Whitespace-split parse. Absent fields are left empty.
    ///
    /// Bytes that are not UTF-8 become U+FFFD, so such a target is forwarded
    /// and cached in its replaced form.
    pub fn parse(line: &[u8]) -> Self {
        let text = String::from_utf8_lossy(line);
        let mut parts = text.split_whitespace();
        let mut next = || parts.next().unwrap_or_default().to_string();
        Self {
            method: next(),
            target: next(),
            version: next(),
        }
    }

    /// All three fields present.
    pub fn is_well_formed(&self) -> bool {
        !self.method.is_empty() && !self.target.is_empty() && !self.version.is_empty()
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}
