//! Header block reading.
//!
//! Consumes header lines up to the blank line that ends the request head,
//! keeping the raw text for the rebuilder and the first `Host:` line for
//! URI resolution.

use tokio::io::AsyncBufRead;

use crate::error::ProxyError;
use crate::http::request::read_line;

/// Raw request headers as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    /// Every header line verbatim, CRLFs included, capped in size.
    pub raw: String,
    /// The first `Host:` line, verbatim.
    pub host_line: Option<String>,
    /// Lines left out of `raw` because the cap was reached.
    pub dropped_lines: usize,
}

/// Byte-level case-insensitive prefix test on a header line.
pub(crate) fn has_header_prefix(line: &[u8], name: &[u8]) -> bool {
    line.len() >= name.len() && line[..name.len()].eq_ignore_ascii_case(name)
}

/// Read header lines until a bare CRLF.
///
/// EOF or a read error before the terminator means the client gave up and
/// yields [`ProxyError::ConnectionClosed`]. Lines that would push `raw` past
/// `max_header_bytes` are dropped whole.
pub async fn read_headers<R>(
    reader: &mut R,
    max_line: usize,
    max_header_bytes: usize,
) -> Result<HeaderBlock, ProxyError>
where
    R: AsyncBufRead + Unpin,
{
    let mut block = HeaderBlock::default();

    loop {
        let line = match read_line(reader, max_line).await {
            Ok(line) if !line.is_empty() => line,
            Ok(_) => return Err(ProxyError::ConnectionClosed),
            Err(e) => {
                tracing::debug!(error = %e, "Header read failed");
                return Err(ProxyError::ConnectionClosed);
            }
        };

        if line == b"\r\n" {
            break;
        }

        let text = String::from_utf8_lossy(&line);
        if block.host_line.is_none() && has_header_prefix(&line, b"Host:") {
            block.host_line = Some(text.to_string());
        }

        if block.raw.len() + text.len() <= max_header_bytes {
            block.raw.push_str(&text);
        } else {
            block.dropped_lines += 1;
        }
    }

    if block.dropped_lines > 0 {
        tracing::debug!(
            dropped = block.dropped_lines,
            max_header_bytes,
            "Header block truncated"
        );
    }

    Ok(block)
}
