//! Origin request reconstruction.
//!
//! The proxy always speaks HTTP/1.0 upstream with a fixed header prologue.
//! Client headers that describe the client's own hop are regenerated, the
//! rest pass through untouched and in order.

use crate::http::headers::has_header_prefix;
use crate::http::uri::Target;

/// Client headers replaced by the prologue (matched case-insensitively by prefix).
pub const HOP_HEADERS: [&str; 5] = [
    "Host:",
    "User-Agent:",
    "Connection:",
    "Proxy-Connection:",
    "Accept-Encoding:",
];

fn is_hop_header(line: &str) -> bool {
    HOP_HEADERS
        .iter()
        .any(|name| has_header_prefix(line.as_bytes(), name.as_bytes()))
}

/// Build the request sent to the origin.
///
/// The buffer grows with the input, so a long path or a full header block
/// never truncates the request.
pub fn rebuild_request(target: &Target, raw_headers: &str, user_agent: &str) -> String {
    let mut request = String::with_capacity(128 + target.path.len() + raw_headers.len());

    request.push_str(&format!("GET {} HTTP/1.0\r\n", target.path));
    request.push_str(&format!("Host: {}\r\n", target.authority()));
    request.push_str(&format!("User-Agent: {}\r\n", user_agent));
    request.push_str("Connection: close\r\n");
    request.push_str("Proxy-Connection: close\r\n");

    for line in raw_headers.split(['\r', '\n']) {
        if line.is_empty() || is_hop_header(line) {
            continue;
        }
        request.push_str(line);
        request.push_str("\r\n");
    }

    request.push_str("\r\n");
    request
}
