//! Locally generated responses.
//!
//! # Responsibilities
//! - Build the small HTML error pages the proxy answers with on its own
//! - Keep `Content-length` exact
//!
//! # Design Decisions
//! - Origin responses are never parsed or rewritten; they are relayed as bytes
//! - Only 501 (method) and 502 (origin connect) are produced here

use std::fmt;

/// Status codes the proxy emits itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    NotImplemented,
    BadGateway,
}

impl ErrorStatus {
    pub fn code(self) -> u16 {
        match self {
            ErrorStatus::NotImplemented => 501,
            ErrorStatus::BadGateway => 502,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            ErrorStatus::NotImplemented => "Not Implemented",
            ErrorStatus::BadGateway => "Bad Gateway",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// Render a complete HTTP/1.0 error response.
///
/// `cause` names what failed (the method, the origin host) and `detail` is
/// a human sentence.
pub fn error_response(status: ErrorStatus, cause: &str, detail: &str) -> Vec<u8> {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=ffffff>\r\n\
         {status}\r\n\
         <p>{detail}: {cause}\r\n\
         <hr><em>Caching Proxy</em>\r\n\
         </body></html>\r\n",
        status = status,
        detail = escape_html(detail),
        cause = escape_html(cause),
    );

    let mut response = format!(
        "HTTP/1.0 {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n",
        status,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body.as_bytes());
    response
}

/// `501` for any method other than GET.
pub fn not_implemented(method: &str) -> Vec<u8> {
    error_response(
        ErrorStatus::NotImplemented,
        method,
        "Proxy does not implement this method",
    )
}

/// `502` when the origin cannot be reached.
pub fn bad_gateway(host: &str) -> Vec<u8> {
    error_response(ErrorStatus::BadGateway, host, "Failed to connect to origin")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(response: &[u8]) -> (String, String) {
        let text = String::from_utf8(response.to_vec()).unwrap();
        let (head, body) = text.split_once("\r\n\r\n").unwrap();
        (head.to_string(), body.to_string())
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .find_map(|l| l.strip_prefix("Content-length: "))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn not_implemented_status_line() {
        let (head, body) = split(&not_implemented("POST"));
        assert!(head.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
        assert!(head.contains("Content-type: text/html"));
        assert!(body.contains("POST"));
        assert_eq!(content_length(&head), body.len());
    }

    #[test]
    fn bad_gateway_status_line() {
        let (head, body) = split(&bad_gateway("origin.invalid"));
        assert!(head.starts_with("HTTP/1.0 502 Bad Gateway\r\n"));
        assert!(body.contains("origin.invalid"));
        assert_eq!(content_length(&head), body.len());
    }

    #[test]
    fn cause_is_escaped() {
        let (head, body) = split(&not_implemented("<script>"));
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
        assert_eq!(content_length(&head), body.len());
    }
}
