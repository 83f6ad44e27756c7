//! Request-target resolution.
//!
//! Turns an origin-form (`/path`) or absolute-form (`http://host[:port]/path`)
//! target, plus the first `Host:` header line, into the origin to contact.
//!
//! Resolution never fails. Missing or garbled pieces fall back to defaults
//! (`localhost`, port 80, path `/`) and are logged.

use std::fmt;

use crate::http::headers::has_header_prefix;

pub const DEFAULT_PORT: u16 = 80;

/// Host used when an origin-form request carries no Host header.
pub const FALLBACK_HOST: &str = "localhost";

/// Where a request should be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Always starts with `/`.
    pub path: String,
}

impl Target {
    /// `Host` header value: bare host on port 80, `host:port` otherwise.
    pub fn authority(&self) -> String {
        if self.port == DEFAULT_PORT {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}{}", self.host, self.port, self.path)
    }
}

/// Resolve `target` against an optional raw `Host:` line.
pub fn resolve(target: &str, host_line: Option<&str>) -> Target {
    if target.starts_with('/') {
        return resolve_origin_form(target, host_line);
    }

    let rest = strip_scheme(target);
    let (authority, path) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };
    let (host, port) = split_authority(authority);

    Target {
        host: non_empty_host(host),
        port,
        path: path.to_string(),
    }
}

fn resolve_origin_form(target: &str, host_line: Option<&str>) -> Target {
    let (host, port) = match host_line {
        Some(line) => split_authority(host_header_value(line)),
        None => {
            tracing::warn!(
                request_target = target,
                "Host header missing on origin-form request, using fallback"
            );
            (FALLBACK_HOST, DEFAULT_PORT)
        }
    };

    Target {
        host: non_empty_host(host),
        port,
        path: target.to_string(),
    }
}

/// Drop a leading `http://`, any case.
fn strip_scheme(target: &str) -> &str {
    const SCHEME: &str = "http://";
    if has_header_prefix(target.as_bytes(), SCHEME.as_bytes()) {
        &target[SCHEME.len()..]
    } else {
        target
    }
}

/// Value of a `Host:` line: prefix removed, leading blanks skipped, up to CR/LF.
fn host_header_value(line: &str) -> &str {
    let value = if has_header_prefix(line.as_bytes(), b"Host:") {
        &line[5..]
    } else {
        line
    };
    let value = value.trim_start_matches([' ', '\t']);
    match value.find(['\r', '\n']) {
        Some(end) => &value[..end],
        None => value,
    }
}

/// Split `host[:port]` on the first colon. Empty or invalid ports become 80.
fn split_authority(authority: &str) -> (&str, u16) {
    let Some((host, port)) = authority.split_once(':') else {
        return (authority, DEFAULT_PORT);
    };
    if port.is_empty() {
        return (host, DEFAULT_PORT);
    }
    match port.parse::<u16>() {
        Ok(port) => (host, port),
        Err(_) => {
            tracing::warn!(port, "Unusable port in request target, using default");
            (host, DEFAULT_PORT)
        }
    }
}

fn non_empty_host(host: &str) -> String {
    if host.is_empty() {
        tracing::warn!("Empty host in request, using fallback");
        FALLBACK_HOST.to_string()
    } else {
        host.to_string()
    }
}
