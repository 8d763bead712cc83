//! Server endpoint resolution
//!
//! Users type the server address in many shapes: `localhost`, a bare IPv4
//! address, `host:port`, or a full `http(s)://` URL. [`Endpoint::resolve`]
//! turns the raw host and port strings into a base URL that request paths can
//! be appended to. Resolution never fails; garbage input produces an
//! unreachable URL which surfaces later as a connection error.

use std::fmt;

const HTTP: &str = "http";
const HTTPS: &str = "https";

/// A resolved server endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `http` or `https`
    pub scheme: String,
    /// Host part. May already carry an explicit `:port` when the user typed one.
    pub host: String,
    /// Port appended after the host, if any
    pub port: Option<String>,
}

impl Endpoint {
    /// Resolve raw user input into an endpoint.
    ///
    /// Rules, first match wins:
    /// 1. `localhost` (optionally with a scheme, any case) uses `http://localhost:{port}`
    /// 2. an `http://` or `https://` URL is kept, with `:{port}` appended when its
    ///    authority has no port and `port` is not `80`
    /// 3. a dotted-quad IPv4 address gets `http://` and `:{port}`
    /// 4. anything containing a colon is taken as `host:port` already
    /// 5. anything else becomes `http://{host}` and the port is dropped
    pub fn resolve(host: &str, port: &str) -> Self {
        let host = host.trim();
        let port = port.trim();

        if is_localhost(host) {
            return Self::new(HTTP, "localhost", Some(port));
        }

        if let Some((scheme, rest)) = split_scheme(host) {
            let rest = rest.trim_end_matches('/');
            let authority = rest.split('/').next().unwrap_or_default();
            let port = if authority.contains(':') || port == "80" {
                None
            } else {
                Some(port)
            };
            return Self::new(scheme, rest, port);
        }

        if is_dotted_quad(host) {
            return Self::new(HTTP, host, Some(port));
        }

        // Rules 4 and 5 both leave the host untouched. A bare hostname loses the
        // port here, which matches the behaviour users of the desktop client saw.
        Self::new(HTTP, host, None)
    }

    fn new(scheme: &str, host: &str, port: Option<&str>) -> Self {
        Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port: port.map(str::to_string),
        }
    }

    /// Canonical `scheme://host[:port]` base URL
    pub fn base_url(&self) -> String {
        match &self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// Full URL for an API path such as `/api/tags`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// Resolve raw host and port input straight to a base URL string
pub fn resolve(host: &str, port: &str) -> String {
    Endpoint::resolve(host, port).base_url()
}

fn is_localhost(host: &str) -> bool {
    let lower = host.to_ascii_lowercase();
    lower == "localhost" || lower == "http://localhost" || lower == "https://localhost"
}

fn split_scheme(host: &str) -> Option<(&'static str, &str)> {
    if let Some(rest) = host.strip_prefix("http://") {
        Some((HTTP, rest))
    } else {
        host.strip_prefix("https://").map(|rest| (HTTPS, rest))
    }
}

fn is_dotted_quad(host: &str) -> bool {
    let segments: Vec<&str> = host.split('.').collect();
    segments.len() == 4
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}
