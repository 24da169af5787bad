//! SIP URI as consumed by the dialog and registrar engines.
//!
//! The real RFC 3261 ABNF (escaping, headers component, `tel:`/`http:`
//! interop, …) is owned by the message-parsing collaborator; this type only
//! carries the pieces the dialog and registrar state machines read or
//! write: scheme, user, host, port, and URI parameters.
//!
//! ```
//! use sip_types::Uri;
//!
//! let uri: Uri = "sip:alice@example.com:5060;transport=tcp".parse().unwrap();
//! assert_eq!(uri.user.as_deref(), Some("alice"));
//! assert_eq!(uri.host, "example.com");
//! assert_eq!(uri.port, Some(5060));
//! assert_eq!(uri.params.get("transport"), Some("tcp"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::Params;
use crate::scheme::Scheme;

/// A SIP or SIPS URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uri {
    /// `sip` or `sips`.
    pub scheme: Scheme,
    /// User part, if any (absent for a bare domain URI).
    pub user: Option<String>,
    /// Host: domain name or literal IP.
    pub host: String,
    /// Port, if explicit.
    pub port: Option<u16>,
    /// URI parameters (`;transport=udp`, `;lr`, `;gr=...`, …).
    pub params: Params,
}

impl Uri {
    /// Build a bare `sip:` URI for `host`.
    pub fn sip(host: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Sip,
            user: None,
            host: host.into(),
            port: None,
            params: Params::new(),
        }
    }

    /// Builder: set the user part.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Builder: set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder: set a URI parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(name, value);
        self
    }

    /// `(scheme, user, domain)` AOR-shaped key for this URI, lower-cased on
    /// host for case-insensitive comparison per RFC 3261 §19.1.4.
    pub fn aor_key(&self) -> (Scheme, String, String) {
        (
            self.scheme,
            self.user.clone().unwrap_or_default(),
            self.host.to_ascii_lowercase(),
        )
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.params)
    }
}

impl FromStr for Uri {
    type Err = Error;

    /// Parse the minimal subset of URI syntax the engines themselves need
    /// to construct (`scheme:[user@]host[:port][;params]`). Escaped user
    /// parts, the `?headers` component and `tel:`/`http:` interop are out
    /// of scope here — the message layer hands in already-parsed URIs for
    /// anything it received off the wire.
    fn from_str(s: &str) -> Result<Self> {
        let (scheme_str, rest) = s
            .split_once(':')
            .ok_or_else(|| Error::parse("missing ':' after scheme"))?;
        let scheme: Scheme = scheme_str.parse()?;

        let mut parts = rest.splitn(2, ';');
        let userhost = parts.next().unwrap_or_default();
        let param_str = parts.next();

        let (user, hostport) = match userhost.split_once('@') {
            Some((u, h)) => (Some(u.to_string()), h),
            None => (None, userhost),
        };

        let (host, port) = if let Some(idx) = hostport.rfind(':') {
            // Guard against IPv6 literals with no explicit port, which
            // contain ':' themselves; only treat as a port if the suffix
            // parses as a u16.
            let (h, p) = hostport.split_at(idx);
            match p[1..].parse::<u16>() {
                Ok(port) => (h.to_string(), Some(port)),
                Err(_) => (hostport.to_string(), None),
            }
        } else {
            (hostport.to_string(), None)
        };

        if host.is_empty() {
            return Err(Error::parse("missing host"));
        }

        let mut params = Params::new();
        if let Some(param_str) = param_str {
            for raw in param_str.split(';') {
                if raw.is_empty() {
                    continue;
                }
                match raw.split_once('=') {
                    Some((k, v)) => {
                        params.set(k, v);
                    }
                    None => {
                        params.set_flag(raw);
                    }
                }
            }
        }

        Ok(Uri {
            scheme,
            user,
            host,
            port,
            params,
        })
    }
}
