//! Address-of-Record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scheme::Scheme;
use crate::uri::Uri;

/// `(scheme, user, domain)` identifying a registered user, per RFC 3261
/// §10.2. Comparison is case-insensitive on `domain` (host names) and
/// case-sensitive on `user`, matching RFC 3261 §19.1.4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aor {
    pub scheme: Scheme,
    pub user: String,
    pub domain: String,
}

impl Aor {
    pub fn new(scheme: Scheme, user: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            scheme,
            user: user.into(),
            domain: domain.into(),
        }
    }

    /// Derive the AOR identified by a URI's `(scheme, user, host)`.
    pub fn from_uri(uri: &Uri) -> Self {
        let (scheme, user, domain) = uri.aor_key();
        Self {
            scheme,
            user,
            domain,
        }
    }

    /// Render back to a bare `sip:user@domain` URI (no port, no params) —
    /// the form used when minting a public GRUU or an AOR-identity URI.
    pub fn to_uri(&self) -> Uri {
        let mut uri = Uri::sip(self.domain.clone());
        uri.scheme = self.scheme;
        if !self.user.is_empty() {
            uri = uri.with_user(self.user.clone());
        }
        uri
    }
}

impl fmt::Display for Aor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}
