//! URI scheme for SIP and SIPS.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The scheme component of a SIP URI.
///
/// Only `sip` and `sips` are meaningful to the dialog and registrar engines;
/// any other scheme is rejected at the boundary (see
/// [`crate::StatusCode::UnsupportedUriScheme`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// `sip:` — plain SIP
    Sip,
    /// `sips:` — SIP over a secure transport
    Sips,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Sip => write!(f, "sip"),
            Scheme::Sips => write!(f, "sips"),
        }
    }
}

impl FromStr for Scheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sip" => Ok(Scheme::Sip),
            "sips" => Ok(Scheme::Sips),
            other => Err(Error::parse(format!("unsupported URI scheme: {other}"))),
        }
    }
}
