//! Error type for the typed SIP primitives.
//!
//! Parsing and construction in this crate are narrow (collaborators own the
//! real RFC 3261 grammar); this error only covers the few things a typed
//! interface can itself get wrong, such as an unparseable URI handed to it
//! by a caller.

use thiserror::Error;

/// Result alias for `sip-types` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or parsing typed SIP primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input could not be parsed into the requested type.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Build a parse error from any displayable message.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }
}
