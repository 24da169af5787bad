//! Typed SIP primitives shared by the dialog and registrar engines.
//!
//! This crate is the "typed interface" the dialog and registrar
//! specifications describe for their collaborators: URIs, methods, status
//! codes, Addresses-of-Record, and already-parsed request/response shapes.
//! It does not parse SIP off the wire — that is a collaborator's job —
//! it only gives the state machines a stable, serializable vocabulary to
//! operate on.

pub mod aor;
pub mod error;
pub mod message;
pub mod method;
pub mod params;
pub mod scheme;
pub mod status;
pub mod uri;

pub use aor::Aor;
pub use error::{Error, Result};
pub use message::{ContactEntry, NamedUri, SipRequest, SipResponse, Transport, TransportProto};
pub use method::Method;
pub use params::Params;
pub use scheme::Scheme;
pub use status::StatusCode;
pub use uri::Uri;
