//! REGISTER processing: RFC 3261 §10 registration, RFC 3327 Path, RFC 5626
//! Outbound, and RFC 5627 GRUU.
//!
//! [`RegistrarEngine::request`] is the entry point for an inbound REGISTER;
//! [`lookup::find`], [`lookup::qfind`], and [`lookup::is_registered`] serve
//! the proxy/redirect side of a deployment that needs to resolve an AOR or a
//! GRUU back to live contacts.

pub mod engine;
pub mod errors;
pub mod gruu;
pub mod lookup;
pub mod store;
pub mod types;

pub use engine::{NoActiveFlows, ObProc, OutboundFlowLookup, RegisterReply, RegistrarConfig, RegistrarEngine};
pub use errors::{RegistrarError, RegistrarResult};
pub use gruu::{GruuKey, GruuTicket};
pub use lookup::Target;
pub use store::{InMemoryRegistrarStore, RegistrarStore};
pub use types::{ContactIndex, RegContact};
