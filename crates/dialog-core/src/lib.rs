//! RFC 3261 dialog state machine: tracks per-call dialog identity, the
//! INVITE/PRACK/UPDATE offer-answer lifecycle (RFC 3264, RFC 3262, RFC
//! 3311), BYE-driven termination, and delegates SUBSCRIBE/NOTIFY/REFER
//! (RFC 3265/3515) to an application-supplied collaborator.
//!
//! The crate is split along the same lines as the system it models:
//!
//! - [`dialog`] — dialog identity ([`dialog::DialogId`]) and the
//!   [`dialog::Dialog`] record itself, including its INVITE sub-state.
//! - [`sdp`] — the RFC 3264 offer/answer slot tracker.
//! - [`store`] — the single in-process write path, [`store::InMemoryDialogStore`].
//! - [`events`] — collaborator traits ([`events::EventCollaborator`],
//!   [`events::SessionTimerCollaborator`]) and the events the store emits.
//! - [`dsm`] — the state machine itself: [`dsm::DialogEngine`] plus the
//!   pure per-method request/response tables it dispatches to.
//! - [`decorator`] — outbound response decoration (Contact, session timers).
//! - [`errors`] — [`errors::DialogError`] and its SIP status mapping.

pub mod decorator;
pub mod dialog;
pub mod dsm;
pub mod errors;
pub mod events;
pub mod sdp;
pub mod store;

pub use dialog::{Dialog, DialogId};
pub use dsm::DialogEngine;
pub use errors::{DialogError, DialogResult};
pub use store::InMemoryDialogStore;
