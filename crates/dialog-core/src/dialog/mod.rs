//! Core dialog types: identity, the INVITE sub-state-machine, and the
//! `Dialog` record itself.
//!
//! ## Dialog lifecycle
//!
//! ```text
//! (no dialog) -> created on first INVITE/SUBSCRIBE/NOTIFY/REFER
//!             -> invite.status cycles proceeding_uas/accepted_uas/confirmed
//!             -> removed from the store on `stop`
//! ```

pub mod dialog_id;
pub mod dialog_impl;
pub mod invite;
pub mod subscription;

pub use dialog_id::DialogId;
pub use dialog_impl::{dialog_from_request_response, Dialog};
pub use invite::{Invite, InviteClass, InviteStatus, Timestamp};
pub use subscription::{EventKey, SubscriptionRecord};
