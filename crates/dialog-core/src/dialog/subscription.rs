//! Auxiliary subscription bookkeeping.
//!
//! SUBSCRIBE/NOTIFY/REFER semantics are delegated wholesale to the
//! [`crate::events::EventCollaborator`] — this crate only keeps the
//! minimal slot a dialog needs to know "a subscription exists here" so a
//! stray NOTIFY can be matched to a dialog even without an active INVITE
//! (see the "Dialog lookup miss" rule in §4.3.1).

use serde::{Deserialize, Serialize};

/// Key identifying one event subscription within a dialog: the `Event`
/// header token plus its `id` parameter, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub event: String,
    pub id: Option<String>,
}

impl EventKey {
    pub fn new(event: impl Into<String>, id: Option<String>) -> Self {
        Self {
            event: event.into(),
            id,
        }
    }
}

/// Bookkeeping record for one subscription; the interesting state (dialog
/// vs. terminated, expiry, …) lives with the event collaborator, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub key: EventKey,
    pub active: bool,
}
