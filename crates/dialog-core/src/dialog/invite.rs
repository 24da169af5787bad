//! The INVITE sub-state-machine embedded in a [`crate::dialog::Dialog`].

use serde::{Deserialize, Serialize};
use sip_types::{SipRequest, SipResponse};

use crate::sdp::OfferAnswerState;

/// Logical timestamp (caller-supplied, e.g. nanoseconds since an
/// application-defined epoch) — kept abstract so the engine never calls
/// `SystemTime::now()` itself and stays trivially testable.
pub type Timestamp = u64;

/// Which side of the INVITE transaction this dialog's local party played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteClass {
    /// Local party sent the INVITE.
    Uac,
    /// Local party received the INVITE (this crate's primary focus).
    Uas,
}

/// INVITE sub-state, per §4.3.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteStatus {
    ProceedingUac,
    AcceptedUac,
    ProceedingUas,
    AcceptedUas,
    Confirmed,
    Bye,
}

/// The INVITE sub-record of a [`crate::dialog::Dialog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub status: InviteStatus,
    pub class: InviteClass,
    pub request: Option<SipRequest>,
    pub response: Option<SipResponse>,
    pub ack: Option<SipRequest>,
    pub sdp: OfferAnswerState,
    /// Set when the first 2xx was sent/received for this INVITE.
    pub answered: Option<Timestamp>,
}

impl Invite {
    /// The synthetic neutral starting state used to let the
    /// "INVITE on an empty dialog" branch in §4.3.1 take effect; it is
    /// immediately overwritten by the first real transition.
    pub fn new_confirmed_seed(class: InviteClass) -> Self {
        Self {
            status: InviteStatus::Confirmed,
            class,
            request: None,
            response: None,
            ack: None,
            sdp: OfferAnswerState::new(),
            answered: None,
        }
    }
}
