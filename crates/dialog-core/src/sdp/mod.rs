//! SDP offer/answer tracking (RFC 3264) for SIP dialogs.

pub mod offer_answer;

pub use offer_answer::{OfferAnswerState, SdpCarrier, SdpOrigin, SdpSlot};
