//! SDP Offer/Answer tracker (RFC 3264).
//!
//! Offer/answer slots are modeled as `{origin, carrier, body}`. This module
//! only exposes constructors/updaters for that pair of slots — it never
//! does I/O and never inspects SDP content beyond treating it as an opaque
//! blob carrying an identity. All transition *decisions* (which rule of
//! §4.1/§4.3 applies to a given incoming message) live in [`crate::dsm`];
//! this type is the data structure those decisions mutate.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which side produced the SDP currently sitting in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpOrigin {
    Local,
    Remote,
}

/// Which SIP message carried the SDP into its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpCarrier {
    Invite,
    Prack,
    Update,
    Ack,
}

/// One offer or answer slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdpSlot {
    pub origin: SdpOrigin,
    pub carrier: SdpCarrier,
    pub body: Bytes,
}

impl SdpSlot {
    pub fn new(origin: SdpOrigin, carrier: SdpCarrier, body: Bytes) -> Self {
        Self {
            origin,
            carrier,
            body,
        }
    }
}

/// The offer/answer pair tracked per dialog invite.
///
/// Invariant 1/2 of the dialog data model ("at most one offer and at most
/// one answer outstanding at a time"; "an offer without an answer blocks a
/// second offer") are enforced by the DSM, which consults
/// [`OfferAnswerState::has_offer`] before calling [`Self::set_offer`]; this
/// type itself just holds whatever it is told to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferAnswerState {
    pub offer: Option<SdpSlot>,
    pub answer: Option<SdpSlot>,
}

impl OfferAnswerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_offer(&self) -> bool {
        self.offer.is_some()
    }

    pub fn has_answer(&self) -> bool {
        self.answer.is_some()
    }

    /// Set the offer slot.
    pub fn set_offer(&mut self, origin: SdpOrigin, carrier: SdpCarrier, body: Bytes) {
        self.offer = Some(SdpSlot::new(origin, carrier, body));
    }

    /// Set the answer slot.
    pub fn set_answer(&mut self, origin: SdpOrigin, carrier: SdpCarrier, body: Bytes) {
        self.answer = Some(SdpSlot::new(origin, carrier, body));
    }

    /// Clear both slots — used on a failure (≥300) that cleared the
    /// current offer, per §4.1.
    pub fn clear(&mut self) {
        self.offer = None;
        self.answer = None;
    }

    /// Whether the current offer slot was carried by `carrier` and came
    /// from `origin` — the guard used throughout §4.3's response tables
    /// (e.g. "offer={remote,prack,_}").
    pub fn offer_is(&self, origin: SdpOrigin, carrier: SdpCarrier) -> bool {
        matches!(&self.offer, Some(slot) if slot.origin == origin && slot.carrier == carrier)
    }
}
