//! The `Dialog` record and the handful of pure helpers the DSM and store
//! build on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sip_types::{Aor, SipRequest, SipResponse, Uri};

use super::dialog_id::DialogId;
use super::invite::{Invite, InviteClass};
use super::subscription::{EventKey, SubscriptionRecord};

/// A SIP dialog, per RFC 3261 §12.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialog {
    pub id: DialogId,
    pub aor_local: Aor,
    pub aor_remote: Aor,
    pub local_tag: String,
    pub remote_tag: String,
    pub call_id: String,
    /// CSeq counters; 0 means unset.
    pub local_seq: u32,
    pub remote_seq: u32,
    /// This side's stable Contact, used by the Response Decorator (§4.6).
    pub local_target: Uri,
    /// From-tag of the party that sent the initial INVITE — distinguishes
    /// caller-BYE from callee-BYE (§4.3.2, scenario S4).
    pub caller_tag: String,
    pub route_set: Vec<Uri>,
    pub invite: Option<Invite>,
    pub subscriptions: HashMap<EventKey, SubscriptionRecord>,
}

impl Dialog {
    /// Construct a dialog as seen from the UAS side of an initial INVITE
    /// (or any other dialog-creating request): `local_tag`/`aor_local` are
    /// this side's, `remote_tag`/`aor_remote` are the peer's.
    pub fn new_uas(
        call_id: impl Into<String>,
        aor_local: Aor,
        aor_remote: Aor,
        local_tag: impl Into<String>,
        remote_tag: impl Into<String>,
        local_target: Uri,
        caller_tag: impl Into<String>,
    ) -> Self {
        let call_id = call_id.into();
        let local_tag = local_tag.into();
        let remote_tag = remote_tag.into();
        Self {
            id: DialogId::from_tags(&call_id, &local_tag, &remote_tag),
            aor_local,
            aor_remote,
            local_tag,
            remote_tag,
            call_id,
            local_seq: 0,
            remote_seq: 0,
            local_target,
            caller_tag: caller_tag.into(),
            route_set: Vec::new(),
            invite: None,
            subscriptions: HashMap::new(),
        }
    }

    /// Whether `from_tag` (typically a BYE's From-tag) belongs to the
    /// dialog's original caller — used to classify dialog termination as
    /// `caller_bye` vs. `callee_bye` (§4.3.2, scenario S4).
    pub fn is_caller_tag(&self, from_tag: &str) -> bool {
        self.caller_tag == from_tag
    }

    /// Compute the [`DialogId`] a UAS would assign to an inbound request
    /// carrying `(call_id, from_tag, to_tag)`.
    pub fn id_for_request(call_id: &str, from_tag: &str, to_tag: &str) -> DialogId {
        DialogId::from_tags(call_id, from_tag, to_tag)
    }

    /// Compute the [`DialogId`] a UAS would assign to the response to a
    /// request it sent — same two tags, same id by construction.
    pub fn id_for_response(call_id: &str, from_tag: &str, to_tag: &str) -> DialogId {
        DialogId::from_tags(call_id, from_tag, to_tag)
    }

    /// CSeq gate for non-ACK inbound requests (§4.3.1): advances
    /// `remote_seq` and rejects regressions. `remote_seq == 0` means
    /// "unset", so the very first request is always accepted.
    pub fn check_and_advance_remote_seq(&mut self, cseq: u32) -> Result<(), ()> {
        if self.remote_seq > 0 && cseq < self.remote_seq {
            return Err(());
        }
        self.remote_seq = cseq;
        Ok(())
    }

    /// Start (or re-seed) the INVITE sub-state with the synthetic
    /// `confirmed` state used as the entry point for a first INVITE.
    pub fn seed_invite(&mut self, class: InviteClass) -> &mut Invite {
        self.invite = Some(Invite::new_confirmed_seed(class));
        self.invite.as_mut().unwrap()
    }

    /// The three values that together identify this dialog, handy for
    /// logging and tests.
    pub fn identity_tuple(&self) -> (String, String, String) {
        (
            self.call_id.clone(),
            self.local_tag.clone(),
            self.remote_tag.clone(),
        )
    }
}

/// Build the two AORs and tags for a freshly-created UAS dialog from the
/// request/response pair that created it, mirroring
/// `rvoip-dialog-core::dialog::dialog_impl::Dialog::from_2xx_response` but
/// for the UAS role this crate focuses on (local = To, remote = From).
pub fn dialog_from_request_response(req: &SipRequest, resp: &SipResponse) -> Option<Dialog> {
    let local_tag = resp.to.tag.clone()?;
    let remote_tag = resp.from.tag.clone()?;
    let aor_local = Aor::from_uri(&resp.to.uri);
    let aor_remote = Aor::from_uri(&resp.from.uri);
    let local_target = req.to.uri.clone();
    let caller_tag = remote_tag.clone();

    Some(Dialog::new_uas(
        resp.call_id.clone(),
        aor_local,
        aor_remote,
        local_tag,
        remote_tag,
        local_target,
        caller_tag,
    ))
}
