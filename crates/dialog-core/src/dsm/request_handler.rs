//! Pure per-method request transitions, §4.3.1.
//!
//! Every function here takes a `Dialog` already looked up (or freshly
//! created) by the orchestrator in [`crate::dsm`] and mutates its
//! `invite` sub-record in place; none of them touch the store or a
//! collaborator, which keeps each transition table directly testable
//! without async machinery.

use rand::Rng;

use sip_types::SipRequest;

use crate::dialog::{Dialog, Invite, InviteClass, InviteStatus};
use crate::errors::{DialogError, DialogResult};
use crate::sdp::{SdpCarrier, SdpOrigin};

/// Retry-After chosen uniformly from `[0, 10]` seconds, per §4.3.1's
/// "Processing Previous INVITE" retry row.
pub fn pick_retry_after() -> u32 {
    rand::thread_rng().gen_range(0..=10)
}

/// Outcome of a successfully-processed ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `accepted_uas` -> `confirmed`, first time.
    Confirmed,
    /// Retransmission absorbed in `confirmed` or `bye`.
    Idempotent,
}

/// INVITE request transition.
///
/// If `dialog.invite` is empty, seeds the synthetic `confirmed` state and
/// recurses once, matching the "INVITE | invite=∅ | create invite@confirmed;
/// recurse" row.
pub fn apply_invite_request(dialog: &mut Dialog, req: &SipRequest) -> DialogResult<()> {
    if dialog.invite.is_none() {
        dialog.invite = Some(Invite::new_confirmed_seed(InviteClass::Uas));
    }

    let status = dialog.invite.as_ref().expect("just seeded").status;
    match status {
        InviteStatus::Confirmed => {
            let invite = dialog.invite.as_mut().expect("just seeded");
            if invite.sdp.has_offer() && req.has_sdp() {
                return Err(DialogError::RequestPending);
            }
            if let Some(body) = &req.sdp {
                invite
                    .sdp
                    .set_offer(SdpOrigin::Remote, SdpCarrier::Invite, body.clone());
            }
            invite.request = Some(req.clone());
            invite.status = InviteStatus::ProceedingUas;
            Ok(())
        }
        InviteStatus::ProceedingUac | InviteStatus::AcceptedUac => Err(DialogError::RequestPending),
        InviteStatus::ProceedingUas | InviteStatus::AcceptedUas => {
            Err(DialogError::retry(pick_retry_after()))
        }
        InviteStatus::Bye => Err(DialogError::NoTransaction),
    }
}

/// ACK request transition.
pub fn apply_ack_request(dialog: &mut Dialog, req: &SipRequest) -> DialogResult<AckOutcome> {
    let invite = dialog.invite.as_mut().ok_or(DialogError::NoTransaction)?;

    match invite.status {
        InviteStatus::AcceptedUas => {
            let cseq_matches = invite
                .request
                .as_ref()
                .map(|r| r.cseq)
                .is_some_and(|c| c == req.cseq);
            if !cseq_matches {
                return Err(DialogError::NoTransaction);
            }

            // ACK-SDP merge, per §4.3.1.
            if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Invite) {
                if let Some(body) = &req.sdp {
                    invite
                        .sdp
                        .set_answer(SdpOrigin::Remote, SdpCarrier::Ack, body.clone());
                } else {
                    invite.sdp.clear();
                }
            }

            invite.ack = Some(req.clone());
            invite.status = InviteStatus::Confirmed;
            Ok(AckOutcome::Confirmed)
        }
        InviteStatus::Confirmed | InviteStatus::Bye => Ok(AckOutcome::Idempotent),
        _ => Err(DialogError::NoTransaction),
    }
}

/// BYE request transition: unconditionally moves the invite sub-state to
/// `bye` and reports whether the sender is the dialog's original caller,
/// so the orchestrator can schedule the terminal store write tagged
/// `caller_bye`/`callee_bye` (scenario S4).
pub fn apply_bye_request(dialog: &mut Dialog, req: &SipRequest) -> bool {
    match dialog.invite.as_mut() {
        Some(invite) => invite.status = InviteStatus::Bye,
        None => {
            let mut invite = Invite::new_confirmed_seed(InviteClass::Uas);
            invite.status = InviteStatus::Bye;
            dialog.invite = Some(invite);
        }
    }
    let from_tag = req.from.tag.as_deref().unwrap_or_default();
    dialog.is_caller_tag(from_tag)
}

/// PRACK request transition. Returns whether a `prack` event should be
/// emitted (answer slot was just filled).
pub fn apply_prack_request(dialog: &mut Dialog, req: &SipRequest) -> DialogResult<bool> {
    let invite = dialog.invite.as_mut().ok_or(DialogError::RequestPending)?;
    if invite.status != InviteStatus::ProceedingUas {
        return Err(DialogError::RequestPending);
    }

    if !invite.sdp.has_offer() {
        if let Some(body) = &req.sdp {
            invite
                .sdp
                .set_offer(SdpOrigin::Remote, SdpCarrier::Prack, body.clone());
        }
        return Ok(false);
    }

    if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Invite) {
        if let Some(body) = &req.sdp {
            invite
                .sdp
                .set_answer(SdpOrigin::Remote, SdpCarrier::Prack, body.clone());
            return Ok(true);
        }
    }

    Ok(false)
}

/// UPDATE request transition.
pub fn apply_update_request(dialog: &mut Dialog, req: &SipRequest) -> DialogResult<()> {
    let invite = dialog.invite.as_mut().ok_or(DialogError::NoTransaction)?;

    if let Some(slot) = &invite.sdp.offer {
        return match slot.origin {
            SdpOrigin::Local => Err(DialogError::RequestPending),
            SdpOrigin::Remote => Err(DialogError::retry(pick_retry_after())),
        };
    }

    if let Some(body) = &req.sdp {
        invite
            .sdp
            .set_offer(SdpOrigin::Remote, SdpCarrier::Update, body.clone());
    }
    Ok(())
}

/// CSeq gate applied to every non-ACK inbound request, per §4.3.1. Advances
/// `dialog.remote_seq` on success.
pub fn cseq_gate(dialog: &mut Dialog, cseq: u32) -> DialogResult<()> {
    dialog
        .check_and_advance_remote_seq(cseq)
        .map_err(|_| DialogError::internal_error("Old CSeq in Dialog"))
}
