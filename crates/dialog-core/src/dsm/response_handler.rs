//! Pure per-status-bucket response transitions, §4.3.2.
//!
//! These functions receive a response already matched to its originating
//! request (same `Call-ID`/`CSeq`) and a `Dialog` already looked up (or, for
//! the "dialog creation from response" rule, not yet existing at all). They
//! never touch the store; [`crate::dsm::DialogEngine`] wires them to it.

use sip_types::{Method, SipRequest, SipResponse, StatusCode};

use crate::dialog::{dialog_from_request_response, Dialog, InviteClass, InviteStatus};
use crate::errors::{DialogError, DialogResult};
use crate::events::StopReason;
use crate::sdp::{SdpCarrier, SdpOrigin};

/// What a response transition asks the orchestrator to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Dialog mutated in place; no special follow-up.
    Updated,
    /// The dialog (or its invite sub-state) must be stopped with this
    /// reason.
    Stop(StopReason),
    /// An offer/answer exchange just completed; emit the corresponding
    /// [`crate::events::DialogEvent`].
    OfferAnswerComplete,
    /// SUBSCRIBE/NOTIFY must be delegated to the event collaborator.
    Delegate,
}

/// Any response with a dialog-ending status code (RFC 5057) stops the
/// dialog outright, regardless of the request method — checked by the
/// orchestrator before dispatching to a method-specific handler.
pub fn dialog_ending_outcome(status: StatusCode) -> Option<ResponseOutcome> {
    status
        .is_dialog_ending()
        .then(|| ResponseOutcome::Stop(StopReason::Code(status.as_u16())))
}

/// `481`: stop unconditionally, same as the dialog-ending set but called
/// out separately in §4.3.2 since it is not in RFC 5057's own table.
pub fn is_481(status: StatusCode) -> bool {
    status.as_u16() == 481
}

/// INVITE response transition — the §4.3.1/§4.3.2 offer/answer table.
///
/// `req` is the INVITE this response answers; it's consulted only for the
/// "no offer recorded yet but the request carried one" row below, which
/// arises when the dialog (and its `invite` sub-state) was just created
/// from this same response rather than from the original request.
pub fn apply_invite_response(
    dialog: &mut Dialog,
    req: &SipRequest,
    resp: &SipResponse,
) -> DialogResult<ResponseOutcome> {
    if is_481(resp.status) || dialog_ending_outcome(resp.status).is_some() {
        return Ok(ResponseOutcome::Stop(StopReason::Code(resp.status.as_u16())));
    }

    let invite = dialog.invite.as_mut().ok_or(DialogError::NoTransaction)?;

    if resp.status.is_provisional() {
        // 101-199: an offer carried in a reliable provisional may complete
        // the exchange; a plain 180/183 with no body is a no-op.
        if invite.sdp.has_offer() && !invite.sdp.has_answer() {
            if let Some(body) = &resp.sdp {
                invite.sdp.set_answer(SdpOrigin::Local, SdpCarrier::Invite, body.clone());
                return Ok(ResponseOutcome::OfferAnswerComplete);
            }
        }
        return Ok(ResponseOutcome::Updated);
    }

    if resp.status.is_success() {
        if invite.status == InviteStatus::ProceedingUas {
            invite.status = InviteStatus::AcceptedUas;
        }
        invite.response = Some(resp.clone());

        if invite.sdp.offer_is(SdpOrigin::Remote, SdpCarrier::Invite) {
            // Answering the request's own offer; no SDP on a final response
            // abandons the exchange instead of leaving it dangling forever.
            match &resp.sdp {
                Some(body) => invite.sdp.set_answer(SdpOrigin::Local, SdpCarrier::Invite, body.clone()),
                None => invite.sdp.clear(),
            }
        } else if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Invite) {
            // Retransmission of the same final response: refresh the offer
            // body rather than mistaking it for an answer.
            if let Some(body) = &resp.sdp {
                invite.sdp.set_offer(SdpOrigin::Local, SdpCarrier::Invite, body.clone());
            }
        } else if !invite.sdp.has_offer() {
            if let Some(body) = &resp.sdp {
                match &req.sdp {
                    // The request carried an offer that was never recorded
                    // (dialog created from this very response) — seed both
                    // slots from the request/response pair at once.
                    Some(req_body) => {
                        invite.sdp.set_offer(SdpOrigin::Remote, SdpCarrier::Invite, req_body.clone());
                        invite.sdp.set_answer(SdpOrigin::Local, SdpCarrier::Invite, body.clone());
                    }
                    None => invite.sdp.set_offer(SdpOrigin::Local, SdpCarrier::Invite, body.clone()),
                }
            }
        }
        return Ok(ResponseOutcome::Updated);
    }

    // >= 300, not dialog-ending: the offer/answer exchange this response
    // closed out is abandoned, but the dialog itself survives.
    invite.sdp.clear();
    invite.status = InviteStatus::Confirmed;
    Ok(ResponseOutcome::Updated)
}

/// BYE response transition: any status stops the dialog, tagged by whether
/// the BYE that provoked it came from the dialog's original caller
/// (scenario S4, mirrored from the request-side classification).
pub fn apply_bye_response(dialog: &Dialog, req: &SipRequest) -> ResponseOutcome {
    let from_tag = req.from.tag.as_deref().unwrap_or_default();
    let reason = if dialog.is_caller_tag(from_tag) {
        StopReason::CallerBye
    } else {
        StopReason::CalleeBye
    };
    ResponseOutcome::Stop(reason)
}

/// PRACK response transition.
pub fn apply_prack_response(dialog: &mut Dialog, resp: &SipResponse) -> DialogResult<ResponseOutcome> {
    let invite = dialog.invite.as_mut().ok_or(DialogError::NoTransaction)?;
    if resp.status.is_success() {
        if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Prack) && !invite.sdp.has_answer() {
            if let Some(body) = &resp.sdp {
                invite.sdp.set_answer(SdpOrigin::Remote, SdpCarrier::Prack, body.clone());
                return Ok(ResponseOutcome::OfferAnswerComplete);
            }
        }
        return Ok(ResponseOutcome::Updated);
    }
    // >= 300: abandon the PRACK's offer/answer attempt, stay in proceeding.
    if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Prack) || invite.sdp.offer_is(SdpOrigin::Remote, SdpCarrier::Prack) {
        invite.sdp.clear();
    }
    Ok(ResponseOutcome::Updated)
}

/// UPDATE response transition.
pub fn apply_update_response(dialog: &mut Dialog, resp: &SipResponse) -> DialogResult<ResponseOutcome> {
    let invite = dialog.invite.as_mut().ok_or(DialogError::NoTransaction)?;
    if resp.status.is_success() {
        if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Update) {
            if let Some(body) = &resp.sdp {
                invite.sdp.set_answer(SdpOrigin::Remote, SdpCarrier::Update, body.clone());
                return Ok(ResponseOutcome::OfferAnswerComplete);
            }
        }
        return Ok(ResponseOutcome::Updated);
    }
    if invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Update) {
        invite.sdp.clear();
    }
    Ok(ResponseOutcome::Updated)
}

/// SUBSCRIBE/NOTIFY response transition: delegated wholesale.
pub fn apply_event_response(_dialog: &Dialog, _resp: &SipResponse) -> ResponseOutcome {
    ResponseOutcome::Delegate
}

/// Dialog creation from any response that assigns a To-tag when none was
/// recorded yet — the general form of §4.3.2's "dialog creation from
/// response" rule: an INVITE's 101-299, or a SUBSCRIBE/NOTIFY/REFER's 2xx.
pub fn dialog_from_response(req: &SipRequest, resp: &SipResponse) -> DialogResult<Dialog> {
    dialog_from_request_response(req, resp).ok_or_else(|| DialogError::internal_error("response missing To/From tag"))
}

/// Dialog creation from a 2xx response to an INVITE sent with no prior
/// dialog — the INVITE-specific case of [`dialog_from_response`].
pub fn dialog_from_success_response(req: &SipRequest, resp: &SipResponse) -> DialogResult<Dialog> {
    if req.method != Method::Invite || !resp.status.is_success() {
        return Err(DialogError::internal_error(
            "dialog creation from response requires a 2xx to an INVITE",
        ));
    }
    dialog_from_response(req, resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sip_types::{Aor, NamedUri, Scheme, Uri};

    fn dialog() -> Dialog {
        let mut d = Dialog::new_uas(
            "call-1",
            Aor::new(Scheme::Sip, "bob", "example.com"),
            Aor::new(Scheme::Sip, "alice", "example.com"),
            "bob-tag",
            "alice-tag",
            Uri::sip("example.com").with_user("bob"),
            "alice-tag",
        );
        d.invite = Some(crate::dialog::Invite::new_confirmed_seed(InviteClass::Uas));
        d
    }

    fn response(status: StatusCode, sdp: Option<&str>) -> SipResponse {
        SipResponse {
            status,
            call_id: "call-1".into(),
            cseq: 1,
            cseq_method: Method::Invite,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")).with_tag("alice-tag"),
            to: NamedUri::new(Uri::sip("example.com").with_user("bob")).with_tag("bob-tag"),
            contacts: vec![],
            record_route: vec![],
            supported: vec![],
            require: vec![],
            sdp: sdp.map(|s| Bytes::from(s.to_string())),
            dialog_id: None,
        }
    }

    fn invite_request(sdp: Option<&str>) -> SipRequest {
        SipRequest {
            method: Method::Invite,
            call_id: "call-1".into(),
            cseq: 1,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")).with_tag("alice-tag"),
            to: NamedUri::new(Uri::sip("example.com").with_user("bob")),
            request_uri: Uri::sip("example.com").with_user("bob"),
            contacts: vec![],
            supported: vec![],
            via_count: 1,
            path: vec![],
            route: vec![],
            expires: None,
            transport: None,
            sdp: sdp.map(|s| Bytes::from(s.to_string())),
        }
    }

    #[test]
    fn dialog_ending_code_stops_dialog() {
        let outcome = dialog_ending_outcome(StatusCode::NotFound);
        assert_eq!(outcome, Some(ResponseOutcome::Stop(StopReason::Code(404))));
        assert!(dialog_ending_outcome(StatusCode::Ok).is_none());
    }

    #[test]
    fn invite_2xx_with_pending_offer_sets_answer() {
        let mut d = dialog();
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Remote, SdpCarrier::Invite, Bytes::from_static(b"offer"));
        d.invite.as_mut().unwrap().status = InviteStatus::ProceedingUas;

        let resp = response(StatusCode::Ok, Some("answer"));
        let outcome = apply_invite_response(&mut d, &invite_request(None), &resp).unwrap();
        assert_eq!(outcome, ResponseOutcome::Updated);
        assert_eq!(d.invite.as_ref().unwrap().status, InviteStatus::AcceptedUas);
        assert!(d.invite.unwrap().sdp.has_answer());
    }

    #[test]
    fn invite_2xx_with_pending_offer_and_no_sdp_clears_dangling_offer() {
        let mut d = dialog();
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Remote, SdpCarrier::Invite, Bytes::from_static(b"offer"));

        let resp = response(StatusCode::Ok, None);
        apply_invite_response(&mut d, &invite_request(None), &resp).unwrap();
        let invite = d.invite.unwrap();
        assert!(!invite.sdp.has_offer());
        assert!(!invite.sdp.has_answer());
    }

    #[test]
    fn invite_2xx_refreshes_local_offer_on_retransmission() {
        let mut d = dialog();
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Local, SdpCarrier::Invite, Bytes::from_static(b"offer-v1"));

        let resp = response(StatusCode::Ok, Some("offer-v2"));
        apply_invite_response(&mut d, &invite_request(None), &resp).unwrap();
        let invite = d.invite.unwrap();
        assert!(invite.sdp.offer_is(SdpOrigin::Local, SdpCarrier::Invite));
        assert!(!invite.sdp.has_answer());
    }

    #[test]
    fn invite_2xx_with_no_recorded_offer_but_request_had_one_seeds_both_slots() {
        let mut d = dialog();
        // Dialog just created from this very response: invite seeded fresh,
        // no offer recorded yet even though the request carried one.
        let req = invite_request(Some("offer"));
        let resp = response(StatusCode::Ok, Some("answer"));
        apply_invite_response(&mut d, &req, &resp).unwrap();
        let invite = d.invite.unwrap();
        assert!(invite.sdp.offer_is(SdpOrigin::Remote, SdpCarrier::Invite));
        assert!(invite.sdp.has_answer());
    }

    #[test]
    fn invite_failure_clears_sdp_and_returns_to_confirmed() {
        let mut d = dialog();
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Remote, SdpCarrier::Invite, Bytes::from_static(b"offer"));

        let resp = response(StatusCode::BadRequest, None);
        apply_invite_response(&mut d, &invite_request(None), &resp).unwrap();
        let invite = d.invite.unwrap();
        assert!(!invite.sdp.has_offer());
        assert_eq!(invite.status, InviteStatus::Confirmed);
    }

    #[test]
    fn invite_dialog_ending_response_stops() {
        let mut d = dialog();
        let resp = response(StatusCode::LoopDetected, None);
        let outcome = apply_invite_response(&mut d, &invite_request(None), &resp).unwrap();
        assert_eq!(outcome, ResponseOutcome::Stop(StopReason::Code(482)));
    }

    #[test]
    fn bye_response_tags_caller_vs_callee() {
        let d = dialog();
        let mut req = SipRequest {
            method: Method::Bye,
            call_id: "call-1".into(),
            cseq: 2,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")).with_tag("alice-tag"),
            to: NamedUri::new(Uri::sip("example.com").with_user("bob")).with_tag("bob-tag"),
            request_uri: Uri::sip("example.com").with_user("bob"),
            contacts: vec![],
            supported: vec![],
            via_count: 1,
            path: vec![],
            route: vec![],
            expires: None,
            transport: None,
            sdp: None,
        };
        let outcome = apply_bye_response(&d, &req);
        assert_eq!(outcome, ResponseOutcome::Stop(StopReason::CallerBye));

        req.from = NamedUri::new(Uri::sip("example.com").with_user("bob")).with_tag("bob-tag");
        let outcome = apply_bye_response(&d, &req);
        assert_eq!(outcome, ResponseOutcome::Stop(StopReason::CalleeBye));
    }

    #[test]
    fn prack_2xx_completes_pending_local_offer() {
        let mut d = dialog();
        d.invite.as_mut().unwrap().status = InviteStatus::ProceedingUas;
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Local, SdpCarrier::Prack, Bytes::from_static(b"offer"));

        let resp = response(StatusCode::Ok, Some("answer"));
        let outcome = apply_prack_response(&mut d, &resp).unwrap();
        assert_eq!(outcome, ResponseOutcome::OfferAnswerComplete);
        assert!(d.invite.unwrap().sdp.has_answer());
    }

    #[test]
    fn update_failure_clears_pending_local_offer() {
        let mut d = dialog();
        d.invite
            .as_mut()
            .unwrap()
            .sdp
            .set_offer(SdpOrigin::Local, SdpCarrier::Update, Bytes::from_static(b"offer"));

        let resp = response(StatusCode::RequestPending, None);
        apply_update_response(&mut d, &resp).unwrap();
        assert!(!d.invite.unwrap().sdp.has_offer());
    }

    #[test]
    fn dialog_creation_from_2xx_requires_invite_and_success() {
        let req = SipRequest {
            method: Method::Bye,
            call_id: "call-1".into(),
            cseq: 1,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")).with_tag("alice-tag"),
            to: NamedUri::new(Uri::sip("example.com").with_user("bob")),
            request_uri: Uri::sip("example.com").with_user("bob"),
            contacts: vec![],
            supported: vec![],
            via_count: 1,
            path: vec![],
            route: vec![],
            expires: None,
            transport: None,
            sdp: None,
        };
        let resp = response(StatusCode::Ok, None);
        assert!(dialog_from_success_response(&req, &resp).is_err());
    }

    #[test]
    fn dialog_creation_from_2xx_succeeds_for_invite() {
        let req = SipRequest {
            method: Method::Invite,
            call_id: "call-1".into(),
            cseq: 1,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")).with_tag("alice-tag"),
            to: NamedUri::new(Uri::sip("example.com").with_user("bob")),
            request_uri: Uri::sip("example.com").with_user("bob"),
            contacts: vec![],
            supported: vec![],
            via_count: 1,
            path: vec![],
            route: vec![],
            expires: None,
            transport: None,
            sdp: None,
        };
        let mut resp = response(StatusCode::Ok, None);
        resp.to = resp.to.with_tag("bob-tag");
        let dialog = dialog_from_success_response(&req, &resp).unwrap();
        assert_eq!(dialog.local_tag, "bob-tag");
        assert_eq!(dialog.remote_tag, "alice-tag");
    }
}
