//! Dialog State Machine (C3/C4): wires the pure per-method tables in
//! [`request_handler`] and [`response_handler`] to the Dialog Store (C2)
//! and the event-package/session-timer collaborators (C6/C7).
//!
//! The tables themselves are deliberately free of store/collaborator
//! access so they stay unit-testable against bare `Dialog` values; this
//! module is the thin, stateful glue a real transport/transaction layer
//! drives.

pub mod request_handler;
pub mod response_handler;

use std::sync::Arc;

use tracing::{debug, warn};

use sip_types::{Aor, Method, SipRequest, SipResponse};

use crate::dialog::{Dialog, Invite, InviteClass};
use crate::errors::{DialogError, DialogResult};
use crate::events::{DialogEvent, EventCollaborator, StopReason};
use crate::store::InMemoryDialogStore;

use request_handler::{
    apply_ack_request, apply_bye_request, apply_invite_request, apply_prack_request,
    apply_update_request, cseq_gate, AckOutcome,
};
use response_handler::{
    apply_bye_response, apply_invite_response, apply_prack_response, apply_update_response,
    dialog_ending_outcome, dialog_from_response, is_481, ResponseOutcome,
};

/// Whether a method is allowed to create a dialog when no To-tag is present
/// yet on the inbound request (i.e. this is the dialog's first message).
fn creates_dialog(method: &Method) -> bool {
    matches!(method, Method::Invite | Method::Subscribe | Method::Refer)
}

/// The DSM proper: a Dialog Store plus the event-package collaborator,
/// dispatching inbound requests/responses to the per-method tables.
pub struct DialogEngine<E: EventCollaborator> {
    pub store: Arc<InMemoryDialogStore>,
    pub events: Arc<E>,
}

impl<E: EventCollaborator> DialogEngine<E> {
    pub fn new(store: Arc<InMemoryDialogStore>, events: Arc<E>) -> Self {
        Self { store, events }
    }

    /// Handle an inbound request. `mint_local_tag` is invoked only when the
    /// request is dialog-creating and no dialog exists yet; the caller owns
    /// tag generation so this crate never has to fabricate randomness.
    pub async fn handle_request(
        &self,
        request: &SipRequest,
        mint_local_tag: impl FnOnce() -> String,
    ) -> DialogResult<()> {
        let Some(to_tag) = request.to.tag.clone() else {
            return self.handle_dialog_creating_request(request, mint_local_tag).await;
        };

        let from_tag = request
            .from
            .tag
            .clone()
            .ok_or_else(|| DialogError::internal_error("request missing From tag"))?;
        let id = Dialog::id_for_request(&request.call_id, &from_tag, &to_tag);
        let mut dialog = self.store.find(&id).ok_or_else(|| {
            warn!(call_id = %request.call_id, method = %request.method, "no dialog for request");
            DialogError::NoTransaction
        })?;

        if request.method != Method::Ack {
            cseq_gate(&mut dialog, request.cseq)?;
        }

        self.dispatch_request(&mut dialog, request).await
    }

    async fn handle_dialog_creating_request(
        &self,
        request: &SipRequest,
        mint_local_tag: impl FnOnce() -> String,
    ) -> DialogResult<()> {
        if !creates_dialog(&request.method) {
            return Err(DialogError::NoTransaction);
        }
        let remote_tag = request
            .from
            .tag
            .clone()
            .ok_or_else(|| DialogError::internal_error("request missing From tag"))?;
        let local_tag = mint_local_tag();

        let mut dialog = Dialog::new_uas(
            request.call_id.clone(),
            Aor::from_uri(&request.to.uri),
            Aor::from_uri(&request.from.uri),
            local_tag,
            remote_tag.clone(),
            request.to.uri.clone(),
            remote_tag,
        );

        self.dispatch_request(&mut dialog, request).await?;
        debug!(call_id = %request.call_id, dialog_id = %dialog.id, "created dialog from request");
        self.store.create(dialog)
    }

    async fn dispatch_request(&self, dialog: &mut Dialog, request: &SipRequest) -> DialogResult<()> {
        match request.method {
            Method::Invite => {
                apply_invite_request(dialog, request)?;
                self.persist(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog.clone())
                    .await
            }
            Method::Ack => match apply_ack_request(dialog, request)? {
                AckOutcome::Confirmed => {
                    self.persist(DialogEvent::Confirmed { dialog_id: dialog.id.clone() }, dialog.clone())
                        .await
                }
                AckOutcome::Idempotent => Ok(()),
            },
            Method::Bye => {
                let caller_bye = apply_bye_request(dialog, request);
                self.store.stop_with_bye_reason(caller_bye, dialog.clone()).await
            }
            Method::Prack => {
                let emit = apply_prack_request(dialog, request)?;
                if emit {
                    self.persist(DialogEvent::Prack { dialog_id: dialog.id.clone() }, dialog.clone())
                        .await
                } else {
                    self.store.update(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog.clone()).await
                }
            }
            Method::Update => {
                apply_update_request(dialog, request)?;
                self.store.update(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog.clone()).await
            }
            Method::Subscribe | Method::Notify | Method::Refer => {
                let updated = self.events.uas_request(request, dialog.clone()).await?;
                *dialog = updated;
                self.store.update(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog.clone()).await
            }
            _ => Err(DialogError::NoTransaction),
        }
    }

    /// Handle the response to a request this side is processing (or, for an
    /// initial INVITE/SUBSCRIBE/NOTIFY/REFER with no dialog yet, create the
    /// dialog the response establishes before continuing).
    pub async fn handle_response(&self, request: &SipRequest, response: &SipResponse) -> DialogResult<()> {
        if request.to.tag.is_none() {
            return self.handle_dialog_creating_response(request, response).await;
        }

        let to_tag = request.to.tag.clone().expect("checked above");
        let from_tag = request
            .from
            .tag
            .clone()
            .ok_or_else(|| DialogError::internal_error("request missing From tag"))?;
        let id = Dialog::id_for_response(&request.call_id, &from_tag, &to_tag);
        let dialog = self.store.find(&id).ok_or_else(|| {
            warn!(call_id = %request.call_id, method = %request.method, status = response.status.as_u16(), "no dialog for response");
            DialogError::NoTransaction
        })?;

        self.dispatch_response(dialog, request, response).await
    }

    /// §4.3.2's "dialog creation from response": an INVITE's 101-299, or a
    /// SUBSCRIBE/NOTIFY/REFER's 2xx, assigns the To-tag that establishes a
    /// dialog no prior request has created. The freshly built dialog is run
    /// through the same per-method dispatch used for an already-existing
    /// one so its `invite` sub-state (or subscription bookkeeping) is seeded
    /// before it's persisted — otherwise the very next in-dialog request
    /// (e.g. an ACK) would fail `no_transaction`.
    async fn handle_dialog_creating_response(&self, request: &SipRequest, response: &SipResponse) -> DialogResult<()> {
        if response.to.tag.is_none() {
            // This response hasn't assigned a tag yet (e.g. 100 Trying):
            // no dialog to create.
            return Ok(());
        }

        let establishes_dialog = match request.method {
            Method::Invite => (101..300).contains(&response.status.as_u16()),
            Method::Subscribe | Method::Notify | Method::Refer => response.status.is_success(),
            _ => false,
        };
        if !establishes_dialog {
            return Ok(());
        }

        let dialog = dialog_from_response(request, response)?;
        debug!(call_id = %request.call_id, dialog_id = %dialog.id, method = %request.method, "created dialog from response");
        self.store.create(dialog.clone())?;
        self.dispatch_response(dialog, request, response).await
    }

    async fn dispatch_response(&self, mut dialog: Dialog, request: &SipRequest, response: &SipResponse) -> DialogResult<()> {
        if is_481(response.status) || dialog_ending_outcome(response.status).is_some() {
            debug!(dialog_id = %dialog.id, status = response.status.as_u16(), "dialog-ending response, stopping dialog");
            let event = DialogEvent::Stopped {
                dialog_id: dialog.id.clone(),
                reason: StopReason::Code(response.status.as_u16()),
            };
            return self.store.update(event, dialog).await;
        }

        match request.method {
            Method::Invite => {
                if dialog.invite.is_none() {
                    dialog.invite = Some(Invite::new_confirmed_seed(InviteClass::Uas));
                }
                let outcome = apply_invite_response(&mut dialog, request, response)?;
                self.apply_response_outcome(outcome, dialog).await
            }
            Method::Bye => {
                let outcome = apply_bye_response(&dialog, request);
                self.apply_response_outcome(outcome, dialog).await
            }
            Method::Prack => {
                let outcome = apply_prack_response(&mut dialog, response)?;
                self.apply_response_outcome(outcome, dialog).await
            }
            Method::Update => {
                let outcome = apply_update_response(&mut dialog, response)?;
                self.apply_response_outcome(outcome, dialog).await
            }
            Method::Subscribe | Method::Notify | Method::Refer => {
                let updated = self.events.uas_response(request, response, dialog).await?;
                self.store.update(DialogEvent::Updated { dialog_id: updated.id.clone() }, updated).await
            }
            _ => Err(DialogError::NoTransaction),
        }
    }

    async fn apply_response_outcome(&self, outcome: ResponseOutcome, dialog: Dialog) -> DialogResult<()> {
        match outcome {
            ResponseOutcome::Updated => {
                self.store.update(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog).await
            }
            ResponseOutcome::Stop(reason) => {
                let event = DialogEvent::Stopped { dialog_id: dialog.id.clone(), reason };
                self.store.update(event, dialog).await
            }
            ResponseOutcome::OfferAnswerComplete => {
                self.store.update(DialogEvent::Accepted { dialog_id: dialog.id.clone() }, dialog).await
            }
            ResponseOutcome::Delegate => {
                self.store.update(DialogEvent::Updated { dialog_id: dialog.id.clone() }, dialog).await
            }
        }
    }

    async fn persist(&self, event: DialogEvent, dialog: Dialog) -> DialogResult<()> {
        self.store.update(event, dialog).await
    }
}
