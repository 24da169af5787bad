//! Collaborator interfaces (§6) and the events the DSM/store emit.
//!
//! None of these types talk to a network or a clock themselves — they are
//! the seams through which the out-of-scope parts of the stack (the event
//! package layer, the session-timer layer, application callback dispatch)
//! plug into the dialog state machine.

use async_trait::async_trait;
use sip_types::{SipRequest, SipResponse};

use crate::dialog::{Dialog, DialogId};
use crate::errors::DialogResult;

/// Events the Dialog State Machine emits as it processes requests and
/// responses. The Dialog Store's `update`/`stop` write path is the single
/// place these are produced (§4.2).
#[derive(Debug, Clone)]
pub enum DialogEvent {
    /// The dialog's INVITE reached `confirmed` (ACK processed, or a
    /// retransmission absorbed in that state).
    Confirmed { dialog_id: DialogId },
    /// The dialog was persisted without reaching a more specific
    /// milestone (e.g. an UPDATE that only set a pending offer).
    Updated { dialog_id: DialogId },
    /// A 2xx to INVITE was accepted (`proceeding_uas` -> `accepted_uas`).
    Accepted { dialog_id: DialogId },
    /// A PRACK completed an offer/answer exchange.
    Prack { dialog_id: DialogId },
    /// An UPDATE completed an offer/answer exchange (UAS-originated).
    Update {
        dialog_id: DialogId,
        request: SipRequest,
        response: SipResponse,
    },
    /// A SUBSCRIBE transaction completed (2xx).
    Subscribe {
        dialog_id: DialogId,
        request: SipRequest,
        response: SipResponse,
    },
    /// A NOTIFY transaction completed (2xx).
    Notify {
        dialog_id: DialogId,
        request: SipRequest,
        response: SipResponse,
    },
    /// The dialog was terminated, with the RFC 5057 (or BYE-tagging)
    /// reason code/label that ended it.
    Stopped { dialog_id: DialogId, reason: StopReason },
}

/// Why a dialog (or its INVITE sub-state) was stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Terminated by a dialog-ending response code (RFC 5057).
    Code(u16),
    /// Terminated by a BYE sent by the original caller.
    CallerBye,
    /// Terminated by a BYE sent by the callee.
    CalleeBye,
}

/// Sink for [`DialogEvent`]s, invoked by the Dialog Store's `update`
/// write path. The default store ships a no-op sink; real deployments
/// plug in their application callback dispatch here.
#[async_trait]
pub trait DialogEventSink: Send + Sync {
    async fn on_event(&self, event: DialogEvent);
}

/// A sink that does nothing, used when no collaborator is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

#[async_trait]
impl DialogEventSink for NoopEventSink {
    async fn on_event(&self, _event: DialogEvent) {}
}

/// The event-package collaborator: SUBSCRIBE/NOTIFY/REFER are delegated
/// here wholesale (§4.3.1, §4.3.2) rather than modeled in the DSM itself.
#[async_trait]
pub trait EventCollaborator: Send + Sync {
    /// Handle an inbound SUBSCRIBE/NOTIFY/REFER request within `dialog`,
    /// returning the (possibly updated) dialog or an error.
    async fn uas_request(&self, request: &SipRequest, dialog: Dialog) -> DialogResult<Dialog>;

    /// Handle the response to a previously delegated request, returning
    /// the updated dialog.
    async fn uas_response(
        &self,
        request: &SipRequest,
        response: &SipResponse,
        dialog: Dialog,
    ) -> DialogResult<Dialog>;
}

/// The session-timer collaborator (RFC 4028), invoked by the Response
/// Decorator for 2xx INVITE/UPDATE.
pub trait SessionTimerCollaborator: Send + Sync {
    /// Attach `Session-Expires`/`Min-SE` to `response`, given the request
    /// that triggered it.
    fn uas_update_timer(&self, request: &SipRequest, response: SipResponse) -> SipResponse;
}

/// A session-timer collaborator that leaves the response untouched, used
/// when session timers are not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionTimer;

impl SessionTimerCollaborator for NoopSessionTimer {
    fn uas_update_timer(&self, _request: &SipRequest, response: SipResponse) -> SipResponse {
        response
    }
}
