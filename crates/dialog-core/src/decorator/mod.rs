//! Response Decorator (C8, §4.6): the last step before a response this
//! side generates goes out — stamps the dialog id, synthesizes `Contact`
//! from the dialog's stable `local_target`, and gives the session-timer
//! collaborator a chance to attach `Session-Expires`/`Min-SE`.
//!
//! None of this runs for responses the dialog engine only *observes*
//! (e.g. a UAC-side response to something this crate's UAS focus doesn't
//! send) — it is specifically the outbound path.

use tracing::debug;

use sip_types::{ContactEntry, Method, Params, SipRequest, SipResponse};

use crate::dialog::Dialog;
use crate::events::SessionTimerCollaborator;

/// Decorate `response` (already built by the application/transaction
/// layer) with this dialog's id, a synthesized `Contact` when the caller
/// left one unset, and, for 2xx INVITE/UPDATE, the session-timer
/// collaborator's headers.
///
/// `request` is the request this response answers, when one is available;
/// it's `None` when the decorator runs over a response reconstructed from
/// store state with no originating request at hand, in which case the
/// session-timer step is skipped rather than guessed at.
pub fn decorate_response(
    dialog: &Dialog,
    request: Option<&SipRequest>,
    mut response: SipResponse,
    timer: &dyn SessionTimerCollaborator,
) -> SipResponse {
    response.dialog_id = Some(dialog.id.to_string());

    if response.contacts.is_empty() {
        response.contacts = vec![ContactEntry::Address {
            uri: dialog.local_target.clone(),
            params: Params::new(),
        }];
    }

    match request {
        Some(request) => {
            let wants_timer =
                matches!(request.method, Method::Invite | Method::Update) && response.status.is_success();
            if wants_timer {
                response = timer.uas_update_timer(request, response);
            }
        }
        None => {
            debug!(dialog_id = %dialog.id, "no originating request, skipping session-timer decoration");
        }
    }

    response
}
