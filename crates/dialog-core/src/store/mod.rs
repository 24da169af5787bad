//! Dialog Store (C2): the single `(DialogId -> Dialog)` write path.
//!
//! `update` is the only place a `Dialog` is persisted: it (a) writes the
//! modified dialog, (b) fires the configured [`DialogEventSink`], and (c)
//! removes the dialog from the map when the event is a stop (§4.2).
//! `stop` is a convenience wrapper that builds the RFC 5057 stop event for
//! callers that don't already have one.

use std::sync::Arc;

use dashmap::DashMap;

use crate::dialog::{Dialog, DialogId};
use crate::errors::{DialogError, DialogResult};
use crate::events::{DialogEvent, DialogEventSink, NoopEventSink, StopReason};

/// In-process Dialog Store backed by a `DashMap`.
///
/// Per §5, callers are expected to serialize operations against the same
/// `DialogId` (e.g. by routing each call through a single actor/task);
/// this store only guarantees that an individual `get`/`insert` is atomic,
/// not that a read-modify-write sequence across two calls is.
pub struct InMemoryDialogStore {
    dialogs: DashMap<DialogId, Dialog>,
    sink: Arc<dyn DialogEventSink>,
}

impl InMemoryDialogStore {
    pub fn new() -> Self {
        Self {
            dialogs: DashMap::new(),
            sink: Arc::new(NoopEventSink),
        }
    }

    pub fn with_sink(sink: Arc<dyn DialogEventSink>) -> Self {
        Self {
            dialogs: DashMap::new(),
            sink,
        }
    }

    /// Look up a dialog by id.
    pub fn find(&self, id: &DialogId) -> Option<Dialog> {
        self.dialogs.get(id).map(|r| r.clone())
    }

    /// Insert a brand-new dialog (no prior entry expected).
    pub fn create(&self, dialog: Dialog) -> DialogResult<()> {
        if self.dialogs.contains_key(&dialog.id) {
            return Err(DialogError::DialogAlreadyExists {
                id: dialog.id.to_string(),
            });
        }
        self.dialogs.insert(dialog.id.clone(), dialog);
        Ok(())
    }

    /// Persist `dialog`, fire `event`, and remove the entry if `event` is
    /// a [`DialogEvent::Stopped`].
    pub async fn update(&self, event: DialogEvent, dialog: Dialog) -> DialogResult<()> {
        let is_stop = matches!(event, DialogEvent::Stopped { .. });
        if is_stop {
            self.dialogs.remove(&dialog.id);
        } else {
            self.dialogs.insert(dialog.id.clone(), dialog);
        }
        self.sink.on_event(event).await;
        Ok(())
    }

    /// Shorthand for a terminal update with an RFC 5057 dialog-ending
    /// code.
    pub async fn stop(&self, code: u16, dialog: Dialog) -> DialogResult<()> {
        let event = DialogEvent::Stopped {
            dialog_id: dialog.id.clone(),
            reason: StopReason::Code(code),
        };
        self.update(event, dialog).await
    }

    /// Shorthand for a terminal update tagged by BYE originator, per §4.3.2
    /// scenario S4.
    pub async fn stop_with_bye_reason(&self, caller_bye: bool, dialog: Dialog) -> DialogResult<()> {
        let reason = if caller_bye {
            StopReason::CallerBye
        } else {
            StopReason::CalleeBye
        };
        let event = DialogEvent::Stopped {
            dialog_id: dialog.id.clone(),
            reason,
        };
        self.update(event, dialog).await
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

impl Default for InMemoryDialogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_types::{Aor, Scheme, Uri};

    fn dialog(call_id: &str) -> Dialog {
        Dialog::new_uas(
            call_id,
            Aor::new(Scheme::Sip, "bob", "example.com"),
            Aor::new(Scheme::Sip, "alice", "example.com"),
            "bob-tag",
            "alice-tag",
            Uri::sip("example.com").with_user("bob"),
            "alice-tag",
        )
    }

    #[tokio::test]
    async fn stop_removes_dialog() {
        let store = InMemoryDialogStore::new();
        let d = dialog("call-1");
        let id = d.id.clone();
        store.create(d.clone()).unwrap();
        assert!(store.find(&id).is_some());

        store.stop(404, d).await.unwrap();
        assert!(store.find(&id).is_none());
    }

    #[tokio::test]
    async fn update_persists_non_stop_events() {
        let store = InMemoryDialogStore::new();
        let d = dialog("call-2");
        let id = d.id.clone();
        store.create(d.clone()).unwrap();

        store
            .update(DialogEvent::Confirmed { dialog_id: id.clone() }, d)
            .await
            .unwrap();
        assert!(store.find(&id).is_some());
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let store = InMemoryDialogStore::new();
        let d = dialog("call-3");
        store.create(d.clone()).unwrap();
        assert!(store.create(d).is_err());
    }
}
