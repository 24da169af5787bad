//! Registrar Store callback (§6): `Get`/`Put`/`Del`/`DelAll` against a
//! single `(app, AOR) -> [RegContact]` keyspace, shared across calls.
//!
//! Per §5, writes are a single `Put` per AOR — the engine never issues two
//! writes for one REGISTER — so the only concurrency hazard this store has
//! to guard against is two REGISTERs for the same AOR racing each other,
//! which [`InMemoryRegistrarStore`] resolves with `DashMap`'s per-key
//! locking.

use async_trait::async_trait;
use dashmap::DashMap;

use sip_types::Aor;

use crate::errors::{RegistrarError, RegistrarResult};
use crate::types::RegContact;

/// Registrar Store collaborator.
#[async_trait]
pub trait RegistrarStore: Send + Sync {
    async fn get(&self, app: &str, aor: &Aor) -> RegistrarResult<Vec<RegContact>>;
    async fn put(&self, app: &str, aor: &Aor, contacts: Vec<RegContact>, ttl_seconds: u64) -> RegistrarResult<()>;
    async fn del(&self, app: &str, aor: &Aor) -> RegistrarResult<bool>;
    async fn del_all(&self, app: &str) -> RegistrarResult<()>;
}

/// Default in-process store: a `DashMap` keyed by `(app, AOR)`. `ttl` is
/// recorded but expiry is enforced lazily by readers filtering
/// `RegContact::is_live`, per §5's "expiry purge is lazy" rule — this store
/// never evicts on a timer.
#[derive(Default)]
pub struct InMemoryRegistrarStore {
    entries: DashMap<(String, Aor), Vec<RegContact>>,
}

impl InMemoryRegistrarStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrarStore for InMemoryRegistrarStore {
    async fn get(&self, app: &str, aor: &Aor) -> RegistrarResult<Vec<RegContact>> {
        Ok(self
            .entries
            .get(&(app.to_string(), aor.clone()))
            .map(|r| r.clone())
            .unwrap_or_default())
    }

    async fn put(&self, app: &str, aor: &Aor, contacts: Vec<RegContact>, _ttl_seconds: u64) -> RegistrarResult<()> {
        if contacts.is_empty() {
            self.entries.remove(&(app.to_string(), aor.clone()));
        } else {
            self.entries.insert((app.to_string(), aor.clone()), contacts);
        }
        Ok(())
    }

    async fn del(&self, app: &str, aor: &Aor) -> RegistrarResult<bool> {
        Ok(self.entries.remove(&(app.to_string(), aor.clone())).is_some())
    }

    async fn del_all(&self, app: &str) -> RegistrarResult<()> {
        self.entries.retain(|(a, _), _| a != app);
        Ok(())
    }
}

/// Helper used by the engine to surface a callback failure per §6's
/// "invalid return shapes surface as `internal_error`" rule — the in-memory
/// store never actually returns an `Err`, but a remote/database-backed one
/// would, and callers map it through this constructor for a consistent
/// message.
pub fn callback_error(op: &str) -> RegistrarError {
    RegistrarError::internal_error(format!("Error calling registrar '{op}' callback"))
}
