//! Data model for one registrar-stored `Contact` entry (§3/§4.4).

use serde::{Deserialize, Serialize};
use sip_types::{Params, Transport, TransportProto, Uri};

/// Replacement key a REGISTER's Contact is indexed under (§4.4 step g).
///
/// Two contacts with the same `Index` for the same AOR replace each
/// other; this is the only notion of "same contact" the engine uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactIndex {
    /// RFC 5626 Outbound flow identity: `(instance_id, reg_id)`.
    Ob { instance_id: String, reg_id: String },
    /// Plain network identity: `(scheme, transport, user, domain, port)`.
    Net {
        scheme: sip_types::Scheme,
        proto: TransportProto,
        user: String,
        domain: String,
        port: u16,
    },
}

/// One stored registration entry for an AOR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegContact {
    pub index: ContactIndex,
    /// The Contact URI as registered, including normalized ext-opts
    /// (`expires`, `q`, `pub-gruu`/`temp-gruu` when minted).
    pub uri: Uri,
    pub params: Params,
    /// Registration/refresh timestamp (µs), used for `qfind` tie-breaks.
    pub updated: u64,
    /// Absolute expiry instant (seconds, same clock as `now`).
    pub expire: u64,
    pub q: f32,
    pub call_id: String,
    pub cseq: u32,
    /// Protocol plus remote and local listening address, as carried by the
    /// request that created/refreshed this binding (§3) — `is_registered`
    /// matches on the full tuple, not protocol alone.
    pub transport: Option<Transport>,
    pub path: Vec<Uri>,
    pub instance_id: String,
    pub reg_id: Option<String>,
    /// Outbound/GRUU bookkeeping: temp-GRUUs below this position no
    /// longer resolve (§4.4 step h, invalidated on Call-ID change).
    pub min_tmp_pos: u64,
    /// Next temp-GRUU position to mint for this index.
    pub next_tmp_pos: u64,
}

impl RegContact {
    pub fn is_live(&self, now: u64) -> bool {
        self.expire > now
    }
}
