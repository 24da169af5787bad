//! The REGISTER processing pipeline (§4.4).
//!
//! [`RegistrarEngine::request`] is the single entry point; it follows the
//! five top-level processing steps almost line for line, with the
//! per-contact update rules (steps a-j) factored into [`process_contact`]
//! so the main function stays readable as those five steps.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use tracing::{debug, warn};

use sip_types::{Aor, ContactEntry, Params, SipRequest, Transport, TransportProto, Uri};

use crate::errors::{RegistrarError, RegistrarResult};
use crate::gruu::{GruuKey, GruuTicket};
use crate::store::RegistrarStore;
use crate::types::{ContactIndex, RegContact};

/// Outbound processing state for one REGISTER, per §4.4 step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObProc {
    True,
    False,
    Unsupported,
}

/// Collaborator that knows which transport tuples have an active
/// Outbound flow (RFC 5626 §5.3) registered against this registrar.
#[async_trait]
pub trait OutboundFlowLookup: Send + Sync {
    /// The raw flow token for `transport`, if an active flow exists.
    async fn find_flow(&self, transport: &Transport) -> Option<Vec<u8>>;
}

/// No Outbound flows are ever active — used when the deployment doesn't
/// track flows, or in tests that don't exercise §4.4 step 1's "first hop"
/// branch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoActiveFlows;

#[async_trait]
impl OutboundFlowLookup for NoActiveFlows {
    async fn find_flow(&self, _transport: &Transport) -> Option<Vec<u8>> {
        None
    }
}

/// Per-deployment registrar tuning, §4.4.6 (app capability flags plus the
/// Expires bounds §4.4 step 4 reads from).
#[derive(Debug, Clone, Copy)]
pub struct RegistrarConfig {
    pub supports_outbound: bool,
    pub supports_gruu: bool,
    pub default_expires: u32,
    pub min_expires: u32,
    pub max_expires: u32,
    /// Upper bound on a single Registrar Store callback invocation (§5); a
    /// call that doesn't return in time surfaces as `internal_error`.
    pub store_timeout: std::time::Duration,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            supports_outbound: true,
            supports_gruu: true,
            default_expires: 3600,
            min_expires: 60,
            max_expires: 86_400,
            store_timeout: std::time::Duration::from_secs(5),
        }
    }
}

/// Outcome of a successful REGISTER.
#[derive(Debug, Clone)]
pub struct RegisterReply {
    /// The AOR's live contact set after this REGISTER.
    pub contacts: Vec<RegContact>,
    /// Whether `Require: outbound` should be added to the 200 OK.
    pub require_outbound: bool,
    /// Path header to prepend to the outgoing response/stored state, if
    /// Outbound flow processing minted one.
    pub minted_path: Option<Uri>,
}

/// Deterministic (non-cryptographic) hash of an opaque instance-id token,
/// used only to bound its stored size — collisions are harmless here since
/// the value is purely a replacement key, never a security boundary.
fn hash_instance(raw: &str) -> String {
    let mut hasher = DefaultHasher::new();
    raw.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// The REGISTER engine: store + Outbound flow lookup + GRUU key + config.
pub struct RegistrarEngine<S: RegistrarStore, F: OutboundFlowLookup> {
    pub store: Arc<S>,
    pub flows: Arc<F>,
    pub gruu_key: GruuKey,
    pub config: RegistrarConfig,
}

impl<S: RegistrarStore> RegistrarEngine<S, NoActiveFlows> {
    pub fn new(store: Arc<S>, gruu_key: GruuKey, config: RegistrarConfig) -> Self {
        Self {
            store,
            flows: Arc::new(NoActiveFlows),
            gruu_key,
            config,
        }
    }
}

impl<S: RegistrarStore, F: OutboundFlowLookup> RegistrarEngine<S, F> {
    pub fn with_flows(store: Arc<S>, flows: Arc<F>, gruu_key: GruuKey, config: RegistrarConfig) -> Self {
        Self {
            store,
            flows,
            gruu_key,
            config,
        }
    }

    async fn store_get(&self, app: &str, aor: &Aor) -> RegistrarResult<Vec<RegContact>> {
        tokio::time::timeout(self.config.store_timeout, self.store.get(app, aor))
            .await
            .map_err(|_| crate::store::callback_error("get"))?
            .map_err(|_| crate::store::callback_error("get"))
    }

    async fn store_put(&self, app: &str, aor: &Aor, contacts: Vec<RegContact>, ttl_seconds: u64) -> RegistrarResult<()> {
        tokio::time::timeout(self.config.store_timeout, self.store.put(app, aor, contacts, ttl_seconds))
            .await
            .map_err(|_| crate::store::callback_error("put"))?
            .map_err(|_| crate::store::callback_error("put"))
    }

    async fn store_del(&self, app: &str, aor: &Aor) -> RegistrarResult<bool> {
        tokio::time::timeout(self.config.store_timeout, self.store.del(app, aor))
            .await
            .map_err(|_| crate::store::callback_error("del"))?
            .map_err(|_| crate::store::callback_error("del"))
    }

    async fn store_del_all(&self, app: &str) -> RegistrarResult<()> {
        tokio::time::timeout(self.config.store_timeout, self.store.del_all(app))
            .await
            .map_err(|_| crate::store::callback_error("del_all"))?
            .map_err(|_| crate::store::callback_error("del_all"))
    }

    /// §4.4 `delete`: remove `aor`'s registration outright, regardless of
    /// its contacts' individual expiry. Returns whether an entry existed.
    pub async fn delete(&self, app: &str, aor: &Aor) -> RegistrarResult<bool> {
        self.store_del(app, aor).await
    }

    /// §4.4 `clear`: remove every AOR registered under `app`.
    pub async fn clear(&self, app: &str) -> RegistrarResult<()> {
        self.store_del_all(app).await
    }

    /// Step 1: Outbound extension check.
    async fn outbound_check(&self, req: &SipRequest, listen_host: &str, listen_port: u16) -> RegistrarResult<(ObProc, Option<Uri>)> {
        if !self.config.supports_outbound {
            return Ok((ObProc::Unsupported, None));
        }
        if !req.supported.iter().any(|t| t == "outbound") {
            return Ok((ObProc::Unsupported, None));
        }

        if req.via_count > 1 {
            let carries_ob = req.path.first().is_some_and(|p| p.params.contains("ob"));
            return Ok((if carries_ob { ObProc::True } else { ObProc::False }, None));
        }

        let Some(transport) = &req.transport else {
            return Ok((ObProc::False, None));
        };
        match self.flows.find_flow(transport).await {
            Some(token) => {
                let path_uri = Uri::sip(listen_host.to_string())
                    .with_user(format!("NkF{}", URL_SAFE_NO_PAD.encode(token)))
                    .with_port(listen_port)
                    .with_param("lr", "");
                Ok((ObProc::True, Some(path_uri)))
            }
            None => Ok((ObProc::False, None)),
        }
    }

    /// The full REGISTER pipeline (§4.4).
    pub async fn request(
        &self,
        app: &str,
        req: &SipRequest,
        now: u64,
        long_now: u64,
        listen_host: &str,
        listen_port: u16,
    ) -> RegistrarResult<RegisterReply> {
        if req.to.uri.scheme != sip_types::Scheme::Sip && req.to.uri.scheme != sip_types::Scheme::Sips {
            return Err(RegistrarError::UnsupportedUriScheme);
        }

        let (ob_proc, minted_path) = self.outbound_check(req, listen_host, listen_port).await?;
        let gruu_proc = self.config.supports_gruu && req.supported.iter().any(|t| t == "gruu");

        let aor = Aor::from_uri(&req.to.uri);
        let default_expires = req.expires.unwrap_or(self.config.default_expires);
        debug!(%aor, call_id = %req.call_id, contacts = req.contacts.len(), "processing REGISTER");

        if req.contacts.is_empty() {
            let live = self.live_contacts(app, &aor, now).await?;
            return Ok(RegisterReply {
                contacts: live,
                require_outbound: ob_proc == ObProc::True,
                minted_path,
            });
        }

        if req.contacts.len() == 1 && default_expires == 0 {
            if let ContactEntry::Star = &req.contacts[0] {
                self.delete_all_path(app, &aor, req, now).await?;
                return Ok(RegisterReply {
                    contacts: Vec::new(),
                    require_outbound: ob_proc == ObProc::True,
                    minted_path,
                });
            }
        }

        let mut several_reg_id = 0u32;
        for entry in &req.contacts {
            if let ContactEntry::Address { params, .. } = entry {
                if params.contains("reg-id") && Self::raw_expires(params, default_expires) != 0 {
                    several_reg_id += 1;
                }
            }
        }
        if several_reg_id > 1 {
            return Err(RegistrarError::invalid_request("Several 'reg-id' Options"));
        }

        let mut working = self.store_get(app, &aor).await?;
        working.retain(|c| c.is_live(now));

        for entry in &req.contacts {
            let ContactEntry::Address { uri, params } = entry else {
                return Err(RegistrarError::invalid_request("wildcard Contact mixed with others"));
            };
            process_contact(
                &mut working,
                uri,
                params,
                &aor,
                req,
                default_expires,
                &self.config,
                ob_proc,
                gruu_proc,
                now,
                long_now,
                &self.gruu_key,
                minted_path.as_ref(),
            )?;
        }

        if working.is_empty() {
            self.store_del(app, &aor).await?;
            debug!(%aor, "AOR has no live contacts left, removed");
        } else {
            let ttl = working.iter().map(|c| c.expire.saturating_sub(now)).max().unwrap_or(0).max(5);
            self.store_put(app, &aor, working.clone(), ttl).await?;
            debug!(%aor, contacts = working.len(), ttl, "stored registration");
        }

        Ok(RegisterReply {
            contacts: working,
            require_outbound: ob_proc == ObProc::True,
            minted_path,
        })
    }

    async fn live_contacts(&self, app: &str, aor: &Aor, now: u64) -> RegistrarResult<Vec<RegContact>> {
        let mut contacts = self.store_get(app, aor).await?;
        contacts.retain(|c| c.is_live(now));
        Ok(contacts)
    }

    async fn delete_all_path(&self, app: &str, aor: &Aor, req: &SipRequest, now: u64) -> RegistrarResult<()> {
        let existing = self.store_get(app, aor).await?;
        for entry in existing.iter().filter(|c| c.is_live(now)) {
            if entry.call_id == req.call_id && req.cseq <= entry.cseq {
                warn!(%aor, call_id = %req.call_id, cseq = req.cseq, "rejected replayed wildcard de-registration");
                return Err(RegistrarError::invalid_request("Rejected Old CSeq"));
            }
        }
        self.store_del(app, aor).await?;
        Ok(())
    }

    /// Raw (unclamped) per-contact `expires`, used only by the several-reg-id
    /// pre-scan.
    fn raw_expires(params: &Params, default_expires: u32) -> u32 {
        params.get("expires").and_then(|v| v.parse().ok()).unwrap_or(default_expires)
    }
}

/// Per-contact update logic, §4.4 steps a-j.
#[allow(clippy::too_many_arguments)]
fn process_contact(
    working: &mut Vec<RegContact>,
    uri: &Uri,
    params: &Params,
    aor: &Aor,
    req: &SipRequest,
    default_expires: u32,
    cfg: &RegistrarConfig,
    ob_proc: ObProc,
    gruu_proc: bool,
    now: u64,
    long_now: u64,
    gruu_key: &GruuKey,
    minted_path: Option<&Uri>,
) -> RegistrarResult<()> {
    // a. Contact sanity.
    if uri.host == "*" {
        return Err(RegistrarError::invalid_request("wildcard Contact domain"));
    }
    let (scheme, user, domain) = uri.aor_key();
    if scheme == aor.scheme && user == aor.user && domain == aor.domain {
        return Err(RegistrarError::forbidden("Contact loops back to AOR"));
    }
    if params.contains("gr") {
        if let Some(user_part) = &uri.user {
            if let Some(ticket) = gruu_key.decrypt(user_part) {
                if &ticket.aor == aor {
                    return Err(RegistrarError::forbidden("Invalid Contact"));
                }
            }
        }
    }

    // c. Expires.
    let raw_expires = params.get("expires").and_then(|v| v.parse::<u32>().ok()).unwrap_or(default_expires);
    let expires = if raw_expires == 0 {
        0
    } else if raw_expires < cfg.min_expires {
        return Err(RegistrarError::IntervalTooBrief { min: cfg.min_expires });
    } else {
        raw_expires.min(cfg.max_expires)
    };

    // d. q.
    let q = params
        .get("q")
        .and_then(|v| v.parse::<f32>().ok().or_else(|| v.parse::<i32>().ok().map(|i| i as f32)))
        .unwrap_or(1.0);
    if q <= 0.0 {
        return Err(RegistrarError::invalid_request("non-positive q value"));
    }

    // e. Instance id.
    let instance_id = params.get("+sip.instance").map(hash_instance).unwrap_or_default();

    // f. reg-id acceptance.
    let mut reg_id = params.get("reg-id").map(|s| s.to_string());
    if reg_id.is_some() && expires > 0 {
        if ob_proc == ObProc::False {
            return Err(RegistrarError::FirstHopLacksOutbound);
        }
        if ob_proc == ObProc::Unsupported || instance_id.is_empty() {
            reg_id = None;
        }
    } else {
        reg_id = None;
    }

    // g. Index.
    let index = match &reg_id {
        Some(rid) => ContactIndex::Ob {
            instance_id: instance_id.clone(),
            reg_id: rid.clone(),
        },
        None => ContactIndex::Net {
            scheme: uri.scheme,
            proto: req.transport.map(|t| t.proto).unwrap_or(TransportProto::Udp),
            user: uri.user.clone().unwrap_or_default(),
            domain: uri.host.clone(),
            port: uri.port.unwrap_or(5060),
        },
    };

    // h. Replacement lookup.
    let existing_pos = working.iter().position(|c| c.index == index);
    match existing_pos {
        None => {
            if expires > 0 {
                let contact = build_contact(
                    index, uri, params, aor, req, expires, q, now, long_now, 0, 0, &instance_id, reg_id, gruu_proc, gruu_key, minted_path,
                )?;
                working.push(contact);
            }
        }
        Some(pos) => {
            let same_call = working[pos].call_id == req.call_id;
            if same_call && req.cseq <= working[pos].cseq {
                return Err(RegistrarError::invalid_request("Rejected Old CSeq"));
            }
            if expires == 0 {
                working.remove(pos);
            } else if same_call {
                let next_tmp_pos = working[pos].next_tmp_pos;
                let min_tmp_pos = working[pos].min_tmp_pos;
                let contact = build_contact(
                    index, uri, params, aor, req, expires, q, now, long_now, min_tmp_pos, next_tmp_pos, &instance_id, reg_id, gruu_proc, gruu_key,
                    minted_path,
                )?;
                working[pos] = contact;
            } else {
                let min_tmp_pos = working[pos].next_tmp_pos;
                let contact = build_contact(
                    index, uri, params, aor, req, expires, q, now, long_now, min_tmp_pos, min_tmp_pos, &instance_id, reg_id, gruu_proc, gruu_key,
                    minted_path,
                )?;
                working[pos] = contact;
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn build_contact(
    index: ContactIndex,
    uri: &Uri,
    params: &Params,
    aor: &Aor,
    req: &SipRequest,
    expires: u32,
    q: f32,
    now: u64,
    long_now: u64,
    min_tmp_pos: u64,
    next_tmp_pos: u64,
    instance_id: &str,
    reg_id: Option<String>,
    gruu_proc: bool,
    gruu_key: &GruuKey,
    minted_path: Option<&Uri>,
) -> RegistrarResult<RegContact> {
    let mut stored_params = params.clone();
    stored_params.set("expires", expires.to_string());

    let mut next_tmp_pos = next_tmp_pos;
    // i. GRUU minting.
    if gruu_proc && !instance_id.is_empty() && reg_id.is_none() && expires > 0 {
        if uri.scheme != sip_types::Scheme::Sip {
            return Err(RegistrarError::forbidden("Invalid Contact"));
        }
        let pub_gruu = format!("<sip:{}@{};gr={}>", aor.user, aor.domain, instance_id);
        let ticket = GruuTicket {
            aor: aor.clone(),
            instance_id: instance_id.to_string(),
            pos: next_tmp_pos,
        };
        let ciphertext = gruu_key.encrypt(&ticket);
        let temp_gruu = format!("<sip:{ciphertext}@{};gr>", aor.domain);
        stored_params.set("pub-gruu", pub_gruu);
        stored_params.set("temp-gruu", temp_gruu);
        next_tmp_pos += 1;
    }

    Ok(RegContact {
        index,
        uri: uri.clone(),
        params: stored_params,
        updated: long_now,
        expire: now + u64::from(expires),
        q,
        call_id: req.call_id.clone(),
        cseq: req.cseq,
        transport: req.transport,
        path: minted_path.into_iter().cloned().chain(req.path.iter().cloned()).collect(),
        instance_id: instance_id.to_string(),
        reg_id,
        min_tmp_pos,
        next_tmp_pos,
    })
}
