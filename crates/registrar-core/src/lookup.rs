//! Registrar-backed URI resolution: plain AOR lookup, GRUU fan-out, q-value
//! forking order, and "did this request come from a registered contact".

use sip_types::{Aor, SipRequest, Uri};

use crate::errors::RegistrarResult;
use crate::gruu::GruuKey;
use crate::store::RegistrarStore;

/// What [`find`] resolves: either a bare AOR, or a URI that might itself be
/// a public or temporary GRUU.
pub enum Target<'a> {
    Aor(&'a Aor),
    Uri(&'a Uri),
}

/// Resolve `target` to the live contact URIs currently bound to it.
///
/// A [`Target::Uri`] carrying a valued `gr=<instance>` parameter (a
/// public GRUU) is resolved by AOR + instance match; one carrying a bare
/// `gr` flag (a temporary GRUU) has its user part decrypted to recover the
/// `(AOR, instance, pos)` ticket, and resolves to that instance's current
/// contact as long as the ticket's position hasn't been invalidated by a
/// later Call-ID change (`pos >= min_tmp_pos`). Anything else is treated as
/// a plain AOR lookup.
pub async fn find<S: RegistrarStore>(
    store: &S,
    gruu_key: &GruuKey,
    app: &str,
    target: Target<'_>,
    now: u64,
) -> RegistrarResult<Vec<Uri>> {
    let uri = match target {
        Target::Aor(aor) => {
            let contacts = store.get(app, aor).await?;
            return Ok(contacts.into_iter().filter(|c| c.is_live(now)).map(|c| c.uri).collect());
        }
        Target::Uri(uri) => uri,
    };

    if let Some(instance_id) = uri.params.get("gr") {
        let aor = Aor::from_uri(uri);
        let contacts = store.get(app, &aor).await?;
        return Ok(contacts
            .into_iter()
            .filter(|c| c.is_live(now) && c.instance_id == instance_id)
            .map(|c| c.uri)
            .collect());
    }

    if uri.params.contains("gr") {
        let Some(user) = &uri.user else {
            return Ok(Vec::new());
        };
        let Some(ticket) = gruu_key.decrypt(user) else {
            return Ok(Vec::new());
        };
        let contacts = store.get(app, &ticket.aor).await?;
        return Ok(contacts
            .into_iter()
            .filter(|c| c.is_live(now) && c.instance_id == ticket.instance_id && ticket.pos >= c.min_tmp_pos)
            .map(|c| c.uri)
            .collect());
    }

    let aor = Aor::from_uri(uri);
    let contacts = store.get(app, &aor).await?;
    Ok(contacts.into_iter().filter(|c| c.is_live(now)).map(|c| c.uri).collect())
}

/// Live contacts for `aor`, grouped into forking buckets ordered by
/// descending `q` (ties broken by ascending `updated`, so the
/// longest-standing registration in a priority tier is tried first).
pub async fn qfind<S: RegistrarStore>(store: &S, app: &str, aor: &Aor, now: u64) -> RegistrarResult<Vec<Vec<Uri>>> {
    let mut contacts: Vec<_> = store.get(app, aor).await?.into_iter().filter(|c| c.is_live(now)).collect();
    contacts.sort_by(|a, b| {
        let key_a = (1.0_f32 / a.q, a.updated);
        let key_b = (1.0_f32 / b.q, b.updated);
        key_a.partial_cmp(&key_b).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut groups: Vec<Vec<Uri>> = Vec::new();
    let mut last_q: Option<f32> = None;
    for contact in contacts {
        if last_q != Some(contact.q) {
            groups.push(Vec::new());
            last_q = Some(contact.q);
        }
        groups.last_mut().expect("just pushed").push(contact.uri);
    }
    Ok(groups)
}

/// Whether `req`'s From AOR has a matching live registration: when `req`
/// carries transport info, requires an exact `(proto, remote ip, remote
/// port)` match against one of the AOR's stored contacts; otherwise falls
/// back to resolving purely by the From URI's AOR identity (any live
/// contact at all).
pub async fn is_registered<S: RegistrarStore>(store: &S, app: &str, req: &SipRequest, now: u64) -> RegistrarResult<bool> {
    let aor = Aor::from_uri(&req.from.uri);
    let contacts: Vec<_> = store.get(app, &aor).await?.into_iter().filter(|c| c.is_live(now)).collect();

    if contacts.is_empty() {
        return Ok(false);
    }
    match &req.transport {
        Some(transport) => Ok(contacts.iter().any(|c| {
            c.transport.as_ref().is_some_and(|t| {
                t.proto == transport.proto && t.remote_ip == transport.remote_ip && t.remote_port == transport.remote_port
            })
        })),
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRegistrarStore;
    use crate::types::{ContactIndex, RegContact};
    use sip_types::{Method, NamedUri, Params, Scheme, Transport, TransportProto};

    fn udp_transport() -> Transport {
        Transport {
            proto: TransportProto::Udp,
            remote_ip: "127.0.0.1".parse().unwrap(),
            remote_port: 5060,
            listen_ip: "127.0.0.1".parse().unwrap(),
            listen_port: 5060,
        }
    }

    fn contact(uri: Uri, q: f32, updated: u64, instance_id: &str) -> RegContact {
        RegContact {
            index: ContactIndex::Net {
                scheme: Scheme::Sip,
                proto: TransportProto::Udp,
                user: uri.user.clone().unwrap_or_default(),
                domain: uri.host.clone(),
                port: uri.port.unwrap_or(5060),
            },
            uri,
            params: Params::new(),
            updated,
            expire: 10_000,
            q,
            call_id: "call".into(),
            cseq: 1,
            transport: Some(udp_transport()),
            path: vec![],
            instance_id: instance_id.into(),
            reg_id: None,
            min_tmp_pos: 0,
            next_tmp_pos: 1,
        }
    }

    #[tokio::test]
    async fn find_by_aor_returns_live_uris() {
        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        let uri = Uri::sip("1.2.3.4").with_user("alice");
        store.put("app", &aor, vec![contact(uri.clone(), 1.0, 0, "")], 100).await.unwrap();

        let key = GruuKey::from_global_id(b"k");
        let found = find(&store, &key, "app", Target::Aor(&aor), 0).await.unwrap();
        assert_eq!(found, vec![uri]);
    }

    #[tokio::test]
    async fn find_by_pub_gruu_matches_instance() {
        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        let uri = Uri::sip("1.2.3.4").with_user("alice");
        store.put("app", &aor, vec![contact(uri.clone(), 1.0, 0, "inst-1")], 100).await.unwrap();

        let key = GruuKey::from_global_id(b"k");
        let gruu_uri = Uri::sip("example.com").with_user("alice").with_param("gr", "inst-1");
        let found = find(&store, &key, "app", Target::Uri(&gruu_uri), 0).await.unwrap();
        assert_eq!(found, vec![uri]);
    }

    #[tokio::test]
    async fn find_by_temp_gruu_decrypts_and_matches() {
        use crate::gruu::GruuTicket;

        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        let uri = Uri::sip("1.2.3.4").with_user("alice");
        store.put("app", &aor, vec![contact(uri.clone(), 1.0, 0, "inst-1")], 100).await.unwrap();

        let key = GruuKey::from_global_id(b"k");
        let ciphertext = key.encrypt(&GruuTicket {
            aor: aor.clone(),
            instance_id: "inst-1".into(),
            pos: 0,
        });
        let mut gruu_uri = Uri::sip("example.com").with_user(ciphertext);
        gruu_uri.params.set_flag("gr");
        let found = find(&store, &key, "app", Target::Uri(&gruu_uri), 0).await.unwrap();
        assert_eq!(found, vec![uri]);
    }

    #[tokio::test]
    async fn temp_gruu_below_min_tmp_pos_does_not_resolve() {
        use crate::gruu::GruuTicket;

        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        let mut stale_contact = contact(Uri::sip("1.2.3.4").with_user("alice"), 1.0, 0, "inst-1");
        stale_contact.min_tmp_pos = 5;
        store.put("app", &aor, vec![stale_contact], 100).await.unwrap();

        let key = GruuKey::from_global_id(b"k");
        let ciphertext = key.encrypt(&GruuTicket {
            aor: aor.clone(),
            instance_id: "inst-1".into(),
            pos: 2,
        });
        let mut gruu_uri = Uri::sip("example.com").with_user(ciphertext);
        gruu_uri.params.set_flag("gr");
        let found = find(&store, &key, "app", Target::Uri(&gruu_uri), 0).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn qfind_groups_by_q_and_sorts_by_updated_within_group() {
        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        let high_new = contact(Uri::sip("1.1.1.1").with_user("alice"), 1.0, 50, "");
        let high_old = contact(Uri::sip("2.2.2.2").with_user("alice"), 1.0, 10, "");
        let low = contact(Uri::sip("3.3.3.3").with_user("alice"), 0.5, 0, "");
        store.put("app", &aor, vec![high_new, high_old, low], 100).await.unwrap();

        let groups = qfind(&store, "app", &aor, 0).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![Uri::sip("2.2.2.2").with_user("alice"), Uri::sip("1.1.1.1").with_user("alice")]);
        assert_eq!(groups[1], vec![Uri::sip("3.3.3.3").with_user("alice")]);
    }

    #[tokio::test]
    async fn is_registered_matches_by_transport_then_uri() {
        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        store
            .put("app", &aor, vec![contact(Uri::sip("1.2.3.4").with_user("alice"), 1.0, 0, "")], 100)
            .await
            .unwrap();

        let req = SipRequest {
            method: Method::Invite,
            call_id: "c".into(),
            cseq: 1,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")),
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
        assert!(is_registered(&store, "app", &req, 0).await.unwrap());

        let mut req2 = req.clone();
        req2.from = NamedUri::new(Uri::sip("example.com").with_user("carol"));
        assert!(!is_registered(&store, "app", &req2, 0).await.unwrap());

        let mut req3 = req.clone();
        req3.transport = Some(Transport {
            proto: TransportProto::Tcp,
            ..udp_transport()
        });
        assert!(!is_registered(&store, "app", &req3, 0).await.unwrap());

        let mut req4 = req;
        req4.transport = Some(udp_transport());
        assert!(is_registered(&store, "app", &req4, 0).await.unwrap());
    }

    #[tokio::test]
    async fn is_registered_requires_matching_port_not_just_protocol() {
        let store = InMemoryRegistrarStore::new();
        let aor = Aor::new(Scheme::Sip, "alice", "example.com");
        store
            .put("app", &aor, vec![contact(Uri::sip("1.2.3.4").with_user("alice"), 1.0, 0, "")], 100)
            .await
            .unwrap();

        let mut req = SipRequest {
            method: Method::Invite,
            call_id: "c".into(),
            cseq: 1,
            from: NamedUri::new(Uri::sip("example.com").with_user("alice")),
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
        req.transport = Some(Transport {
            remote_port: 9999,
            ..udp_transport()
        });
        assert!(!is_registered(&store, "app", &req, 0).await.unwrap());
    }
}
