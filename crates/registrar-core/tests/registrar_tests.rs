//! Integration scenarios driven through `RegistrarEngine`'s public API.

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use registrar_core::{GruuKey, InMemoryRegistrarStore, OutboundFlowLookup, RegistrarConfig, RegistrarEngine};
use sip_types::{ContactEntry, Method, NamedUri, Params, Scheme, SipRequest, Transport, TransportProto, Uri};

fn config() -> RegistrarConfig {
    RegistrarConfig {
        supports_outbound: true,
        supports_gruu: true,
        default_expires: 3600,
        min_expires: 60,
        max_expires: 86_400,
        store_timeout: std::time::Duration::from_secs(5),
    }
}

fn register(contact_uri: Uri, contact_params: Params, cseq: u32, call_id: &str) -> SipRequest {
    SipRequest {
        method: Method::Register,
        call_id: call_id.into(),
        cseq,
        from: NamedUri::new(Uri::sip("example.com").with_user("alice")),
        to: NamedUri::new(Uri::sip("example.com").with_user("alice")),
        request_uri: Uri::sip("example.com"),
        contacts: vec![ContactEntry::Address {
            uri: contact_uri,
            params: contact_params,
        }],
        supported: vec![],
        via_count: 1,
        path: vec![],
        route: vec![],
        expires: Some(3600),
        transport: None,
        sdp: None,
    }
}

/// A single active flow, keyed by remote port, for the Outbound scenario.
struct OneFlow {
    remote_port: u16,
    token: Vec<u8>,
}

#[async_trait]
impl OutboundFlowLookup for OneFlow {
    async fn find_flow(&self, transport: &Transport) -> Option<Vec<u8>> {
        if transport.remote_port == self.remote_port {
            Some(self.token.clone())
        } else {
            None
        }
    }
}

#[tokio::test]
async fn s5_registration_replacement_is_unique_per_index() {
    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"s5"), config());

    let first = register(Uri::sip("10.0.0.1").with_user("alice").with_port(5060), Params::new(), 1, "call-a");
    let reply = engine.request("app", &first, 0, 0, "registrar.example.com", 5060).await.unwrap();
    assert_eq!(reply.contacts.len(), 1);

    // A REGISTER with an old CSeq on the same Call-ID for the same index is
    // rejected rather than silently ignored.
    let replay = register(Uri::sip("10.0.0.1").with_user("alice").with_port(5060), Params::new(), 1, "call-a");
    let err = engine.request("app", &replay, 1, 1, "registrar.example.com", 5060).await.unwrap_err();
    assert!(matches!(err, registrar_core::RegistrarError::InvalidRequest { .. }));

    // A fresh CSeq on the same Call-ID refreshes the same entry in place.
    let refresh = register(Uri::sip("10.0.0.1").with_user("alice").with_port(5060), Params::new(), 2, "call-a");
    let reply = engine.request("app", &refresh, 2, 2, "registrar.example.com", 5060).await.unwrap();
    assert_eq!(reply.contacts.len(), 1);
    assert_eq!(reply.contacts[0].cseq, 2);
}

#[tokio::test]
async fn s6_outbound_reg_id_flow_mints_path_and_requires_outbound() {
    let flows = OneFlow {
        remote_port: 9999,
        token: b"flow-token-bytes".to_vec(),
    };
    let engine = RegistrarEngine::with_flows(
        Arc::new(InMemoryRegistrarStore::new()),
        Arc::new(flows),
        GruuKey::from_global_id(b"s6"),
        config(),
    );

    let mut req = register(
        Uri::sip("10.0.0.2").with_user("alice").with_port(5060),
        Params::new().with("reg-id", "1").with("+sip.instance", "urn:uuid:device-1"),
        1,
        "call-b",
    );
    req.supported = vec!["outbound".into()];
    req.transport = Some(Transport {
        proto: TransportProto::Udp,
        remote_ip: "10.0.0.2".parse::<IpAddr>().unwrap(),
        remote_port: 9999,
        listen_ip: "203.0.113.1".parse::<IpAddr>().unwrap(),
        listen_port: 5060,
    });

    let reply = engine.request("app", &req, 0, 0, "registrar.example.com", 5060).await.unwrap();
    assert!(reply.require_outbound);
    let path = reply.minted_path.expect("Outbound flow should mint a Path URI");
    assert!(path.params.contains("lr"));
    assert!(path.user.as_deref().unwrap().starts_with("NkF"));

    assert_eq!(reply.contacts.len(), 1);
    assert_eq!(reply.contacts[0].reg_id.as_deref(), Some("1"));
    // The minted Path URI is merged into the stored contact's own path,
    // not just handed back in the reply — otherwise it is lost the next
    // time this AOR's contacts are read from the store.
    assert_eq!(reply.contacts[0].path.first(), Some(&path));

    // A second registration for a different instance over the same first
    // hop, without an active flow, is accepted as Outbound-unsupported and
    // the reg-id is dropped rather than rejected.
    let mut req2 = register(
        Uri::sip("10.0.0.3").with_user("alice").with_port(5060),
        Params::new().with("reg-id", "1").with("+sip.instance", "urn:uuid:device-2"),
        1,
        "call-c",
    );
    req2.supported = vec!["outbound".into()];
    req2.transport = Some(Transport {
        proto: TransportProto::Udp,
        remote_ip: "10.0.0.3".parse::<IpAddr>().unwrap(),
        remote_port: 12345,
        listen_ip: "203.0.113.1".parse::<IpAddr>().unwrap(),
        listen_port: 5060,
    });
    let err = engine.request("app", &req2, 1, 1, "registrar.example.com", 5060).await.unwrap_err();
    assert!(matches!(err, registrar_core::RegistrarError::FirstHopLacksOutbound));
}

#[tokio::test]
async fn s7_wildcard_deregister_all_is_replay_protected() {
    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"s7"), config());

    let first = register(Uri::sip("10.0.0.9").with_user("alice").with_port(5060), Params::new(), 9, "call-z");
    engine.request("app", &first, 0, 0, "registrar.example.com", 5060).await.unwrap();

    let mut replay = register(Uri::sip("0.0.0.0").with_user("ignored"), Params::new(), 9, "call-z");
    replay.expires = Some(0);
    replay.contacts = vec![ContactEntry::Star];
    let err = engine.request("app", &replay, 1, 1, "registrar.example.com", 5060).await.unwrap_err();
    assert!(matches!(err, registrar_core::RegistrarError::InvalidRequest { .. }));

    let mut ok = register(Uri::sip("0.0.0.0").with_user("ignored"), Params::new(), 10, "call-z");
    ok.expires = Some(0);
    ok.contacts = vec![ContactEntry::Star];
    let reply = engine.request("app", &ok, 2, 2, "registrar.example.com", 5060).await.unwrap();
    assert!(reply.contacts.is_empty());
}

#[tokio::test]
async fn gruu_round_trips_through_a_full_registration() {
    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"gruu"), config());

    let mut req = register(
        Uri::sip("10.0.0.5").with_user("alice").with_port(5060),
        Params::new().with("+sip.instance", "urn:uuid:device-9"),
        1,
        "call-g",
    );
    req.supported = vec!["gruu".into()];
    let reply = engine.request("app", &req, 0, 0, "registrar.example.com", 5060).await.unwrap();

    let pub_gruu = reply.contacts[0].params.get("pub-gruu").expect("pub-gruu minted");
    assert!(pub_gruu.contains("alice@example.com"));
    let temp_gruu = reply.contacts[0].params.get("temp-gruu").expect("temp-gruu minted");
    assert!(temp_gruu.contains("@example.com"));
}

#[tokio::test]
async fn temp_gruu_position_invalidated_by_call_id_change() {
    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"inval"), config());

    let params = Params::new().with("+sip.instance", "urn:uuid:device-7");
    let mut req = register(Uri::sip("10.0.0.6").with_user("alice").with_port(5060), params.clone(), 1, "call-x");
    req.supported = vec!["gruu".into()];
    let reply = engine.request("app", &req, 0, 0, "registrar.example.com", 5060).await.unwrap();
    let first_min_tmp_pos = reply.contacts[0].min_tmp_pos;

    // Re-register the same network index under a different Call-ID -- the
    // replacement must raise min_tmp_pos so any previously minted temp-GRUU
    // stops resolving.
    let mut req2 = register(Uri::sip("10.0.0.6").with_user("alice").with_port(5060), params, 1, "call-y");
    req2.supported = vec!["gruu".into()];
    let reply2 = engine.request("app", &req2, 1, 1, "registrar.example.com", 5060).await.unwrap();

    assert!(reply2.contacts[0].min_tmp_pos >= first_min_tmp_pos);
}

#[tokio::test]
async fn expired_contacts_are_excluded_from_the_live_set() {
    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"exp"), config());

    let params = Params::new().with("expires", "60");
    let req = register(Uri::sip("10.0.0.7").with_user("alice").with_port(5060), params, 1, "call-e");
    engine.request("app", &req, 0, 0, "registrar.example.com", 5060).await.unwrap();

    // Past the registered expiry, an empty-Contact REGISTER (a plain
    // fetch-current-bindings query) must report no live contacts.
    let mut fetch = register(Uri::sip("10.0.0.7").with_user("alice"), Params::new(), 2, "call-e");
    fetch.contacts = vec![];
    let reply = engine.request("app", &fetch, 1000, 1000, "registrar.example.com", 5060).await.unwrap();
    assert!(reply.contacts.is_empty());
}

#[tokio::test]
async fn q_value_orders_the_forking_groups() {
    use registrar_core::Target;

    let engine = RegistrarEngine::new(Arc::new(InMemoryRegistrarStore::new()), GruuKey::from_global_id(b"q"), config());

    let hi = register(
        Uri::sip("10.0.1.1").with_user("alice").with_port(5060),
        Params::new().with("q", "1.0"),
        1,
        "call-hi",
    );
    engine.request("app", &hi, 0, 0, "registrar.example.com", 5060).await.unwrap();

    let lo = register(
        Uri::sip("10.0.1.2").with_user("alice").with_port(5060),
        Params::new().with("q", "0.2"),
        1,
        "call-lo",
    );
    engine.request("app", &lo, 1, 1, "registrar.example.com", 5060).await.unwrap();

    let aor = sip_types::Aor::new(Scheme::Sip, "alice", "example.com");
    let groups = registrar_core::lookup::qfind(&*engine.store, "app", &aor, 2).await.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0], vec![Uri::sip("10.0.1.1").with_user("alice").with_port(5060)]);
    assert_eq!(groups[1], vec![Uri::sip("10.0.1.2").with_user("alice").with_port(5060)]);

    let found = registrar_core::lookup::find(&*engine.store, &engine.gruu_key, "app", Target::Aor(&aor), 2)
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}
