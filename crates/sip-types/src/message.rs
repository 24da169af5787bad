//! Already-parsed request/response shapes handed to the dialog and
//! registrar engines by the (out-of-scope) message layer.
//!
//! These types intentionally do not know how to parse themselves off the
//! wire — building one from raw bytes is a collaborator's job. What they
//! provide is the handful of accessors the state machines actually read:
//! method/status, Call-ID, CSeq, From/To (with tags), Contact list, Via
//! count, Supported tokens, Path, Record-Route, Expires, and an opaque SDP
//! body when present.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::method::Method;
use crate::params::Params;
use crate::status::StatusCode;
use crate::uri::Uri;

/// A `From`/`To` header value: a URI plus an optional dialog tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUri {
    pub uri: Uri,
    pub tag: Option<String>,
}

impl NamedUri {
    pub fn new(uri: Uri) -> Self {
        Self { uri, tag: None }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// One `Contact` header entry.
///
/// RFC 3261 allows a REGISTER Contact list to contain the literal wildcard
/// `*` instead of a URI (only legal when `Expires: 0`), so this is an enum
/// rather than always carrying a [`Uri`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactEntry {
    /// The `Contact: *` wildcard (deregister-all).
    Star,
    /// A concrete contact URI with its ext-opts (`expires`, `q`,
    /// `+sip.instance`, `reg-id`, `pub-gruu`, `temp-gruu`, `gr`, …).
    Address { uri: Uri, params: Params },
}

/// Transport tuple describing how a message arrived/will be sent: the
/// protocol, the remote peer address, and the local listening address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    pub proto: TransportProto,
    pub remote_ip: std::net::IpAddr,
    pub remote_port: u16,
    pub listen_ip: std::net::IpAddr,
    pub listen_port: u16,
}

/// Transport protocol carrying the SIP message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportProto {
    Udp,
    Tcp,
    Tls,
    Sctp,
    Ws,
    Wss,
}

/// An inbound (or to-be-sent) SIP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipRequest {
    pub method: Method,
    pub call_id: String,
    pub cseq: u32,
    pub from: NamedUri,
    pub to: NamedUri,
    /// Request-URI.
    pub request_uri: Uri,
    pub contacts: Vec<ContactEntry>,
    /// Tokens from the `Supported` header (e.g. `"outbound"`, `"gruu"`).
    pub supported: Vec<String>,
    /// Number of `Via` headers present (used for the Outbound first-hop
    /// check: exactly one Via means this request has not yet traversed an
    /// intermediate proxy).
    pub via_count: usize,
    /// `Path` headers in wire order (index 0 = topmost/nearest).
    pub path: Vec<Uri>,
    /// `Route` headers in wire order.
    pub route: Vec<Uri>,
    /// Top-level `Expires` header, if present.
    pub expires: Option<u32>,
    pub transport: Option<Transport>,
    /// Opaque SDP body, if the message carries one.
    pub sdp: Option<Bytes>,
}

impl SipRequest {
    pub fn has_sdp(&self) -> bool {
        self.sdp.is_some()
    }
}

/// An inbound (or to-be-sent) SIP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipResponse {
    pub status: StatusCode,
    pub call_id: String,
    pub cseq: u32,
    pub cseq_method: Method,
    pub from: NamedUri,
    pub to: NamedUri,
    pub contacts: Vec<ContactEntry>,
    pub record_route: Vec<Uri>,
    pub supported: Vec<String>,
    pub require: Vec<String>,
    pub sdp: Option<Bytes>,
    /// Dialog identity stamped by the Response Decorator (§4.6) once this
    /// response has been matched to a dialog; `None` for out-of-dialog
    /// responses (e.g. failures before a dialog existed).
    pub dialog_id: Option<String>,
}

impl SipResponse {
    pub fn has_sdp(&self) -> bool {
        self.sdp.is_some()
    }
}
