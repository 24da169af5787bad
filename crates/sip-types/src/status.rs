//! SIP status codes used by the dialog and registrar engines.
//!
//! This is not the full IANA registry — only the codes the core state
//! machines themselves emit or branch on (RFC 3261 §21 plus the RFC 5057
//! dialog-ending set and the RFC 5626/5627 extension codes). A response
//! observed off the wire with a code not listed here is represented as
//! [`StatusCode::Other`].
//!
//! ```
//! use sip_types::StatusCode;
//!
//! let status = StatusCode::Ok;
//! assert_eq!(status.as_u16(), 200);
//! assert!(status.is_success());
//! assert!(!status.is_error());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A SIP response status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// 100 Trying
    Trying,
    /// 180 Ringing
    Ringing,
    /// 181 Call Is Being Forwarded
    CallIsBeingForwarded,
    /// 182 Queued
    Queued,
    /// 183 Session Progress
    SessionProgress,
    /// 200 OK
    Ok,
    /// 202 Accepted
    Accepted,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found — RFC 5057 dialog-ending
    NotFound,
    /// 410 Gone — RFC 5057 dialog-ending
    Gone,
    /// 416 Unsupported URI Scheme — RFC 5057 dialog-ending
    UnsupportedUriScheme,
    /// 423 Interval Too Brief
    IntervalTooBrief,
    /// 439 First Hop Lacks Outbound Support (RFC 5626)
    FirstHopLacksOutboundSupport,
    /// 481 Call/Transaction Does Not Exist
    CallOrTransactionDoesNotExist,
    /// 482 Loop Detected — RFC 5057 dialog-ending
    LoopDetected,
    /// 483 Too Many Hops — RFC 5057 dialog-ending
    TooManyHops,
    /// 484 Address Incomplete — RFC 5057 dialog-ending
    AddressIncomplete,
    /// 485 Ambiguous — RFC 5057 dialog-ending
    Ambiguous,
    /// 491 Request Pending
    RequestPending,
    /// 500 Server Internal Error
    ServerInternalError,
    /// 502 Bad Gateway — RFC 5057 dialog-ending
    BadGateway,
    /// 604 Does Not Exist Anywhere — RFC 5057 dialog-ending
    DoesNotExistAnywhere,
    /// Any code not enumerated above, preserved verbatim.
    Other(u16),
}

impl StatusCode {
    /// The numeric status code.
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Trying => 100,
            StatusCode::Ringing => 180,
            StatusCode::CallIsBeingForwarded => 181,
            StatusCode::Queued => 182,
            StatusCode::SessionProgress => 183,
            StatusCode::Ok => 200,
            StatusCode::Accepted => 202,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::Gone => 410,
            StatusCode::UnsupportedUriScheme => 416,
            StatusCode::IntervalTooBrief => 423,
            StatusCode::FirstHopLacksOutboundSupport => 439,
            StatusCode::CallOrTransactionDoesNotExist => 481,
            StatusCode::LoopDetected => 482,
            StatusCode::TooManyHops => 483,
            StatusCode::AddressIncomplete => 484,
            StatusCode::Ambiguous => 485,
            StatusCode::RequestPending => 491,
            StatusCode::ServerInternalError => 500,
            StatusCode::BadGateway => 502,
            StatusCode::DoesNotExistAnywhere => 604,
            StatusCode::Other(code) => *code,
        }
    }

    /// Construct from a numeric code, mapping unknown codes to `Other`.
    pub fn from_u16(code: u16) -> Self {
        match code {
            100 => StatusCode::Trying,
            180 => StatusCode::Ringing,
            181 => StatusCode::CallIsBeingForwarded,
            182 => StatusCode::Queued,
            183 => StatusCode::SessionProgress,
            200 => StatusCode::Ok,
            202 => StatusCode::Accepted,
            400 => StatusCode::BadRequest,
            403 => StatusCode::Forbidden,
            404 => StatusCode::NotFound,
            410 => StatusCode::Gone,
            416 => StatusCode::UnsupportedUriScheme,
            423 => StatusCode::IntervalTooBrief,
            439 => StatusCode::FirstHopLacksOutboundSupport,
            481 => StatusCode::CallOrTransactionDoesNotExist,
            482 => StatusCode::LoopDetected,
            483 => StatusCode::TooManyHops,
            484 => StatusCode::AddressIncomplete,
            485 => StatusCode::Ambiguous,
            491 => StatusCode::RequestPending,
            500 => StatusCode::ServerInternalError,
            502 => StatusCode::BadGateway,
            604 => StatusCode::DoesNotExistAnywhere,
            other => StatusCode::Other(other),
        }
    }

    /// `1xx`.
    pub fn is_provisional(&self) -> bool {
        (100..200).contains(&self.as_u16())
    }

    /// `2xx`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// `>= 300`.
    pub fn is_final_non_success(&self) -> bool {
        self.as_u16() >= 300
    }

    /// `>= 300` (alias kept for call sites that read as "is an error").
    pub fn is_error(&self) -> bool {
        self.is_final_non_success()
    }

    /// True for the RFC 5057 dialog-ending status code set: `{404, 410,
    /// 416, 482, 483, 484, 485, 502, 604}`.
    pub fn is_dialog_ending(&self) -> bool {
        matches!(
            self,
            StatusCode::NotFound
                | StatusCode::Gone
                | StatusCode::UnsupportedUriScheme
                | StatusCode::LoopDetected
                | StatusCode::TooManyHops
                | StatusCode::AddressIncomplete
                | StatusCode::Ambiguous
                | StatusCode::BadGateway
                | StatusCode::DoesNotExistAnywhere
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_roundtrip() {
        for code in [100, 180, 200, 404, 481, 491, 500, 604, 999] {
            assert_eq!(StatusCode::from_u16(code).as_u16(), code);
        }
    }

    #[test]
    fn dialog_ending_set_matches_rfc5057() {
        let ending: Vec<u16> = [404, 410, 416, 482, 483, 484, 485, 502, 604]
            .iter()
            .copied()
            .collect();
        for code in 100..700 {
            let is_ending = StatusCode::from_u16(code).is_dialog_ending();
            assert_eq!(is_ending, ending.contains(&code), "code {code}");
        }
    }

    #[test]
    fn classification() {
        assert!(StatusCode::Trying.is_provisional());
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::ServerInternalError.is_error());
        assert!(!StatusCode::Ok.is_error());
    }
}
