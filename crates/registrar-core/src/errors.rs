//! Registrar error types and their SIP status mapping (§7).

use thiserror::Error;

use sip_types::StatusCode;

pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Rejections the REGISTER pipeline can produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrarError {
    /// Malformed REGISTER: multiple reg-ids, bad Path, old CSeq replay.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Per-contact `expires` below the configured minimum.
    #[error("interval too brief, minimum {min}")]
    IntervalTooBrief { min: u32 },

    /// REGISTER To-URI scheme is not `sip`/`sips`.
    #[error("unsupported URI scheme")]
    UnsupportedUriScheme,

    /// `reg-id` present but the first hop doesn't support Outbound.
    #[error("first hop lacks outbound support")]
    FirstHopLacksOutbound,

    /// Self-loop Contact or an invalid GRUU decryption.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// Store callback failure or invalid callback return shape.
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl RegistrarError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        RegistrarError::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        RegistrarError::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        RegistrarError::InternalError {
            message: message.into(),
        }
    }

    /// The SIP status this error surfaces as, per §7.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistrarError::InvalidRequest { .. } => StatusCode::BadRequest,
            RegistrarError::IntervalTooBrief { .. } => StatusCode::IntervalTooBrief,
            RegistrarError::UnsupportedUriScheme => StatusCode::UnsupportedUriScheme,
            RegistrarError::FirstHopLacksOutbound => StatusCode::FirstHopLacksOutboundSupport,
            RegistrarError::Forbidden { .. } => StatusCode::Forbidden,
            RegistrarError::InternalError { .. } => StatusCode::ServerInternalError,
        }
    }

    /// `Min-Expires` to report alongside a 423, when applicable.
    pub fn min_expires(&self) -> Option<u32> {
        match self {
            RegistrarError::IntervalTooBrief { min } => Some(*min),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            RegistrarError::invalid_request("x").status_code(),
            StatusCode::BadRequest
        );
        assert_eq!(
            RegistrarError::IntervalTooBrief { min: 60 }.status_code(),
            StatusCode::IntervalTooBrief
        );
        assert_eq!(
            RegistrarError::FirstHopLacksOutbound.status_code(),
            StatusCode::FirstHopLacksOutboundSupport
        );
    }

    #[test]
    fn min_expires_only_on_interval_too_brief() {
        let err = RegistrarError::IntervalTooBrief { min: 120 };
        assert_eq!(err.min_expires(), Some(120));
        assert_eq!(RegistrarError::UnsupportedUriScheme.min_expires(), None);
    }
}
