//! GRUU temp-URI codec (RFC 5627, §4.5).
//!
//! `encrypt`/`decrypt` wrap an opaque `(AOR, instance_id, pos)` tuple into
//! the ciphertext that appears as the user part of a temp-GRUU. AES-128-CFB
//! with a fixed IV is retained for wire compatibility with temp-GRUUs
//! minted by prior versions of this codec — the IV's lack of per-message
//! randomness is acceptable only because the plaintext itself is already
//! unique per `(AOR, instance, position)`.

use aes::cipher::{AsyncStreamCipher, KeyIvInit};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use sip_types::Aor;

type Encryptor = cfb_mode::Encryptor<aes::Aes128>;
type Decryptor = cfb_mode::Decryptor<aes::Aes128>;

const FIXED_IV: [u8; 16] = *b"sip-gruu-iv-v1!!";

/// The plaintext a temp-GRUU ciphertext decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GruuTicket {
    pub aor: Aor,
    pub instance_id: String,
    pub pos: u64,
}

/// Opaque handle around the process-wide key used to mint/read temp-GRUUs.
///
/// Per the design notes, the key is an immutable value installed once at
/// startup and threaded through explicitly, never read from ambient global
/// state.
#[derive(Clone)]
pub struct GruuKey([u8; 16]);

impl GruuKey {
    /// Derive a key from a process-wide global id: the first 16 bytes,
    /// zero-padded if the id is shorter.
    pub fn from_global_id(global_id: &[u8]) -> Self {
        let mut key = [0u8; 16];
        let n = global_id.len().min(16);
        key[..n].copy_from_slice(&global_id[..n]);
        Self(key)
    }

    pub fn encrypt(&self, ticket: &GruuTicket) -> String {
        let plaintext = serde_json::to_vec(ticket).expect("GruuTicket always serializes");
        let mut buf = plaintext;
        Encryptor::new(&self.0.into(), &FIXED_IV.into()).encrypt(&mut buf);
        URL_SAFE_NO_PAD.encode(buf)
    }

    pub fn decrypt(&self, ciphertext: &str) -> Option<GruuTicket> {
        let mut buf = URL_SAFE_NO_PAD.decode(ciphertext).ok()?;
        Decryptor::new(&self.0.into(), &FIXED_IV.into()).decrypt(&mut buf);
        serde_json::from_slice(&buf).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_types::Scheme;

    fn key() -> GruuKey {
        GruuKey::from_global_id(b"test-process-global-id")
    }

    #[test]
    fn round_trips() {
        let ticket = GruuTicket {
            aor: Aor::new(Scheme::Sip, "alice", "example.com"),
            instance_id: "abc123".into(),
            pos: 7,
        };
        let ciphertext = key().encrypt(&ticket);
        assert_eq!(key().decrypt(&ciphertext), Some(ticket));
    }

    #[test]
    fn garbage_ciphertext_fails_to_decrypt() {
        assert_eq!(key().decrypt("not-valid-base64!!"), None);
    }

    #[test]
    fn different_keys_do_not_cross_decrypt() {
        let ticket = GruuTicket {
            aor: Aor::new(Scheme::Sip, "bob", "example.com"),
            instance_id: "xyz".into(),
            pos: 0,
        };
        let ciphertext = key().encrypt(&ticket);
        let other = GruuKey::from_global_id(b"different-global-id");
        assert_ne!(other.decrypt(&ciphertext), Some(ticket));
    }
}
