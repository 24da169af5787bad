//! Dialog identity.
//!
//! RFC 3261 §12 identifies a dialog by the triple (Call-ID, local tag,
//! remote tag). A request sees that pair as (From-tag, To-tag) and the
//! matching response sees it as (To-tag, From-tag) — same two tags, order
//! flipped. [`DialogId`] sorts the tag pair before hashing so a request's
//! id and its response's id are derivable independently and still collide,
//! without the caller having to track which side is "local".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, comparable dialog identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DialogId(String);

impl DialogId {
    /// Derive the id from a Call-ID and the dialog's two tags, in either
    /// order.
    pub fn from_tags(call_id: &str, tag_a: &str, tag_b: &str) -> Self {
        let (t1, t2) = if tag_a <= tag_b {
            (tag_a, tag_b)
        } else {
            (tag_b, tag_a)
        };
        Self(format!("{call_id}|{t1}|{t2}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_independent() {
        let from_request = DialogId::from_tags("call-1", "tagA", "tagB");
        let from_response = DialogId::from_tags("call-1", "tagB", "tagA");
        assert_eq!(from_request, from_response);
    }

    #[test]
    fn distinguishes_different_calls() {
        let a = DialogId::from_tags("call-1", "tagA", "tagB");
        let b = DialogId::from_tags("call-2", "tagA", "tagB");
        assert_ne!(a, b);
    }
}
