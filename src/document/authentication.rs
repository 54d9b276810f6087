//! Authentication references for a DID document and their validation policy.

use serde::{Deserialize, Serialize};

use crate::document::public_key::PublicKey;
use crate::error::Err;
use crate::{tracerr, Result};

/// An entry in a document's `authentication` sequence: either a reference to a public key held
/// elsewhere in the document, or an embedded key object. Documents mutated through this crate
/// only ever append references; embedded entries can still appear in hydrated content.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Authentication {
    /// The ID of a public key in the document's `publicKey` sequence.
    Reference(String),

    /// An embedded public key object.
    Embedded(PublicKey),
}

impl Authentication {
    /// The ID this entry resolves to.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Reference(id) => id,
            Self::Embedded(key) => &key.id,
        }
    }
}

impl From<&str> for Authentication {
    fn from(id: &str) -> Self {
        Self::Reference(id.to_string())
    }
}

/// Validate a resolved authentication reference against the references already on the document.
/// `resolved` is the outcome of looking the caller's reference up among the document's public
/// keys: `None` means no key matched.
pub(crate) fn assert(resolved: Option<&str>, existing: &[Authentication]) -> Result<String> {
    let Some(id) = resolved else {
        tracerr!(Err::InvalidAuthentication, "Invalid authentication.");
    };
    let collision = existing.iter().any(|auth| auth.id() == id);
    if collision {
        tracerr!(Err::DuplicateAuthentication, "Authentication with same {} already exists.", id);
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ID: &str = "did:ipid:QmUTE4cxTxihntPEFqTprgbqyyS9YRaRcC8FXp6PACEjFG#myId1";

    #[test]
    fn accepts_resolved_reference() {
        let id = assert(Some(KEY_ID), &[]).expect("should validate");
        assert_eq!(id, KEY_ID);
    }

    #[test]
    fn rejects_unresolved_reference() {
        let err = assert(None, &[]).expect_err("should fail");
        assert!(err.is(Err::InvalidAuthentication));
        assert_eq!(err.to_string(), "Invalid authentication.");
    }

    #[test]
    fn rejects_duplicates() {
        let existing = vec![Authentication::from(KEY_ID)];
        let err = assert(Some(KEY_ID), &existing).expect_err("should fail");
        assert!(err.is(Err::DuplicateAuthentication));
        assert_eq!(
            err.to_string(),
            format!("Authentication with same {KEY_ID} already exists.")
        );
    }

    #[test]
    fn embedded_entries_resolve_by_key_id() {
        let embedded = Authentication::Embedded(PublicKey {
            id: KEY_ID.to_string(),
            ..PublicKey::default()
        });
        let err = assert(Some(KEY_ID), &[embedded]).expect_err("should fail");
        assert!(err.is(Err::DuplicateAuthentication));
    }

    #[test]
    fn serializes_reference_as_string() {
        let auth = Authentication::from(KEY_ID);
        let value = serde_json::to_value(&auth).expect("should serialize");
        assert_eq!(value, serde_json::json!(KEY_ID));
    }
}
