//! Public key entries for a DID document and their validation policy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::{equivalent_id, KEY_SEPARATOR};
use crate::error::Err;
use crate::{tracerr, Result};

/// Key encoding properties admitted on a public key entry, per the DID specification registries.
pub const ENCODINGS: [&str; 6] = [
    "publicKeyPem",
    "publicKeyJwk",
    "publicKeyHex",
    "publicKeyBase64",
    "publicKeyBase58",
    "publicKeyMultibase",
];

const REQUIRED: [&str; 3] = ["id", "type", "controller"];

/// A public key entry in a DID document. The key material is carried by exactly one
/// `publicKey`-prefixed property held in the flattened map, so any registered encoding can be
/// expressed without a dedicated field per encoding.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicKey {
    /// Identifier for the key: `<did>#<fragment>`. A bare fragment (or none at all) may be
    /// supplied when adding the key to a document; the document composes the full ID.
    pub id: String,

    /// The verification key type, e.g. `RsaVerificationKey2018`.
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID of the controller of this key. Defaults to the owning document's DID when left
    /// empty on add.
    pub controller: String,

    /// The key material: a single property named after its encoding, e.g.
    /// `"publicKeyHex": "1A2B3C"`.
    #[serde(flatten)]
    pub key: Map<String, Value>,
}

impl PublicKey {
    /// Start building a public key entry of the given type.
    #[must_use]
    pub fn builder(type_: impl Into<String>) -> PublicKeyBuilder {
        PublicKeyBuilder {
            key: PublicKey {
                type_: type_.into(),
                ..PublicKey::default()
            },
        }
    }
}

/// Builder for [`PublicKey`] entries. Assembles the entry without validating it: validation
/// happens when the entry is added to a document.
#[derive(Clone, Debug, Default)]
pub struct PublicKeyBuilder {
    key: PublicKey,
}

impl PublicKeyBuilder {
    /// Set the key's ID fragment (or full composite ID).
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.key.id = id.into();
        self
    }

    /// Set the key's controller.
    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.key.controller = controller.into();
        self
    }

    /// Set the key material under an explicit encoding property name.
    #[must_use]
    pub fn encoding(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key.key.insert(property.into(), value.into());
        self
    }

    /// Key material as PEM.
    #[must_use]
    pub fn pem(self, value: impl Into<String>) -> Self {
        self.encoding("publicKeyPem", value.into())
    }

    /// Key material as a JWK object.
    #[must_use]
    pub fn jwk(self, value: Value) -> Self {
        self.encoding("publicKeyJwk", value)
    }

    /// Key material as hex.
    #[must_use]
    pub fn hex(self, value: impl Into<String>) -> Self {
        self.encoding("publicKeyHex", value.into())
    }

    /// Key material as base-64.
    #[must_use]
    pub fn base64(self, value: impl Into<String>) -> Self {
        self.encoding("publicKeyBase64", value.into())
    }

    /// Key material as base-58.
    #[must_use]
    pub fn base58(self, value: impl Into<String>) -> Self {
        self.encoding("publicKeyBase58", value.into())
    }

    /// Key material as multibase.
    #[must_use]
    pub fn multibase(self, value: impl Into<String>) -> Self {
        self.encoding("publicKeyMultibase", value.into())
    }

    /// Assemble the entry.
    #[must_use]
    pub fn build(self) -> PublicKey {
        self.key
    }
}

/// Validate a candidate public key against the keys already on the document. The duplicate check
/// runs before the structural checks.
pub(crate) fn assert(candidate: &PublicKey, existing: &[PublicKey]) -> Result<()> {
    assert_id(candidate, existing)?;
    assert_required(candidate)?;
    assert_encodings(candidate)
}

fn assert_id(candidate: &PublicKey, existing: &[PublicKey]) -> Result<()> {
    let collision = existing.iter().any(|key| equivalent_id(&key.id, &candidate.id, KEY_SEPARATOR));
    if collision {
        tracerr!(Err::DuplicatePublicKey, "PublicKey with same {} already exists.", candidate.id);
    }
    Ok(())
}

fn assert_required(candidate: &PublicKey) -> Result<()> {
    let fields = [&candidate.id, &candidate.type_, &candidate.controller];
    for (name, value) in REQUIRED.iter().zip(fields) {
        if value.is_empty() {
            tracerr!(Err::InvalidPublicKey, "PublicKey requires `{}` to be defined.", name);
        }
    }
    Ok(())
}

fn assert_encodings(candidate: &PublicKey) -> Result<()> {
    let encodings: Vec<&String> =
        candidate.key.keys().filter(|name| name.starts_with("publicKey")).collect();
    if encodings.len() != 1 {
        tracerr!(
            Err::InvalidPublicKey,
            "Property prefixed by `publicKey` is required and must be unique"
        );
    }
    if !ENCODINGS.contains(&encodings[0].as_str()) {
        tracerr!(Err::InvalidPublicKey, "Encoding `{}` is invalid", encodings[0]);
    }
    Ok(())
}
