//! DID document content, the mutable document aggregate and raw-content validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::did::{compose_id, equivalent_id, Did, KEY_SEPARATOR, SERVICE_SEPARATOR};
use crate::error::Err;
use crate::hash::{self, Generator};
use crate::{tracerr, Result};

pub mod authentication;
pub mod public_key;
pub mod service;

use crate::document::authentication::Authentication;
use crate::document::public_key::PublicKey;
use crate::document::service::Service;

/// The canonical JSON-LD context for DID documents managed by this crate.
pub const DID_CONTEXT: &str = "https://w3id.org/did/v1";

/// The content of a DID document. This is the serializable state owned by a [`Document`]: empty
/// sequences and absent timestamps are elided from serialized output, while unknown top-level
/// properties of hydrated content are preserved verbatim.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentContent {
    /// The JSON-LD context. Must equal [`DID_CONTEXT`].
    #[serde(rename = "@context")]
    pub context: String,

    /// The document's DID. Immutable after creation.
    pub id: String,

    /// When the document was created. Set once at construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// When the document was last mutated. Refreshed on every successful mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    /// Public keys, ordered, unique by fragment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub public_key: Vec<PublicKey>,

    /// Authentication references, ordered, unique by resolved ID. Each references an entry in
    /// `public_key`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<Authentication>,

    /// Services, ordered, unique by fragment.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,

    /// Unknown top-level properties of hydrated content, preserved verbatim.
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

/// A mutable DID document. Owns its content privately: all mutation goes through the operations
/// below, each of which validates first and only then applies, so a failed operation leaves the
/// document untouched.
#[derive(Clone, Debug)]
pub struct Document {
    content: DocumentContent,
    generate: Generator,
}

impl Document {
    /// Create a fresh document for a DID: canonical context, the DID and a creation timestamp.
    #[must_use]
    pub fn new(did: &str) -> Self {
        Self {
            content: DocumentContent {
                context: DID_CONTEXT.to_string(),
                id: did.to_string(),
                created: Some(Utc::now()),
                ..DocumentContent::default()
            },
            generate: hash::rand_fragment,
        }
    }

    /// Hydrate a document from previously resolved content.
    #[must_use]
    pub fn from_content(content: DocumentContent) -> Self {
        Self {
            content,
            generate: hash::rand_fragment,
        }
    }

    /// Replace the fragment generator. Tests use this to pin generated IDs.
    #[must_use]
    pub fn with_id_generator(mut self, generate: Generator) -> Self {
        self.generate = generate;
        self
    }

    /// The document's DID.
    #[must_use]
    pub fn did(&self) -> &str {
        &self.content.id
    }

    /// An owned snapshot of the document content. Later operations on the document never mutate
    /// a previously returned snapshot.
    #[must_use]
    pub fn content(&self) -> DocumentContent {
        self.content.clone()
    }

    /// Add a public key to the document. A missing ID fragment is generated and a missing
    /// controller defaults to the document's DID. Returns the stored entry.
    ///
    /// # Errors
    ///
    /// * `Err::DuplicatePublicKey` - A key with an equivalent ID already exists.
    /// * `Err::InvalidPublicKey` - The entry fails structural validation.
    pub fn add_public_key(&mut self, key: PublicKey) -> Result<PublicKey> {
        let mut key = key;
        key.id = compose_id(&self.content.id, Some(&key.id), KEY_SEPARATOR, self.generate);
        if key.controller.is_empty() {
            key.controller = self.content.id.clone();
        }

        public_key::assert(&key, &self.content.public_key)?;

        self.content.public_key.push(key.clone());
        self.refresh_updated();

        Ok(key)
    }

    /// Revoke a public key by full or short ID. Removes any authentication reference to the key
    /// in the same operation. A miss is a no-op: the document (including `updated`) is left
    /// untouched.
    pub fn revoke_public_key(&mut self, id: &str) {
        let count = self.content.public_key.len();
        self.content.public_key.retain(|key| !equivalent_id(&key.id, id, KEY_SEPARATOR));
        if self.content.public_key.len() == count {
            return;
        }

        self.content.authentication.retain(|auth| !equivalent_id(id, auth.id(), KEY_SEPARATOR));
        self.refresh_updated();
    }

    /// Add an authentication reference for an existing public key, passed as a full composite ID
    /// or a bare fragment. Returns the resolved full ID that was stored.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidAuthentication` - No public key on the document matches the reference.
    /// * `Err::DuplicateAuthentication` - The key is already referenced.
    pub fn add_authentication(&mut self, reference: &str) -> Result<String> {
        let resolved = self
            .content
            .public_key
            .iter()
            .find(|key| equivalent_id(&key.id, reference, KEY_SEPARATOR))
            .map(|key| key.id.clone());

        let id = authentication::assert(resolved.as_deref(), &self.content.authentication)?;

        self.content.authentication.push(Authentication::Reference(id.clone()));
        self.refresh_updated();

        Ok(id)
    }

    /// Remove an authentication reference by full or short ID. A miss is a no-op.
    pub fn remove_authentication(&mut self, id: &str) {
        let count = self.content.authentication.len();
        self.content.authentication.retain(|auth| !equivalent_id(id, auth.id(), KEY_SEPARATOR));
        if self.content.authentication.len() == count {
            return;
        }

        self.refresh_updated();
    }

    /// Add a service to the document. A missing ID fragment is generated. Free-form properties
    /// on the entry are preserved. Returns the stored entry.
    ///
    /// # Errors
    ///
    /// * `Err::DuplicateService` - A service with an equivalent ID already exists.
    /// * `Err::InvalidService` - The entry fails structural validation.
    pub fn add_service(&mut self, service: Service) -> Result<Service> {
        let mut service = service;
        service.id = compose_id(&self.content.id, Some(&service.id), SERVICE_SEPARATOR, self.generate);

        service::assert(&service, &self.content.service)?;

        self.content.service.push(service.clone());
        self.refresh_updated();

        Ok(service)
    }

    /// Remove a service by full or short ID. A miss is a no-op.
    pub fn remove_service(&mut self, id: &str) {
        let count = self.content.service.len();
        self.content.service.retain(|service| !equivalent_id(&service.id, id, SERVICE_SEPARATOR));
        if self.content.service.len() == count {
            return;
        }

        self.refresh_updated();
    }

    fn refresh_updated(&mut self) {
        self.content.updated = Some(Utc::now());
    }
}

/// Validate raw fetched content against the minimal DID-document contract before it is trusted:
/// a plain JSON object whose `@context` carries the canonical context URI and whose `id` is a
/// syntactically valid DID.
///
/// # Errors
///
/// * `Err::InvalidDocument` - The content fails any of the checks.
pub fn assert_document(content: &Value) -> Result<()> {
    let Some(object) = content.as_object() else {
        tracerr!(Err::InvalidDocument, "Document content must be a plain object.");
    };

    match object.get("@context") {
        None => {
            tracerr!(Err::InvalidDocument, "Document content must contain `@context` property.");
        }
        Some(Value::Array(entries)) => {
            if entries.first().and_then(Value::as_str) != Some(DID_CONTEXT) {
                tracerr!(
                    Err::InvalidDocument,
                    "Document `@context` must have `{}` as its first entry.",
                    DID_CONTEXT
                );
            }
        }
        Some(Value::String(context)) => {
            if context.as_str() != DID_CONTEXT {
                tracerr!(Err::InvalidDocument, "Document `@context` must be `{}`.", DID_CONTEXT);
            }
        }
        Some(_) => {
            tracerr!(Err::InvalidDocument, "Document `@context` must be a string or an array.");
        }
    }

    let Some(id) = object.get("id").and_then(Value::as_str) else {
        tracerr!(Err::InvalidDocument, "Document content must contain `id` property.");
    };
    if id.parse::<Did>().is_err() {
        tracerr!(Err::InvalidDocument, "Document `id` must be a valid DID.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const DID: &str = "did:ipid:QmUTE4cxTxihntPEFqTprgbqyyS9YRaRcC8FXp6PACEjFG";

    fn stub_fragment() -> String {
        "randomString".to_string()
    }

    fn test_document() -> Document {
        Document::new(DID).with_id_generator(stub_fragment)
    }

    fn sample_key(fragment: &str) -> PublicKey {
        PublicKey::builder("myType").id(fragment).controller("myController").hex("1A2B3C").build()
    }

    fn sample_service(fragment: &str) -> Service {
        Service::builder("myServiceType")
            .id(fragment)
            .endpoint("http://myserviceendpoint.com")
            .build()
    }

    #[test]
    fn fresh_document_skeleton() {
        let content = test_document().content();
        assert_eq!(content.context, DID_CONTEXT);
        assert_eq!(content.id, DID);
        assert!(content.created.is_some());
        assert!(content.updated.is_none());
        assert!(content.public_key.is_empty());
    }

    #[test]
    fn serialization_elides_empty_fields() {
        let value = serde_json::to_value(test_document().content()).expect("should serialize");
        let object = value.as_object().expect("should be an object");
        assert_eq!(object.len(), 3);
        for key in ["@context", "id", "created"] {
            assert!(object.contains_key(key), "expected `{key}` to be present");
        }
    }

    #[test]
    fn hydration_keeps_provided_content() {
        let content: DocumentContent = serde_json::from_value(json!({
            "@context": DID_CONTEXT,
            "id": DID,
            "created": "2019-03-19T16:52:44.948Z",
            "publicKey": [{
                "id": format!("{DID}#myId1"),
                "type": "myType",
                "controller": "myController",
                "publicKeyHex": "1A2B3C",
            }],
            "authentication": [format!("{DID}#myId1")],
            "proof": {"type": "LinkedDataSignature2015"},
        }))
        .expect("should deserialize");

        let document = Document::from_content(content.clone());
        assert_eq!(document.content(), content);
        assert_eq!(document.content().additional["proof"]["type"], "LinkedDataSignature2015");
    }

    #[test]
    fn snapshots_are_stable() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");

        let first = document.content();
        let second = document.content();
        assert_eq!(first, second);

        document.add_service(sample_service("myServiceId")).expect("should add");
        assert!(first.service.is_empty());
    }

    #[test]
    fn add_public_key_composes_id_and_controller() {
        let mut document = test_document();
        let key = document
            .add_public_key(PublicKey::builder("myType").hex("1A2B3C").build())
            .expect("should add");

        assert_eq!(key.id, format!("{DID}#randomString"));
        assert_eq!(key.controller, DID);

        let content = document.content();
        assert_eq!(content.public_key, vec![key]);
        assert!(content.updated.is_some());
    }

    #[test]
    fn add_public_key_rejects_duplicates() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");

        let err = document.add_public_key(sample_key("myId1")).expect_err("should fail");
        assert!(err.is(Err::DuplicatePublicKey));
        assert_eq!(
            err.to_string(),
            format!("PublicKey with same {DID}#myId1 already exists.")
        );

        // A full-form ID collides with the short form it was added under.
        let err = document
            .add_public_key(sample_key(&format!("{DID}#myId1")))
            .expect_err("should fail");
        assert!(err.is(Err::DuplicatePublicKey));

        // Failure leaves prior state unchanged.
        assert_eq!(document.content().public_key.len(), 1);
    }

    #[test]
    fn add_public_key_failure_leaves_updated_untouched() {
        let mut document = test_document();
        let key = document.add_public_key(sample_key("myId1")).expect("should add");
        let updated = document.content().updated;

        document.add_public_key(sample_key("myId1")).expect_err("should fail");
        assert_eq!(document.content().updated, updated);
        assert_eq!(document.content().public_key, vec![key]);
    }

    #[test]
    fn revoke_public_key_cascades_to_authentication() {
        let mut document = test_document();
        let key = document.add_public_key(sample_key("myId1")).expect("should add");
        document.add_authentication(&key.id).expect("should add");

        document.revoke_public_key("myId1");

        let content = document.content();
        assert!(content.public_key.is_empty());
        assert!(content.authentication.is_empty());
    }

    #[test]
    fn revoke_public_key_miss_is_noop() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");
        let updated = document.content().updated;

        document.revoke_public_key("unknownId");

        assert_eq!(document.content().public_key.len(), 1);
        assert_eq!(document.content().updated, updated);
    }

    #[test]
    fn add_authentication_resolves_short_and_full_ids() {
        let mut document = test_document();
        let key = document.add_public_key(sample_key("myId1")).expect("should add");

        let id = document.add_authentication("myId1").expect("should add");
        assert_eq!(id, key.id);

        document.remove_authentication(&id);
        let id = document.add_authentication(&key.id).expect("should add");
        assert_eq!(id, key.id);

        assert_eq!(
            document.content().authentication,
            vec![Authentication::Reference(key.id)]
        );
    }

    #[test]
    fn add_authentication_requires_matching_key() {
        let mut document = test_document();
        let err = document.add_authentication("unknownId").expect_err("should fail");
        assert!(err.is(Err::InvalidAuthentication));
        assert!(document.content().authentication.is_empty());
    }

    #[test]
    fn add_authentication_rejects_duplicates() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");
        document.add_authentication("myId1").expect("should add");

        let err = document.add_authentication("myId1").expect_err("should fail");
        assert!(err.is(Err::DuplicateAuthentication));
        assert_eq!(document.content().authentication.len(), 1);
    }

    #[test]
    fn remove_authentication_miss_is_noop() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");
        document.add_authentication("myId1").expect("should add");
        let updated = document.content().updated;

        document.remove_authentication("unknownId");
        assert_eq!(document.content().authentication.len(), 1);
        assert_eq!(document.content().updated, updated);
    }

    #[test]
    fn add_service_composes_id_and_preserves_extras() {
        let mut document = test_document();
        let service = document
            .add_service(
                Service::builder("myServiceType")
                    .id("myServiceId")
                    .endpoint("http://myserviceendpoint.com")
                    .property("description", "My custom service")
                    .build(),
            )
            .expect("should add");

        assert_eq!(service.id, format!("{DID};myServiceId"));

        let value = serde_json::to_value(document.content()).expect("should serialize");
        assert_eq!(value["service"][0]["description"], "My custom service");
        assert_eq!(value["service"][0]["serviceEndpoint"], "http://myserviceendpoint.com");
    }

    #[test]
    fn add_service_rejects_duplicates() {
        let mut document = test_document();
        document.add_service(sample_service("myServiceId")).expect("should add");

        let err = document
            .add_service(sample_service(&format!("{DID};myServiceId")))
            .expect_err("should fail");
        assert!(err.is(Err::DuplicateService));
        assert_eq!(document.content().service.len(), 1);
    }

    #[test]
    fn remove_service_accepts_short_and_full_ids() {
        let mut document = test_document();
        let service = document.add_service(sample_service("myServiceId")).expect("should add");

        document.remove_service("myServiceId");
        assert!(document.content().service.is_empty());

        document.add_service(sample_service("myServiceId")).expect("should add");
        document.remove_service(&service.id);
        assert!(document.content().service.is_empty());
    }

    #[test]
    fn remove_service_miss_is_noop() {
        let mut document = test_document();
        document.add_service(sample_service("myServiceId")).expect("should add");
        let updated = document.content().updated;

        document.remove_service("unknownId");
        assert_eq!(document.content().service.len(), 1);
        assert_eq!(document.content().updated, updated);
    }

    #[test]
    fn round_trip_of_valid_content() {
        let mut document = test_document();
        document.add_public_key(sample_key("myId1")).expect("should add");
        document.add_authentication("myId1").expect("should add");
        document.add_service(sample_service("myServiceId")).expect("should add");

        let value = serde_json::to_value(document.content()).expect("should serialize");
        assert_document(&value).expect("serialized content should validate");

        let back: DocumentContent = serde_json::from_value(value).expect("should deserialize");
        assert_eq!(back, document.content());
    }

    #[test]
    fn assert_document_rejects_non_objects() {
        let err = assert_document(&json!([{ "content": "123" }])).expect_err("should fail");
        assert!(err.is(Err::InvalidDocument));
        assert_eq!(err.to_string(), "Document content must be a plain object.");
    }

    #[test]
    fn assert_document_checks_context() {
        let err = assert_document(&json!({ "id": DID })).expect_err("should fail");
        assert_eq!(err.to_string(), "Document content must contain `@context` property.");

        let err = assert_document(&json!({ "@context": "https://example.com", "id": DID }))
            .expect_err("should fail");
        assert!(err.is(Err::InvalidDocument));

        let err = assert_document(&json!({ "@context": ["https://example.com"], "id": DID }))
            .expect_err("should fail");
        assert!(err.is(Err::InvalidDocument));

        let err = assert_document(&json!({ "@context": 42, "id": DID })).expect_err("should fail");
        assert_eq!(err.to_string(), "Document `@context` must be a string or an array.");

        assert_document(&json!({ "@context": [DID_CONTEXT, "https://example.com"], "id": DID }))
            .expect("should validate");
    }

    #[test]
    fn assert_document_checks_id() {
        let err = assert_document(&json!({ "@context": DID_CONTEXT })).expect_err("should fail");
        assert_eq!(err.to_string(), "Document content must contain `id` property.");

        let err = assert_document(&json!({ "@context": DID_CONTEXT, "id": "not-a-did" }))
            .expect_err("should fail");
        assert_eq!(err.to_string(), "Document `id` must be a valid DID.");
    }
}
