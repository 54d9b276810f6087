//! The IPID orchestrator: resolves DID documents from the storage/naming network, runs document
//! operations and publishes the result back under an ephemeral signing key.

use crate::did::Did;
use crate::document::{assert_document, Document, DocumentContent};
use crate::error::Err;
use crate::hash::{self, Generator};
use crate::provider::{IpfsClient, KeyCodec, PublishOptions};
use crate::{tracerr, Result};

/// Default validity (and caching) duration for published naming records.
pub const DEFAULT_LIFETIME: &str = "87600h";

const KEY_NAME_PREFIX: &str = "didipid";

/// Manages DID documents for the IPID method over an injected storage/naming network client and
/// key codec.
///
/// Each of [`resolve`](Ipid::resolve), [`create`](Ipid::create) and [`update`](Ipid::update) is a
/// single logical session: steps run strictly in sequence and the signing key imported for a
/// publish is removed again on every exit path. Nothing is retried and no partial document state
/// is ever published.
pub struct Ipid<C, K> {
    client: C,
    codec: K,
    lifetime: String,
    generate: Generator,
}

impl<C, K> Ipid<C, K>
where
    C: IpfsClient,
    K: KeyCodec,
{
    /// Create an orchestrator over the given client and key codec.
    ///
    /// # Errors
    ///
    /// * `Err::UnavailableIpfs` - The client reports itself offline.
    pub fn new(client: C, codec: K) -> Result<Self> {
        if !client.is_online() {
            tracerr!(Err::UnavailableIpfs, "IPFS node is unavailable.");
        }
        Ok(Self {
            client,
            codec,
            lifetime: DEFAULT_LIFETIME.to_string(),
            generate: hash::rand_fragment,
        })
    }

    /// Set the validity duration used when publishing naming records. The same value is used for
    /// the record's caching ttl.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.lifetime = lifetime.into();
        self
    }

    /// Replace the random-string generator used for document ID fragments and signing-key names.
    /// Tests use this to pin generated values.
    #[must_use]
    pub fn with_generator(mut self, generate: Generator) -> Self {
        self.generate = generate;
        self
    }

    /// The DID deterministically derived from PEM-encoded private key material.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidPem` - The key material cannot be decoded.
    pub async fn did(&self, pem: &str) -> Result<String> {
        let key = self.codec.decode_pem(pem, None).await?;
        let identifier = self.codec.derive_identifier(&key).await?;
        Ok(Did::ipid(&identifier).to_string())
    }

    /// Resolve a DID to its current document content.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidDid` - The DID fails to parse, or any step of the resolution pipeline
    ///   fails (name-resolution miss, fetch miss).
    /// * `Err::InvalidDocument` - The fetched content fails document validation. Re-raised with
    ///   its own identity so callers can tell malformed-but-present from absent.
    pub async fn resolve(&self, did: &str) -> Result<DocumentContent> {
        let parsed: Did = did.parse()?;

        match self.fetch(&parsed).await {
            Ok(content) => Ok(content),
            Err(e) if e.is(Err::InvalidDocument) => Err(e),
            Err(e) => {
                tracing::debug!("resolution of {did} failed: {e}");
                tracerr!(Err::InvalidDid, "Unable to resolve document with DID: {}", did);
            }
        }
    }

    /// Create and publish the document for a DID that does not resolve yet. The DID is derived
    /// from the key material; `operations` receives the fresh document and applies the initial
    /// mutations. Returns the published content.
    ///
    /// # Errors
    ///
    /// * `Err::IllegalCreate` - The DID already resolves to a document. The operations callback
    ///   is not invoked in this case.
    /// * Any error raised by the operations callback, unmodified.
    /// * Errors from key decoding or the publish pipeline.
    pub async fn create<F>(&self, pem: &str, operations: F) -> Result<DocumentContent>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let did = self.did(pem).await?;

        if self.resolve(&did).await.is_ok() {
            tracerr!(Err::IllegalCreate, "Document already exists.");
        }

        let mut document = Document::new(&did).with_id_generator(self.generate);
        operations(&mut document)?;

        self.publish(pem, &document.content()).await
    }

    /// Update and re-publish the document for a DID that already resolves. A resolution failure
    /// propagates as-is (there is no document to update) and the operations callback is not
    /// invoked. Returns the published content.
    ///
    /// # Errors
    ///
    /// * Errors from [`resolve`](Ipid::resolve), unmodified.
    /// * Any error raised by the operations callback, unmodified.
    /// * Errors from key decoding or the publish pipeline.
    pub async fn update<F>(&self, pem: &str, operations: F) -> Result<DocumentContent>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let did = self.did(pem).await?;

        let content = self.resolve(&did).await?;
        let mut document = Document::from_content(content).with_id_generator(self.generate);
        operations(&mut document)?;

        self.publish(pem, &document.content()).await
    }

    // Fetch and validate the content a DID's identifier currently names.
    async fn fetch(&self, did: &Did) -> Result<DocumentContent> {
        let resolved = self.client.name_resolve(&did.identifier).await?;
        let address = resolved.path.strip_prefix("/ipfs/").unwrap_or(&resolved.path);
        let content = self.client.dag_get(address).await?;

        assert_document(&content)?;

        Ok(serde_json::from_value(content)?)
    }

    // Publish document content under an ephemeral signing key imported from the PEM. The key is
    // removed from the keychain on success and failure alike.
    async fn publish(&self, pem: &str, content: &DocumentContent) -> Result<DocumentContent> {
        let key_name = format!("{KEY_NAME_PREFIX}-{}", (self.generate)());

        self.import_key(&key_name, pem, None).await?;

        let published = self.put_and_publish(&key_name, content).await;
        let removed = self.remove_key(&key_name).await;

        let content = published?;
        removed?;
        Ok(content)
    }

    async fn put_and_publish(&self, key_name: &str, content: &DocumentContent) -> Result<DocumentContent> {
        let value = serde_json::to_value(content)?;
        let address = self.client.dag_put(&value).await?;
        let path = format!("/ipfs/{address}");

        let options = PublishOptions {
            key: key_name.to_string(),
            lifetime: self.lifetime.clone(),
            ttl: self.lifetime.clone(),
        };
        self.client.name_publish(&path, &options).await?;

        tracing::debug!("published document for {} at {path}", content.id);
        Ok(content.clone())
    }

    // Import a key under the given name, displacing any same-named leftover first so the import
    // is idempotent.
    async fn import_key(&self, name: &str, pem: &str, password: Option<&str>) -> Result<()> {
        self.remove_key(name).await?;
        self.client.key_import(name, pem, password).await
    }

    // Remove a key from the keychain, tolerating its absence.
    async fn remove_key(&self, name: &str) -> Result<()> {
        let keys = self.client.key_list().await?;
        if !keys.iter().any(|key| key.name == name) {
            return Ok(());
        }
        self.client.key_rm(name).await
    }
}
