//! # Provider Traits
//!
//! The storage/naming network and the key-material codec are injected capabilities: this crate
//! orchestrates them but does not implement them. Implementations may talk to a real IPFS node,
//! a remote gateway or an in-memory double; the orchestrator is indifferent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

/// Result of resolving a name on the naming network.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResolvedName {
    /// The content path the name currently points at, e.g. `/ipfs/<address>`.
    pub path: String,
}

/// Options governing the publication of a naming record.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublishOptions {
    /// Name of the keychain key that signs the record.
    pub key: String,

    /// Validity duration of the record, e.g. `87600h`.
    pub lifetime: String,

    /// Caching duration of the record.
    pub ttl: String,
}

/// A keychain entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct KeyInfo {
    /// The key's name in the keychain.
    pub name: String,
}

/// Mutable name records mapping a stable, key-derived name to a content path.
#[allow(async_fn_in_trait)]
pub trait NameStore {
    /// Resolve a name to the content path it currently points at.
    async fn name_resolve(&self, identifier: &str) -> Result<ResolvedName>;

    /// Publish a naming record pointing at `path`, signed by the key named in `options`.
    async fn name_publish(&self, path: &str, options: &PublishOptions) -> Result<()>;
}

/// Immutable, content-addressed storage of structured data.
#[allow(async_fn_in_trait)]
pub trait DagStore {
    /// Store content, returning its content address.
    async fn dag_put(&self, content: &Value) -> Result<String>;

    /// Fetch the content at an address.
    async fn dag_get(&self, address: &str) -> Result<Value>;
}

/// The node's keychain of named signing keys.
#[allow(async_fn_in_trait)]
pub trait Keychain {
    /// List the keys currently in the keychain.
    async fn key_list(&self) -> Result<Vec<KeyInfo>>;

    /// Import a PEM-encoded private key under the given name.
    async fn key_import(&self, name: &str, pem: &str, password: Option<&str>) -> Result<()>;

    /// Remove the key with the given name.
    async fn key_rm(&self, name: &str) -> Result<()>;
}

/// An IPFS-shaped storage/naming network client: naming records, a content-addressed store and a
/// keychain, plus a liveness probe consulted before a session starts.
pub trait IpfsClient: NameStore + DagStore + Keychain {
    /// Whether the node is reachable. A client reporting `false` is rejected at session start.
    fn is_online(&self) -> bool;
}

/// Decodes private key material and derives the network identifier that names its owner.
#[allow(async_fn_in_trait)]
pub trait KeyCodec {
    /// Decode a PEM-encoded private key to raw key bytes.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidPem` - The input is not valid PEM or the password is wrong.
    async fn decode_pem(&self, pem: &str, password: Option<&str>) -> Result<Vec<u8>>;

    /// Derive the naming-network identifier for a key: the base-58 string form of a
    /// public-key-derived hash.
    async fn derive_identifier(&self, key: &[u8]) -> Result<String>;
}
