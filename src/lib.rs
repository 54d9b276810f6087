//! # IPID
//!
//! DID document management for the `did:ipid` method over a content-addressed storage/naming
//! network.
//!
//! The heart of the crate is the [`Document`] aggregate: a mutable in-memory DID document with
//! operations to add and revoke public keys, add and remove authentication references and add
//! and remove services, each maintaining the document's consistency invariants. Around it, the
//! [`Ipid`] orchestrator resolves documents from the network, applies caller-supplied operations
//! and publishes the result back, managing the ephemeral signing-key lifecycle used for
//! publishing.
//!
//! The network itself and the key-material cryptography are injected capabilities; see the
//! [`provider`] module for the traits to implement.
//!
//! ```ignore
//! let ipid = Ipid::new(client, codec)?;
//!
//! let content = ipid.create(pem, |doc| {
//!     let key = doc.add_public_key(
//!         PublicKey::builder("RsaVerificationKey2018").hex("1A2B3C").build(),
//!     )?;
//!     doc.add_authentication(&key.id)?;
//!     Ok(())
//! }).await?;
//! ```

pub mod did;
pub mod document;
pub mod error;
pub mod hash;
pub mod ipid;
pub mod provider;

pub use crate::did::{compose_id, equivalent_id, Did, KEY_SEPARATOR, METHOD, SERVICE_SEPARATOR};
pub use crate::document::authentication::Authentication;
pub use crate::document::public_key::{PublicKey, PublicKeyBuilder, ENCODINGS};
pub use crate::document::service::{Service, ServiceBuilder};
pub use crate::document::{assert_document, Document, DocumentContent, DID_CONTEXT};
pub use crate::error::{Err, Error};
pub use crate::hash::Generator;
pub use crate::ipid::{Ipid, DEFAULT_LIFETIME};
pub use crate::provider::{
    DagStore, IpfsClient, KeyCodec, KeyInfo, Keychain, NameStore, PublishOptions, ResolvedName,
};

/// Result type for the IPID library.
pub type Result<T> = core::result::Result<T, Error>;
