//! # IPID Errors
//!
//! This module defines the error types used by the IPID library, including for traits that are
//! implemented by storage-network and key-material providers in other crates.

use std::fmt::Display;

use thiserror::Error;

/// Simplify creation of errors with tracing.
///
/// # Example
/// ```ignore
/// use didipid::error::Err;
/// use didipid::{tracerr, Result};
///
/// fn with_msg() -> Result<()> {
///     tracerr!(Err::InvalidDid, "message: {}", "some message")
/// }
///
/// fn no_msg() -> Result<()> {
///     tracerr!(Err::InvalidDid)
/// }
/// ```
#[macro_export]
macro_rules! tracerr {
    // with context
    ($code:expr, $($msg:tt)*) => {
        {
        use $crate::error::Context as _;
        tracing::error!($($msg)*);
        return Err($code).context(format!($($msg)*));
        }
    };
    // no context
    ($code:expr) => {
        {
        tracing::error!("{}", $code);
        return Err($code.into());
        }
    }
}

/// Public error type for the IPID library.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct Error(#[from] anyhow::Error);

impl Error {
    /// Transfer the error to a JSON-friendly format.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.0.root_cause().to_string(),
            "error_description": self.to_string(),
        })
    }

    /// Returns true if `E` is the type held by this error object.
    #[must_use]
    pub fn is(&self, err: Err) -> bool {
        self.0.downcast_ref::<Err>().map_or(false, |e| e == &err)
    }
}

/// Typed errors for the IPID library.
#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum Err {
    /// The DID fails to parse or the resolution pipeline failed for any reason other than a
    /// content-validation failure. (See context for details)
    #[error("invalid_did")]
    InvalidDid,

    /// Resolved content does not satisfy the minimal DID document contract. Distinguishable from
    /// `InvalidDid` so a malformed-but-present document is not confused with an absent one.
    #[error("invalid_document")]
    InvalidDocument,

    /// A create was attempted for a DID whose document already resolves successfully.
    #[error("illegal_create")]
    IllegalCreate,

    /// A public key with an equivalent ID already exists on the document.
    #[error("duplicate_public_key")]
    DuplicatePublicKey,

    /// A public key failed structural validation. (See context for the offending field)
    #[error("invalid_public_key")]
    InvalidPublicKey,

    /// An authentication referencing the same key already exists on the document.
    #[error("duplicate_authentication")]
    DuplicateAuthentication,

    /// An authentication reference does not resolve to a public key on the document.
    #[error("invalid_authentication")]
    InvalidAuthentication,

    /// A service with an equivalent ID already exists on the document.
    #[error("duplicate_service")]
    DuplicateService,

    /// A service failed structural validation. (See context for the offending field)
    #[error("invalid_service")]
    InvalidService,

    /// The storage network client is absent or reports itself offline.
    #[error("ipfs_unavailable")]
    UnavailableIpfs,

    /// Private key material could not be decoded from PEM input.
    #[error("invalid_pem")]
    InvalidPem,
}

/// Context is used to decorate errors with useful context information.
pub trait Context<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Adds context to the error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context to add to the error.
    ///
    /// # Returns
    ///
    /// Original return object or error with context appended.
    ///
    /// # Errors
    ///
    /// * Original error with context appended.
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static;
}

impl<T, E> Context<T, E> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, Error>
    where
        C: Display + Send + Sync + 'static,
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(Error(anyhow::Error::from(e).context(context))),
        }
    }
}

impl From<Err> for Error {
    fn from(error: Err) -> Self {
        Error(error.into())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Error {
        Error(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error(err.into())
    }
}
