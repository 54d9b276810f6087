//! DID syntax for the IPID method and composite-ID helpers.
//!
//! A DID is a URI of the form `did:<method>:<identifier>`. Components of a DID document are
//! identified by composite IDs built from the document's DID, a separator and a fragment:
//! `<did>#<fragment>` for public keys and `<did>;<fragment>` for services.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use regex::Regex;

use crate::error::Err;
use crate::hash::Generator;
use crate::{tracerr, Result};

/// The DID method implemented by this crate.
pub const METHOD: &str = "ipid";

/// Separator between a DID and a public key fragment.
pub const KEY_SEPARATOR: char = '#';

/// Separator between a DID and a service fragment.
pub const SERVICE_SEPARATOR: char = ';';

/// A parsed DID. The identifier for the IPID method is the base-58 string form of a
/// public-key-derived hash, but any syntactically valid DID can be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Did {
    /// The DID method.
    pub method: String,
    /// The method-specific identifier.
    pub identifier: String,
}

impl Did {
    /// Construct an IPID-method DID from a naming-network identifier.
    #[must_use]
    pub fn ipid(identifier: &str) -> Self {
        Self {
            method: METHOD.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

impl FromStr for Did {
    type Err = crate::error::Error;

    fn from_str(did: &str) -> Result<Self> {
        let re = Regex::new(r"^did:(\w+):(\w+)")?;
        let Some(caps) = re.captures(did) else {
            tracerr!(Err::InvalidDid, "Invalid DID: {}", did);
        };
        Ok(Self {
            method: caps[1].to_string(),
            identifier: caps[2].to_string(),
        })
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "did:{}:{}", self.method, self.identifier)
    }
}

/// Build a composite ID from a DID and a fragment. A full composite ID is reduced to its
/// fragment first, so passing one back in is idempotent. An absent or empty fragment is replaced
/// with one produced by the supplied generator. Generated fragments are collision-tolerant:
/// duplicate IDs are caught by the document's duplicate checks, not prevented here.
pub fn compose_id(did: &str, fragment: Option<&str>, separator: char, generate: Generator) -> String {
    let fragment = match fragment.map(|f| short_id(f, separator)) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => generate(),
    };
    format!("{did}{separator}{fragment}")
}

/// Compare two component IDs for semantic equivalence. Each input is reduced to the part after
/// the separator when one is present, so callers can pass either a full composite ID or a bare
/// fragment interchangeably.
#[must_use]
pub fn equivalent_id(id1: &str, id2: &str, separator: char) -> bool {
    short_id(id1, separator) == short_id(id2, separator)
}

// The part after the separator, or the whole ID when no separator is present.
fn short_id(id: &str, separator: char) -> &str {
    id.rsplit(separator).next().unwrap_or(id)
}
