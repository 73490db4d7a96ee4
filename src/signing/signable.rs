//! # Signable Trait
//!
//! This module defines the `Signable` trait, the common interface for data
//! structures that are signed over a canonical byte representation. The
//! representation is the RFC 8785 JSON Canonicalization Scheme (JCS) form of
//! the value, so that key order and whitespace never change what is signed.
//!
//! ## Examples
//!
//! ```no_run
//! use intoto_recorder::link::{ArtifactSet, LinkAssembler, LinkDocument};
//! use intoto_recorder::signing::load_private_key;
//! use intoto_recorder::signing::signable::Signable;
//! use std::path::Path;
//!
//! let link = LinkAssembler::begin("build").finish(ArtifactSet::new());
//! let key = load_private_key(Path::new("signing_key.pem")).unwrap();
//!
//! let signature = link.sign_with(&key).unwrap();
//! let mut document = LinkDocument::new(link);
//! document.add_signature(signature).unwrap();
//! assert!(document.is_signed());
//! ```

use crate::error::{Error, Result};
use crate::link::{Link, Signature};
use crate::signing::SigningKey;

/// A type that can be signed over its canonical serialization.
///
/// Implementations only say how to turn the value into bytes; signing itself
/// is delegated to a [`SigningKey`]. Signing never mutates the value.
pub trait Signable {
    /// The exact bytes covered by a signature.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Signing` when the value cannot be serialized.
    fn canonical_bytes(&self) -> Result<Vec<u8>>;

    /// Sign the canonical bytes with `key`.
    fn sign_with(&self, key: &dyn SigningKey) -> Result<Signature> {
        let data = self.canonical_bytes()?;
        key.sign(&data)
    }
}

impl Signable for Link {
    fn canonical_bytes(&self) -> Result<Vec<u8>> {
        serde_json_canonicalizer::to_vec(self)
            .map_err(|e| Error::Signing(format!("Failed to canonicalize link: {e}")))
    }
}
