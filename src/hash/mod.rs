//! # Hash Module
//!
//! This module provides the content hashing used to fingerprint artifacts recorded
//! in link metadata. It supports SHA-256, SHA-384 and SHA-512.
//!
//! ## Features
//!
//! - Calculate hashes of byte data with configurable algorithms
//! - Hash one file with several algorithms in a single streaming read,
//!   producing an [`ArtifactHash`]
//! - Check that a recorded digest is well formed
//!
//! ## Algorithm Support
//!
//! - **SHA-256**: 256-bit hash (64 hex characters) - Default, and the digest
//!   every transport relies on
//! - **SHA-384**: 384-bit hash (96 hex characters)
//! - **SHA-512**: 512-bit hash (128 hex characters)
//!
//! ## Examples
//!
//! ### Basic hashing with the default algorithm (SHA-256)
//! ```
//! use intoto_recorder::hash::calculate_hash;
//!
//! let hash = calculate_hash(b"hello");
//! assert_eq!(
//!     hash,
//!     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
//! );
//! ```
//!
//! ### File hashing with several algorithms
//! ```no_run
//! use intoto_recorder::hash::{hash_file, HashAlgorithm};
//! use std::path::Path;
//!
//! let hashes = hash_file(
//!     Path::new("build/output.bin"),
//!     &[HashAlgorithm::Sha256, HashAlgorithm::Sha512],
//!     false,
//! ).unwrap();
//! assert_eq!(hashes.len(), 2);
//! ```

use crate::error::{Error, Result};
use crate::link::ArtifactHash;
use crate::utils::safe_open_file;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Hash algorithms available for artifact fingerprints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// The name used as the key in an [`ArtifactHash`].
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Expected length of the hex digest.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(format!("Unsupported hash algorithm: {other}")),
        }
    }
}

/// Calculate the SHA-256 hash of the given data
///
/// # Examples
///
/// ```
/// use intoto_recorder::hash::calculate_hash;
///
/// let hash = calculate_hash(b"Hello, World!");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, calculate_hash(b"Hello, World!"));
/// assert_ne!(hash, calculate_hash(b"Different data"));
/// ```
pub fn calculate_hash(data: &[u8]) -> String {
    calculate_hash_with_algorithm(data, &HashAlgorithm::Sha256)
}

/// Calculate the hash of data using the specified algorithm
///
/// Returns the lowercase hex digest: 64, 96 or 128 characters.
pub fn calculate_hash_with_algorithm(data: &[u8], algorithm: &HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}

/// Hash a file with every requested algorithm in one pass
///
/// The result maps algorithm names (`"sha256"`, ...) to lowercase hex digests.
///
/// # Arguments
///
/// * `path` - The file to hash
/// * `algorithms` - Non-empty list of algorithms; duplicates are ignored
/// * `follow_symlinks` - Whether a symlinked `path` may be read through
///
/// # Errors
///
/// * `Error::Validation` if `algorithms` is empty
/// * `Error::Io` if the file cannot be read
pub fn hash_file(
    path: &Path,
    algorithms: &[HashAlgorithm],
    follow_symlinks: bool,
) -> Result<ArtifactHash> {
    if algorithms.is_empty() {
        return Err(Error::Validation(
            "At least one hash algorithm is required".to_string(),
        ));
    }

    let mut hashers: Vec<(HashAlgorithm, MultiHasher)> = Vec::with_capacity(algorithms.len());
    for algorithm in algorithms {
        if !hashers.iter().any(|(alg, _)| alg == algorithm) {
            hashers.push((*algorithm, MultiHasher::new(algorithm)));
        }
    }

    let mut file = safe_open_file(path, follow_symlinks)?;
    let mut buffer = [0; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        for (_, hasher) in hashers.iter_mut() {
            hasher.update(&buffer[..bytes_read]);
        }
    }

    Ok(hashers
        .into_iter()
        .map(|(algorithm, hasher)| (algorithm.as_str().to_string(), hasher.finalize_hex()))
        .collect())
}

/// Parse an algorithm name
///
/// ```
/// use intoto_recorder::hash::{parse_algorithm, HashAlgorithm};
///
/// assert_eq!(parse_algorithm("sha512").unwrap(), HashAlgorithm::Sha512);
/// assert!(parse_algorithm("sha1").is_err());
/// assert!(parse_algorithm("SHA256").is_err()); // case sensitive
/// ```
pub fn parse_algorithm(s: &str) -> Result<HashAlgorithm> {
    HashAlgorithm::from_str(s).map_err(Error::Validation)
}

/// Check that a string looks like a digest produced by `algorithm`.
pub fn is_valid_digest(digest: &str, algorithm: &HashAlgorithm) -> bool {
    digest.len() == algorithm.hex_len()
        && digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

enum MultiHasher {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl MultiHasher {
    fn new(algorithm: &HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => MultiHasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => MultiHasher::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => MultiHasher::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            MultiHasher::Sha256(h) => h.update(data),
            MultiHasher::Sha384(h) => h.update(data),
            MultiHasher::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            MultiHasher::Sha256(h) => hex::encode(h.finalize()),
            MultiHasher::Sha384(h) => hex::encode(h.finalize()),
            MultiHasher::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}
