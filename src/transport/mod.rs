//! # Transports
//!
//! A transport delivers a finished [`LinkDocument`] to a provenance store.
//! Every backend implements [`Transport`]; which one is used is decided by the
//! scheme of the configured transport URI:
//!
//! | URI | Transport |
//! |---|---|
//! | none | [`LocalDump`] into the working directory |
//! | `file:///some/dir` | [`LocalDump`] into that directory |
//! | `http://…`, `https://…` | [`GenericHttp`] |
//! | `grafeas+http://…`, `grafeas+https://…` | [`Grafeas`] |
//!
//! Adding a store means adding a [`TransportKind`] and an implementation; the
//! collection and signing pipeline does not change.
//!
//! ## Examples
//!
//! ```
//! use intoto_recorder::transport::TransportKind;
//!
//! assert_eq!(
//!     TransportKind::from_uri("https://example.com/links").unwrap(),
//!     TransportKind::GenericHttp
//! );
//! assert_eq!(
//!     TransportKind::from_uri("grafeas+https://example.com/v1/occurrences?noteName=n&resourceUri=r").unwrap(),
//!     TransportKind::Grafeas
//! );
//! assert!(TransportKind::from_uri("ftp://example.com").is_err());
//! ```

use crate::error::{Error, Result};
use crate::link::LinkDocument;

use log::warn;
use reqwest::Url;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod generic;
pub mod grafeas;
pub mod local;

pub use generic::GenericHttp;
pub use grafeas::Grafeas;
pub use local::LocalDump;

/// Scheme prefix selecting the Grafeas occurrence transport.
pub const GRAFEAS_SCHEME_PREFIX: &str = "grafeas+";

/// Default bound on a single submission request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The document was written to the local filesystem
    Dumped { path: PathBuf },
    /// The document was accepted by a remote store
    Posted {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl fmt::Display for SubmitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitOutcome::Dumped { path } => write!(f, "written to {}", path.display()),
            SubmitOutcome::Posted {
                endpoint, status, ..
            } => write!(f, "posted to {endpoint} ({status})"),
        }
    }
}

impl SubmitOutcome {
    /// Path of the written link document, for local dumps.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            SubmitOutcome::Dumped { path } => Some(path),
            SubmitOutcome::Posted { .. } => None,
        }
    }
}

/// A backend that can deliver link metadata somewhere.
pub trait Transport {
    /// Human readable destination, for logs.
    fn describe(&self) -> String;

    fn submit(&self, document: &LinkDocument) -> Result<SubmitOutcome>;

    /// Whether submitting only writes to the local filesystem.
    fn is_local(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    LocalDump,
    GenericHttp,
    Grafeas,
}

impl TransportKind {
    /// Pick the transport variant for a URI from its scheme alone.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| Error::UnsupportedTransport(format!("Malformed transport URI '{uri}': {e}")))?;
        Self::from_scheme(url.scheme())
    }

    pub fn from_scheme(scheme: &str) -> Result<Self> {
        match scheme {
            "file" => Ok(TransportKind::LocalDump),
            "http" | "https" => Ok(TransportKind::GenericHttp),
            "grafeas+http" | "grafeas+https" => Ok(TransportKind::Grafeas),
            other => Err(Error::UnsupportedTransport(format!(
                "No transport for scheme '{other}'"
            ))),
        }
    }
}

/// Settings shared by every network transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Build the transport for `uri`.
///
/// # Errors
///
/// `Error::UnsupportedTransport` for unknown schemes or unparsable URIs and
/// `Error::Configuration` when a known transport rejects its parameters.
pub fn transport_for_uri(
    uri: &str,
    options: &TransportOptions,
) -> Result<Box<dyn Transport>> {
    match TransportKind::from_uri(uri)? {
        TransportKind::LocalDump => Ok(Box::new(LocalDump::from_uri(uri)?)),
        TransportKind::GenericHttp => Ok(Box::new(GenericHttp::new(uri, options)?)),
        TransportKind::Grafeas => Ok(Box::new(Grafeas::new(uri, options)?)),
    }
}

/// Choose the transport for a step.
///
/// Without a URI the document is dumped into `dump_dir`. A URI that cannot be
/// turned into a transport also ends up in `dump_dir`, with a warning, so the
/// step's metadata is never lost to a configuration mistake.
pub fn select_transport(
    uri: Option<&str>,
    dump_dir: &Path,
    options: &TransportOptions,
) -> Result<Box<dyn Transport>> {
    let Some(uri) = crate::utils::non_empty(uri) else {
        return Ok(Box::new(LocalDump::new(dump_dir)?));
    };

    match transport_for_uri(uri, options) {
        Ok(transport) => Ok(transport),
        Err(e) if e.is_transport_selection() => {
            warn!(
                "[in-toto] Transport '{uri}' not usable ({e}). Dumping metadata to {}",
                dump_dir.display()
            );
            Ok(Box::new(LocalDump::new(dump_dir)?))
        }
        Err(e) => Err(e),
    }
}
