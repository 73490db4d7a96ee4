//! # intoto-recorder
//!
//! Records a build step as signed [in-toto](https://in-toto.io) link metadata
//! and submits it to a provenance store.
//!
//! The working directory is fingerprinted before the step runs (materials)
//! and after it ran (products). Both snapshots, together with the command and
//! its byproducts, form a link that is signed with the configured key, written
//! next to the build as `<step>.<keyid>.link`, and optionally posted to a
//! generic HTTP endpoint or filed as a Grafeas occurrence.
//!
//! ## Quick Start
//!
//! ```bash
//! intoto-recorder run \
//!     --step-name=build \
//!     --key=signing_key.pem \
//!     --transport="grafeas+https://grafeas.example/v1beta1/projects/p/occurrences?noteName=projects/p/notes/build&resourceUri=git://repo" \
//!     -- make all
//! ```
//!
//! Print the artifacts of a directory without recording a step:
//! ```bash
//! intoto-recorder collect --path=out --hash-alg=sha256,sha512
//! ```

pub mod cli;
pub mod collector;
pub mod error;
pub mod hash;
pub mod link;
pub mod recorder;
pub mod signing;
#[cfg(test)]
mod tests;
pub mod transport;
pub mod utils;

// Re-export error types
pub use error::{Error, Result};

/// Initialize logging for the CLI
///
/// # Examples
///
/// ```
/// use intoto_recorder::init_logging;
///
/// // Initialize with default settings
/// let result = init_logging();
/// // Note: This might fail if already initialized
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::InitializationError(e.to_string()))
}

// Re-export commonly used types and traits
pub use collector::{ArtifactCollector, CollectorOptions};
pub use link::{ArtifactHash, ArtifactSet, Link, LinkAssembler, LinkDocument, Signature};
pub use recorder::{RecordOutcome, Recorder, RecorderConfig};
pub use signing::SigningKey;
pub use transport::{SubmitOutcome, Transport, TransportKind};
