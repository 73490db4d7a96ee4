//! # Artifact Collector
//!
//! Walks a directory tree and fingerprints every regular file in it. The
//! result is an [`ArtifactSet`] keyed by the path of each file relative to the
//! collection root, always with `/` as separator.
//!
//! The collector holds no state between calls, so the same instance can take
//! the snapshot before a step and the one after it. Its output is a plain
//! value that can be serialized and shipped from wherever the files live to
//! wherever the link is assembled.
//!
//! Symlinks are not followed unless [`CollectorOptions::follow_symlinks`] is
//! set. Symlinks, sockets, devices and fifos are skipped rather than reported.
//!
//! ## Examples
//!
//! ```no_run
//! use intoto_recorder::collector::{ArtifactCollector, CollectorOptions};
//! use std::path::Path;
//!
//! let collector = ArtifactCollector::new(CollectorOptions::default()).unwrap();
//! let materials = collector.collect(Path::new("workspace")).unwrap();
//! for (identity, hashes) in &materials {
//!     println!("{identity}: {}", hashes["sha256"]);
//! }
//! ```

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use crate::link::ArtifactSet;

use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use std::ffi::OsStr;
use std::path::{Component, Path};
use walkdir::{DirEntry, WalkDir};

/// How a collection run fingerprints the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorOptions {
    /// Algorithms every file is hashed with
    pub algorithms: Vec<HashAlgorithm>,
    /// Follow symlinks to files and directories instead of skipping them
    pub follow_symlinks: bool,
    /// Glob patterns matched against artifact identities; matches are left out
    pub exclude: Vec<String>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            algorithms: vec![HashAlgorithm::Sha256],
            follow_symlinks: false,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactCollector {
    options: CollectorOptions,
    excludes: GlobSet,
}

impl ArtifactCollector {
    pub fn new(options: CollectorOptions) -> Result<Self> {
        if options.algorithms.is_empty() {
            return Err(Error::Configuration(
                "Collector needs at least one hash algorithm".to_string(),
            ));
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &options.exclude {
            let glob = Glob::new(pattern).map_err(|e| {
                Error::Configuration(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .map_err(|e| Error::Configuration(format!("Invalid exclude patterns: {e}")))?;

        Ok(Self { options, excludes })
    }

    pub fn options(&self) -> &CollectorOptions {
        &self.options
    }

    /// Fingerprint every regular file under `root`.
    ///
    /// A root that is itself a file yields a single artifact named after it.
    ///
    /// # Errors
    ///
    /// `Error::Io` or `Error::Walk` when the root or any entry under it cannot
    /// be read. No partial set is returned.
    pub fn collect(&self, root: &Path) -> Result<ArtifactSet> {
        // Surface a missing root as a plain IO error
        std::fs::metadata(root)?;

        let mut artifacts = ArtifactSet::new();

        let walker = WalkDir::new(root)
            .follow_links(self.options.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_entry(root, entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if self.is_skippable(&err) => {
                    warn!(
                        "[in-toto] Skipping unreadable symlink {}: {err}",
                        err.path().map(|p| p.display().to_string()).unwrap_or_default()
                    );
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                debug!("Skipping non-regular entry {}", entry.path().display());
                continue;
            }

            let identity = artifact_identity(root, entry.path())?;
            let hashes = hash::hash_file(
                entry.path(),
                &self.options.algorithms,
                self.options.follow_symlinks,
            )?;
            debug!("Collected {identity}");
            artifacts.insert(identity, hashes);
        }

        Ok(artifacts)
    }

    fn is_excluded_entry(&self, root: &Path, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || self.excludes.is_empty() {
            return false;
        }
        match artifact_identity(root, entry.path()) {
            Ok(identity) => self.excludes.is_match(identity.as_str()),
            Err(_) => false,
        }
    }

    // Loops and dangling links only show up as errors when links are followed
    fn is_skippable(&self, err: &walkdir::Error) -> bool {
        if !self.options.follow_symlinks {
            return false;
        }
        if err.loop_ancestor().is_some() {
            return true;
        }
        err.path()
            .and_then(|p| std::fs::symlink_metadata(p).ok())
            .is_some_and(|m| m.file_type().is_symlink())
    }
}

/// Collect `root` with the default options (sha256, no symlinks, no excludes).
pub fn collect(root: &Path) -> Result<ArtifactSet> {
    ArtifactCollector::new(CollectorOptions::default())?.collect(root)
}

/// Identity of `path` relative to `root`, joined with `/`.
pub fn artifact_identity(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        Error::Validation(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    if relative.as_os_str().is_empty() {
        // The root itself is a file
        let name = path.file_name().ok_or_else(|| {
            Error::Validation(format!("Cannot name artifact {}", path.display()))
        })?;
        return utf8_part(name, path).map(str::to_string);
    }

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(utf8_part(part, path)?);
        }
    }

    Ok(parts.join("/"))
}

// Lossy conversion could give two files the same identity
fn utf8_part<'a>(part: &'a OsStr, path: &Path) -> Result<&'a str> {
    part.to_str().ok_or_else(|| {
        Error::Validation(format!(
            "Artifact path is not valid UTF-8: {}",
            path.display()
        ))
    })
}
