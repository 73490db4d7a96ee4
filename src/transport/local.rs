use crate::error::{Error, Result};
use crate::link::LinkDocument;
use crate::transport::{SubmitOutcome, Transport};

use log::info;
use reqwest::Url;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

/// Writes link documents into a directory as `<step>.<suffix>.link`.
#[derive(Debug, Clone)]
pub struct LocalDump {
    base_path: PathBuf,
}

impl LocalDump {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        if !path.exists() {
            create_dir_all(&path)?;
        }
        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::other(format!(
                "{} is not a directory",
                path.display()
            ))));
        }

        Ok(Self { base_path: path })
    }

    /// Build from a `file://` URI.
    ///
    /// A path that cannot hold link documents is a `Configuration` error.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| Error::UnsupportedTransport(format!("Malformed file URI '{uri}': {e}")))?;
        let path = url
            .to_file_path()
            .map_err(|_| Error::Configuration(format!("'{uri}' does not name a local directory")))?;

        Self::new(&path).map_err(|e| {
            Error::Configuration(format!(
                "Cannot use {} as link directory: {e}",
                path.display()
            ))
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Transport for LocalDump {
    fn describe(&self) -> String {
        format!("local:{}", self.base_path.display())
    }

    fn submit(&self, document: &LinkDocument) -> Result<SubmitOutcome> {
        let path = document.dump(&self.base_path)?;
        info!("[in-toto] Link metadata written to {}", path.display());
        Ok(SubmitOutcome::Dumped { path })
    }

    fn is_local(&self) -> bool {
        true
    }
}
