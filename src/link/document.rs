use crate::error::{Error, Result};
use crate::link::Link;
use crate::utils::{safe_create_file, safe_open_file};

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// File extension of persisted link documents.
pub const LINK_EXTENSION: &str = "link";

const SUFFIX_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub keyid: String,
    /// Lowercase hex encoded signature bytes
    pub sig: String,
}

impl Signature {
    pub fn new(keyid: impl Into<String>, sig: &[u8]) -> Self {
        Self {
            keyid: keyid.into(),
            sig: hex::encode(sig),
        }
    }

    pub fn sig_bytes(&self) -> Result<Vec<u8>> {
        Ok(hex::decode(&self.sig)?)
    }
}

/// A link together with the signatures over it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkDocument {
    signatures: Vec<Signature>,
    signed: Link,
}

impl LinkDocument {
    pub fn new(link: Link) -> Self {
        Self {
            signatures: vec![],
            signed: link,
        }
    }

    pub fn signed(&self) -> &Link {
        &self.signed
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Attach a signature, replacing any earlier signature by the same key.
    pub fn add_signature(&mut self, signature: Signature) -> Result<()> {
        if signature.sig.is_empty() {
            return Err(Error::Signing("Link signature cannot be empty".to_string()));
        }
        if signature.keyid.is_empty() {
            return Err(Error::Signing("Link signature needs a key id".to_string()));
        }

        self.signatures.retain(|s| s.keyid != signature.keyid);
        self.signatures.push(signature);

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: LinkDocument = serde_json::from_str(json)
            .map_err(|e| Error::Serialization(format!("Failed to parse link: {e}")))?;
        document.signed.validate()?;
        Ok(document)
    }

    /// Name of the file this document is persisted as: `<step>.<suffix>.link`.
    ///
    /// The suffix is the start of the first signer's key id, or random hex for
    /// an unsigned link so that repeated unsigned runs do not overwrite each other.
    pub fn file_name(&self) -> String {
        let suffix = match self.signatures.first() {
            Some(signature) => signature.keyid.chars().take(SUFFIX_LEN).collect(),
            None => uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(SUFFIX_LEN)
                .collect::<String>(),
        };

        format!("{}.{}.{}", self.signed.name(), suffix, LINK_EXTENSION)
    }

    /// Write the document into `dir` and return the path written.
    pub fn dump(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let json = self.to_json_pretty()?;

        let mut file = safe_create_file(&path, false)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;

        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut file = safe_open_file(path, false)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        Self::from_json(&content)
    }
}
