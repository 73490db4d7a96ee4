//! # Link Metadata
//!
//! The in-toto link is the record of one build step: the artifacts present
//! before the step ran (materials), the artifacts present after it ran
//! (products), the command that was executed, and whatever byproducts and
//! environment information the recorder chose to capture.
//!
//! A [`Link`] is produced by a [`LinkAssembler`]. The assembler collects the
//! step metadata while the step is in flight and is consumed by
//! [`LinkAssembler::finish`], after which the link can only be read.
//!
//! ## Examples
//!
//! ```
//! use intoto_recorder::link::{ArtifactHash, ArtifactSet, LinkAssembler};
//!
//! let mut materials = ArtifactSet::new();
//! materials.insert(
//!     "a.txt".to_string(),
//!     ArtifactHash::from([("sha256".to_string(), "00".repeat(32))]),
//! );
//!
//! let mut assembler = LinkAssembler::begin("");
//! assembler.materials(materials.clone());
//! assembler.command(vec!["make".to_string(), "all".to_string()]);
//! let link = assembler.finish(ArtifactSet::new());
//!
//! assert_eq!(link.name(), "step");
//! assert_eq!(link.materials(), &materials);
//! assert!(link.products().is_empty());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod document;

pub use document::{LinkDocument, Signature};

/// Hash algorithm name to lowercase hex digest, for one artifact.
pub type ArtifactHash = BTreeMap<String, String>;

/// Artifact identity (relative path) to its hashes.
///
/// Ordered so that serialization does not depend on filesystem iteration order.
pub type ArtifactSet = BTreeMap<String, ArtifactHash>;

/// Step name used when none is configured.
pub const DEFAULT_STEP_NAME: &str = "step";

/// Value of the `_type` field of every link.
pub const LINK_TYPE: &str = "link";

/// Byproduct key for the captured standard output of the step.
pub const BYPRODUCT_STDOUT: &str = "stdout";
/// Byproduct key for the captured standard error of the step.
pub const BYPRODUCT_STDERR: &str = "stderr";
/// Byproduct key for the exit code of the step.
pub const BYPRODUCT_RETURN_VALUE: &str = "return-value";

/// Immutable link metadata for one build step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "_type")]
    link_type: String,
    name: String,
    materials: ArtifactSet,
    products: ArtifactSet,
    command: Vec<String>,
    byproducts: BTreeMap<String, Value>,
    environment: BTreeMap<String, Value>,
}

impl Link {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn materials(&self) -> &ArtifactSet {
        &self.materials
    }

    pub fn products(&self) -> &ArtifactSet {
        &self.products
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn byproducts(&self) -> &BTreeMap<String, Value> {
        &self.byproducts
    }

    pub fn environment(&self) -> &BTreeMap<String, Value> {
        &self.environment
    }

    /// Check the fields a deserialized link must carry.
    pub fn validate(&self) -> Result<()> {
        if self.link_type != LINK_TYPE {
            return Err(Error::Validation(format!(
                "Expected _type \"{LINK_TYPE}\", found \"{}\"",
                self.link_type
            )));
        }
        if self.name.is_empty() {
            return Err(Error::Validation("Link name cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder that accumulates step metadata until the products are known.
#[derive(Clone, Debug)]
pub struct LinkAssembler {
    name: String,
    materials: ArtifactSet,
    command: Vec<String>,
    byproducts: BTreeMap<String, Value>,
    environment: BTreeMap<String, Value>,
}

impl LinkAssembler {
    /// Start a link for `step_name`, falling back to `"step"` when it is blank.
    pub fn begin(step_name: &str) -> Self {
        Self {
            name: normalize_step_name(step_name),
            materials: ArtifactSet::new(),
            command: Vec::new(),
            byproducts: BTreeMap::new(),
            environment: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record the artifacts collected before the step ran.
    pub fn materials(&mut self, materials: ArtifactSet) -> &mut Self {
        self.materials = materials;
        self
    }

    pub fn command(&mut self, command: Vec<String>) -> &mut Self {
        self.command = command;
        self
    }

    pub fn byproduct(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.byproducts.insert(key.into(), value.into());
        self
    }

    pub fn environment(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Record the artifacts collected after the step ran and freeze the link.
    pub fn finish(self, products: ArtifactSet) -> Link {
        Link {
            link_type: LINK_TYPE.to_string(),
            name: self.name,
            materials: self.materials,
            products,
            command: self.command,
            byproducts: self.byproducts,
            environment: self.environment,
        }
    }
}

/// Blank step names become [`DEFAULT_STEP_NAME`].
pub fn normalize_step_name(step_name: &str) -> String {
    let trimmed = step_name.trim();
    if trimmed.is_empty() {
        DEFAULT_STEP_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
