//! # Step Recorder
//!
//! Drives the recording of one build step: snapshot the working directory,
//! let the step run, snapshot it again, then sign the resulting link and hand
//! it to the configured transport.
//!
//! ```no_run
//! use intoto_recorder::recorder::{Recorder, RecorderConfig};
//! use std::path::Path;
//!
//! let mut recorder = Recorder::new(RecorderConfig {
//!     step_name: "build".to_string(),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! recorder.prebuild(Path::new("workspace")).unwrap();
//! recorder.run_command(&["make".to_string()]).unwrap();
//! let outcome = recorder.perform().unwrap();
//! println!("link written to {}", outcome.local_path.display());
//! ```
//!
//! The link document is always written locally before any network
//! submission, so a failed upload never loses the step's metadata.

use crate::collector::{ArtifactCollector, CollectorOptions};
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use crate::link::{
    BYPRODUCT_RETURN_VALUE, BYPRODUCT_STDERR, BYPRODUCT_STDOUT, LinkAssembler, LinkDocument,
    normalize_step_name,
};
use crate::signing::{SigningKey, load_signing_key, sign_link};
use crate::transport::{SubmitOutcome, TransportOptions, select_transport};

use log::{debug, error, info, warn};
use serde_json::Value;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything needed to record one step.
#[derive(Debug, Clone, Default)]
pub struct RecorderConfig {
    /// PEM private key; the link is left unsigned when absent
    pub key_path: Option<PathBuf>,
    /// Blank names are recorded as `"step"`
    pub step_name: String,
    /// Transport URI; absent means the link is only written locally
    pub transport: Option<String>,
    /// Digest used for RSA and EC signatures
    pub signing_algorithm: HashAlgorithm,
    pub collector: CollectorOptions,
    pub transport_options: TransportOptions,
    /// Where link documents are written; defaults to the working directory
    pub dump_dir: Option<PathBuf>,
}

/// Result of [`Recorder::perform`].
#[derive(Debug)]
pub struct RecordOutcome {
    pub document: LinkDocument,
    /// Local copy of the link document
    pub local_path: PathBuf,
    /// Submission to the configured transport; `None` when the local dump
    /// was the only write
    pub submission: Option<Result<SubmitOutcome>>,
}

impl RecordOutcome {
    pub fn submission_failed(&self) -> bool {
        matches!(self.submission, Some(Err(_)))
    }
}

pub struct Recorder {
    config: RecorderConfig,
    step_name: String,
    key: Option<Box<dyn SigningKey>>,
    collector: ArtifactCollector,
    workdir: Option<PathBuf>,
    assembler: Option<LinkAssembler>,
}

impl Recorder {
    /// Prepare a recorder, loading the signing key if one is configured.
    ///
    /// # Errors
    ///
    /// `Error::Signing` if a key path is set but the key cannot be loaded, and
    /// `Error::Configuration` for invalid collector options.
    pub fn new(config: RecorderConfig) -> Result<Self> {
        let step_name = normalize_step_name(&config.step_name);

        let key = match config
            .key_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
        {
            Some(path) => {
                let key = load_signing_key(path, config.signing_algorithm)?;
                debug!("[in-toto] Loaded signing key {}", key.key_id());
                Some(Box::new(key) as Box<dyn SigningKey>)
            }
            None => None,
        };

        let collector = ArtifactCollector::new(config.collector.clone())?;

        Ok(Self {
            config,
            step_name,
            key,
            collector,
            workdir: None,
            assembler: None,
        })
    }

    /// Sign with `key` instead of the one loaded from `key_path`.
    pub fn with_signing_key(mut self, key: Box<dyn SigningKey>) -> Self {
        self.key = Some(key);
        self
    }

    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key.as_ref().map(|key| key.key_id())
    }

    /// Record the materials of the step found under `workdir`.
    pub fn prebuild(&mut self, workdir: &Path) -> Result<()> {
        info!(
            "[in-toto] Recording materials for step '{}' in {}",
            self.step_name,
            workdir.display()
        );

        let materials = self.collector.collect(workdir)?;
        debug!("[in-toto] {} materials recorded", materials.len());

        let mut assembler = LinkAssembler::begin(&self.step_name);
        assembler.materials(materials);

        self.assembler = Some(assembler);
        self.workdir = Some(workdir.to_path_buf());
        Ok(())
    }

    pub fn set_command(&mut self, command: Vec<String>) -> Result<()> {
        self.assembler_mut()?.command(command);
        Ok(())
    }

    pub fn add_byproduct(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.assembler_mut()?.byproduct(key, value);
        Ok(())
    }

    pub fn add_environment(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.assembler_mut()?.environment(key, value);
        Ok(())
    }

    /// Run `argv` in the working directory and record it with its output.
    ///
    /// Returns the exit code; a process killed by a signal reports `-1`.
    pub fn run_command(&mut self, argv: &[String]) -> Result<i32> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Validation("No command given for the step".to_string()))?;
        let workdir = self.workdir.clone().ok_or_else(not_prebuilt)?;

        info!("[in-toto] Running {}", argv.join(" "));
        let output = Command::new(program)
            .args(args)
            .current_dir(&workdir)
            .output()?;
        let code = output.status.code().unwrap_or(-1);

        let assembler = self.assembler_mut()?;
        assembler
            .command(argv.to_vec())
            .byproduct(
                BYPRODUCT_STDOUT,
                String::from_utf8_lossy(&output.stdout).into_owned(),
            )
            .byproduct(
                BYPRODUCT_STDERR,
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
            .byproduct(BYPRODUCT_RETURN_VALUE, code);

        Ok(code)
    }

    /// Record the products, sign, write the link locally and submit it.
    ///
    /// A failed submission is reported in [`RecordOutcome::submission`].
    /// A signing failure writes the unsigned link into the dump directory and
    /// is then returned as `Error::Signing`.
    pub fn perform(&mut self) -> Result<RecordOutcome> {
        let assembler = self.assembler.take().ok_or_else(not_prebuilt)?;
        let workdir = self.workdir.take().ok_or_else(not_prebuilt)?;

        info!(
            "[in-toto] Recording products for step '{}' in {}",
            self.step_name,
            workdir.display()
        );
        let products = self.collector.collect(&workdir)?;
        debug!("[in-toto] {} products recorded", products.len());

        let mut document = LinkDocument::new(assembler.finish(products));
        let dump_dir = self.config.dump_dir.clone().unwrap_or(workdir);

        match &self.key {
            Some(key) => {
                let signed = sign_link(document.signed(), Some(&**key))
                    .and_then(|signature| document.add_signature(signature));
                if let Err(e) = signed {
                    create_dir_all(&dump_dir)?;
                    let path = document.dump(&dump_dir)?;
                    error!(
                        "[in-toto] Signing with key {} failed: {e}. Unsigned link kept at {}",
                        key.key_id(),
                        path.display()
                    );
                    return Err(Error::Signing(format!(
                        "{e}; unsigned link kept at {}",
                        path.display()
                    )));
                }
                info!("[in-toto] Link signed with key {}", key.key_id());
            }
            None => warn!(
                "[in-toto] No signing key configured. Link for step '{}' is unsigned",
                self.step_name
            ),
        }

        let transport = select_transport(
            self.config.transport.as_deref(),
            &dump_dir,
            &self.config.transport_options,
        )?;

        if transport.is_local() {
            let (local_path, submission) = match transport.submit(&document) {
                Ok(outcome) => {
                    let path = outcome.local_path().map(Path::to_path_buf).ok_or_else(|| {
                        Error::Transport(format!("{outcome} is not a local dump"))
                    })?;
                    (path, None)
                }
                Err(e) => {
                    warn!(
                        "[in-toto] Could not write link to {}: {e}. Falling back to {}",
                        transport.describe(),
                        dump_dir.display()
                    );
                    create_dir_all(&dump_dir)?;
                    let path = document.dump(&dump_dir)?;
                    info!("[in-toto] Link metadata written to {}", path.display());
                    (path, Some(Err(e)))
                }
            };

            return Ok(RecordOutcome {
                document,
                local_path,
                submission,
            });
        }

        create_dir_all(&dump_dir)?;
        let local_path = document.dump(&dump_dir)?;
        info!(
            "[in-toto] Link metadata written to {}",
            local_path.display()
        );

        info!("[in-toto] Submitting link to {}", transport.describe());
        let submission = transport.submit(&document);
        match &submission {
            Ok(outcome) => info!("[in-toto] Link {outcome}"),
            Err(e) => error!(
                "[in-toto] Submission to {} failed: {e}. Link kept at {}",
                transport.describe(),
                local_path.display()
            ),
        }

        Ok(RecordOutcome {
            document,
            local_path,
            submission: Some(submission),
        })
    }

    fn assembler_mut(&mut self) -> Result<&mut LinkAssembler> {
        self.assembler.as_mut().ok_or_else(not_prebuilt)
    }
}

fn not_prebuilt() -> Error {
    Error::Validation("Step was not started; call prebuild first".to_string())
}
