use crate::collector::CollectorOptions;
use crate::hash::HashAlgorithm;

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Link documents written by earlier runs are never recorded as artifacts.
pub const DEFAULT_EXCLUDE: &str = "*.link";

#[derive(Debug, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum HashAlgorithmChoice {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithmChoice {
    pub fn to_hash_algorithm(&self) -> HashAlgorithm {
        match self {
            HashAlgorithmChoice::Sha256 => HashAlgorithm::Sha256,
            HashAlgorithmChoice::Sha384 => HashAlgorithm::Sha384,
            HashAlgorithmChoice::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

/// How artifacts are fingerprinted.
#[derive(Debug, Clone, Args)]
pub struct CollectionArgs {
    /// Hash algorithms for artifacts (comma-separated)
    #[arg(
        long = "hash-alg",
        value_enum,
        value_delimiter = ',',
        default_value = "sha256"
    )]
    pub hash_alg: Vec<HashAlgorithmChoice>,

    /// Follow symlinks while walking the tree
    #[arg(long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Glob patterns of artifacts to leave out, in addition to *.link
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
}

impl CollectionArgs {
    pub fn to_collector_options(&self) -> CollectorOptions {
        let mut algorithms: Vec<HashAlgorithm> = self
            .hash_alg
            .iter()
            .map(HashAlgorithmChoice::to_hash_algorithm)
            .collect();
        algorithms.dedup();

        let mut exclude = vec![DEFAULT_EXCLUDE.to_string()];
        exclude.extend(self.exclude.iter().cloned());

        CollectorOptions {
            algorithms,
            follow_symlinks: self.follow_symlinks,
            exclude,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum StepCommands {
    /// Record a step: snapshot materials, run the command, snapshot products,
    /// then sign and submit the link
    Run {
        /// Name of the step
        #[arg(long = "step-name", env = "INTOTO_STEP_NAME", default_value = "")]
        step_name: String,

        /// Path to private key file for signing (PEM format)
        #[arg(long = "key", env = "INTOTO_KEY")]
        key: Option<PathBuf>,

        /// Hash algorithm used for the signature
        #[arg(long = "signing-alg", value_enum, default_value = "sha256")]
        signing_alg: HashAlgorithmChoice,

        /// Transport URI (file://, http(s):// or grafeas+http(s)://)
        #[arg(long = "transport", env = "INTOTO_TRANSPORT")]
        transport: Option<String>,

        /// Working directory of the step
        #[arg(long = "workdir", default_value = ".")]
        workdir: PathBuf,

        /// Directory for the local link document (default: workdir)
        #[arg(long = "dump-dir")]
        dump_dir: Option<PathBuf>,

        #[command(flatten)]
        collection: CollectionArgs,

        /// Environment variables to record in the link
        #[arg(long = "record-env")]
        record_env: Vec<String>,

        /// Submission timeout in seconds
        #[arg(long = "timeout", default_value_t = 30)]
        timeout: u64,

        /// The step's command
        #[arg(last = true, required = true, num_args = 1..)]
        command: Vec<String>,
    },
    /// Print the artifacts found under a path as JSON
    Collect {
        /// File or directory to fingerprint
        #[arg(long = "path", default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        collection: CollectionArgs,
    },
}
