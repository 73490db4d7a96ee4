use crate::error::Result;

use super::commands::StepCommands;
use super::print_validation_warning;
use crate::collector::ArtifactCollector;
use crate::recorder::{Recorder, RecorderConfig};
use crate::transport::TransportOptions;

use log::debug;
use std::time::Duration;

/// Run a subcommand and return the process exit code it asks for.
pub fn handle_step_command(cmd: StepCommands) -> Result<i32> {
    match cmd {
        StepCommands::Run {
            step_name,
            key,
            signing_alg,
            transport,
            workdir,
            dump_dir,
            collection,
            record_env,
            timeout,
            command,
        } => {
            let config = RecorderConfig {
                key_path: key,
                step_name,
                transport,
                signing_algorithm: signing_alg.to_hash_algorithm(),
                collector: collection.to_collector_options(),
                transport_options: TransportOptions {
                    timeout: Duration::from_secs(timeout),
                },
                dump_dir,
            };

            let mut recorder = Recorder::new(config)?;
            if recorder.key_id().is_none() {
                print_validation_warning("No signing key given, the link will be unsigned");
            }

            recorder.prebuild(&workdir)?;
            for name in &record_env {
                match std::env::var(name) {
                    Ok(value) => recorder.add_environment(name, value)?,
                    Err(_) => debug!("[in-toto] {name} is not set, not recording it"),
                }
            }

            let code = recorder.run_command(&command)?;
            let outcome = recorder.perform()?;

            println!("Link written to {}", outcome.local_path.display());
            match &outcome.submission {
                Some(Ok(submitted)) => println!("Link {submitted}"),
                Some(Err(e)) => {
                    print_validation_warning(&format!("Link was not submitted: {e}"))
                }
                None => {}
            }

            Ok(code)
        }
        StepCommands::Collect { path, collection } => {
            let collector = ArtifactCollector::new(collection.to_collector_options())?;
            let artifacts = collector.collect(&path)?;
            println!("{}", serde_json::to_string_pretty(&artifacts)?);
            Ok(0)
        }
    }
}
