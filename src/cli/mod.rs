pub mod commands;
pub mod handlers;
use crate::error::Error;

// Re-export commonly used items
pub use commands::{CollectionArgs, HashAlgorithmChoice, StepCommands};
pub use handlers::handle_step_command;

pub const CLI_NAME: &str = "intoto-recorder";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::Io(err) => format!("IO error: {err}"),
        Error::Walk(err) => format!("Directory walk error: {err}"),
        Error::Signing(msg) => format!("Signing error: {msg}"),
        Error::UnsupportedTransport(msg) => format!("Unsupported transport: {msg}"),
        Error::Configuration(msg) => format!("Configuration error: {msg}"),
        Error::Transport(msg) => format!("Transport error: {msg}"),
        Error::Validation(msg) => format!("Validation error: {msg}"),
        Error::Serialization(msg) => format!("Serialization error: {msg}"),
        Error::InitializationError(msg) => format!("Initialization error: {msg}"),
        Error::HexDecode(err) => format!("Hex decode error: {err}"),
        Error::Json(err) => format!("JSON error: {err}"),
    }
}

/// Helper function to print validation warnings to the user
pub fn print_validation_warning(message: &str) {
    eprintln!("Warning: {message}");
}
