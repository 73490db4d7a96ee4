use clap::Parser;
use intoto_recorder::{
    cli::{self, commands::StepCommands},
    error::Result,
};

#[derive(Parser)]
#[command(name = cli::CLI_NAME, author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: StepCommands,
}

fn main() -> Result<()> {
    // Initialize logging
    intoto_recorder::init_logging()?;

    // Parse command line arguments
    let cli = Cli::parse();

    let result = cli::handlers::handle_step_command(cli.command);

    // Format and display any errors
    if let Err(ref e) = result {
        eprintln!("{}", cli::format_error(e));
    }

    // The step's own failure is reported once its link exists
    let code = result?;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
