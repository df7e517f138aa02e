//! sndwho binary entry point
//!
//! Dispatches to the one-shot query, the daemon, or the IPC commands based
//! on CLI arguments.

use clap::error::ErrorKind;
use clap::Parser;
use color_eyre::eyre::Result;
use sndwho::{cli::Args, cli::Command, commands, config::Config, daemon, logging};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are successful exits; bad arguments are
            // a usage error.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    match args.command {
        // No subcommand: the one-shot query is the default
        None => {
            logging::init_cli();
            let config = Config::load()?;
            commands::sessions(&config, false)
        }

        Some(Command::Sessions { compact }) => {
            logging::init_cli();
            let config = Config::load()?;
            commands::sessions(&config, compact)
        }

        // Daemon handles its own logging initialization (file vs stderr)
        Some(Command::Daemon { foreground }) => {
            let config = Config::load()?;
            daemon::run(config, foreground).await
        }

        Some(Command::Status) => {
            logging::init_cli();
            commands::status().await
        }

        Some(Command::Stop) => {
            logging::init_cli();
            commands::stop().await
        }

        Some(Command::Validate) => {
            logging::init_cli();
            let config = Config::load()?;
            config.print_summary();
            Ok(())
        }
    }
}
