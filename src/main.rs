//! idflasher - ESP32 firmware and serial number provisioning
//!
//! Writes an application image and a `SERIAL:<value>` identity record to a
//! device in one step, using esptool for the actual flashing.
//!
//! The work happens in `idflasher-core`; this binary only collects the
//! inputs, shows progress and prints the outcome.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use idflasher_core::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::ListPorts => commands::ports::run_list_ports(),
        Commands::LocateTool => {
            commands::ports::run_locate_tool(&config);
            Ok(())
        }
        Commands::Provision {
            port,
            serial,
            firmware,
        } => {
            let result =
                commands::provision::run_provision(&config, port.as_deref(), &serial, &firmware)?;
            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
