//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idflasher")]
#[command(author, version, about = "Flash firmware and a serial number onto ESP32 devices", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Provisioning profile (TOML) overriding tool path, chip, baud and offsets
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List serial ports and highlight likely target boards
    ListPorts,

    /// Show how the flashing tool will be invoked
    LocateTool,

    /// Write the firmware, then the serial number record
    Provision {
        /// Serial port of the device (defaults to the only likely target)
        #[arg(short, long)]
        port: Option<String>,

        /// Serial number to assign to the device
        #[arg(short, long)]
        serial: String,

        /// Firmware image (.bin)
        #[arg(short, long)]
        firmware: PathBuf,
    },
}
