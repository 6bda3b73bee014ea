//! idflasher-core - Device provisioning over esptool
//!
//! Gives an ESP32 board its application firmware and a serial number in one
//! attempt. The actual flashing is done by esptool running as a child
//! process; this crate decides what to run, in which order, and what to tell
//! the operator.
//!
//! # Components
//!
//! - [`ports`] lists serial ports and guesses which one holds the board
//! - [`tool`] finds the esptool executable
//! - [`runner`] runs it, behind the [`runner::ToolRunner`] trait
//! - [`flash`] writes one payload to one offset
//! - [`record`] stages the `SERIAL:<value>` record
//! - [`provision`] sequences the two writes
//! - [`config`] holds chip, baud rate and offsets
//!
//! # Example
//!
//! ```no_run
//! use idflasher_core::config::Config;
//! use idflasher_core::provision::{NoProgress, Provisioner};
//! use std::path::Path;
//!
//! let mut provisioner = Provisioner::from_config(&Config::default());
//! let result = provisioner.validate_and_start(
//!     "/dev/ttyUSB0",
//!     "Unit-0001",
//!     Path::new("firmware.bin"),
//!     &mut NoProgress,
//! );
//! println!("{}", result.status_message);
//! ```

pub mod config;
pub mod error;
pub mod flash;
pub mod ports;
pub mod provision;
pub mod record;
pub mod runner;
pub mod tool;

pub use config::{Config, TargetConfig};
pub use error::{Error, Result};
pub use flash::FlashOutcome;
pub use ports::Port;
pub use provision::{FailureKind, ProgressSink, ProvisioningResult, Provisioner, Stage};
pub use record::{SerialNumber, SerialRecord};
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};
pub use tool::FlashTool;
