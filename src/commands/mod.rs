//! CLI command implementations
//!
//! `ports` covers discovery (serial ports and the flashing tool), `provision`
//! runs a provisioning attempt with a progress spinner.

pub mod ports;
pub mod provision;
