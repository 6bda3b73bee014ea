//! Provisioning a device: firmware first, then its serial number
//!
//! One attempt walks through
//!
//! ```text
//! ValidatingInputs -> FlashingFirmware -> FlashingSerial -> Done
//! ```
//!
//! and may stop early at `Done` when the inputs are incomplete or the
//! firmware write fails. The firmware always goes first: a device must never
//! end up with an identity but no working application. Nothing is rolled
//! back, so a failed serial write leaves the new firmware in place.
//!
//! Each flash write blocks until the tool exits; there is no timeout and no
//! cancellation. A [`ProgressSink`] hears about every stage before it starts,
//! which is the caller's chance to update whatever it displays.

use crate::config::{Config, TargetConfig};
use crate::flash::{self, FlashOutcome};
use crate::ports;
use crate::record::{SerialNumber, SerialRecord};
use crate::runner::{ProcessRunner, ToolRunner};
use std::fmt;
use std::path::Path;

/// Reported when a field is missing; which one is deliberately not said
pub const INVALID_INPUT_MESSAGE: &str = "Please fill in all fields and select a valid serial port.";
/// Reported when both writes succeeded
pub const SUCCESS_MESSAGE: &str =
    "Provisioning completed successfully! Firmware and serial number written.";

const VALIDATING_MESSAGE: &str = "Checking inputs...";
const FIRMWARE_MESSAGE: &str =
    "1/2: Writing firmware... This may take a few seconds. Do not disconnect the device.";
const SERIAL_MESSAGE: &str = "2/2: Firmware written. Writing serial number...";

/// Stage of a provisioning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingInputs,
    FlashingFirmware,
    FlashingSerial,
    Done { success: bool },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ValidatingInputs => write!(f, "validating inputs"),
            Stage::FlashingFirmware => write!(f, "flashing firmware"),
            Stage::FlashingSerial => write!(f, "flashing serial number"),
            Stage::Done { success: true } => write!(f, "done"),
            Stage::Done { success: false } => write!(f, "failed"),
        }
    }
}

/// Receives stage changes of a running attempt
pub trait ProgressSink {
    /// Called when the attempt enters `stage`, before any blocking work
    fn stage(&mut self, stage: Stage, message: &str);
}

impl<F: FnMut(Stage, &str)> ProgressSink for F {
    fn stage(&mut self, stage: Stage, message: &str) {
        self(stage, message)
    }
}

/// Progress sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&mut self, _stage: Stage, _message: &str) {}
}

/// Why an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A field was missing; no hardware was touched
    InvalidInput,
    /// The flashing tool could not be started for the firmware write
    ToolInvocation,
    /// The flashing tool ran and rejected the firmware write
    FlashFailure,
    /// Firmware was written, the serial number was not
    PartialProvisioning,
}

/// Final result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub success: bool,
    /// Text for the operator
    pub status_message: String,
    /// Set whenever `success` is false
    pub failure: Option<FailureKind>,
}

impl ProvisioningResult {
    fn succeeded() -> Self {
        Self {
            success: true,
            status_message: SUCCESS_MESSAGE.to_string(),
            failure: None,
        }
    }

    fn failed(kind: FailureKind, status_message: String) -> Self {
        Self {
            success: false,
            status_message,
            failure: Some(kind),
        }
    }

    /// Whether the firmware on the device is known to be fresh
    pub fn firmware_written(&self) -> bool {
        self.success || self.failure == Some(FailureKind::PartialProvisioning)
    }
}

/// Runs provisioning attempts through a [`ToolRunner`]
pub struct Provisioner<R> {
    runner: R,
    target: TargetConfig,
}

impl Provisioner<ProcessRunner> {
    /// Provisioner running the real flashing tool described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(ProcessRunner::new(config.flash_tool()), config.target.clone())
    }
}

impl<R: ToolRunner> Provisioner<R> {
    pub fn new(runner: R, target: TargetConfig) -> Self {
        Self { runner, target }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// Run one complete attempt
    ///
    /// `port` may be the [`ports::NO_SELECTION`] placeholder, which counts as
    /// no port. The firmware path is not checked for existence; a bad path is
    /// reported by the flashing tool like any other write failure.
    pub fn validate_and_start(
        &mut self,
        port: &str,
        serial_number: &str,
        firmware_path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> ProvisioningResult {
        progress.stage(Stage::ValidatingInputs, VALIDATING_MESSAGE);

        let port = port.trim();
        let serial = match SerialNumber::parse(serial_number) {
            Some(serial) if ports::is_port_selected(port) && !is_blank(firmware_path) => serial,
            _ => {
                log::warn!("Refusing to provision: incomplete inputs");
                return finish(
                    progress,
                    ProvisioningResult::failed(
                        FailureKind::InvalidInput,
                        INVALID_INPUT_MESSAGE.to_string(),
                    ),
                );
            }
        };

        log::info!("Provisioning {} on {}", serial, port);

        progress.stage(Stage::FlashingFirmware, FIRMWARE_MESSAGE);
        let outcome = flash::flash(
            &mut self.runner,
            &self.target,
            port,
            self.target.firmware_offset,
            firmware_path,
        );
        if !outcome.is_success() {
            let kind = match outcome {
                FlashOutcome::LaunchFailed { .. } => FailureKind::ToolInvocation,
                _ => FailureKind::FlashFailure,
            };
            return finish(
                progress,
                ProvisioningResult::failed(
                    kind,
                    format!(
                        "Firmware write failed. Check the connections.\n{}",
                        outcome.message()
                    ),
                ),
            );
        }

        progress.stage(Stage::FlashingSerial, SERIAL_MESSAGE);
        let outcome = self.flash_serial(port, &serial);
        let result = if outcome.is_success() {
            ProvisioningResult::succeeded()
        } else {
            log::warn!("Firmware is in place but the serial number was not written");
            ProvisioningResult::failed(
                FailureKind::PartialProvisioning,
                format!(
                    "Firmware was written successfully, only the serial number write failed. \
                     The firmware does not need to be flashed again.\n{}",
                    outcome.message()
                ),
            )
        };
        finish(progress, result)
    }

    /// Stage the record, write it, and remove it again
    fn flash_serial(&mut self, port: &str, serial: &SerialNumber) -> FlashOutcome {
        let record = match SerialRecord::create(serial) {
            Ok(record) => record,
            Err(e) => {
                log::error!("{}", e);
                return FlashOutcome::LaunchFailed {
                    error: e.to_string(),
                };
            }
        };

        flash::flash(
            &mut self.runner,
            &self.target,
            port,
            self.target.serial_offset,
            record.path(),
        )
    }
}

fn finish(progress: &mut dyn ProgressSink, result: ProvisioningResult) -> ProvisioningResult {
    if result.success {
        log::info!("{}", result.status_message);
    } else {
        log::error!("{}", result.status_message);
    }
    progress.stage(
        Stage::Done {
            success: result.success,
        },
        &result.status_message,
    );
    result
}

fn is_blank(path: &Path) -> bool {
    match path.to_str() {
        Some(s) => s.trim().is_empty(),
        None => path.as_os_str().is_empty(),
    }
}
