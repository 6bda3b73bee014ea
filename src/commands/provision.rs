//! Provision command implementation

use idflasher_core::ports::{self, Port};
use idflasher_core::provision::{ProgressSink, ProvisioningResult, Provisioner, Stage};
use idflasher_core::Config;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Why no port could be picked automatically
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortChoiceError {
    #[error("No serial ports found. Connect the device or pass --port")]
    NoPorts,

    #[error("No likely target among {0}; pass --port explicitly")]
    NoCandidate(String),

    #[error("Several likely targets ({0}); pass --port explicitly")]
    Ambiguous(String),
}

/// Spinner that follows the provisioning stages
///
/// The spinner ticks on its own thread, so it keeps moving while a flash
/// write blocks.
struct SpinnerProgress {
    bar: Option<ProgressBar>,
}

impl SpinnerProgress {
    fn new() -> Self {
        Self { bar: None }
    }

    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl ProgressSink for SpinnerProgress {
    fn stage(&mut self, stage: Stage, message: &str) {
        match stage {
            Stage::Done { .. } => {
                if let Some(pb) = self.bar.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {
                let pb = self.bar.get_or_insert_with(Self::create_spinner);
                pb.set_message(message.to_string());
            }
        }
    }
}

/// Pick the port for an attempt
///
/// An explicit port always wins. Otherwise the only likely target is used;
/// anything else is left to the operator.
pub fn choose_port(explicit: Option<&str>, available: &[Port]) -> Result<String, PortChoiceError> {
    if let Some(port) = explicit {
        return Ok(port.to_string());
    }

    if available.is_empty() {
        return Err(PortChoiceError::NoPorts);
    }

    if let Some(port) = ports::suggest_port(available) {
        log::info!("Using {} ({})", port.name, port.description);
        return Ok(port.name.clone());
    }

    let candidates: Vec<&str> = available
        .iter()
        .filter(|p| p.is_likely_target())
        .map(|p| p.name.as_str())
        .collect();
    if candidates.is_empty() {
        let all: Vec<&str> = available.iter().map(|p| p.name.as_str()).collect();
        Err(PortChoiceError::NoCandidate(all.join(", ")))
    } else {
        Err(PortChoiceError::Ambiguous(candidates.join(", ")))
    }
}

/// Run one provisioning attempt and print its outcome
pub fn run_provision(
    config: &Config,
    port: Option<&str>,
    serial: &str,
    firmware: &Path,
) -> Result<ProvisioningResult, Box<dyn std::error::Error>> {
    let available = match port {
        Some(_) => Vec::new(),
        None => ports::list_ports()?,
    };
    let port = choose_port(port, &available)?;

    let mut provisioner = Provisioner::from_config(config);
    let mut progress = SpinnerProgress::new();
    let result = provisioner.validate_and_start(&port, serial, firmware, &mut progress);

    if result.success {
        println!("{}", result.status_message);
    } else {
        eprintln!("{}", result.status_message);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ports() -> Vec<Port> {
        vec![
            Port::new("/dev/ttyS0", "n/a"),
            Port::new("/dev/ttyUSB0", "CP2102 USB to UART Bridge Controller"),
        ]
    }

    #[test]
    fn test_explicit_port_wins() {
        assert_eq!(choose_port(Some("/dev/ttyS0"), &sample_ports()).unwrap(), "/dev/ttyS0");
        assert_eq!(choose_port(Some("COM9"), &[]).unwrap(), "COM9");
    }

    #[test]
    fn test_single_candidate_is_used() {
        assert_eq!(choose_port(None, &sample_ports()).unwrap(), "/dev/ttyUSB0");
    }

    #[test]
    fn test_no_ports() {
        assert_eq!(choose_port(None, &[]), Err(PortChoiceError::NoPorts));
    }

    #[test]
    fn test_no_candidate() {
        let ports = vec![Port::new("/dev/ttyS0", "n/a"), Port::new("/dev/ttyS1", "n/a")];
        assert_eq!(
            choose_port(None, &ports),
            Err(PortChoiceError::NoCandidate("/dev/ttyS0, /dev/ttyS1".to_string()))
        );
    }

    #[test]
    fn test_ambiguous() {
        let ports = vec![
            Port::new("COM3", "Silicon Labs CP210x USB to UART Bridge (COM3)"),
            Port::new("COM4", "Communications Port (COM4)"),
            Port::new("COM5", "USB-SERIAL CH340 (COM5)"),
        ];
        assert_eq!(
            choose_port(None, &ports),
            Err(PortChoiceError::Ambiguous("COM3, COM5".to_string()))
        );
    }

    #[test]
    fn test_spinner_follows_stages() {
        let mut progress = SpinnerProgress::new();
        progress.stage(Stage::FlashingFirmware, "1/2");
        assert!(progress.bar.is_some());
        progress.stage(Stage::FlashingSerial, "2/2");
        assert_eq!(progress.bar.as_ref().unwrap().message(), "2/2");
        progress.stage(Stage::Done { success: true }, "done");
        assert!(progress.bar.is_none());
    }
}
