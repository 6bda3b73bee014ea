//! Writing one payload to one flash offset
//!
//! Every write is a single esptool run:
//!
//! ```text
//! <tool> --chip <chip> --port <port> --baud <baud> write_flash <offset> <payload>
//! ```
//!
//! Nothing is retried here. A failed write is reported with the tool's own
//! diagnostics so the operator can tell a loose cable from a bad image.

use crate::config::TargetConfig;
use crate::runner::ToolRunner;
use std::fmt;
use std::path::Path;

/// Message of a successful write
pub const WRITE_OK_MESSAGE: &str = "Flash write completed successfully.";

/// Result of a single flash write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashOutcome {
    /// The tool exited with status 0
    Written,
    /// The tool ran and exited with a failure status
    Rejected {
        exit_code: Option<i32>,
        /// Diagnostic output exactly as the tool printed it
        diagnostics: String,
    },
    /// The tool could not be run at all
    LaunchFailed { error: String },
}

impl FlashOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FlashOutcome::Written)
    }

    /// Text shown to the operator for this outcome
    pub fn message(&self) -> String {
        match self {
            FlashOutcome::Written => WRITE_OK_MESSAGE.to_string(),
            FlashOutcome::Rejected { diagnostics, .. } => diagnostics.clone(),
            FlashOutcome::LaunchFailed { error } => format!("Unexpected error: {}", error),
        }
    }
}

impl fmt::Display for FlashOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Build the esptool argument list for one write
pub fn write_flash_args(target: &TargetConfig, port: &str, offset: u32, payload: &Path) -> Vec<String> {
    vec![
        "--chip".to_string(),
        target.chip.clone(),
        "--port".to_string(),
        port.to_string(),
        "--baud".to_string(),
        target.baud.to_string(),
        "write_flash".to_string(),
        format!("0x{:x}", offset),
        payload.display().to_string(),
    ]
}

/// Write `payload` at `offset` on the device behind `port`
pub fn flash<R: ToolRunner + ?Sized>(
    runner: &mut R,
    target: &TargetConfig,
    port: &str,
    offset: u32,
    payload: &Path,
) -> FlashOutcome {
    log::info!(
        "Writing {} to 0x{:X} on {}",
        payload.display(),
        offset,
        port
    );

    let args = write_flash_args(target, port, offset, payload);
    match runner.invoke(&args) {
        Ok(output) if output.is_success() => FlashOutcome::Written,
        Ok(output) => {
            log::warn!("Flash tool failed with exit code {:?}", output.exit_code);
            // esptool reports fatal errors on stderr; fall back to stdout for
            // wrappers that merge the streams.
            let diagnostics = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            FlashOutcome::Rejected {
                exit_code: output.exit_code,
                diagnostics,
            }
        }
        Err(e) => {
            log::error!("Failed to run flash tool: {}", e);
            FlashOutcome::LaunchFailed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ToolOutput;
    use std::io;

    struct Canned {
        result: Option<io::Result<ToolOutput>>,
        seen: Vec<Vec<String>>,
    }

    impl Canned {
        fn new(result: io::Result<ToolOutput>) -> Self {
            Self {
                result: Some(result),
                seen: Vec::new(),
            }
        }
    }

    impl ToolRunner for Canned {
        fn invoke(&mut self, args: &[String]) -> io::Result<ToolOutput> {
            self.seen.push(args.to_vec());
            self.result.take().expect("invoked more than once")
        }
    }

    #[test]
    fn test_argument_template() {
        let args = write_flash_args(
            &TargetConfig::default(),
            "COM5",
            0x10000,
            Path::new("app.bin"),
        );
        assert_eq!(
            args,
            [
                "--chip",
                "esp32",
                "--port",
                "COM5",
                "--baud",
                "921600",
                "write_flash",
                "0x10000",
                "app.bin"
            ]
        );
    }

    #[test]
    fn test_success() {
        let mut runner = Canned::new(Ok(ToolOutput::success("Hash of data verified.")));
        let outcome = flash(
            &mut runner,
            &TargetConfig::default(),
            "/dev/ttyUSB0",
            0x9000,
            Path::new("/tmp/serial"),
        );
        assert!(outcome.is_success());
        assert_eq!(outcome.message(), WRITE_OK_MESSAGE);
        assert_eq!(runner.seen.len(), 1);
        assert_eq!(runner.seen[0][7], "0x9000");
    }

    #[test]
    fn test_failure_keeps_diagnostics_verbatim() {
        let stderr = "A fatal error occurred: Failed to connect to ESP32: Timed out\n  waiting for packet header\n";
        let mut runner = Canned::new(Ok(ToolOutput::failure(2, stderr)));
        let outcome = flash(
            &mut runner,
            &TargetConfig::default(),
            "COM5",
            0x10000,
            Path::new("app.bin"),
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), stderr);
        assert_eq!(
            outcome,
            FlashOutcome::Rejected {
                exit_code: Some(2),
                diagnostics: stderr.to_string()
            }
        );
    }

    #[test]
    fn test_failure_falls_back_to_stdout() {
        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "No serial data received.".to_string(),
            stderr: String::new(),
        };
        let mut runner = Canned::new(Ok(output));
        let outcome = flash(
            &mut runner,
            &TargetConfig::default(),
            "COM5",
            0x10000,
            Path::new("app.bin"),
        );
        assert_eq!(outcome.message(), "No serial data received.");
    }

    #[test]
    fn test_launch_failure() {
        let mut runner = Canned::new(Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        )));
        let outcome = flash(
            &mut runner,
            &TargetConfig::default(),
            "COM5",
            0x10000,
            Path::new("app.bin"),
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "Unexpected error: permission denied");
    }
}
